use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::info;

use crate::config::ListingConfig;

use super::completeness;
use super::domain::{
    Address, AuthProfile, Document, KycStatus, OrgId, PhysicalAttributes, Property, PropertyDraft,
    PropertyId, PropertyPatch, PropertyStatus, UserId, VerificationStatus,
};
use super::error::{ListingError, PublishBlocker};
use super::ports::{
    DocumentStore, IdentityProvider, MediaStore, PropertyRepository, StatusFields,
};

static PROPERTY_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_property_id() -> PropertyId {
    let id = PROPERTY_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    PropertyId(format!("prop-{id:06}"))
}

/// The property state machine. Every transition reads the current aggregate
/// and evaluates its guards against freshly fetched data before the single
/// commit write; nothing is decided from cached state.
pub struct PropertyLifecycleManager {
    repository: Arc<dyn PropertyRepository>,
    media: Arc<dyn MediaStore>,
    documents: Arc<dyn DocumentStore>,
    identity: Arc<dyn IdentityProvider>,
    config: ListingConfig,
}

impl PropertyLifecycleManager {
    pub fn new(
        repository: Arc<dyn PropertyRepository>,
        media: Arc<dyn MediaStore>,
        documents: Arc<dyn DocumentStore>,
        identity: Arc<dyn IdentityProvider>,
        config: ListingConfig,
    ) -> Self {
        Self {
            repository,
            media,
            documents,
            identity,
            config,
        }
    }

    async fn profile(&self) -> Result<(AuthProfile, OrgId), ListingError> {
        let profile = self.identity.current().await?;
        let org = profile.org_id.clone().ok_or_else(ListingError::missing_org)?;
        Ok((profile, org))
    }

    async fn load(&self, org: &OrgId, id: &PropertyId) -> Result<Property, ListingError> {
        self.repository
            .fetch(org, id)
            .await?
            .filter(|property| !property.is_deleted())
            .ok_or(ListingError::NotFound("property"))
    }

    /// Open a new draft listing owned by the calling organization.
    pub async fn create(
        &self,
        owner: UserId,
        draft: PropertyDraft,
    ) -> Result<Property, ListingError> {
        let (_, org) = self.profile().await?;

        if draft.title.trim().is_empty() {
            return Err(ListingError::Validation(
                "a listing needs a title".to_string(),
            ));
        }

        let now = Utc::now();
        let mut property = Property {
            id: next_property_id(),
            org_id: org,
            owner_id: owner,
            status: PropertyStatus::Draft,
            title: draft.title,
            description: None,
            price: draft.price,
            property_type: draft.property_type,
            operation_type: draft.operation_type,
            physical: PhysicalAttributes::default(),
            address: Address::default(),
            location: None,
            amenities: Default::default(),
            amenities_extra: None,
            tags: Vec::new(),
            completeness_score: 0,
            rpp_verification: None,
            sale_note: None,
            created_at: now,
            updated_at: now,
            published_at: None,
            publish_scheduled_at: None,
            sold_at: None,
            deleted_at: None,
        };
        property.completeness_score = completeness::evaluate(&property, &[], 0).score;

        let stored = self.repository.insert(property).await?;
        info!(property = %stored.id.0, "draft listing created");
        Ok(stored)
    }

    /// Fetch a property within the caller's scope.
    pub async fn get(&self, id: &PropertyId) -> Result<Property, ListingError> {
        let (_, org) = self.profile().await?;
        self.load(&org, id).await
    }

    /// Publish a draft. All three guards are checked against data fetched
    /// inside this call; the first unmet one is reported as its own
    /// distinct blocker so callers can show the exact remediation.
    pub async fn publish(&self, id: &PropertyId) -> Result<Property, ListingError> {
        let (profile, org) = self.profile().await?;
        let property = self.load(&org, id).await?;

        match property.status {
            PropertyStatus::Draft => {}
            PropertyStatus::Published => {
                return Err(ListingError::Conflict(
                    "listing is already published".to_string(),
                ))
            }
            PropertyStatus::Sold | PropertyStatus::Archived => {
                return Err(ListingError::Conflict(format!(
                    "a {} listing cannot be published",
                    property.status.label()
                )))
            }
        }

        if profile.kyc_status != KycStatus::Verified {
            return Err(PublishBlocker::KycUnverified.into());
        }

        let documents = self.documents.list_by_property(id).await?;
        self.check_trust_document(&documents)?;

        let media_count = self.media.list_by_property(id).await?.len();
        let report = completeness::evaluate(&property, &documents, media_count);
        if report.score < self.config.publish_threshold {
            return Err(PublishBlocker::CompletenessBelowThreshold {
                score: report.score,
                required: self.config.publish_threshold,
            }
            .into());
        }

        let published_at = Utc::now();
        self.repository
            .set_status(
                &org,
                id,
                PropertyStatus::Published,
                StatusFields {
                    published_at: Some(published_at),
                    publish_scheduled_at: None,
                    sold_at: None,
                    sale_note: None,
                },
            )
            .await?;

        info!(property = %id.0, score = report.score, "listing published");
        self.load(&org, id).await
    }

    fn check_trust_document(&self, documents: &[Document]) -> Result<(), ListingError> {
        let trust_type = self.config.trust_document;
        let mut latest_state: Option<VerificationStatus> = None;

        for document in documents
            .iter()
            .filter(|document| document.doc_type == trust_type)
        {
            if document.verification == VerificationStatus::Verified {
                return Ok(());
            }
            latest_state = Some(document.verification);
        }

        match latest_state {
            Some(status) => Err(PublishBlocker::TrustDocumentUnverified {
                doc_type: trust_type,
                status,
            }
            .into()),
            None => Err(PublishBlocker::TrustDocumentMissing(trust_type).into()),
        }
    }

    /// Record a future publish time without changing status. The external
    /// scheduler re-invokes `publish` at that time, which re-evaluates all
    /// guards against then-current data.
    pub async fn schedule_publish(
        &self,
        id: &PropertyId,
        at: DateTime<Utc>,
    ) -> Result<Property, ListingError> {
        let (_, org) = self.profile().await?;
        let mut property = self.load(&org, id).await?;

        if property.status != PropertyStatus::Draft {
            return Err(ListingError::Conflict(format!(
                "cannot schedule publishing for a {} listing",
                property.status.label()
            )));
        }
        if at <= Utc::now() {
            return Err(ListingError::Validation(
                "scheduled publish time must be in the future".to_string(),
            ));
        }

        property.publish_scheduled_at = Some(at);
        property.updated_at = Utc::now();
        self.repository.update(property.clone()).await?;
        info!(property = %id.0, at = %at, "publish scheduled");
        Ok(property)
    }

    /// Take a published listing back to draft.
    pub async fn pause(&self, id: &PropertyId) -> Result<Property, ListingError> {
        let (_, org) = self.profile().await?;
        let property = self.load(&org, id).await?;

        if property.status != PropertyStatus::Published {
            return Err(ListingError::Conflict(format!(
                "only a published listing can be paused, this one is {}",
                property.status.label()
            )));
        }

        self.repository
            .set_status(&org, id, PropertyStatus::Draft, StatusFields::default())
            .await?;
        info!(property = %id.0, "listing paused back to draft");
        self.load(&org, id).await
    }

    /// Close out a published listing as sold.
    pub async fn mark_sold(
        &self,
        id: &PropertyId,
        sold_at: DateTime<Utc>,
        note: Option<String>,
    ) -> Result<Property, ListingError> {
        let (_, org) = self.profile().await?;
        let property = self.load(&org, id).await?;

        if property.status != PropertyStatus::Published {
            return Err(ListingError::Conflict(format!(
                "only a published listing can be marked sold, this one is {}",
                property.status.label()
            )));
        }
        if sold_at > Utc::now() {
            return Err(ListingError::Validation(
                "sold date cannot be in the future".to_string(),
            ));
        }

        self.repository
            .set_status(
                &org,
                id,
                PropertyStatus::Sold,
                StatusFields {
                    published_at: property.published_at,
                    publish_scheduled_at: None,
                    sold_at: Some(sold_at),
                    sale_note: note,
                },
            )
            .await?;
        info!(property = %id.0, "listing marked sold");
        self.load(&org, id).await
    }

    /// Soft-delete a property. Deleting an already-deleted listing is a
    /// no-op success.
    pub async fn delete(&self, id: &PropertyId) -> Result<(), ListingError> {
        let (_, org) = self.profile().await?;
        let property = self
            .repository
            .fetch(&org, id)
            .await?
            .ok_or(ListingError::NotFound("property"))?;

        if property.is_deleted() {
            return Ok(());
        }

        self.repository.soft_delete(&org, id, Utc::now()).await?;
        info!(property = %id.0, "listing soft-deleted");
        Ok(())
    }

    /// Apply a partial update. Drafts accept any field; published listings
    /// accept only non-structural fields; sold and archived listings are
    /// frozen. The completeness score is recomputed and persisted with the
    /// same write.
    pub async fn update(
        &self,
        id: &PropertyId,
        patch: PropertyPatch,
    ) -> Result<Property, ListingError> {
        let (_, org) = self.profile().await?;
        let mut property = self.load(&org, id).await?;

        match property.status {
            PropertyStatus::Draft => {}
            PropertyStatus::Published => {
                if patch.touches_structural_fields() {
                    return Err(ListingError::Validation(
                        "structural fields cannot change while published".to_string(),
                    ));
                }
            }
            PropertyStatus::Sold | PropertyStatus::Archived => {
                return Err(ListingError::Conflict(format!(
                    "a {} listing can no longer be edited",
                    property.status.label()
                )))
            }
        }

        property.apply_patch(patch);

        let documents = self.documents.list_by_property(id).await?;
        let media_count = self.media.list_by_property(id).await?.len();
        property.completeness_score =
            completeness::evaluate(&property, &documents, media_count).score;
        property.updated_at = Utc::now();

        self.repository.update(property.clone()).await?;
        info!(
            property = %id.0,
            score = property.completeness_score,
            "listing updated"
        );
        Ok(property)
    }
}

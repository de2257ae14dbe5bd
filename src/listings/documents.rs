use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::ListingConfig;

use super::domain::{
    Document, DocumentId, DocumentType, FileMetadata, OrgId, Property, PropertyId,
    VerificationStatus,
};
use super::error::ListingError;
use super::ports::{DocumentStore, IdentityProvider, PropertyRepository};

static DOCUMENT_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_document_id() -> DocumentId {
    let id = DOCUMENT_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    DocumentId(format!("doc-{id:06}"))
}

/// Where an attached document's bytes live. At least one of the two is
/// expected; both may be present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentLocator {
    pub object_key: Option<String>,
    pub url: Option<String>,
}

/// Attach, list, verify, and delete supporting documents for a property.
/// `verify` is the only path that flips a listing's publish-blocking
/// document state.
pub struct DocumentVerificationManager {
    repository: Arc<dyn PropertyRepository>,
    documents: Arc<dyn DocumentStore>,
    identity: Arc<dyn IdentityProvider>,
    config: ListingConfig,
}

impl DocumentVerificationManager {
    pub fn new(
        repository: Arc<dyn PropertyRepository>,
        documents: Arc<dyn DocumentStore>,
        identity: Arc<dyn IdentityProvider>,
        config: ListingConfig,
    ) -> Self {
        Self {
            repository,
            documents,
            identity,
            config,
        }
    }

    async fn scoped_property(&self, id: &PropertyId) -> Result<(OrgId, Property), ListingError> {
        let profile = self.identity.current().await?;
        let org = profile.org_id.ok_or_else(ListingError::missing_org)?;
        let property = self
            .repository
            .fetch(&org, id)
            .await?
            .filter(|property| !property.is_deleted())
            .ok_or(ListingError::NotFound("property"))?;
        Ok((org, property))
    }

    /// Attach a document in `pending` state.
    pub async fn attach(
        &self,
        property_id: &PropertyId,
        doc_type: DocumentType,
        locator: DocumentLocator,
        metadata: FileMetadata,
    ) -> Result<Document, ListingError> {
        self.attach_with_status(
            property_id,
            doc_type,
            locator,
            metadata,
            VerificationStatus::Pending,
        )
        .await
    }

    /// Trusted-ingestion attach for callers that already validated the
    /// document off band; inserts directly as `verified`.
    pub async fn attach_verified(
        &self,
        property_id: &PropertyId,
        doc_type: DocumentType,
        locator: DocumentLocator,
        metadata: FileMetadata,
    ) -> Result<Document, ListingError> {
        self.attach_with_status(
            property_id,
            doc_type,
            locator,
            metadata,
            VerificationStatus::Verified,
        )
        .await
    }

    async fn attach_with_status(
        &self,
        property_id: &PropertyId,
        doc_type: DocumentType,
        locator: DocumentLocator,
        metadata: FileMetadata,
        verification: VerificationStatus,
    ) -> Result<Document, ListingError> {
        let (_, mut property) = self.scoped_property(property_id).await?;

        if locator.object_key.is_none() && locator.url.is_none() {
            return Err(ListingError::Validation(
                "document locator needs an object key or a url".to_string(),
            ));
        }

        let document = Document {
            id: next_document_id(),
            property_id: property_id.clone(),
            doc_type,
            verification,
            object_key: locator.object_key,
            url: locator.url,
            metadata,
            created_at: Utc::now(),
        };

        let stored = self.documents.insert(document).await?;
        info!(
            property = %property_id.0,
            document = %stored.id.0,
            doc_type = doc_type.label(),
            verification = verification.label(),
            "document attached"
        );

        if doc_type == self.config.trust_document {
            self.refresh_trust_mirror(&mut property).await?;
        }

        Ok(stored)
    }

    /// Documents for a property, creation time ascending.
    pub async fn list_by_property(
        &self,
        property_id: &PropertyId,
    ) -> Result<Vec<Document>, ListingError> {
        self.scoped_property(property_id).await?;
        Ok(self.documents.list_by_property(property_id).await?)
    }

    /// Remove a document; NOT_FOUND when it is absent or out of scope.
    pub async fn delete(
        &self,
        property_id: &PropertyId,
        document_id: &DocumentId,
    ) -> Result<(), ListingError> {
        let (_, mut property) = self.scoped_property(property_id).await?;

        let document = self
            .documents
            .fetch(property_id, document_id)
            .await?
            .ok_or(ListingError::NotFound("document"))?;

        self.documents.delete(property_id, document_id).await?;
        info!(property = %property_id.0, document = %document_id.0, "document deleted");

        if document.doc_type == self.config.trust_document {
            self.refresh_trust_mirror(&mut property).await?;
        }

        Ok(())
    }

    /// Update a document's verification state and refresh the property's
    /// trust-document mirror.
    pub async fn verify(
        &self,
        property_id: &PropertyId,
        document_id: &DocumentId,
        status: VerificationStatus,
    ) -> Result<Document, ListingError> {
        let (_, mut property) = self.scoped_property(property_id).await?;

        let mut document = self
            .documents
            .fetch(property_id, document_id)
            .await?
            .ok_or(ListingError::NotFound("document"))?;

        document.verification = status;
        self.documents.update(document.clone()).await?;
        info!(
            property = %property_id.0,
            document = %document_id.0,
            verification = status.label(),
            "document verification updated"
        );

        if document.doc_type == self.config.trust_document {
            self.refresh_trust_mirror(&mut property).await?;
        }

        Ok(document)
    }

    /// Recompute the cached trust-document state from the current set of
    /// trust documents: verified wins, otherwise the newest one's state,
    /// and none at all clears the mirror.
    async fn refresh_trust_mirror(&self, property: &mut Property) -> Result<(), ListingError> {
        let documents = self.documents.list_by_property(&property.id).await?;
        let trust_docs: Vec<&Document> = documents
            .iter()
            .filter(|document| document.doc_type == self.config.trust_document)
            .collect();

        let mirror = if trust_docs
            .iter()
            .any(|document| document.verification == VerificationStatus::Verified)
        {
            Some(VerificationStatus::Verified)
        } else {
            trust_docs.last().map(|document| document.verification)
        };

        property.rpp_verification = mirror;
        property.updated_at = Utc::now();
        self.repository.update(property.clone()).await?;
        Ok(())
    }
}

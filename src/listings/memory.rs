//! In-memory port adapters backing the tests and the offline demo. They
//! enforce the same organization scoping contract the production adapters
//! must honor: cross-tenant reads resolve to nothing, cross-tenant writes
//! to not-found.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::domain::{
    AuthProfile, Document, DocumentId, KycStatus, ListingFilters, MediaAsset, MediaId, MediaKind,
    OrgId, Page, Property, PropertyId, PropertyStatus, PropertySummary, SortKey,
};
use super::ports::{
    DocumentStore, IdentityError, IdentityProvider, MediaStore, ObjectStorageGateway,
    PropertyRepository, RepositoryError, StatusFields, StorageError, UploadHandle,
};

#[derive(Default, Clone)]
pub struct InMemoryPropertyRepository {
    records: Arc<Mutex<HashMap<PropertyId, Property>>>,
}

impl InMemoryPropertyRepository {
    fn matches(property: &Property, filters: &ListingFilters) -> bool {
        if property.is_deleted() {
            return false;
        }
        if let Some(status) = filters.status {
            if property.status != status {
                return false;
            }
        }
        if let Some(property_type) = filters.property_type {
            if property.property_type != property_type {
                return false;
            }
        }
        if let Some(city) = &filters.city {
            match &property.address.city {
                Some(value) if value.eq_ignore_ascii_case(city) => {}
                _ => return false,
            }
        }
        if let Some(state) = &filters.state {
            match &property.address.state {
                Some(value) if value.eq_ignore_ascii_case(state) => {}
                _ => return false,
            }
        }
        if let Some(min) = filters.min_price {
            if property.price.amount < min {
                return false;
            }
        }
        if let Some(max) = filters.max_price {
            if property.price.amount > max {
                return false;
            }
        }
        if let Some(query) = &filters.query {
            let needle = query.to_lowercase();
            let in_title = property.title.to_lowercase().contains(&needle);
            let in_description = property
                .description
                .as_deref()
                .map(|text| text.to_lowercase().contains(&needle))
                .unwrap_or(false);
            if !in_title && !in_description {
                return false;
            }
        }
        true
    }

    fn recency(property: &Property) -> DateTime<Utc> {
        property.published_at.unwrap_or(property.created_at)
    }
}

#[async_trait]
impl PropertyRepository for InMemoryPropertyRepository {
    async fn insert(&self, property: Property) -> Result<Property, RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        if guard.contains_key(&property.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(property.id.clone(), property.clone());
        Ok(property)
    }

    async fn fetch(
        &self,
        org: &OrgId,
        id: &PropertyId,
    ) -> Result<Option<Property>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard
            .get(id)
            .filter(|property| &property.org_id == org)
            .cloned())
    }

    async fn list(
        &self,
        org: &OrgId,
        filters: &ListingFilters,
    ) -> Result<Page<PropertySummary>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        let mut matched: Vec<&Property> = guard
            .values()
            .filter(|property| &property.org_id == org && Self::matches(property, filters))
            .collect();

        match filters.sort {
            SortKey::Recent => matched.sort_by(|a, b| Self::recency(b).cmp(&Self::recency(a))),
            SortKey::PriceAsc => matched.sort_by(|a, b| a.price.amount.cmp(&b.price.amount)),
            SortKey::PriceDesc => matched.sort_by(|a, b| b.price.amount.cmp(&a.price.amount)),
            SortKey::CompletenessDesc => {
                matched.sort_by(|a, b| b.completeness_score.cmp(&a.completeness_score))
            }
        }

        let total = matched.len() as u64;
        let page = filters.page.max(1);
        let page_size = filters.page_size.max(1);
        let start = (page as usize - 1) * page_size as usize;
        let items = matched
            .into_iter()
            .skip(start)
            .take(page_size as usize)
            .map(|property| property.summary())
            .collect();

        Ok(Page {
            items,
            total,
            page,
            page_size,
        })
    }

    async fn update(&self, property: Property) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        match guard.get(&property.id) {
            Some(existing) if existing.org_id == property.org_id => {
                guard.insert(property.id.clone(), property);
                Ok(())
            }
            _ => Err(RepositoryError::NotFound),
        }
    }

    async fn set_status(
        &self,
        org: &OrgId,
        id: &PropertyId,
        status: PropertyStatus,
        fields: StatusFields,
    ) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        match guard.get_mut(id) {
            Some(property) if &property.org_id == org => {
                property.status = status;
                property.published_at = fields.published_at;
                property.publish_scheduled_at = fields.publish_scheduled_at;
                property.sold_at = fields.sold_at;
                property.sale_note = fields.sale_note;
                property.updated_at = Utc::now();
                Ok(())
            }
            _ => Err(RepositoryError::NotFound),
        }
    }

    async fn soft_delete(
        &self,
        org: &OrgId,
        id: &PropertyId,
        at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        match guard.get_mut(id) {
            Some(property) if &property.org_id == org => {
                property.deleted_at = Some(at);
                property.updated_at = at;
                Ok(())
            }
            _ => Err(RepositoryError::NotFound),
        }
    }
}

#[derive(Default, Clone)]
pub struct InMemoryMediaStore {
    assets: Arc<Mutex<HashMap<PropertyId, Vec<MediaAsset>>>>,
}

#[async_trait]
impl MediaStore for InMemoryMediaStore {
    async fn insert(&self, mut asset: MediaAsset) -> Result<MediaAsset, RepositoryError> {
        let mut guard = self.assets.lock().expect("media mutex poisoned");
        let gallery = guard.entry(asset.property_id.clone()).or_default();
        if gallery.iter().any(|existing| existing.id == asset.id) {
            return Err(RepositoryError::Conflict);
        }
        asset.position = gallery.len() as u32;
        asset.is_cover = asset.kind == MediaKind::Image
            && !gallery.iter().any(|existing| existing.is_cover);
        gallery.push(asset.clone());
        Ok(asset)
    }

    async fn fetch(
        &self,
        property: &PropertyId,
        id: &MediaId,
    ) -> Result<Option<MediaAsset>, RepositoryError> {
        let guard = self.assets.lock().expect("media mutex poisoned");
        Ok(guard
            .get(property)
            .and_then(|gallery| gallery.iter().find(|asset| &asset.id == id).cloned()))
    }

    async fn list_by_property(
        &self,
        property: &PropertyId,
    ) -> Result<Vec<MediaAsset>, RepositoryError> {
        let guard = self.assets.lock().expect("media mutex poisoned");
        let mut gallery = guard.get(property).cloned().unwrap_or_default();
        gallery.sort_by_key(|asset| asset.position);
        Ok(gallery)
    }

    async fn replace_all(
        &self,
        property: &PropertyId,
        assets: Vec<MediaAsset>,
    ) -> Result<(), RepositoryError> {
        let mut guard = self.assets.lock().expect("media mutex poisoned");
        guard.insert(property.clone(), assets);
        Ok(())
    }
}

#[derive(Default, Clone)]
pub struct InMemoryDocumentStore {
    documents: Arc<Mutex<HashMap<PropertyId, Vec<Document>>>>,
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn insert(&self, document: Document) -> Result<Document, RepositoryError> {
        let mut guard = self.documents.lock().expect("document mutex poisoned");
        let entries = guard.entry(document.property_id.clone()).or_default();
        if entries.iter().any(|existing| existing.id == document.id) {
            return Err(RepositoryError::Conflict);
        }
        entries.push(document.clone());
        Ok(document)
    }

    async fn fetch(
        &self,
        property: &PropertyId,
        id: &DocumentId,
    ) -> Result<Option<Document>, RepositoryError> {
        let guard = self.documents.lock().expect("document mutex poisoned");
        Ok(guard
            .get(property)
            .and_then(|entries| entries.iter().find(|document| &document.id == id).cloned()))
    }

    async fn list_by_property(
        &self,
        property: &PropertyId,
    ) -> Result<Vec<Document>, RepositoryError> {
        let guard = self.documents.lock().expect("document mutex poisoned");
        let mut entries = guard.get(property).cloned().unwrap_or_default();
        entries.sort_by_key(|document| document.created_at);
        Ok(entries)
    }

    async fn update(&self, document: Document) -> Result<(), RepositoryError> {
        let mut guard = self.documents.lock().expect("document mutex poisoned");
        let entries = guard
            .get_mut(&document.property_id)
            .ok_or(RepositoryError::NotFound)?;
        match entries.iter_mut().find(|entry| entry.id == document.id) {
            Some(entry) => {
                *entry = document;
                Ok(())
            }
            None => Err(RepositoryError::NotFound),
        }
    }

    async fn delete(
        &self,
        property: &PropertyId,
        id: &DocumentId,
    ) -> Result<(), RepositoryError> {
        let mut guard = self.documents.lock().expect("document mutex poisoned");
        let entries = guard.get_mut(property).ok_or(RepositoryError::NotFound)?;
        let before = entries.len();
        entries.retain(|document| &document.id != id);
        if entries.len() == before {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}

/// Hands out deterministic upload handles and download URLs without any
/// real storage behind them.
#[derive(Default)]
pub struct InMemoryObjectStorage {
    sequence: AtomicU64,
}

#[async_trait]
impl ObjectStorageGateway for InMemoryObjectStorage {
    async fn request_upload_handle(
        &self,
        file_name: &str,
        _content_type: &str,
    ) -> Result<UploadHandle, StorageError> {
        let sequence = self.sequence.fetch_add(1, Ordering::Relaxed);
        let object_key = format!("objects/{sequence:06}-{file_name}");
        Ok(UploadHandle {
            upload_url: format!("https://storage.local/upload/{object_key}"),
            object_key,
        })
    }

    async fn request_download_url(&self, object_key: &str) -> Result<String, StorageError> {
        Ok(format!("https://storage.local/{object_key}"))
    }
}

/// Identity provider returning a configurable profile; tests flip the KYC
/// state to exercise the publish guards.
#[derive(Clone)]
pub struct StaticIdentityProvider {
    profile: Arc<Mutex<AuthProfile>>,
}

impl StaticIdentityProvider {
    pub fn new(profile: AuthProfile) -> Self {
        Self {
            profile: Arc::new(Mutex::new(profile)),
        }
    }

    pub fn verified(org: &str) -> Self {
        Self::new(AuthProfile {
            org_id: Some(OrgId(org.to_string())),
            kyc_status: KycStatus::Verified,
        })
    }

    pub fn set_kyc(&self, status: KycStatus) {
        let mut guard = self.profile.lock().expect("identity mutex poisoned");
        guard.kyc_status = status;
    }

    pub fn set_org(&self, org: Option<OrgId>) {
        let mut guard = self.profile.lock().expect("identity mutex poisoned");
        guard.org_id = org;
    }
}

#[async_trait]
impl IdentityProvider for StaticIdentityProvider {
    async fn current(&self) -> Result<AuthProfile, IdentityError> {
        let guard = self.profile.lock().expect("identity mutex poisoned");
        Ok(guard.clone())
    }
}

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{
    AuthProfile, Document, DocumentId, ListingFilters, MediaAsset, MediaId, OrgId, Page, Property,
    PropertyId, PropertyStatus, PropertySummary,
};

/// Error enumeration shared by the persistence ports.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Error raised by the object storage gateway.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("storage operation failed: {0}")]
    Backend(String),
}

/// Error raised by the identity provider.
#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    #[error("identity could not be resolved: {0}")]
    Unresolved(String),
}

/// Lifecycle fields written together with a status change so a transition
/// commits as one write.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatusFields {
    pub published_at: Option<DateTime<Utc>>,
    pub publish_scheduled_at: Option<DateTime<Utc>>,
    pub sold_at: Option<DateTime<Utc>>,
    pub sale_note: Option<String>,
}

/// Persistence surface for property aggregates, scoped by organization.
/// Implementations must refuse cross-tenant reads and writes.
#[async_trait]
pub trait PropertyRepository: Send + Sync {
    async fn insert(&self, property: Property) -> Result<Property, RepositoryError>;
    async fn fetch(&self, org: &OrgId, id: &PropertyId)
        -> Result<Option<Property>, RepositoryError>;
    async fn list(
        &self,
        org: &OrgId,
        filters: &ListingFilters,
    ) -> Result<Page<PropertySummary>, RepositoryError>;
    /// Full aggregate write; the caller read the latest state first.
    async fn update(&self, property: Property) -> Result<(), RepositoryError>;
    async fn set_status(
        &self,
        org: &OrgId,
        id: &PropertyId,
        status: PropertyStatus,
        fields: StatusFields,
    ) -> Result<(), RepositoryError>;
    async fn soft_delete(
        &self,
        org: &OrgId,
        id: &PropertyId,
        at: DateTime<Utc>,
    ) -> Result<(), RepositoryError>;
}

/// Persistence surface for media assets, keyed by property.
#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Append to the gallery as one atomic step: the store assigns the
    /// next position and claims the cover when the asset is an image and
    /// the gallery has no cover yet. Concurrent inserts for one property
    /// must serialize here. Returns the record as stored.
    async fn insert(&self, asset: MediaAsset) -> Result<MediaAsset, RepositoryError>;
    async fn fetch(
        &self,
        property: &PropertyId,
        id: &MediaId,
    ) -> Result<Option<MediaAsset>, RepositoryError>;
    /// Assets ordered by position ascending.
    async fn list_by_property(
        &self,
        property: &PropertyId,
    ) -> Result<Vec<MediaAsset>, RepositoryError>;
    /// Rewrite the whole gallery in one call so removal, renumbering, and
    /// cover reassignment land together.
    async fn replace_all(
        &self,
        property: &PropertyId,
        assets: Vec<MediaAsset>,
    ) -> Result<(), RepositoryError>;
}

/// Persistence surface for supporting documents, keyed by property.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn insert(&self, document: Document) -> Result<Document, RepositoryError>;
    async fn fetch(
        &self,
        property: &PropertyId,
        id: &DocumentId,
    ) -> Result<Option<Document>, RepositoryError>;
    /// Documents ordered by creation time ascending.
    async fn list_by_property(
        &self,
        property: &PropertyId,
    ) -> Result<Vec<Document>, RepositoryError>;
    async fn update(&self, document: Document) -> Result<(), RepositoryError>;
    async fn delete(&self, property: &PropertyId, id: &DocumentId)
        -> Result<(), RepositoryError>;
}

/// Time-limited credential for a direct client-to-storage transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadHandle {
    pub upload_url: String,
    pub object_key: String,
}

/// Gateway issuing upload and download handles for binary assets. The
/// binary transfer itself never passes through this core.
#[async_trait]
pub trait ObjectStorageGateway: Send + Sync {
    async fn request_upload_handle(
        &self,
        file_name: &str,
        content_type: &str,
    ) -> Result<UploadHandle, StorageError>;
    async fn request_download_url(&self, object_key: &str) -> Result<String, StorageError>;
}

/// Resolves the calling user's organization and KYC standing.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn current(&self) -> Result<AuthProfile, IdentityError>;
}

//! Listing publication workflow: lifecycle transitions with publish
//! guards, the media upload pipeline, document verification, completeness
//! scoring, similarity ranking, and guarded browse queries.

pub mod browse;
pub mod completeness;
pub mod documents;
pub mod domain;
pub mod error;
pub mod lifecycle;
pub mod media;
pub mod memory;
pub mod ports;
pub mod router;
pub mod similarity;

#[cfg(test)]
mod tests;

pub use browse::{BrowseOutcome, ListingBrowser};
pub use completeness::{evaluate as evaluate_completeness, ChecklistItem, CompletenessReport};
pub use documents::{DocumentLocator, DocumentVerificationManager};
pub use domain::{
    Address, AuthProfile, Document, DocumentId, DocumentType, FileMetadata, GeoPoint, KycStatus,
    ListingFilters, MediaAsset, MediaId, MediaKind, OperationType, OrgId, Page,
    PhysicalAttributes, Price, Property, PropertyDraft, PropertyId, PropertyPatch, PropertyStatus,
    PropertySummary, PropertyType, SortKey, UserId, VerificationStatus,
};
pub use error::{ErrorKind, ListingError, PublishBlocker};
pub use lifecycle::PropertyLifecycleManager;
pub use media::{MediaAssetManager, PendingAsset, ProvisionalAsset, UploadRequest};
pub use ports::{
    DocumentStore, IdentityError, IdentityProvider, MediaStore, ObjectStorageGateway,
    PropertyRepository, RepositoryError, StatusFields, StorageError, UploadHandle,
};
pub use router::{listing_router, ListingState};
pub use similarity::{rank as rank_similar, ScoredListing, SimilarityRecommender};

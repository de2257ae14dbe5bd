use std::sync::Arc;

use chrono::Utc;

use crate::config::ListingConfig;
use crate::listings::browse::ListingBrowser;
use crate::listings::documents::{DocumentLocator, DocumentVerificationManager};
use crate::listings::domain::{
    Address, Document, DocumentType, FileMetadata, MediaAsset, OperationType, OrgId,
    PhysicalAttributes, Price, Property, PropertyDraft, PropertyId, PropertyPatch,
    PropertyStatus, PropertyType, UserId, VerificationStatus,
};
use crate::listings::lifecycle::PropertyLifecycleManager;
use crate::listings::media::{MediaAssetManager, UploadRequest};
use crate::listings::memory::{
    InMemoryDocumentStore, InMemoryMediaStore, InMemoryObjectStorage, InMemoryPropertyRepository,
    StaticIdentityProvider,
};
use crate::listings::similarity::SimilarityRecommender;

pub(crate) const TEST_ORG: &str = "org-test";

/// Managers wired to shared in-memory ports, with the concrete handles
/// kept around so tests can flip identity state or seed records directly.
pub(crate) struct Harness {
    pub identity: Arc<StaticIdentityProvider>,
    pub repository: Arc<InMemoryPropertyRepository>,
    pub lifecycle: PropertyLifecycleManager,
    pub media: MediaAssetManager,
    pub documents: DocumentVerificationManager,
    pub browser: ListingBrowser,
    pub recommender: SimilarityRecommender,
}

pub(crate) fn harness() -> Harness {
    let identity = Arc::new(StaticIdentityProvider::verified(TEST_ORG));
    let repository = Arc::new(InMemoryPropertyRepository::default());
    let media_store = Arc::new(InMemoryMediaStore::default());
    let document_store = Arc::new(InMemoryDocumentStore::default());
    let storage = Arc::new(InMemoryObjectStorage::default());
    let config = ListingConfig::default();

    Harness {
        identity: identity.clone(),
        repository: repository.clone(),
        lifecycle: PropertyLifecycleManager::new(
            repository.clone(),
            media_store.clone(),
            document_store.clone(),
            identity.clone(),
            config.clone(),
        ),
        media: MediaAssetManager::new(
            repository.clone(),
            media_store,
            storage,
            identity.clone(),
        ),
        documents: DocumentVerificationManager::new(
            repository.clone(),
            document_store,
            identity.clone(),
            config.clone(),
        ),
        browser: ListingBrowser::new(repository.clone(), identity.clone()),
        recommender: SimilarityRecommender::new(repository, identity, config),
    }
}

pub(crate) fn sample_draft() -> PropertyDraft {
    PropertyDraft {
        title: "Sunlit three-bedroom house".to_string(),
        price: Price {
            amount: 2_000_000,
            currency: "MXN".to_string(),
        },
        property_type: PropertyType::House,
        operation_type: OperationType::Sale,
    }
}

pub(crate) fn detail_patch() -> PropertyPatch {
    PropertyPatch {
        description: Some("Family home close to parks and schools.".to_string()),
        address: Some(Address {
            city: Some("Guadalajara".to_string()),
            state: Some("Jalisco".to_string()),
            ..Address::default()
        }),
        amenities_extra: Some("garden, terrace".to_string()),
        ..PropertyPatch::default()
    }
}

/// Create a draft with descriptive fields filled in.
pub(crate) async fn draft_property(harness: &Harness) -> Property {
    let property = harness
        .lifecycle
        .create(UserId("user-test".to_string()), sample_draft())
        .await
        .expect("draft created");
    harness
        .lifecycle
        .update(&property.id, detail_patch())
        .await
        .expect("details applied")
}

pub(crate) async fn upload_image(
    harness: &Harness,
    property_id: &PropertyId,
    file_name: &str,
) -> MediaAsset {
    let provisional = harness
        .media
        .begin_upload(
            property_id,
            UploadRequest {
                file_name: file_name.to_string(),
                content_type: "image/jpeg".to_string(),
                size_bytes: Some(1_024),
            },
        )
        .await
        .expect("upload handle issued");
    harness
        .media
        .complete_upload(provisional)
        .await
        .expect("upload reconciled")
}

pub(crate) async fn attach_trust_document(
    harness: &Harness,
    property_id: &PropertyId,
) -> Document {
    harness
        .documents
        .attach(
            property_id,
            DocumentType::RppCertificate,
            DocumentLocator {
                object_key: Some("docs/rpp.pdf".to_string()),
                url: None,
            },
            FileMetadata {
                file_name: "rpp.pdf".to_string(),
                content_type: "application/pdf".to_string(),
                size_bytes: Some(4_096),
                extra: Default::default(),
            },
        )
        .await
        .expect("trust document attached")
}

/// Draft with media, a verified trust document, and a fresh score; ready
/// to pass every publish guard.
pub(crate) async fn ready_property(harness: &Harness) -> Property {
    let property = draft_property(harness).await;
    upload_image(harness, &property.id, "facade.jpg").await;
    let document = attach_trust_document(harness, &property.id).await;
    harness
        .documents
        .verify(&property.id, &document.id, VerificationStatus::Verified)
        .await
        .expect("trust document verified");
    harness
        .lifecycle
        .update(&property.id, PropertyPatch::default())
        .await
        .expect("score refreshed")
}

/// A standalone aggregate for pure-function tests and direct repository
/// seeding.
pub(crate) fn bare_property(id: &str, title: &str) -> Property {
    let now = Utc::now();
    Property {
        id: PropertyId(id.to_string()),
        org_id: OrgId(TEST_ORG.to_string()),
        owner_id: UserId("user-test".to_string()),
        status: PropertyStatus::Draft,
        title: title.to_string(),
        description: None,
        price: Price {
            amount: 2_000_000,
            currency: "MXN".to_string(),
        },
        property_type: PropertyType::House,
        operation_type: OperationType::Sale,
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
    }
}

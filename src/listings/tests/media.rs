use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Barrier;

use super::common::{bare_property, draft_property, harness, upload_image, TEST_ORG};
use crate::listings::domain::{MediaAsset, MediaId, MediaKind, PropertyId};
use crate::listings::error::ListingError;
use crate::listings::media::{MediaAssetManager, UploadRequest};
use crate::listings::memory::{
    InMemoryMediaStore, InMemoryObjectStorage, InMemoryPropertyRepository, StaticIdentityProvider,
};
use crate::listings::ports::{
    MediaStore, ObjectStorageGateway, PropertyRepository, RepositoryError, StorageError,
    UploadHandle,
};

fn positions(assets: &[MediaAsset]) -> Vec<u32> {
    assets.iter().map(|asset| asset.position).collect()
}

fn image_request(file_name: &str) -> UploadRequest {
    UploadRequest {
        file_name: file_name.to_string(),
        content_type: "image/jpeg".to_string(),
        size_bytes: Some(1_024),
    }
}

async fn push_image(
    manager: &MediaAssetManager,
    property_id: &PropertyId,
    file_name: &str,
) -> MediaAsset {
    let provisional = manager
        .begin_upload(property_id, image_request(file_name))
        .await
        .expect("handle issued");
    manager
        .complete_upload(provisional)
        .await
        .expect("upload reconciled")
}

#[tokio::test]
async fn first_image_becomes_cover() {
    let harness = harness();
    let property = draft_property(&harness).await;

    let first = upload_image(&harness, &property.id, "a.jpg").await;
    let second = upload_image(&harness, &property.id, "b.jpg").await;

    assert!(first.is_cover);
    assert!(!second.is_cover);
    assert_eq!(first.position, 0);
    assert_eq!(second.position, 1);
}

#[tokio::test]
async fn provisional_uploads_are_not_part_of_the_gallery() {
    let harness = harness();
    let property = draft_property(&harness).await;

    let provisional = harness
        .media
        .begin_upload(
            &property.id,
            UploadRequest {
                file_name: "pending.jpg".to_string(),
                content_type: "image/jpeg".to_string(),
                size_bytes: None,
            },
        )
        .await
        .expect("handle issued");

    let gallery = harness.media.list(&property.id).await.expect("listed");
    assert!(gallery.is_empty(), "provisional entries must stay local");

    harness.media.abandon(provisional);
    let gallery = harness.media.list(&property.id).await.expect("listed");
    assert!(gallery.is_empty());
}

#[tokio::test]
async fn video_never_takes_cover_automatically() {
    let harness = harness();
    let property = draft_property(&harness).await;

    let video = harness
        .media
        .begin_upload(
            &property.id,
            UploadRequest {
                file_name: "tour.mp4".to_string(),
                content_type: "video/mp4".to_string(),
                size_bytes: None,
            },
        )
        .await
        .expect("handle issued");
    let video = harness
        .media
        .complete_upload(video)
        .await
        .expect("video persisted");
    assert_eq!(video.kind, MediaKind::Video);
    assert!(!video.is_cover);

    // The first image still claims the cover even when it arrives second.
    let image = upload_image(&harness, &property.id, "a.jpg").await;
    assert!(image.is_cover);
}

#[tokio::test]
async fn unsupported_content_type_is_rejected() {
    let harness = harness();
    let property = draft_property(&harness).await;

    let result = harness
        .media
        .begin_upload(
            &property.id,
            UploadRequest {
                file_name: "notes.txt".to_string(),
                content_type: "text/plain".to_string(),
                size_bytes: None,
            },
        )
        .await;

    match result {
        Err(ListingError::Validation(_)) => {}
        other => panic!("expected validation error, got {other:?}"),
    }
}

#[tokio::test]
async fn begin_upload_requires_existing_property() {
    let harness = harness();

    let result = harness
        .media
        .begin_upload(
            &PropertyId("prop-missing".to_string()),
            UploadRequest {
                file_name: "a.jpg".to_string(),
                content_type: "image/jpeg".to_string(),
                size_bytes: None,
            },
        )
        .await;

    match result {
        Err(ListingError::NotFound(_)) => {}
        other => panic!("expected not found, got {other:?}"),
    }
}

#[tokio::test]
async fn remove_renumbers_and_promotes_next_image_to_cover() {
    let harness = harness();
    let property = draft_property(&harness).await;

    let cover = upload_image(&harness, &property.id, "a.jpg").await;
    let second = upload_image(&harness, &property.id, "b.jpg").await;
    let third = upload_image(&harness, &property.id, "c.jpg").await;

    harness
        .media
        .remove(&property.id, &cover.id)
        .await
        .expect("cover removed");

    let gallery = harness.media.list(&property.id).await.expect("listed");
    assert_eq!(positions(&gallery), vec![0, 1]);
    assert_eq!(gallery[0].id, second.id);
    assert_eq!(gallery[1].id, third.id);

    let covers: Vec<&MediaId> = gallery
        .iter()
        .filter(|asset| asset.is_cover)
        .map(|asset| &asset.id)
        .collect();
    assert_eq!(covers, vec![&second.id], "exactly one new cover");
}

#[tokio::test]
async fn remove_unknown_asset_fails_not_found() {
    let harness = harness();
    let property = draft_property(&harness).await;
    upload_image(&harness, &property.id, "a.jpg").await;

    match harness
        .media
        .remove(&property.id, &MediaId("media-missing".to_string()))
        .await
    {
        Err(ListingError::NotFound(_)) => {}
        other => panic!("expected not found, got {other:?}"),
    }
}

#[tokio::test]
async fn set_cover_moves_the_single_cover_flag() {
    let harness = harness();
    let property = draft_property(&harness).await;

    let first = upload_image(&harness, &property.id, "a.jpg").await;
    let second = upload_image(&harness, &property.id, "b.jpg").await;

    harness
        .media
        .set_cover(&property.id, &second.id)
        .await
        .expect("cover reassigned");

    let gallery = harness.media.list(&property.id).await.expect("listed");
    let cover_ids: Vec<&MediaId> = gallery
        .iter()
        .filter(|asset| asset.is_cover)
        .map(|asset| &asset.id)
        .collect();
    assert_eq!(cover_ids, vec![&second.id]);
    assert!(!gallery
        .iter()
        .find(|asset| asset.id == first.id)
        .expect("first asset present")
        .is_cover);
}

#[tokio::test]
async fn set_cover_rejects_foreign_and_non_image_targets() {
    let harness = harness();
    let property = draft_property(&harness).await;
    upload_image(&harness, &property.id, "a.jpg").await;

    match harness
        .media
        .set_cover(&property.id, &MediaId("media-foreign".to_string()))
        .await
    {
        Err(ListingError::NotFound(_)) => {}
        other => panic!("expected not found, got {other:?}"),
    }

    let video = harness
        .media
        .begin_upload(
            &property.id,
            UploadRequest {
                file_name: "tour.mp4".to_string(),
                content_type: "video/mp4".to_string(),
                size_bytes: None,
            },
        )
        .await
        .expect("handle issued");
    let video = harness
        .media
        .complete_upload(video)
        .await
        .expect("video persisted");

    match harness.media.set_cover(&property.id, &video.id).await {
        Err(ListingError::Validation(_)) => {}
        other => panic!("expected validation error, got {other:?}"),
    }
}

#[tokio::test]
async fn reorder_assigns_positions_by_index() {
    let harness = harness();
    let property = draft_property(&harness).await;

    let a = upload_image(&harness, &property.id, "a.jpg").await;
    let b = upload_image(&harness, &property.id, "b.jpg").await;
    let c = upload_image(&harness, &property.id, "c.jpg").await;

    harness
        .media
        .reorder(&property.id, &[c.id.clone(), a.id.clone(), b.id.clone()])
        .await
        .expect("reorder succeeds");

    let gallery = harness.media.list(&property.id).await.expect("listed");
    assert_eq!(positions(&gallery), vec![0, 1, 2]);
    assert_eq!(gallery[0].id, c.id);
    assert_eq!(gallery[1].id, a.id);
    assert_eq!(gallery[2].id, b.id);
    // Cover stays with the original first image; order and cover are
    // independent.
    assert!(gallery[1].is_cover);
}

#[tokio::test]
async fn reorder_with_current_order_is_a_no_op() {
    let harness = harness();
    let property = draft_property(&harness).await;

    let a = upload_image(&harness, &property.id, "a.jpg").await;
    let b = upload_image(&harness, &property.id, "b.jpg").await;

    harness
        .media
        .reorder(&property.id, &[a.id.clone(), b.id.clone()])
        .await
        .expect("identity reorder succeeds");

    let gallery = harness.media.list(&property.id).await.expect("listed");
    assert_eq!(positions(&gallery), vec![0, 1]);
    assert_eq!(gallery[0].id, a.id);
}

#[tokio::test]
async fn reorder_rejects_non_permutations() {
    let harness = harness();
    let property = draft_property(&harness).await;

    let a = upload_image(&harness, &property.id, "a.jpg").await;
    let b = upload_image(&harness, &property.id, "b.jpg").await;

    // Wrong member.
    match harness
        .media
        .reorder(
            &property.id,
            &[a.id.clone(), MediaId("media-foreign".to_string())],
        )
        .await
    {
        Err(ListingError::Validation(_)) => {}
        other => panic!("expected validation error, got {other:?}"),
    }

    // Wrong length.
    match harness.media.reorder(&property.id, &[a.id.clone()]).await {
        Err(ListingError::Validation(_)) => {}
        other => panic!("expected validation error, got {other:?}"),
    }

    // Duplicates.
    match harness
        .media
        .reorder(&property.id, &[b.id.clone(), b.id.clone()])
        .await
    {
        Err(ListingError::Conflict(_)) => {}
        other => panic!("expected conflict, got {other:?}"),
    }
}

/// Storage gateway that parks download-url calls until a fixed number of
/// completions are in flight together.
struct LockstepStorage {
    inner: InMemoryObjectStorage,
    barrier: Barrier,
}

#[async_trait]
impl ObjectStorageGateway for LockstepStorage {
    async fn request_upload_handle(
        &self,
        file_name: &str,
        content_type: &str,
    ) -> Result<UploadHandle, StorageError> {
        self.inner.request_upload_handle(file_name, content_type).await
    }

    async fn request_download_url(&self, object_key: &str) -> Result<String, StorageError> {
        self.barrier.wait().await;
        self.inner.request_download_url(object_key).await
    }
}

#[tokio::test]
async fn concurrent_completions_keep_positions_contiguous_and_one_cover() {
    let identity = Arc::new(StaticIdentityProvider::verified(TEST_ORG));
    let repository = Arc::new(InMemoryPropertyRepository::default());
    let storage = Arc::new(LockstepStorage {
        inner: InMemoryObjectStorage::default(),
        barrier: Barrier::new(2),
    });
    let manager = Arc::new(MediaAssetManager::new(
        repository.clone(),
        Arc::new(InMemoryMediaStore::default()),
        storage,
        identity,
    ));

    let property = bare_property("prop-gallery", "Gallery house");
    repository
        .insert(property.clone())
        .await
        .expect("property seeded");

    let first = manager
        .begin_upload(&property.id, image_request("a.jpg"))
        .await
        .expect("handle issued");
    let second = manager
        .begin_upload(&property.id, image_request("b.jpg"))
        .await
        .expect("handle issued");

    let task_a = tokio::spawn({
        let manager = manager.clone();
        async move { manager.complete_upload(first).await }
    });
    let task_b = tokio::spawn({
        let manager = manager.clone();
        async move { manager.complete_upload(second).await }
    });
    task_a
        .await
        .expect("task joined")
        .expect("upload reconciled");
    task_b
        .await
        .expect("task joined")
        .expect("upload reconciled");

    let gallery = manager.list(&property.id).await.expect("listed");
    assert_eq!(positions(&gallery), vec![0, 1]);
    assert_eq!(
        gallery.iter().filter(|asset| asset.is_cover).count(),
        1,
        "interleaved uploads must settle on a single cover"
    );
}

/// Media store wrapper counting whole-gallery rewrites.
struct CountingStore {
    inner: InMemoryMediaStore,
    rewrites: AtomicUsize,
}

#[async_trait]
impl MediaStore for CountingStore {
    async fn insert(&self, asset: MediaAsset) -> Result<MediaAsset, RepositoryError> {
        self.inner.insert(asset).await
    }

    async fn fetch(
        &self,
        property: &PropertyId,
        id: &MediaId,
    ) -> Result<Option<MediaAsset>, RepositoryError> {
        self.inner.fetch(property, id).await
    }

    async fn list_by_property(
        &self,
        property: &PropertyId,
    ) -> Result<Vec<MediaAsset>, RepositoryError> {
        self.inner.list_by_property(property).await
    }

    async fn replace_all(
        &self,
        property: &PropertyId,
        assets: Vec<MediaAsset>,
    ) -> Result<(), RepositoryError> {
        self.rewrites.fetch_add(1, Ordering::SeqCst);
        self.inner.replace_all(property, assets).await
    }
}

#[tokio::test]
async fn remove_commits_the_renumbered_gallery_in_one_write() {
    let identity = Arc::new(StaticIdentityProvider::verified(TEST_ORG));
    let repository = Arc::new(InMemoryPropertyRepository::default());
    let store = Arc::new(CountingStore {
        inner: InMemoryMediaStore::default(),
        rewrites: AtomicUsize::new(0),
    });
    let manager = MediaAssetManager::new(
        repository.clone(),
        store.clone(),
        Arc::new(InMemoryObjectStorage::default()),
        identity,
    );

    let property = bare_property("prop-single-write", "Gallery house");
    repository
        .insert(property.clone())
        .await
        .expect("property seeded");

    let cover = push_image(&manager, &property.id, "a.jpg").await;
    push_image(&manager, &property.id, "b.jpg").await;

    manager
        .remove(&property.id, &cover.id)
        .await
        .expect("cover removed");

    assert_eq!(store.rewrites.load(Ordering::SeqCst), 1);
    let gallery = manager.list(&property.id).await.expect("listed");
    assert_eq!(positions(&gallery), vec![0]);
    assert!(gallery[0].is_cover, "remaining image inherits the cover");
}

#[tokio::test]
async fn floorplan_pdf_is_accepted() {
    let harness = harness();
    let property = draft_property(&harness).await;

    let provisional = harness
        .media
        .begin_upload(
            &property.id,
            UploadRequest {
                file_name: "plan.pdf".to_string(),
                content_type: "application/pdf".to_string(),
                size_bytes: None,
            },
        )
        .await
        .expect("handle issued");
    assert_eq!(provisional.kind, MediaKind::Floorplan);

    let asset = harness
        .media
        .complete_upload(provisional)
        .await
        .expect("floorplan persisted");
    assert!(!asset.is_cover);
    assert!(asset.url.contains(&asset.object_key));
}

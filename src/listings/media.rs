use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::domain::{FileMetadata, MediaAsset, MediaId, MediaKind, Property, PropertyId};
use super::error::ListingError;
use super::ports::{
    IdentityProvider, MediaStore, ObjectStorageGateway, PropertyRepository, UploadHandle,
};

static MEDIA_SEQUENCE: AtomicU64 = AtomicU64::new(1);
static UPLOAD_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_media_id() -> MediaId {
    let id = MEDIA_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    MediaId(format!("media-{id:06}"))
}

fn next_correlation_id() -> String {
    let id = UPLOAD_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    format!("upload-{id:06}")
}

/// Descriptor the caller supplies when starting an upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadRequest {
    pub file_name: String,
    pub content_type: String,
    pub size_bytes: Option<u64>,
}

/// An upload that has a storage handle but no durable record yet. Callers
/// may render a local preview keyed by `correlation_id`, but the entry is
/// not part of the gallery's ordering or cover invariants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProvisionalAsset {
    pub correlation_id: String,
    pub property_id: PropertyId,
    pub kind: MediaKind,
    pub upload: UploadHandle,
    pub metadata: FileMetadata,
    pub requested_at: DateTime<Utc>,
}

/// The two phases of an asset's life as a tagged union; reconciliation
/// replaces the provisional variant with the durable one, keyed by the
/// correlation id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum PendingAsset {
    Provisional(ProvisionalAsset),
    Durable(MediaAsset),
}

impl PendingAsset {
    pub fn is_durable(&self) -> bool {
        matches!(self, PendingAsset::Durable(_))
    }
}

fn kind_for_content_type(content_type: &str) -> Result<MediaKind, ListingError> {
    let mime: mime::Mime = content_type.parse().map_err(|_| {
        ListingError::Validation(format!("unparseable content type '{content_type}'"))
    })?;

    if mime.type_() == mime::IMAGE {
        Ok(MediaKind::Image)
    } else if mime.type_() == mime::VIDEO {
        Ok(MediaKind::Video)
    } else if mime.type_() == mime::APPLICATION && mime.subtype() == mime::PDF {
        Ok(MediaKind::Floorplan)
    } else {
        Err(ListingError::Validation(format!(
            "unsupported media content type '{content_type}'"
        )))
    }
}

/// Orchestrates the upload pipeline, cover designation, and ordering of a
/// property's media assets.
pub struct MediaAssetManager {
    repository: Arc<dyn PropertyRepository>,
    media: Arc<dyn MediaStore>,
    storage: Arc<dyn ObjectStorageGateway>,
    identity: Arc<dyn IdentityProvider>,
}

impl MediaAssetManager {
    pub fn new(
        repository: Arc<dyn PropertyRepository>,
        media: Arc<dyn MediaStore>,
        storage: Arc<dyn ObjectStorageGateway>,
        identity: Arc<dyn IdentityProvider>,
    ) -> Self {
        Self {
            repository,
            media,
            storage,
            identity,
        }
    }

    async fn scoped_property(&self, id: &PropertyId) -> Result<Property, ListingError> {
        let profile = self.identity.current().await?;
        let org = profile.org_id.ok_or_else(ListingError::missing_org)?;
        self.repository
            .fetch(&org, id)
            .await?
            .filter(|property| !property.is_deleted())
            .ok_or(ListingError::NotFound("property"))
    }

    /// Phase 1: validate the descriptor and obtain a direct-to-storage
    /// upload handle. The binary transfer happens outside this core.
    pub async fn begin_upload(
        &self,
        property_id: &PropertyId,
        request: UploadRequest,
    ) -> Result<ProvisionalAsset, ListingError> {
        self.scoped_property(property_id).await?;

        if request.file_name.trim().is_empty() {
            return Err(ListingError::Validation(
                "upload needs a file name".to_string(),
            ));
        }
        let kind = kind_for_content_type(&request.content_type)?;

        let upload = self
            .storage
            .request_upload_handle(&request.file_name, &request.content_type)
            .await?;

        let provisional = ProvisionalAsset {
            correlation_id: next_correlation_id(),
            property_id: property_id.clone(),
            kind,
            metadata: FileMetadata {
                file_name: request.file_name,
                content_type: request.content_type,
                size_bytes: request.size_bytes,
                extra: Default::default(),
            },
            upload,
            requested_at: Utc::now(),
        };

        info!(
            property = %property_id.0,
            correlation = %provisional.correlation_id,
            object_key = %provisional.upload.object_key,
            "upload handle issued"
        );
        Ok(provisional)
    }

    /// Phase 3: the transfer succeeded, so persist the durable record.
    /// Appends at the end of the gallery; the first image automatically
    /// becomes cover. On failure the binary already in storage is left as
    /// an orphan for the out-of-band sweep.
    pub async fn complete_upload(
        &self,
        provisional: ProvisionalAsset,
    ) -> Result<MediaAsset, ListingError> {
        let property_id = provisional.property_id.clone();
        self.scoped_property(&property_id).await?;

        let url = self
            .storage
            .request_download_url(&provisional.upload.object_key)
            .await?;

        // Position and cover are assigned by the store under its own lock
        // when the record lands, so uploads for one property that run
        // concurrently cannot collide on either.
        let asset = MediaAsset {
            id: next_media_id(),
            property_id: property_id.clone(),
            kind: provisional.kind,
            position: 0,
            is_cover: false,
            object_key: provisional.upload.object_key,
            url,
            metadata: provisional.metadata,
            created_at: Utc::now(),
        };

        let stored = self.media.insert(asset).await.map_err(|err| {
            warn!(
                property = %property_id.0,
                correlation = %provisional.correlation_id,
                "media persistence failed after transfer, object orphaned"
            );
            ListingError::upstream("media persistence", err)
        })?;

        info!(
            property = %property_id.0,
            media = %stored.id.0,
            correlation = %provisional.correlation_id,
            cover = stored.is_cover,
            "media asset reconciled"
        );
        Ok(stored)
    }

    /// Discard a provisional entry whose transfer failed or was abandoned.
    /// The storage object, if any was written, becomes an orphan.
    pub fn abandon(&self, provisional: ProvisionalAsset) {
        info!(
            property = %provisional.property_id.0,
            correlation = %provisional.correlation_id,
            "provisional upload abandoned"
        );
    }

    /// Assets for a property, position ascending.
    pub async fn list(&self, property_id: &PropertyId) -> Result<Vec<MediaAsset>, ListingError> {
        self.scoped_property(property_id).await?;
        Ok(self.media.list_by_property(property_id).await?)
    }

    /// Delete an asset, close the position gap, and hand the cover to the
    /// first remaining image when the cover was removed.
    pub async fn remove(
        &self,
        property_id: &PropertyId,
        media_id: &MediaId,
    ) -> Result<(), ListingError> {
        self.scoped_property(property_id).await?;

        let assets = self.media.list_by_property(property_id).await?;
        let removed = assets
            .iter()
            .find(|asset| &asset.id == media_id)
            .cloned()
            .ok_or(ListingError::NotFound("media asset"))?;

        let mut remaining: Vec<MediaAsset> = assets
            .into_iter()
            .filter(|asset| &asset.id != media_id)
            .collect();
        for (index, asset) in remaining.iter_mut().enumerate() {
            asset.position = index as u32;
        }

        if removed.is_cover {
            if let Some(first_image) = remaining
                .iter_mut()
                .find(|asset| asset.kind == MediaKind::Image)
            {
                first_image.is_cover = true;
            }
        }

        self.media.replace_all(property_id, remaining).await?;
        info!(property = %property_id.0, media = %media_id.0, "media asset removed");
        Ok(())
    }

    /// Designate the target image as the single cover for the property.
    pub async fn set_cover(
        &self,
        property_id: &PropertyId,
        media_id: &MediaId,
    ) -> Result<(), ListingError> {
        self.scoped_property(property_id).await?;

        let mut assets = self.media.list_by_property(property_id).await?;
        let target = assets
            .iter()
            .find(|asset| &asset.id == media_id)
            .ok_or(ListingError::NotFound("media asset"))?;
        if target.kind != MediaKind::Image {
            return Err(ListingError::Validation(
                "only an image can be the cover".to_string(),
            ));
        }

        for asset in assets.iter_mut() {
            asset.is_cover = &asset.id == media_id;
        }

        self.media.replace_all(property_id, assets).await?;
        info!(property = %property_id.0, media = %media_id.0, "cover reassigned");
        Ok(())
    }

    /// Reassign positions by the order of `ordered_ids`, which must be a
    /// permutation of the property's current asset ids. Cover designation
    /// is independent of order and left untouched.
    pub async fn reorder(
        &self,
        property_id: &PropertyId,
        ordered_ids: &[MediaId],
    ) -> Result<(), ListingError> {
        self.scoped_property(property_id).await?;

        let assets = self.media.list_by_property(property_id).await?;

        let mut seen = std::collections::HashSet::new();
        for id in ordered_ids {
            if !seen.insert(id) {
                return Err(ListingError::Conflict(format!(
                    "duplicate media id '{}' in reorder",
                    id.0
                )));
            }
        }
        if ordered_ids.len() != assets.len()
            || !assets.iter().all(|asset| seen.contains(&asset.id))
        {
            return Err(ListingError::Validation(
                "reorder list must be a permutation of the property's asset ids".to_string(),
            ));
        }

        let mut reordered = Vec::with_capacity(assets.len());
        for (index, id) in ordered_ids.iter().enumerate() {
            let mut asset = assets
                .iter()
                .find(|asset| &asset.id == id)
                .cloned()
                .ok_or(ListingError::NotFound("media asset"))?;
            asset.position = index as u32;
            reordered.push(asset);
        }

        self.media.replace_all(property_id, reordered).await?;
        info!(property = %property_id.0, "gallery reordered");
        Ok(())
    }
}

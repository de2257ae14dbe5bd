use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;

use super::browse::{BrowseOutcome, ListingBrowser};
use super::documents::{DocumentLocator, DocumentVerificationManager};
use super::domain::{
    DocumentId, DocumentType, FileMetadata, ListingFilters, MediaId, PropertyDraft, PropertyId,
    PropertyPatch, UserId, VerificationStatus,
};
use super::error::{ErrorKind, ListingError};
use super::lifecycle::PropertyLifecycleManager;
use super::media::{MediaAssetManager, ProvisionalAsset, UploadRequest};
use super::similarity::SimilarityRecommender;

/// Shared handles for the HTTP handlers.
#[derive(Clone)]
pub struct ListingState {
    pub lifecycle: Arc<PropertyLifecycleManager>,
    pub media: Arc<MediaAssetManager>,
    pub documents: Arc<DocumentVerificationManager>,
    pub browser: Arc<ListingBrowser>,
    pub recommender: Arc<SimilarityRecommender>,
}

impl IntoResponse for ListingError {
    fn into_response(self) -> Response {
        let status = match self.kind() {
            ErrorKind::Auth => StatusCode::UNAUTHORIZED,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Validation => StatusCode::UNPROCESSABLE_ENTITY,
            ErrorKind::Conflict | ErrorKind::GuardFailed => StatusCode::CONFLICT,
            ErrorKind::Unknown => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = Json(json!({
            "kind": self.kind().label(),
            "error": self.to_string(),
        }));
        (status, body).into_response()
    }
}

/// Router builder exposing the listing workflow endpoints.
pub fn listing_router(state: ListingState) -> Router {
    Router::new()
        .route("/api/v1/properties", post(create_handler).get(list_handler))
        .route(
            "/api/v1/properties/:property_id",
            get(get_handler).patch(update_handler).delete(delete_handler),
        )
        .route("/api/v1/properties/:property_id/publish", post(publish_handler))
        .route(
            "/api/v1/properties/:property_id/schedule-publish",
            post(schedule_publish_handler),
        )
        .route("/api/v1/properties/:property_id/pause", post(pause_handler))
        .route("/api/v1/properties/:property_id/sold", post(mark_sold_handler))
        .route("/api/v1/properties/:property_id/similar", get(similar_handler))
        .route(
            "/api/v1/properties/:property_id/media",
            get(list_media_handler).post(complete_upload_handler),
        )
        .route(
            "/api/v1/properties/:property_id/media/uploads",
            post(begin_upload_handler),
        )
        .route(
            "/api/v1/properties/:property_id/media/order",
            put(reorder_handler),
        )
        .route(
            "/api/v1/properties/:property_id/media/:media_id",
            delete(remove_media_handler),
        )
        .route(
            "/api/v1/properties/:property_id/media/:media_id/cover",
            post(set_cover_handler),
        )
        .route(
            "/api/v1/properties/:property_id/documents",
            get(list_documents_handler).post(attach_document_handler),
        )
        .route(
            "/api/v1/properties/:property_id/documents/:document_id",
            delete(delete_document_handler),
        )
        .route(
            "/api/v1/properties/:property_id/documents/:document_id/verify",
            post(verify_document_handler),
        )
        .with_state(state)
}

#[derive(Debug, Deserialize)]
struct CreatePropertyRequest {
    owner_id: String,
    #[serde(flatten)]
    draft: PropertyDraft,
}

async fn create_handler(
    State(state): State<ListingState>,
    Json(request): Json<CreatePropertyRequest>,
) -> Result<Response, ListingError> {
    let property = state
        .lifecycle
        .create(UserId(request.owner_id), request.draft)
        .await?;
    Ok((StatusCode::CREATED, Json(property)).into_response())
}

async fn get_handler(
    State(state): State<ListingState>,
    Path(property_id): Path<String>,
) -> Result<Response, ListingError> {
    let property = state.lifecycle.get(&PropertyId(property_id)).await?;
    Ok(Json(property).into_response())
}

async fn update_handler(
    State(state): State<ListingState>,
    Path(property_id): Path<String>,
    Json(patch): Json<PropertyPatch>,
) -> Result<Response, ListingError> {
    let property = state
        .lifecycle
        .update(&PropertyId(property_id), patch)
        .await?;
    Ok(Json(property).into_response())
}

async fn delete_handler(
    State(state): State<ListingState>,
    Path(property_id): Path<String>,
) -> Result<Response, ListingError> {
    state.lifecycle.delete(&PropertyId(property_id)).await?;
    Ok(StatusCode::NO_CONTENT.into_response())
}

async fn publish_handler(
    State(state): State<ListingState>,
    Path(property_id): Path<String>,
) -> Result<Response, ListingError> {
    let property = state.lifecycle.publish(&PropertyId(property_id)).await?;
    Ok(Json(property).into_response())
}

#[derive(Debug, Deserialize)]
struct SchedulePublishRequest {
    at: DateTime<Utc>,
}

async fn schedule_publish_handler(
    State(state): State<ListingState>,
    Path(property_id): Path<String>,
    Json(request): Json<SchedulePublishRequest>,
) -> Result<Response, ListingError> {
    let property = state
        .lifecycle
        .schedule_publish(&PropertyId(property_id), request.at)
        .await?;
    Ok(Json(property).into_response())
}

async fn pause_handler(
    State(state): State<ListingState>,
    Path(property_id): Path<String>,
) -> Result<Response, ListingError> {
    let property = state.lifecycle.pause(&PropertyId(property_id)).await?;
    Ok(Json(property).into_response())
}

#[derive(Debug, Deserialize)]
struct MarkSoldRequest {
    sold_at: DateTime<Utc>,
    note: Option<String>,
}

async fn mark_sold_handler(
    State(state): State<ListingState>,
    Path(property_id): Path<String>,
    Json(request): Json<MarkSoldRequest>,
) -> Result<Response, ListingError> {
    let property = state
        .lifecycle
        .mark_sold(&PropertyId(property_id), request.sold_at, request.note)
        .await?;
    Ok(Json(property).into_response())
}

async fn list_handler(
    State(state): State<ListingState>,
    Query(filters): Query<ListingFilters>,
) -> Result<Response, ListingError> {
    match state.browser.list(&filters).await? {
        BrowseOutcome::Fresh(page) => Ok(Json(page).into_response()),
        BrowseOutcome::Stale => {
            let body = Json(json!({
                "kind": "stale",
                "error": "superseded by a newer query",
            }));
            Ok((StatusCode::CONFLICT, body).into_response())
        }
    }
}

#[derive(Debug, Deserialize)]
struct SimilarQuery {
    #[serde(default = "default_similar_limit")]
    limit: usize,
}

fn default_similar_limit() -> usize {
    6
}

async fn similar_handler(
    State(state): State<ListingState>,
    Path(property_id): Path<String>,
    Query(query): Query<SimilarQuery>,
) -> Result<Response, ListingError> {
    let ranked = state
        .recommender
        .recommend(&PropertyId(property_id), query.limit)
        .await?;
    Ok(Json(ranked).into_response())
}

async fn begin_upload_handler(
    State(state): State<ListingState>,
    Path(property_id): Path<String>,
    Json(request): Json<UploadRequest>,
) -> Result<Response, ListingError> {
    let provisional = state
        .media
        .begin_upload(&PropertyId(property_id), request)
        .await?;
    Ok((StatusCode::ACCEPTED, Json(provisional)).into_response())
}

async fn complete_upload_handler(
    State(state): State<ListingState>,
    Path(property_id): Path<String>,
    Json(provisional): Json<ProvisionalAsset>,
) -> Result<Response, ListingError> {
    if provisional.property_id.0 != property_id {
        return Err(ListingError::Validation(
            "provisional asset belongs to a different property".to_string(),
        ));
    }
    let asset = state.media.complete_upload(provisional).await?;
    Ok((StatusCode::CREATED, Json(asset)).into_response())
}

async fn list_media_handler(
    State(state): State<ListingState>,
    Path(property_id): Path<String>,
) -> Result<Response, ListingError> {
    let assets = state.media.list(&PropertyId(property_id)).await?;
    Ok(Json(assets).into_response())
}

async fn remove_media_handler(
    State(state): State<ListingState>,
    Path((property_id, media_id)): Path<(String, String)>,
) -> Result<Response, ListingError> {
    state
        .media
        .remove(&PropertyId(property_id), &MediaId(media_id))
        .await?;
    Ok(StatusCode::NO_CONTENT.into_response())
}

async fn set_cover_handler(
    State(state): State<ListingState>,
    Path((property_id, media_id)): Path<(String, String)>,
) -> Result<Response, ListingError> {
    state
        .media
        .set_cover(&PropertyId(property_id), &MediaId(media_id))
        .await?;
    Ok(StatusCode::NO_CONTENT.into_response())
}

#[derive(Debug, Deserialize)]
struct ReorderRequest {
    ordered_ids: Vec<String>,
}

async fn reorder_handler(
    State(state): State<ListingState>,
    Path(property_id): Path<String>,
    Json(request): Json<ReorderRequest>,
) -> Result<Response, ListingError> {
    let ordered: Vec<MediaId> = request.ordered_ids.into_iter().map(MediaId).collect();
    state
        .media
        .reorder(&PropertyId(property_id), &ordered)
        .await?;
    Ok(StatusCode::NO_CONTENT.into_response())
}

#[derive(Debug, Deserialize)]
struct AttachDocumentRequest {
    doc_type: DocumentType,
    #[serde(default)]
    locator: DocumentLocator,
    #[serde(default)]
    metadata: FileMetadata,
    /// Trusted-ingestion callers insert directly as verified.
    #[serde(default)]
    trusted: bool,
}

async fn attach_document_handler(
    State(state): State<ListingState>,
    Path(property_id): Path<String>,
    Json(request): Json<AttachDocumentRequest>,
) -> Result<Response, ListingError> {
    let property_id = PropertyId(property_id);
    let document = if request.trusted {
        state
            .documents
            .attach_verified(
                &property_id,
                request.doc_type,
                request.locator,
                request.metadata,
            )
            .await?
    } else {
        state
            .documents
            .attach(
                &property_id,
                request.doc_type,
                request.locator,
                request.metadata,
            )
            .await?
    };
    Ok((StatusCode::CREATED, Json(document)).into_response())
}

async fn list_documents_handler(
    State(state): State<ListingState>,
    Path(property_id): Path<String>,
) -> Result<Response, ListingError> {
    let documents = state
        .documents
        .list_by_property(&PropertyId(property_id))
        .await?;
    Ok(Json(documents).into_response())
}

async fn delete_document_handler(
    State(state): State<ListingState>,
    Path((property_id, document_id)): Path<(String, String)>,
) -> Result<Response, ListingError> {
    state
        .documents
        .delete(&PropertyId(property_id), &DocumentId(document_id))
        .await?;
    Ok(StatusCode::NO_CONTENT.into_response())
}

#[derive(Debug, Deserialize)]
struct VerifyDocumentRequest {
    status: VerificationStatus,
}

async fn verify_document_handler(
    State(state): State<ListingState>,
    Path((property_id, document_id)): Path<(String, String)>,
    Json(request): Json<VerifyDocumentRequest>,
) -> Result<Response, ListingError> {
    let document = state
        .documents
        .verify(
            &PropertyId(property_id),
            &DocumentId(document_id),
            request.status,
        )
        .await?;
    Ok(Json(document).into_response())
}

//! Marker handlers: CRUD, label listing and geotagged import.

use axum::extract::multipart::MultipartRejection;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{DefaultBodyLimit, Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post, put};
use axum::{Json, Router};

use super::upload::read_multipart;
use crate::api::dto::{
    CreateMarkerRequest, ImportResponse, MarkerDto, MarkerListParams, UpdateMarkerRequest,
};
use crate::app_state::AppState;
use crate::domain::{LayerId, MarkerDraft, MarkerId, MarkerPatch};
use crate::error::{ErrorResponse, MapError};

/// `GET /api/markers` — List markers, newest first.
///
/// # Errors
///
/// Returns [`MapError::InvalidRequest`] for a malformed `layerId`.
#[utoipa::path(
    get,
    path = "/api/markers",
    tag = "Markers",
    summary = "List markers",
    description = "Returns markers newest first, each with its layer. `layerId` restricts the list to one layer.",
    params(MarkerListParams),
    responses(
        (status = 200, description = "Marker list", body = Vec<MarkerDto>),
        (status = 400, description = "Malformed layerId", body = ErrorResponse),
    )
)]
pub async fn list_markers(
    State(state): State<AppState>,
    params: Result<Query<MarkerListParams>, QueryRejection>,
) -> Result<impl IntoResponse, MapError> {
    let Query(params) = params?;
    let markers = state.marker_service.list(params.layer_id).await?;
    Ok(Json(
        markers.into_iter().map(MarkerDto::from).collect::<Vec<_>>(),
    ))
}

/// `GET /api/markers/labels` — Every label in use, sorted.
///
/// # Errors
///
/// Returns [`MapError::Storage`] on backend failure.
#[utoipa::path(
    get,
    path = "/api/markers/labels",
    tag = "Markers",
    summary = "List labels",
    description = "Sorted, de-duplicated union of all marker labels. Malformed stored labels are skipped.",
    responses(
        (status = 200, description = "Labels", body = Vec<String>),
    )
)]
pub async fn list_labels(State(state): State<AppState>) -> Result<impl IntoResponse, MapError> {
    Ok(Json(state.marker_service.labels().await?))
}

/// `POST /api/markers` — Create a marker.
///
/// # Errors
///
/// Returns [`MapError::InvalidRequest`] or [`MapError::LayerNotFound`].
#[utoipa::path(
    post,
    path = "/api/markers",
    tag = "Markers",
    summary = "Create a marker",
    description = "Requires `name` or `photo`, plus `latitude`, `longitude` and `layerId`.",
    request_body = CreateMarkerRequest,
    responses(
        (status = 201, description = "Marker created", body = MarkerDto),
        (status = 400, description = "Missing or invalid fields", body = ErrorResponse),
        (status = 404, description = "Layer not found", body = ErrorResponse),
    )
)]
pub async fn create_marker(
    State(state): State<AppState>,
    payload: Result<Json<CreateMarkerRequest>, JsonRejection>,
) -> Result<impl IntoResponse, MapError> {
    let Json(req) = payload?;
    let record = state
        .marker_service
        .create(MarkerDraft::try_from(req)?)
        .await?;
    Ok((StatusCode::CREATED, Json(MarkerDto::from(record))))
}

/// `PUT /api/markers/{id}` — Update a marker.
///
/// # Errors
///
/// Returns [`MapError::MarkerNotFound`], [`MapError::LayerNotFound`] or
/// [`MapError::InvalidRequest`].
#[utoipa::path(
    put,
    path = "/api/markers/{id}",
    tag = "Markers",
    summary = "Update a marker",
    description = "Partial update. Omitted fields are unchanged, `null` clears. Labels are only replaced when sent.",
    params(
        ("id" = uuid::Uuid, Path, description = "Marker UUID"),
    ),
    request_body = UpdateMarkerRequest,
    responses(
        (status = 200, description = "Updated marker", body = MarkerDto),
        (status = 400, description = "Invalid fields", body = ErrorResponse),
        (status = 404, description = "Marker or layer not found", body = ErrorResponse),
    )
)]
pub async fn update_marker(
    State(state): State<AppState>,
    id: Result<Path<MarkerId>, PathRejection>,
    payload: Result<Json<UpdateMarkerRequest>, JsonRejection>,
) -> Result<impl IntoResponse, MapError> {
    let Path(id) = id?;
    let Json(req) = payload?;
    let record = state
        .marker_service
        .update(id, MarkerPatch::try_from(req)?)
        .await?;
    Ok(Json(MarkerDto::from(record)))
}

/// `DELETE /api/markers/{id}` — Delete a marker.
///
/// # Errors
///
/// Returns [`MapError::MarkerNotFound`] if the marker does not exist.
#[utoipa::path(
    delete,
    path = "/api/markers/{id}",
    tag = "Markers",
    summary = "Delete a marker",
    params(
        ("id" = uuid::Uuid, Path, description = "Marker UUID"),
    ),
    responses(
        (status = 204, description = "Marker deleted"),
        (status = 404, description = "Marker not found", body = ErrorResponse),
    )
)]
pub async fn delete_marker(
    State(state): State<AppState>,
    id: Result<Path<MarkerId>, PathRejection>,
) -> Result<impl IntoResponse, MapError> {
    let Path(id) = id?;
    state.marker_service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `POST /api/markers/import` — Create photo markers from geotagged images.
///
/// # Errors
///
/// Returns a 400 when no file is sent or none carries GPS data, 404 for
/// an unknown `layerId`, or 413 when a file is too large.
#[utoipa::path(
    post,
    path = "/api/markers/import",
    tag = "Markers",
    summary = "Import geotagged photos",
    description = "Multipart field `images` plus optional `layerId`. Each image with EXIF GPS becomes an unnamed photo marker; the rest are reported in `skipped`.",
    request_body(content_type = "multipart/form-data", description = "Fields `images` and `layerId`"),
    responses(
        (status = 200, description = "Import result", body = ImportResponse),
        (status = 400, description = "No files or no GPS data", body = ErrorResponse),
        (status = 404, description = "Layer not found", body = ErrorResponse),
        (status = 413, description = "File too large", body = ErrorResponse),
    )
)]
pub async fn import_markers(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<impl IntoResponse, MapError> {
    let multipart = multipart?;
    let uploads = &state.upload_service;
    let parts = read_multipart(
        multipart,
        &["images", "images[]"],
        uploads.max_files(),
        uploads.max_file_bytes(),
    )
    .await?;
    let layer = match parts.fields.get("layerId").map(|v| v.trim()) {
        None | Some("") => None,
        Some(raw) => Some(LayerId::from_uuid(raw.parse().map_err(|_| {
            MapError::InvalidRequest(format!("layerId is not a UUID: {raw:?}"))
        })?)),
    };
    let outcome = state.import_service.import(parts.files, layer).await?;
    Ok(Json(ImportResponse::from(outcome)))
}

/// Marker routes. `body_limit` caps the import request body.
pub fn routes(body_limit: usize) -> Router<AppState> {
    Router::new()
        .route("/markers", get(list_markers).post(create_marker))
        .route("/markers/labels", get(list_labels))
        .route(
            "/markers/import",
            post(import_markers).layer(DefaultBodyLimit::max(body_limit)),
        )
        .route("/markers/{id}", put(update_marker).delete(delete_marker))
}

//! Image upload handlers: single and bulk.

use std::collections::HashMap;

use axum::extract::multipart::MultipartRejection;
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};

use crate::api::dto::{BulkUploadResponse, UploadResponse};
use crate::app_state::AppState;
use crate::error::{ErrorResponse, MapError};
use crate::service::UploadFile;

/// Files and text fields read from a multipart body.
#[derive(Debug, Default)]
pub(crate) struct MultipartParts {
    pub(crate) files: Vec<UploadFile>,
    pub(crate) fields: HashMap<String, String>,
}

/// Drains a multipart body.
///
/// File parts are only accepted under `file_fields`; any other file part
/// is rejected. Reading stops as soon as a limit is crossed.
pub(crate) async fn read_multipart(
    mut multipart: Multipart,
    file_fields: &[&str],
    max_files: usize,
    max_file_bytes: usize,
) -> Result<MultipartParts, MapError> {
    let mut parts = MultipartParts::default();
    while let Some(mut field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        let Some(file_name) = field.file_name().map(str::to_string) else {
            let text = field.text().await?;
            parts.fields.insert(name, text);
            continue;
        };
        if !file_fields.contains(&name.as_str()) {
            return Err(MapError::InvalidRequest(format!(
                "unexpected file field {name:?}"
            )));
        }
        if parts.files.len() >= max_files {
            return Err(MapError::TooManyFiles { max: max_files });
        }

        let content_type = field.content_type().map(str::to_string);
        let mut bytes = Vec::new();
        while let Some(chunk) = field.chunk().await? {
            if bytes.len() + chunk.len() > max_file_bytes {
                return Err(MapError::FileTooLarge {
                    max_bytes: max_file_bytes,
                });
            }
            bytes.extend_from_slice(&chunk);
        }
        parts.files.push(UploadFile {
            file_name,
            content_type,
            bytes: bytes.into(),
        });
    }
    Ok(parts)
}

/// `POST /api/upload/image` — Store one image.
///
/// # Errors
///
/// Returns a 400 for a missing or unsupported file, 413 when too large,
/// or 500 when HEIC/HEIF conversion fails.
#[utoipa::path(
    post,
    path = "/api/upload/image",
    tag = "Uploads",
    summary = "Upload one image",
    description = "Multipart field `image`. JPEG, PNG, GIF, WebP, HEIC and HEIF are accepted; HEIC/HEIF is converted to JPEG.",
    request_body(content_type = "multipart/form-data", description = "Field `image`"),
    responses(
        (status = 200, description = "Stored file URL", body = UploadResponse),
        (status = 400, description = "No file or unsupported type", body = ErrorResponse),
        (status = 413, description = "File too large", body = ErrorResponse),
        (status = 500, description = "Conversion failed", body = ErrorResponse),
    )
)]
pub async fn upload_image(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<impl IntoResponse, MapError> {
    let multipart = multipart?;
    let uploads = &state.upload_service;
    let parts = read_multipart(multipart, &["image"], 1, uploads.max_file_bytes()).await?;
    let file = parts
        .files
        .into_iter()
        .next()
        .ok_or(MapError::NoFileUploaded)?;
    let url = uploads.store_one(file).await?;
    Ok(Json(UploadResponse { url }))
}

/// `POST /api/upload/images` — Store several images.
///
/// # Errors
///
/// Returns a 400 for no files, too many files or an unsupported file,
/// or 413 when a file is too large. Nothing is stored on error.
#[utoipa::path(
    post,
    path = "/api/upload/images",
    tag = "Uploads",
    summary = "Upload several images",
    description = "Multipart field `images` (or `images[]`), up to 50 files. Files whose HEIC/HEIF conversion fails are left out of `urls`.",
    request_body(content_type = "multipart/form-data", description = "Field `images`"),
    responses(
        (status = 200, description = "Stored file URLs", body = BulkUploadResponse),
        (status = 400, description = "No files, too many, or unsupported type", body = ErrorResponse),
        (status = 413, description = "File too large", body = ErrorResponse),
    )
)]
pub async fn upload_images(
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
    let urls = uploads.store_many(parts.files).await?;
    Ok(Json(BulkUploadResponse { urls }))
}

/// Upload routes. `body_limit` caps a whole request body.
pub fn routes(body_limit: usize) -> Router<AppState> {
    Router::new()
        .route("/upload/image", post(upload_image))
        .route("/upload/images", post(upload_images))
        .layer(DefaultBodyLimit::max(body_limit))
}

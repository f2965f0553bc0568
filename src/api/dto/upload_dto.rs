//! Upload response bodies.

use serde::Serialize;
use utoipa::ToSchema;

/// Response body for `POST /api/upload/image`.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UploadResponse {
    /// Public URL of the stored file.
    pub url: String,
}

/// Response body for `POST /api/upload/images`.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BulkUploadResponse {
    /// Public URLs of the stored files, in request order. Files that
    /// failed conversion are omitted.
    pub urls: Vec<String>,
}

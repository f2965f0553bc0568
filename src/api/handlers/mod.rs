//! REST endpoint handlers organized by resource.

pub mod geocode;
pub mod layer;
pub mod marker;
pub mod system;
pub mod upload;

use axum::Router;

use crate::app_state::AppState;

/// Composes all resource routes under `/api`.
///
/// `upload_body_limit` caps multipart request bodies; JSON routes keep
/// axum's default limit.
pub fn routes(upload_body_limit: usize) -> Router<AppState> {
    Router::new()
        .merge(layer::routes())
        .merge(marker::routes(upload_body_limit))
        .merge(upload::routes(upload_body_limit))
        .merge(geocode::routes())
}

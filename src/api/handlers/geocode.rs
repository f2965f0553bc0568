//! Address search handler.

use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};

use crate::api::dto::{GeocodeParams, GeocodeResponse};
use crate::app_state::AppState;
use crate::error::{ErrorResponse, MapError};

/// `GET /api/geocode?q=` — Resolve an address to coordinates.
///
/// # Errors
///
/// Returns 400 for an empty query, 404 when nothing matches, or 502 when
/// the upstream geocoder fails.
#[utoipa::path(
    get,
    path = "/api/geocode",
    tag = "Geocoding",
    summary = "Search an address",
    description = "Returns the best match from the configured Nominatim-compatible geocoder.",
    params(GeocodeParams),
    responses(
        (status = 200, description = "Best match", body = GeocodeResponse),
        (status = 400, description = "Empty query", body = ErrorResponse),
        (status = 404, description = "No match", body = ErrorResponse),
        (status = 502, description = "Upstream failure", body = ErrorResponse),
    )
)]
pub async fn geocode(
    State(state): State<AppState>,
    params: Result<Query<GeocodeParams>, QueryRejection>,
) -> Result<impl IntoResponse, MapError> {
    let Query(params) = params?;
    let result = state.geocoder.search(&params.q).await?;
    Ok(Json(GeocodeResponse::from(result)))
}

/// Geocoding routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/geocode", get(geocode))
}

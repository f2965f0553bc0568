//! Layer CRUD handlers: list, create, update, delete.

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, put};
use axum::{Json, Router};

use crate::api::dto::{CreateLayerRequest, LayerDto, UpdateLayerRequest};
use crate::app_state::AppState;
use crate::domain::LayerId;
use crate::error::{ErrorResponse, MapError};

/// `GET /api/layers` — List layers with marker counts.
///
/// # Errors
///
/// Returns [`MapError::Storage`] on backend failure.
#[utoipa::path(
    get,
    path = "/api/layers",
    tag = "Layers",
    summary = "List layers",
    description = "Returns every layer, oldest first, each with `_count.markers`.",
    responses(
        (status = 200, description = "Layer list", body = Vec<LayerDto>),
        (status = 500, description = "Storage failure", body = ErrorResponse),
    )
)]
pub async fn list_layers(State(state): State<AppState>) -> Result<impl IntoResponse, MapError> {
    let layers = state.layer_service.list().await?;
    Ok(Json(
        layers.into_iter().map(LayerDto::from).collect::<Vec<_>>(),
    ))
}

/// `POST /api/layers` — Create a layer.
///
/// # Errors
///
/// Returns [`MapError::InvalidRequest`] on a blank name or bad color.
#[utoipa::path(
    post,
    path = "/api/layers",
    tag = "Layers",
    summary = "Create a layer",
    description = "Creates a visible layer. `color` defaults to `#FF5733`.",
    request_body = CreateLayerRequest,
    responses(
        (status = 201, description = "Layer created", body = LayerDto),
        (status = 400, description = "Invalid name or color", body = ErrorResponse),
    )
)]
pub async fn create_layer(
    State(state): State<AppState>,
    payload: Result<Json<CreateLayerRequest>, JsonRejection>,
) -> Result<impl IntoResponse, MapError> {
    let Json(req) = payload?;
    let layer = state
        .layer_service
        .create(req.name.as_deref(), req.color.as_deref())
        .await?;
    Ok((StatusCode::CREATED, Json(LayerDto::from(layer))))
}

/// `PUT /api/layers/{id}` — Update name, color or visibility.
///
/// # Errors
///
/// Returns [`MapError::LayerNotFound`] or [`MapError::InvalidRequest`].
#[utoipa::path(
    put,
    path = "/api/layers/{id}",
    tag = "Layers",
    summary = "Update a layer",
    description = "Applies a partial update; omitted fields are unchanged.",
    params(
        ("id" = uuid::Uuid, Path, description = "Layer UUID"),
    ),
    request_body = UpdateLayerRequest,
    responses(
        (status = 200, description = "Updated layer", body = LayerDto),
        (status = 400, description = "Invalid name or color", body = ErrorResponse),
        (status = 404, description = "Layer not found", body = ErrorResponse),
    )
)]
pub async fn update_layer(
    State(state): State<AppState>,
    id: Result<Path<LayerId>, PathRejection>,
    payload: Result<Json<UpdateLayerRequest>, JsonRejection>,
) -> Result<impl IntoResponse, MapError> {
    let Path(id) = id?;
    let Json(req) = payload?;
    let layer = state.layer_service.update(id, req.into()).await?;
    Ok(Json(LayerDto::from(layer)))
}

/// `DELETE /api/layers/{id}` — Delete a layer and all of its markers.
///
/// # Errors
///
/// Returns [`MapError::LayerNotFound`] if the layer does not exist.
#[utoipa::path(
    delete,
    path = "/api/layers/{id}",
    tag = "Layers",
    summary = "Delete a layer",
    description = "Removes the layer and every marker in it in one transaction.",
    params(
        ("id" = uuid::Uuid, Path, description = "Layer UUID"),
    ),
    responses(
        (status = 204, description = "Layer deleted"),
        (status = 404, description = "Layer not found", body = ErrorResponse),
    )
)]
pub async fn delete_layer(
    State(state): State<AppState>,
    id: Result<Path<LayerId>, PathRejection>,
) -> Result<impl IntoResponse, MapError> {
    let Path(id) = id?;
    state.layer_service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Layer routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/layers", get(list_layers).post(create_layer))
        .route("/layers/{id}", put(update_layer).delete(delete_layer))
}

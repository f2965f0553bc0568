//! OpenAPI document for the REST API.

use utoipa::OpenApi;

use super::dto::{
    BulkUploadResponse, CreateLayerRequest, CreateMarkerRequest, GeocodeResponse, ImportResponse,
    LayerCountDto, LayerDto, MarkerDto, SkippedImportDto, UpdateLayerRequest,
    UpdateMarkerRequest, UploadResponse,
};
use super::handlers::{geocode, layer, marker, system, upload};
use crate::error::{ErrorBody, ErrorResponse};

/// Generated OpenAPI specification, served at `/api-docs/openapi.json`.
#[derive(Debug, OpenApi)]
#[openapi(
    info(
        title = "FairMap API",
        description = "Layers, markers, image uploads and address search for a collaborative map."
    ),
    paths(
        layer::list_layers,
        layer::create_layer,
        layer::update_layer,
        layer::delete_layer,
        marker::list_markers,
        marker::list_labels,
        marker::create_marker,
        marker::update_marker,
        marker::delete_marker,
        marker::import_markers,
        upload::upload_image,
        upload::upload_images,
        geocode::geocode,
        system::health_handler,
    ),
    components(schemas(
        LayerDto,
        LayerCountDto,
        CreateLayerRequest,
        UpdateLayerRequest,
        MarkerDto,
        CreateMarkerRequest,
        UpdateMarkerRequest,
        ImportResponse,
        SkippedImportDto,
        UploadResponse,
        BulkUploadResponse,
        GeocodeResponse,
        system::HealthResponse,
        ErrorResponse,
        ErrorBody,
    )),
    tags(
        (name = "Layers", description = "Marker layers"),
        (name = "Markers", description = "Map markers and labels"),
        (name = "Uploads", description = "Image storage"),
        (name = "Geocoding", description = "Address search"),
        (name = "System", description = "Service health"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_every_route() {
        let doc = ApiDoc::openapi();
        for path in [
            "/api/layers",
            "/api/layers/{id}",
            "/api/markers",
            "/api/markers/labels",
            "/api/markers/{id}",
            "/api/markers/import",
            "/api/upload/image",
            "/api/upload/images",
            "/api/geocode",
            "/health",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }
}

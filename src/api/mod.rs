//! REST API layer: route handlers, DTOs, and router composition.
//!
//! Resource endpoints are mounted under `/api`; uploaded files are served
//! from `/uploads`.

pub mod dto;
pub mod handlers;
pub mod openapi;

use std::time::Duration;

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::app_state::AppState;
use crate::config::MapConfig;
use crate::service::upload_service::UPLOAD_URL_PREFIX;

/// Builds the API router with all REST endpoints and the OpenAPI document.
pub fn build_router(upload_body_limit: usize) -> Router<AppState> {
    let router = Router::new()
        .nest("/api", handlers::routes(upload_body_limit))
        .merge(handlers::system::routes());

    #[cfg(feature = "swagger-ui")]
    let router = {
        use utoipa::OpenApi;
        router.merge(
            utoipa_swagger_ui::SwaggerUi::new("/swagger-ui")
                .url("/api-docs/openapi.json", openapi::ApiDoc::openapi()),
        )
    };
    #[cfg(not(feature = "swagger-ui"))]
    let router = router.route(
        "/api-docs/openapi.json",
        axum::routing::get(|| async {
            use utoipa::OpenApi;
            axum::Json(openapi::ApiDoc::openapi())
        }),
    );

    router
}

/// Builds the complete application: API routes, static uploads and the
/// HTTP middleware stack.
pub fn build_app(state: AppState, config: &MapConfig) -> Router {
    build_router(config.upload_body_limit())
        .nest_service(UPLOAD_URL_PREFIX, ServeDir::new(&config.upload_dir))
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.request_timeout_secs,
        )))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[cfg(test)]
#[allow(clippy::panic, clippy::indexing_slicing)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Method, Request, StatusCode, header};
    use serde_json::{Value, json};
    use tempfile::TempDir;
    use tower::ServiceExt;

    use super::*;
    use crate::persistence::MemoryStore;
    use crate::service::upload_service::tests::FakeTranscoder;

    const BOUNDARY: &str = "fairmap-test-boundary";

    struct TestApp {
        router: Router,
        uploads: TempDir,
    }

    async fn app() -> TestApp {
        let Ok(uploads) = tempfile::tempdir() else {
            panic!("tempdir");
        };
        let config = MapConfig {
            upload_dir: uploads.path().to_path_buf(),
            upload_max_file_bytes: 64 * 1024,
            upload_max_files: 3,
            geocoder_url: crate::geocoding::tests::spawn_stub().await,
            geocoder_user_agent: "FairMapTest/1.0".to_string(),
            ..MapConfig::default()
        };
        let Ok(state) = AppState::new(
            &config,
            Arc::new(MemoryStore::new()),
            Arc::new(FakeTranscoder),
        ) else {
            panic!("state");
        };
        TestApp {
            router: build_app(state, &config),
            uploads,
        }
    }

    impl TestApp {
        async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
            let Ok(response) = self.router.clone().oneshot(request).await else {
                panic!("router failed");
            };
            let status = response.status();
            let Ok(bytes) = axum::body::to_bytes(response.into_body(), usize::MAX).await else {
                panic!("body");
            };
            let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
            (status, body)
        }

        async fn call(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
            let builder = Request::builder().method(method).uri(uri);
            let request = match body {
                Some(json) => builder
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(json.to_string())),
                None => builder.body(Body::empty()),
            };
            let Ok(request) = request else {
                panic!("request");
            };
            self.send(request).await
        }

        async fn upload(&self, uri: &str, parts: &[Part<'_>]) -> (StatusCode, Value) {
            let Ok(request) = Request::builder()
                .method(Method::POST)
                .uri(uri)
                .header(
                    header::CONTENT_TYPE,
                    format!("multipart/form-data; boundary={BOUNDARY}"),
                )
                .body(Body::from(multipart_body(parts)))
            else {
                panic!("request");
            };
            self.send(request).await
        }

        async fn create_layer(&self, name: &str) -> String {
            let (status, body) = self
                .call(Method::POST, "/api/layers", Some(json!({ "name": name })))
                .await;
            assert_eq!(status, StatusCode::CREATED);
            body["id"].as_str().unwrap_or_default().to_string()
        }

        fn stored_files(&self) -> Vec<String> {
            let Ok(entries) = std::fs::read_dir(self.uploads.path()) else {
                panic!("read_dir");
            };
            entries
                .filter_map(Result::ok)
                .map(|e| e.file_name().to_string_lossy().into_owned())
                .collect()
        }
    }

    enum Part<'a> {
        File {
            field: &'a str,
            file_name: &'a str,
            content_type: &'a str,
            bytes: &'a [u8],
        },
        Text {
            field: &'a str,
            value: &'a str,
        },
    }

    fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
        let mut body = Vec::new();
        for part in parts {
            body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
            match part {
                Part::File {
                    field,
                    file_name,
                    content_type,
                    bytes,
                } => {
                    body.extend_from_slice(
                        format!(
                            "Content-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n"
                        )
                        .as_bytes(),
                    );
                    body.extend_from_slice(bytes);
                }
                Part::Text { field, value } => {
                    body.extend_from_slice(
                        format!("Content-Disposition: form-data; name=\"{field}\"\r\n\r\n{value}")
                            .as_bytes(),
                    );
                }
            }
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        body
    }

    #[tokio::test]
    async fn health_and_openapi_are_served() {
        let app = app().await;
        let (status, body) = app.call(Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");

        let (status, body) = app.call(Method::GET, "/api-docs/openapi.json", None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["paths"]["/api/markers"].is_object());
    }

    #[tokio::test]
    async fn marker_requires_name_or_photo() {
        let app = app().await;
        let layer = app.create_layer("Trips").await;
        let (status, body) = app
            .call(
                Method::POST,
                "/api/markers",
                Some(json!({ "latitude": 1.0, "longitude": 2.0, "layerId": layer })),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"]["message"].is_string());
    }

    #[tokio::test]
    async fn marker_labels_lifecycle() {
        let app = app().await;
        let layer = app.create_layer("Food").await;

        let (status, created) = app
            .call(
                Method::POST,
                "/api/markers",
                Some(json!({ "name": "Cafe", "latitude": 48.85, "longitude": 2.35, "layerId": layer })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["labels"], json!([]));
        assert_eq!(created["layer"]["name"], "Food");
        let id = created["id"].as_str().unwrap_or_default().to_string();

        let (_, second) = app
            .call(
                Method::POST,
                "/api/markers",
                Some(json!({
                    "name": "Bakery",
                    "latitude": 48.86,
                    "longitude": 2.34,
                    "layerId": layer,
                    "labels": ["bread", "coffee"],
                })),
            )
            .await;
        assert_eq!(second["labels"], json!(["bread", "coffee"]));

        let uri = format!("/api/markers/{id}");
        let (status, updated) = app
            .call(Method::PUT, &uri, Some(json!({ "labels": ["coffee", "terrace"] })))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["labels"], json!(["coffee", "terrace"]));

        let (_, labels) = app.call(Method::GET, "/api/markers/labels", None).await;
        assert_eq!(labels, json!(["bread", "coffee", "terrace"]));

        let (_, renamed) = app
            .call(Method::PUT, &uri, Some(json!({ "name": "Café" })))
            .await;
        assert_eq!(renamed["name"], "Café");
        assert_eq!(renamed["labels"], json!(["coffee", "terrace"]));

        let (_, cleared) = app.call(Method::PUT, &uri, Some(json!({ "labels": [] }))).await;
        assert_eq!(cleared["labels"], json!([]));
    }

    #[tokio::test]
    async fn deleting_layer_removes_its_markers() {
        let app = app().await;
        let doomed = app.create_layer("Doomed").await;
        let kept = app.create_layer("Kept").await;
        for layer in [&doomed, &kept] {
            let (status, _) = app
                .call(
                    Method::POST,
                    "/api/markers",
                    Some(json!({ "name": "m", "latitude": 0.0, "longitude": 0.0, "layerId": layer })),
                )
                .await;
            assert_eq!(status, StatusCode::CREATED);
        }

        let (_, layers) = app.call(Method::GET, "/api/layers", None).await;
        assert_eq!(layers[0]["_count"]["markers"], 1);

        let (status, _) = app
            .call(Method::DELETE, &format!("/api/layers/{doomed}"), None)
            .await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (_, markers) = app.call(Method::GET, "/api/markers", None).await;
        let Some(markers) = markers.as_array() else {
            panic!("marker list");
        };
        assert_eq!(markers.len(), 1);
        assert_eq!(markers[0]["layerId"], json!(kept));
    }

    #[tokio::test]
    async fn missing_and_malformed_ids() {
        let app = app().await;
        let missing = uuid::Uuid::new_v4();
        let (status, _) = app
            .call(Method::DELETE, &format!("/api/markers/{missing}"), None)
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = app
            .call(
                Method::PUT,
                &format!("/api/layers/{missing}"),
                Some(json!({ "visible": false })),
            )
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = app
            .call(
                Method::POST,
                "/api/markers",
                Some(json!({ "name": "x", "latitude": 0.0, "longitude": 0.0, "layerId": missing })),
            )
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = app.call(Method::DELETE, "/api/markers/not-a-uuid", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn heic_upload_is_served_as_jpeg() {
        let app = app().await;
        let (status, body) = app
            .upload(
                "/api/upload/image",
                &[Part::File {
                    field: "image",
                    file_name: "photo.heic",
                    content_type: "image/heic",
                    bytes: b"not really heic",
                }],
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        let url = body["url"].as_str().unwrap_or_default().to_string();
        assert!(url.starts_with("/uploads/") && url.ends_with(".jpg"), "{url}");

        let files = app.stored_files();
        assert_eq!(files.len(), 1);
        assert!(files.iter().all(|f| f.ends_with(".jpg")));

        let Ok(request) = Request::builder().uri(&url).body(Body::empty()) else {
            panic!("request");
        };
        let Ok(response) = app.router.clone().oneshot(request).await else {
            panic!("router failed");
        };
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn upload_filter_and_missing_file() {
        let app = app().await;
        let (status, _) = app
            .upload(
                "/api/upload/image",
                &[Part::File {
                    field: "image",
                    file_name: "notes.txt",
                    content_type: "text/plain",
                    bytes: b"hello",
                }],
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = app
            .upload("/api/upload/image", &[Part::Text { field: "note", value: "x" }])
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let big = vec![0_u8; 64 * 1024 + 1];
        let (status, _) = app
            .upload(
                "/api/upload/image",
                &[Part::File {
                    field: "image",
                    file_name: "big.png",
                    content_type: "image/png",
                    bytes: &big,
                }],
            )
            .await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert!(app.stored_files().is_empty());
    }

    #[tokio::test]
    async fn bulk_upload_returns_all_urls() {
        let app = app().await;
        let (status, body) = app
            .upload(
                "/api/upload/images",
                &[
                    Part::File {
                        field: "images",
                        file_name: "a.png",
                        content_type: "image/png",
                        bytes: b"png",
                    },
                    Part::File {
                        field: "images",
                        file_name: "b.jpg",
                        content_type: "image/jpeg",
                        bytes: b"jpg",
                    },
                ],
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        let Some(urls) = body["urls"].as_array() else {
            panic!("urls");
        };
        assert_eq!(urls.len(), 2);
        assert_eq!(app.stored_files().len(), 2);
    }

    #[tokio::test]
    async fn non_multipart_bodies_get_json_errors() {
        let app = app().await;
        for uri in ["/api/upload/image", "/api/upload/images", "/api/markers/import"] {
            let (status, body) = app.call(Method::POST, uri, Some(json!({}))).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
            assert_eq!(body["error"]["code"], 1001, "{uri}");
            assert!(body["error"]["message"].is_string(), "{uri}");
        }
    }

    #[tokio::test]
    async fn import_without_gps_is_rejected() {
        let app = app().await;
        let (status, _) = app
            .upload(
                "/api/markers/import",
                &[Part::File {
                    field: "images",
                    file_name: "plain.jpg",
                    content_type: "image/jpeg",
                    bytes: b"no exif here",
                }],
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = app
            .upload(
                "/api/markers/import",
                &[Part::Text {
                    field: "layerId",
                    value: "nope",
                }],
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn geocode_proxies_search() {
        let app = app().await;
        let (status, body) = app
            .call(Method::GET, "/api/geocode?q=Eiffel%20Tower", None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["displayName"].is_string());

        let (status, _) = app.call(Method::GET, "/api/geocode?q=nowhere", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = app.call(Method::GET, "/api/geocode?q=boom", None).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
    }
}

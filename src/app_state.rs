//! Shared application state injected into all Axum handlers.

use std::sync::Arc;
use std::time::Duration;

use crate::config::MapConfig;
use crate::error::MapError;
use crate::geocoding::Geocoder;
use crate::media::HeifTranscoder;
use crate::persistence::MapStore;
use crate::service::{ImportService, LayerService, MarkerService, UploadService, UploadSettings};

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Layer CRUD.
    pub layer_service: Arc<LayerService>,
    /// Marker CRUD and label listing.
    pub marker_service: Arc<MarkerService>,
    /// Image storage.
    pub upload_service: Arc<UploadService>,
    /// Geotagged photo import.
    pub import_service: Arc<ImportService>,
    /// Address search.
    pub geocoder: Arc<Geocoder>,
}

impl AppState {
    /// Wires every service over `store` using the given configuration.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::Internal`] if the geocoder client cannot be
    /// built.
    pub fn new(
        config: &MapConfig,
        store: Arc<dyn MapStore>,
        transcoder: Arc<dyn HeifTranscoder>,
    ) -> Result<Self, MapError> {
        let layers = LayerService::new(Arc::clone(&store), config.default_layer_color.clone());
        let markers = MarkerService::new(store);
        let uploads = UploadService::new(
            UploadSettings {
                dir: config.upload_dir.clone(),
                max_file_bytes: config.upload_max_file_bytes,
                max_files: config.upload_max_files,
                jpeg_quality: config.jpeg_quality,
            },
            transcoder,
        );
        let import = ImportService::new(layers.clone(), markers.clone(), uploads.clone());
        let geocoder = Geocoder::new(
            &config.geocoder_url,
            &config.geocoder_user_agent,
            Duration::from_secs(config.request_timeout_secs),
        )?;

        Ok(Self {
            layer_service: Arc::new(layers),
            marker_service: Arc::new(markers),
            upload_service: Arc::new(uploads),
            import_service: Arc::new(import),
            geocoder: Arc::new(geocoder),
        })
    }
}

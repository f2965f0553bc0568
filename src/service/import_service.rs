//! Import service: turns geotagged photos into photo markers.
//!
//! Each image's EXIF GPS position becomes a new unnamed marker carrying
//! the stored photo. Images that cannot be placed are reported back
//! instead of failing the whole request.

use crate::domain::{LayerId, MarkerDraft, MarkerRecord};
use crate::error::MapError;
use crate::media::{GpsPosition, read_gps};

use super::layer_service::LayerService;
use super::marker_service::MarkerService;
use super::upload_service::{UploadFile, UploadService};

/// An image that did not produce a marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedImport {
    /// Client-supplied file name.
    pub filename: String,
    /// Why the image was skipped.
    pub reason: String,
}

/// Result of an import request.
#[derive(Debug, Clone, Default)]
pub struct ImportOutcome {
    /// Markers created, in request order.
    pub created: Vec<MarkerRecord>,
    /// Images that were skipped.
    pub skipped: Vec<SkippedImport>,
}

/// Creates photo markers from geotagged images.
#[derive(Debug, Clone)]
pub struct ImportService {
    layers: LayerService,
    markers: MarkerService,
    uploads: UploadService,
}

impl ImportService {
    /// Creates a new `ImportService`.
    #[must_use]
    pub fn new(layers: LayerService, markers: MarkerService, uploads: UploadService) -> Self {
        Self {
            layers,
            markers,
            uploads,
        }
    }

    /// Imports `files` into `layer`, or into the oldest layer when `None`
    /// (creating the default layer if there is none).
    ///
    /// # Errors
    ///
    /// Returns [`MapError::NoFileUploaded`] for an empty request,
    /// [`MapError::TooManyFiles`] above the upload limit,
    /// [`MapError::LayerNotFound`] for an unknown layer, or
    /// [`MapError::InvalidRequest`] when none of the images carries GPS
    /// data. Geotagged images that fail conversion are listed in
    /// `skipped`, so the outcome may hold no created marker at all.
    pub async fn import(
        &self,
        files: Vec<UploadFile>,
        layer: Option<LayerId>,
    ) -> Result<ImportOutcome, MapError> {
        if files.is_empty() {
            return Err(MapError::NoFileUploaded);
        }
        if files.len() > self.uploads.max_files() {
            return Err(MapError::TooManyFiles {
                max: self.uploads.max_files(),
            });
        }
        let layer = match layer {
            Some(id) => self.layers.get(id).await?,
            None => self.layers.ensure_default_layer().await?,
        };

        let mut outcome = ImportOutcome::default();
        let mut located = 0_usize;
        for file in files {
            let format = match self.uploads.validate(&file) {
                Ok(format) => format,
                Err(err) => {
                    outcome.skip(&file, err.to_string());
                    continue;
                }
            };
            let Some(position) = locate(&file).await else {
                outcome.skip(&file, "no GPS data".to_string());
                continue;
            };
            located += 1;

            let photo = match self.uploads.persist(&file, format).await {
                Ok(url) => url,
                Err(MapError::ImageConversion(reason)) => {
                    outcome.skip(&file, format!("conversion failed: {reason}"));
                    continue;
                }
                Err(err) => return Err(err),
            };
            let draft = MarkerDraft {
                photo: Some(photo.clone()),
                latitude: Some(position.latitude),
                longitude: Some(position.longitude),
                layer_id: Some(layer.id),
                ..MarkerDraft::default()
            };
            match self.markers.create(draft).await {
                Ok(record) => outcome.created.push(record),
                Err(err) => {
                    self.uploads.discard(&photo).await;
                    return Err(err);
                }
            }
        }

        if located == 0 {
            return Err(MapError::InvalidRequest(
                "none of the images contains GPS data".to_string(),
            ));
        }
        tracing::info!(
            layer_id = %layer.id,
            created = outcome.created.len(),
            skipped = outcome.skipped.len(),
            "geotagged import finished"
        );
        Ok(outcome)
    }
}

impl ImportOutcome {
    fn skip(&mut self, file: &UploadFile, reason: String) {
        tracing::warn!(file = %file.file_name, %reason, "skipping import");
        self.skipped.push(SkippedImport {
            filename: file.file_name.clone(),
            reason,
        });
    }
}

async fn locate(file: &UploadFile) -> Option<GpsPosition> {
    let bytes = file.bytes.clone();
    tokio::task::spawn_blocking(move || read_gps(&bytes))
        .await
        .ok()
        .flatten()
}

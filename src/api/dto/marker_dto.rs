//! Marker DTOs for list, create, update and geotagged import.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use super::common_dto::{LabelsInput, double_option};
use super::layer_dto::LayerDto;
use crate::domain::{LayerId, MarkerDraft, MarkerId, MarkerPatch, MarkerRecord};
use crate::error::MapError;
use crate::service::{ImportOutcome, SkippedImport};

/// Marker as returned by the API, with its layer joined in.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MarkerDto {
    /// Marker identifier.
    #[schema(value_type = String, format = Uuid)]
    pub id: MarkerId,
    /// Display name.
    pub name: Option<String>,
    /// Free-form notes.
    pub description: Option<String>,
    /// Photo URL under `/uploads/`.
    pub photo: Option<String>,
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
    /// Labels, always an array.
    pub labels: Vec<String>,
    /// Owning layer id.
    #[schema(value_type = String, format = Uuid)]
    pub layer_id: LayerId,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp.
    pub updated_at: DateTime<Utc>,
    /// Owning layer.
    pub layer: LayerDto,
}

impl From<MarkerRecord> for MarkerDto {
    fn from(record: MarkerRecord) -> Self {
        let MarkerRecord { marker, layer } = record;
        Self {
            id: marker.id,
            name: marker.name,
            description: marker.description,
            photo: marker.photo,
            latitude: marker.latitude,
            longitude: marker.longitude,
            labels: marker.labels,
            layer_id: marker.layer_id,
            created_at: marker.created_at,
            updated_at: marker.updated_at,
            layer: LayerDto::from(layer),
        }
    }
}

/// Query parameters for `GET /api/markers`.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct MarkerListParams {
    /// Restrict the listing to one layer.
    #[param(value_type = Option<String>, format = Uuid)]
    pub layer_id: Option<LayerId>,
}

/// Request body for `POST /api/markers`.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateMarkerRequest {
    /// Display name; required unless `photo` is given.
    #[serde(default)]
    pub name: Option<String>,
    /// Free-form notes.
    #[serde(default)]
    pub description: Option<String>,
    /// Photo URL; required unless `name` is given.
    #[serde(default)]
    pub photo: Option<String>,
    /// Latitude in degrees.
    #[serde(default)]
    pub latitude: Option<f64>,
    /// Longitude in degrees.
    #[serde(default)]
    pub longitude: Option<f64>,
    /// Owning layer.
    #[serde(default)]
    #[schema(value_type = Option<String>, format = Uuid)]
    pub layer_id: Option<LayerId>,
    /// Labels as an array, or as a JSON-encoded array string.
    #[serde(default)]
    #[schema(value_type = Option<Vec<String>>)]
    pub labels: Option<LabelsInput>,
}

impl TryFrom<CreateMarkerRequest> for MarkerDraft {
    type Error = MapError;

    fn try_from(req: CreateMarkerRequest) -> Result<Self, Self::Error> {
        Ok(Self {
            name: req.name,
            description: req.description,
            photo: req.photo,
            latitude: req.latitude,
            longitude: req.longitude,
            layer_id: req.layer_id,
            labels: req.labels.map(LabelsInput::into_labels).transpose()?,
        })
    }
}

/// Request body for `PUT /api/markers/{id}`.
///
/// Omitted fields are unchanged; `null` clears nullable fields and
/// `labels`.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMarkerRequest {
    /// New name, or `null` to clear.
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub name: Option<Option<String>>,
    /// New description, or `null` to clear.
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub description: Option<Option<String>>,
    /// New photo URL, or `null` to detach.
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub photo: Option<Option<String>>,
    /// New latitude.
    #[serde(default)]
    pub latitude: Option<f64>,
    /// New longitude.
    #[serde(default)]
    pub longitude: Option<f64>,
    /// Replacement labels; `[]` or `null` clears.
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<Vec<String>>)]
    pub labels: Option<Option<LabelsInput>>,
    /// New owning layer.
    #[serde(default)]
    #[schema(value_type = Option<String>, format = Uuid)]
    pub layer_id: Option<LayerId>,
}

impl TryFrom<UpdateMarkerRequest> for MarkerPatch {
    type Error = MapError;

    fn try_from(req: UpdateMarkerRequest) -> Result<Self, Self::Error> {
        let labels = match req.labels {
            None => None,
            Some(None) => Some(Vec::new()),
            Some(Some(input)) => Some(input.into_labels()?),
        };
        Ok(Self {
            name: req.name,
            description: req.description,
            photo: req.photo,
            latitude: req.latitude,
            longitude: req.longitude,
            labels,
            layer_id: req.layer_id,
        })
    }
}

/// An image the import did not turn into a marker.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SkippedImportDto {
    /// Client-supplied file name.
    pub filename: String,
    /// Why the image was skipped.
    pub reason: String,
}

/// Response body for `POST /api/markers/import`.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ImportResponse {
    /// Markers created.
    pub created: Vec<MarkerDto>,
    /// Images skipped.
    pub skipped: Vec<SkippedImportDto>,
}

impl From<ImportOutcome> for ImportResponse {
    fn from(outcome: ImportOutcome) -> Self {
        Self {
            created: outcome.created.into_iter().map(MarkerDto::from).collect(),
            skipped: outcome
                .skipped
                .into_iter()
                .map(|SkippedImport { filename, reason }| SkippedImportDto { filename, reason })
                .collect(),
        }
    }
}

//! Map markers: labeled points belonging to exactly one layer.

use chrono::{DateTime, Utc};

use super::labels;
use super::{Layer, LayerId, MarkerId};
use crate::error::MapError;

/// A persisted map marker.
#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    /// Marker identifier.
    pub id: MarkerId,
    /// Display name. `None` only when a photo is attached.
    pub name: Option<String>,
    /// Free-form notes.
    pub description: Option<String>,
    /// Relative URL of the attached photo (e.g. `/uploads/x.jpg`).
    pub photo: Option<String>,
    /// Latitude in degrees, within [-90, 90].
    pub latitude: f64,
    /// Longitude in degrees, within [-180, 180].
    pub longitude: f64,
    /// Free-text tags, trimmed and unique.
    pub labels: Vec<String>,
    /// Owning layer.
    pub layer_id: LayerId,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp.
    pub updated_at: DateTime<Utc>,
}

/// A marker joined with its owning layer.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerRecord {
    /// The marker.
    pub marker: Marker,
    /// The layer the marker belongs to.
    pub layer: Layer,
}

/// Unvalidated input for marker creation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MarkerDraft {
    /// Display name.
    pub name: Option<String>,
    /// Free-form notes.
    pub description: Option<String>,
    /// Relative photo URL.
    pub photo: Option<String>,
    /// Latitude in degrees.
    pub latitude: Option<f64>,
    /// Longitude in degrees.
    pub longitude: Option<f64>,
    /// Owning layer.
    pub layer_id: Option<LayerId>,
    /// Labels; `None` means no labels.
    pub labels: Option<Vec<String>>,
}

/// Partial update of a marker.
///
/// The outer `Option` distinguishes "field omitted" (`None`, unchanged)
/// from "field sent"; for nullable fields the inner `None` clears them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MarkerPatch {
    /// New name, or `Some(None)` to clear it.
    pub name: Option<Option<String>>,
    /// New description, or `Some(None)` to clear it.
    pub description: Option<Option<String>>,
    /// New photo URL, or `Some(None)` to detach it.
    pub photo: Option<Option<String>>,
    /// New latitude.
    pub latitude: Option<f64>,
    /// New longitude.
    pub longitude: Option<f64>,
    /// Replacement labels; `Some(vec![])` clears them.
    pub labels: Option<Vec<String>>,
    /// New owning layer.
    pub layer_id: Option<LayerId>,
}

const REQUIRED_FIELDS: &str = "name or photo, latitude, longitude, and layerId are required";

impl Marker {
    /// Validates a draft and builds a new marker.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::InvalidRequest`] when neither name nor photo is
    /// given, when a coordinate or the layer is missing, or when a
    /// coordinate is out of range.
    pub fn create(draft: MarkerDraft, now: DateTime<Utc>) -> Result<Self, MapError> {
        let name = non_blank(draft.name);
        let photo = non_blank(draft.photo);
        let (Some(latitude), Some(longitude), Some(layer_id)) =
            (draft.latitude, draft.longitude, draft.layer_id)
        else {
            return Err(MapError::InvalidRequest(REQUIRED_FIELDS.to_string()));
        };
        if name.is_none() && photo.is_none() {
            return Err(MapError::InvalidRequest(REQUIRED_FIELDS.to_string()));
        }
        validate_coordinates(latitude, longitude)?;

        Ok(Self {
            id: MarkerId::new(),
            name,
            description: non_blank(draft.description),
            photo,
            latitude,
            longitude,
            labels: labels::normalize(draft.labels.unwrap_or_default()),
            layer_id,
            created_at: now,
            updated_at: now,
        })
    }

    /// Applies a partial update in place.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::InvalidRequest`] if the result would have
    /// neither name nor photo, or a coordinate is out of range. The marker
    /// is left untouched on error.
    pub fn apply(&mut self, patch: MarkerPatch, now: DateTime<Utc>) -> Result<(), MapError> {
        let mut next = self.clone();
        if let Some(name) = patch.name {
            next.name = non_blank(name);
        }
        if let Some(description) = patch.description {
            next.description = non_blank(description);
        }
        if let Some(photo) = patch.photo {
            next.photo = non_blank(photo);
        }
        if let Some(latitude) = patch.latitude {
            next.latitude = latitude;
        }
        if let Some(longitude) = patch.longitude {
            next.longitude = longitude;
        }
        if let Some(labels) = patch.labels {
            next.labels = labels::normalize(labels);
        }
        if let Some(layer_id) = patch.layer_id {
            next.layer_id = layer_id;
        }

        if next.name.is_none() && next.photo.is_none() {
            return Err(MapError::InvalidRequest(
                "a marker needs a name or a photo".to_string(),
            ));
        }
        validate_coordinates(next.latitude, next.longitude)?;

        next.updated_at = now;
        *self = next;
        Ok(())
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Checks that both coordinates are finite and within WGS84 bounds.
///
/// # Errors
///
/// Returns [`MapError::InvalidRequest`] naming the offending coordinate.
pub fn validate_coordinates(latitude: f64, longitude: f64) -> Result<(), MapError> {
    if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
        return Err(MapError::InvalidRequest(format!(
            "latitude must be between -90 and 90, got {latitude}"
        )));
    }
    if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
        return Err(MapError::InvalidRequest(format!(
            "longitude must be between -180 and 180, got {longitude}"
        )));
    }
    Ok(())
}

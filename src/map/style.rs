//! Vector features for markers and the user's position.

use super::projection::{LonLat, Projected, from_lon_lat};
use crate::domain::{MarkerId, MarkerRecord};

/// Marker fill when the layer color is missing.
pub const FALLBACK_COLOR: &str = "#FF5733";

/// Label of an unnamed photo marker.
pub const PHOTO_GLYPH: &str = "📷";

/// Marker circle radius, in pixels.
pub const MARKER_RADIUS: f64 = 8.0;

/// Marker outline width, in pixels.
pub const MARKER_STROKE_WIDTH: f64 = 2.0;

/// Vertical label offset, in pixels (negative is up).
pub const LABEL_OFFSET_Y: f64 = -15.0;

/// Fill and stroke of the user position.
pub const LOCATION_COLOR: &str = "#4285F4";

/// Fill of the accuracy circle.
pub const ACCURACY_FILL: &str = "rgba(66, 133, 244, 0.2)";

/// Radius of the user position dot, in pixels.
pub const LOCATION_RADIUS: f64 = 10.0;

/// Outline width of the user position dot, in pixels.
pub const LOCATION_STROKE_WIDTH: f64 = 3.0;

/// A marker as the map sees it.
#[derive(Debug, Clone, PartialEq)]
pub struct MapMarker {
    /// Marker id.
    pub id: MarkerId,
    /// Display name.
    pub name: Option<String>,
    /// Whether a photo is attached.
    pub has_photo: bool,
    /// Position.
    pub position: LonLat,
    /// Layer color, if known.
    pub color: Option<String>,
    /// Layer visibility, if known. Unknown counts as visible.
    pub layer_visible: Option<bool>,
}

impl From<&MarkerRecord> for MapMarker {
    fn from(record: &MarkerRecord) -> Self {
        let marker = &record.marker;
        Self {
            id: marker.id,
            name: marker.name.clone(),
            has_photo: marker.photo.is_some(),
            position: LonLat::new(marker.longitude, marker.latitude),
            color: Some(record.layer.color.clone()),
            layer_visible: Some(record.layer.visible),
        }
    }
}

/// A styled point ready to draw.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerFeature {
    /// Marker id, used to resolve clicks.
    pub id: MarkerId,
    /// Projected position.
    pub coordinate: Projected,
    /// Circle fill.
    pub color: String,
    /// Text drawn above the circle; may be empty.
    pub label: String,
    /// Circle radius.
    pub radius: f64,
    /// Circle outline width (white).
    pub stroke_width: f64,
    /// Label offset.
    pub label_offset_y: f64,
}

/// Builds features for every marker whose layer is not hidden.
#[must_use]
pub fn marker_features(markers: &[MapMarker]) -> Vec<MarkerFeature> {
    markers
        .iter()
        .filter(|m| m.layer_visible != Some(false))
        .map(|m| MarkerFeature {
            id: m.id,
            coordinate: from_lon_lat(m.position),
            color: m
                .color
                .as_deref()
                .filter(|c| !c.is_empty())
                .unwrap_or(FALLBACK_COLOR)
                .to_string(),
            label: marker_label(m),
            radius: MARKER_RADIUS,
            stroke_width: MARKER_STROKE_WIDTH,
            label_offset_y: LABEL_OFFSET_Y,
        })
        .collect()
}

fn marker_label(marker: &MapMarker) -> String {
    match marker.name.as_deref() {
        Some(name) if !name.is_empty() => name.to_string(),
        _ if marker.has_photo => PHOTO_GLYPH.to_string(),
        _ => String::new(),
    }
}

/// Last known user position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UserLocation {
    /// Position.
    pub position: LonLat,
    /// Accuracy radius in meters.
    pub accuracy: f64,
}

/// Features drawn for the user position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LocationFeature {
    /// Translucent circle covering the accuracy radius.
    Accuracy {
        /// Projected center.
        center: Projected,
        /// Radius in projected units.
        radius: f64,
    },
    /// Solid dot at the position.
    Position {
        /// Projected center.
        center: Projected,
    },
}

/// Accuracy circle (only when accuracy is positive) followed by the dot.
///
/// The accuracy radius is stretched by the Mercator scale factor at the
/// user's latitude so the circle covers the same ground distance.
#[must_use]
pub fn user_location_features(location: Option<&UserLocation>) -> Vec<LocationFeature> {
    let Some(location) = location else {
        return Vec::new();
    };
    let center = from_lon_lat(location.position);
    let mut features = Vec::with_capacity(2);
    if location.accuracy > 0.0 {
        let scale = 1.0 / location.position.lat.to_radians().cos();
        features.push(LocationFeature::Accuracy {
            center,
            radius: location.accuracy * scale,
        });
    }
    features.push(LocationFeature::Position { center });
    features
}

//! Marker layers: named, colored, visibility-toggleable groups of markers.

use chrono::{DateTime, Utc};

use super::LayerId;
use crate::error::MapError;

/// Color assigned to layers created without one.
pub const DEFAULT_LAYER_COLOR: &str = "#FF5733";

/// Name of the layer created on demand when none exist.
pub const DEFAULT_LAYER_NAME: &str = "Default Layer";

/// A persisted marker layer.
#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    /// Layer identifier.
    pub id: LayerId,
    /// Display name (never blank).
    pub name: String,
    /// Hex color used to render the layer's markers.
    pub color: String,
    /// Whether the layer's markers are drawn.
    pub visible: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp.
    pub updated_at: DateTime<Utc>,
}

/// A layer together with the number of markers it owns.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerSummary {
    /// The layer itself.
    pub layer: Layer,
    /// Number of markers referencing the layer.
    pub marker_count: u64,
}

/// Partial update of a layer. `None` fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayerPatch {
    /// New display name.
    pub name: Option<String>,
    /// New hex color.
    pub color: Option<String>,
    /// New visibility.
    pub visible: Option<bool>,
}

impl Layer {
    /// Validates a new layer's fields and builds it.
    ///
    /// `color` falls back to `default_color` when absent or blank.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::InvalidRequest`] if the name is missing or blank,
    /// or the color is not a hex color.
    pub fn create(
        name: Option<&str>,
        color: Option<&str>,
        default_color: &str,
        now: DateTime<Utc>,
    ) -> Result<Self, MapError> {
        let name = validate_name(name.unwrap_or_default())?;
        let color = match color.map(str::trim).filter(|c| !c.is_empty()) {
            Some(c) => validate_color(c)?,
            None => default_color.to_string(),
        };
        Ok(Self {
            id: LayerId::new(),
            name,
            color,
            visible: true,
            created_at: now,
            updated_at: now,
        })
    }

    /// Applies a partial update in place.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::InvalidRequest`] on a blank name or a malformed
    /// color. The layer is left untouched on error.
    pub fn apply(&mut self, patch: LayerPatch, now: DateTime<Utc>) -> Result<(), MapError> {
        let name = patch.name.as_deref().map(validate_name).transpose()?;
        let color = patch.color.as_deref().map(validate_color).transpose()?;
        if let Some(name) = name {
            self.name = name;
        }
        if let Some(color) = color {
            self.color = color;
        }
        if let Some(visible) = patch.visible {
            self.visible = visible;
        }
        self.updated_at = now;
        Ok(())
    }
}

fn validate_name(raw: &str) -> Result<String, MapError> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(MapError::InvalidRequest("name is required".to_string()));
    }
    Ok(name.to_string())
}

/// Accepts `#RGB`, `#RRGGBB` and `#RRGGBBAA`.
///
/// # Errors
///
/// Returns [`MapError::InvalidRequest`] for anything else.
pub fn validate_color(raw: &str) -> Result<String, MapError> {
    let color = raw.trim();
    let valid = color
        .strip_prefix('#')
        .is_some_and(|hex| matches!(hex.len(), 3 | 6 | 8) && hex.chars().all(|c| c.is_ascii_hexdigit()));
    if valid {
        Ok(color.to_string())
    } else {
        Err(MapError::InvalidRequest(format!(
            "color must be a hex value like #FF5733, got {color:?}"
        )))
    }
}

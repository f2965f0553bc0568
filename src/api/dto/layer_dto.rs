//! Layer DTOs for list, create and update.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{Layer, LayerId, LayerPatch, LayerSummary};

/// Layer as returned by the API.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LayerDto {
    /// Layer identifier.
    #[schema(value_type = String, format = Uuid)]
    pub id: LayerId,
    /// Display name.
    pub name: String,
    /// Hex color.
    pub color: String,
    /// Whether the layer's markers are drawn.
    pub visible: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp.
    pub updated_at: DateTime<Utc>,
    /// Marker count; present on list responses only.
    #[serde(rename = "_count", skip_serializing_if = "Option::is_none")]
    pub count: Option<LayerCountDto>,
}

/// Related-record counts of a layer.
#[derive(Debug, Clone, Copy, Serialize, ToSchema)]
pub struct LayerCountDto {
    /// Number of markers in the layer.
    pub markers: u64,
}

impl From<Layer> for LayerDto {
    fn from(layer: Layer) -> Self {
        Self {
            id: layer.id,
            name: layer.name,
            color: layer.color,
            visible: layer.visible,
            created_at: layer.created_at,
            updated_at: layer.updated_at,
            count: None,
        }
    }
}

impl From<LayerSummary> for LayerDto {
    fn from(summary: LayerSummary) -> Self {
        Self {
            count: Some(LayerCountDto {
                markers: summary.marker_count,
            }),
            ..Self::from(summary.layer)
        }
    }
}

/// Request body for `POST /api/layers`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateLayerRequest {
    /// Display name; required and non-blank.
    #[serde(default)]
    pub name: Option<String>,
    /// Hex color; defaults to `#FF5733`.
    #[serde(default)]
    pub color: Option<String>,
}

/// Request body for `PUT /api/layers/{id}`. Omitted fields are unchanged.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct UpdateLayerRequest {
    /// New display name.
    #[serde(default)]
    pub name: Option<String>,
    /// New hex color.
    #[serde(default)]
    pub color: Option<String>,
    /// New visibility.
    #[serde(default)]
    pub visible: Option<bool>,
}

impl From<UpdateLayerRequest> for LayerPatch {
    fn from(req: UpdateLayerRequest) -> Self {
        Self {
            name: req.name,
            color: req.color,
            visible: req.visible,
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::DEFAULT_LAYER_COLOR;

    #[test]
    fn summary_serializes_count_and_camel_case() {
        let Ok(layer) = Layer::create(Some("Parks"), None, DEFAULT_LAYER_COLOR, Utc::now()) else {
            panic!("layer");
        };
        let dto = LayerDto::from(LayerSummary {
            layer,
            marker_count: 3,
        });
        let Ok(json) = serde_json::to_value(&dto) else {
            panic!("serialize");
        };
        assert_eq!(json["_count"]["markers"], 3);
        assert!(json.get("createdAt").is_some());
        assert_eq!(json["color"], "#FF5733");
    }

    #[test]
    fn plain_layer_omits_count() {
        let Ok(layer) = Layer::create(Some("Parks"), None, DEFAULT_LAYER_COLOR, Utc::now()) else {
            panic!("layer");
        };
        let Ok(json) = serde_json::to_value(LayerDto::from(layer)) else {
            panic!("serialize");
        };
        assert!(json.get("_count").is_none());
    }
}

//! Layer service: validation and orchestration of layer CRUD.

use std::sync::Arc;

use chrono::Utc;

use crate::domain::{DEFAULT_LAYER_NAME, Layer, LayerId, LayerPatch, LayerSummary};
use crate::error::MapError;
use crate::persistence::MapStore;

/// Orchestration layer for layer operations.
///
/// Stateless coordinator over a shared [`MapStore`]: every mutation
/// validates through the domain type, then persists.
#[derive(Debug, Clone)]
pub struct LayerService {
    store: Arc<dyn MapStore>,
    default_color: String,
}

impl LayerService {
    /// Creates a new `LayerService`.
    #[must_use]
    pub fn new(store: Arc<dyn MapStore>, default_color: impl Into<String>) -> Self {
        Self {
            store,
            default_color: default_color.into(),
        }
    }

    /// Lists all layers with their marker counts, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::Storage`] on backend failure.
    pub async fn list(&self) -> Result<Vec<LayerSummary>, MapError> {
        self.store.list_layers().await
    }

    /// Fetches one layer.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::LayerNotFound`] if the layer does not exist.
    pub async fn get(&self, id: LayerId) -> Result<Layer, MapError> {
        self.store.get_layer(id).await
    }

    /// Creates a layer.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::InvalidRequest`] on a blank name or a malformed
    /// color.
    pub async fn create(&self, name: Option<&str>, color: Option<&str>) -> Result<Layer, MapError> {
        let layer = Layer::create(name, color, &self.default_color, Utc::now())?;
        self.store.insert_layer(&layer).await?;
        tracing::info!(layer_id = %layer.id, name = %layer.name, "layer created");
        Ok(layer)
    }

    /// Applies a partial update to a layer.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::LayerNotFound`] if the layer does not exist, or
    /// [`MapError::InvalidRequest`] if the patch is invalid.
    pub async fn update(&self, id: LayerId, patch: LayerPatch) -> Result<Layer, MapError> {
        let mut layer = self.store.get_layer(id).await?;
        layer.apply(patch, Utc::now())?;
        self.store.update_layer(&layer).await?;
        tracing::debug!(layer_id = %id, "layer updated");
        Ok(layer)
    }

    /// Deletes a layer together with its markers.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::LayerNotFound`] if the layer does not exist.
    pub async fn delete(&self, id: LayerId) -> Result<(), MapError> {
        let markers = self.store.delete_layer(id).await?;
        tracing::info!(layer_id = %id, markers_removed = markers, "layer deleted");
        Ok(())
    }

    /// Returns the oldest layer, creating [`DEFAULT_LAYER_NAME`] when there
    /// are none.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::Storage`] on backend failure.
    pub async fn ensure_default_layer(&self) -> Result<Layer, MapError> {
        let layers = self.store.list_layers().await?;
        if let Some(first) = layers.into_iter().next() {
            return Ok(first.layer);
        }
        self.create(Some(DEFAULT_LAYER_NAME), None).await
    }
}

//! Marker service: validation and orchestration of marker CRUD.

use std::sync::Arc;

use chrono::Utc;

use crate::domain::labels;
use crate::domain::{LayerId, Marker, MarkerDraft, MarkerId, MarkerPatch, MarkerRecord};
use crate::error::MapError;
use crate::persistence::MapStore;

/// Orchestration layer for marker operations.
#[derive(Debug, Clone)]
pub struct MarkerService {
    store: Arc<dyn MapStore>,
}

impl MarkerService {
    /// Creates a new `MarkerService`.
    #[must_use]
    pub fn new(store: Arc<dyn MapStore>) -> Self {
        Self { store }
    }

    /// Lists markers newest first, optionally restricted to one layer.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::Storage`] on backend failure.
    pub async fn list(&self, layer: Option<LayerId>) -> Result<Vec<MarkerRecord>, MapError> {
        self.store.list_markers(layer).await
    }

    /// Returns the sorted union of every label in use.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::Storage`] on backend failure.
    pub async fn labels(&self) -> Result<Vec<String>, MapError> {
        let texts = self.store.label_texts().await?;
        Ok(labels::collect_unique(texts.iter().map(String::as_str)))
    }

    /// Creates a marker.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::InvalidRequest`] if the draft is incomplete or
    /// out of range, or [`MapError::LayerNotFound`] if its layer does not
    /// exist.
    pub async fn create(&self, draft: MarkerDraft) -> Result<MarkerRecord, MapError> {
        let marker = Marker::create(draft, Utc::now())?;
        let record = self.store.insert_marker(&marker).await?;
        tracing::info!(
            marker_id = %marker.id,
            layer_id = %marker.layer_id,
            has_photo = marker.photo.is_some(),
            "marker created"
        );
        Ok(record)
    }

    /// Applies a partial update to a marker.
    ///
    /// Read-modify-write; concurrent updates resolve last writer wins.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::MarkerNotFound`] if the marker does not exist,
    /// [`MapError::LayerNotFound`] if the patch moves it to a missing
    /// layer, or [`MapError::InvalidRequest`] if the result is invalid.
    pub async fn update(&self, id: MarkerId, patch: MarkerPatch) -> Result<MarkerRecord, MapError> {
        let MarkerRecord { mut marker, layer } = self.store.get_marker(id).await?;
        if let Some(target) = patch.layer_id
            && target != layer.id
        {
            self.store.get_layer(target).await?;
        }
        marker.apply(patch, Utc::now())?;
        let record = self.store.update_marker(&marker).await?;
        tracing::debug!(marker_id = %id, "marker updated");
        Ok(record)
    }

    /// Deletes a marker.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::MarkerNotFound`] if the marker does not exist.
    pub async fn delete(&self, id: MarkerId) -> Result<(), MapError> {
        self.store.delete_marker(id).await?;
        tracing::info!(marker_id = %id, "marker deleted");
        Ok(())
    }
}

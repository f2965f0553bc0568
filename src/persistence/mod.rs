//! Persistence layer: durable storage of layers and markers.
//!
//! [`MapStore`] is the storage seam used by the service layer. Two
//! implementations exist: [`PostgresStore`] backed by `sqlx::PgPool`, and
//! [`MemoryStore`] for development runs and tests.

pub mod memory;
pub mod models;
pub mod postgres;

use std::fmt;

use async_trait::async_trait;

pub use memory::MemoryStore;
pub use postgres::PostgresStore;

use crate::domain::{Layer, LayerId, LayerSummary, Marker, MarkerId, MarkerRecord};
use crate::error::MapError;

/// Storage operations for layers and markers.
///
/// Updates take the full, already-validated entity; the service layer
/// does read-modify-write. Implementations must keep these orderings:
/// layers by creation time ascending, markers by creation time descending.
#[async_trait]
pub trait MapStore: Send + Sync + fmt::Debug {
    /// Lists all layers with their marker counts.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::Storage`] on backend failure.
    async fn list_layers(&self) -> Result<Vec<LayerSummary>, MapError>;

    /// Fetches one layer.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::LayerNotFound`] if it does not exist.
    async fn get_layer(&self, id: LayerId) -> Result<Layer, MapError>;

    /// Inserts a new layer.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::Storage`] on backend failure.
    async fn insert_layer(&self, layer: &Layer) -> Result<(), MapError>;

    /// Overwrites an existing layer.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::LayerNotFound`] if it does not exist.
    async fn update_layer(&self, layer: &Layer) -> Result<(), MapError>;

    /// Deletes a layer and every marker it owns in one atomic step.
    /// Returns the number of markers removed.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::LayerNotFound`] if it does not exist.
    async fn delete_layer(&self, id: LayerId) -> Result<u64, MapError>;

    /// Lists markers, optionally restricted to one layer.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::Storage`] on backend failure.
    async fn list_markers(&self, layer: Option<LayerId>) -> Result<Vec<MarkerRecord>, MapError>;

    /// Returns the raw stored label text of every marker.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::Storage`] on backend failure.
    async fn label_texts(&self) -> Result<Vec<String>, MapError>;

    /// Fetches one marker with its layer.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::MarkerNotFound`] if it does not exist.
    async fn get_marker(&self, id: MarkerId) -> Result<MarkerRecord, MapError>;

    /// Inserts a new marker.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::LayerNotFound`] if its layer does not exist.
    async fn insert_marker(&self, marker: &Marker) -> Result<MarkerRecord, MapError>;

    /// Overwrites an existing marker.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::MarkerNotFound`] if it does not exist, or
    /// [`MapError::LayerNotFound`] if its layer does not exist.
    async fn update_marker(&self, marker: &Marker) -> Result<MarkerRecord, MapError>;

    /// Deletes one marker.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::MarkerNotFound`] if it does not exist.
    async fn delete_marker(&self, id: MarkerId) -> Result<(), MapError>;
}

//! In-memory store for development runs and tests.
//!
//! Entities live in insertion-ordered vectors behind a single
//! [`tokio::sync::RwLock`], so a layer delete and its marker cascade
//! happen under one write lock.

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::MapStore;
use crate::domain::labels;
use crate::domain::{Layer, LayerId, LayerSummary, Marker, MarkerId, MarkerRecord};
use crate::error::MapError;

#[derive(Debug, Default)]
struct Tables {
    layers: Vec<Layer>,
    /// Markers with their labels already encoded, as a database holds them.
    markers: Vec<(Marker, String)>,
}

impl Tables {
    fn layer(&self, id: LayerId) -> Result<&Layer, MapError> {
        self.layers
            .iter()
            .find(|l| l.id == id)
            .ok_or(MapError::LayerNotFound(id))
    }

    fn record(&self, marker: &Marker, stored_labels: &str) -> Result<MarkerRecord, MapError> {
        let layer = self.layer(marker.layer_id)?.clone();
        let mut marker = marker.clone();
        marker.labels = labels::decode_lenient(stored_labels);
        Ok(MarkerRecord { marker, layer })
    }
}

/// Process-local [`MapStore`]. Contents are lost on restart.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrites the stored label text of a marker verbatim.
    ///
    /// Lets tests reproduce rows written by other clients.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::MarkerNotFound`] if the marker does not exist.
    pub async fn set_raw_labels(&self, id: MarkerId, text: &str) -> Result<(), MapError> {
        let mut tables = self.tables.write().await;
        let (_, stored) = tables
            .markers
            .iter_mut()
            .find(|(m, _)| m.id == id)
            .ok_or(MapError::MarkerNotFound(id))?;
        *stored = text.to_string();
        Ok(())
    }
}

#[async_trait]
impl MapStore for MemoryStore {
    async fn list_layers(&self) -> Result<Vec<LayerSummary>, MapError> {
        let tables = self.tables.read().await;
        let mut summaries: Vec<LayerSummary> = tables
            .layers
            .iter()
            .map(|layer| LayerSummary {
                layer: layer.clone(),
                marker_count: tables
                    .markers
                    .iter()
                    .filter(|(m, _)| m.layer_id == layer.id)
                    .count() as u64,
            })
            .collect();
        summaries.sort_by_key(|s| s.layer.created_at);
        Ok(summaries)
    }

    async fn get_layer(&self, id: LayerId) -> Result<Layer, MapError> {
        self.tables.read().await.layer(id).cloned()
    }

    async fn insert_layer(&self, layer: &Layer) -> Result<(), MapError> {
        let mut tables = self.tables.write().await;
        if tables.layers.iter().any(|l| l.id == layer.id) {
            return Err(MapError::Storage(format!("layer {} already exists", layer.id)));
        }
        tables.layers.push(layer.clone());
        Ok(())
    }

    async fn update_layer(&self, layer: &Layer) -> Result<(), MapError> {
        let mut tables = self.tables.write().await;
        let slot = tables
            .layers
            .iter_mut()
            .find(|l| l.id == layer.id)
            .ok_or(MapError::LayerNotFound(layer.id))?;
        *slot = layer.clone();
        Ok(())
    }

    async fn delete_layer(&self, id: LayerId) -> Result<u64, MapError> {
        let mut tables = self.tables.write().await;
        let before = tables.layers.len();
        tables.layers.retain(|l| l.id != id);
        if tables.layers.len() == before {
            return Err(MapError::LayerNotFound(id));
        }
        let markers_before = tables.markers.len();
        tables.markers.retain(|(m, _)| m.layer_id != id);
        Ok((markers_before - tables.markers.len()) as u64)
    }

    async fn list_markers(&self, layer: Option<LayerId>) -> Result<Vec<MarkerRecord>, MapError> {
        let tables = self.tables.read().await;
        let mut records = Vec::new();
        // Newest first; reversing before the stable sort keeps ties newest first too.
        for (marker, stored) in tables.markers.iter().rev() {
            if layer.is_some_and(|id| marker.layer_id != id) {
                continue;
            }
            records.push(tables.record(marker, stored)?);
        }
        records.sort_by(|a, b| b.marker.created_at.cmp(&a.marker.created_at));
        Ok(records)
    }

    async fn label_texts(&self) -> Result<Vec<String>, MapError> {
        let tables = self.tables.read().await;
        Ok(tables.markers.iter().map(|(_, s)| s.clone()).collect())
    }

    async fn get_marker(&self, id: MarkerId) -> Result<MarkerRecord, MapError> {
        let tables = self.tables.read().await;
        let (marker, stored) = tables
            .markers
            .iter()
            .find(|(m, _)| m.id == id)
            .ok_or(MapError::MarkerNotFound(id))?;
        tables.record(marker, stored)
    }

    async fn insert_marker(&self, marker: &Marker) -> Result<MarkerRecord, MapError> {
        let mut tables = self.tables.write().await;
        let layer = tables.layer(marker.layer_id)?.clone();
        if tables.markers.iter().any(|(m, _)| m.id == marker.id) {
            return Err(MapError::Storage(format!("marker {} already exists", marker.id)));
        }
        tables
            .markers
            .push((marker.clone(), labels::encode(&marker.labels)));
        Ok(MarkerRecord {
            marker: marker.clone(),
            layer,
        })
    }

    async fn update_marker(&self, marker: &Marker) -> Result<MarkerRecord, MapError> {
        let mut tables = self.tables.write().await;
        let layer = tables.layer(marker.layer_id)?.clone();
        let slot = tables
            .markers
            .iter_mut()
            .find(|(m, _)| m.id == marker.id)
            .ok_or(MapError::MarkerNotFound(marker.id))?;
        *slot = (marker.clone(), labels::encode(&marker.labels));
        Ok(MarkerRecord {
            marker: marker.clone(),
            layer,
        })
    }

    async fn delete_marker(&self, id: MarkerId) -> Result<(), MapError> {
        let mut tables = self.tables.write().await;
        let before = tables.markers.len();
        tables.markers.retain(|(m, _)| m.id != id);
        if tables.markers.len() == before {
            return Err(MapError::MarkerNotFound(id));
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::{DEFAULT_LAYER_COLOR, MarkerDraft};
    use chrono::{Duration, Utc};

    fn layer(name: &str) -> Layer {
        let Ok(layer) = Layer::create(Some(name), None, DEFAULT_LAYER_COLOR, Utc::now()) else {
            panic!("valid layer");
        };
        layer
    }

    fn marker(layer_id: LayerId, name: &str) -> Marker {
        let draft = MarkerDraft {
            name: Some(name.to_string()),
            latitude: Some(10.0),
            longitude: Some(20.0),
            layer_id: Some(layer_id),
            ..MarkerDraft::default()
        };
        let Ok(marker) = Marker::create(draft, Utc::now()) else {
            panic!("valid marker");
        };
        marker
    }

    #[tokio::test]
    async fn insert_and_get_layer() {
        let store = MemoryStore::new();
        let l = layer("A");
        assert!(store.insert_layer(&l).await.is_ok());
        let Ok(fetched) = store.get_layer(l.id).await else {
            panic!("layer should exist");
        };
        assert_eq!(fetched, l);
    }

    #[tokio::test]
    async fn layers_are_listed_oldest_first_with_counts() {
        let store = MemoryStore::new();
        let mut older = layer("older");
        older.created_at = Utc::now() - Duration::minutes(5);
        let newer = layer("newer");
        let _ = store.insert_layer(&newer).await;
        let _ = store.insert_layer(&older).await;
        let _ = store.insert_marker(&marker(newer.id, "m")).await;

        let Ok(list) = store.list_layers().await else {
            panic!("list failed");
        };
        let names: Vec<_> = list.iter().map(|s| s.layer.name.as_str()).collect();
        assert_eq!(names, ["older", "newer"]);
        assert_eq!(list.iter().map(|s| s.marker_count).collect::<Vec<_>>(), [0, 1]);
    }

    #[tokio::test]
    async fn marker_insert_requires_layer() {
        let store = MemoryStore::new();
        let result = store.insert_marker(&marker(LayerId::new(), "m")).await;
        assert!(matches!(result, Err(MapError::LayerNotFound(_))));
    }

    #[tokio::test]
    async fn markers_listed_newest_first_and_filtered() {
        let store = MemoryStore::new();
        let a = layer("a");
        let b = layer("b");
        let _ = store.insert_layer(&a).await;
        let _ = store.insert_layer(&b).await;
        let mut first = marker(a.id, "first");
        first.created_at = Utc::now() - Duration::seconds(10);
        let second = marker(a.id, "second");
        let other = marker(b.id, "other");
        for m in [&first, &second, &other] {
            let _ = store.insert_marker(m).await;
        }

        let Ok(in_a) = store.list_markers(Some(a.id)).await else {
            panic!("list failed");
        };
        let names: Vec<_> = in_a.iter().filter_map(|r| r.marker.name.as_deref()).collect();
        assert_eq!(names, ["second", "first"]);

        let Ok(all) = store.list_markers(None).await else {
            panic!("list failed");
        };
        assert_eq!(all.len(), 3);
    }

    #[tokio::test]
    async fn delete_layer_cascades_to_markers() {
        let store = MemoryStore::new();
        let l = layer("L1");
        let keep = layer("keep");
        let _ = store.insert_layer(&l).await;
        let _ = store.insert_layer(&keep).await;
        let _ = store.insert_marker(&marker(l.id, "M1")).await;
        let _ = store.insert_marker(&marker(l.id, "M2")).await;
        let _ = store.insert_marker(&marker(keep.id, "M3")).await;

        let Ok(removed) = store.delete_layer(l.id).await else {
            panic!("delete failed");
        };
        assert_eq!(removed, 2);
        let Ok(remaining) = store.list_markers(None).await else {
            panic!("list failed");
        };
        assert_eq!(remaining.len(), 1);
        assert!(store.get_layer(l.id).await.is_err());
    }

    #[tokio::test]
    async fn raw_labels_are_read_leniently() {
        let store = MemoryStore::new();
        let l = layer("a");
        let _ = store.insert_layer(&l).await;
        let m = marker(l.id, "m");
        let _ = store.insert_marker(&m).await;
        assert!(store.set_raw_labels(m.id, "{oops").await.is_ok());

        let Ok(record) = store.get_marker(m.id).await else {
            panic!("marker should exist");
        };
        assert!(record.marker.labels.is_empty());
        let Ok(texts) = store.label_texts().await else {
            panic!("labels failed");
        };
        assert_eq!(texts, ["{oops"]);
    }

    #[tokio::test]
    async fn delete_missing_marker_is_not_found() {
        let store = MemoryStore::new();
        let result = store.delete_marker(MarkerId::new()).await;
        assert!(matches!(result, Err(MapError::MarkerNotFound(_))));
    }
}

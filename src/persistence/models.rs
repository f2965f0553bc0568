//! Row mapping between PostgreSQL result rows and domain types.
//!
//! Marker queries join the owning layer with `l_`-prefixed column aliases
//! so a single row decodes into a [`MarkerRecord`].

use sqlx::Row;
use sqlx::postgres::PgRow;

use crate::domain::labels;
use crate::domain::{Layer, LayerId, LayerSummary, Marker, MarkerId, MarkerRecord};

/// Columns selected for a marker joined with its layer.
pub const MARKER_COLUMNS: &str = "m.id, m.name, m.description, m.photo, m.latitude, m.longitude, \
     m.labels, m.layer_id, m.created_at, m.updated_at, \
     l.id AS l_id, l.name AS l_name, l.color AS l_color, l.visible AS l_visible, \
     l.created_at AS l_created_at, l.updated_at AS l_updated_at";

/// Decodes a row of the `layers` table.
///
/// # Errors
///
/// Returns the `sqlx` decode error for a missing or mistyped column.
pub fn layer_from_row(row: &PgRow) -> Result<Layer, sqlx::Error> {
    Ok(Layer {
        id: LayerId::from_uuid(row.try_get("id")?),
        name: row.try_get("name")?,
        color: row.try_get("color")?,
        visible: row.try_get("visible")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

/// Decodes a layer row carrying a `marker_count` column.
///
/// # Errors
///
/// Returns the `sqlx` decode error for a missing or mistyped column.
pub fn layer_summary_from_row(row: &PgRow) -> Result<LayerSummary, sqlx::Error> {
    let count: i64 = row.try_get("marker_count")?;
    Ok(LayerSummary {
        layer: layer_from_row(row)?,
        marker_count: u64::try_from(count).unwrap_or_default(),
    })
}

/// Decodes a marker row selected with [`MARKER_COLUMNS`].
///
/// # Errors
///
/// Returns the `sqlx` decode error for a missing or mistyped column.
pub fn marker_record_from_row(row: &PgRow) -> Result<MarkerRecord, sqlx::Error> {
    let stored_labels: String = row.try_get("labels")?;
    let marker = Marker {
        id: MarkerId::from_uuid(row.try_get("id")?),
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        photo: row.try_get("photo")?,
        latitude: row.try_get("latitude")?,
        longitude: row.try_get("longitude")?,
        labels: labels::decode_lenient(&stored_labels),
        layer_id: LayerId::from_uuid(row.try_get("layer_id")?),
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    };
    let layer = Layer {
        id: LayerId::from_uuid(row.try_get("l_id")?),
        name: row.try_get("l_name")?,
        color: row.try_get("l_color")?,
        visible: row.try_get("l_visible")?,
        created_at: row.try_get("l_created_at")?,
        updated_at: row.try_get("l_updated_at")?,
    };
    Ok(MarkerRecord { marker, layer })
}

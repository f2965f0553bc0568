//! PostgreSQL implementation of the persistence layer.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::PgPool;
use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;

use super::MapStore;
use super::models::{MARKER_COLUMNS, layer_from_row, layer_summary_from_row, marker_record_from_row};
use crate::config::MapConfig;
use crate::domain::labels;
use crate::domain::{Layer, LayerId, LayerSummary, Marker, MarkerId, MarkerRecord};
use crate::error::MapError;

/// SQLSTATE for `foreign_key_violation`.
const FOREIGN_KEY_VIOLATION: &str = "23503";

/// PostgreSQL-backed store using `sqlx::PgPool`.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a store over an existing connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Opens a connection pool sized from the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::Storage`] if the database is unreachable.
    pub async fn connect(config: &MapConfig) -> Result<Self, MapError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .min_connections(config.database_min_connections)
            .acquire_timeout(Duration::from_secs(config.database_connect_timeout_secs))
            .connect(&config.database_url)
            .await?;
        Ok(Self::new(pool))
    }

    /// Applies pending migrations from `dir`.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::Storage`] if the migrations cannot be read or
    /// applied.
    pub async fn migrate(&self, dir: &Path) -> Result<(), MapError> {
        let migrator = Migrator::new(dir)
            .await
            .map_err(|e| MapError::Storage(format!("loading migrations: {e}")))?;
        migrator
            .run(&self.pool)
            .await
            .map_err(|e| MapError::Storage(format!("running migrations: {e}")))?;
        tracing::info!(dir = %dir.display(), "migrations applied");
        Ok(())
    }

    async fn fetch_record(&self, id: MarkerId) -> Result<MarkerRecord, MapError> {
        let sql = format!(
            "SELECT {MARKER_COLUMNS} FROM markers m JOIN layers l ON l.id = m.layer_id WHERE m.id = $1"
        );
        let row = sqlx::query(&sql)
            .bind(*id.as_uuid())
            .fetch_optional(&self.pool)
            .await?
            .ok_or(MapError::MarkerNotFound(id))?;
        Ok(marker_record_from_row(&row)?)
    }
}

/// Maps a marker write error, turning a dangling `layer_id` into
/// [`MapError::LayerNotFound`].
fn marker_write_error(err: sqlx::Error, layer_id: LayerId) -> MapError {
    let fk_violation = err
        .as_database_error()
        .and_then(|db| db.code())
        .is_some_and(|code| code == FOREIGN_KEY_VIOLATION);
    if fk_violation {
        MapError::LayerNotFound(layer_id)
    } else {
        MapError::from(err)
    }
}

#[async_trait]
impl MapStore for PostgresStore {
    async fn list_layers(&self) -> Result<Vec<LayerSummary>, MapError> {
        let rows = sqlx::query(
            "SELECT l.id, l.name, l.color, l.visible, l.created_at, l.updated_at, \
             COUNT(m.id) AS marker_count \
             FROM layers l LEFT JOIN markers m ON m.layer_id = l.id \
             GROUP BY l.id ORDER BY l.created_at ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| layer_summary_from_row(row).map_err(MapError::from))
            .collect()
    }

    async fn get_layer(&self, id: LayerId) -> Result<Layer, MapError> {
        let row = sqlx::query(
            "SELECT id, name, color, visible, created_at, updated_at FROM layers WHERE id = $1",
        )
        .bind(*id.as_uuid())
        .fetch_optional(&self.pool)
        .await?
        .ok_or(MapError::LayerNotFound(id))?;
        Ok(layer_from_row(&row)?)
    }

    async fn insert_layer(&self, layer: &Layer) -> Result<(), MapError> {
        sqlx::query(
            "INSERT INTO layers (id, name, color, visible, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(*layer.id.as_uuid())
        .bind(&layer.name)
        .bind(&layer.color)
        .bind(layer.visible)
        .bind(layer.created_at)
        .bind(layer.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn update_layer(&self, layer: &Layer) -> Result<(), MapError> {
        let result = sqlx::query(
            "UPDATE layers SET name = $2, color = $3, visible = $4, updated_at = $5 WHERE id = $1",
        )
        .bind(*layer.id.as_uuid())
        .bind(&layer.name)
        .bind(&layer.color)
        .bind(layer.visible)
        .bind(layer.updated_at)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(MapError::LayerNotFound(layer.id));
        }
        Ok(())
    }

    async fn delete_layer(&self, id: LayerId) -> Result<u64, MapError> {
        let mut tx = self.pool.begin().await?;

        let markers = sqlx::query("DELETE FROM markers WHERE layer_id = $1")
            .bind(*id.as_uuid())
            .execute(&mut *tx)
            .await?
            .rows_affected();

        let layers = sqlx::query("DELETE FROM layers WHERE id = $1")
            .bind(*id.as_uuid())
            .execute(&mut *tx)
            .await?
            .rows_affected();

        if layers == 0 {
            tx.rollback().await?;
            return Err(MapError::LayerNotFound(id));
        }
        tx.commit().await?;
        Ok(markers)
    }

    async fn list_markers(&self, layer: Option<LayerId>) -> Result<Vec<MarkerRecord>, MapError> {
        let rows = if let Some(layer_id) = layer {
            let sql = format!(
                "SELECT {MARKER_COLUMNS} FROM markers m JOIN layers l ON l.id = m.layer_id \
                 WHERE m.layer_id = $1 ORDER BY m.created_at DESC"
            );
            sqlx::query(&sql)
                .bind(*layer_id.as_uuid())
                .fetch_all(&self.pool)
                .await
        } else {
            let sql = format!(
                "SELECT {MARKER_COLUMNS} FROM markers m JOIN layers l ON l.id = m.layer_id \
                 ORDER BY m.created_at DESC"
            );
            sqlx::query(&sql).fetch_all(&self.pool).await
        }?;

        rows.iter()
            .map(|row| marker_record_from_row(row).map_err(MapError::from))
            .collect()
    }

    async fn label_texts(&self) -> Result<Vec<String>, MapError> {
        let texts = sqlx::query_scalar::<_, String>("SELECT labels FROM markers")
            .fetch_all(&self.pool)
            .await?;
        Ok(texts)
    }

    async fn get_marker(&self, id: MarkerId) -> Result<MarkerRecord, MapError> {
        self.fetch_record(id).await
    }

    async fn insert_marker(&self, marker: &Marker) -> Result<MarkerRecord, MapError> {
        sqlx::query(
            "INSERT INTO markers (id, name, description, photo, latitude, longitude, labels, \
             layer_id, created_at, updated_at) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
        )
        .bind(*marker.id.as_uuid())
        .bind(&marker.name)
        .bind(&marker.description)
        .bind(&marker.photo)
        .bind(marker.latitude)
        .bind(marker.longitude)
        .bind(labels::encode(&marker.labels))
        .bind(*marker.layer_id.as_uuid())
        .bind(marker.created_at)
        .bind(marker.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| marker_write_error(e, marker.layer_id))?;

        self.fetch_record(marker.id).await
    }

    async fn update_marker(&self, marker: &Marker) -> Result<MarkerRecord, MapError> {
        let result = sqlx::query(
            "UPDATE markers SET name = $2, description = $3, photo = $4, latitude = $5, \
             longitude = $6, labels = $7, layer_id = $8, updated_at = $9 WHERE id = $1",
        )
        .bind(*marker.id.as_uuid())
        .bind(&marker.name)
        .bind(&marker.description)
        .bind(&marker.photo)
        .bind(marker.latitude)
        .bind(marker.longitude)
        .bind(labels::encode(&marker.labels))
        .bind(*marker.layer_id.as_uuid())
        .bind(marker.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| marker_write_error(e, marker.layer_id))?;

        if result.rows_affected() == 0 {
            return Err(MapError::MarkerNotFound(marker.id));
        }
        self.fetch_record(marker.id).await
    }

    async fn delete_marker(&self, id: MarkerId) -> Result<(), MapError> {
        let result = sqlx::query("DELETE FROM markers WHERE id = $1")
            .bind(*id.as_uuid())
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(MapError::MarkerNotFound(id));
        }
        Ok(())
    }
}

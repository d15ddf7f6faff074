// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Extraction watermark stored in the MySQL metadata database.

use crate::config::MetadataStoreConfig;
use crate::db::{tables, WatermarkStore};
use crate::error::{PipelineError, Result};
use crate::time_utils::{naive_as_utc, watermark_floor};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::mysql::{MySqlConnectOptions, MySqlPool, MySqlPoolOptions};

/// Watermark history table, one row per successful extraction.
#[derive(Clone)]
pub struct MySqlWatermarkStore {
    pool: MySqlPool,
}

impl MySqlWatermarkStore {
    /// Connect and make sure the watermark table exists.
    pub async fn connect(config: &MetadataStoreConfig) -> Result<Self> {
        let options = MySqlConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .username(&config.username)
            .password(&config.password)
            .database(&config.database);

        let pool = MySqlPoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .map_err(|e| PipelineError::Metadata(format!("Failed to connect to MySQL: {}", e)))?;

        tracing::info!(host = %config.host, database = %config.database, "MySQL connection established");

        let store = Self { pool };
        store.ensure_table().await?;
        Ok(store)
    }

    async fn ensure_table(&self) -> Result<()> {
        let sql = format!(
            "CREATE TABLE IF NOT EXISTS {} (LastUpdated DATETIME NOT NULL)",
            tables::LAST_EXTRACTED
        );
        sqlx::query(&sql)
            .execute(&self.pool)
            .await
            .map_err(|e| PipelineError::Metadata(e.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl WatermarkStore for MySqlWatermarkStore {
    async fn last_extracted(&self) -> Result<DateTime<Utc>> {
        let sql = format!("SELECT MAX(LastUpdated) FROM {}", tables::LAST_EXTRACTED);
        let latest: Option<NaiveDateTime> = sqlx::query_scalar(&sql)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| PipelineError::Metadata(e.to_string()))?;

        Ok(latest.map(naive_as_utc).unwrap_or_else(watermark_floor))
    }

    async fn record_extraction(&self, at: DateTime<Utc>) -> Result<()> {
        let sql = format!(
            "INSERT INTO {} (LastUpdated) VALUES (?)",
            tables::LAST_EXTRACTED
        );
        sqlx::query(&sql)
            .bind(at.naive_utc())
            .execute(&self.pool)
            .await
            .map_err(|e| PipelineError::Metadata(e.to_string()))?;

        tracing::info!(last_updated = %at, "Extraction datetime recorded");
        Ok(())
    }
}

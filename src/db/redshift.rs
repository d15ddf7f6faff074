// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Redshift warehouse over the Postgres wire protocol.
//!
//! Statements go through the simple query protocol (`raw_sql`) so that
//! multi-statement SQL scripts run unchanged. Result values therefore arrive
//! in text format and are converted to `Scalar` by column type.

use crate::config::WarehouseConfig;
use crate::db::{copy_statement, Warehouse};
use crate::error::{PipelineError, Result};
use crate::models::Scalar;
use async_trait::async_trait;
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions, PgRow};
use sqlx::{Row, TypeInfo, ValueRef};

/// Warehouse client backed by a small connection pool.
#[derive(Clone)]
pub struct RedshiftWarehouse {
    pool: PgPool,
}

impl RedshiftWarehouse {
    /// Connect using the warehouse section of the configuration.
    pub async fn connect(config: &WarehouseConfig) -> Result<Self> {
        let options = PgConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .username(&config.username)
            .password(&config.password)
            .database(&config.database);

        let pool = PgPoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .map_err(|e| PipelineError::Warehouse(format!("Failed to connect to Redshift: {}", e)))?;

        tracing::info!(
            host = %config.host,
            database = %config.database,
            "Connected to Redshift"
        );

        Ok(Self { pool })
    }

    /// Connect with a `postgres://` URL (used by integration tests).
    pub async fn connect_url(url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(1)
            .connect(url)
            .await
            .map_err(|e| PipelineError::Warehouse(format!("Failed to connect: {}", e)))?;
        Ok(Self { pool })
    }

    /// Close the pool, waiting for in-flight statements.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl Warehouse for RedshiftWarehouse {
    async fn run_scalar_query(&self, sql: &str) -> Result<Scalar> {
        tracing::debug!(sql, "Running scalar query");

        let rows = sqlx::raw_sql(sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| PipelineError::Warehouse(e.to_string()))?;

        match rows.first() {
            Some(row) => decode_scalar(row),
            None => Err(PipelineError::Warehouse(NO_ROWS.to_string())),
        }
    }

    async fn run_statement(&self, sql: &str) -> Result<()> {
        tracing::debug!(sql, "Running statement");

        sqlx::raw_sql(sql)
            .execute(&self.pool)
            .await
            .map_err(|e| PipelineError::Warehouse(e.to_string()))?;
        Ok(())
    }

    async fn run_batch(&self, statements: &[String]) -> Result<()> {
        let script = batch_script(statements);
        tracing::debug!(sql = %script, "Running statement batch");

        sqlx::raw_sql(&script)
            .execute(&self.pool)
            .await
            .map_err(|e| PipelineError::Warehouse(e.to_string()))?;
        Ok(())
    }

    async fn bulk_load(&self, table: &str, source_uri: &str, iam_role_arn: &str) -> Result<()> {
        tracing::info!(table, source = source_uri, "Bulk loading from object storage");
        self.run_statement(&copy_statement(table, source_uri, iam_role_arn))
            .await
    }
}

/// Error text for a scalar query without a result row.
const NO_ROWS: &str = "query returned no rows";

/// Join statements into one multi-statement query.
///
/// A simple query without explicit transaction control runs as one implicit
/// transaction: a failing statement rolls back everything before it.
fn batch_script(statements: &[String]) -> String {
    statements
        .iter()
        .map(|sql| format!("{};", sql.trim().trim_end_matches(';')))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Convert the first column of a text-format row into a `Scalar`.
fn decode_scalar(row: &PgRow) -> Result<Scalar> {
    if row.is_empty() {
        return Ok(Scalar::Null);
    }

    let raw = row
        .try_get_raw(0)
        .map_err(|e| PipelineError::Warehouse(e.to_string()))?;
    if raw.is_null() {
        return Ok(Scalar::Null);
    }
    let type_name = raw.type_info().name().to_string();

    let text: &str = row
        .try_get_unchecked(0)
        .map_err(|e| PipelineError::Warehouse(e.to_string()))?;

    Ok(scalar_from_text(&type_name, text))
}

/// Interpret a text-format value according to its Postgres type name.
fn scalar_from_text(type_name: &str, text: &str) -> Scalar {
    match type_name {
        "INT2" | "INT4" | "INT8" => text
            .parse()
            .map(Scalar::Int)
            .unwrap_or_else(|_| Scalar::Text(text.to_string())),
        "FLOAT4" | "FLOAT8" | "NUMERIC" => text
            .parse()
            .map(Scalar::Float)
            .unwrap_or_else(|_| Scalar::Text(text.to_string())),
        "BOOL" => match text {
            "t" | "true" => Scalar::Bool(true),
            "f" | "false" => Scalar::Bool(false),
            other => Scalar::Text(other.to_string()),
        },
        _ => Scalar::Text(text.to_string()),
    }
}

// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Database layer: the Redshift warehouse and the MySQL metadata store.
//!
//! Pipeline steps only see the `Warehouse` and `WatermarkStore` traits, so
//! they can run against in-memory fakes in tests.

pub mod mysql;
pub mod redshift;

pub use mysql::MySqlWatermarkStore;
pub use redshift::RedshiftWarehouse;

use crate::error::Result;
use crate::models::Scalar;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Table names as constants.
pub mod tables {
    /// Ephemeral relation the export file is loaded into.
    pub const STAGING: &str = "staging_table";
    /// Watermark history in the metadata store.
    pub const LAST_EXTRACTED: &str = "last_extracted";
}

/// Narrow interface to the analytical warehouse.
#[async_trait]
pub trait Warehouse: Send + Sync {
    /// Run a query and return the first column of the first row.
    ///
    /// Extra rows and columns are ignored. A query without a result row is
    /// an error; a SQL `NULL` in the first column is `Scalar::Null`.
    async fn run_scalar_query(&self, sql: &str) -> Result<Scalar>;

    /// Run one statement (or a script of statements) for its side effects.
    async fn run_statement(&self, sql: &str) -> Result<()>;

    /// Run several statements in a single transaction.
    async fn run_batch(&self, statements: &[String]) -> Result<()>;

    /// Bulk-load a file from object storage into `table`.
    async fn bulk_load(&self, table: &str, source_uri: &str, iam_role_arn: &str) -> Result<()>;
}

/// Append-only history of successful extraction runs.
#[async_trait]
pub trait WatermarkStore: Send + Sync {
    /// Latest recorded extraction time, or the floor if none was recorded.
    async fn last_extracted(&self) -> Result<DateTime<Utc>>;

    /// Append a new watermark row.
    async fn record_extraction(&self, at: DateTime<Utc>) -> Result<()>;
}

/// `COPY` statement in the shape Redshift expects.
pub fn copy_statement(table: &str, source_uri: &str, iam_role_arn: &str) -> String {
    format!(
        "COPY {} FROM '{}' IAM_ROLE '{}'",
        table, source_uri, iam_role_arn
    )
}

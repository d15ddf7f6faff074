// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Merge the staging table into production (upsert by id).

use crate::db::{tables, Warehouse};
use crate::error::Result;

/// Statements of the merge, in execution order.
///
/// Existing rows sharing an id with staging are deleted, all staging rows are
/// inserted, then staging is dropped.
pub fn merge_statements(table_name: &str) -> Vec<String> {
    let staging = tables::STAGING;
    vec![
        format!(
            "DELETE FROM {table} USING {staging} WHERE {table}.id = {staging}.id;",
            table = table_name,
            staging = staging
        ),
        format!("INSERT INTO {} SELECT * FROM {};", table_name, staging),
        format!("DROP TABLE {};", staging),
    ]
}

/// Upsert staging rows into `table_name` and drop the staging table.
///
/// All three statements run in one transaction; a failure leaves both
/// tables as they were.
pub async fn merge_staging(warehouse: &dyn Warehouse, table_name: &str) -> Result<()> {
    warehouse.run_batch(&merge_statements(table_name)).await?;
    tracing::info!(table = table_name, "Staging table merged into production");
    Ok(())
}

// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Load the uploaded export file into a fresh staging table.

use crate::db::{tables, Warehouse};
use crate::error::Result;

/// `CREATE TABLE staging_table (LIKE <table>)`
pub fn create_staging_sql(table_name: &str) -> String {
    format!("CREATE TABLE {} (LIKE {});", tables::STAGING, table_name)
}

/// Create the staging table with the production layout and bulk-load the
/// file at `source_uri` into it.
///
/// A malformed file fails the whole load. In that case the half-created
/// staging table is dropped again so the step can be retried as is.
pub async fn load_staging(
    warehouse: &dyn Warehouse,
    table_name: &str,
    source_uri: &str,
    iam_role_arn: &str,
) -> Result<()> {
    warehouse
        .run_statement(&create_staging_sql(table_name))
        .await?;
    tracing::info!(staging = tables::STAGING, like = table_name, "Staging table created");

    if let Err(e) = warehouse
        .bulk_load(tables::STAGING, source_uri, iam_role_arn)
        .await
    {
        tracing::error!(error = %e, source = source_uri, "Bulk load into staging failed");
        let drop_sql = format!("DROP TABLE IF EXISTS {};", tables::STAGING);
        if let Err(cleanup) = warehouse.run_statement(&drop_sql).await {
            tracing::warn!(error = %cleanup, "Failed to drop staging table after failed load");
        }
        return Err(e);
    }

    tracing::info!(source = source_uri, "Export file copied to staging table");
    Ok(())
}

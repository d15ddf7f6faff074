// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Rebuild the derived monthly data model.

use crate::db::Warehouse;
use crate::error::Result;
use std::path::Path;

/// Script run by `build-model` when none is given.
pub const DEFAULT_MODEL_SCRIPT: &str = "sql/data_models/build_monthly_data_model.sql";

/// Execute the model script against the warehouse. Nothing is returned.
pub async fn build_data_model(warehouse: &dyn Warehouse, script_path: &Path) -> Result<()> {
    let sql = tokio::fs::read_to_string(script_path).await?;
    warehouse.run_statement(&sql).await?;
    tracing::info!(script = %script_path.display(), "Data model built");
    Ok(())
}

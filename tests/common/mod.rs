// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-memory fakes for the warehouse, metadata store and object store.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Mutex;
use strava_elt::config::StravaConfig;
use strava_elt::db::{Warehouse, WatermarkStore};
use strava_elt::error::{PipelineError, Result};
use strava_elt::models::Scalar;
use strava_elt::services::storage::{s3_uri, ObjectStore};
use strava_elt::time_utils::watermark_floor;

/// Check if a live Postgres is available via environment variable.
pub fn warehouse_url() -> Option<String> {
    std::env::var("WAREHOUSE_TEST_URL").ok()
}

/// Skip test with message if no live warehouse is configured.
#[macro_export]
macro_rules! require_warehouse {
    () => {
        match crate::common::warehouse_url() {
            Some(url) => url,
            None => {
                eprintln!("⚠️  Skipping: WAREHOUSE_TEST_URL not set");
                return;
            }
        }
    };
}

/// Strava config pointing at a mock server.
pub fn strava_config(base_url: &str) -> StravaConfig {
    StravaConfig {
        client_id: "test_client_id".to_string(),
        client_secret: "test_secret".to_string(),
        refresh_token: "test_refresh_token".to_string(),
        auth_url: format!("{}/oauth/token", base_url),
        api_url: format!("{}/api/v3", base_url),
    }
}

/// A row of a fake table: the id plus an opaque payload.
#[derive(Debug, Clone, PartialEq)]
pub struct FakeRow {
    pub id: i64,
    pub payload: String,
}

pub fn row(id: i64, payload: &str) -> FakeRow {
    FakeRow {
        id,
        payload: payload.to_string(),
    }
}

#[derive(Default)]
struct WarehouseState {
    tables: HashMap<String, Vec<FakeRow>>,
    statements: Vec<String>,
    /// `None` scripts a query that returns no rows.
    scalars: HashMap<String, Option<Scalar>>,
    files: HashMap<String, Vec<FakeRow>>,
    fail_bulk_load: bool,
}

/// Warehouse that understands exactly the statements the pipeline issues:
/// `CREATE TABLE .. (LIKE ..)`, `DELETE .. USING`, `INSERT .. SELECT *`,
/// `DROP TABLE [IF EXISTS]`. Scalar queries are answered from a map keyed
/// by the trimmed SQL text; a query scripted as empty fails like a real
/// result without rows.
#[derive(Default)]
pub struct FakeWarehouse {
    state: Mutex<WarehouseState>,
}

impl FakeWarehouse {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table(self, name: &str, rows: Vec<FakeRow>) -> Self {
        self.state
            .lock()
            .unwrap()
            .tables
            .insert(name.to_string(), rows);
        self
    }

    /// Rows `bulk_load` will copy for `uri`.
    pub fn with_file(self, uri: &str, rows: Vec<FakeRow>) -> Self {
        self.state
            .lock()
            .unwrap()
            .files
            .insert(uri.to_string(), rows);
        self
    }

    pub fn with_scalar(self, sql: &str, value: Scalar) -> Self {
        self.state
            .lock()
            .unwrap()
            .scalars
            .insert(sql.trim().to_string(), Some(value));
        self
    }

    pub fn with_empty_result(self, sql: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .scalars
            .insert(sql.trim().to_string(), None);
        self
    }

    pub fn failing_bulk_load(self) -> Self {
        self.state.lock().unwrap().fail_bulk_load = true;
        self
    }

    pub fn table(&self, name: &str) -> Option<Vec<FakeRow>> {
        self.state.lock().unwrap().tables.get(name).cloned()
    }

    pub fn statements(&self) -> Vec<String> {
        self.state.lock().unwrap().statements.clone()
    }
}

fn fake_error(msg: impl Into<String>) -> PipelineError {
    PipelineError::Warehouse(msg.into())
}

/// Apply one statement to `tables`.
fn apply(tables: &mut HashMap<String, Vec<FakeRow>>, sql: &str) -> Result<()> {
    let sql = sql.trim().trim_end_matches(';');

    if let Some(rest) = sql.strip_prefix("CREATE TABLE ") {
        let (name, like) = rest
            .split_once(" (LIKE ")
            .ok_or_else(|| fake_error(format!("unsupported: {}", sql)))?;
        let like = like.trim_end_matches(')');
        if !tables.contains_key(like) {
            return Err(fake_error(format!("relation \"{}\" does not exist", like)));
        }
        if tables.contains_key(name) {
            return Err(fake_error(format!("relation \"{}\" already exists", name)));
        }
        tables.insert(name.to_string(), Vec::new());
        return Ok(());
    }

    if let Some(rest) = sql.strip_prefix("DELETE FROM ") {
        let (target, rest) = rest
            .split_once(" USING ")
            .ok_or_else(|| fake_error(format!("unsupported: {}", sql)))?;
        let source = rest.split_whitespace().next().unwrap_or_default();
        let ids: Vec<i64> = tables
            .get(source)
            .ok_or_else(|| fake_error(format!("relation \"{}\" does not exist", source)))?
            .iter()
            .map(|r| r.id)
            .collect();
        let rows = tables
            .get_mut(target)
            .ok_or_else(|| fake_error(format!("relation \"{}\" does not exist", target)))?;
        rows.retain(|r| !ids.contains(&r.id));
        return Ok(());
    }

    if let Some(rest) = sql.strip_prefix("INSERT INTO ") {
        let (target, source) = rest
            .split_once(" SELECT * FROM ")
            .ok_or_else(|| fake_error(format!("unsupported: {}", sql)))?;
        let rows = tables
            .get(source)
            .cloned()
            .ok_or_else(|| fake_error(format!("relation \"{}\" does not exist", source)))?;
        tables
            .get_mut(target)
            .ok_or_else(|| fake_error(format!("relation \"{}\" does not exist", target)))?
            .extend(rows);
        return Ok(());
    }

    if let Some(name) = sql.strip_prefix("DROP TABLE IF EXISTS ") {
        tables.remove(name);
        return Ok(());
    }

    if let Some(name) = sql.strip_prefix("DROP TABLE ") {
        return tables
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| fake_error(format!("table \"{}\" does not exist", name)));
    }

    // Anything else (model scripts, etc.) is accepted as a no-op.
    Ok(())
}

#[async_trait]
impl Warehouse for FakeWarehouse {
    async fn run_scalar_query(&self, sql: &str) -> Result<Scalar> {
        let mut state = self.state.lock().unwrap();
        state.statements.push(sql.to_string());
        match state.scalars.get(sql.trim()) {
            Some(Some(value)) => Ok(value.clone()),
            Some(None) => Err(fake_error("query returned no rows")),
            None => Err(fake_error(format!("syntax error in: {}", sql.trim()))),
        }
    }

    async fn run_statement(&self, sql: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.statements.push(sql.to_string());
        apply(&mut state.tables, sql)
    }

    async fn run_batch(&self, statements: &[String]) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        let mut tables = state.tables.clone();
        for sql in statements {
            state.statements.push(sql.clone());
            apply(&mut tables, sql)?;
        }
        state.tables = tables;
        Ok(())
    }

    async fn bulk_load(&self, table: &str, source_uri: &str, iam_role_arn: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state
            .statements
            .push(strava_elt::db::copy_statement(table, source_uri, iam_role_arn));
        if state.fail_bulk_load {
            return Err(fake_error("Load into table failed. Check 'stl_load_errors'"));
        }
        let rows = state.files.get(source_uri).cloned().unwrap_or_default();
        state
            .tables
            .get_mut(table)
            .ok_or_else(|| fake_error(format!("relation \"{}\" does not exist", table)))?
            .extend(rows);
        Ok(())
    }
}

/// Watermark history kept in memory.
pub struct FakeWatermarkStore {
    history: Mutex<Vec<DateTime<Utc>>>,
}

impl FakeWatermarkStore {
    pub fn new(history: Vec<DateTime<Utc>>) -> Self {
        Self {
            history: Mutex::new(history),
        }
    }

    pub fn history(&self) -> Vec<DateTime<Utc>> {
        self.history.lock().unwrap().clone()
    }
}

#[async_trait]
impl WatermarkStore for FakeWatermarkStore {
    async fn last_extracted(&self) -> Result<DateTime<Utc>> {
        Ok(self
            .history
            .lock()
            .unwrap()
            .iter()
            .max()
            .copied()
            .unwrap_or_else(watermark_floor))
    }

    async fn record_extraction(&self, at: DateTime<Utc>) -> Result<()> {
        self.history.lock().unwrap().push(at);
        Ok(())
    }
}

/// Bucket kept in memory. Can be told to reject uploads.
pub struct FakeObjectStore {
    bucket: String,
    objects: Mutex<HashMap<String, Vec<u8>>>,
    fail_uploads: bool,
}

impl FakeObjectStore {
    pub fn new(bucket: &str) -> Self {
        Self {
            bucket: bucket.to_string(),
            objects: Mutex::new(HashMap::new()),
            fail_uploads: false,
        }
    }

    pub fn failing(bucket: &str) -> Self {
        Self {
            fail_uploads: true,
            ..Self::new(bucket)
        }
    }

    pub fn object(&self, key: &str) -> Option<Vec<u8>> {
        self.objects.lock().unwrap().get(key).cloned()
    }
}

#[async_trait]
impl ObjectStore for FakeObjectStore {
    async fn upload(&self, key: &str, data: Vec<u8>) -> Result<()> {
        if self.fail_uploads {
            return Err(PipelineError::Storage(format!(
                "Failed to upload {}: AccessDenied",
                key
            )));
        }
        self.objects.lock().unwrap().insert(key.to_string(), data);
        Ok(())
    }

    fn uri(&self, key: &str) -> String {
        s3_uri(&self.bucket, key)
    }
}

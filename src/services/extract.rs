// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Incremental extraction of new Strava activities.
//!
//! Handles the extract step end to end:
//! 1. Read the watermark from the metadata store
//! 2. Page through the activity list (newest first) until an activity at or
//!    before the watermark shows up
//! 3. Write the pipe-delimited export file and upload it
//! 4. Append a new watermark, only once the upload succeeded

use crate::config::ExportConfig;
use crate::db::WatermarkStore;
use crate::error::{FetchError, PipelineError, Result};
use crate::models::activity::START_DATE_FIELD;
use crate::models::{ActivityRecord, ActivityRow};
use crate::services::export::{export_bytes, export_key};
use crate::services::storage::ObjectStore;
use crate::services::strava::StravaClient;
use crate::time_utils::{format_utc_rfc3339, parse_strava_timestamp};
use chrono::{DateTime, NaiveDate, Utc};
use serde_json::Value;
use std::time::Duration;

/// Strava allows 100 requests per 15 minutes; stay well under it.
const REQUESTS_PER_WINDOW: u32 = 75;
const BACKOFF: Duration = Duration::from_secs(15 * 60);

/// Request pacing for the extraction loop.
#[derive(Debug, Clone)]
pub struct RateLimitPolicy {
    /// Pause after this many requests (0 disables the pause)
    pub requests_per_window: u32,
    /// How long to pause, both for the periodic pause and before a retry
    pub backoff: Duration,
}

impl Default for RateLimitPolicy {
    fn default() -> Self {
        Self {
            requests_per_window: REQUESTS_PER_WINDOW,
            backoff: BACKOFF,
        }
    }
}

/// Activities pulled in one run, plus request accounting.
#[derive(Debug, Default)]
pub struct Extraction {
    /// Newest first, all strictly after the watermark
    pub records: Vec<ActivityRecord>,
    /// API requests made, retries included
    pub requests: u32,
    /// Times the loop slept for the rate limit
    pub backoffs: u32,
}

/// Counts requests and sleeps when the policy says so.
struct Pacer<'a> {
    policy: &'a RateLimitPolicy,
    requests: u32,
    backoffs: u32,
    /// Set by a retry back-off; the next request skips the window pause.
    rested: bool,
}

impl<'a> Pacer<'a> {
    fn new(policy: &'a RateLimitPolicy) -> Self {
        Self {
            policy,
            requests: 0,
            backoffs: 0,
            rested: false,
        }
    }

    /// Call before every request.
    async fn before_request(&mut self) {
        let window = self.policy.requests_per_window;
        let rested = std::mem::take(&mut self.rested);
        if !rested && window > 0 && self.requests > 0 && self.requests % window == 0 {
            tracing::info!(
                requests = self.requests,
                backoff_secs = self.policy.backoff.as_secs(),
                "Request window used up, pausing"
            );
            self.sleep().await;
        }
        self.requests += 1;
    }

    async fn sleep(&mut self) {
        self.backoffs += 1;
        tokio::time::sleep(self.policy.backoff).await;
    }

    /// Back off before retrying a page.
    async fn rest(&mut self) {
        self.sleep().await;
        self.rested = true;
    }
}

/// Extract every activity newer than `watermark`.
///
/// The API lists activities newest first, one per page. The loop stops at
/// the first activity whose `start_date` is at or before the watermark, or
/// when a page still carries no activity after one back-off and retry.
pub async fn extract_activities(
    client: &StravaClient,
    access_token: &str,
    watermark: DateTime<Utc>,
    policy: &RateLimitPolicy,
) -> Result<Extraction> {
    let mut pacer = Pacer::new(policy);
    let mut records = Vec::new();
    let mut page = 1u32;

    tracing::info!(watermark = %format_utc_rfc3339(watermark), "Extracting activities");

    while let Some(activity) = fetch_page(client, access_token, page, &mut pacer).await? {
        let start_date = activity
            .get(START_DATE_FIELD)
            .and_then(Value::as_str)
            .and_then(parse_strava_timestamp)
            .ok_or_else(|| {
                PipelineError::StravaApi(format!("Invalid start_date on page {}", page))
            })?;

        if start_date <= watermark {
            tracing::debug!(page, start_date = %start_date, "Reached watermark");
            break;
        }

        records.push(ActivityRecord {
            start_date,
            row: ActivityRow::from_response(&activity),
        });
        page += 1;
    }

    tracing::info!(
        count = records.len(),
        requests = pacer.requests,
        "Activities extracted from Strava"
    );

    Ok(Extraction {
        records,
        requests: pacer.requests,
        backoffs: pacer.backoffs,
    })
}

/// Fetch one page, retrying once after a back-off.
///
/// `Ok(None)` means the page has no activity even after the retry: the list
/// is exhausted.
async fn fetch_page(
    client: &StravaClient,
    access_token: &str,
    page: u32,
    pacer: &mut Pacer<'_>,
) -> Result<Option<Value>> {
    let mut retried = false;

    loop {
        pacer.before_request().await;

        match client.get_activity_page(access_token, page).await {
            Ok(activity) => return Ok(Some(activity)),
            Err(FetchError::Transport(msg)) => return Err(PipelineError::StravaApi(msg)),
            Err(FetchError::MissingField(field)) if retried => {
                tracing::info!(page, field, "No activity after retry, extraction complete");
                return Ok(None);
            }
            Err(FetchError::RateLimited) if retried => {
                return Err(PipelineError::RateLimited { page });
            }
            Err(err) => {
                tracing::warn!(
                    page,
                    error = %err,
                    backoff_secs = pacer.policy.backoff.as_secs(),
                    "Page unavailable, backing off before retry"
                );
                pacer.rest().await;
                retried = true;
            }
        }
    }
}

/// What an extract run produced.
#[derive(Debug, Clone)]
pub struct ExtractSummary {
    pub rows: usize,
    pub key: String,
    pub uri: String,
    pub watermark: DateTime<Utc>,
}

/// Collaborators of the extract step.
pub struct ExtractJob<'a> {
    pub client: &'a StravaClient,
    pub refresh_token: &'a str,
    pub watermarks: &'a dyn WatermarkStore,
    pub storage: &'a dyn ObjectStore,
    pub export: &'a ExportConfig,
    pub policy: RateLimitPolicy,
}

impl ExtractJob<'_> {
    /// Run the whole extract step for `run_date`.
    pub async fn run(&self, run_date: NaiveDate) -> Result<ExtractSummary> {
        let watermark = self.watermarks.last_extracted().await?;

        let token = self.client.refresh_token(self.refresh_token).await?;
        tracing::debug!(expires_at = token.expires_at, "Access token refreshed");
        if token.rotated(self.refresh_token) {
            tracing::warn!("Strava issued a new refresh token; update STRAVA_REFRESH_TOKEN");
        }
        let extraction =
            extract_activities(self.client, &token.access_token, watermark, &self.policy).await?;

        let rows: Vec<ActivityRow> = extraction.records.into_iter().map(|r| r.row).collect();
        let data = export_bytes(&rows)?;

        let key = export_key(run_date);
        let local_path = self.export.export_dir.join(&key);
        if let Some(parent) = local_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&local_path, &data).await?;
        tracing::info!(path = %local_path.display(), rows = rows.len(), "Export file written");

        self.storage.upload(&key, data).await?;

        // Only advance once the file is safely in object storage.
        let now = Utc::now();
        self.watermarks.record_extraction(now).await?;

        Ok(ExtractSummary {
            rows: rows.len(),
            uri: self.storage.uri(&key),
            key,
            watermark: now,
        })
    }
}

// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Strava API client for the weekly extraction.
//!
//! Handles:
//! - Access token refresh from a long-lived refresh token
//! - Single-activity page fetches from the athlete activity list
//! - Rate limit detection (429 or a page without `start_date`)

use crate::config::StravaConfig;
use crate::error::{FetchError, PipelineError};
use crate::models::activity::START_DATE_FIELD;
use serde::Deserialize;
use serde_json::Value;

/// Strava API client.
#[derive(Clone)]
pub struct StravaClient {
    http: reqwest::Client,
    base_url: String,
    auth_url: String,
    client_id: String,
    client_secret: String,
}

impl StravaClient {
    /// Create a new Strava client from the OAuth configuration.
    pub fn new(config: &StravaConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: config.api_url.trim_end_matches('/').to_string(),
            auth_url: config.auth_url.clone(),
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
        }
    }

    /// Exchange the refresh token for a short-lived access token.
    pub async fn refresh_token(
        &self,
        refresh_token: &str,
    ) -> Result<TokenRefreshResponse, PipelineError> {
        let response = self
            .http
            .post(&self.auth_url)
            .form(&[
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("refresh_token", refresh_token),
                ("grant_type", "refresh_token"),
                ("f", "json"),
            ])
            .send()
            .await
            .map_err(|e| PipelineError::StravaApi(format!("Token refresh request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "Strava token refresh failed");
            return Err(PipelineError::StravaApi(format!(
                "Token refresh failed with status {}",
                status
            )));
        }

        response
            .json()
            .await
            .map_err(|e| PipelineError::StravaApi(format!("Failed to parse token response: {}", e)))
    }

    /// Fetch the activity at position `page` of the athlete's activity list
    /// (one activity per page, newest first).
    pub async fn get_activity_page(
        &self,
        access_token: &str,
        page: u32,
    ) -> Result<Value, FetchError> {
        let url = format!("{}/athlete/activities", self.base_url);

        let response = self
            .http
            .get(&url)
            .bearer_auth(access_token)
            .query(&[("per_page", "1".to_string()), ("page", page.to_string())])
            .send()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        let status = response.status();
        if status.as_u16() == 429 {
            tracing::warn!(page, "Strava rate limit hit (429)");
            return Err(FetchError::RateLimited);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::Transport(format!("HTTP {}: {}", status, body)));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| FetchError::Transport(format!("JSON parse error: {}", e)))?;

        first_activity(body)
    }
}

/// Pull the single activity out of a list response.
///
/// An empty list, or an object where the list should be, carries no
/// `start_date` and is reported as a missing field.
fn first_activity(body: Value) -> Result<Value, FetchError> {
    let activity = match body {
        Value::Array(mut items) if !items.is_empty() => items.swap_remove(0),
        _ => return Err(FetchError::MissingField(START_DATE_FIELD)),
    };

    if activity.get(START_DATE_FIELD).is_some_and(Value::is_string) {
        Ok(activity)
    } else {
        Err(FetchError::MissingField(START_DATE_FIELD))
    }
}

/// Token refresh response from Strava.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenRefreshResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: i64,
}

impl TokenRefreshResponse {
    /// Whether Strava issued a refresh token other than `configured`.
    ///
    /// The old token stops working once a new one is issued, so the
    /// configured value has to be updated before the next run.
    pub fn rotated(&self, configured: &str) -> bool {
        self.refresh_token != configured
    }
}

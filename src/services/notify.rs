// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Slack notifications for validation results.
//!
//! Delivery is best effort: failures are logged and never returned.

use crate::config::NotifyConfig;
use serde::Serialize;

/// Incoming-webhook payload.
#[derive(Debug, Serialize)]
struct SlackMessage<'a> {
    text: &'a str,
}

/// Posts plain-text messages to a Slack incoming webhook.
#[derive(Clone)]
pub struct SlackNotifier {
    http: reqwest::Client,
    webhook_url: Option<String>,
}

impl SlackNotifier {
    pub fn new(config: &NotifyConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            webhook_url: config.webhook_url.clone(),
        }
    }

    /// Send `text`. Returns whether Slack accepted it.
    pub async fn send(&self, text: &str) -> bool {
        let Some(url) = self.webhook_url.as_deref() else {
            tracing::info!("No Slack webhook configured, skipping notification");
            return false;
        };

        match self
            .http
            .post(url)
            .json(&SlackMessage { text })
            .send()
            .await
        {
            Ok(response) if response.status().as_u16() == 200 => {
                tracing::debug!("Slack notification sent");
                true
            }
            Ok(response) => {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                tracing::warn!(status = %status, body = %body, "Slack rejected notification");
                false
            }
            Err(e) => {
                tracing::warn!(error = %e, "Error sending Slack notification");
                false
            }
        }
    }
}

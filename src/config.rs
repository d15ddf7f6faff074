// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Pipeline configuration loaded from environment variables.
//!
//! Every step loads only the sections it needs. Each section reads its keys
//! through a lookup function, so `from_env()` is a thin wrapper and tests can
//! pass a map instead of touching the process environment.

use std::env;
use std::path::PathBuf;

/// Default production table for merged activities.
pub const DEFAULT_TABLE_NAME: &str = "public.strava_activity_data";

/// Load a `.env` file if present. Call once at process start.
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn process_env(key: &str) -> Option<String> {
    env::var(key).ok()
}

fn required(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
) -> Result<String, ConfigError> {
    lookup(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or(ConfigError::Missing(key))
}

fn optional(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<String> {
    lookup(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn port(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: u16,
) -> Result<u16, ConfigError> {
    match optional(lookup, key) {
        Some(v) => v.parse().map_err(|_| ConfigError::Invalid(key, v)),
        None => Ok(default),
    }
}

/// MySQL metadata store holding the extraction watermark.
#[derive(Debug, Clone)]
pub struct MetadataStoreConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub database: String,
}

impl MetadataStoreConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(process_env)
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        Ok(Self {
            host: required(&lookup, "MYSQL_HOST")?,
            port: port(&lookup, "MYSQL_PORT", 3306)?,
            username: required(&lookup, "MYSQL_USER")?,
            password: required(&lookup, "MYSQL_PASSWORD")?,
            database: required(&lookup, "MYSQL_DATABASE")?,
        })
    }
}

/// Redshift warehouse connection plus the settings the load steps need.
#[derive(Debug, Clone)]
pub struct WarehouseConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub database: String,
    /// Production table that staging is merged into
    pub table_name: String,
    /// IAM role name Redshift assumes to read from S3
    pub iam_role: Option<String>,
    /// AWS account owning the IAM role
    pub account_id: Option<String>,
}

impl WarehouseConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(process_env)
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        Ok(Self {
            host: required(&lookup, "REDSHIFT_HOST")?,
            port: port(&lookup, "REDSHIFT_PORT", 5439)?,
            username: required(&lookup, "REDSHIFT_USER")?,
            password: required(&lookup, "REDSHIFT_PASSWORD")?,
            database: required(&lookup, "REDSHIFT_DATABASE")?,
            table_name: optional(&lookup, "REDSHIFT_TABLE")
                .unwrap_or_else(|| DEFAULT_TABLE_NAME.to_string()),
            iam_role: optional(&lookup, "REDSHIFT_IAM_ROLE"),
            account_id: optional(&lookup, "AWS_ACCOUNT_ID"),
        })
    }

    /// ARN of the role used by `COPY`.
    ///
    /// Only the stage step needs it, so the keys are checked here rather
    /// than at load time.
    pub fn role_arn(&self) -> Result<String, ConfigError> {
        let account_id = self
            .account_id
            .as_deref()
            .ok_or(ConfigError::Missing("AWS_ACCOUNT_ID"))?;
        let iam_role = self
            .iam_role
            .as_deref()
            .ok_or(ConfigError::Missing("REDSHIFT_IAM_ROLE"))?;
        Ok(format!("arn:aws:iam::{}:role/{}", account_id, iam_role))
    }
}

/// S3 bucket and credentials for the export file.
#[derive(Debug, Clone)]
pub struct ObjectStoreConfig {
    pub access_key: String,
    pub secret_key: String,
    pub bucket: String,
    pub region: String,
    /// Custom endpoint (MinIO, localstack)
    pub endpoint: Option<String>,
}

impl ObjectStoreConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(process_env)
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        Ok(Self {
            access_key: required(&lookup, "AWS_ACCESS_KEY_ID")?,
            secret_key: required(&lookup, "AWS_SECRET_ACCESS_KEY")?,
            bucket: required(&lookup, "S3_BUCKET")?,
            region: optional(&lookup, "AWS_REGION").unwrap_or_else(|| "us-east-1".to_string()),
            endpoint: optional(&lookup, "S3_ENDPOINT"),
        })
    }
}

/// Strava OAuth client used for the refresh-token grant.
#[derive(Debug, Clone)]
pub struct StravaConfig {
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
    pub auth_url: String,
    pub api_url: String,
}

impl StravaConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(process_env)
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        Ok(Self {
            client_id: required(&lookup, "STRAVA_CLIENT_ID")?,
            client_secret: required(&lookup, "STRAVA_CLIENT_SECRET")?,
            refresh_token: required(&lookup, "STRAVA_REFRESH_TOKEN")?,
            auth_url: optional(&lookup, "STRAVA_AUTH_URL")
                .unwrap_or_else(|| "https://www.strava.com/oauth/token".to_string()),
            api_url: optional(&lookup, "STRAVA_API_URL")
                .unwrap_or_else(|| "https://www.strava.com/api/v3".to_string()),
        })
    }
}

/// Chat webhook for validation results.
#[derive(Debug, Clone, Default)]
pub struct NotifyConfig {
    pub webhook_url: Option<String>,
}

impl NotifyConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(process_env)
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            webhook_url: optional(&lookup, "SLACK_WEBHOOK_URL"),
        }
    }
}

/// Where the extractor writes its local copy of the export file.
#[derive(Debug, Clone)]
pub struct ExportConfig {
    pub export_dir: PathBuf,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            export_dir: PathBuf::from("."),
        }
    }
}

impl ExportConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(process_env)
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        optional(&lookup, "EXPORT_DIR")
            .map(|dir| Self {
                export_dir: PathBuf::from(dir),
            })
            .unwrap_or_default()
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {0}: {1}")]
    Invalid(&'static str, String),
}

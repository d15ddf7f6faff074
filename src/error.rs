// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Pipeline error types.

use crate::config::ConfigError;

/// Error type shared by every pipeline step.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Strava API error: {0}")]
    StravaApi(String),

    #[error("Strava rate limit still exhausted on page {page}")]
    RateLimited { page: u32 },

    #[error("Warehouse error: {0}")]
    Warehouse(String),

    #[error("Metadata store error: {0}")]
    Metadata(String),

    #[error("Object storage error: {0}")]
    Storage(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Export file error: {0}")]
    Export(#[from] csv::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl PipelineError {
    /// True for failures of the warehouse connection or its statements.
    pub fn is_warehouse_error(&self) -> bool {
        matches!(self, PipelineError::Warehouse(_))
    }
}

/// Outcome of fetching a single activity page from the Strava API.
///
/// Each variant maps to its own policy in the extractor: back off and retry,
/// substitute null (or stop, for the watermark key), or abort the run.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FetchError {
    #[error("rate limit exhausted")]
    RateLimited,

    #[error("response is missing field `{0}`")]
    MissingField(&'static str),

    #[error("transport error: {0}")]
    Transport(String),
}

impl From<FetchError> for PipelineError {
    fn from(err: FetchError) -> Self {
        PipelineError::StravaApi(err.to_string())
    }
}

/// Result type alias for pipeline steps.
pub type Result<T> = std::result::Result<T, PipelineError>;

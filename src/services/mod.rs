// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - one submodule per pipeline step plus its clients.

pub mod export;
pub mod extract;
pub mod merge;
pub mod model;
pub mod notify;
pub mod staging;
pub mod storage;
pub mod strava;
pub mod validator;

pub use extract::{extract_activities, ExtractJob, RateLimitPolicy};
pub use merge::merge_staging;
pub use model::build_data_model;
pub use notify::SlackNotifier;
pub use staging::load_staging;
pub use storage::{ObjectStore, S3Storage};
pub use strava::StravaClient;
pub use validator::{compare, execute_test, Operator, Severity, ValidationCheck};

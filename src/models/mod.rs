// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the pipeline.

pub mod activity;
pub mod scalar;

pub use activity::{ActivityRecord, ActivityRow, EXPORT_COLUMNS, EXTRACT_COLUMNS};
pub use scalar::Scalar;

// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for date/time formatting.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};

/// Watermark used when no extraction has been recorded yet.
pub fn watermark_floor() -> DateTime<Utc> {
    NaiveDate::from_ymd_opt(1900, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// Format a UTC timestamp as RFC3339 using a `Z` suffix.
pub fn format_utc_rfc3339(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Parse a Strava timestamp (`2024-03-03T07:15:00Z`).
pub fn parse_strava_timestamp(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Date component of export file names (`2024_03_04`).
pub fn export_date_key(date: NaiveDate) -> String {
    date.format("%Y_%m_%d").to_string()
}

/// Convert a naive metadata-store datetime (stored as UTC) to `DateTime<Utc>`.
pub fn naive_as_utc(value: NaiveDateTime) -> DateTime<Utc> {
    value.and_utc()
}

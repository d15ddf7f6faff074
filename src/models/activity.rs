// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Strava activity rows as extracted from the API and written to the export file.

use chrono::{DateTime, Utc};
use serde_json::Value;

/// Fields read from each API response, in extraction order.
pub const EXTRACT_COLUMNS: [&str; 24] = [
    "id",
    "name",
    "distance",
    "moving_time",
    "elapsed_time",
    "total_elevation_gain",
    "type",
    "workout_type",
    "start_date",
    "timezone",
    "location_country",
    "achievement_count",
    "kudos_count",
    "comment_count",
    "athlete_count",
    "start_latlng",
    "end_latlng",
    "average_speed",
    "max_speed",
    "average_cadence",
    "average_temp",
    "average_heartrate",
    "max_heartrate",
    "suffer_score",
];

/// Columns of the export file and of the warehouse tables, in order.
///
/// Coordinate pairs are split into two columns each.
pub const EXPORT_COLUMNS: [&str; 26] = [
    "id",
    "name",
    "distance",
    "moving_time",
    "elapsed_time",
    "total_elevation_gain",
    "type",
    "workout_type",
    "start_date",
    "timezone",
    "location_country",
    "achievement_count",
    "kudos_count",
    "comment_count",
    "athlete_count",
    "start_lat",
    "start_lng",
    "end_lat",
    "end_lng",
    "average_speed",
    "max_speed",
    "average_cadence",
    "average_temp",
    "average_heartrate",
    "max_heartrate",
    "suffer_score",
];

/// Key whose value bounds the extraction.
pub const START_DATE_FIELD: &str = "start_date";

/// One normalized export row. Always `EXPORT_COLUMNS.len()` wide; `None` is null.
#[derive(Debug, Clone, PartialEq)]
pub struct ActivityRow {
    values: Vec<Option<String>>,
}

impl ActivityRow {
    /// Normalize a single activity object from the API.
    ///
    /// Missing keys and JSON nulls both become null; the row is never short.
    pub fn from_response(response: &Value) -> Self {
        let mut values = Vec::with_capacity(EXPORT_COLUMNS.len());

        for column in EXTRACT_COLUMNS {
            let field = response.get(column);
            match column {
                "start_latlng" | "end_latlng" => {
                    let (lat, lng) = split_coordinate(field);
                    values.push(lat);
                    values.push(lng);
                }
                "timezone" => {
                    values.push(field.and_then(render_value).map(|tz| clean_timezone(&tz)));
                }
                _ => values.push(field.and_then(render_value)),
            }
        }

        Self { values }
    }

    /// Build a row from already-rendered values (e.g. a parsed export line).
    ///
    /// Returns `None` if the value count does not match the export layout.
    pub fn from_values(values: Vec<Option<String>>) -> Option<Self> {
        (values.len() == EXPORT_COLUMNS.len()).then_some(Self { values })
    }

    pub fn values(&self) -> &[Option<String>] {
        &self.values
    }

    /// Value of a named export column.
    pub fn get(&self, column: &str) -> Option<&str> {
        let idx = EXPORT_COLUMNS.iter().position(|c| *c == column)?;
        self.values[idx].as_deref()
    }

    /// Activity ID, if present and numeric.
    pub fn id(&self) -> Option<u64> {
        self.get("id").and_then(|v| v.parse().ok())
    }
}

/// An extracted activity with its parsed start time.
#[derive(Debug, Clone, PartialEq)]
pub struct ActivityRecord {
    pub start_date: DateTime<Utc>,
    pub row: ActivityRow,
}

/// Render a JSON value as an export field.
fn render_value(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        other => Some(other.to_string()),
    }
}

/// Split a `[lat, lng]` pair into two columns. Any other shape gives two nulls.
pub fn split_coordinate(value: Option<&Value>) -> (Option<String>, Option<String>) {
    match value.and_then(Value::as_array).map(Vec::as_slice) {
        Some([lat, lng]) => (render_value(lat), render_value(lng)),
        _ => (None, None),
    }
}

/// Strip the descriptive offset segment from a Strava timezone label.
///
/// `"(GMT-08:00) America/Los_Angeles"` becomes `"America/Los_Angeles"`: the
/// parenthesized (or bracketed) segment is removed, then the first character
/// of what remains.
pub fn clean_timezone(raw: &str) -> String {
    let stripped = strip_segment(raw, '(', ')')
        .or_else(|| strip_segment(raw, '[', ']'))
        .unwrap_or_else(|| raw.to_string());
    stripped.chars().skip(1).collect()
}

fn strip_segment(raw: &str, open: char, close: char) -> Option<String> {
    let start = raw.find(open)?;
    let end = start + raw[start..].find(close)?;
    let mut out = String::with_capacity(raw.len());
    out.push_str(&raw[..start]);
    out.push_str(&raw[end + close.len_utf8()..]);
    Some(out)
}

// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Pipe-delimited export file written by the extractor and loaded by `COPY`.
//!
//! No header row; nulls are empty fields. Column order is `EXPORT_COLUMNS`.

use crate::models::{ActivityRow, EXPORT_COLUMNS};
use crate::time_utils::export_date_key;
use chrono::NaiveDate;
use std::io::{Read, Write};

/// Field delimiter, also the Redshift `COPY` default.
pub const EXPORT_DELIMITER: u8 = b'|';

/// Prefix shared by every export object.
pub const EXPORT_PREFIX: &str = "strava_data";

/// Object key (and relative local path) of the export for a run date.
pub fn export_key(date: NaiveDate) -> String {
    format!("{}/{}_export_file.csv", EXPORT_PREFIX, export_date_key(date))
}

/// Write rows to `writer`.
pub fn write_export<W: Write>(rows: &[ActivityRow], writer: W) -> Result<(), csv::Error> {
    let mut csv_writer = csv::WriterBuilder::new()
        .delimiter(EXPORT_DELIMITER)
        .has_headers(false)
        .from_writer(writer);

    for row in rows {
        csv_writer.write_record(row.values().iter().map(|v| v.as_deref().unwrap_or("")))?;
    }

    csv_writer.flush()?;
    Ok(())
}

/// Serialize rows into an in-memory buffer.
pub fn export_bytes(rows: &[ActivityRow]) -> Result<Vec<u8>, csv::Error> {
    let mut buf = Vec::new();
    write_export(rows, &mut buf)?;
    Ok(buf)
}

/// Parse an export file back into rows.
///
/// Every line must have exactly `EXPORT_COLUMNS.len()` fields.
pub fn read_export<R: Read>(reader: R) -> Result<Vec<ActivityRow>, csv::Error> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .delimiter(EXPORT_DELIMITER)
        .has_headers(false)
        .from_reader(reader);

    let mut rows = Vec::new();
    for record in csv_reader.records() {
        let record = record?;
        let values = record
            .iter()
            .map(|field| (!field.is_empty()).then(|| field.to_string()))
            .collect();

        // A short or long line is a malformed file, same as for `COPY`.
        match ActivityRow::from_values(values) {
            Some(row) => rows.push(row),
            None => {
                return Err(csv::Error::from(std::io::Error::new(
                    std::io::ErrorKind::InvalidData,
                    format!(
                        "expected {} fields, found {}",
                        EXPORT_COLUMNS.len(),
                        record.len()
                    ),
                )))
            }
        }
    }

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_export_key() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap();
        assert_eq!(export_key(date), "strava_data/2024_03_04_export_file.csv");
    }

    #[test]
    fn test_nulls_are_empty_fields() {
        let row = ActivityRow::from_response(&json!({ "id": 7, "name": "Lunch Run" }));
        let bytes = export_bytes(&[row]).unwrap();
        let line = String::from_utf8(bytes).unwrap();

        assert!(line.starts_with("7|Lunch Run|"));
        assert_eq!(line.trim_end().split('|').count(), EXPORT_COLUMNS.len());
    }

    #[test]
    fn test_round_trip_preserves_values() {
        let rows = vec![
            ActivityRow::from_response(&json!({
                "id": 11,
                "name": "Hill repeats",
                "distance": 8046.7,
                "type": "Run",
                "start_date": "2024-03-02T14:00:00Z",
                "timezone": "(GMT-08:00) America/Los_Angeles",
                "start_latlng": [37.33, -122.05],
                "end_latlng": [],
                "kudos_count": 3
            })),
            ActivityRow::from_response(&json!({
                "id": 12,
                "name": "Pipe | in name",
                "start_date": "2024-03-01T14:00:00Z"
            })),
        ];

        let bytes = export_bytes(&rows).unwrap();
        let parsed = read_export(bytes.as_slice()).unwrap();

        assert_eq!(parsed, rows);
        assert_eq!(parsed[1].get("name"), Some("Pipe | in name"));
    }

    #[test]
    fn test_read_rejects_short_line() {
        let err = read_export("1|2|3\n".as_bytes());
        assert!(err.is_err());
    }
}

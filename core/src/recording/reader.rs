use crate::prelude::LogReadError;
use crate::recording::row::{HEADER, TIMESTAMP_FORMAT};
use crate::signal::samples::GyroSample;
use chrono::NaiveDateTime;
use csv::{ReaderBuilder, StringRecord};
use serde::Serialize;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// A row read back from a session log.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoggedRow {
    /// Timestamp text with any legacy trailing quote removed.
    pub timestamp: String,
    pub speed_kph: f32,
    pub delta: f32,
    pub gyro: GyroSample,
    pub record: String,
}

impl LoggedRow {
    /// Wall-clock time of the row, or `None` if the column is not in the
    /// session log layout.
    pub fn recorded_at(&self) -> Option<NaiveDateTime> {
        NaiveDateTime::parse_from_str(&self.timestamp, TIMESTAMP_FORMAT).ok()
    }
}

fn parse_number(
    record: &StringRecord,
    index: usize,
    field: &'static str,
    line: u64,
) -> Result<f32, LogReadError> {
    let raw = record.get(index).unwrap_or_default().trim();
    raw.parse::<f32>().map_err(|_| LogReadError::InvalidField {
        line,
        field,
        value: raw.to_string(),
    })
}

/// Parses a session log. The legacy quote after the timestamp is accepted.
pub fn parse_log<R: Read>(reader: R) -> Result<Vec<LoggedRow>, LogReadError> {
    let mut csv_reader = ReaderBuilder::new()
        .has_headers(true)
        .quoting(false)
        .flexible(true)
        .from_reader(reader);

    let headers = csv_reader.headers()?.clone();
    let expected: Vec<&str> = HEADER.split(',').collect();
    if headers.iter().map(str::trim).collect::<Vec<_>>() != expected {
        return Err(LogReadError::UnexpectedHeader(
            headers.iter().collect::<Vec<_>>().join(","),
        ));
    }

    let mut rows = Vec::new();
    for result in csv_reader.records() {
        let record = result?;
        let line = record.position().map(|pos| pos.line()).unwrap_or_default();
        if record.iter().all(|field| field.trim().is_empty()) {
            continue;
        }

        rows.push(LoggedRow {
            timestamp: record
                .get(0)
                .unwrap_or_default()
                .trim_end_matches('"')
                .to_string(),
            speed_kph: parse_number(&record, 1, "Speed", line)?,
            delta: parse_number(&record, 2, "Delta", line)?,
            gyro: GyroSample::new(
                parse_number(&record, 3, "GyroX", line)?,
                parse_number(&record, 4, "GyroY", line)?,
                parse_number(&record, 5, "GyroZ", line)?,
            ),
            record: record.get(6).unwrap_or_default().to_string(),
        });
    }
    Ok(rows)
}

pub fn read_log<P: AsRef<Path>>(path: P) -> Result<Vec<LoggedRow>, LogReadError> {
    let file = File::open(path.as_ref()).map_err(csv::Error::from)?;
    parse_log(file)
}

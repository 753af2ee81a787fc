use crate::prelude::TimestampStyle;
use crate::signal::samples::GyroSample;
use chrono::NaiveDateTime;
use serde::Serialize;

/// Header written once at the top of every session log.
pub const HEADER: &str = "Timestamp,Speed,Delta,GyroX,GyroY,GyroZ,Record";

/// chrono layout of the Timestamp column, without the legacy quote.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S %3f";

/// Renders `yyyy-MM-dd HH:mm:ss SSS`, with the legacy trailing quote when asked.
pub fn format_timestamp(at: &NaiveDateTime, style: TimestampStyle) -> String {
    let mut formatted = at.format(TIMESTAMP_FORMAT).to_string();
    if style == TimestampStyle::Legacy {
        formatted.push('"');
    }
    formatted
}

/// Makes free text safe for the Record column: commas and line breaks become
/// spaces, so a row always holds exactly one line of seven fields.
pub fn sanitize_record(text: &str) -> String {
    text.chars()
        .map(|c| if matches!(c, ',' | '\r' | '\n') { ' ' } else { c })
        .collect()
}

/// Latest known values read by a recording tick.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RecordInputs {
    pub speed_kph: f32,
    pub delta: f32,
    pub gyro: GyroSample,
}

/// One sampled row of a session log.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordRow {
    pub timestamp: String,
    pub speed_kph: f32,
    pub delta: f32,
    pub gyro: GyroSample,
    pub record: String,
}

impl RecordRow {
    /// Numbers use two fixed decimals, rounded to nearest on the exact binary
    /// value and independent of the host locale.
    pub fn to_line(&self) -> String {
        format!(
            "{},{:.2},{:.2},{:.2},{:.2},{:.2},{}",
            self.timestamp,
            self.speed_kph,
            self.delta,
            self.gyro.x,
            self.gyro.y,
            self.gyro.z,
            sanitize_record(&self.record)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn sample_time() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 7, 3)
            .unwrap()
            .and_hms_milli_opt(9, 5, 7, 42)
            .unwrap()
    }

    fn row(speed_kph: f32) -> RecordRow {
        RecordRow {
            timestamp: "t".into(),
            speed_kph,
            delta: -1.5,
            gyro: GyroSample::new(0.01, 0.02, -0.03),
            record: "V".into(),
        }
    }

    #[test]
    fn legacy_timestamp_keeps_trailing_quote() {
        assert_eq!(
            format_timestamp(&sample_time(), TimestampStyle::Legacy),
            "2024-07-03 09:05:07 042\""
        );
        assert_eq!(
            format_timestamp(&sample_time(), TimestampStyle::Clean),
            "2024-07-03 09:05:07 042"
        );
    }

    #[test]
    fn row_uses_two_decimal_fields() {
        assert_eq!(row(12.34).to_line(), "t,12.34,-1.50,0.01,0.02,-0.03,V");
    }

    #[test]
    fn record_text_cannot_split_the_row() {
        let mut annotated = row(1.0);
        annotated.record = "left, then\r\nright".into();
        let line = annotated.to_line();
        assert_eq!(line.lines().count(), 1);
        assert_eq!(line.split(',').count(), 7);
        assert!(line.ends_with(",left  then  right"));
    }

    #[test]
    fn half_hundredth_rounds_on_binary_value() {
        // 20.005 is stored just below the midpoint.
        assert_eq!(row(20.005).to_line(), "t,20.00,-1.50,0.01,0.02,-0.03,V");
        assert_eq!(row(20.006).to_line(), "t,20.01,-1.50,0.01,0.02,-0.03,V");
    }
}

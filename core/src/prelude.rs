use chrono::NaiveDateTime;
use ndarray::{Array2, ArrayView3};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// How the timestamp column of a session log is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimestampStyle {
    /// `yyyy-MM-dd HH:mm:ss SSS"`, byte-compatible with existing logs.
    Legacy,
    /// Same layout without the trailing quote.
    Clean,
}

/// What the pipeline shows when the classifier cannot produce a verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackPolicy {
    /// Keep the last verdict on display.
    KeepPrevious,
    /// Clear the verdict until the classifier succeeds again.
    Withhold,
}

/// Shared configuration for every pipeline component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub window_len: usize,
    pub abnormal_threshold: f32,
    pub record_interval_ms: u64,
    pub placeholder_marker: String,
    pub timestamp_style: TimestampStyle,
    pub fallback: FallbackPolicy,
    pub output_dir: PathBuf,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            window_len: 10,
            abnormal_threshold: 0.66,
            record_interval_ms: 1000,
            placeholder_marker: "V".to_string(),
            timestamp_style: TimestampStyle::Legacy,
            fallback: FallbackPolicy::Withhold,
            output_dir: PathBuf::from("."),
        }
    }
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.window_len == 0 {
            return Err(ConfigError::Invalid("window_len must be at least 1".into()));
        }
        if self.record_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "record_interval_ms must be at least 1".into(),
            ));
        }
        if !self.abnormal_threshold.is_finite() {
            return Err(ConfigError::Invalid(
                "abnormal_threshold must be finite".into(),
            ));
        }
        Ok(())
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Persistence failures of a session log.
#[derive(thiserror::Error, Debug)]
pub enum SinkError {
    #[error("cannot open sink: {0}")]
    Open(String),
    #[error("cannot write row: {0}")]
    Write(String),
    #[error("cannot close sink: {0}")]
    Close(String),
}

#[derive(thiserror::Error, Debug)]
pub enum ClassifierError {
    #[error("classifier model is not loaded")]
    ModelUnavailable,
    #[error("invalid input shape: expected {expected} samples, got {actual}")]
    InvalidInputShape { expected: usize, actual: usize },
    #[error("scorer failure: {0}")]
    Scorer(String),
}

#[derive(thiserror::Error, Debug)]
pub enum RecordingError {
    #[error("a recording session is already active")]
    AlreadyRecording,
    #[error(transparent)]
    Sink(#[from] SinkError),
}

#[derive(thiserror::Error, Debug)]
pub enum LogReadError {
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("unexpected header: {0}")]
    UnexpectedHeader(String),
    #[error("line {line}: field {field} has invalid value {value:?}")]
    InvalidField {
        line: u64,
        field: &'static str,
        value: String,
    },
}

/// Errors surfaced by the asynchronous pipeline handle.
#[derive(thiserror::Error, Debug)]
pub enum PipelineError {
    #[error("pipeline event loop has stopped")]
    Closed,
    #[error(transparent)]
    Recording(#[from] RecordingError),
}

pub type PipelineResult<T> = Result<T, PipelineError>;

/// The pretrained sequence classifier, seen as an opaque numeric function.
///
/// Input is a `[1, N, 1]` tensor of acceleration samples, output is `[1, 1]`.
pub trait SequenceScorer: Send {
    fn input_len(&self) -> usize;
    fn run(&self, input: ArrayView3<'_, f32>) -> Result<Array2<f32>, ClassifierError>;
}

/// Line-oriented persistent log owned by a single recording session.
pub trait RecordSink: Send {
    fn write_line(&mut self, line: &str) -> Result<(), SinkError>;
    fn close(&mut self) -> Result<(), SinkError>;
}

/// Creates one sink per recording session.
pub trait SinkFactory: Send {
    fn open(&self, started_at: NaiveDateTime) -> Result<Box<dyn RecordSink>, SinkError>;
}

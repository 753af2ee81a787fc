//! Core telemetry pipeline for the drive-assistant platform.
//!
//! Location and gyroscope updates are turned into a fixed-unit acceleration
//! signal, windowed, classified as normal or abnormal driving, and sampled
//! on a fixed cadence into CSV session logs.

pub mod classifier;
pub mod pipeline;
pub mod prelude;
pub mod recording;
pub mod signal;
pub mod telemetry;

pub use pipeline::{PipelineHandle, PipelineSnapshot, PipelineState};
pub use prelude::{PipelineConfig, RecordSink, SequenceScorer, SinkFactory};

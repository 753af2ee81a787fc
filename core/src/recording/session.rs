use crate::prelude::{RecordSink, RecordingError, SinkError, SinkFactory, TimestampStyle};
use crate::recording::row::{format_timestamp, sanitize_record, RecordInputs, RecordRow, HEADER};
use chrono::NaiveDateTime;
use log::{info, warn};

/// One-shot annotation flag: consumed by exactly the next written row.
#[derive(Debug, Default, Clone)]
pub struct AnnotationLatch {
    pending: Option<String>,
}

impl AnnotationLatch {
    pub fn set(&mut self, text: impl Into<String>) {
        self.pending = Some(text.into());
    }

    pub fn take(&mut self) -> Option<String> {
        self.pending.take()
    }

    pub fn is_set(&self) -> bool {
        self.pending.is_some()
    }

    pub fn clear(&mut self) {
        self.pending = None;
    }
}

/// What a recording tick did.
#[derive(Debug)]
pub enum TickOutcome {
    /// No session is active.
    Idle,
    Written(RecordRow),
    /// The row was built but could not be persisted; the session continues.
    WriteFailed(RecordRow, SinkError),
}

/// Timer-driven `Idle -> Recording -> Idle` state machine owning the session sink.
pub struct RecordingSession {
    factory: Box<dyn SinkFactory>,
    sink: Option<Box<dyn RecordSink>>,
    latch: AnnotationLatch,
    placeholder: String,
    style: TimestampStyle,
    rows_written: usize,
}

impl RecordingSession {
    pub fn new(
        factory: Box<dyn SinkFactory>,
        placeholder: impl Into<String>,
        style: TimestampStyle,
    ) -> Self {
        Self {
            factory,
            sink: None,
            latch: AnnotationLatch::default(),
            placeholder: placeholder.into(),
            style,
            rows_written: 0,
        }
    }

    pub fn is_recording(&self) -> bool {
        self.sink.is_some()
    }

    /// Rows persisted by the current (or last) session.
    pub fn rows_written(&self) -> usize {
        self.rows_written
    }

    pub fn has_pending_annotation(&self) -> bool {
        self.latch.is_set()
    }

    /// Opens a sink and writes the header. A second start while recording is
    /// rejected, and an annotation made while idle is discarded.
    pub fn start(&mut self, now: NaiveDateTime) -> Result<(), RecordingError> {
        if self.is_recording() {
            return Err(RecordingError::AlreadyRecording);
        }
        self.latch.clear();

        let mut sink = self.factory.open(now)?;
        if let Err(err) = sink.write_line(HEADER) {
            let _ = sink.close();
            return Err(SinkError::Open(format!("writing header: {}", err)).into());
        }
        self.sink = Some(sink);
        self.rows_written = 0;
        info!("recording started at {}", now);
        Ok(())
    }

    pub fn annotate(&mut self, text: impl Into<String>) {
        self.latch.set(text);
    }

    /// Appends one row built from the latest known values.
    pub fn tick(&mut self, now: NaiveDateTime, inputs: RecordInputs) -> TickOutcome {
        let Some(sink) = self.sink.as_mut() else {
            return TickOutcome::Idle;
        };

        let record = self
            .latch
            .take()
            .map(|text| sanitize_record(&text))
            .unwrap_or_else(|| self.placeholder.clone());
        let row = RecordRow {
            timestamp: format_timestamp(&now, self.style),
            speed_kph: inputs.speed_kph,
            delta: inputs.delta,
            gyro: inputs.gyro,
            record,
        };

        match sink.write_line(&row.to_line()) {
            Ok(()) => {
                self.rows_written += 1;
                TickOutcome::Written(row)
            }
            Err(err) => {
                warn!("dropping recording row: {}", err);
                TickOutcome::WriteFailed(row, err)
            }
        }
    }

    /// Flushes and closes the sink. The session is idle afterwards even if
    /// closing fails; stopping an idle session does nothing.
    pub fn stop(&mut self) -> Result<(), RecordingError> {
        let Some(mut sink) = self.sink.take() else {
            return Ok(());
        };
        info!("recording stopped after {} rows", self.rows_written);
        sink.close().map_err(RecordingError::from)
    }
}

impl Drop for RecordingSession {
    fn drop(&mut self) {
        if let Err(err) = self.stop() {
            warn!("closing recording on teardown: {}", err);
        }
    }
}

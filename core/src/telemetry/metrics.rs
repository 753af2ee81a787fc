use serde::Serialize;
use std::sync::Mutex;

pub struct MetricsRecorder {
    inner: Mutex<MetricsSnapshot>,
}

/// Counters accumulated since the pipeline was created.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub samples: usize,
    pub out_of_order: usize,
    pub classifications: usize,
    pub classification_failures: usize,
    pub rows_written: usize,
    pub write_errors: usize,
}

impl MetricsRecorder {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(MetricsSnapshot::default()),
        }
    }

    fn update(&self, apply: impl FnOnce(&mut MetricsSnapshot)) {
        if let Ok(mut metrics) = self.inner.lock() {
            apply(&mut metrics);
        }
    }

    pub fn record_sample(&self) {
        self.update(|m| m.samples += 1);
    }

    pub fn record_out_of_order(&self) {
        self.update(|m| m.out_of_order += 1);
    }

    pub fn record_classification(&self) {
        self.update(|m| m.classifications += 1);
    }

    pub fn record_classification_failure(&self) {
        self.update(|m| m.classification_failures += 1);
    }

    pub fn record_row(&self) {
        self.update(|m| m.rows_written += 1);
    }

    pub fn record_write_error(&self) {
        self.update(|m| m.write_errors += 1);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        self.inner
            .lock()
            .map(|metrics| *metrics)
            .unwrap_or_default()
    }
}

impl Default for MetricsRecorder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_accumulate_independently() {
        let metrics = MetricsRecorder::new();
        metrics.record_sample();
        metrics.record_sample();
        metrics.record_classification();
        metrics.record_write_error();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.samples, 2);
        assert_eq!(snapshot.classifications, 1);
        assert_eq!(snapshot.write_errors, 1);
        assert_eq!(snapshot.rows_written, 0);
    }
}

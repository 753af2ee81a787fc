use crate::classifier::{ClassifierAdapter, Verdict};
use crate::prelude::{
    ClassifierError, ConfigError, FallbackPolicy, PipelineConfig, RecordingError, SinkFactory,
};
use crate::recording::{RecordInputs, RecordingSession, TickOutcome};
use crate::signal::{DerivedSignal, GyroSample, SlidingWindow, SpeedSample, SpeedTracker};
use crate::telemetry::{LogManager, MetricsRecorder, MetricsSnapshot};
use chrono::NaiveDateTime;
use serde::Serialize;

/// Consistent view of the pipeline handed to presentation.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PipelineSnapshot {
    pub speed_kph: f32,
    pub acceleration: f32,
    pub gyro: GyroSample,
    pub window_fill: usize,
    pub verdict: Option<Verdict>,
    pub last_score: Option<f32>,
    pub model_available: bool,
    pub recording: bool,
    pub rows_written: usize,
    pub annotation_pending: bool,
}

/// Result of feeding one location update.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationUpdate {
    pub signal: DerivedSignal,
    pub window_full: bool,
    /// Verdict produced by this update, if the classifier ran and succeeded.
    pub verdict: Option<Verdict>,
}

/// Single owner of all mutable pipeline state.
///
/// Every event source mutates it through `&mut self`, so callers serialise
/// access by construction; see [`crate::pipeline::runtime`] for the event loop.
pub struct PipelineState {
    config: PipelineConfig,
    tracker: SpeedTracker,
    window: SlidingWindow,
    classifier: ClassifierAdapter,
    session: RecordingSession,
    latest: RecordInputs,
    verdict: Option<Verdict>,
    last_score: Option<f32>,
    metrics: MetricsRecorder,
    logger: LogManager,
}

impl PipelineState {
    pub fn new(
        config: PipelineConfig,
        classifier: ClassifierAdapter,
        sinks: Box<dyn SinkFactory>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        if classifier.input_len() != config.window_len {
            return Err(ConfigError::Invalid(format!(
                "classifier expects {} samples but window holds {}",
                classifier.input_len(),
                config.window_len
            )));
        }

        let window = SlidingWindow::with_capacity(config.window_len)?;
        let session = RecordingSession::new(
            sinks,
            config.placeholder_marker.clone(),
            config.timestamp_style,
        );

        Ok(Self {
            config,
            tracker: SpeedTracker::new(),
            window,
            classifier,
            session,
            latest: RecordInputs::default(),
            verdict: None,
            last_score: None,
            metrics: MetricsRecorder::new(),
            logger: LogManager::new("drivecore::pipeline"),
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Derives speed and acceleration, slides the window and, once the window
    /// is full, classifies it. Every push into a full window re-classifies.
    pub fn on_location(&mut self, sample: SpeedSample) -> LocationUpdate {
        self.metrics.record_sample();
        if self.tracker.is_out_of_order(&sample) {
            self.metrics.record_out_of_order();
        }

        let signal = self.tracker.update(sample);
        self.latest.speed_kph = signal.speed_kph;
        self.latest.delta = signal.acceleration.value;

        let state = self.window.push(signal.acceleration);
        let verdict = if state.is_full {
            self.classify(&state.snapshot)
        } else {
            None
        };

        LocationUpdate {
            signal,
            window_full: state.is_full,
            verdict,
        }
    }

    fn classify(&mut self, window: &[f32]) -> Option<Verdict> {
        match self.classifier.score(window) {
            Ok(score) => {
                let verdict = crate::classifier::decide(score, self.classifier.threshold());
                self.metrics.record_classification();
                if self.verdict != Some(verdict) {
                    self.logger.record(&format!(
                        "verdict changed to {} (score {:.3})",
                        verdict.label(),
                        score
                    ));
                }
                self.verdict = Some(verdict);
                self.last_score = Some(score);
                Some(verdict)
            }
            Err(err) => {
                self.metrics.record_classification_failure();
                match err {
                    ClassifierError::InvalidInputShape { .. } => {
                        self.logger.error(&format!("classifier input mismatch: {}", err))
                    }
                    _ => self.logger.warn(&format!("classification skipped: {}", err)),
                }
                if self.config.fallback == FallbackPolicy::Withhold {
                    self.verdict = None;
                    self.last_score = None;
                }
                None
            }
        }
    }

    /// Stores the latest gyroscope reading; no time alignment is attempted.
    pub fn on_gyro(&mut self, sample: GyroSample) {
        self.latest.gyro = sample;
    }

    pub fn annotate(&mut self, text: impl Into<String>) {
        self.session.annotate(text);
    }

    pub fn start_recording(&mut self, now: NaiveDateTime) -> Result<(), RecordingError> {
        self.session.start(now)
    }

    pub fn stop_recording(&mut self) -> Result<(), RecordingError> {
        self.session.stop()
    }

    pub fn is_recording(&self) -> bool {
        self.session.is_recording()
    }

    /// Samples the latest known values into the session log.
    pub fn record_tick(&mut self, now: NaiveDateTime) -> TickOutcome {
        let outcome = self.session.tick(now, self.latest);
        match &outcome {
            TickOutcome::Written(_) => self.metrics.record_row(),
            TickOutcome::WriteFailed(..) => self.metrics.record_write_error(),
            TickOutcome::Idle => {}
        }
        outcome
    }

    pub fn classifier_mut(&mut self) -> &mut ClassifierAdapter {
        &mut self.classifier
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    pub fn snapshot(&self) -> PipelineSnapshot {
        PipelineSnapshot {
            speed_kph: self.latest.speed_kph,
            acceleration: self.latest.delta,
            gyro: self.latest.gyro,
            window_fill: self.window.len(),
            verdict: self.verdict,
            last_score: self.last_score,
            model_available: self.classifier.is_loaded(),
            recording: self.session.is_recording(),
            rows_written: self.session.rows_written(),
            annotation_pending: self.session.has_pending_annotation(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recording::session::tests::{at, MemorySinks};
    use ndarray::{Array2, ArrayView3};
    use std::sync::{Arc, Mutex};

    /// Scorer that records every window it is asked to score.
    #[derive(Clone)]
    struct ScriptedScorer {
        score: f32,
        calls: Arc<Mutex<Vec<Vec<f32>>>>,
    }

    impl crate::prelude::SequenceScorer for ScriptedScorer {
        fn input_len(&self) -> usize {
            10
        }

        fn run(&self, input: ArrayView3<'_, f32>) -> Result<Array2<f32>, ClassifierError> {
            self.calls
                .lock()
                .unwrap()
                .push(input.iter().copied().collect());
            Ok(Array2::from_elem((1, 1), self.score))
        }
    }

    fn pipeline(score: Option<f32>, sinks: &MemorySinks) -> (PipelineState, Arc<Mutex<Vec<Vec<f32>>>>) {
        let config = PipelineConfig::default();
        let calls = Arc::new(Mutex::new(Vec::new()));
        let mut classifier = ClassifierAdapter::new(config.window_len, config.abnormal_threshold);
        if let Some(score) = score {
            classifier
                .load(Box::new(ScriptedScorer {
                    score,
                    calls: calls.clone(),
                }))
                .unwrap();
        }
        let state = PipelineState::new(config, classifier, Box::new(sinks.clone())).unwrap();
        (state, calls)
    }

    /// Speeds (m/s) whose consecutive deltas are each 1 km/h.
    fn unit_steps(count: usize) -> Vec<SpeedSample> {
        (0..count)
            .map(|i| SpeedSample::new((i as f32 + 1.0) / 3.6, i as u64 * 1000))
            .collect()
    }

    #[test]
    fn full_window_is_classified_once_with_its_contents() {
        let sinks = MemorySinks::default();
        let (mut state, calls) = pipeline(Some(0.9), &sinks);
        state.start_recording(at(0)).unwrap();

        let mut verdicts = Vec::new();
        for sample in unit_steps(10) {
            verdicts.push(state.on_location(sample).verdict);
        }
        state.record_tick(at(1));

        assert!(verdicts[..9].iter().all(Option::is_none));
        assert_eq!(verdicts[9], Some(Verdict::Abnormal));
        let calls = calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        for value in &calls[0] {
            assert!((value - 1.0).abs() < 1e-4);
        }
        let lines = sinks.lines.lock().unwrap();
        assert_eq!(lines.len(), 2);
        assert!(lines[1].ends_with(",10.00,1.00,0.00,0.00,0.00,V"));
    }

    #[test]
    fn every_push_after_full_reclassifies() {
        let sinks = MemorySinks::default();
        let (mut state, calls) = pipeline(Some(0.1), &sinks);
        for sample in unit_steps(13) {
            state.on_location(sample);
        }
        assert_eq!(calls.lock().unwrap().len(), 4);
        assert_eq!(state.snapshot().verdict, Some(Verdict::Normal));
        assert_eq!(state.metrics().classifications, 4);
    }

    #[test]
    fn missing_model_withholds_verdict() {
        let sinks = MemorySinks::default();
        let (mut state, _) = pipeline(None, &sinks);
        for sample in unit_steps(12) {
            assert_eq!(state.on_location(sample).verdict, None);
        }
        let snapshot = state.snapshot();
        assert!(!snapshot.model_available);
        assert_eq!(snapshot.verdict, None);
        assert_eq!(state.metrics().classification_failures, 3);
    }

    #[test]
    fn keep_previous_policy_survives_model_unload() {
        let sinks = MemorySinks::default();
        let config = PipelineConfig {
            fallback: FallbackPolicy::KeepPrevious,
            ..Default::default()
        };
        let classifier = ClassifierAdapter::new(10, config.abnormal_threshold)
            .with_scorer(Box::new(crate::classifier::FixedScorer::new(10, 0.8)))
            .unwrap();
        let mut state = PipelineState::new(config, classifier, Box::new(sinks)).unwrap();
        for sample in unit_steps(10) {
            state.on_location(sample);
        }
        state.classifier_mut().unload();
        state.on_location(SpeedSample::new(5.0, 20_000));
        assert_eq!(state.snapshot().verdict, Some(Verdict::Abnormal));
    }

    #[test]
    fn mismatched_classifier_is_rejected() {
        let classifier = ClassifierAdapter::new(5, 0.66);
        let result = PipelineState::new(
            PipelineConfig::default(),
            classifier,
            Box::new(MemorySinks::default()),
        );
        assert!(result.is_err());
    }

    #[test]
    fn ticks_sample_last_known_values() {
        let sinks = MemorySinks::default();
        let (mut state, _) = pipeline(Some(0.1), &sinks);
        state.on_location(SpeedSample::new(10.0, 0));
        state.on_location(SpeedSample::new(12.0, 1000));
        state.on_gyro(GyroSample::new(0.01, 0.02, -0.03));

        state.start_recording(at(0)).unwrap();
        state.record_tick(at(1));
        state.record_tick(at(2));
        state.stop_recording().unwrap();

        let lines = sinks.lines.lock().unwrap().clone();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1], lines[2].replace("12:00:02", "12:00:01"));
        assert!(lines[1].ends_with(",43.20,7.20,0.01,0.02,-0.03,V"));
        assert_eq!(state.metrics().rows_written, 2);
    }

    #[test]
    fn annotation_marks_only_next_row() {
        let sinks = MemorySinks::default();
        let (mut state, _) = pipeline(Some(0.1), &sinks);
        state.start_recording(at(0)).unwrap();
        state.annotate("turn");
        assert!(state.snapshot().annotation_pending);
        state.record_tick(at(1));
        state.record_tick(at(2));
        assert_eq!(sinks.records(), vec!["turn", "V"]);
    }

    #[test]
    fn stop_twice_writes_no_trailing_row() {
        let sinks = MemorySinks::default();
        let (mut state, _) = pipeline(Some(0.1), &sinks);
        state.start_recording(at(0)).unwrap();
        state.record_tick(at(1));
        state.stop_recording().unwrap();
        assert!(state.stop_recording().is_ok());
        assert!(matches!(state.record_tick(at(2)), TickOutcome::Idle));
        assert_eq!(sinks.lines.lock().unwrap().len(), 2);
        assert_eq!(*sinks.closed.lock().unwrap(), 1);
    }

    #[test]
    fn zero_samples_leave_pipeline_idle() {
        let sinks = MemorySinks::default();
        let (mut state, _) = pipeline(Some(0.1), &sinks);
        state.start_recording(at(0)).unwrap();
        state.record_tick(at(1));
        let snapshot = state.snapshot();
        assert_eq!(snapshot.window_fill, 0);
        assert_eq!(snapshot.verdict, None);
        assert!(sinks.lines.lock().unwrap()[1].ends_with(",0.00,0.00,0.00,0.00,0.00,V"));
    }
}

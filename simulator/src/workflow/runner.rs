use crate::generator::Drive;
use crate::workflow::config::WorkflowConfig;
use anyhow::{Context, Result};
use chrono::{Duration, Local, NaiveDateTime};
use drivecore::classifier::{ClassifierAdapter, FixedScorer, LogisticScorer, Verdict};
use drivecore::recording::{CsvSinkFactory, TickOutcome};
use drivecore::telemetry::MetricsSnapshot;
use drivecore::{PipelineSnapshot, PipelineState};
use log::warn;

#[derive(Debug, Clone)]
pub struct WorkflowResult {
    pub updates: usize,
    pub normal: usize,
    pub abnormal: usize,
    pub rows_written: usize,
    pub final_snapshot: PipelineSnapshot,
    pub metrics: MetricsSnapshot,
}

#[derive(Clone)]
pub struct Runner {
    config: WorkflowConfig,
}

impl Runner {
    pub fn new(config: WorkflowConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &WorkflowConfig {
        &self.config
    }

    /// Builds the classifier from the configured model asset, falling back to
    /// a fixed score. With neither, the classifier stays unloaded.
    pub fn build_classifier(&self) -> Result<ClassifierAdapter> {
        let pipeline = &self.config.pipeline;
        let mut classifier =
            ClassifierAdapter::new(pipeline.window_len, pipeline.abnormal_threshold);

        if let Some(path) = &self.config.model {
            let scorer = LogisticScorer::load(path)
                .with_context(|| format!("loading model {}", path.display()))?;
            classifier
                .load(Box::new(scorer))
                .with_context(|| format!("installing model {}", path.display()))?;
        } else if let Some(score) = self.config.fixed_score {
            classifier
                .load(Box::new(FixedScorer::new(pipeline.window_len, score)))
                .context("installing fixed scorer")?;
        } else {
            warn!("no model configured, verdicts will be withheld");
        }
        Ok(classifier)
    }

    pub fn build_state(&self) -> Result<PipelineState> {
        let pipeline = self.config.to_pipeline_config();
        let sinks = CsvSinkFactory::new(pipeline.output_dir.clone());
        PipelineState::new(pipeline, self.build_classifier()?, Box::new(sinks))
            .context("building pipeline state")
    }

    /// Plays `drive` through a fresh pipeline on a simulated clock. When
    /// `record` is set, a session is sampled every `record_interval_ms` of
    /// drive time.
    pub fn execute(&self, drive: &Drive, record: bool) -> Result<WorkflowResult> {
        let mut state = self.build_state()?;
        let started_at: NaiveDateTime = Local::now().naive_local();
        let interval = state.config().record_interval_ms;

        if record {
            state
                .start_recording(started_at)
                .context("starting recording")?;
        }

        let mut next_tick_ms = 0u64;
        let mut normal = 0;
        let mut abnormal = 0;

        for (index, sample) in drive.speeds.iter().enumerate() {
            if let Some(gyro) = drive.gyro.get(index) {
                state.on_gyro(*gyro);
            }
            match state.on_location(*sample).verdict {
                Some(Verdict::Normal) => normal += 1,
                Some(Verdict::Abnormal) => abnormal += 1,
                None => {}
            }

            while record && next_tick_ms <= sample.timestamp_ms {
                let now = started_at + Duration::milliseconds(next_tick_ms as i64);
                if let TickOutcome::WriteFailed(_, err) = state.record_tick(now) {
                    warn!("simulated tick at {} ms: {}", next_tick_ms, err);
                }
                next_tick_ms += interval;
            }
        }

        let final_snapshot = state.snapshot();
        state.stop_recording().context("stopping recording")?;
        let metrics = state.metrics();

        Ok(WorkflowResult {
            updates: drive.len(),
            normal,
            abnormal,
            rows_written: metrics.rows_written,
            final_snapshot,
            metrics,
        })
    }
}

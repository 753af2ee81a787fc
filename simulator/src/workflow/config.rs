use crate::generator::profile::GeneratorConfig;
use anyhow::Context;
use drivecore::prelude::PipelineConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowConfig {
    pub pipeline: PipelineConfig,
    /// JSON weights asset for the logistic scorer.
    pub model: Option<PathBuf>,
    /// Constant score used when no model asset is configured.
    pub fixed_score: Option<f32>,
    pub generator: GeneratorConfig,
}

impl WorkflowConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .with_context(|| format!("reading workflow config {}", path_ref.display()))?;
        let config: WorkflowConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing workflow config {}", path_ref.display()))?;
        config
            .pipeline
            .validate()
            .with_context(|| format!("validating workflow config {}", path_ref.display()))?;
        Ok(config)
    }

    pub fn from_args(
        window_len: usize,
        threshold: f32,
        interval_ms: u64,
        output_dir: PathBuf,
    ) -> Self {
        Self {
            pipeline: PipelineConfig {
                window_len,
                abnormal_threshold: threshold,
                record_interval_ms: interval_ms,
                output_dir,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    pub fn to_pipeline_config(&self) -> PipelineConfig {
        self.pipeline.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use drivecore::prelude::TimestampStyle;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn config_from_args_produces_pipeline_config() {
        let cfg = WorkflowConfig::from_args(12, 0.7, 500, PathBuf::from("logs"));
        let pipeline = cfg.to_pipeline_config();
        assert_eq!(pipeline.window_len, 12);
        assert_eq!(pipeline.record_interval_ms, 500);
        assert_eq!(pipeline.placeholder_marker, "V");
    }

    #[test]
    fn config_load_reads_yaml() {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(
            b"pipeline:\n  window_len: 8\n  timestamp_style: clean\nfixed_score: 0.2\ngenerator:\n  samples: 30\n",
        )
        .unwrap();
        let path = temp.into_temp_path();
        let cfg = WorkflowConfig::load(&path).unwrap();
        assert_eq!(cfg.pipeline.window_len, 8);
        assert_eq!(cfg.pipeline.timestamp_style, TimestampStyle::Clean);
        assert_eq!(cfg.pipeline.abnormal_threshold, 0.66);
        assert_eq!(cfg.fixed_score, Some(0.2));
        assert_eq!(cfg.generator.samples, 30);
    }

    #[test]
    fn config_load_rejects_zero_window() {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(b"pipeline:\n  window_len: 0\n").unwrap();
        let path = temp.into_temp_path();
        assert!(WorkflowConfig::load(&path).is_err());
    }
}

use drivecore::PipelineSnapshot;
use serde::{Deserialize, Serialize};

/// Display-ready view of a pipeline snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct VisualizationModel {
    pub speed: String,
    pub acceleration: String,
    pub gyro: String,
    pub status: String,
    pub abnormal: bool,
    pub recording: bool,
    pub rows_written: usize,
}

impl From<&PipelineSnapshot> for VisualizationModel {
    fn from(snapshot: &PipelineSnapshot) -> Self {
        let status = match (snapshot.verdict, snapshot.model_available) {
            (Some(verdict), _) => verdict.label().to_string(),
            (None, false) => "model unavailable".to_string(),
            (None, true) => "collecting samples".to_string(),
        };
        Self {
            speed: format!("{:.1}", snapshot.speed_kph),
            acceleration: format!("{:.1}", snapshot.acceleration),
            gyro: format!(
                "X: {:5.2} Y: {:5.2} Z: {:5.2}",
                snapshot.gyro.x, snapshot.gyro.y, snapshot.gyro.z
            ),
            status,
            abnormal: snapshot.verdict == Some(drivecore::classifier::Verdict::Abnormal),
            recording: snapshot.recording,
            rows_written: snapshot.rows_written,
        }
    }
}

pub mod profile;
pub mod replay;

use drivecore::signal::{GyroSample, SpeedSample};

/// A drive as seen by the pipeline: location updates with the gyroscope
/// reading current at each of them.
#[derive(Debug, Clone, Default)]
pub struct Drive {
    pub speeds: Vec<SpeedSample>,
    pub gyro: Vec<GyroSample>,
}

impl Drive {
    pub fn len(&self) -> usize {
        self.speeds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.speeds.is_empty()
    }
}

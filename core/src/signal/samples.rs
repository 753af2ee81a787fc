use serde::{Deserialize, Serialize};

/// Conversion factor from m/s to km/h.
pub const MPS_TO_KPH: f32 = 3.6;

/// Speed reported by the location source.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpeedSample {
    pub speed_mps: f32,
    /// Monotonic milliseconds as stamped by the location source.
    pub timestamp_ms: u64,
}

impl SpeedSample {
    pub fn new(speed_mps: f32, timestamp_ms: u64) -> Self {
        Self {
            speed_mps,
            timestamp_ms,
        }
    }
}

/// Angular rate around the three device axes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct GyroSample {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl GyroSample {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

/// Speed delta between two consecutive location updates, in km/h.
///
/// This is a per-update delta, not a per-second acceleration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AccelerationSample {
    pub value: f32,
}

/// Values derived from a single location update.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DerivedSignal {
    pub speed_kph: f32,
    pub acceleration: AccelerationSample,
}

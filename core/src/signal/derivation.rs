use crate::signal::samples::{AccelerationSample, DerivedSignal, SpeedSample, MPS_TO_KPH};
use log::warn;

/// Derives speed and acceleration from the current update and its predecessor.
///
/// With no predecessor the baseline is 0 m/s, so the first acceleration equals
/// the first speed in km/h.
pub fn derive(previous: Option<&SpeedSample>, current: SpeedSample) -> (DerivedSignal, SpeedSample) {
    let baseline = previous.map(|sample| sample.speed_mps).unwrap_or(0.0);
    let signal = DerivedSignal {
        speed_kph: current.speed_mps * MPS_TO_KPH,
        acceleration: AccelerationSample {
            value: (current.speed_mps - baseline) * MPS_TO_KPH,
        },
    };
    (signal, current)
}

/// Owns the previous speed sample and applies [`derive`] in arrival order.
#[derive(Debug, Default)]
pub struct SpeedTracker {
    previous: Option<SpeedSample>,
}

impl SpeedTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when `sample` is stamped earlier than the previous update.
    pub fn is_out_of_order(&self, sample: &SpeedSample) -> bool {
        self.previous
            .map(|previous| sample.timestamp_ms < previous.timestamp_ms)
            .unwrap_or(false)
    }

    pub fn update(&mut self, current: SpeedSample) -> DerivedSignal {
        if let Some(previous) = self.previous.filter(|_| self.is_out_of_order(&current)) {
            warn!(
                "location update out of order: {} ms after {} ms, processing in arrival order",
                current.timestamp_ms, previous.timestamp_ms
            );
        }
        let (signal, previous) = derive(self.previous.as_ref(), current);
        self.previous = Some(previous);
        signal
    }

    pub fn previous(&self) -> Option<&SpeedSample> {
        self.previous.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: f32, expected: f32) {
        assert!(
            (actual - expected).abs() < 1e-4,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn derive_uses_previous_speed() {
        let previous = SpeedSample::new(10.0, 0);
        let (signal, next) = derive(Some(&previous), SpeedSample::new(12.0, 1000));
        assert_close(signal.acceleration.value, 7.2);
        assert_close(signal.speed_kph, 43.2);
        assert_eq!(next.timestamp_ms, 1000);
    }

    #[test]
    fn first_sample_uses_zero_baseline() {
        let (signal, _) = derive(None, SpeedSample::new(5.0, 0));
        assert_close(signal.acceleration.value, 18.0);
        assert_close(signal.speed_kph, 18.0);
    }

    #[test]
    fn tracker_keeps_previous_between_updates() {
        let mut tracker = SpeedTracker::new();
        tracker.update(SpeedSample::new(5.0, 0));
        let signal = tracker.update(SpeedSample::new(4.0, 500));
        assert_close(signal.acceleration.value, -3.6);
        assert_eq!(tracker.previous().map(|s| s.speed_mps), Some(4.0));
    }

    #[test]
    fn tracker_flags_and_still_processes_out_of_order_updates() {
        let mut tracker = SpeedTracker::new();
        tracker.update(SpeedSample::new(10.0, 2000));
        let late = SpeedSample::new(11.0, 1000);
        assert!(tracker.is_out_of_order(&late));
        let signal = tracker.update(late);
        assert_close(signal.acceleration.value, 3.6);
        assert_eq!(tracker.previous().map(|s| s.timestamp_ms), Some(1000));
    }
}

pub mod derivation;
pub mod samples;
pub mod window;

pub use derivation::{derive, SpeedTracker};
pub use samples::{AccelerationSample, DerivedSignal, GyroSample, SpeedSample, MPS_TO_KPH};
pub use window::{SlidingWindow, WindowState};

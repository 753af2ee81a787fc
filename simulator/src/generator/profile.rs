use crate::generator::Drive;
use anyhow::ensure;
use drivecore::signal::{GyroSample, SpeedSample, MPS_TO_KPH};
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Updates spent braking and recovering around each hard-braking event.
const BRAKE_UPDATES: usize = 3;
const RECOVERY_UPDATES: usize = 5;

/// Configuration for generating a synthetic drive.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub samples: usize,
    pub update_interval_ms: u64,
    pub cruise_kph: f32,
    pub jitter_kph: f32,
    pub hard_brakes: usize,
    pub brake_drop_kph: f32,
    pub gyro_noise: f32,
    pub seed: u64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            samples: 120,
            update_interval_ms: 1000,
            cruise_kph: 60.0,
            jitter_kph: 1.5,
            hard_brakes: 2,
            brake_drop_kph: 25.0,
            gyro_noise: 0.02,
            seed: 0,
        }
    }
}

impl GeneratorConfig {
    fn brake_starts(&self) -> Vec<usize> {
        (1..=self.hard_brakes)
            .map(|k| k * self.samples / (self.hard_brakes + 1))
            .collect()
    }

    /// Target speed (km/h) at update `index`, and whether the car is braking.
    fn target_kph(&self, index: usize, starts: &[usize]) -> (f32, bool) {
        for &start in starts {
            if index < start {
                continue;
            }
            let offset = index - start;
            if offset < BRAKE_UPDATES {
                let progress = (offset + 1) as f32 / BRAKE_UPDATES as f32;
                return (self.cruise_kph - self.brake_drop_kph * progress, true);
            }
            if offset < BRAKE_UPDATES + RECOVERY_UPDATES {
                let progress = (offset + 1 - BRAKE_UPDATES) as f32 / RECOVERY_UPDATES as f32;
                let floor = self.cruise_kph - self.brake_drop_kph;
                return (floor + self.brake_drop_kph * progress, false);
            }
        }
        (self.cruise_kph, false)
    }
}

fn noise(rng: &mut StdRng, amplitude: f32) -> f32 {
    if amplitude > 0.0 {
        rng.gen_range(-amplitude..amplitude)
    } else {
        0.0
    }
}

/// Builds a seeded drive: cruise with jitter, interrupted by hard braking.
pub fn build_drive(config: &GeneratorConfig) -> anyhow::Result<Drive> {
    ensure!(config.samples > 0, "generator needs at least one sample");
    ensure!(
        config.update_interval_ms > 0,
        "generator update interval must be positive"
    );

    let mut rng = StdRng::seed_from_u64(config.seed);
    let starts = config.brake_starts();
    let mut drive = Drive {
        speeds: Vec::with_capacity(config.samples),
        gyro: Vec::with_capacity(config.samples),
    };

    for index in 0..config.samples {
        let (target, braking) = config.target_kph(index, &starts);
        let kph = (target + noise(&mut rng, config.jitter_kph)).max(0.0);
        drive.speeds.push(SpeedSample::new(
            kph / MPS_TO_KPH,
            index as u64 * config.update_interval_ms,
        ));

        let pitch = if braking { 0.3 } else { 0.0 };
        drive.gyro.push(GyroSample::new(
            pitch + noise(&mut rng, config.gyro_noise),
            noise(&mut rng, config.gyro_noise),
            noise(&mut rng, config.gyro_noise),
        ));
    }

    Ok(drive)
}

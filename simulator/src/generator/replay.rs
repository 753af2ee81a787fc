use crate::generator::Drive;
use anyhow::{ensure, Context};
use drivecore::recording::read_log;
use drivecore::signal::{SpeedSample, MPS_TO_KPH};
use std::path::Path;

/// Rebuilds a drive from a recorded session log, one update per row, timed by
/// the logged timestamps relative to the first row.
pub fn drive_from_log<P: AsRef<Path>>(path: P) -> anyhow::Result<Drive> {
    let path_ref = path.as_ref();
    let rows = read_log(path_ref)
        .with_context(|| format!("reading session log {}", path_ref.display()))?;
    ensure!(!rows.is_empty(), "session log {} has no rows", path_ref.display());

    let mut origin = None;
    let mut speeds = Vec::with_capacity(rows.len());
    for (index, row) in rows.iter().enumerate() {
        let recorded_at = row.recorded_at().with_context(|| {
            format!(
                "row {} of {} has unreadable timestamp {:?}",
                index + 1,
                path_ref.display(),
                row.timestamp
            )
        })?;
        let origin = *origin.get_or_insert(recorded_at);
        let offset_ms = (recorded_at - origin).num_milliseconds().max(0) as u64;
        speeds.push(SpeedSample::new(row.speed_kph / MPS_TO_KPH, offset_ms));
    }
    let gyro = rows.iter().map(|row| row.gyro).collect();

    Ok(Drive { speeds, gyro })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn replay_converts_rows_back_to_samples() {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(
            b"Timestamp,Speed,Delta,GyroX,GyroY,GyroZ,Record\n\
2024-07-03 12:00:00 000\",36.00,0.00,0.10,0.00,0.00,V\n\
2024-07-03 12:00:01 000\",72.00,36.00,0.00,0.00,0.00,V\n",
        )
        .unwrap();
        let drive = drive_from_log(temp.path()).unwrap();
        assert_eq!(drive.len(), 2);
        assert!((drive.speeds[1].speed_mps - 20.0).abs() < 1e-4);
        assert_eq!(drive.speeds[1].timestamp_ms, 1000);
        assert!((drive.gyro[0].x - 0.1).abs() < 1e-6);
    }

    #[test]
    fn header_only_log_is_rejected() {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(b"Timestamp,Speed,Delta,GyroX,GyroY,GyroZ,Record\n")
            .unwrap();
        assert!(drive_from_log(temp.path()).is_err());
    }

    #[test]
    fn replay_keeps_logged_cadence() {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(
            b"Timestamp,Speed,Delta,GyroX,GyroY,GyroZ,Record\n\
2024-07-03 12:00:00 100\",10.00,0.00,0.00,0.00,0.00,V\n\
2024-07-03 12:00:00 850\",11.00,1.00,0.00,0.00,0.00,V\n\
2024-07-03 12:00:02 850\",12.00,1.00,0.00,0.00,0.00,V\n",
        )
        .unwrap();
        let drive = drive_from_log(temp.path()).unwrap();
        let stamps: Vec<u64> = drive.speeds.iter().map(|s| s.timestamp_ms).collect();
        assert_eq!(stamps, vec![0, 750, 2750]);
    }

    #[test]
    fn unreadable_timestamp_is_reported() {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(
            b"Timestamp,Speed,Delta,GyroX,GyroY,GyroZ,Record\nyesterday,10.00,0.00,0.00,0.00,0.00,V\n",
        )
        .unwrap();
        assert!(drive_from_log(temp.path()).is_err());
    }
}

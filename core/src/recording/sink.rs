use crate::prelude::{RecordSink, SinkError, SinkFactory};
use chrono::NaiveDateTime;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

/// `yyyyMMdd_HHmmss.csv`, the name of a session log started at `at`.
pub fn session_file_name(at: &NaiveDateTime) -> String {
    format!("{}.csv", at.format("%Y%m%d_%H%M%S"))
}

/// Buffered CSV file holding one recording session.
pub struct CsvFileSink {
    path: PathBuf,
    writer: Option<BufWriter<File>>,
}

impl CsvFileSink {
    /// Creates a new file, failing if `path` already exists.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self, SinkError> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .map_err(|err| SinkError::Open(format!("{}: {}", path.display(), err)))?;
        Ok(Self {
            path,
            writer: Some(BufWriter::new(file)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RecordSink for CsvFileSink {
    fn write_line(&mut self, line: &str) -> Result<(), SinkError> {
        let writer = self
            .writer
            .as_mut()
            .ok_or_else(|| SinkError::Write("sink already closed".into()))?;
        writeln!(writer, "{}", line)
            .and_then(|_| writer.flush())
            .map_err(|err| SinkError::Write(format!("{}: {}", self.path.display(), err)))
    }

    fn close(&mut self) -> Result<(), SinkError> {
        let Some(mut writer) = self.writer.take() else {
            return Ok(());
        };
        writer
            .flush()
            .and_then(|_| writer.get_ref().sync_all())
            .map_err(|err| SinkError::Close(format!("{}: {}", self.path.display(), err)))
    }
}

/// Opens one timestamped CSV file per session under `output_dir`.
#[derive(Debug, Clone)]
pub struct CsvSinkFactory {
    output_dir: PathBuf,
}

impl CsvSinkFactory {
    pub fn new<P: Into<PathBuf>>(output_dir: P) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }
}

impl SinkFactory for CsvSinkFactory {
    fn open(&self, started_at: NaiveDateTime) -> Result<Box<dyn RecordSink>, SinkError> {
        fs::create_dir_all(&self.output_dir).map_err(|err| {
            SinkError::Open(format!("{}: {}", self.output_dir.display(), err))
        })?;

        let base = session_file_name(&started_at);
        let stem = base.trim_end_matches(".csv");
        // Sessions started within the same second get a numeric suffix.
        for attempt in 0..100 {
            let name = if attempt == 0 {
                base.clone()
            } else {
                format!("{}_{}.csv", stem, attempt)
            };
            match CsvFileSink::create(self.output_dir.join(&name)) {
                Ok(sink) => return Ok(Box::new(sink)),
                Err(_) if self.output_dir.join(&name).exists() => continue,
                Err(err) => return Err(err),
            }
        }
        Err(SinkError::Open(format!(
            "{}: {}",
            base,
            std::io::Error::from(ErrorKind::AlreadyExists)
        )))
    }
}

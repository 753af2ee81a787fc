pub mod reader;
pub mod row;
pub mod session;
pub mod sink;

pub use reader::{parse_log, read_log, LoggedRow};
pub use row::{
    format_timestamp, sanitize_record, RecordInputs, RecordRow, HEADER, TIMESTAMP_FORMAT,
};
pub use session::{AnnotationLatch, RecordingSession, TickOutcome};
pub use sink::{session_file_name, CsvFileSink, CsvSinkFactory};

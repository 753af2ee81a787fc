pub mod runtime;
pub mod state;

pub use runtime::{spawn, PipelineEvent, PipelineHandle};
pub use state::{LocationUpdate, PipelineSnapshot, PipelineState};

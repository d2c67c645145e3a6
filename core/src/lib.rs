pub mod config;
pub mod output;
pub mod performance;
pub mod scheduler;
pub mod smf;
pub mod time;

pub use crate::output::{DispatchEvent, OutputSink, SinkError};
pub use crate::performance::Performance;
pub use crate::smf::SmfError;

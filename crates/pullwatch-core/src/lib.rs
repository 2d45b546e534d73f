pub mod command;
pub mod config;
pub mod error;
pub mod gpu;

pub use command::{CommandOutput, CommandRunner, SystemRunner};
pub use config::{ChildCommand, ServerConfig, WatcherConfig};
pub use error::{PullwatchError, Result};
pub use gpu::{parse_samples, query_gpus, GpuReport, GpuSample};

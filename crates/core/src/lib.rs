// pingproc Core - result model, ports and execution adapters
// NO process spawning here: the OS adapter lives in infra-system

pub mod application;
pub mod config;
pub mod domain;
pub mod error;
pub mod port;

pub use application::{cancel_channel, CancelSource, CancelToken, PingHandle, PingProcess, PingTask};
pub use config::{ConfigError, PingConfig};
pub use domain::{PingError, PingResult, RawOutput, RunOutcome, UsageError};
pub use error::AggregateError;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

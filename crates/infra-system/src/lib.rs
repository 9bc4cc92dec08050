// pingproc Infrastructure - System Adapters
// Implements: ProbeRunner over the OS ping utility

pub mod process_runner;

pub use process_runner::ProcessProbeRunner;

use pingproc_core::{PingConfig, PingProcess};
use std::sync::Arc;
use tokio::runtime::Handle;

/// Wire a `PingProcess` to the real probe utility described by `config`
pub fn system_ping(config: &PingConfig, runtime: Handle) -> PingProcess {
    PingProcess::new(Arc::new(ProcessProbeRunner::new(config)), runtime)
        .with_max_concurrency(config.max_concurrency)
}

// Application Layer - aggregation, cancellation and execution adapters

pub mod adapter;
pub mod aggregator;
mod batch;
pub mod cancel;
pub mod constants;

// Re-exports
pub use adapter::{PingHandle, PingProcess, PingTask};
pub use cancel::{cancel_channel, CancelSource, CancelToken};

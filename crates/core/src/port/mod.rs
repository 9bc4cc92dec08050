// Port Layer - Interfaces for external dependencies

pub mod probe_runner;

// Re-exports
pub use probe_runner::ProbeRunner;

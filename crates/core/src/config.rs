// Probe configuration

use crate::application::constants::{
    DEFAULT_BASE_ARGS, DEFAULT_KILL_GRACE, DEFAULT_MAX_CONCURRENCY, DEFAULT_PROGRAM,
};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Semaphore;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("program must not be empty")]
    EmptyProgram,

    #[error("max_concurrency must be at least 1")]
    ZeroConcurrency,

    #[error("max_concurrency must not exceed {max}")]
    ConcurrencyTooLarge { max: usize },
}

/// How the probe utility is invoked
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PingConfig {
    /// Executable to spawn
    pub program: String,
    /// Flags placed before the single positional target
    pub base_args: Vec<String>,
    /// Grace period between the termination request and a forced kill
    pub kill_grace: Duration,
    /// Upper bound of concurrently running batch sub-runs
    pub max_concurrency: usize,
    /// Working directory of the child; `None` inherits the caller's
    pub working_dir: Option<PathBuf>,
}

impl Default for PingConfig {
    fn default() -> Self {
        Self {
            program: DEFAULT_PROGRAM.to_string(),
            base_args: DEFAULT_BASE_ARGS.iter().map(|s| s.to_string()).collect(),
            kill_grace: DEFAULT_KILL_GRACE,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            working_dir: None,
        }
    }
}

impl PingConfig {
    /// Configuration for an arbitrary executable with no extra flags
    pub fn for_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            base_args: Vec::new(),
            ..Default::default()
        }
    }

    pub fn with_base_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.base_args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_kill_grace(mut self, grace: Duration) -> Self {
        self.kill_grace = grace;
        self
    }

    pub fn with_max_concurrency(mut self, max: usize) -> Self {
        self.max_concurrency = max;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.program.trim().is_empty() {
            return Err(ConfigError::EmptyProgram);
        }
        if self.max_concurrency == 0 {
            return Err(ConfigError::ZeroConcurrency);
        }
        if self.max_concurrency > Semaphore::MAX_PERMITS {
            return Err(ConfigError::ConcurrencyTooLarge {
                max: Semaphore::MAX_PERMITS,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_targets_platform_ping() {
        let config = PingConfig::default();
        assert_eq!(config.program, "ping");
        assert!(config.validate().is_ok());

        #[cfg(windows)]
        assert!(config.base_args.is_empty());
        #[cfg(not(windows))]
        assert_eq!(config.base_args, vec!["-c", "4"]);
    }

    #[test]
    fn test_validate_rejects_empty_program() {
        let config = PingConfig::for_program("  ");
        assert_eq!(config.validate(), Err(ConfigError::EmptyProgram));
    }

    #[test]
    fn test_validate_rejects_zero_concurrency() {
        let config = PingConfig::default().with_max_concurrency(0);
        assert_eq!(config.validate(), Err(ConfigError::ZeroConcurrency));
    }

    #[test]
    fn test_validate_rejects_concurrency_above_semaphore_limit() {
        let config = PingConfig::default().with_max_concurrency(usize::MAX);
        assert_eq!(
            config.validate(),
            Err(ConfigError::ConcurrencyTooLarge {
                max: Semaphore::MAX_PERMITS
            })
        );

        let config = PingConfig::default().with_max_concurrency(Semaphore::MAX_PERMITS);
        assert!(config.validate().is_ok());
    }
}

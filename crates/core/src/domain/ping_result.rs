// PingResult Domain Model

use serde::{Deserialize, Serialize};

/// Raw capture of one finished child process, before aggregation
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawOutput {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl RawOutput {
    pub fn new(exit_code: i32, stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self {
            exit_code,
            stdout: stdout.into(),
            stderr: stderr.into(),
        }
    }
}

/// Result of a single-target run or of a whole batch
///
/// Immutable once built. `exit_code` is always the code the child process
/// reported (or, for a batch, the representative code of its sub-runs).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PingResult {
    exit_code: i32,
    std_output: Option<String>,
    std_error: Option<String>,
}

impl PingResult {
    pub fn new(exit_code: i32, std_output: Option<String>, std_error: Option<String>) -> Self {
        Self {
            exit_code,
            std_output,
            std_error,
        }
    }

    pub fn exit_code(&self) -> i32 {
        self.exit_code
    }

    pub fn std_output(&self) -> Option<&str> {
        self.std_output.as_deref()
    }

    pub fn std_error(&self) -> Option<&str> {
        self.std_error.as_deref()
    }

    /// True when the target responded (exit code 0)
    pub fn is_success(&self) -> bool {
        self.exit_code == 0
    }

    /// Number of lines in the captured standard output (0 when absent)
    pub fn output_line_count(&self) -> usize {
        self.std_output.as_deref().map_or(0, |s| s.split('\n').count())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_success_follows_exit_code() {
        assert!(PingResult::new(0, Some("ok".into()), None).is_success());
        assert!(!PingResult::new(1, Some("no host".into()), None).is_success());
    }

    #[test]
    fn test_output_line_count() {
        let result = PingResult::new(0, Some("a\nb\n\nc".into()), Some(String::new()));
        assert_eq!(result.output_line_count(), 4);

        let empty = PingResult::new(0, None, None);
        assert_eq!(empty.output_line_count(), 0);
    }

    #[test]
    fn test_serializes_camel_case() {
        let result = PingResult::new(1, Some("out".into()), Some(String::new()));
        let json = serde_json::to_value(&result).unwrap();

        assert_eq!(json["exitCode"], 1);
        assert_eq!(json["stdOutput"], "out");
        assert_eq!(json["stdError"], "");
    }
}

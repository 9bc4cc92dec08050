// Result aggregation: raw process capture -> PingResult
//
// Pure and infallible. The only transformation applied to captured text is
// removing one leading and one trailing line terminator.

use super::constants::LINE_SEPARATOR;
use crate::domain::{PingResult, RawOutput};

/// Build the typed result of one finished child process
pub fn aggregate(raw: RawOutput) -> PingResult {
    PingResult::new(
        raw.exit_code,
        Some(trim_line_artifacts(&raw.stdout).to_string()),
        Some(trim_line_artifacts(&raw.stderr).to_string()),
    )
}

/// Strip a single leading and a single trailing line terminator
///
/// Blank lines inside the text, and any further blank lines at either end,
/// are kept as they are.
pub fn trim_line_artifacts(text: &str) -> &str {
    let text = text
        .strip_prefix("\r\n")
        .or_else(|| text.strip_prefix('\n'))
        .unwrap_or(text);
    text.strip_suffix("\r\n")
        .or_else(|| text.strip_suffix('\n'))
        .unwrap_or(text)
}

/// Merge per-target results, already ordered by input position
///
/// Outputs are joined with the platform line separator, skipping empty ones.
/// The exit code is 0 only if every result is 0, otherwise the first
/// non-zero code in input order.
pub fn concat(results: &[PingResult]) -> PingResult {
    let exit_code = results
        .iter()
        .map(PingResult::exit_code)
        .find(|code| *code != 0)
        .unwrap_or(0);

    PingResult::new(
        exit_code,
        Some(join_non_empty(results.iter().map(PingResult::std_output))),
        Some(join_non_empty(results.iter().map(PingResult::std_error))),
    )
}

fn join_non_empty<'a>(parts: impl Iterator<Item = Option<&'a str>>) -> String {
    parts
        .flatten()
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(LINE_SEPARATOR)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::probe_runner::mocks::LOOPBACK_REPLY;

    #[test]
    fn test_trim_removes_one_artifact_each_side() {
        assert_eq!(trim_line_artifacts("\r\nline\r\n"), "line");
        assert_eq!(trim_line_artifacts("\nline\n"), "line");
        assert_eq!(trim_line_artifacts("\n\nline\n\n"), "\nline\n");
    }

    #[test]
    fn test_trim_keeps_inner_blank_lines() {
        assert_eq!(trim_line_artifacts("a\n\n\nb\n"), "a\n\n\nb");
    }

    #[test]
    fn test_empty_output_is_empty_not_none() {
        let result = aggregate(RawOutput::new(0, "", ""));
        assert_eq!(result.std_output(), Some(""));
        assert_eq!(result.std_error(), Some(""));
    }

    #[test]
    fn test_aggregate_keeps_exit_code_and_report_lines() {
        let result = aggregate(RawOutput::new(0, LOOPBACK_REPLY, ""));

        assert_eq!(result.exit_code(), 0);
        assert_eq!(result.output_line_count(), 10);
        assert!(result.std_output().unwrap().starts_with("Pinging localhost"));
    }

    #[test]
    fn test_concat_exit_code_is_first_failure_in_input_order() {
        let results = vec![
            PingResult::new(0, Some("a".into()), Some(String::new())),
            PingResult::new(2, Some("b".into()), Some(String::new())),
            PingResult::new(1, Some("c".into()), Some("err".into())),
        ];

        let merged = concat(&results);
        assert_eq!(merged.exit_code(), 2);
        assert_eq!(
            merged.std_output(),
            Some(["a", "b", "c"].join(LINE_SEPARATOR).as_str())
        );
        assert_eq!(merged.std_error(), Some("err"));
    }

    #[test]
    fn test_concat_of_nothing_is_success() {
        let merged = concat(&[]);
        assert_eq!(merged.exit_code(), 0);
        assert_eq!(merged.std_output(), Some(""));
    }
}

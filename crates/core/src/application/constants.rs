// Execution constants (no magic values)
use std::time::Duration;

/// Executable name of the platform probe utility
pub const DEFAULT_PROGRAM: &str = "ping";

/// Flags added ahead of the target on non-Windows platforms
///
/// The Windows utility sends four echo requests and exits; elsewhere the
/// utility runs until interrupted unless given a count.
#[cfg(windows)]
pub const DEFAULT_BASE_ARGS: &[&str] = &[];
#[cfg(not(windows))]
pub const DEFAULT_BASE_ARGS: &[&str] = &["-c", "4"];

/// Time a child gets to exit after a polite termination request (1s)
/// before it is killed outright
pub const DEFAULT_KILL_GRACE: Duration = Duration::from_secs(1);

/// Maximum sub-runs of one batch executing at the same time
pub const DEFAULT_MAX_CONCURRENCY: usize = 8;

/// Separator placed between sub-run outputs of a batch
#[cfg(windows)]
pub const LINE_SEPARATOR: &str = "\r\n";
#[cfg(not(windows))]
pub const LINE_SEPARATOR: &str = "\n";

/// CLI exit code reported when a run was cancelled (128 + SIGINT)
pub const CANCELLED_EXIT_CODE: u8 = 130;

/// Exit code the Windows utility uses when the host name cannot be resolved
pub const HOST_NOT_FOUND_EXIT_CODE: i32 = 1;

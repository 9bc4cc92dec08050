// Domain Layer - result model, outcome and errors

pub mod error;
pub mod outcome;
pub mod ping_result;

// Re-exports
pub use error::{PingError, UsageError};
pub use outcome::RunOutcome;
pub use ping_result::{PingResult, RawOutput};

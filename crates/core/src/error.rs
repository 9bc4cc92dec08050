// Central Error Types for blocking observation

use crate::domain::PingError;

/// Container a blocking wait puts every failure into
///
/// Await-style observation yields the inner `PingError` directly; a blocking
/// `wait()` wraps it here, so callers that block must unwrap it themselves
/// (`inner_error()`, `into_inner()` or `std::error::Error::source`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregateError {
    errors: Vec<AggregateCause>,
}

/// One entry of an aggregate: either a leaf error or another aggregate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AggregateCause {
    Error(PingError),
    Nested(AggregateError),
}

fn summary(errors: &[AggregateCause]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl AggregateError {
    pub fn new(error: PingError) -> Self {
        Self {
            errors: vec![AggregateCause::Error(error)],
        }
    }

    /// Wrap an existing aggregate one level deeper
    pub fn nested(inner: AggregateError) -> Self {
        Self {
            errors: vec![AggregateCause::Nested(inner)],
        }
    }

    pub fn causes(&self) -> &[AggregateCause] {
        &self.errors
    }

    /// Collapse nested aggregates into a single level of leaf errors
    pub fn flatten(self) -> Self {
        let mut leaves = Vec::new();
        let mut pending: Vec<AggregateCause> = self.errors.into_iter().rev().collect();
        while let Some(cause) = pending.pop() {
            match cause {
                AggregateCause::Error(e) => leaves.push(AggregateCause::Error(e)),
                AggregateCause::Nested(inner) => pending.extend(inner.errors.into_iter().rev()),
            }
        }
        Self { errors: leaves }
    }

    /// First leaf error, searching depth-first
    pub fn inner_error(&self) -> Option<&PingError> {
        self.errors.iter().find_map(|cause| match cause {
            AggregateCause::Error(e) => Some(e),
            AggregateCause::Nested(inner) => inner.inner_error(),
        })
    }

    /// Unwrap the first leaf error
    pub fn into_inner(self) -> Option<PingError> {
        self.flatten().errors.into_iter().find_map(|cause| match cause {
            AggregateCause::Error(e) => Some(e),
            AggregateCause::Nested(_) => None,
        })
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner_error().is_some_and(PingError::is_cancelled)
    }
}

impl From<PingError> for AggregateError {
    fn from(error: PingError) -> Self {
        AggregateError::new(error)
    }
}

impl std::fmt::Display for AggregateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "one or more errors occurred ({})", summary(&self.errors))
    }
}

impl std::error::Error for AggregateError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self.errors.first()? {
            AggregateCause::Error(e) => Some(e),
            AggregateCause::Nested(a) => Some(a),
        }
    }
}

impl std::fmt::Display for AggregateCause {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AggregateCause::Error(e) => write!(f, "{}", e),
            AggregateCause::Nested(a) => write!(f, "{}", a),
        }
    }
}

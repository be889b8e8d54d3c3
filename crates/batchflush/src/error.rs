//! Error types for batchflush operations.

use thiserror::Error;

/// Errors returned synchronously by [`PeriodicDispatcher::start`].
///
/// [`PeriodicDispatcher::start`]: crate::PeriodicDispatcher::start
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum StartError {
    /// The dispatcher is running or has already stopped.
    #[error("dispatcher already started")]
    AlreadyStarted,

    /// A zero flush period would spin the loop.
    #[error("flush period must be greater than zero")]
    ZeroPeriod,

    /// The first deadline `now + period` does not fit in an `Instant`.
    #[error("flush period is too long to schedule")]
    PeriodTooLong,

    /// `start` was called outside of a Tokio runtime.
    #[error("no tokio runtime available to run the dispatch loop")]
    NoRuntime,
}

/// Failure reported by a batch handler.
///
/// The dispatcher logs these and drops the batch; they never reach producers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    /// Transport-layer error (connection refused, timeout, TLS)
    #[error("transport error: {0}")]
    Transport(String),
    /// The batch could not be encoded
    #[error("serialization error: {0}")]
    Serialization(String),
    /// The downstream sink answered but refused the batch
    #[error("batch rejected (status {status}): {reason}")]
    Rejected { status: u16, reason: String },
    /// The handler panicked while processing the batch
    #[error("handler panicked: {0}")]
    Panicked(String),
}

impl DispatchError {
    /// Returns `true` for failures that might succeed on a later batch
    /// (network trouble, throttling, server-side errors).
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(_) => true,
            Self::Rejected { status, .. } => *status == 429 || *status >= 500,
            Self::Serialization(_) | Self::Panicked(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_error_messages() {
        assert_eq!(StartError::AlreadyStarted.to_string(), "dispatcher already started");
        assert_eq!(
            StartError::PeriodTooLong.to_string(),
            "flush period is too long to schedule"
        );
    }

    #[test]
    fn test_transient_classification() {
        assert!(DispatchError::Transport("connection reset".into()).is_transient());
        assert!(DispatchError::Rejected { status: 503, reason: "unavailable".into() }.is_transient());
        assert!(DispatchError::Rejected { status: 429, reason: "slow down".into() }.is_transient());
        assert!(!DispatchError::Rejected { status: 400, reason: "bad batch".into() }.is_transient());
        assert!(!DispatchError::Serialization("nan".into()).is_transient());
    }
}

use std::fmt;

use crate::config::ConfigurationError;

/// Classification of a path-planning failure.
///
/// The worker loop branches on this kind rather than on the message, so every
/// producer of a [`PlanningError`] must pick the kind deliberately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlanningErrorKind {
    /// The planner answered, but not with a usable path for this ordering.
    /// The planner itself is healthy; later requests may succeed.
    Temporary,
    /// The planner did not answer within the configured timeout.
    Fatal,
    /// Transport-level failure while talking to the planner.
    RemoteCall,
    /// The wait was abandoned because the process is shutting down.
    Cancelled,
}

impl fmt::Display for PlanningErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlanningErrorKind::Temporary => write!(f, "temporary"),
            PlanningErrorKind::Fatal => write!(f, "fatal"),
            PlanningErrorKind::RemoteCall => write!(f, "remote_call"),
            PlanningErrorKind::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Error raised while pricing a candidate ordering.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{kind} planning error: {message}")]
pub struct PlanningError {
    kind: PlanningErrorKind,
    message: String,
}

impl PlanningError {
    pub fn new(kind: PlanningErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn temporary(message: impl Into<String>) -> Self {
        Self::new(PlanningErrorKind::Temporary, message)
    }

    pub fn fatal(message: impl Into<String>) -> Self {
        Self::new(PlanningErrorKind::Fatal, message)
    }

    pub fn remote_call(message: impl Into<String>) -> Self {
        Self::new(PlanningErrorKind::RemoteCall, message)
    }

    pub fn cancelled() -> Self {
        Self::new(
            PlanningErrorKind::Cancelled,
            "wait for path planner abandoned on shutdown",
        )
    }

    pub fn kind(&self) -> PlanningErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Whether the worker can expect the next request to succeed without
    /// outside intervention.
    pub fn is_recoverable(&self) -> bool {
        matches!(self.kind, PlanningErrorKind::Temporary)
    }
}

/// Crate-wide error type.
#[derive(Debug, thiserror::Error)]
pub enum BundlerError {
    #[error(transparent)]
    Planning(#[from] PlanningError),

    #[error("Task queue is full ({capacity} requests waiting)")]
    QueueFull { capacity: usize },

    #[error("Task queue is closed")]
    QueueClosed,

    /// Pull query before any result exists for the requester. Callers are
    /// expected to retry later; this is not a pipeline failure.
    #[error("No result available yet for '{requester}', try again later")]
    NotYetAvailable { requester: String },

    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("Publish error: {0}")]
    Publish(String),

    #[error("Remote call error: {0}")]
    RemoteCall(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),
}

impl BundlerError {
    pub fn is_not_yet_available(&self) -> bool {
        matches!(self, BundlerError::NotYetAvailable { .. })
    }
}

pub type Result<T> = std::result::Result<T, BundlerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_planning_error_kinds() {
        assert!(PlanningError::temporary("unreachable").is_recoverable());
        assert!(!PlanningError::fatal("stuck").is_recoverable());
        assert!(!PlanningError::cancelled().is_recoverable());
        assert_eq!(
            PlanningError::remote_call("refused").kind(),
            PlanningErrorKind::RemoteCall
        );
    }

    #[test]
    fn test_error_display() {
        let err = PlanningError::fatal("no reply after 10s");
        assert_eq!(err.to_string(), "fatal planning error: no reply after 10s");

        let err: BundlerError = err.into();
        assert_eq!(err.to_string(), "fatal planning error: no reply after 10s");

        let err = BundlerError::NotYetAvailable {
            requester: "robot-1".to_string(),
        };
        assert!(err.is_not_yet_available());
        assert!(err.to_string().contains("robot-1"));
    }
}

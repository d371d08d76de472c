//! Error types for the fiber scheduler
//!
//! The surface is intentionally thin. Fiber-level failures (allocation,
//! creation) report through the `FiberId::NONE` sentinel; this enum covers
//! the initialization and configuration paths where a proper error value
//! is worth having.

use core::fmt;

/// Result type for scheduler operations.
pub type SchedResult<T> = Result<T, SchedError>;

/// Errors from scheduler initialization and configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchedError {
    /// The scheduler was already initialized.
    AlreadyInitialized,

    /// A stack or fiber allocation failed during initialization.
    AllocationFailed,

    /// A configuration value was rejected.
    InvalidConfig(&'static str),
}

impl fmt::Display for SchedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchedError::AlreadyInitialized => write!(f, "scheduler already initialized"),
            SchedError::AllocationFailed => write!(f, "allocation failed"),
            SchedError::InvalidConfig(msg) => write!(f, "invalid config: {}", msg),
        }
    }
}

impl std::error::Error for SchedError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            format!("{}", SchedError::AlreadyInitialized),
            "scheduler already initialized"
        );
        assert_eq!(
            format!("{}", SchedError::InvalidConfig("stack_size must be > 0")),
            "invalid config: stack_size must be > 0"
        );
    }
}

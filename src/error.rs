//! Error types for the batching dispatcher and its configuration.

use std::sync::Arc;
use thiserror::Error;

/// Invalid construction parameters. Raised eagerly, never while dispatching.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
    #[error("Batch dispatcher must be started from within a Tokio runtime")]
    NoRuntime,
    #[error("Failed to load configuration: {0}")]
    Load(String),
}

impl ConfigurationError {
    pub fn invalid_value(
        field: impl Into<String>,
        value: impl ToString,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidValue {
            field: field.into(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<config::ConfigError> for ConfigurationError {
    fn from(error: config::ConfigError) -> Self {
        ConfigurationError::Load(error.to_string())
    }
}

/// Outcome of a failed [`submit`](crate::batching::BatchDispatcher::submit).
///
/// `Execution` carries the executor's error behind an `Arc` so that every
/// submitter merged into the failed batch receives the very same value.
#[derive(Debug, Error)]
pub enum BatchError<E> {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    #[error("Submission contained no operations")]
    EmptySubmission,
    #[error("Batch execution failed: {0}")]
    Execution(Arc<E>),
    #[error("Batch dispatcher is no longer running")]
    DispatcherClosed,
}

// Derived Clone would require `E: Clone`; the Arc makes that unnecessary.
impl<E> Clone for BatchError<E> {
    fn clone(&self) -> Self {
        match self {
            BatchError::Configuration(error) => BatchError::Configuration(error.clone()),
            BatchError::EmptySubmission => BatchError::EmptySubmission,
            BatchError::Execution(error) => BatchError::Execution(Arc::clone(error)),
            BatchError::DispatcherClosed => BatchError::DispatcherClosed,
        }
    }
}

impl<E> BatchError<E> {
    /// The executor's error, if this failure came from a dispatched batch.
    pub fn execution_error(&self) -> Option<&Arc<E>> {
        match self {
            BatchError::Execution(error) => Some(error),
            _ => None,
        }
    }
}

pub type BatchResult<T, E> = std::result::Result<T, BatchError<E>>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_execution_error_clone_shares_value() {
        let error: BatchError<String> = BatchError::Execution(Arc::new("boom".to_string()));
        let cloned = error.clone();

        let (Some(a), Some(b)) = (error.execution_error(), cloned.execution_error()) else {
            panic!("expected execution errors");
        };
        assert!(Arc::ptr_eq(a, b));
        assert_eq!(cloned.to_string(), "Batch execution failed: boom");
    }

    #[test]
    fn test_configuration_error_display() {
        let error = ConfigurationError::invalid_value("max_batch_size", 0, "must be greater than 0");
        assert_eq!(
            error.to_string(),
            "Invalid value '0' for max_batch_size: must be greater than 0"
        );
    }
}

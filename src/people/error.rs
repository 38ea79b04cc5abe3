use std::fmt;
use thiserror::Error;

use crate::error::BatchError;

#[derive(Debug, Error)]
pub enum PeopleError {
    #[error("Batch error: {0}")]
    Batch(String),
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Failed to decode statement result: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("Unexpected statement result: {0}")]
    UnexpectedResult(String),
    #[error("Unhealthy: {0}")]
    Unhealthy(String),
}

impl<E: fmt::Display> From<BatchError<E>> for PeopleError {
    fn from(error: BatchError<E>) -> Self {
        PeopleError::Batch(error.to_string())
    }
}

pub type PeopleResult<T> = Result<T, PeopleError>;

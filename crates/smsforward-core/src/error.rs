use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    #[error("invalid phone number: {0:?}")]
    InvalidNumber(String),
    #[error("invalid source pattern: {0}")]
    InvalidPattern(String),
    #[error("source is required")]
    EmptySource,
    #[error("destination is required")]
    EmptyDestination,
    #[error("source and destination must be different")]
    SourceEqualsDestination,
    #[error("rule is armed; deactivate it before editing")]
    RuleArmed,
    #[error("rule store error: {0}")]
    Store(String),
}

impl CoreError {
    pub(crate) fn store(err: impl std::error::Error) -> Self {
        CoreError::Store(err.to_string())
    }
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("transport unavailable: {0}")]
    Unavailable(String),
    #[error("send timed out after {0:?}")]
    Timeout(Duration),
    #[error("message rejected: {0}")]
    Rejected(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("encode error: {0}")]
    Encode(String),
}

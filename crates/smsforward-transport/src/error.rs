use thiserror::Error;

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("parse error: {0}")]
    Parse(String),
    #[error("invalid segment: {0}")]
    InvalidSegment(String),
}

pub type Result<T> = std::result::Result<T, RelayError>;

//! Error taxonomy for the scoreboard server
//!
//! Client errors are rejected before the store is touched and are reported
//! verbatim. Everything else is logged and reported with a generic message.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("store I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("store snapshot could not be encoded: {0}")]
    Codec(#[from] bincode::Error),
    #[error("value at {key} is not an integer")]
    NotAnInteger { key: String },
    #[error("store lock poisoned")]
    Poisoned,
}

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("missing context identifier")]
    MissingContext,
    #[error("score must be a finite number >= 0, got {0}")]
    InvalidScore(f64),
    #[error("malformed request: {0}")]
    MalformedRequest(String),
    #[error("gave up updating {key} after {attempts} conflicting writes")]
    Contention { key: String, attempts: usize },
    #[error("comment log could not be encoded: {0}")]
    Encoding(#[from] serde_json::Error),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ServiceError {
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            ServiceError::MissingContext
                | ServiceError::InvalidScore(_)
                | ServiceError::MalformedRequest(_)
        )
    }

    /// Message safe to hand back to the caller.
    pub fn public_message(&self) -> String {
        if self.is_client_error() {
            self.to_string()
        } else {
            "internal server error".to_string()
        }
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error body a post store may return alongside a non-success status. Any
/// other fields the store sends, such as a code, are ignored.
#[derive(Debug, Clone, Serialize, Deserialize, Error)]
#[error("{message}")]
pub struct ApiError {
    pub message: String,
}

impl ApiError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

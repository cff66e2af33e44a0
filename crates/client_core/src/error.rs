use thiserror::Error;

/// The message is whatever the transport produced; it is not interpreted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("failed to fetch posts: {message}")]
    Fetch { message: String },
    #[error("failed to create post: {message}")]
    Create { message: String },
}

impl StoreError {
    pub fn fetch(err: impl std::fmt::Display) -> Self {
        Self::Fetch {
            message: err.to_string(),
        }
    }

    pub fn create(err: impl std::fmt::Display) -> Self {
        Self::Create {
            message: err.to_string(),
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Fetch { message } | Self::Create { message } => message,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("a post submission is already in flight")]
    SubmitInFlight,
}

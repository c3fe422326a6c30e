//! Error types for the console client.

/// Failures surfaced by gateway, metrics and storage operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The request could not be sent, or the response body was unreadable or malformed.
    #[error("Network error: {0}")]
    Network(String),

    /// The server answered with a non-success status.
    #[error("Server returned {status}: {message}")]
    Gateway { status: u16, message: String },

    /// The server reported a failure inside a progress stream.
    #[error("Server reported an error: {0}")]
    Remote(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// HTTP status of a gateway failure, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Gateway { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Network(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;

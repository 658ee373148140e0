use thiserror::Error;

pub type Result<T> = std::result::Result<T, NearbyError>;

#[derive(Error, Debug)]
pub enum NearbyError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parsing error")]
    Parse,
    #[error("Storage error: {0} {1}")]
    Storage(String, String),
    #[error("Invalid state: {0}")]
    InvalidState(String),
    #[error("Transport error: {0}")]
    Transport(String),
    #[error("Operation cancelled")]
    Cancelled,
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<serde_json::Error> for NearbyError {
    fn from(_: serde_json::Error) -> Self {
        Self::Parse
    }
}

impl From<std::str::Utf8Error> for NearbyError {
    fn from(_: std::str::Utf8Error) -> Self {
        Self::Parse
    }
}

impl NearbyError {
    /// Convenience constructor for caller misuse errors.
    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState(message.into())
    }
}

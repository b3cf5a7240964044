use thiserror::Error;

/// Failures raised by the persistence adapter.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backend could not be reached or opened. Fatal at startup.
    #[error("storage backend unavailable: {0}")]
    Unavailable(String),
    #[error("storage operation failed: {0}")]
    Io(String),
    #[error("stored document could not be decoded: {0}")]
    Decode(String),
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        StoreError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Decode(err.to_string())
    }
}

/// Failures surfaced by board operations.
#[derive(Debug, Error)]
pub enum BoardError {
    #[error("emoji already in use in this guild")]
    EmojiInUse,
    #[error("topic not found")]
    TopicNotFound,
    #[error("no board initialized for this guild/channel")]
    BoardNotFound,
    #[error("caller lacks permission for this action")]
    PermissionDenied,
    #[error(transparent)]
    Store(#[from] StoreError),
}

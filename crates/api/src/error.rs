use thiserror::Error;

/// Result type for command API calls.
pub type ApiResult<T> = Result<T, ApiError>;

/// Opaque failure from the external command API.
///
/// Callers surface these to the user and let them repeat the action; nothing
/// in this layer retries automatically.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// The backend rejected or failed the command.
    #[error("backend command failed: {0}")]
    Command(String),

    /// The backend could not be reached at all.
    #[error("backend unavailable: {0}")]
    Unavailable(String),
}

impl ApiError {
    pub fn command(msg: impl Into<String>) -> Self {
        Self::Command(msg.into())
    }

    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }
}

use thiserror::Error;

use estampa_api::ApiError;
use estampa_core::DomainError;

/// Error surfaced by editor operations.
///
/// Validation failures are local and block the mutation before any backend
/// call; persistence failures come back from the command API after
/// validation passed and are surfaced for the user to repeat the action.
/// Neither is retried automatically.
#[derive(Debug, Error)]
pub enum EditorError {
    #[error(transparent)]
    Validation(#[from] DomainError),

    #[error(transparent)]
    Persistence(#[from] ApiError),
}

impl EditorError {
    pub fn is_validation(&self) -> bool {
        matches!(self, EditorError::Validation(_))
    }
}

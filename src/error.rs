use thiserror::Error;

use crate::{
    dao::{catalog::CatalogError, storage::StorageError},
    state::{InvalidTransition, games::RoundError},
};

/// Errors that can occur while the controller handles an event.
///
/// None of them end the session; the controller logs them and keeps running.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Storage backend is unavailable.
    #[error("storage unavailable")]
    Unavailable(#[source] StorageError),
    /// Content could not be loaded.
    #[error("content unavailable")]
    Content(#[source] CatalogError),
    /// A round could not be generated.
    #[error("round unavailable")]
    Round(#[source] RoundError),
    /// The event is not valid in the current round phase.
    #[error("invalid state: {0}")]
    InvalidState(String),
}

impl From<StorageError> for ServiceError {
    fn from(err: StorageError) -> Self {
        ServiceError::Unavailable(err)
    }
}

impl From<CatalogError> for ServiceError {
    fn from(err: CatalogError) -> Self {
        ServiceError::Content(err)
    }
}

impl From<RoundError> for ServiceError {
    fn from(err: RoundError) -> Self {
        ServiceError::Round(err)
    }
}

impl From<InvalidTransition> for ServiceError {
    fn from(err: InvalidTransition) -> Self {
        ServiceError::InvalidState(err.to_string())
    }
}

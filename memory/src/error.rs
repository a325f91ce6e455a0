//! Error taxonomy for the memory core.
//!
//! Every failure is a distinguishable value; callers match on the kind and
//! decide how to surface it. Only the outermost boundary (the chat adapter)
//! may flatten `UserNotFound` into a "not found" reply.

use thiserror::Error;

use chatmem_types::{TemperatureRangeError, UnknownModelError};

#[derive(Debug, Error)]
pub enum MemoryError {
    /// Operation on a user that was never initialized. Recoverable: the
    /// caller can run `ensure_user` and retry.
    #[error("user '{user_id}' has not been initialized")]
    UserNotFound { user_id: String },

    /// Model name outside the supported set, rejected before persistence.
    #[error(transparent)]
    UnsupportedModel(#[from] UnknownModelError),

    /// Temperature outside `[0.0, 1.0]`, rejected before persistence.
    #[error(transparent)]
    TemperatureOutOfRange(#[from] TemperatureRangeError),

    /// Empty or whitespace-only content is not a storable turn.
    #[error("message content must not be empty")]
    EmptyMessage,

    /// The persistence layer failed. Fatal for the current operation;
    /// never retried internally.
    #[error("storage unavailable: {0}")]
    Storage(#[from] rusqlite::Error),

    /// Database file or directory preparation failed at open time.
    #[error("failed to prepare database storage: {0}")]
    Io(#[from] std::io::Error),
}

impl MemoryError {
    pub(crate) fn user_not_found(user_id: &str) -> Self {
        MemoryError::UserNotFound {
            user_id: user_id.to_string(),
        }
    }
}

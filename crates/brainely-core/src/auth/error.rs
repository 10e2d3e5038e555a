use thiserror::Error;

use crate::api::ApiError;

/// Inline notice shown when a credential field is left blank.
pub const MISSING_CREDENTIALS: &str = "Please enter both username and password";

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("{}", MISSING_CREDENTIALS)]
    Validation,

    #[error("A request is already in progress")]
    InFlight,

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("Failed to save session: {0}")]
    Storage(String),

    #[error("Failed to clear session: {0}")]
    ClearStorage(String),
}

use thiserror::Error;

use crate::errors::InternalError;

/// Business-rule violations, returned as values so callers can map them
/// straight onto responses.
///
/// Only `Internal` carries an unexpected failure; everything else is an
/// expected outcome of the domain rules and is never logged as an error.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Unknown email or wrong password. One variant for both, so the API
    /// surface cannot leak which of the two it was.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Access token malformed, wrong class, or expired beyond renewal.
    #[error("invalid or expired token")]
    InvalidOrExpiredToken,

    /// No session row matches the presented access token.
    #[error("session not found")]
    SessionNotFound,

    /// Role-permission denial.
    #[error("operation not permitted for this role")]
    Unauthorized,

    /// Entity absent.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// Duplicate email.
    #[error("email already in use")]
    Conflict,

    /// Reset token unknown, expired, or already consumed.
    #[error("reset token invalid or already used")]
    ResetTokenInvalid,

    /// Storage or other unexpected failure, already logged at wrap point.
    #[error(transparent)]
    Internal(#[from] InternalError),
}

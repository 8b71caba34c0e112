use poem_openapi::{payload::Json, ApiResponse, Object};

use crate::errors::CoreError;

/// Canonical user-facing messages, shared by error mapping and tests.
pub mod messages {
    pub const NO_TOKEN: &str = "Authorization required";
    pub const INVALID_TOKEN: &str = "Invalid or expired token";
    pub const UNAUTHORIZED: &str = "You do not have permission to access this resource";
    pub const INVALID_CREDENTIALS: &str = "Invalid email or password";
    pub const BLOCKED: &str = "Your account is blocked. Contact an administrator.";
    pub const RESET_INVALID: &str =
        "This password reset link is expired or has already been used. Please request a new one.";
    pub const SESSION_NOT_FOUND: &str =
        "No active session found. You may have already logged out.";
    pub const USER_NOT_FOUND: &str = "User not found";
    pub const INVALID_EMAIL: &str = "No account exists for that email address";
    pub const EMAIL_EXIST: &str = "Email already in use, please try another one";
    pub const SERVER_ERROR: &str = "The operation could not be completed";
    pub const MAINTENANCE: &str = "The system is currently under maintenance";
}

/// Failure envelope: `success` is always false, `message` is the
/// externally-safe description. Internal detail never reaches this type.
#[derive(Object, Debug)]
pub struct ErrorBody {
    pub success: bool,
    pub message: String,
}

impl ErrorBody {
    fn new(message: impl Into<String>) -> Json<Self> {
        Json(Self {
            success: false,
            message: message.into(),
        })
    }
}

/// API-level error responses shared by all endpoints.
#[derive(ApiResponse, Debug)]
pub enum ApiError {
    /// Caller-supplied data failed validation
    #[oai(status = 400)]
    BadRequest(Json<ErrorBody>),

    /// Missing/invalid credentials, token, or session
    #[oai(status = 401)]
    Unauthenticated(Json<ErrorBody>),

    /// Authenticated but not permitted for this role
    #[oai(status = 403)]
    Forbidden(Json<ErrorBody>),

    /// Entity absent
    #[oai(status = 404)]
    NotFound(Json<ErrorBody>),

    /// Duplicate email
    #[oai(status = 409)]
    Conflict(Json<ErrorBody>),

    /// Unexpected failure; detail was logged where it was wrapped
    #[oai(status = 500)]
    Internal(Json<ErrorBody>),

    /// System is in maintenance mode
    #[oai(status = 503)]
    Maintenance(
        Json<ErrorBody>,
        #[oai(header = "x-maintenance-mode")] String,
    ),
}

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::BadRequest(ErrorBody::new(message))
    }

    pub fn no_token() -> Self {
        ApiError::Unauthenticated(ErrorBody::new(messages::NO_TOKEN))
    }

    pub fn invalid_token() -> Self {
        ApiError::Unauthenticated(ErrorBody::new(messages::INVALID_TOKEN))
    }

    pub fn invalid_credentials() -> Self {
        ApiError::Unauthenticated(ErrorBody::new(messages::INVALID_CREDENTIALS))
    }

    pub fn blocked() -> Self {
        ApiError::Unauthenticated(ErrorBody::new(messages::BLOCKED))
    }

    /// Guard-level session miss: the caller is simply not authenticated.
    pub fn session_unauthenticated() -> Self {
        ApiError::Unauthenticated(ErrorBody::new(messages::SESSION_NOT_FOUND))
    }

    pub fn reset_invalid() -> Self {
        ApiError::Unauthenticated(ErrorBody::new(messages::RESET_INVALID))
    }

    pub fn forbidden() -> Self {
        ApiError::Forbidden(ErrorBody::new(messages::UNAUTHORIZED))
    }

    /// Logout-level session miss: the entity is absent.
    pub fn session_not_found() -> Self {
        ApiError::NotFound(ErrorBody::new(messages::SESSION_NOT_FOUND))
    }

    pub fn user_not_found() -> Self {
        ApiError::NotFound(ErrorBody::new(messages::USER_NOT_FOUND))
    }

    pub fn invalid_email() -> Self {
        ApiError::NotFound(ErrorBody::new(messages::INVALID_EMAIL))
    }

    pub fn email_exists() -> Self {
        ApiError::Conflict(ErrorBody::new(messages::EMAIL_EXIST))
    }

    pub fn internal() -> Self {
        ApiError::Internal(ErrorBody::new(messages::SERVER_ERROR))
    }

    pub fn maintenance() -> Self {
        ApiError::Maintenance(ErrorBody::new(messages::MAINTENANCE), "true".to_string())
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::InvalidCredentials => ApiError::invalid_credentials(),
            CoreError::InvalidOrExpiredToken => ApiError::invalid_token(),
            CoreError::SessionNotFound => ApiError::session_not_found(),
            CoreError::Unauthorized => ApiError::forbidden(),
            CoreError::NotFound(_) => ApiError::user_not_found(),
            CoreError::Conflict => ApiError::email_exists(),
            CoreError::ResetTokenInvalid => ApiError::reset_invalid(),
            CoreError::Internal(_) => ApiError::internal(),
        }
    }
}

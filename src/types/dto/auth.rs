use poem_openapi::{payload::Json, ApiResponse, Object};
use serde::{Deserialize, Serialize};

use crate::types::dto::common::MessageBody;

/// Request model for user login
#[derive(Object, Debug, Serialize, Deserialize)]
pub struct LoginRequest {
    /// Email address for authentication
    pub email: String,

    /// Password for authentication
    pub password: String,
}

/// Signed token pair returned on login
#[derive(Object, Debug, Serialize, Deserialize)]
pub struct TokenPair {
    /// JWT access token for API authentication
    pub token: String,

    /// Refresh token used for silent renewal when the access token expires
    pub refresh_token: String,
}

/// Envelope for a successful login
#[derive(Object, Debug, Serialize, Deserialize)]
pub struct LoginBody {
    /// Whether the operation succeeded
    pub success: bool,

    /// Human-readable outcome message
    pub message: String,

    /// The issued token pair
    pub body: TokenPair,
}

/// API response for the login endpoint
#[derive(ApiResponse)]
pub enum LoginApiResponse {
    /// Authentication successful, tokens provided
    #[oai(status = 200)]
    Ok(Json<LoginBody>),
}

/// API response for the logout endpoint
#[derive(ApiResponse)]
pub enum LogoutApiResponse {
    /// Session destroyed
    #[oai(status = 200)]
    Ok(Json<MessageBody>),
}

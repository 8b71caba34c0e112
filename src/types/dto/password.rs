use poem_openapi::{payload::Json, ApiResponse, Object};
use serde::{Deserialize, Serialize};

use crate::types::dto::common::MessageBody;

/// Request model for changing one's own password
#[derive(Object, Debug, Serialize, Deserialize)]
pub struct ChangePasswordRequest {
    /// The password currently on record
    pub current_password: String,

    /// The replacement password
    pub new_password: String,
}

/// Request model for starting the forgotten-password flow
#[derive(Object, Debug, Serialize, Deserialize)]
pub struct ForgotPasswordRequest {
    /// Email of the account to recover
    pub email: String,
}

/// Request model for completing a password reset
#[derive(Object, Debug, Serialize, Deserialize)]
pub struct ResetPasswordRequest {
    /// The replacement password
    pub new_password: String,
}

/// The one-time reset token issued by the forgotten-password flow
#[derive(Object, Debug, Serialize, Deserialize)]
pub struct ResetTokenBody {
    pub reset_token: String,
}

/// Envelope for a successful forgotten-password request
#[derive(Object, Debug, Serialize, Deserialize)]
pub struct ForgotPasswordBody {
    /// Whether the operation succeeded
    pub success: bool,

    /// Human-readable outcome message
    pub message: String,

    /// The issued reset token
    pub body: ResetTokenBody,
}

/// API response for the password change endpoint
#[derive(ApiResponse)]
pub enum ChangePasswordApiResponse {
    /// Password updated
    #[oai(status = 200)]
    Ok(
        Json<MessageBody>,
        /// Replacement access token, present when the guard renewed the pair
        #[oai(header = "x-new-token")]
        Option<String>,
        /// Replacement refresh token, present when the guard renewed the pair
        #[oai(header = "x-new-refresh-token")]
        Option<String>,
        /// Numeric role id of the authenticated caller
        #[oai(header = "x-user-permissions")]
        String,
    ),
}

/// API response for the forgotten-password endpoint
#[derive(ApiResponse)]
pub enum ForgotPasswordApiResponse {
    /// Reset token issued
    #[oai(status = 200)]
    Ok(Json<ForgotPasswordBody>),
}

/// API response for the password reset endpoint
#[derive(ApiResponse)]
pub enum ResetPasswordApiResponse {
    /// Password reset and token consumed
    #[oai(status = 200)]
    Ok(Json<MessageBody>),
}

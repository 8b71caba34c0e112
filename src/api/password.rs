use std::sync::Arc;

use poem::Request;
use poem_openapi::{payload::Json, OpenApi, Tags};

use crate::api::{authorize, BearerAuth};
use crate::app_data::AppData;
use crate::errors::{ApiError, CoreError};
use crate::services::password_policy::{validate_email, validate_password};
use crate::types::dto::common::MessageBody;
use crate::types::dto::password::{
    ChangePasswordApiResponse, ChangePasswordRequest, ForgotPasswordApiResponse,
    ForgotPasswordBody, ForgotPasswordRequest, ResetPasswordApiResponse, ResetPasswordRequest,
    ResetTokenBody,
};
use crate::types::internal::Role;

/// Password API: authenticated change plus the two-step reset flow
pub struct PasswordApi {
    data: Arc<AppData>,
}

impl PasswordApi {
    pub fn new(data: Arc<AppData>) -> Self {
        Self { data }
    }
}

#[derive(Tags)]
enum PasswordTags {
    /// Password endpoints
    Password,
}

#[OpenApi(prefix_path = "/password")]
impl PasswordApi {
    /// Change the caller's password; the current one must be re-proven
    #[oai(path = "/change", method = "post", tag = "PasswordTags::Password")]
    async fn change(
        &self,
        req: &Request,
        auth: BearerAuth,
        body: Json<ChangePasswordRequest>,
    ) -> Result<ChangePasswordApiResponse, ApiError> {
        let authed = authorize(&self.data, req, &auth, Role::Guest).await?;
        validate_password(&body.new_password).map_err(ApiError::validation)?;

        self.data
            .password_service
            .change_password(authed.user.clone(), &body.current_password, &body.new_password)
            .await?;

        Ok(ChangePasswordApiResponse::Ok(
            Json(MessageBody {
                success: true,
                message: "Password updated".to_string(),
            }),
            authed.new_access_token.clone(),
            authed.new_refresh_token.clone(),
            authed.permissions_header(),
        ))
    }

    /// Start the forgotten-password flow for an email address
    ///
    /// The one-time reset token is returned in the body and, when SMTP is
    /// configured, also delivered by email.
    #[oai(path = "/forgot", method = "post", tag = "PasswordTags::Password")]
    async fn forgot(
        &self,
        body: Json<ForgotPasswordRequest>,
    ) -> Result<ForgotPasswordApiResponse, ApiError> {
        if self.data.config.maintenance_mode {
            return Err(ApiError::maintenance());
        }
        validate_email(&body.email).map_err(ApiError::validation)?;

        let reset_token = self
            .data
            .password_service
            .forgot_password(&body.email)
            .await
            .map_err(|e| match e {
                CoreError::NotFound(_) => ApiError::invalid_email(),
                other => other.into(),
            })?;

        Ok(ForgotPasswordApiResponse::Ok(Json(ForgotPasswordBody {
            success: true,
            message: "Password reset requested".to_string(),
            body: ResetTokenBody { reset_token },
        })))
    }

    /// Complete a reset using the x-reset-token header
    #[oai(path = "/reset", method = "post", tag = "PasswordTags::Password")]
    async fn reset(
        &self,
        req: &Request,
        body: Json<ResetPasswordRequest>,
    ) -> Result<ResetPasswordApiResponse, ApiError> {
        if self.data.config.maintenance_mode {
            return Err(ApiError::maintenance());
        }

        let reset_token = req.header("x-reset-token").ok_or_else(ApiError::no_token)?;
        validate_password(&body.new_password).map_err(ApiError::validation)?;

        self.data
            .password_service
            .reset_password(reset_token, &body.new_password)
            .await?;

        Ok(ResetPasswordApiResponse::Ok(Json(MessageBody {
            success: true,
            message: "Password reset".to_string(),
        })))
    }
}

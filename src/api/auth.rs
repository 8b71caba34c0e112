use std::sync::Arc;

use poem::Request;
use poem_openapi::{payload::Json, OpenApi, Tags};

use crate::api::{authorize_without_session, extract_device_info, extract_ip_address, BearerAuth};
use crate::app_data::AppData;
use crate::errors::ApiError;
use crate::types::dto::auth::{LoginApiResponse, LoginBody, LoginRequest, LogoutApiResponse, TokenPair};
use crate::types::dto::common::MessageBody;

/// Session API: login and logout
pub struct AuthApi {
    data: Arc<AppData>,
}

impl AuthApi {
    pub fn new(data: Arc<AppData>) -> Self {
        Self { data }
    }
}

#[derive(Tags)]
enum SessionTags {
    /// Session endpoints
    Session,
}

#[OpenApi(prefix_path = "/session")]
impl AuthApi {
    /// Log in with email and password to receive an access/refresh token pair
    #[oai(path = "/login", method = "post", tag = "SessionTags::Session")]
    async fn login(
        &self,
        req: &Request,
        body: Json<LoginRequest>,
    ) -> Result<LoginApiResponse, ApiError> {
        if self.data.config.maintenance_mode {
            return Err(ApiError::maintenance());
        }

        let ip_address = extract_ip_address(req);
        let device_info = extract_device_info(req);

        let outcome = self
            .data
            .auth_service
            .authenticate(&body.email, &body.password, ip_address, device_info)
            .await?;

        Ok(LoginApiResponse::Ok(Json(LoginBody {
            success: true,
            message: "Login successful".to_string(),
            body: TokenPair {
                token: outcome.access_token,
                refresh_token: outcome.refresh_token,
            },
        })))
    }

    /// Destroy the session behind the presented access token
    ///
    /// Responds 404 rather than 401 when no session matches, so a client that
    /// already logged out can tell the difference from a bad token.
    #[oai(path = "/logout", method = "post", tag = "SessionTags::Session")]
    async fn logout(
        &self,
        req: &Request,
        auth: BearerAuth,
    ) -> Result<LogoutApiResponse, ApiError> {
        authorize_without_session(&self.data, req, &auth).await?;

        self.data.auth_service.logout(&auth.0.token).await?;

        Ok(LogoutApiResponse::Ok(Json(MessageBody {
            success: true,
            message: "Logged out".to_string(),
        })))
    }
}

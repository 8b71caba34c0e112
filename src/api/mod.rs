// API layer - HTTP endpoints
pub mod auth;
pub mod health;
pub mod password;
pub mod users;

pub use auth::AuthApi;
pub use health::HealthApi;
pub use password::PasswordApi;
pub use users::UserApi;

use poem::Request;
use poem_openapi::auth::Bearer;
use poem_openapi::SecurityScheme;

use crate::app_data::AppData;
use crate::errors::ApiError;
use crate::services::TokenCheck;
use crate::types::db::user;
use crate::types::internal::Role;

/// JWT Bearer token authentication
#[derive(SecurityScheme)]
#[oai(
    ty = "bearer",
    key_name = "Authorization",
    key_in = "header",
    bearer_format = "JWT"
)]
pub struct BearerAuth(pub Bearer);

/// An authenticated, session-backed request. Role comes from the user row
/// fetched during the guard pass, never from the token payload.
pub struct AuthedRequest {
    pub user: user::Model,
    pub role: Role,
    /// Present when the guard silently renewed an expired access token.
    pub new_access_token: Option<String>,
    /// Present when the guard silently renewed an expired access token.
    pub new_refresh_token: Option<String>,
}

impl AuthedRequest {
    /// Value for the x-user-permissions response header.
    pub fn permissions_header(&self) -> String {
        self.role.id().to_string()
    }
}

/// Token-level authentication: maintenance gate, token verification with
/// silent renewal, user fetch, and block check. No session requirement; the
/// logout path uses this directly so a missing session can surface as 404.
async fn authenticate_token(
    data: &AppData,
    req: &Request,
    auth: &BearerAuth,
) -> Result<(user::Model, Role, Option<(String, String)>), ApiError> {
    if data.config.maintenance_mode {
        return Err(ApiError::maintenance());
    }

    let access_token = auth.0.token.as_str();
    if access_token.is_empty() {
        return Err(ApiError::no_token());
    }

    let refresh_token = req.header("x-refresh-token").map(str::to_string);
    let check = data
        .token_service
        .verify_or_renew(access_token, refresh_token.as_deref())
        .map_err(|_| ApiError::invalid_token())?;

    let (token_user, renewed_pair) = match check {
        TokenCheck::Valid(token_user) => (token_user, None),
        TokenCheck::Renewed {
            user,
            access_token,
            refresh_token,
        } => (user, Some((access_token, refresh_token))),
    };

    // The token only identifies the account; everything else is re-resolved
    // from the current record so a stale token cannot outlive a downgrade.
    let user = data
        .user_store
        .find_by_id(token_user.id)
        .await
        .map_err(|_| ApiError::internal())?
        .ok_or_else(ApiError::invalid_token)?;

    if user.is_blocked {
        return Err(ApiError::blocked());
    }

    let role = Role::from_id(user.role_id).ok_or_else(ApiError::invalid_token)?;

    Ok((user, role, renewed_pair))
}

/// The full request guard: token authentication, active-session check,
/// minimum-role gate, and persistence of any token rotation. Runs once per
/// protected endpoint.
pub async fn authorize(
    data: &AppData,
    req: &Request,
    auth: &BearerAuth,
    min_role: Role,
) -> Result<AuthedRequest, ApiError> {
    let (user, role, renewed_pair) = authenticate_token(data, req, auth).await?;

    let session = data
        .session_store
        .find_active(user.id, &auth.0.token)
        .await
        .map_err(|_| ApiError::internal())?
        .ok_or_else(ApiError::session_unauthenticated)?;

    if !role.satisfies(min_role) {
        return Err(ApiError::forbidden());
    }

    // Persist the rotation only after the request is fully authorized, so a
    // denied request leaves the stored pair untouched.
    let (new_access_token, new_refresh_token) = match renewed_pair {
        Some((access, refresh)) => {
            data.session_store
                .update_tokens(session, access.clone(), refresh.clone())
                .await
                .map_err(|_| ApiError::internal())?;
            (Some(access), Some(refresh))
        }
        None => (None, None),
    };

    Ok(AuthedRequest {
        user,
        role,
        new_access_token,
        new_refresh_token,
    })
}

/// Token authentication without the session requirement; see
/// `authenticate_token`.
pub async fn authorize_without_session(
    data: &AppData,
    req: &Request,
    auth: &BearerAuth,
) -> Result<(user::Model, Role), ApiError> {
    let (user, role, _renewed) = authenticate_token(data, req, auth).await?;
    Ok((user, role))
}

/// Client address, preferring proxy headers over the socket peer.
pub fn extract_ip_address(req: &Request) -> Option<String> {
    if let Some(forwarded) = req.header("X-Forwarded-For") {
        if let Some(ip) = forwarded.split(',').next() {
            let ip = ip.trim();
            if !ip.is_empty() {
                return Some(ip.to_string());
            }
        }
    }

    if let Some(real_ip) = req.header("X-Real-IP") {
        return Some(real_ip.to_string());
    }

    req.remote_addr()
        .as_socket_addr()
        .map(|addr| addr.ip().to_string())
}

pub fn extract_device_info(req: &Request) -> Option<String> {
    req.header("User-Agent").map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AppConfig, TokenSettings};
    use crate::services::TokenService;
    use crate::stores::user_store::{NewUser, UserChanges};
    use crate::types::internal::TokenUser;
    use migration::{Migrator, MigratorTrait};
    use sea_orm::Database;

    const TEST_COST: u32 = 4;

    fn token_settings() -> TokenSettings {
        TokenSettings {
            access_secret: "access-secret-a".to_string(),
            refresh_secret: "refresh-secret-b".to_string(),
            reset_secret: "reset-secret-c".to_string(),
            access_ttl_secs: 3600,
            refresh_ttl_secs: 7200,
            reset_ttl_secs: 3600,
        }
    }

    async fn setup(maintenance_mode: bool) -> AppData {
        let db = Database::connect("sqlite::memory:")
            .await
            .expect("Failed to create test database");
        Migrator::up(&db, None)
            .await
            .expect("Failed to run migrations");

        let config = AppConfig {
            database_url: "sqlite::memory:".to_string(),
            listen_addr: "127.0.0.1:0".to_string(),
            tokens: token_settings(),
            bcrypt_cost: TEST_COST,
            maintenance_mode,
            smtp: None,
        };
        AppData::init(config, db).expect("Failed to build app data")
    }

    async fn seed_user(data: &AppData, email: &str, role_id: i32, blocked: bool) -> user::Model {
        let created = data
            .user_store
            .insert(NewUser {
                email: email.to_string(),
                password_hash: bcrypt::hash("Abcd1234", TEST_COST).unwrap(),
                first_name: "Guard".to_string(),
                last_name: "Tester".to_string(),
                role_id,
                created_by: None,
            })
            .await
            .unwrap();

        if blocked {
            data.user_store
                .update(
                    created,
                    UserChanges {
                        is_blocked: Some(true),
                        ..Default::default()
                    },
                    1,
                )
                .await
                .unwrap()
        } else {
            created
        }
    }

    /// Issue a pair and store it as this user's session for a fixed device.
    async fn open_session(data: &AppData, user: &user::Model) -> (String, String) {
        let token_user = TokenUser {
            id: user.id,
            display_name: user.display_name().to_string(),
        };
        let access = data.token_service.issue_access(&token_user).unwrap();
        let refresh = data.token_service.issue_refresh(&token_user).unwrap();
        data.session_store
            .replace_for_device(user.id, "1.2.3.4", "UA-X", access.clone(), refresh.clone())
            .await
            .unwrap();
        (access, refresh)
    }

    fn bearer(token: &str) -> BearerAuth {
        BearerAuth(poem_openapi::auth::Bearer {
            token: token.to_string(),
        })
    }

    fn request_with_refresh(refresh: Option<&str>) -> Request {
        let builder = Request::builder();
        match refresh {
            Some(r) => builder.header("x-refresh-token", r).finish(),
            None => builder.finish(),
        }
    }

    /// Genuine tokens already expired when checked against the real service.
    fn expired_access_for(user: &user::Model) -> String {
        TokenService::new(TokenSettings {
            access_ttl_secs: -120,
            ..token_settings()
        })
        .issue_access(&TokenUser {
            id: user.id,
            display_name: user.display_name().to_string(),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn maintenance_mode_rejects_before_anything_else() {
        let data = setup(true).await;
        let user = seed_user(&data, "maint@example.com", 1, false).await;
        let (access, _) = open_session(&data, &user).await;

        let result = authorize(&data, &request_with_refresh(None), &bearer(&access), Role::Guest)
            .await;
        assert!(matches!(result, Err(ApiError::Maintenance(..))));
    }

    #[tokio::test]
    async fn valid_token_with_session_passes_without_renewal() {
        let data = setup(false).await;
        let user = seed_user(&data, "ok@example.com", 2, false).await;
        let (access, _) = open_session(&data, &user).await;

        let authed = authorize(&data, &request_with_refresh(None), &bearer(&access), Role::Guest)
            .await
            .unwrap();

        assert_eq!(authed.user.id, user.id);
        assert_eq!(authed.role, Role::Admin);
        assert_eq!(authed.permissions_header(), "2");
        assert!(authed.new_access_token.is_none());
        assert!(authed.new_refresh_token.is_none());
    }

    #[tokio::test]
    async fn empty_token_is_rejected_outright() {
        let data = setup(false).await;

        let result =
            authorize(&data, &request_with_refresh(None), &bearer(""), Role::Guest).await;
        assert!(matches!(result, Err(ApiError::Unauthenticated(_))));
    }

    #[tokio::test]
    async fn valid_token_without_a_session_is_unauthenticated() {
        let data = setup(false).await;
        let user = seed_user(&data, "nosession@example.com", 3, false).await;

        // A genuine token whose session was never opened (or was destroyed).
        let access = data
            .token_service
            .issue_access(&TokenUser {
                id: user.id,
                display_name: user.display_name().to_string(),
            })
            .unwrap();

        let result = authorize(&data, &request_with_refresh(None), &bearer(&access), Role::Guest)
            .await;
        assert!(matches!(result, Err(ApiError::Unauthenticated(_))));
    }

    #[tokio::test]
    async fn blocked_users_are_turned_away_with_valid_tokens() {
        let data = setup(false).await;
        let user = seed_user(&data, "blocked@example.com", 3, true).await;
        let (access, _) = open_session(&data, &user).await;

        let result = authorize(&data, &request_with_refresh(None), &bearer(&access), Role::Guest)
            .await;
        assert!(matches!(result, Err(ApiError::Unauthenticated(_))));
    }

    #[tokio::test]
    async fn insufficient_role_is_forbidden() {
        let data = setup(false).await;
        let user = seed_user(&data, "guest@example.com", 3, false).await;
        let (access, _) = open_session(&data, &user).await;

        let result = authorize(&data, &request_with_refresh(None), &bearer(&access), Role::Admin)
            .await;
        assert!(matches!(result, Err(ApiError::Forbidden(_))));
    }

    #[tokio::test]
    async fn expired_access_renews_and_persists_the_rotation() {
        let data = setup(false).await;
        let user = seed_user(&data, "renew@example.com", 3, false).await;

        let expired = expired_access_for(&user);
        let refresh = data
            .token_service
            .issue_refresh(&TokenUser {
                id: user.id,
                display_name: user.display_name().to_string(),
            })
            .unwrap();
        // The stored session is keyed on the expired access token, the way a
        // client that went idle past the lifetime would present it.
        data.session_store
            .replace_for_device(user.id, "1.2.3.4", "UA-X", expired.clone(), refresh.clone())
            .await
            .unwrap();

        let authed = authorize(
            &data,
            &request_with_refresh(Some(&refresh)),
            &bearer(&expired),
            Role::Guest,
        )
        .await
        .unwrap();

        let new_access = authed.new_access_token.expect("renewal should issue a pair");
        assert!(authed.new_refresh_token.is_some());
        assert!(data
            .session_store
            .find_active(user.id, &new_access)
            .await
            .unwrap()
            .is_some());
        assert!(data
            .session_store
            .find_active(user.id, &expired)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn a_denied_request_never_rotates_the_stored_pair() {
        let data = setup(false).await;
        let user = seed_user(&data, "denied@example.com", 3, false).await;

        let expired = expired_access_for(&user);
        let refresh = data
            .token_service
            .issue_refresh(&TokenUser {
                id: user.id,
                display_name: user.display_name().to_string(),
            })
            .unwrap();
        data.session_store
            .replace_for_device(user.id, "1.2.3.4", "UA-X", expired.clone(), refresh.clone())
            .await
            .unwrap();

        // Renewal would fire, but the role gate denies the request first.
        let result = authorize(
            &data,
            &request_with_refresh(Some(&refresh)),
            &bearer(&expired),
            Role::Admin,
        )
        .await;
        assert!(matches!(result, Err(ApiError::Forbidden(_))));

        // The stored pair is untouched; the client can retry elsewhere.
        assert!(data
            .session_store
            .find_active(user.id, &expired)
            .await
            .unwrap()
            .is_some());
    }
}

use std::sync::Arc;

use crate::errors::{CoreError, InternalError};
use crate::services::token_service::TokenService;
use crate::stores::{SessionStore, UserStore};
use crate::types::db::user;
use crate::types::internal::TokenUser;

/// Placeholder for requests that carry no usable client address or agent.
const UNKNOWN: &str = "Unknown";

/// A successful login: the account plus its freshly issued token pair. The
/// matching session row is already in place when this is returned.
pub struct AuthenticatedSession {
    pub user: user::Model,
    pub access_token: String,
    pub refresh_token: String,
}

/// Login and logout. Token issuance is delegated to `TokenService`; this
/// service owns the credential check and the session bookkeeping around it.
pub struct AuthService {
    users: Arc<UserStore>,
    sessions: Arc<SessionStore>,
    tokens: Arc<TokenService>,
}

impl AuthService {
    pub fn new(
        users: Arc<UserStore>,
        sessions: Arc<SessionStore>,
        tokens: Arc<TokenService>,
    ) -> Self {
        Self {
            users,
            sessions,
            tokens,
        }
    }

    /// Verify credentials, issue a token pair, and replace any prior session
    /// for this (user, ip, device) triple.
    ///
    /// Unknown email and wrong password both come back as
    /// `InvalidCredentials`, so a caller cannot probe which emails exist.
    pub async fn authenticate(
        &self,
        email: &str,
        password: &str,
        ip_address: Option<String>,
        device_info: Option<String>,
    ) -> Result<AuthenticatedSession, CoreError> {
        let user = self
            .users
            .find_by_email(email)
            .await?
            .ok_or(CoreError::InvalidCredentials)?;

        let password_matches = bcrypt::verify(password, &user.password)
            .map_err(|e| InternalError::crypto("verify_password", e.to_string()))?;
        if !password_matches {
            return Err(CoreError::InvalidCredentials);
        }

        // Blocked accounts still authenticate; the request guard is the
        // single place the block is enforced, so every authed route rejects
        // them uniformly.
        let token_user = TokenUser {
            id: user.id,
            display_name: user.display_name().to_string(),
        };
        let access_token = self.tokens.issue_access(&token_user)?;
        let refresh_token = self.tokens.issue_refresh(&token_user)?;

        let ip = ip_address.unwrap_or_else(|| UNKNOWN.to_string());
        let device = device_info.unwrap_or_else(|| UNKNOWN.to_string());
        self.sessions
            .replace_for_device(
                user.id,
                &ip,
                &device,
                access_token.clone(),
                refresh_token.clone(),
            )
            .await?;

        Ok(AuthenticatedSession {
            user,
            access_token,
            refresh_token,
        })
    }

    /// Destroy the session matching this access token.
    pub async fn logout(&self, access_token: &str) -> Result<(), CoreError> {
        let session = self
            .sessions
            .find_by_access_token(access_token)
            .await?
            .ok_or(CoreError::SessionNotFound)?;

        self.sessions.destroy(session).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TokenSettings;
    use crate::stores::user_store::NewUser;
    use migration::{Migrator, MigratorTrait};
    use sea_orm::Database;

    // Minimum cost keeps hashing fast in tests.
    const TEST_COST: u32 = 4;

    async fn setup() -> (AuthService, Arc<UserStore>, Arc<SessionStore>) {
        let db = Database::connect("sqlite::memory:")
            .await
            .expect("Failed to create test database");
        Migrator::up(&db, None)
            .await
            .expect("Failed to run migrations");

        let users = Arc::new(UserStore::new(db.clone()));
        let sessions = Arc::new(SessionStore::new(db));
        let tokens = Arc::new(TokenService::new(TokenSettings {
            access_secret: "access-secret-a".to_string(),
            refresh_secret: "refresh-secret-b".to_string(),
            reset_secret: "reset-secret-c".to_string(),
            access_ttl_secs: 3600,
            refresh_ttl_secs: 7200,
            reset_ttl_secs: 3600,
        }));

        let service = AuthService::new(users.clone(), sessions.clone(), tokens);
        (service, users, sessions)
    }

    async fn insert_user(users: &UserStore, email: &str, password: &str) -> user::Model {
        users
            .insert(NewUser {
                email: email.to_string(),
                password_hash: bcrypt::hash(password, TEST_COST).unwrap(),
                first_name: "Auth".to_string(),
                last_name: "Tester".to_string(),
                role_id: 3,
                created_by: None,
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn valid_credentials_yield_tokens_and_a_session() {
        let (service, users, sessions) = setup().await;
        let user = insert_user(&users, "login@example.com", "Abcd1234").await;

        let outcome = service
            .authenticate(
                "login@example.com",
                "Abcd1234",
                Some("1.2.3.4".to_string()),
                Some("UA-X".to_string()),
            )
            .await
            .unwrap();

        assert_eq!(outcome.user.id, user.id);
        let session = sessions
            .find_active(user.id, &outcome.access_token)
            .await
            .unwrap()
            .expect("session should exist after login");
        assert_eq!(session.refresh_token, outcome.refresh_token);
    }

    #[tokio::test]
    async fn unknown_email_and_wrong_password_are_indistinguishable() {
        let (service, users, _sessions) = setup().await;
        insert_user(&users, "known@example.com", "Abcd1234").await;

        let unknown = service
            .authenticate("nobody@example.com", "Abcd1234", None, None)
            .await;
        let wrong = service
            .authenticate("known@example.com", "WrongPass1", None, None)
            .await;

        assert!(matches!(unknown, Err(CoreError::InvalidCredentials)));
        assert!(matches!(wrong, Err(CoreError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn blocked_accounts_still_authenticate() {
        let (service, users, sessions) = setup().await;
        let user = insert_user(&users, "blocked@example.com", "Abcd1234").await;
        users
            .update(
                user.clone(),
                crate::stores::user_store::UserChanges {
                    is_blocked: Some(true),
                    ..Default::default()
                },
                1,
            )
            .await
            .unwrap();

        // The block is enforced by the request guard, not at login; the
        // credential check itself still succeeds and opens a session.
        let outcome = service
            .authenticate("blocked@example.com", "Abcd1234", None, None)
            .await
            .unwrap();
        assert!(sessions
            .find_active(user.id, &outcome.access_token)
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn missing_client_details_fall_back_to_a_shared_placeholder() {
        let (service, users, sessions) = setup().await;
        let user = insert_user(&users, "bare@example.com", "Abcd1234").await;

        // Two logins with no ip/device must land on the same placeholder
        // triple and therefore replace each other.
        service
            .authenticate("bare@example.com", "Abcd1234", None, None)
            .await
            .unwrap();
        let second = service
            .authenticate("bare@example.com", "Abcd1234", None, None)
            .await
            .unwrap();

        let rows = sessions
            .find_by_device(user.id, UNKNOWN, UNKNOWN)
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].access_token, second.access_token);
    }

    #[tokio::test]
    async fn logout_destroys_the_session_once() {
        let (service, users, _sessions) = setup().await;
        insert_user(&users, "out@example.com", "Abcd1234").await;

        let outcome = service
            .authenticate("out@example.com", "Abcd1234", None, None)
            .await
            .unwrap();

        service.logout(&outcome.access_token).await.unwrap();
        assert!(matches!(
            service.logout(&outcome.access_token).await,
            Err(CoreError::SessionNotFound)
        ));
    }
}

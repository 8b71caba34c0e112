// Common test utilities for integration tests

use std::sync::Arc;

use migration::{Migrator, MigratorTrait};
use sea_orm::{Database, DatabaseConnection};

use rolegate_backend::config::TokenSettings;
use rolegate_backend::services::{
    AuthService, LogMailer, PasswordService, TokenService, UserService,
};
use rolegate_backend::stores::{SessionStore, UserStore};

/// Minimum bcrypt cost keeps the suite fast.
pub const TEST_COST: u32 = 4;

pub fn test_token_settings() -> TokenSettings {
    TokenSettings {
        access_secret: "integration-access-secret".to_string(),
        refresh_secret: "integration-refresh-secret".to_string(),
        reset_secret: "integration-reset-secret".to_string(),
        access_ttl_secs: 3600,
        refresh_ttl_secs: 7200,
        reset_ttl_secs: 3600,
    }
}

/// The full service stack over one in-memory database.
pub struct TestHarness {
    pub db: DatabaseConnection,
    pub users: Arc<UserStore>,
    pub sessions: Arc<SessionStore>,
    pub tokens: Arc<TokenService>,
    pub auth: AuthService,
    pub passwords: PasswordService,
    pub user_service: UserService,
}

/// Creates a migrated test database and wires every service against it.
pub async fn setup() -> TestHarness {
    let db = Database::connect("sqlite::memory:")
        .await
        .expect("Failed to create test database");

    Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");

    let users = Arc::new(UserStore::new(db.clone()));
    let sessions = Arc::new(SessionStore::new(db.clone()));
    let tokens = Arc::new(TokenService::new(test_token_settings()));

    let auth = AuthService::new(users.clone(), sessions.clone(), tokens.clone());
    let passwords = PasswordService::new(
        users.clone(),
        tokens.clone(),
        Arc::new(LogMailer),
        TEST_COST,
    );
    let user_service = UserService::new(users.clone(), TEST_COST);

    TestHarness {
        db,
        users,
        sessions,
        tokens,
        auth,
        passwords,
        user_service,
    }
}

use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::config::AppConfig;
use crate::errors::InternalError;
use crate::services::{
    AuthService, LogMailer, Mailer, PasswordService, SmtpMailer, TokenService, UserService,
};
use crate::stores::{SessionStore, UserStore};

/// Centralized application data, created once in main and shared by every
/// API struct. Stores are built first, then the services that borrow them.
pub struct AppData {
    pub config: AppConfig,
    pub db: DatabaseConnection,
    pub user_store: Arc<UserStore>,
    pub session_store: Arc<SessionStore>,
    pub token_service: Arc<TokenService>,
    pub auth_service: AuthService,
    pub password_service: PasswordService,
    pub user_service: UserService,
}

impl AppData {
    pub fn init(config: AppConfig, db: DatabaseConnection) -> Result<Self, InternalError> {
        let user_store = Arc::new(UserStore::new(db.clone()));
        let session_store = Arc::new(SessionStore::new(db.clone()));
        let token_service = Arc::new(TokenService::new(config.tokens.clone()));

        let mailer: Arc<dyn Mailer> = match &config.smtp {
            Some(smtp) => Arc::new(SmtpMailer::new(smtp)?),
            None => {
                tracing::warn!("SMTP not configured; reset emails will be logged, not sent");
                Arc::new(LogMailer)
            }
        };

        let auth_service = AuthService::new(
            user_store.clone(),
            session_store.clone(),
            token_service.clone(),
        );
        let password_service = PasswordService::new(
            user_store.clone(),
            token_service.clone(),
            mailer,
            config.bcrypt_cost,
        );
        let user_service = UserService::new(user_store.clone(), config.bcrypt_cost);

        Ok(Self {
            config,
            db,
            user_store,
            session_store,
            token_service,
            auth_service,
            password_service,
            user_service,
        })
    }
}

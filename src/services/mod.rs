// Services layer - Business logic
pub mod auth_service;
pub mod mailer;
pub mod password_policy;
pub mod password_service;
pub mod permissions;
pub mod token_service;
pub mod user_service;

pub use auth_service::AuthService;
pub use mailer::{LogMailer, Mailer, SmtpMailer};
pub use password_service::PasswordService;
pub use token_service::{TokenCheck, TokenClass, TokenService};
pub use user_service::UserService;

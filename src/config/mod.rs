mod database;
mod logging;
mod settings;

pub use database::init_database;
pub use logging::init_logging;
pub use settings::{AppConfig, ConfigError, SmtpSettings, TokenSettings};

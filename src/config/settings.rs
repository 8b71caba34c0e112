use std::env;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVariable(&'static str),

    #[error("Invalid value for {variable}: {message}")]
    InvalidValue {
        variable: &'static str,
        message: String,
    },
}

/// Secrets and lifetimes for the three token classes.
///
/// The secrets must differ: a reset token must never verify as an access
/// token. Lifetimes default to 1h access, 2h refresh, 1h reset.
#[derive(Debug, Clone)]
pub struct TokenSettings {
    pub access_secret: String,
    pub refresh_secret: String,
    pub reset_secret: String,
    pub access_ttl_secs: i64,
    pub refresh_ttl_secs: i64,
    pub reset_ttl_secs: i64,
}

impl TokenSettings {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            access_secret: require("JWT_SECRET")?,
            refresh_secret: require("JWT_REFRESH_SECRET")?,
            reset_secret: require("JWT_RESET_PASSWORD_SECRET")?,
            access_ttl_secs: parse_or("ACCESS_TOKEN_TTL_SECS", 3600)?,
            refresh_ttl_secs: parse_or("REFRESH_TOKEN_TTL_SECS", 7200)?,
            reset_ttl_secs: parse_or("RESET_TOKEN_TTL_SECS", 3600)?,
        })
    }
}

/// SMTP transport parameters for reset-password mail.
/// When absent, mail dispatch degrades to log-only.
#[derive(Debug, Clone)]
pub struct SmtpSettings {
    pub host: String,
    pub username: String,
    pub password: String,
    pub from_address: String,
}

impl SmtpSettings {
    fn from_env() -> Option<Self> {
        Some(Self {
            host: env::var("SMTP_HOST").ok()?,
            username: env::var("SMTP_USERNAME").ok()?,
            password: env::var("SMTP_PASSWORD").ok()?,
            from_address: env::var("SMTP_FROM").ok()?,
        })
    }
}

/// Application configuration, loaded once at startup.
///
/// Maintenance mode lives here rather than in mutable global state; the
/// request guard reads it once per request at the authorization boundary.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub listen_addr: String,
    pub tokens: TokenSettings,
    pub bcrypt_cost: u32,
    pub maintenance_mode: bool,
    pub smtp: Option<SmtpSettings>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://rolegate.db?mode=rwc".to_string()),
            listen_addr: env::var("LISTEN_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string()),
            tokens: TokenSettings::from_env()?,
            bcrypt_cost: parse_or("BCRYPT_COST", 10)?,
            maintenance_mode: env::var("MAINTENANCE_MODE")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(false),
            smtp: SmtpSettings::from_env(),
        })
    }
}

fn require(variable: &'static str) -> Result<String, ConfigError> {
    env::var(variable).map_err(|_| ConfigError::MissingVariable(variable))
}

fn parse_or<T: std::str::FromStr>(variable: &'static str, default: T) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match env::var(variable) {
        Ok(raw) => raw.parse().map_err(|e: T::Err| ConfigError::InvalidValue {
            variable,
            message: e.to_string(),
        }),
        Err(_) => Ok(default),
    }
}

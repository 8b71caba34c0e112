use thiserror::Error;

/// Internal error type for store and service operations.
///
/// Not exposed through the API: endpoints convert these to a generic 500
/// response. The original error detail is logged exactly once, at the moment
/// the error is wrapped by one of the constructor helpers below; layers above
/// only propagate the already-logged value.
#[derive(Error, Debug)]
pub enum InternalError {
    /// Database query or operation failed
    #[error("Database error: {operation} failed: {source}")]
    Database {
        operation: String,
        #[source]
        source: sea_orm::DbErr,
    },

    /// Database transaction failed
    #[error("Transaction error: {operation} failed: {source}")]
    Transaction {
        operation: String,
        #[source]
        source: sea_orm::DbErr,
    },

    /// Password hashing or verification failed
    #[error("Crypto error: {operation} failed: {message}")]
    Crypto { operation: String, message: String },

    /// Token signing failed (verification failures are domain errors, not this)
    #[error("Token error: {operation} failed: {message}")]
    Token { operation: String, message: String },

    /// Mail transport failed
    #[error("Mail error: {operation} failed: {message}")]
    Mail { operation: String, message: String },
}

impl InternalError {
    /// Wrap a database error, tagging the failing operation
    pub fn database(operation: impl Into<String>, source: sea_orm::DbErr) -> Self {
        let operation = operation.into();
        tracing::error!(operation = %operation, error = %source, "database operation failed");
        Self::Database { operation, source }
    }

    /// Wrap a transaction error, tagging the failing operation
    pub fn transaction(operation: impl Into<String>, source: sea_orm::DbErr) -> Self {
        let operation = operation.into();
        tracing::error!(operation = %operation, error = %source, "transaction failed");
        Self::Transaction { operation, source }
    }

    /// Wrap a hashing failure, tagging the failing operation
    pub fn crypto(operation: impl Into<String>, message: impl Into<String>) -> Self {
        let operation = operation.into();
        let message = message.into();
        tracing::error!(operation = %operation, error = %message, "crypto operation failed");
        Self::Crypto { operation, message }
    }

    /// Wrap a token-signing failure, tagging the failing operation
    pub fn token(operation: impl Into<String>, message: impl Into<String>) -> Self {
        let operation = operation.into();
        let message = message.into();
        tracing::error!(operation = %operation, error = %message, "token operation failed");
        Self::Token { operation, message }
    }

    /// Wrap a mail-transport failure, tagging the failing operation
    pub fn mail(operation: impl Into<String>, message: impl Into<String>) -> Self {
        let operation = operation.into();
        let message = message.into();
        tracing::error!(operation = %operation, error = %message, "mail dispatch failed");
        Self::Mail { operation, message }
    }
}

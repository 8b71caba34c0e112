use serde::{Deserialize, Serialize};

/// JWT payload shared by all three token classes.
///
/// Deliberately carries only the user id and display name. Role and
/// permission data never ride in a token; they are re-fetched from the user
/// record on every request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id.
    pub sub: i32,
    /// Display name (first name).
    pub name: String,
    /// Expiration (unix seconds).
    pub exp: i64,
    /// Issued at (unix seconds).
    pub iat: i64,
    /// Token id. Timestamps are whole seconds, so this nonce is what keeps
    /// two tokens issued in the same second from colliding.
    pub jti: String,
}

/// The identity recovered from a verified token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenUser {
    pub id: i32,
    pub display_name: String,
}

impl From<Claims> for TokenUser {
    fn from(claims: Claims) -> Self {
        Self {
            id: claims.sub,
            display_name: claims.name,
        }
    }
}

use chrono::Utc;
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};

use crate::config::TokenSettings;
use crate::errors::{CoreError, InternalError};
use crate::types::internal::{Claims, TokenUser};

/// The three token classes. Each is signed with its own secret, so a token
/// of one class never verifies as another.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenClass {
    Access,
    Refresh,
    Reset,
}

/// Outcome of the single verify-then-maybe-renew pass.
#[derive(Debug)]
pub enum TokenCheck {
    /// Access token verified; proceed as-is.
    Valid(TokenUser),
    /// Access token expired but the refresh token verified; a fresh pair was
    /// issued. The caller persists the rotation and surfaces the new tokens.
    Renewed {
        user: TokenUser,
        access_token: String,
        refresh_token: String,
    },
}

/// Signs and verifies access, refresh, and reset tokens.
pub struct TokenService {
    settings: TokenSettings,
}

impl TokenService {
    pub fn new(settings: TokenSettings) -> Self {
        Self { settings }
    }

    pub fn issue_access(&self, user: &TokenUser) -> Result<String, InternalError> {
        self.sign(user, TokenClass::Access, self.ttl(TokenClass::Access))
    }

    pub fn issue_refresh(&self, user: &TokenUser) -> Result<String, InternalError> {
        self.sign(user, TokenClass::Refresh, self.ttl(TokenClass::Refresh))
    }

    pub fn issue_reset(&self, user: &TokenUser) -> Result<String, InternalError> {
        self.sign(user, TokenClass::Reset, self.ttl(TokenClass::Reset))
    }

    /// Verify a token against one class. Expired and malformed tokens are
    /// indistinguishable to the caller.
    pub fn verify(&self, token: &str, class: TokenClass) -> Result<TokenUser, CoreError> {
        self.decode_class(token, class)
            .map(TokenUser::from)
            .map_err(|_| CoreError::InvalidOrExpiredToken)
    }

    /// Single verify-then-maybe-renew pass.
    ///
    /// Renewal happens only when the access token failed with *expired*
    /// specifically and a refresh token is present and verifies. A renewed
    /// pair is never itself re-examined within the same request, so renewal
    /// cannot cascade.
    pub fn verify_or_renew(
        &self,
        access_token: &str,
        refresh_token: Option<&str>,
    ) -> Result<TokenCheck, CoreError> {
        match self.decode_class(access_token, TokenClass::Access) {
            Ok(claims) => Ok(TokenCheck::Valid(claims.into())),
            Err(e) if matches!(e.kind(), ErrorKind::ExpiredSignature) => {
                let refresh = refresh_token.ok_or(CoreError::InvalidOrExpiredToken)?;
                let claims = self
                    .decode_class(refresh, TokenClass::Refresh)
                    .map_err(|_| CoreError::InvalidOrExpiredToken)?;

                let user = TokenUser::from(claims);
                let access_token = self.issue_access(&user)?;
                let refresh_token = self.issue_refresh(&user)?;
                Ok(TokenCheck::Renewed {
                    user,
                    access_token,
                    refresh_token,
                })
            }
            Err(_) => Err(CoreError::InvalidOrExpiredToken),
        }
    }

    fn secret(&self, class: TokenClass) -> &str {
        match class {
            TokenClass::Access => &self.settings.access_secret,
            TokenClass::Refresh => &self.settings.refresh_secret,
            TokenClass::Reset => &self.settings.reset_secret,
        }
    }

    fn ttl(&self, class: TokenClass) -> i64 {
        match class {
            TokenClass::Access => self.settings.access_ttl_secs,
            TokenClass::Refresh => self.settings.refresh_ttl_secs,
            TokenClass::Reset => self.settings.reset_ttl_secs,
        }
    }

    fn sign(
        &self,
        user: &TokenUser,
        class: TokenClass,
        ttl_secs: i64,
    ) -> Result<String, InternalError> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: user.id,
            name: user.display_name.clone(),
            iat: now,
            exp: now + ttl_secs,
            jti: uuid::Uuid::new_v4().to_string(),
        };

        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.secret(class).as_bytes()),
        )
        .map_err(|e| InternalError::token("sign_token", e.to_string()))
    }

    fn decode_class(
        &self,
        token: &str,
        class: TokenClass,
    ) -> Result<Claims, jsonwebtoken::errors::Error> {
        let mut validation = Validation::new(Algorithm::HS256);
        // No leeway: renewal must kick in exactly when the token expires.
        validation.leeway = 0;

        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret(class).as_bytes()),
            &validation,
        )
        .map(|data| data.claims)
    }
}

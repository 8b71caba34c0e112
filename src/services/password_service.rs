use std::sync::Arc;

use crate::errors::{CoreError, InternalError};
use crate::services::mailer::Mailer;
use crate::services::token_service::{TokenClass, TokenService};
use crate::stores::UserStore;
use crate::types::db::user;
use crate::types::internal::TokenUser;

/// Password change and the two-step forgotten-password flow.
pub struct PasswordService {
    users: Arc<UserStore>,
    tokens: Arc<TokenService>,
    mailer: Arc<dyn Mailer>,
    bcrypt_cost: u32,
}

impl PasswordService {
    pub fn new(
        users: Arc<UserStore>,
        tokens: Arc<TokenService>,
        mailer: Arc<dyn Mailer>,
        bcrypt_cost: u32,
    ) -> Self {
        Self {
            users,
            tokens,
            mailer,
            bcrypt_cost,
        }
    }

    fn hash(&self, password: &str) -> Result<String, InternalError> {
        bcrypt::hash(password, self.bcrypt_cost)
            .map_err(|e| InternalError::crypto("hash_password", e.to_string()))
    }

    /// Change the caller's own password after re-proving the current one.
    pub async fn change_password(
        &self,
        user: user::Model,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), CoreError> {
        let current_matches = bcrypt::verify(current_password, &user.password)
            .map_err(|e| InternalError::crypto("verify_password", e.to_string()))?;
        if !current_matches {
            return Err(CoreError::InvalidCredentials);
        }

        let hash = self.hash(new_password)?;
        self.users.update_password(user, hash, false).await?;
        Ok(())
    }

    /// Issue a one-time reset token for the account behind this email, store
    /// it, and attempt delivery. Delivery failure does not void the token;
    /// the caller still receives it in the response body.
    pub async fn forgot_password(&self, email: &str) -> Result<String, CoreError> {
        let user = self
            .users
            .find_by_email(email)
            .await?
            .ok_or(CoreError::NotFound("user"))?;

        let token_user = TokenUser {
            id: user.id,
            display_name: user.display_name().to_string(),
        };
        let reset_token = self.tokens.issue_reset(&token_user)?;

        let email = user.email.clone();
        self.users
            .set_reset_token(user, reset_token.clone())
            .await?;

        if self
            .mailer
            .send_reset_email(&email, &reset_token)
            .await
            .is_err()
        {
            tracing::warn!(recipient = %email, "Reset email delivery failed; token remains usable");
        }

        Ok(reset_token)
    }

    /// Complete the reset: the token must verify against the reset secret,
    /// match the stored copy, and be unused. Consuming it marks it used so a
    /// replayed token is refused.
    pub async fn reset_password(
        &self,
        reset_token: &str,
        new_password: &str,
    ) -> Result<(), CoreError> {
        let token_user = self
            .tokens
            .verify(reset_token, TokenClass::Reset)
            .map_err(|_| CoreError::ResetTokenInvalid)?;

        let user = self
            .users
            .find_for_reset(token_user.id, reset_token)
            .await?
            .ok_or(CoreError::ResetTokenInvalid)?;

        let hash = self.hash(new_password)?;
        self.users.update_password(user, hash, true).await?;
        Ok(())
    }
}

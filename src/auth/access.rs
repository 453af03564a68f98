use std::sync::Arc;

use tracing::info;

use crate::api::error::ApiError;
use crate::auth::tokens::Tokens;
use crate::db::models::PublicUser;
use crate::db::users::UserStore;

/// Front door for everything identity-related: owns the credential store and
/// the token service, hands the HTTP layer tokens and verified identities.
#[derive(Clone)]
pub struct AccessController {
    users: Arc<dyn UserStore>,
    tokens: Tokens,
}

impl AccessController {
    pub fn new(users: Arc<dyn UserStore>, tokens: Tokens) -> Self {
        Self { users, tokens }
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<String, ApiError> {
        let user = self.users.authorize(username, password).await?;
        let token = self.tokens.issue(&user.public())?;
        info!(username, "user logged in");
        Ok(token)
    }

    /// Registers and immediately logs the new user in.
    pub async fn register(&self, username: &str, password: &str) -> Result<String, ApiError> {
        if username.is_empty() || password.is_empty() {
            return Err(ApiError::Validation("Bad request".to_string()));
        }

        let user = self.users.create(username, password).await?;
        let token = self.tokens.issue(&user.public())?;
        info!(username, "user registered");
        Ok(token)
    }

    /// Resolves the identity asserted by a request token.
    pub fn identify(&self, token: &str) -> Result<PublicUser, ApiError> {
        Ok(self.tokens.verify(token)?)
    }
}

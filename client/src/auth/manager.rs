//! Login, registration and token refresh flows.

use std::sync::Arc;

use crate::api::{AuthApi, Credentials, RegisterRequest, User};
use crate::error::{ClientError, Result};

use super::AuthSession;

/// Drives authentication against the remote API.
pub struct AuthManager {
    api: Arc<dyn AuthApi>,
    session: Arc<AuthSession>,
}

impl AuthManager {
    pub fn new(api: Arc<dyn AuthApi>, session: Arc<AuthSession>) -> Self {
        Self { api, session }
    }

    pub fn session(&self) -> &Arc<AuthSession> {
        &self.session
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<User> {
        let credentials = Credentials {
            email: email.to_string(),
            password: password.to_string(),
        };
        let response = self.api.login(&credentials).await?;

        tracing::info!(user_id = response.user.id, "Logged in");

        self.session
            .establish(response.tokens, Some(response.user.clone()))
            .await;
        Ok(response.user)
    }

    pub async fn register(&self, request: &RegisterRequest) -> Result<User> {
        let response = self.api.register(request).await?;

        tracing::info!(user_id = response.user.id, "Registered new account");

        self.session
            .establish(response.tokens, Some(response.user.clone()))
            .await;
        Ok(response.user)
    }

    /// Exchange the refresh token for a new token pair.
    ///
    /// A rejected refresh token ends the session.
    pub async fn refresh(&self) -> Result<()> {
        let refresh_token = self
            .session
            .refresh_token()
            .await
            .ok_or(ClientError::NotAuthenticated)?;

        match self.api.refresh_token(&refresh_token).await {
            Ok(tokens) => {
                self.session.update_tokens(tokens).await;
                tracing::debug!("Access token refreshed");
                Ok(())
            }
            Err(e) if e.is_unauthorized() => {
                tracing::warn!("Refresh token rejected, signing out");
                self.session.clear().await;
                Err(e)
            }
            Err(e) => Err(e),
        }
    }

    /// Sign out. The local session is cleared even if the server call fails.
    pub async fn logout(&self) {
        if self.session.is_authenticated().await {
            if let Err(e) = self.api.logout().await {
                tracing::warn!(error = %e, "Remote logout failed");
            }
        }
        self.session.clear().await;
        tracing::info!("Logged out");
    }

    /// Fetch the signed-in user and store it on the session.
    pub async fn load_current_user(&self) -> Result<User> {
        if !self.session.is_authenticated().await {
            return Err(ClientError::NotAuthenticated);
        }

        let user = self.api.get_current_user().await?;
        self.session.set_user(user.clone()).await;
        Ok(user)
    }
}

//! Shared authentication session.

use tokio::sync::RwLock;

use crate::api::{AuthTokens, User};

#[derive(Debug, Clone)]
struct SessionState {
    tokens: AuthTokens,
    user: Option<User>,
}

/// Tokens and current user of the signed-in account, if any.
///
/// Held in memory only; the session does not survive a restart.
#[derive(Debug, Default)]
pub struct AuthSession {
    state: RwLock<Option<SessionState>>,
}

impl AuthSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn is_authenticated(&self) -> bool {
        self.state.read().await.is_some()
    }

    pub async fn access_token(&self) -> Option<String> {
        self.state
            .read()
            .await
            .as_ref()
            .map(|s| s.tokens.access_token.clone())
    }

    pub async fn refresh_token(&self) -> Option<String> {
        self.state
            .read()
            .await
            .as_ref()
            .map(|s| s.tokens.refresh_token.clone())
    }

    pub async fn current_user(&self) -> Option<User> {
        self.state.read().await.as_ref().and_then(|s| s.user.clone())
    }

    /// Start a session, replacing any previous one.
    pub async fn establish(&self, tokens: AuthTokens, user: Option<User>) {
        *self.state.write().await = Some(SessionState { tokens, user });
    }

    /// Swap in refreshed tokens. Ignored when signed out.
    pub async fn update_tokens(&self, tokens: AuthTokens) {
        if let Some(state) = self.state.write().await.as_mut() {
            state.tokens = tokens;
        }
    }

    /// Record the current user. Ignored when signed out.
    pub async fn set_user(&self, user: User) {
        if let Some(state) = self.state.write().await.as_mut() {
            state.user = Some(user);
        }
    }

    pub async fn clear(&self) {
        *self.state.write().await = None;
    }
}

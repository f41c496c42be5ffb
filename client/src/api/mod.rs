//! Remote API boundary.
//!
//! Services depend on the [`KnowledgeApi`] and [`AuthApi`] traits rather than
//! on HTTP directly, so tests can substitute fakes. [`HttpApi`] is the real
//! implementation.

mod http;
mod types;

pub use http::*;
pub use types::*;

use crate::error::Result;
use async_trait::async_trait;
use lingo_engine::FinalizeRequest;

/// Knowledge point endpoints.
#[async_trait]
pub trait KnowledgeApi: Send + Sync {
    /// Turn error analyses into permanent knowledge points.
    ///
    /// Returns how many points the server saved.
    async fn finalize_knowledge_points(&self, request: &FinalizeRequest) -> Result<usize>;

    /// Active knowledge points of the current user.
    async fn get_dashboard(&self) -> Result<Dashboard>;

    async fn fetch_archived_knowledge_points(&self) -> Result<Vec<KnowledgePoint>>;

    async fn archive_knowledge_point(&self, id: i64) -> Result<()>;

    async fn unarchive_knowledge_point(&self, id: i64) -> Result<()>;

    async fn delete_knowledge_point(&self, id: i64) -> Result<()>;

    async fn update_knowledge_point(&self, id: i64, updates: &KnowledgePointUpdate) -> Result<()>;
}

/// Authentication endpoints.
#[async_trait]
pub trait AuthApi: Send + Sync {
    async fn login(&self, credentials: &Credentials) -> Result<AuthResponse>;

    async fn register(&self, request: &RegisterRequest) -> Result<AuthResponse>;

    /// Exchange a refresh token for a new token pair.
    async fn refresh_token(&self, refresh_token: &str) -> Result<AuthTokens>;

    async fn logout(&self) -> Result<()>;

    async fn get_current_user(&self) -> Result<User>;
}

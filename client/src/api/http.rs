//! HTTP implementation of the remote API on top of `reqwest`.

use std::sync::Arc;

use async_trait::async_trait;
use lingo_engine::FinalizeRequest;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::{
    AuthApi, AuthResponse, AuthTokens, Credentials, Dashboard, FinalizeResponse, KnowledgeApi,
    KnowledgePoint, KnowledgePointList, KnowledgePointUpdate, RefreshRequest, RegisterRequest,
    User,
};
use crate::auth::AuthSession;
use crate::config::ClientConfig;
use crate::error::{ClientError, Result};

/// JSON-over-HTTP client for the Lingo API.
///
/// Requests carry the bearer token of the shared [`AuthSession`] when one is
/// present.
#[derive(Debug, Clone)]
pub struct HttpApi {
    client: Client,
    base_url: String,
    session: Arc<AuthSession>,
}

impl HttpApi {
    /// Create a client with the configured request timeout.
    pub fn new(config: &ClientConfig, session: Arc<AuthSession>) -> Result<Self> {
        let client = Client::builder().timeout(config.request_timeout).build()?;

        tracing::info!(base_url = %config.api_base_url, "HTTP API client created");

        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            session,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let request = match self.session.access_token().await {
            Some(token) => request.bearer_auth(token),
            None => request,
        };

        let response = request.send().await?;
        check_status(response).await
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        Ok(self.send(request).await?.json().await?)
    }
}

/// Map non-2xx responses to errors.
async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    if status == StatusCode::UNAUTHORIZED {
        return Err(ClientError::Unauthorized);
    }

    let body = response.text().await.unwrap_or_default();
    tracing::debug!(status = status.as_u16(), body = %body, "API request failed");

    Err(ClientError::api(status.as_u16(), error_message(status, &body)))
}

/// Pull a human-readable message out of an error body.
fn error_message(status: StatusCode, body: &str) -> String {
    let from_json = serde_json::from_str::<Value>(body).ok().and_then(|value| {
        ["error", "message"]
            .iter()
            .find_map(|key| value.get(*key).and_then(Value::as_str).map(str::to_string))
    });

    match from_json {
        Some(message) => message,
        None if !body.trim().is_empty() => body.trim().to_string(),
        None => status
            .canonical_reason()
            .unwrap_or("Request failed")
            .to_string(),
    }
}

#[async_trait]
impl KnowledgeApi for HttpApi {
    async fn finalize_knowledge_points(&self, request: &FinalizeRequest) -> Result<usize> {
        let response: FinalizeResponse = self
            .send_json(self.client.post(self.url("/api/knowledge/finalize")).json(request))
            .await?;
        Ok(response.saved_count)
    }

    async fn get_dashboard(&self) -> Result<Dashboard> {
        self.send_json(self.client.get(self.url("/api/knowledge/dashboard")))
            .await
    }

    async fn fetch_archived_knowledge_points(&self) -> Result<Vec<KnowledgePoint>> {
        let list: KnowledgePointList = self
            .send_json(self.client.get(self.url("/api/knowledge/archived")))
            .await?;
        Ok(list.knowledge_points)
    }

    async fn archive_knowledge_point(&self, id: i64) -> Result<()> {
        self.send(self.client.post(self.url(&format!("/api/knowledge/{}/archive", id))))
            .await?;
        Ok(())
    }

    async fn unarchive_knowledge_point(&self, id: i64) -> Result<()> {
        self.send(self.client.post(self.url(&format!("/api/knowledge/{}/unarchive", id))))
            .await?;
        Ok(())
    }

    async fn delete_knowledge_point(&self, id: i64) -> Result<()> {
        self.send(self.client.delete(self.url(&format!("/api/knowledge/{}", id))))
            .await?;
        Ok(())
    }

    async fn update_knowledge_point(&self, id: i64, updates: &KnowledgePointUpdate) -> Result<()> {
        self.send(
            self.client
                .put(self.url(&format!("/api/knowledge/{}", id)))
                .json(updates),
        )
        .await?;
        Ok(())
    }
}

#[async_trait]
impl AuthApi for HttpApi {
    async fn login(&self, credentials: &Credentials) -> Result<AuthResponse> {
        self.send_json(self.client.post(self.url("/api/auth/login")).json(credentials))
            .await
    }

    async fn register(&self, request: &RegisterRequest) -> Result<AuthResponse> {
        self.send_json(self.client.post(self.url("/api/auth/register")).json(request))
            .await
    }

    async fn refresh_token(&self, refresh_token: &str) -> Result<AuthTokens> {
        let body = RefreshRequest {
            refresh_token: refresh_token.to_string(),
        };
        self.send_json(self.client.post(self.url("/api/auth/refresh")).json(&body))
            .await
    }

    async fn logout(&self) -> Result<()> {
        self.send(self.client.post(self.url("/api/auth/logout")))
            .await?;
        Ok(())
    }

    async fn get_current_user(&self) -> Result<User> {
        self.send_json(self.client.get(self.url("/api/auth/me")))
            .await
    }
}

//! Shared fakes and fixtures for client integration tests.

#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use lingo_client::api::{
    AuthApi, AuthResponse, AuthTokens, Credentials, Dashboard, KnowledgeApi, KnowledgePoint,
    KnowledgePointUpdate, RegisterRequest, User,
};
use lingo_client::auth::AuthSession;
use lingo_client::db::{create_memory_pool, run_migrations, KvStore};
use lingo_client::{ClientError, Result};
use lingo_engine::{FinalizeRequest, KnowledgePointDraft};
use serde_json::json;

pub async fn memory_kv() -> KvStore {
    let pool = create_memory_pool().await.unwrap();
    run_migrations(&pool).await.unwrap();
    KvStore::new(pool)
}

pub async fn signed_in_session() -> Arc<AuthSession> {
    let session = Arc::new(AuthSession::new());
    session.establish(tokens(), Some(user())).await;
    session
}

pub fn tokens() -> AuthTokens {
    AuthTokens {
        access_token: "access".to_string(),
        refresh_token: "refresh".to_string(),
    }
}

pub fn user() -> User {
    User {
        id: 1,
        email: "learner@example.com".to_string(),
        username: Some("learner".to_string()),
    }
}

/// Draft whose correct phrase identifies it in the fake API.
pub fn draft(phrase: &str) -> KnowledgePointDraft {
    KnowledgePointDraft::from_value(json!({
        "id": format!("uuid-{}", phrase),
        "category": "grammar",
        "correct_phrase": phrase,
        "user_context_sentence": format!("sentence with {}", phrase),
    }))
    .unwrap()
}

pub fn point(id: i64) -> KnowledgePoint {
    let mut point = KnowledgePoint::new(id);
    point.key_point_summary = Some(format!("point {}", id));
    point
}

#[derive(Default)]
struct FakeState {
    active: Vec<KnowledgePoint>,
    archived: Vec<KnowledgePoint>,
    finalized: Vec<FinalizeRequest>,
    failing_phrases: HashSet<String>,
    zero_phrases: HashSet<String>,
    offline: bool,
    updates: Vec<(i64, KnowledgePointUpdate)>,
}

/// In-memory stand-in for the knowledge endpoints.
#[derive(Default)]
pub struct FakeKnowledgeApi {
    state: Mutex<FakeState>,
    pub dashboard_calls: AtomicUsize,
    pub archived_calls: AtomicUsize,
}

impl FakeKnowledgeApi {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_points(active: Vec<KnowledgePoint>, archived: Vec<KnowledgePoint>) -> Arc<Self> {
        let api = Self::default();
        {
            let mut state = api.state.lock().unwrap();
            state.active = active;
            state.archived = archived;
        }
        Arc::new(api)
    }

    /// Finalize calls for this phrase return an API error.
    pub fn fail_phrase(&self, phrase: &str) {
        self.state.lock().unwrap().failing_phrases.insert(phrase.to_string());
    }

    /// Finalize calls for this phrase report zero saved points.
    pub fn save_nothing_for(&self, phrase: &str) {
        self.state.lock().unwrap().zero_phrases.insert(phrase.to_string());
    }

    pub fn clear_failures(&self) {
        let mut state = self.state.lock().unwrap();
        state.failing_phrases.clear();
        state.zero_phrases.clear();
    }

    pub fn set_offline(&self, offline: bool) {
        self.state.lock().unwrap().offline = offline;
    }

    pub fn set_active(&self, points: Vec<KnowledgePoint>) {
        self.state.lock().unwrap().active = points;
    }

    pub fn finalized(&self) -> Vec<FinalizeRequest> {
        self.state.lock().unwrap().finalized.clone()
    }

    pub fn updates(&self) -> Vec<(i64, KnowledgePointUpdate)> {
        self.state.lock().unwrap().updates.clone()
    }

    pub fn dashboard_calls(&self) -> usize {
        self.dashboard_calls.load(Ordering::SeqCst)
    }

    pub fn archived_calls(&self) -> usize {
        self.archived_calls.load(Ordering::SeqCst)
    }

    fn check_online(&self) -> Result<()> {
        if self.state.lock().unwrap().offline {
            Err(ClientError::api(503, "offline"))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl KnowledgeApi for FakeKnowledgeApi {
    async fn finalize_knowledge_points(&self, request: &FinalizeRequest) -> Result<usize> {
        self.check_online()?;
        let mut state = self.state.lock().unwrap();
        let phrase = request.errors[0].correction.clone();
        if state.failing_phrases.contains(&phrase) {
            return Err(ClientError::api(500, format!("cannot save {}", phrase)));
        }
        state.finalized.push(request.clone());
        if state.zero_phrases.contains(&phrase) {
            return Ok(0);
        }
        Ok(request.errors.len())
    }

    async fn get_dashboard(&self) -> Result<Dashboard> {
        self.dashboard_calls.fetch_add(1, Ordering::SeqCst);
        self.check_online()?;
        Ok(Dashboard {
            knowledge_points: self.state.lock().unwrap().active.clone(),
        })
    }

    async fn fetch_archived_knowledge_points(&self) -> Result<Vec<KnowledgePoint>> {
        self.archived_calls.fetch_add(1, Ordering::SeqCst);
        self.check_online()?;
        Ok(self.state.lock().unwrap().archived.clone())
    }

    async fn archive_knowledge_point(&self, id: i64) -> Result<()> {
        self.check_online()?;
        let mut state = self.state.lock().unwrap();
        let index = state
            .active
            .iter()
            .position(|p| p.id == id)
            .ok_or_else(|| ClientError::api(404, "not found"))?;
        let mut point = state.active.remove(index);
        point.is_archived = true;
        state.archived.push(point);
        Ok(())
    }

    async fn unarchive_knowledge_point(&self, id: i64) -> Result<()> {
        self.check_online()?;
        let mut state = self.state.lock().unwrap();
        let index = state
            .archived
            .iter()
            .position(|p| p.id == id)
            .ok_or_else(|| ClientError::api(404, "not found"))?;
        let mut point = state.archived.remove(index);
        point.is_archived = false;
        state.active.push(point);
        Ok(())
    }

    async fn delete_knowledge_point(&self, id: i64) -> Result<()> {
        self.check_online()?;
        let mut state = self.state.lock().unwrap();
        state.active.retain(|p| p.id != id);
        state.archived.retain(|p| p.id != id);
        Ok(())
    }

    async fn update_knowledge_point(&self, id: i64, updates: &KnowledgePointUpdate) -> Result<()> {
        self.check_online()?;
        let mut state = self.state.lock().unwrap();
        if let (Some(point), Some(level)) = (
            state.active.iter_mut().find(|p| p.id == id),
            updates.mastery_level,
        ) {
            point.mastery_level = level;
        }
        state.updates.push((id, updates.clone()));
        Ok(())
    }
}

/// Stand-in for the auth endpoints. Accepts one password.
pub struct FakeAuthApi {
    pub password: String,
    pub logout_calls: AtomicUsize,
    pub reject_refresh: bool,
}

impl FakeAuthApi {
    pub fn new(password: &str) -> Arc<Self> {
        Arc::new(Self {
            password: password.to_string(),
            logout_calls: AtomicUsize::new(0),
            reject_refresh: false,
        })
    }

    pub fn rejecting_refresh(password: &str) -> Arc<Self> {
        Arc::new(Self {
            password: password.to_string(),
            logout_calls: AtomicUsize::new(0),
            reject_refresh: true,
        })
    }
}

#[async_trait]
impl AuthApi for FakeAuthApi {
    async fn login(&self, credentials: &Credentials) -> Result<AuthResponse> {
        if credentials.password != self.password {
            return Err(ClientError::Unauthorized);
        }
        Ok(AuthResponse {
            tokens: tokens(),
            user: User {
                email: credentials.email.clone(),
                ..user()
            },
        })
    }

    async fn register(&self, request: &RegisterRequest) -> Result<AuthResponse> {
        Ok(AuthResponse {
            tokens: tokens(),
            user: User {
                id: 2,
                email: request.email.clone(),
                username: request.username.clone(),
            },
        })
    }

    async fn refresh_token(&self, refresh_token: &str) -> Result<AuthTokens> {
        if self.reject_refresh {
            return Err(ClientError::Unauthorized);
        }
        Ok(AuthTokens {
            access_token: format!("{}-renewed", refresh_token),
            refresh_token: refresh_token.to_string(),
        })
    }

    async fn logout(&self) -> Result<()> {
        self.logout_calls.fetch_add(1, Ordering::SeqCst);
        Err(ClientError::api(500, "logout unavailable"))
    }

    async fn get_current_user(&self) -> Result<User> {
        Ok(user())
    }
}

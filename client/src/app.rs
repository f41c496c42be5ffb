//! Service bootstrap.
//!
//! [`AppServices`] is built once at startup and owns every long-lived
//! service. Consumers receive references to it instead of reaching for
//! globals, and tests build it with fake APIs through
//! [`AppServices::with_api`].

use std::sync::Arc;

use crate::api::{AuthApi, HttpApi, KnowledgeApi, RegisterRequest, User};
use crate::auth::{AuthManager, AuthSession};
use crate::config::ClientConfig;
use crate::db::{self, KvStore, Pool};
use crate::error::Result;
use crate::guest::GuestDataManager;
use crate::repository::KnowledgePointRepository;
use crate::sync::{SyncManager, SyncSettings};

/// Application-wide services.
pub struct AppServices {
    pub config: Arc<ClientConfig>,
    pub kv: KvStore,
    pub session: Arc<AuthSession>,
    pub auth: Arc<AuthManager>,
    pub guest: Arc<GuestDataManager>,
    pub sync: Arc<SyncManager>,
    pub repository: Arc<KnowledgePointRepository>,
}

impl AppServices {
    /// Load `.env`, read the configuration and start all services.
    pub async fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        let config = ClientConfig::from_env()?;
        Self::start(config).await
    }

    /// Open the device database and start all services against the HTTP API.
    pub async fn start(config: ClientConfig) -> Result<Self> {
        tracing::info!(api = %config.api_base_url, "Starting Lingo client services");

        let pool = db::create_pool(&config.database_url).await?;
        let session = Arc::new(AuthSession::new());
        let api = Arc::new(HttpApi::new(&config, session.clone())?);

        Self::with_api(config, pool, session, api.clone(), api).await
    }

    /// Start all services with the given API implementations.
    pub async fn with_api(
        config: ClientConfig,
        pool: Pool,
        session: Arc<AuthSession>,
        knowledge_api: Arc<dyn KnowledgeApi>,
        auth_api: Arc<dyn AuthApi>,
    ) -> Result<Self> {
        tracing::info!("Running database migrations...");
        db::run_migrations(&pool).await?;

        let kv = KvStore::new(pool);
        let guest = Arc::new(GuestDataManager::load(kv.clone()).await);
        let auth = Arc::new(AuthManager::new(auth_api, session.clone()));
        let sync = Arc::new(
            SyncManager::new(
                guest.clone(),
                knowledge_api.clone(),
                session.clone(),
                kv.clone(),
                SyncSettings::from(&config),
            )
            .await,
        );
        let repository = Arc::new(KnowledgePointRepository::new(
            knowledge_api,
            kv.clone(),
            config.cache_ttl,
        ));

        Ok(Self {
            config: Arc::new(config),
            kv,
            session,
            auth,
            guest,
            sync,
            repository,
        })
    }

    /// Sign in, then push guest data in the background if a sync is due.
    pub async fn login(&self, email: &str, password: &str) -> Result<User> {
        let user = self.auth.login(email, password).await?;
        self.spawn_auto_sync();
        Ok(user)
    }

    /// Create an account, then push guest data in the background.
    pub async fn register(&self, request: &RegisterRequest) -> Result<User> {
        let user = self.auth.register(request).await?;
        self.spawn_auto_sync();
        Ok(user)
    }

    /// Sign out and forget cached server data.
    pub async fn logout(&self) {
        self.auth.logout().await;
        self.repository.clear_cache().await;
    }

    fn spawn_auto_sync(&self) {
        let sync = self.sync.clone();
        tokio::spawn(async move {
            sync.check_and_perform_auto_sync().await;
        });
    }
}

//! Read-through cache over server-owned knowledge points.
//!
//! Two tiers: in-memory lists valid for a fixed TTL, and a persisted copy in
//! the key/value store that is only read when the server is unreachable.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::api::{KnowledgeApi, KnowledgePoint, KnowledgePointUpdate};
use crate::db::{keys, KvStore};
use crate::error::Result;

/// Which of the two cached lists an operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListKind {
    Active,
    Archived,
}

impl ListKind {
    fn storage_key(self) -> &'static str {
        match self {
            ListKind::Active => keys::CACHE_KNOWLEDGE_POINTS,
            ListKind::Archived => keys::CACHE_ARCHIVED_KNOWLEDGE_POINTS,
        }
    }
}

#[derive(Debug, Default)]
struct CacheState {
    active: Vec<KnowledgePoint>,
    archived: Vec<KnowledgePoint>,
    /// Shared by both lists
    last_update: Option<Instant>,
    /// Lists currently holding the persisted copy instead of server data
    active_offline: bool,
    archived_offline: bool,
}

impl CacheState {
    fn list(&self, kind: ListKind) -> &Vec<KnowledgePoint> {
        match kind {
            ListKind::Active => &self.active,
            ListKind::Archived => &self.archived,
        }
    }

    fn list_mut(&mut self, kind: ListKind) -> &mut Vec<KnowledgePoint> {
        match kind {
            ListKind::Active => &mut self.active,
            ListKind::Archived => &mut self.archived,
        }
    }

    fn offline_mut(&mut self, kind: ListKind) -> &mut bool {
        match kind {
            ListKind::Active => &mut self.active_offline,
            ListKind::Archived => &mut self.archived_offline,
        }
    }

    /// Whether `kind` can be served from memory.
    fn hit(&self, kind: ListKind, ttl: Duration) -> bool {
        let offline = match kind {
            ListKind::Active => self.active_offline,
            ListKind::Archived => self.archived_offline,
        };
        let fresh = self.last_update.is_some_and(|at| at.elapsed() < ttl);
        fresh && !offline && !self.list(kind).is_empty()
    }

    fn invalidate(&mut self) {
        self.active.clear();
        self.archived.clear();
        self.last_update = None;
        self.active_offline = false;
        self.archived_offline = false;
    }
}

/// Knowledge point repository with memory and disk caching.
///
/// Every public operation holds the cache lock while it talks to the server,
/// so operations on one repository run one at a time. Disk reads and writes
/// happen with the lock released.
pub struct KnowledgePointRepository {
    api: Arc<dyn KnowledgeApi>,
    kv: KvStore,
    ttl: Duration,
    cache: Mutex<CacheState>,
}

impl KnowledgePointRepository {
    pub fn new(api: Arc<dyn KnowledgeApi>, kv: KvStore, ttl: Duration) -> Self {
        Self {
            api,
            kv,
            ttl,
            cache: Mutex::new(CacheState::default()),
        }
    }

    /// Active knowledge points.
    pub async fn fetch_knowledge_points(&self) -> Result<Vec<KnowledgePoint>> {
        self.fetch(ListKind::Active).await
    }

    /// Archived knowledge points.
    pub async fn fetch_archived_knowledge_points(&self) -> Result<Vec<KnowledgePoint>> {
        self.fetch(ListKind::Archived).await
    }

    async fn fetch(&self, kind: ListKind) -> Result<Vec<KnowledgePoint>> {
        let mut cache = self.cache.lock().await;

        if cache.hit(kind, self.ttl) {
            tracing::debug!(?kind, "Knowledge point cache hit");
            return Ok(cache.list(kind).clone());
        }

        match self.fetch_remote(kind).await {
            Ok(points) => {
                *cache.list_mut(kind) = points.clone();
                *cache.offline_mut(kind) = false;
                cache.last_update = Some(Instant::now());
                drop(cache);

                self.persist(kind, &points).await;
                Ok(points)
            }
            Err(e) => {
                drop(cache);
                tracing::warn!(?kind, error = %e, "Fetch failed, trying offline copy");

                let persisted = self.load_persisted(kind).await;
                let mut cache = self.cache.lock().await;
                if cache.hit(kind, self.ttl) {
                    return Ok(cache.list(kind).clone());
                }
                match persisted {
                    Some(points) if !points.is_empty() => {
                        *cache.list_mut(kind) = points.clone();
                        *cache.offline_mut(kind) = true;
                        Ok(points)
                    }
                    _ => Err(e),
                }
            }
        }
    }

    async fn fetch_remote(&self, kind: ListKind) -> Result<Vec<KnowledgePoint>> {
        match kind {
            ListKind::Active => Ok(self.api.get_dashboard().await?.knowledge_points),
            ListKind::Archived => self.api.fetch_archived_knowledge_points().await,
        }
    }

    /// Delete a point on the server, then drop it from both lists.
    pub async fn delete_knowledge_point(&self, id: i64) -> Result<()> {
        let mut cache = self.cache.lock().await;
        self.api.delete_knowledge_point(id).await?;

        cache.active.retain(|p| p.id != id);
        cache.archived.retain(|p| p.id != id);

        let (active, archived) = (cache.active.clone(), cache.archived.clone());
        drop(cache);
        self.persist_both(&active, &archived).await;
        Ok(())
    }

    /// Archive a point on the server, then move it to the archived list.
    pub async fn archive_knowledge_point(&self, id: i64) -> Result<()> {
        self.move_between(id, ListKind::Active).await
    }

    /// Unarchive a point on the server, then move it back to the active list.
    pub async fn restore_knowledge_point(&self, id: i64) -> Result<()> {
        self.move_between(id, ListKind::Archived).await
    }

    async fn move_between(&self, id: i64, from: ListKind) -> Result<()> {
        let mut cache = self.cache.lock().await;

        match from {
            ListKind::Active => self.api.archive_knowledge_point(id).await?,
            ListKind::Archived => self.api.unarchive_knowledge_point(id).await?,
        }

        let to = match from {
            ListKind::Active => ListKind::Archived,
            ListKind::Archived => ListKind::Active,
        };

        let source = cache.list_mut(from);
        if let Some(index) = source.iter().position(|p| p.id == id) {
            let mut point = source.remove(index);
            point.is_archived = to == ListKind::Archived;
            cache.list_mut(to).insert(0, point);
        }

        let (active, archived) = (cache.active.clone(), cache.archived.clone());
        drop(cache);
        self.persist_both(&active, &archived).await;
        Ok(())
    }

    /// Update the mastery level on the server, then reload from scratch.
    pub async fn update_mastery_level(&self, id: i64, level: f64) -> Result<Vec<KnowledgePoint>> {
        {
            let mut cache = self.cache.lock().await;
            self.api
                .update_knowledge_point(id, &KnowledgePointUpdate::mastery_level(level))
                .await?;
            cache.invalidate();
        }
        self.fetch(ListKind::Active).await
    }

    /// Drop the in-memory tier. The persisted copy is kept.
    pub async fn clear_cache(&self) {
        self.cache.lock().await.invalidate();
        tracing::debug!("Knowledge point cache cleared");
    }

    /// Reload both lists from the server.
    pub async fn force_refresh(&self) -> Result<()> {
        self.clear_cache().await;
        self.fetch(ListKind::Active).await?;
        self.fetch(ListKind::Archived).await?;
        Ok(())
    }

    /// Current in-memory list, without any network access.
    pub async fn cached(&self, kind: ListKind) -> Vec<KnowledgePoint> {
        self.cache.lock().await.list(kind).clone()
    }

    async fn load_persisted(&self, kind: ListKind) -> Option<Vec<KnowledgePoint>> {
        match self.kv.get_json(kind.storage_key()).await {
            Ok(points) => points,
            Err(e) => {
                tracing::warn!(?kind, error = %e, "Offline copy unreadable");
                None
            }
        }
    }

    async fn persist(&self, kind: ListKind, points: &[KnowledgePoint]) {
        if let Err(e) = self.kv.put_json(kind.storage_key(), points).await {
            tracing::warn!(?kind, error = %e, "Failed to persist offline copy");
        }
    }

    async fn persist_both(&self, active: &[KnowledgePoint], archived: &[KnowledgePoint]) {
        self.persist(ListKind::Active, active).await;
        self.persist(ListKind::Archived, archived).await;
    }
}

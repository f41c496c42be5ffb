//! Pushes guest knowledge points to the server once a user signs in.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use lingo_engine::{FinalizeRequest, LocalKnowledgePoint, SyncStatus};
use tokio::sync::{broadcast, Mutex};

use super::{SyncEvent, SyncReport, SyncStatusSummary};
use crate::api::KnowledgeApi;
use crate::auth::AuthSession;
use crate::config::ClientConfig;
use crate::db::{keys, KvStore};
use crate::guest::GuestDataManager;

const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Timing of sync runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncSettings {
    /// Pause after each pushed record
    pub item_delay: Duration,
    /// Minimum time between automatic runs
    pub auto_sync_interval: Duration,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            item_delay: Duration::from_millis(500),
            auto_sync_interval: Duration::from_secs(3600),
        }
    }
}

impl From<&ClientConfig> for SyncSettings {
    fn from(config: &ClientConfig) -> Self {
        Self {
            item_delay: config.sync_item_delay,
            auto_sync_interval: config.auto_sync_interval,
        }
    }
}

#[derive(Debug, Default)]
struct SyncState {
    last_sync_at: Option<DateTime<Utc>>,
    errors: Vec<String>,
}

/// Clears the syncing flag when a run ends, however it ends.
struct RunGuard<'a>(&'a AtomicBool);

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Sequentially pushes pending local knowledge points.
///
/// Runs never overlap: a second request while one is in progress is dropped.
/// Failures never surface as errors; they are collected in the run's
/// [`SyncReport`] and in [`status`](Self::status).
pub struct SyncManager {
    guest: Arc<GuestDataManager>,
    api: Arc<dyn KnowledgeApi>,
    session: Arc<AuthSession>,
    kv: KvStore,
    settings: SyncSettings,
    is_syncing: AtomicBool,
    state: Mutex<SyncState>,
    events: broadcast::Sender<SyncEvent>,
}

impl SyncManager {
    /// Create the manager, restoring the last sync time from storage.
    pub async fn new(
        guest: Arc<GuestDataManager>,
        api: Arc<dyn KnowledgeApi>,
        session: Arc<AuthSession>,
        kv: KvStore,
        settings: SyncSettings,
    ) -> Self {
        let last_sync_at = match kv.get_json::<DateTime<Utc>>(keys::SYNC_LAST_SYNC_AT).await {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(error = %e, "Discarding unreadable last sync time");
                None
            }
        };
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        Self {
            guest,
            api,
            session,
            kv,
            settings,
            is_syncing: AtomicBool::new(false),
            state: Mutex::new(SyncState {
                last_sync_at,
                errors: Vec::new(),
            }),
            events,
        }
    }

    /// Receive [`SyncEvent`]s from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<SyncEvent> {
        self.events.subscribe()
    }

    pub fn is_syncing(&self) -> bool {
        self.is_syncing.load(Ordering::SeqCst)
    }

    /// Records still waiting to be pushed, counted from local storage.
    pub async fn pending_count(&self) -> usize {
        self.guest.pending_count().await
    }

    pub async fn status(&self) -> SyncStatusSummary {
        let pending_count = self.pending_count().await;
        let state = self.state.lock().await;
        SyncStatusSummary {
            is_syncing: self.is_syncing(),
            pending_count,
            last_sync_at: state.last_sync_at,
            errors: state.errors.clone(),
        }
    }

    /// Push every pending local knowledge point.
    ///
    /// Returns `None` without doing anything if a run is already in progress
    /// or no user is signed in.
    pub async fn sync_all_local_knowledge_points(&self) -> Option<SyncReport> {
        if self
            .is_syncing
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            tracing::debug!("Sync already running, request dropped");
            return None;
        }
        let _guard = RunGuard(&self.is_syncing);

        if !self.session.is_authenticated().await {
            tracing::debug!("Not authenticated, skipping sync");
            return None;
        }

        self.state.lock().await.errors.clear();

        let pending = self.guest.pending_knowledge_points().await;
        tracing::info!(pending = pending.len(), "Starting knowledge point sync");
        self.emit(SyncEvent::Started {
            pending: pending.len(),
        });

        let mut report = SyncReport::default();
        for point in &pending {
            let Some(local_id) = point.pending_id() else {
                continue;
            };

            match self.push(local_id, point).await {
                Ok(()) => {
                    report.succeeded += 1;
                    self.emit(SyncEvent::ItemSynced { local_id });
                }
                Err(message) => {
                    tracing::warn!(local_id, error = %message, "Knowledge point sync failed");
                    report.failed += 1;
                    report.errors.push(message.clone());
                    self.state.lock().await.errors.push(message.clone());
                    self.emit(SyncEvent::ItemFailed { local_id, message });
                }
            }

            tokio::time::sleep(self.settings.item_delay).await;
        }

        let now = Utc::now();
        if let Err(e) = self.kv.put_json(keys::SYNC_LAST_SYNC_AT, &now).await {
            tracing::warn!(error = %e, "Failed to persist last sync time");
        }

        self.state.lock().await.last_sync_at = Some(now);
        let pending_count = self.pending_count().await;

        tracing::info!(
            succeeded = report.succeeded,
            failed = report.failed,
            pending = pending_count,
            "Knowledge point sync finished"
        );
        self.emit(SyncEvent::completed(&report, pending_count));

        Some(report)
    }

    /// Push one record; on success it is removed from local storage.
    async fn push(&self, local_id: i64, point: &LocalKnowledgePoint) -> Result<(), String> {
        self.guest.mark_status(local_id, SyncStatus::Syncing).await;

        let request = FinalizeRequest::from_local(point);
        let outcome = match self.api.finalize_knowledge_points(&request).await {
            Ok(saved) if saved > 0 => Ok(()),
            Ok(_) => Err(format!(
                "Knowledge point #{}: server saved nothing",
                local_id.unsigned_abs()
            )),
            Err(e) => Err(format!(
                "Knowledge point #{}: {}",
                local_id.unsigned_abs(),
                e
            )),
        };

        match outcome {
            Ok(()) => {
                self.guest.remove_local(local_id).await;
                Ok(())
            }
            Err(message) => {
                self.guest.mark_status(local_id, SyncStatus::Failed).await;
                Err(message)
            }
        }
    }

    /// Whether an automatic run is due at `now`.
    ///
    /// Requires a signed-in user, pending records, and at least the auto-sync
    /// interval since the previous run (if there was one).
    pub async fn should_auto_sync(&self, now: DateTime<Utc>) -> bool {
        if !self.session.is_authenticated().await {
            return false;
        }
        if self.pending_count().await == 0 {
            return false;
        }

        let last_sync_at = self.state.lock().await.last_sync_at;
        match last_sync_at {
            Some(last) => (now - last)
                .to_std()
                .is_ok_and(|elapsed| elapsed >= self.settings.auto_sync_interval),
            None => true,
        }
    }

    /// Run a sync if one is due. Meant to be called on app foreground or
    /// right after sign-in.
    pub async fn check_and_perform_auto_sync(&self) -> Option<SyncReport> {
        if !self.should_auto_sync(Utc::now()).await {
            return None;
        }
        self.sync_all_local_knowledge_points().await
    }

    fn emit(&self, event: SyncEvent) {
        // No receivers is fine.
        let _ = self.events.send(event);
    }
}

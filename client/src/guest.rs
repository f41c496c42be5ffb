//! Device-local guest data.
//!
//! [`GuestDataManager`] wraps the engine's [`GuestStore`] and mirrors every
//! change into the key/value store. Storage is best-effort: unreadable data
//! falls back to defaults and failed writes are logged, never returned.
//! Knowledge point entries that no longer decode are kept verbatim and
//! written back with every rewrite of the list.

use chrono::{DateTime, Local, TimeZone, Utc};
use lingo_engine::{
    GuestFeature, GuestProfile, GuestSnapshot, GuestStore, KnowledgePointDraft, LearningSession,
    LocalIdCounter, LocalKnowledgePoint, PointContent, SyncStatus,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::Mutex;

use crate::db::{keys, KvStore};

/// Guest-mode store with persistence.
pub struct GuestDataManager {
    kv: KvStore,
    state: Mutex<GuestState>,
}

struct GuestState {
    store: GuestStore,
    /// Stored entries the store cannot interpret, in their original form.
    unreadable: Vec<Value>,
}

impl GuestState {
    async fn write_points(&self, kv: &KvStore) {
        let records: Result<Vec<Value>, _> = self
            .store
            .local_knowledge_points()
            .iter()
            .map(serde_json::to_value)
            .collect();

        match records {
            Ok(mut records) => {
                records.extend(self.unreadable.iter().cloned());
                write(kv, keys::GUEST_KNOWLEDGE_POINTS, &records).await;
            }
            Err(e) => tracing::warn!(error = %e, "Failed to encode guest knowledge points"),
        }
    }
}

impl GuestDataManager {
    /// Load guest data from storage and repair legacy records.
    ///
    /// A missing profile is created and persisted. If the migration changes
    /// anything the whole knowledge point list is rewritten.
    pub async fn load(kv: KvStore) -> Self {
        let profile = match read::<GuestProfile>(&kv, keys::GUEST_PROFILE).await {
            Some(profile) => profile,
            None => {
                let profile = GuestProfile::new(Utc::now());
                write(&kv, keys::GUEST_PROFILE, &profile).await;
                profile
            }
        };
        let (points, unreadable) =
            read_records::<LocalKnowledgePoint>(&kv, keys::GUEST_KNOWLEDGE_POINTS).await;
        let (sessions, _) = read_records::<LearningSession>(&kv, keys::GUEST_LEARNING_SESSIONS).await;
        let mut counter = read::<i64>(&kv, keys::GUEST_NEXT_LOCAL_ID)
            .await
            .map(LocalIdCounter::from_persisted)
            .unwrap_or_default();
        for id in unreadable.iter().filter_map(|v| v.get("id").and_then(Value::as_i64)) {
            counter.reserve_below(id);
        }

        let mut state = GuestState {
            store: GuestStore::from_parts(profile, points, sessions, counter),
            unreadable,
        };

        let report = state.store.migrate_legacy_records();
        if report.changed() {
            tracing::info!(
                ids_reassigned = report.ids_reassigned,
                sentences_swapped = report.sentences_swapped,
                summaries_backfilled = report.summaries_backfilled,
                "Migrated legacy knowledge points"
            );
            state.write_points(&kv).await;
            write(&kv, keys::GUEST_NEXT_LOCAL_ID, &state.store.counter()).await;
        }

        tracing::debug!(
            knowledge_points = state.store.local_knowledge_points().len(),
            unreadable = state.unreadable.len(),
            sessions = state.store.learning_sessions().len(),
            "Guest data loaded"
        );

        Self {
            kv,
            state: Mutex::new(state),
        }
    }

    /// Save a knowledge point and assign it the next negative id.
    pub async fn save_local_knowledge_point(&self, draft: KnowledgePointDraft) -> LocalKnowledgePoint {
        let mut state = self.state.lock().await;
        let point = state.store.save_local_knowledge_point(draft);

        state.write_points(&self.kv).await;
        write(&self.kv, keys::GUEST_NEXT_LOCAL_ID, &state.store.counter()).await;
        write(&self.kv, keys::GUEST_PROFILE, state.store.profile()).await;

        tracing::debug!(id = %point.id, local_id = %point.local_id, "Saved local knowledge point");
        point
    }

    /// Save new content under a freshly generated local identifier.
    pub async fn save_new_knowledge_point(&self, content: PointContent) -> LocalKnowledgePoint {
        let draft = KnowledgePointDraft::new(uuid::Uuid::new_v4().to_string(), content);
        self.save_local_knowledge_point(draft).await
    }

    pub async fn local_knowledge_points(&self) -> Vec<LocalKnowledgePoint> {
        self.state.lock().await.store.local_knowledge_points().to_vec()
    }

    /// Records still waiting to be pushed, in storage order.
    pub async fn pending_knowledge_points(&self) -> Vec<LocalKnowledgePoint> {
        self.state.lock().await.store.pending().cloned().collect()
    }

    pub async fn pending_count(&self) -> usize {
        self.state.lock().await.store.pending_count()
    }

    /// Remove a pushed record by its negative id.
    pub async fn remove_local(&self, id: i64) -> bool {
        let mut state = self.state.lock().await;
        if state.store.remove_local(id).is_none() {
            return false;
        }
        state.write_points(&self.kv).await;
        true
    }

    /// Update the sync status of a pending record.
    pub async fn mark_status(&self, id: i64, status: SyncStatus) {
        let mut state = self.state.lock().await;
        match state.store.mark_status(id, status) {
            Ok(()) => state.write_points(&self.kv).await,
            Err(e) => tracing::warn!(id, error = %e, "Cannot update sync status"),
        }
    }

    pub async fn save_learning_session(&self, session: LearningSession) {
        let mut state = self.state.lock().await;
        state.store.save_learning_session(session);
        write(&self.kv, keys::GUEST_LEARNING_SESSIONS, state.store.learning_sessions()).await;
    }

    pub async fn learning_sessions(&self) -> Vec<LearningSession> {
        self.state.lock().await.store.learning_sessions().to_vec()
    }

    pub async fn add_learning_time(&self, seconds: u64) {
        let mut state = self.state.lock().await;
        state.store.add_learning_time(seconds);
        write(&self.kv, keys::GUEST_PROFILE, state.store.profile()).await;
    }

    pub async fn complete_session(&self) {
        let mut state = self.state.lock().await;
        state.store.complete_session();
        write(&self.kv, keys::GUEST_PROFILE, state.store.profile()).await;
    }

    pub async fn profile(&self) -> GuestProfile {
        self.state.lock().await.store.profile().clone()
    }

    /// Check a feature limit against the device's current local day.
    pub async fn can_use_feature(&self, feature: GuestFeature) -> bool {
        self.can_use_feature_at(feature, &Local::now()).await
    }

    pub async fn can_use_feature_at<Tz: TimeZone>(
        &self,
        feature: GuestFeature,
        now: &DateTime<Tz>,
    ) -> bool {
        self.state.lock().await.store.can_use_feature(feature, now)
    }

    pub async fn should_show_registration_prompt(&self) -> bool {
        self.state.lock().await.store.should_show_registration_prompt()
    }

    /// Delete profile, knowledge points and sessions.
    ///
    /// The negative id counter is kept so ids are never reused.
    pub async fn clear_guest_data(&self) {
        let mut state = self.state.lock().await;
        state.store.clear_guest_data(Utc::now());
        state.unreadable.clear();

        if let Err(e) = self
            .kv
            .remove_all(&[
                keys::GUEST_PROFILE,
                keys::GUEST_KNOWLEDGE_POINTS,
                keys::GUEST_LEARNING_SESSIONS,
            ])
            .await
        {
            tracing::warn!(error = %e, "Failed to delete guest data");
        }

        tracing::info!("Guest data cleared");
    }

    pub async fn export_snapshot(&self) -> GuestSnapshot {
        self.state.lock().await.store.export_state()
    }
}

/// Read a value, treating missing or undecodable data as absent.
async fn read<T: DeserializeOwned>(kv: &KvStore, key: &str) -> Option<T> {
    match kv.get_json(key).await {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(key, error = %e, "Discarding unreadable guest data");
            None
        }
    }
}

/// Read a list, splitting off entries that no longer decode.
async fn read_records<T: DeserializeOwned>(kv: &KvStore, key: &str) -> (Vec<T>, Vec<Value>) {
    let Some(values) = read::<Vec<Value>>(kv, key).await else {
        return (Vec::new(), Vec::new());
    };

    let mut records = Vec::with_capacity(values.len());
    let mut unreadable = Vec::new();
    for value in values {
        match <T as serde::Deserialize>::deserialize(&value) {
            Ok(record) => records.push(record),
            Err(_) => unreadable.push(value),
        }
    }

    if !unreadable.is_empty() {
        tracing::warn!(
            key,
            skipped = unreadable.len(),
            "Skipping undecodable guest records"
        );
    }
    (records, unreadable)
}

async fn write<T: Serialize + ?Sized>(kv: &KvStore, key: &str, value: &T) {
    if let Err(e) = kv.put_json(key, value).await {
        tracing::warn!(key, error = %e, "Failed to persist guest data");
    }
}

//! Store - the in-memory guest state container.
//!
//! The store holds the guest profile, locally saved knowledge points, the
//! session log and the negative id counter. It knows nothing about disk or
//! network; callers persist it through [`GuestSnapshot`]s or its accessors.

use crate::{
    error::Result, migrate, Error, GuestFeature, GuestProfile, GuestSnapshot,
    KnowledgePointDraft, LearningSession, LocalIdCounter, LocalKnowledgePoint, MigrationReport,
    SessionLog, SyncStatus,
};
use chrono::{DateTime, TimeZone, Utc};

/// All device-local guest data.
#[derive(Debug, Clone, PartialEq)]
pub struct GuestStore {
    profile: GuestProfile,
    points: Vec<LocalKnowledgePoint>,
    sessions: SessionLog,
    counter: LocalIdCounter,
}

impl GuestStore {
    /// Create an empty store with a fresh profile.
    pub fn new(created_at: DateTime<Utc>) -> Self {
        Self {
            profile: GuestProfile::new(created_at),
            points: Vec::new(),
            sessions: SessionLog::new(),
            counter: LocalIdCounter::new(),
        }
    }

    /// Build a store from a snapshot.
    pub fn from_snapshot(snapshot: GuestSnapshot) -> Result<Self> {
        snapshot.validate()?;
        Ok(Self::from_parts(
            snapshot.profile,
            snapshot.knowledge_points,
            snapshot.sessions,
            LocalIdCounter::from_persisted(snapshot.next_local_id),
        ))
    }

    /// Export the full state as a snapshot.
    pub fn export_state(&self) -> GuestSnapshot {
        GuestSnapshot {
            format_version: crate::SNAPSHOT_FORMAT_VERSION,
            profile: self.profile.clone(),
            knowledge_points: self.points.clone(),
            sessions: self.sessions.as_slice().to_vec(),
            next_local_id: self.counter.persisted(),
        }
    }

    /// Replace the full state with a snapshot.
    pub fn import_state(&mut self, snapshot: GuestSnapshot) -> Result<()> {
        *self = Self::from_snapshot(snapshot)?;
        Ok(())
    }

    pub fn profile(&self) -> &GuestProfile {
        &self.profile
    }

    pub fn counter(&self) -> LocalIdCounter {
        self.counter
    }

    /// Save a knowledge point created while in guest mode.
    ///
    /// Every call appends; no duplicate detection is done.
    pub fn save_local_knowledge_point(&mut self, draft: KnowledgePointDraft) -> LocalKnowledgePoint {
        let id = self.counter.allocate();
        let point = LocalKnowledgePoint::from_draft(draft, id);
        self.points.push(point.clone());
        self.profile.add_knowledge_point();
        point
    }

    /// All locally stored knowledge points, in storage order.
    pub fn local_knowledge_points(&self) -> &[LocalKnowledgePoint] {
        &self.points
    }

    /// Append a learning session, keeping only the most recent ones.
    pub fn save_learning_session(&mut self, session: LearningSession) {
        self.sessions.push(session);
    }

    pub fn learning_sessions(&self) -> &[LearningSession] {
        self.sessions.as_slice()
    }

    pub fn add_learning_time(&mut self, seconds: u64) {
        self.profile.add_learning_time(seconds);
    }

    pub fn complete_session(&mut self) {
        self.profile.complete_session();
    }

    /// Check a guest feature against its limit.
    ///
    /// `now` decides which calendar day counts as today, so pass the device's
    /// local time.
    pub fn can_use_feature<Tz: TimeZone>(&self, feature: GuestFeature, now: &DateTime<Tz>) -> bool {
        match feature {
            GuestFeature::DailyPractice => {
                self.sessions.count_on_day_of(now) < feature.limit() as usize
            }
            GuestFeature::KnowledgePointSave => {
                self.profile.knowledge_points_count < feature.limit()
            }
            GuestFeature::AiModelAccess | GuestFeature::CloudSync => false,
        }
    }

    pub fn should_show_registration_prompt(&self) -> bool {
        self.profile.should_show_registration_prompt()
    }

    /// Repair records written by older clients. See [`migrate`](crate::migrate).
    pub fn migrate_legacy_records(&mut self) -> MigrationReport {
        migrate::migrate_records(&mut self.points, &mut self.counter)
    }

    /// Delete profile, knowledge points and sessions.
    ///
    /// The id counter keeps its value so negative ids are never reused.
    pub fn clear_guest_data(&mut self, now: DateTime<Utc>) {
        self.profile = GuestProfile::new(now);
        self.points.clear();
        self.sessions.clear();
    }

    /// Records still waiting to be pushed, in storage order.
    pub fn pending(&self) -> impl Iterator<Item = &LocalKnowledgePoint> {
        self.points.iter().filter(|p| p.is_pending_sync())
    }

    pub fn pending_count(&self) -> usize {
        self.pending().count()
    }

    /// Find a pending record by its negative id.
    pub fn get_local(&self, id: i64) -> Option<&LocalKnowledgePoint> {
        self.points.iter().find(|p| p.pending_id() == Some(id))
    }

    /// Remove a record by its negative id after it has been synced.
    pub fn remove_local(&mut self, id: i64) -> Option<LocalKnowledgePoint> {
        let index = self.points.iter().position(|p| p.pending_id() == Some(id))?;
        Some(self.points.remove(index))
    }

    /// Update the sync status of a pending record.
    pub fn mark_status(&mut self, id: i64, status: SyncStatus) -> Result<()> {
        let point = self
            .points
            .iter_mut()
            .find(|p| p.pending_id() == Some(id))
            .ok_or(Error::PointNotFound(id))?;
        point.sync_status = status;
        Ok(())
    }
}

impl Default for GuestStore {
    fn default() -> Self {
        Self::from_parts(GuestProfile::default(), Vec::new(), Vec::new(), LocalIdCounter::new())
    }
}

impl GuestStore {
    /// Assemble a store from individually persisted pieces.
    ///
    /// The counter is moved below every negative id already stored, so a
    /// lost or stale counter never hands out an id twice.
    pub fn from_parts(
        profile: GuestProfile,
        points: Vec<LocalKnowledgePoint>,
        sessions: Vec<LearningSession>,
        mut counter: LocalIdCounter,
    ) -> Self {
        for id in points.iter().filter_map(|p| p.id.as_numeric()) {
            counter.reserve_below(id);
        }
        Self {
            profile,
            points,
            sessions: SessionLog::from_sessions(sessions),
            counter,
        }
    }
}

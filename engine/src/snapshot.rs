//! Snapshot types for persisting and restoring guest state.
//!
//! Snapshots are the bridge between the in-memory [`GuestStore`](crate::GuestStore)
//! and device storage or a native host.

use crate::{error::Result, Error, GuestProfile, LearningSession, LocalKnowledgePoint};
use serde::{Deserialize, Serialize};

/// Version of the snapshot format for future compatibility.
pub const SNAPSHOT_FORMAT_VERSION: u32 = 1;

/// A point-in-time snapshot of all guest data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuestSnapshot {
    /// Snapshot format version
    pub format_version: u32,
    pub profile: GuestProfile,
    /// Knowledge points in storage order
    #[serde(default)]
    pub knowledge_points: Vec<LocalKnowledgePoint>,
    /// Learning sessions, oldest first
    #[serde(default)]
    pub sessions: Vec<LearningSession>,
    /// Persisted value of the negative id counter
    #[serde(default)]
    pub next_local_id: i64,
}

impl GuestSnapshot {
    /// Create an empty snapshot around a profile.
    pub fn new(profile: GuestProfile) -> Self {
        Self {
            format_version: SNAPSHOT_FORMAT_VERSION,
            profile,
            knowledge_points: Vec::new(),
            sessions: Vec::new(),
            next_local_id: 0,
        }
    }

    /// Count records still waiting to be synced.
    pub fn pending_count(&self) -> usize {
        self.knowledge_points
            .iter()
            .filter(|p| p.is_pending_sync())
            .count()
    }

    /// Check that this snapshot can be loaded by this version of the engine.
    pub fn validate(&self) -> Result<()> {
        if self.format_version > SNAPSHOT_FORMAT_VERSION {
            return Err(Error::UnsupportedFormatVersion {
                supported: SNAPSHOT_FORMAT_VERSION,
                actual: self.format_version,
            });
        }
        Ok(())
    }

    /// Serialize to JSON.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| Error::InvalidSnapshot(e.to_string()))
    }

    /// Serialize to pretty JSON.
    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| Error::InvalidSnapshot(e.to_string()))
    }

    /// Deserialize from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        let snapshot: Self =
            serde_json::from_str(json).map_err(|e| Error::InvalidSnapshot(e.to_string()))?;
        snapshot.validate()?;
        Ok(snapshot)
    }

    /// Summary of the snapshot without the record data.
    pub fn metadata(&self) -> SnapshotMetadata {
        SnapshotMetadata {
            format_version: self.format_version,
            knowledge_point_count: self.knowledge_points.len(),
            pending_count: self.pending_count(),
            session_count: self.sessions.len(),
            next_local_id: self.next_local_id,
        }
    }
}

/// Metadata about a snapshot (without the full data).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotMetadata {
    pub format_version: u32,
    pub knowledge_point_count: usize,
    pub pending_count: usize,
    pub session_count: usize,
    pub next_local_id: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{KnowledgePointDraft, PointId};
    use serde_json::json;

    fn sample() -> GuestSnapshot {
        let mut snapshot = GuestSnapshot::new(GuestProfile::default());
        let draft = KnowledgePointDraft::from_value(json!({"id": "uuid-1"})).unwrap();
        snapshot
            .knowledge_points
            .push(LocalKnowledgePoint::from_draft(draft, -1));
        let synced: LocalKnowledgePoint =
            serde_json::from_value(json!({"id": 17, "category": "grammar"})).unwrap();
        assert_eq!(synced.id, PointId::Numeric(17));
        snapshot.knowledge_points.push(synced);
        snapshot.next_local_id = -2;
        snapshot
    }

    #[test]
    fn json_roundtrip() {
        let snapshot = sample();
        let json = snapshot.to_json().unwrap();
        let parsed = GuestSnapshot::from_json(&json).unwrap();
        assert_eq!(parsed, snapshot);
        assert!(json.contains("formatVersion"));
        assert!(json.contains("nextLocalId"));
    }

    #[test]
    fn rejects_newer_format() {
        let mut snapshot = sample();
        snapshot.format_version = SNAPSHOT_FORMAT_VERSION + 1;
        let json = snapshot.to_json().unwrap();

        let err = GuestSnapshot::from_json(&json).unwrap_err();
        assert_eq!(
            err,
            Error::UnsupportedFormatVersion {
                supported: SNAPSHOT_FORMAT_VERSION,
                actual: SNAPSHOT_FORMAT_VERSION + 1,
            }
        );
    }

    #[test]
    fn rejects_garbage() {
        let err = GuestSnapshot::from_json("{not json").unwrap_err();
        assert!(matches!(err, Error::InvalidSnapshot(_)));
    }

    #[test]
    fn metadata_counts_pending() {
        let meta = sample().metadata();
        assert_eq!(meta.knowledge_point_count, 2);
        assert_eq!(meta.pending_count, 1);
        assert_eq!(meta.session_count, 0);
        assert_eq!(meta.next_local_id, -2);
    }
}

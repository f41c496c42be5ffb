//! Learning session log.
//!
//! Every finished guest session is kept as a timestamped snapshot. Only the
//! most recent [`MAX_SESSIONS`] are retained.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Maximum number of sessions kept on the device.
pub const MAX_SESSIONS: usize = 50;

/// Snapshot of one learning session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearningSession {
    /// When the session finished (ISO-8601 on disk)
    pub timestamp: DateTime<Utc>,
    /// Free-form session payload (score, duration, question ids, ...)
    #[serde(flatten)]
    pub data: Map<String, Value>,
}

impl LearningSession {
    /// Create a session record with an empty payload.
    pub fn new(timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            data: Map::new(),
        }
    }

    /// Attach a payload entry.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }

    /// Check if the session happened on the same calendar day as `now`,
    /// in `now`'s timezone.
    pub fn is_same_day<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> bool {
        self.timestamp.with_timezone(&now.timezone()).date_naive() == now.date_naive()
    }
}

/// Bounded, insertion-ordered session log.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionLog {
    sessions: Vec<LearningSession>,
}

impl SessionLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self {
            sessions: Vec::new(),
        }
    }

    /// Build a log from persisted sessions, enforcing the bound.
    pub fn from_sessions(sessions: Vec<LearningSession>) -> Self {
        let mut log = Self { sessions };
        log.truncate();
        log
    }

    /// Append a session, evicting the oldest entries beyond the bound.
    pub fn push(&mut self, session: LearningSession) {
        self.sessions.push(session);
        self.truncate();
    }

    fn truncate(&mut self) {
        if self.sessions.len() > MAX_SESSIONS {
            let excess = self.sessions.len() - MAX_SESSIONS;
            self.sessions.drain(..excess);
        }
    }

    /// Count sessions that fall on `now`'s calendar day.
    pub fn count_on_day_of<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> usize {
        self.sessions.iter().filter(|s| s.is_same_day(now)).count()
    }

    /// All retained sessions, oldest first.
    pub fn as_slice(&self) -> &[LearningSession] {
        &self.sessions
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn clear(&mut self) {
        self.sessions.clear();
    }

    pub fn into_vec(self) -> Vec<LearningSession> {
        self.sessions
    }
}

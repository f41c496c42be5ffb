//! Guest profile counters and feature limits.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Completed sessions after which a guest is asked to register.
pub const PROMPT_SESSIONS_THRESHOLD: u32 = 5;
/// Learning time (seconds) after which a guest is asked to register.
pub const PROMPT_LEARNING_TIME_THRESHOLD: u64 = 1800;
/// Saved knowledge points after which a guest is asked to register.
pub const PROMPT_KNOWLEDGE_POINTS_THRESHOLD: u32 = 5;

/// Aggregate counters for an unauthenticated user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuestProfile {
    /// Total learning time in seconds
    #[serde(default)]
    pub total_learning_time: u64,
    #[serde(default)]
    pub knowledge_points_count: u32,
    #[serde(default)]
    pub sessions_completed: u32,
    pub created_at: DateTime<Utc>,
}

impl GuestProfile {
    /// Create a fresh profile.
    pub fn new(created_at: DateTime<Utc>) -> Self {
        Self {
            total_learning_time: 0,
            knowledge_points_count: 0,
            sessions_completed: 0,
            created_at,
        }
    }

    pub fn add_learning_time(&mut self, seconds: u64) {
        self.total_learning_time = self.total_learning_time.saturating_add(seconds);
    }

    pub fn complete_session(&mut self) {
        self.sessions_completed = self.sessions_completed.saturating_add(1);
    }

    pub fn add_knowledge_point(&mut self) {
        self.knowledge_points_count = self.knowledge_points_count.saturating_add(1);
    }

    /// Whether the guest has used the app enough to be asked to register.
    pub fn should_show_registration_prompt(&self) -> bool {
        self.sessions_completed >= PROMPT_SESSIONS_THRESHOLD
            || self.total_learning_time >= PROMPT_LEARNING_TIME_THRESHOLD
            || self.knowledge_points_count >= PROMPT_KNOWLEDGE_POINTS_THRESHOLD
    }
}

impl Default for GuestProfile {
    fn default() -> Self {
        Self::new(DateTime::<Utc>::UNIX_EPOCH)
    }
}

/// Capabilities that are limited in guest mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GuestFeature {
    /// Practice sessions per calendar day
    DailyPractice,
    /// Saved knowledge points in total
    KnowledgePointSave,
    AiModelAccess,
    CloudSync,
}

impl GuestFeature {
    pub const ALL: [GuestFeature; 4] = [
        GuestFeature::DailyPractice,
        GuestFeature::KnowledgePointSave,
        GuestFeature::AiModelAccess,
        GuestFeature::CloudSync,
    ];

    /// Ceiling for guests. Zero for features that are simply unavailable.
    pub fn limit(self) -> u32 {
        match self {
            GuestFeature::DailyPractice => 10,
            GuestFeature::KnowledgePointSave => 20,
            GuestFeature::AiModelAccess | GuestFeature::CloudSync => 0,
        }
    }

    /// Whether the feature is gated by a count rather than on/off.
    pub fn is_countable(self) -> bool {
        self.limit() > 0
    }
}

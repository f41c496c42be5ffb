//! Outcome of a sync run and the user-facing status summary.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Aggregate outcome of one sync run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    pub succeeded: usize,
    pub failed: usize,
    /// One message per failed record
    pub errors: Vec<String>,
}

impl SyncReport {
    pub fn attempted(&self) -> usize {
        self.succeeded + self.failed
    }
}

/// Snapshot of the sync manager's state for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncStatusSummary {
    pub is_syncing: bool,
    pub pending_count: usize,
    pub last_sync_at: Option<DateTime<Utc>>,
    /// Failures of the most recent run
    pub errors: Vec<String>,
}

impl SyncStatusSummary {
    /// Short human-readable status line.
    pub fn describe(&self, now: DateTime<Utc>) -> String {
        if self.is_syncing {
            return "Syncing…".to_string();
        }
        if self.pending_count > 0 {
            return format!("{} pending", self.pending_count);
        }
        match self.last_sync_at {
            Some(at) => format!("Last synced {}", format_elapsed(now - at)),
            None => "All synced".to_string(),
        }
    }
}

fn plural(n: i64, unit: &str) -> String {
    if n == 1 {
        format!("1 {} ago", unit)
    } else {
        format!("{} {}s ago", n, unit)
    }
}

fn format_elapsed(elapsed: chrono::Duration) -> String {
    if elapsed.num_minutes() < 1 {
        "just now".to_string()
    } else if elapsed.num_hours() < 1 {
        plural(elapsed.num_minutes(), "minute")
    } else if elapsed.num_days() < 1 {
        plural(elapsed.num_hours(), "hour")
    } else {
        plural(elapsed.num_days(), "day")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn summary() -> SyncStatusSummary {
        SyncStatusSummary {
            is_syncing: false,
            pending_count: 0,
            last_sync_at: None,
            errors: Vec::new(),
        }
    }

    #[test]
    fn describe_states() {
        let now = Utc.timestamp_opt(1_706_788_800, 0).unwrap();

        assert_eq!(summary().describe(now), "All synced");

        let syncing = SyncStatusSummary {
            is_syncing: true,
            pending_count: 4,
            ..summary()
        };
        assert_eq!(syncing.describe(now), "Syncing…");

        let pending = SyncStatusSummary {
            pending_count: 2,
            ..summary()
        };
        assert_eq!(pending.describe(now), "2 pending");

        let synced = |ago: Duration| SyncStatusSummary {
            last_sync_at: Some(now - ago),
            ..summary()
        };
        assert_eq!(synced(Duration::seconds(20)).describe(now), "Last synced just now");
        assert_eq!(synced(Duration::minutes(1)).describe(now), "Last synced 1 minute ago");
        assert_eq!(synced(Duration::minutes(45)).describe(now), "Last synced 45 minutes ago");
        assert_eq!(synced(Duration::hours(3)).describe(now), "Last synced 3 hours ago");
        assert_eq!(synced(Duration::days(2)).describe(now), "Last synced 2 days ago");
    }
}

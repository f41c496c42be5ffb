//! Notifications published while a sync run progresses.
//!
//! Events are JSON-serializable with a `type` tag so a native UI shell can
//! consume them as-is.

use serde::{Deserialize, Serialize};

use super::SyncReport;

/// Messages broadcast by the sync manager.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SyncEvent {
    /// A run began.
    Started {
        /// Records waiting to be pushed
        pending: usize,
    },

    /// One record was accepted by the server and removed locally.
    ItemSynced {
        /// Negative local id of the record
        local_id: i64,
    },

    /// One record failed and stays pending.
    ItemFailed {
        local_id: i64,
        message: String,
    },

    /// The run finished.
    Completed {
        succeeded: usize,
        failed: usize,
        /// Records still pending afterwards
        pending: usize,
    },
}

impl SyncEvent {
    /// Create a completion event from a run report.
    pub fn completed(report: &SyncReport, pending: usize) -> Self {
        SyncEvent::Completed {
            succeeded: report.succeeded,
            failed: report.failed,
            pending,
        }
    }
}

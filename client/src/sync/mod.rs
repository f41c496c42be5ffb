//! Guest-to-account synchronization.
//!
//! Once a user is authenticated, [`SyncManager`] pushes every locally pending
//! knowledge point to the server one at a time, removes the ones the server
//! accepted, and publishes progress as [`SyncEvent`]s.

mod events;
mod manager;
mod status;

pub use events::SyncEvent;
pub use manager::{SyncManager, SyncSettings};
pub use status::{SyncReport, SyncStatusSummary};

//! # Lingo Engine
//!
//! Deterministic guest-mode state for the Lingo language-learning client.
//!
//! While a learner uses the app without an account, every knowledge point,
//! learning session and usage counter lives on the device. This crate holds
//! that state and the rules around it; the `lingo-client` crate persists it
//! and pushes it to the server once the learner signs in.
//!
//! ## Design Principles
//!
//! - **No IO**: the engine has no knowledge of files, network, or platform
//! - **Deterministic**: callers pass the current time in; same inputs always
//!   produce the same outputs
//! - **Portable**: usable from Rust directly or from a native shell via [`ffi`]
//!
//! ## Core Concepts
//!
//! ### Local knowledge points
//!
//! A [`LocalKnowledgePoint`] gets a negative id from the [`LocalIdCounter`]
//! when it is saved. Negative ids never collide with server ids and mark the
//! record as pending sync; once pushed, the record is removed.
//!
//! ### Sessions and limits
//!
//! The [`SessionLog`] keeps the last [`MAX_SESSIONS`] sessions. Together with
//! the [`GuestProfile`] counters it decides [`GuestFeature`] availability and
//! when to ask the guest to register.
//!
//! ### Migration
//!
//! [`migrate`] repairs records written by older clients (string ids,
//! misplaced sentences, missing summaries). It is idempotent.
//!
//! ## Quick Start
//!
//! ```rust
//! use chrono::Utc;
//! use lingo_engine::{FinalizeRequest, GuestStore, KnowledgePointDraft};
//! use serde_json::json;
//!
//! let mut store = GuestStore::new(Utc::now());
//!
//! let draft = KnowledgePointDraft::from_value(json!({
//!     "id": "5b0c1e1e-8f6e-4c39-9b8b-2f0c0f3e6a11",
//!     "category": "grammar",
//!     "correct_phrase": "went",
//! }))
//! .unwrap();
//!
//! let point = store.save_local_knowledge_point(draft);
//! assert_eq!(point.pending_id(), Some(-1));
//!
//! let request = FinalizeRequest::from_local(&point);
//! assert_eq!(request.errors[0].correction, "went");
//! ```
//!
//! ## Persistence
//!
//! Use [`GuestStore::export_state`] and [`GuestStore::import_state`] with
//! [`GuestSnapshot`], or persist the pieces individually and rebuild with
//! [`GuestStore::from_parts`].

pub mod counter;
pub mod error;
pub mod ffi;
pub mod finalize;
pub mod migrate;
pub mod profile;
pub mod record;
pub mod session;
pub mod snapshot;
pub mod store;

// Re-export main types at crate root
pub use counter::LocalIdCounter;
pub use error::{Error, Result};
pub use finalize::{ErrorAnalysis, FinalizeRequest, QuestionData};
pub use migrate::{contains_cjk, MigrationReport};
pub use profile::{GuestFeature, GuestProfile};
pub use record::{KnowledgePointDraft, LocalKnowledgePoint, PointContent, PointId, SyncStatus};
pub use session::{LearningSession, SessionLog, MAX_SESSIONS};
pub use snapshot::{GuestSnapshot, SnapshotMetadata, SNAPSHOT_FORMAT_VERSION};
pub use store::GuestStore;

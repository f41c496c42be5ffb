//! # Lingo Client
//!
//! Async services around the [`lingo_engine`] guest store:
//!
//! - [`guest::GuestDataManager`] keeps guest-mode learning data on the device
//! - [`sync::SyncManager`] pushes it to the server once the learner signs in
//! - [`repository::KnowledgePointRepository`] serves server-owned knowledge
//!   points through a TTL cache with an offline copy
//!
//! Everything is wired together by [`app::AppServices`].
//!
//! ```no_run
//! # async fn run() -> lingo_client::Result<()> {
//! lingo_client::telemetry::init_tracing();
//! let services = lingo_client::AppServices::from_env().await?;
//!
//! services.login("learner@example.com", "secret").await?;
//! let points = services.repository.fetch_knowledge_points().await?;
//! println!("{} knowledge points", points.len());
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod app;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod guest;
pub mod repository;
pub mod sync;
pub mod telemetry;

pub use app::AppServices;
pub use config::{ClientConfig, ConfigError};
pub use error::{ClientError, Result};

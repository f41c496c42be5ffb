//! Device-local persistence backed by SQLite.

mod kv;
mod pool;

pub use kv::*;
pub use pool::*;

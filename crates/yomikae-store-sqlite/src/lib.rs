//! SQLite backend for the Yomikae reference store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. That thread also serialises writes:
//! batch imports and single upserts never interleave.

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use schema::{MigrationError, SCHEMA_VERSION};
pub use store::SqliteStore;

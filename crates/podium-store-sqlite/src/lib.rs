//! SQLite backend for the Podium athlete record store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on dedicated
//! connection threads without blocking the async runtime. Connections are
//! handed out by a bounded [`pool`].

mod athlete;
mod encode;
mod encounter;
mod history;
mod schema;
mod store;
mod tracking;

pub mod error;
pub mod pool;

pub use error::{Error, Result};
pub use pool::PoolConfig;
pub use store::SqliteStore;

//! A bounded pool of [`tokio_rusqlite::Connection`]s.
//!
//! The pool is the only shared mutable state of the store. It is opened once
//! at startup and closed on shutdown; everything else borrows a connection
//! for exactly one logical operation through [`Pool::acquire`]. The borrow
//! is returned when the [`PooledConnection`] guard drops, on every exit
//! path.
//!
//! A caller that abandons an operation only drops its guard: the closure
//! already handed to the connection thread still runs to completion (commit
//! or rollback) before that connection serves its next borrower.

use std::{
  ops::Deref,
  path::Path,
  sync::{Arc, Mutex, PoisonError},
  time::Duration,
};

use serde::Deserialize;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio_rusqlite::Connection;

use crate::{Error, Result, schema::SCHEMA};

// ─── Configuration ───────────────────────────────────────────────────────────

/// Pool sizing and wait limits.
#[derive(Debug, Clone, Deserialize)]
pub struct PoolConfig {
  /// Maximum number of open connections.
  #[serde(default = "default_size")]
  pub size:               usize,
  /// How long [`Pool::acquire`] waits for a free connection.
  #[serde(default = "default_acquire_timeout_ms")]
  pub acquire_timeout_ms: u64,
  /// SQLite busy timeout applied to every connection.
  #[serde(default = "default_busy_timeout_ms")]
  pub busy_timeout_ms:    u64,
}

const fn default_size() -> usize { 20 }

const fn default_acquire_timeout_ms() -> u64 { 2_000 }

const fn default_busy_timeout_ms() -> u64 { 5_000 }

impl Default for PoolConfig {
  fn default() -> Self {
    Self {
      size:               default_size(),
      acquire_timeout_ms: default_acquire_timeout_ms(),
      busy_timeout_ms:    default_busy_timeout_ms(),
    }
  }
}

/// Applied to every connection; `foreign_keys` is per-connection in SQLite.
const CONNECTION_PRAGMAS: &str = "PRAGMA foreign_keys = ON;";

// ─── Pool ────────────────────────────────────────────────────────────────────

pub struct Pool {
  idle:            Mutex<Vec<Connection>>,
  permits:         Arc<Semaphore>,
  acquire_timeout: Duration,
}

impl Pool {
  /// Open `config.size` connections to the database file at `path` and run
  /// schema initialisation once.
  pub async fn open(path: impl AsRef<Path>, config: &PoolConfig) -> Result<Self> {
    let size = config.size.max(1);
    let mut conns = Vec::with_capacity(size);
    for i in 0..size {
      let conn = Connection::open(path.as_ref()).await?;
      prepare(&conn, config, i == 0).await?;
      conns.push(conn);
    }
    tracing::info!(size, path = %path.as_ref().display(), "connection pool opened");
    Ok(Self::from_connections(conns, config))
  }

  /// A single-connection pool over a private in-memory database. Every
  /// operation shares that one connection, so concurrent borrowers queue.
  pub async fn open_in_memory(config: &PoolConfig) -> Result<Self> {
    let conn = Connection::open_in_memory().await?;
    prepare(&conn, config, true).await?;
    Ok(Self::from_connections(vec![conn], config))
  }

  fn from_connections(conns: Vec<Connection>, config: &PoolConfig) -> Self {
    let size = conns.len();
    Self {
      idle: Mutex::new(conns),
      permits: Arc::new(Semaphore::new(size)),
      acquire_timeout: Duration::from_millis(config.acquire_timeout_ms),
    }
  }

  /// Number of connections not currently borrowed.
  pub fn available(&self) -> usize { self.permits.available_permits() }

  /// Borrow a connection, waiting up to the configured acquire timeout.
  ///
  /// Fails with [`Error::PoolTimeout`] when the pool stays exhausted and with
  /// [`Error::PoolClosed`] after [`Pool::close`].
  pub async fn acquire(&self) -> Result<PooledConnection<'_>> {
    let permit = tokio::time::timeout(
      self.acquire_timeout,
      Arc::clone(&self.permits).acquire_owned(),
    )
    .await
    .map_err(|_| {
      tracing::warn!(timeout = ?self.acquire_timeout, "connection pool exhausted");
      Error::PoolTimeout(self.acquire_timeout)
    })?
    .map_err(|_| Error::PoolClosed)?;

    let conn = self
      .idle
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .pop()
      .ok_or(Error::PoolClosed)?;

    Ok(PooledConnection { conn, pool: self, _permit: permit })
  }

  /// Refuse further borrows and close every idle connection. Connections
  /// still borrowed are dropped when their guards are.
  pub async fn close(&self) {
    self.permits.close();
    let conns = std::mem::take(&mut *self.idle.lock().unwrap_or_else(PoisonError::into_inner));
    for conn in conns {
      if let Err(e) = conn.close().await {
        tracing::warn!(error = %e, "failed to close pooled connection");
      }
    }
    tracing::info!("connection pool closed");
  }

  fn give_back(&self, conn: Connection) {
    if self.permits.is_closed() {
      return;
    }
    self.idle.lock().unwrap_or_else(PoisonError::into_inner).push(conn);
  }
}

async fn prepare(conn: &Connection, config: &PoolConfig, init_schema: bool) -> Result<()> {
  let busy_timeout = Duration::from_millis(config.busy_timeout_ms);
  conn
    .call(move |conn| {
      conn.busy_timeout(busy_timeout)?;
      conn.execute_batch(CONNECTION_PRAGMAS)?;
      if init_schema {
        conn.execute_batch(SCHEMA)?;
      }
      Ok(())
    })
    .await?;
  Ok(())
}

// ─── Guard ───────────────────────────────────────────────────────────────────

/// A borrowed connection. Returned to the pool on drop.
pub struct PooledConnection<'a> {
  conn:    Connection,
  pool:    &'a Pool,
  // Released after `conn` is back in the idle list.
  _permit: OwnedSemaphorePermit,
}

impl Deref for PooledConnection<'_> {
  type Target = Connection;

  fn deref(&self) -> &Connection { &self.conn }
}

impl Drop for PooledConnection<'_> {
  // `Connection` is a cheap handle onto its worker thread; the clone goes
  // back to the idle list and this one is dropped.
  fn drop(&mut self) { self.pool.give_back(self.conn.clone()); }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn config(acquire_timeout_ms: u64) -> PoolConfig {
    PoolConfig { size: 1, acquire_timeout_ms, busy_timeout_ms: 100 }
  }

  #[tokio::test]
  async fn exhausted_pool_times_out() {
    let pool = Pool::open_in_memory(&config(20)).await.unwrap();
    let held = pool.acquire().await.unwrap();
    assert_eq!(pool.available(), 0);

    let err = pool.acquire().await.err().unwrap();
    assert!(matches!(err, Error::PoolTimeout(_)));

    drop(held);
    assert_eq!(pool.available(), 1);
    pool.acquire().await.unwrap();
  }

  #[tokio::test]
  async fn waiting_borrower_gets_released_connection() {
    let pool = Arc::new(Pool::open_in_memory(&config(1_000)).await.unwrap());
    let held = pool.acquire().await.unwrap();

    let waiter = {
      let pool = Arc::clone(&pool);
      tokio::spawn(async move { pool.acquire().await.map(|_| ()) })
    };
    tokio::time::sleep(Duration::from_millis(20)).await;
    drop(held);

    waiter.await.unwrap().unwrap();
    assert_eq!(pool.available(), 1);
  }

  #[tokio::test]
  async fn closed_pool_refuses_borrows() {
    let pool = Pool::open_in_memory(&config(20)).await.unwrap();
    pool.close().await;
    assert!(matches!(pool.acquire().await, Err(Error::PoolClosed)));
  }

  #[tokio::test]
  async fn foreign_keys_are_enforced_on_every_connection() {
    let pool = Pool::open_in_memory(&config(20)).await.unwrap();
    let conn = pool.acquire().await.unwrap();
    let on: i64 = conn
      .call(|conn| Ok(conn.query_row("PRAGMA foreign_keys", [], |r| r.get(0))?))
      .await
      .unwrap();
    assert_eq!(on, 1);
  }
}

//! [`SqliteStore`], the SQLite implementation of [`ClinicalStore`].

use std::{path::Path, sync::Arc};

use podium_core::{
  athlete::{Athlete, AthleteProfile, AthleteQuery, AthleteUpdate, Discipline, NewDiscipline},
  encounter::{Encounter, EncounterDetail, EncounterQuery, NewEncounter},
  history::AthleteHistory,
  store::ClinicalStore,
  tracking::{TrackingKind, TrackingRecord},
};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::{
  Error, Result, athlete, encounter, history,
  pool::{Pool, PoolConfig},
  tracking,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Podium clinical store backed by a pool of SQLite connections.
///
/// Cloning is cheap; clones share the pool.
#[derive(Clone)]
pub struct SqliteStore {
  pool: Arc<Pool>,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>, config: &PoolConfig) -> Result<Self> {
    let pool = Pool::open(path, config).await?;
    Ok(Self { pool: Arc::new(pool) })
  }

  /// Open an in-memory store, useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let pool = Pool::open_in_memory(&PoolConfig::default()).await?;
    Ok(Self { pool: Arc::new(pool) })
  }

  /// The underlying connection pool.
  pub fn pool(&self) -> &Pool { &self.pool }

  /// Close the pool. Later operations on any clone fail with
  /// [`Error::PoolClosed`].
  pub async fn close(&self) { self.pool.close().await }
}

// ─── ClinicalStore impl ──────────────────────────────────────────────────────

impl ClinicalStore for SqliteStore {
  type Error = Error;

  // ── Disciplines ───────────────────────────────────────────────────────────

  async fn add_discipline(&self, input: NewDiscipline) -> Result<Discipline> {
    athlete::add_discipline(&self.pool, input).await
  }

  async fn list_disciplines(&self) -> Result<Vec<Discipline>> {
    athlete::list_disciplines(&self.pool).await
  }

  // ── Athletes ──────────────────────────────────────────────────────────────

  async fn register_athlete(&self, profile: AthleteProfile, actor: Uuid) -> Result<Athlete> {
    athlete::register(&self.pool, profile, actor).await
  }

  async fn update_athlete(&self, id: Uuid, update: AthleteUpdate) -> Result<Athlete> {
    athlete::update(&self.pool, id, update).await
  }

  async fn get_athlete(&self, id: Uuid) -> Result<Option<Athlete>> {
    athlete::get(&self.pool, id).await
  }

  async fn list_athletes<'a>(&'a self, query: &'a AthleteQuery) -> Result<Vec<Athlete>> {
    athlete::list(&self.pool, query).await
  }

  // ── Encounters ────────────────────────────────────────────────────────────

  async fn record_encounter(&self, input: NewEncounter, actor: Uuid) -> Result<Encounter> {
    encounter::record(&self.pool, input, actor).await
  }

  async fn get_encounter(&self, id: Uuid) -> Result<Option<EncounterDetail>> {
    encounter::get(&self.pool, id).await
  }

  async fn list_encounters<'a>(&'a self, query: &'a EncounterQuery) -> Result<Vec<Encounter>> {
    encounter::list(&self.pool, query, None).await
  }

  // ── Tracking records ──────────────────────────────────────────────────────

  async fn record_tracking(
    &self,
    kind: TrackingKind,
    payload: Map<String, Value>,
    actor: Uuid,
  ) -> Result<TrackingRecord> {
    let record = kind.validate(&payload)?;
    tracking::insert(&self.pool, record, actor).await
  }

  async fn list_tracking(
    &self,
    kind: TrackingKind,
    athlete_id: Uuid,
    limit: Option<usize>,
  ) -> Result<Vec<TrackingRecord>> {
    tracking::list(&self.pool, kind, athlete_id, limit).await
  }

  // ── History ───────────────────────────────────────────────────────────────

  async fn athlete_history(&self, athlete_id: Uuid) -> Result<AthleteHistory> {
    history::compose(&self.pool, athlete_id).await
  }
}

//! The `ClinicalStore` trait.
//!
//! The trait is implemented by storage backends (e.g. `podium-store-sqlite`).
//! Higher layers (`podium-api`, `podium-server`) depend on this abstraction,
//! not on any concrete backend.

use std::future::Future;

use serde_json::{Map, Value};
use uuid::Uuid;

use crate::{
  Classify,
  athlete::{Athlete, AthleteProfile, AthleteQuery, AthleteUpdate, Discipline, NewDiscipline},
  encounter::{Encounter, EncounterDetail, EncounterQuery, NewEncounter},
  history::AthleteHistory,
  tracking::{TrackingKind, TrackingRecord},
};

/// Abstraction over a Podium store backend.
///
/// Every `actor` argument is the verified id of the acting user, supplied by
/// the identity layer in front of the store; it is trusted as given.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait ClinicalStore: Send + Sync {
  type Error: std::error::Error + Classify + Send + Sync + 'static;

  // ── Disciplines ───────────────────────────────────────────────────────

  fn add_discipline(
    &self,
    input: NewDiscipline,
  ) -> impl Future<Output = Result<Discipline, Self::Error>> + Send + '_;

  /// Active disciplines, ordered by name.
  fn list_disciplines(
    &self,
  ) -> impl Future<Output = Result<Vec<Discipline>, Self::Error>> + Send + '_;

  // ── Athletes ──────────────────────────────────────────────────────────

  /// Register an athlete, deriving its age from the birth date. A duplicate
  /// document number fails with a conflict.
  fn register_athlete(
    &self,
    profile: AthleteProfile,
    actor: Uuid,
  ) -> impl Future<Output = Result<Athlete, Self::Error>> + Send + '_;

  /// Replace an athlete's profile and re-derive its age.
  fn update_athlete(
    &self,
    id: Uuid,
    update: AthleteUpdate,
  ) -> impl Future<Output = Result<Athlete, Self::Error>> + Send + '_;

  /// Retrieve an athlete by UUID. Returns `None` if not found.
  fn get_athlete(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Athlete>, Self::Error>> + Send + '_;

  /// Athletes matching `query`, ordered by last names then first names.
  fn list_athletes<'a>(
    &'a self,
    query: &'a AthleteQuery,
  ) -> impl Future<Output = Result<Vec<Athlete>, Self::Error>> + Send + 'a;

  // ── Encounters ────────────────────────────────────────────────────────

  /// Persist an encounter and all of its children as one atomic unit.
  ///
  /// Either every row is committed or none is. Children are written in the
  /// order given. The returned encounter does not include the children.
  fn record_encounter(
    &self,
    input: NewEncounter,
    actor: Uuid,
  ) -> impl Future<Output = Result<Encounter, Self::Error>> + Send + '_;

  /// An encounter with its children. Returns `None` if not found.
  fn get_encounter(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<EncounterDetail>, Self::Error>> + Send + '_;

  /// Encounters matching `query`, newest visit first.
  fn list_encounters<'a>(
    &'a self,
    query: &'a EncounterQuery,
  ) -> impl Future<Output = Result<Vec<Encounter>, Self::Error>> + Send + 'a;

  // ── Tracking records ──────────────────────────────────────────────────

  /// Validate `payload` against `kind`'s schema, stamp the actor column with
  /// `actor` and insert one row. Returns the stored row.
  fn record_tracking(
    &self,
    kind: TrackingKind,
    payload: Map<String, Value>,
    actor: Uuid,
  ) -> impl Future<Output = Result<TrackingRecord, Self::Error>> + Send + '_;

  /// Records of `kind` for an athlete, newest first, at most `limit`.
  fn list_tracking(
    &self,
    kind: TrackingKind,
    athlete_id: Uuid,
    limit: Option<usize>,
  ) -> impl Future<Output = Result<Vec<TrackingRecord>, Self::Error>> + Send + '_;

  // ── History ───────────────────────────────────────────────────────────

  /// Compose the athlete's profile with its recent history. Fails with a
  /// not-found error if the athlete does not exist, and returns no partial
  /// result if any read fails.
  fn athlete_history(
    &self,
    athlete_id: Uuid,
  ) -> impl Future<Output = Result<AthleteHistory, Self::Error>> + Send + '_;
}

//! The composed longitudinal history of one athlete.

use serde::{Deserialize, Serialize};

use crate::{athlete::Athlete, encounter::Encounter, tracking::TrackingRecord};

/// How many of the most recent rows each history section holds. `None`
/// means unbounded.
pub const ENCOUNTER_WINDOW: Option<usize> = Some(10);
pub const MEASURE_WINDOW: Option<usize> = Some(5);
pub const PERFORMANCE_TEST_WINDOW: Option<usize> = Some(10);
pub const INJURY_WINDOW: Option<usize> = None;
pub const NUTRITION_WINDOW: Option<usize> = Some(5);
pub const LAB_WINDOW: Option<usize> = Some(5);

/// Profile plus recent history; never stored, always read fresh. Every
/// sequence is newest first and empty rather than absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AthleteHistory {
  pub athlete:           Athlete,
  pub encounters:        Vec<Encounter>,
  pub measures:          Vec<TrackingRecord>,
  pub performance_tests: Vec<TrackingRecord>,
  pub injuries:          Vec<TrackingRecord>,
  pub nutrition:         Vec<TrackingRecord>,
  pub labs:              Vec<TrackingRecord>,
}

//! The history aggregator.
//!
//! Seven independent reads fan out concurrently, each borrowing its own
//! pooled connection. The first failure cancels the rest; no partial
//! history is ever returned.

use podium_core::{
  encounter::EncounterQuery,
  history::{
    AthleteHistory, ENCOUNTER_WINDOW, INJURY_WINDOW, LAB_WINDOW, MEASURE_WINDOW,
    NUTRITION_WINDOW, PERFORMANCE_TEST_WINDOW,
  },
  tracking::TrackingKind,
};
use uuid::Uuid;

use crate::{Error, Result, athlete, encounter, pool::Pool, tracking};

pub async fn compose(pool: &Pool, athlete_id: Uuid) -> Result<AthleteHistory> {
  let encounter_query = EncounterQuery { athlete_id: Some(athlete_id), ..Default::default() };

  let (athlete, encounters, measures, performance_tests, injuries, nutrition, labs) = tokio::try_join!(
    athlete::get(pool, athlete_id),
    encounter::list(pool, &encounter_query, ENCOUNTER_WINDOW),
    tracking::list(pool, TrackingKind::Measure, athlete_id, MEASURE_WINDOW),
    tracking::list(pool, TrackingKind::PerformanceTest, athlete_id, PERFORMANCE_TEST_WINDOW),
    tracking::list(pool, TrackingKind::Injury, athlete_id, INJURY_WINDOW),
    tracking::list(pool, TrackingKind::Nutrition, athlete_id, NUTRITION_WINDOW),
    tracking::list(pool, TrackingKind::Lab, athlete_id, LAB_WINDOW),
  )?;

  let athlete = athlete.ok_or(Error::AthleteNotFound(athlete_id))?;

  tracing::debug!(
    %athlete_id,
    encounters = encounters.len(),
    measures = measures.len(),
    performance_tests = performance_tests.len(),
    injuries = injuries.len(),
    nutrition = nutrition.len(),
    labs = labs.len(),
    "athlete history composed"
  );

  Ok(AthleteHistory {
    athlete,
    encounters,
    measures,
    performance_tests,
    injuries,
    nutrition,
    labs,
  })
}

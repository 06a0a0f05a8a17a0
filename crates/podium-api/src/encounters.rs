//! Handlers for `/encounters` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/encounters` | Optional `?athlete_id=`, `?from=`, `?until=` (`YYYY-MM-DD`) |
//! | `POST` | `/encounters` | Body: visit fields plus `physical_exam`, `diagnoses`, `requested_exams`, `management_plans` |
//! | `GET`  | `/encounters/{id}` | The encounter with its children; 404 if not found |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use podium_core::{
  encounter::{Encounter, EncounterDetail, EncounterQuery, NewEncounter},
  store::ClinicalStore,
};
use uuid::Uuid;

use crate::{
  actor::Actor,
  error::{ApiError, AppJson},
};

/// `GET /encounters`
pub async fn list<S: ClinicalStore>(
  State(store): State<Arc<S>>,
  Query(query): Query<EncounterQuery>,
) -> Result<Json<Vec<Encounter>>, ApiError> {
  let encounters = store.list_encounters(&query).await.map_err(ApiError::store)?;
  Ok(Json(encounters))
}

/// `POST /encounters`. The authenticated actor becomes the clinician.
pub async fn create<S: ClinicalStore>(
  State(store): State<Arc<S>>,
  Actor(actor): Actor,
  AppJson(input): AppJson<NewEncounter>,
) -> Result<impl IntoResponse, ApiError> {
  let encounter = store
    .record_encounter(input, actor)
    .await
    .map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(encounter)))
}

/// `GET /encounters/{id}`
pub async fn get_one<S: ClinicalStore>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<EncounterDetail>, ApiError> {
  let detail = store
    .get_encounter(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("encounter {id} not found")))?;
  Ok(Json(detail))
}

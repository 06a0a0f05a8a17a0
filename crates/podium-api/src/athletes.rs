//! Handlers for `/athletes` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/athletes` | Optional `?active=`, `?discipline_id=`, `?text=` |
//! | `POST` | `/athletes` | Body: an athlete profile; 409 on duplicate document |
//! | `GET`  | `/athletes/{id}` | 404 if not found |
//! | `PUT`  | `/athletes/{id}` | Body: profile plus optional `active` |
//! | `GET`  | `/athletes/{id}/history` | 404 if the athlete does not exist |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use podium_core::{
  athlete::{Athlete, AthleteProfile, AthleteQuery, AthleteUpdate},
  history::AthleteHistory,
  store::ClinicalStore,
};
use uuid::Uuid;

use crate::{
  actor::Actor,
  error::{ApiError, AppJson},
};

/// `GET /athletes`
pub async fn list<S: ClinicalStore>(
  State(store): State<Arc<S>>,
  Query(query): Query<AthleteQuery>,
) -> Result<Json<Vec<Athlete>>, ApiError> {
  let athletes = store.list_athletes(&query).await.map_err(ApiError::store)?;
  Ok(Json(athletes))
}

/// `POST /athletes`
pub async fn create<S: ClinicalStore>(
  State(store): State<Arc<S>>,
  Actor(actor): Actor,
  AppJson(profile): AppJson<AthleteProfile>,
) -> Result<impl IntoResponse, ApiError> {
  let athlete = store
    .register_athlete(profile, actor)
    .await
    .map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(athlete)))
}

/// `GET /athletes/{id}`
pub async fn get_one<S: ClinicalStore>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Athlete>, ApiError> {
  let athlete = store
    .get_athlete(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("athlete {id} not found")))?;
  Ok(Json(athlete))
}

/// `PUT /athletes/{id}`
pub async fn update<S: ClinicalStore>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
  _actor: Actor,
  AppJson(update): AppJson<AthleteUpdate>,
) -> Result<Json<Athlete>, ApiError> {
  let athlete = store
    .update_athlete(id, update)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(athlete))
}

/// `GET /athletes/{id}/history`
pub async fn history<S: ClinicalStore>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<AthleteHistory>, ApiError> {
  let history = store.athlete_history(id).await.map_err(ApiError::store)?;
  Ok(Json(history))
}

//! Handlers for `/disciplines` endpoints.

use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use podium_core::{
  athlete::{Discipline, NewDiscipline},
  store::ClinicalStore,
};

use crate::{
  actor::Actor,
  error::{ApiError, AppJson},
};

/// `GET /disciplines`, active ones only.
pub async fn list<S: ClinicalStore>(
  State(store): State<Arc<S>>,
) -> Result<Json<Vec<Discipline>>, ApiError> {
  let disciplines = store.list_disciplines().await.map_err(ApiError::store)?;
  Ok(Json(disciplines))
}

/// `POST /disciplines`
pub async fn create<S: ClinicalStore>(
  State(store): State<Arc<S>>,
  _actor: Actor,
  AppJson(input): AppJson<NewDiscipline>,
) -> Result<impl IntoResponse, ApiError> {
  let discipline = store.add_discipline(input).await.map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(discipline)))
}

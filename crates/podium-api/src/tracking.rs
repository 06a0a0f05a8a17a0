//! Handlers for `/tracking/{kind}` endpoints.
//!
//! `{kind}` is one of `measure`, `performance-test`, `injury`, `nutrition`,
//! `lab` or `other`. The request body is a flat JSON object whose keys are
//! checked against that kind's column whitelist.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use podium_core::{
  store::ClinicalStore,
  tracking::{TrackingKind, TrackingRecord},
};
use serde::Deserialize;
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::{
  actor::Actor,
  error::{ApiError, AppJson},
};

fn parse_kind(kind: &str) -> Result<TrackingKind, ApiError> {
  kind.parse().map_err(|e: podium_core::Error| ApiError::BadRequest(e.to_string()))
}

/// `POST /tracking/{kind}`
pub async fn create<S: ClinicalStore>(
  State(store): State<Arc<S>>,
  Path(kind): Path<String>,
  Actor(actor): Actor,
  AppJson(payload): AppJson<Map<String, Value>>,
) -> Result<impl IntoResponse, ApiError> {
  let kind = parse_kind(&kind)?;
  let record = store
    .record_tracking(kind, payload, actor)
    .await
    .map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(record)))
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub limit: Option<usize>,
}

/// `GET /tracking/{kind}/{athlete_id}[?limit=<n>]`
pub async fn list<S: ClinicalStore>(
  State(store): State<Arc<S>>,
  Path((kind, athlete_id)): Path<(String, Uuid)>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<TrackingRecord>>, ApiError> {
  let kind = parse_kind(&kind)?;
  let records = store
    .list_tracking(kind, athlete_id, params.limit)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(records))
}

//! The dynamic record builder: one insert path for all six tracking kinds.
//!
//! Statements are assembled from the static per-kind schema in
//! `podium-core`; payload keys are only ever used to look up a schema
//! column, never spliced into SQL.

use chrono::Utc;
use podium_core::tracking::{TrackingKind, TrackingRecord, ValidatedRecord};
use rusqlite::types::Value as SqlValue;
use uuid::Uuid;

use crate::{
  Result,
  encode::{RawTrackingRecord, encode_dt, encode_scalar, encode_uuid, tracking_columns},
  pool::Pool,
};

/// `INSERT` statement and parameters for one validated record, stamped with
/// `actor` in the kind's actor column.
fn insert_statement(
  record: &ValidatedRecord,
  record_id: Uuid,
  actor: Uuid,
) -> (String, Vec<SqlValue>) {
  let kind = record.kind;

  let mut names = vec!["record_id", "athlete_id", kind.actor_column(), "created_at"];
  let mut params = vec![
    SqlValue::Text(encode_uuid(record_id)),
    SqlValue::Text(encode_uuid(record.athlete_id)),
    SqlValue::Text(encode_uuid(actor)),
    SqlValue::Text(encode_dt(Utc::now())),
  ];
  for (column, value) in &record.values {
    names.push(column.name);
    params.push(encode_scalar(value));
  }

  let placeholders = (1..=names.len())
    .map(|i| format!("?{i}"))
    .collect::<Vec<_>>()
    .join(", ");
  let sql = format!(
    "INSERT INTO {} ({}) VALUES ({placeholders})",
    kind.table(),
    names.join(", "),
  );
  (sql, params)
}

/// Insert one validated record and read the stored row back on the same
/// connection.
pub async fn insert(pool: &Pool, record: ValidatedRecord, actor: Uuid) -> Result<TrackingRecord> {
  let kind = record.kind;
  let record_id = Uuid::new_v4();
  let (insert_sql, params) = insert_statement(&record, record_id, actor);
  let select_sql = format!(
    "SELECT {} FROM {} WHERE record_id = ?1",
    tracking_columns(kind),
    kind.table(),
  );
  let id_str = encode_uuid(record_id);

  tracing::debug!(%kind, %record_id, columns = record.values.len(), "inserting tracking record");

  let conn = pool.acquire().await?;
  let raw: RawTrackingRecord = conn
    .call(move |conn| {
      conn.execute(&insert_sql, rusqlite::params_from_iter(params))?;
      Ok(conn.query_row(&select_sql, rusqlite::params![id_str], |row| {
        RawTrackingRecord::from_row(kind, row)
      })?)
    })
    .await?;
  drop(conn);

  raw.into_record(kind)
}

/// Records of `kind` for `athlete_id`, newest first by the kind's date column.
pub async fn list(
  pool: &Pool,
  kind: TrackingKind,
  athlete_id: Uuid,
  limit: Option<usize>,
) -> Result<Vec<TrackingRecord>> {
  let limit_clause = match limit {
    Some(n) => format!(" LIMIT {n}"),
    None => String::new(),
  };
  let sql = format!(
    "SELECT {} FROM {} WHERE athlete_id = ?1 ORDER BY {} DESC, created_at DESC{limit_clause}",
    tracking_columns(kind),
    kind.table(),
    kind.date_column(),
  );
  let athlete_str = encode_uuid(athlete_id);

  let conn = pool.acquire().await?;
  let raws: Vec<RawTrackingRecord> = conn
    .call(move |conn| {
      let mut stmt = conn.prepare(&sql)?;
      let rows = stmt
        .query_map(rusqlite::params![athlete_str], |row| {
          RawTrackingRecord::from_row(kind, row)
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
      Ok(rows)
    })
    .await?;
  drop(conn);

  raws.into_iter().map(|raw| raw.into_record(kind)).collect()
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  #[test]
  fn insert_names_only_schema_columns() {
    let payload = json!({
      "athlete_id": Uuid::new_v4(),
      "lab_date": "2024-05-01",
      "test_type": "Ferritin",
      "clinician_id": Uuid::new_v4(),
    });
    let record = TrackingKind::Lab
      .validate(payload.as_object().unwrap())
      .unwrap();
    let actor = Uuid::new_v4();
    let (sql, params) = insert_statement(&record, Uuid::new_v4(), actor);

    assert_eq!(
      sql,
      "INSERT INTO lab_results (record_id, athlete_id, clinician_id, created_at, \
       lab_date, test_type) VALUES (?1, ?2, ?3, ?4, ?5, ?6)"
    );
    assert_eq!(params[2], SqlValue::Text(encode_uuid(actor)));
  }
}

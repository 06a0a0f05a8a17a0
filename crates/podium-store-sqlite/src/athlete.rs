//! Disciplines and athlete registration.

use chrono::Utc;
use podium_core::athlete::{
  Athlete, AthleteProfile, AthleteQuery, AthleteUpdate, Discipline, NewDiscipline, derive_age,
};
use rusqlite::{OptionalExtension as _, types::Value as SqlValue};
use uuid::Uuid;

use crate::{
  Error, Result,
  encode::{
    ATHLETE_COLUMNS, DISCIPLINE_COLUMNS, RawAthlete, RawDiscipline, encode_date, encode_dt,
    encode_uuid,
  },
  pool::Pool,
};

// ─── Disciplines ─────────────────────────────────────────────────────────────

pub async fn add_discipline(pool: &Pool, input: NewDiscipline) -> Result<Discipline> {
  input.validate()?;

  let discipline = Discipline {
    discipline_id: Uuid::new_v4(),
    name:          input.name.trim().to_owned(),
    category:      input.category,
    description:   input.description,
    active:        true,
    created_at:    Utc::now(),
  };

  let id_str = encode_uuid(discipline.discipline_id);
  let at_str = encode_dt(discipline.created_at);
  let name = discipline.name.clone();
  let category = discipline.category.clone();
  let description = discipline.description.clone();

  let conn = pool.acquire().await?;
  conn
    .call(move |conn| {
      conn.execute(
        "INSERT INTO disciplines (discipline_id, name, category, description, active, created_at)
         VALUES (?1, ?2, ?3, ?4, 1, ?5)",
        rusqlite::params![id_str, name, category, description, at_str],
      )?;
      Ok(())
    })
    .await?;

  Ok(discipline)
}

pub async fn list_disciplines(pool: &Pool) -> Result<Vec<Discipline>> {
  let conn = pool.acquire().await?;
  let raws: Vec<RawDiscipline> = conn
    .call(|conn| {
      let mut stmt = conn.prepare(&format!(
        "SELECT {DISCIPLINE_COLUMNS} FROM disciplines WHERE active = 1 ORDER BY name"
      ))?;
      let rows = stmt
        .query_map([], RawDiscipline::from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
      Ok(rows)
    })
    .await?;
  drop(conn);

  raws.into_iter().map(RawDiscipline::into_discipline).collect()
}

// ─── Athletes ────────────────────────────────────────────────────────────────

/// Profile columns in the order [`profile_params`] binds them.
const PROFILE_COLUMNS: [&str; 17] = [
  "document_type",
  "document_number",
  "first_names",
  "last_names",
  "birth_date",
  "sex",
  "address",
  "municipality",
  "phone",
  "mobile",
  "email",
  "emergency_contact",
  "emergency_phone",
  "health_insurer",
  "blood_type",
  "discipline_id",
  "photo_url",
];

fn text(value: Option<String>) -> SqlValue { value.map_or(SqlValue::Null, SqlValue::Text) }

fn profile_params(profile: AthleteProfile) -> Vec<SqlValue> {
  vec![
    SqlValue::Text(profile.document_type.trim().to_owned()),
    SqlValue::Text(profile.document_number.trim().to_owned()),
    SqlValue::Text(profile.first_names.trim().to_owned()),
    SqlValue::Text(profile.last_names.trim().to_owned()),
    SqlValue::Text(encode_date(profile.birth_date)),
    text(profile.sex),
    text(profile.address),
    text(profile.municipality),
    text(profile.phone),
    text(profile.mobile),
    text(profile.email),
    text(profile.emergency_contact),
    text(profile.emergency_phone),
    text(profile.health_insurer),
    text(profile.blood_type),
    text(profile.discipline_id.map(encode_uuid)),
    text(profile.photo_url),
  ]
}

fn select_athlete_sql() -> String {
  format!("SELECT {ATHLETE_COLUMNS} FROM athletes WHERE athlete_id = ?1")
}

/// Insert a new athlete. A duplicate document number surfaces as
/// [`Error::Conflict`] from the table's unique constraint.
pub async fn register(pool: &Pool, profile: AthleteProfile, actor: Uuid) -> Result<Athlete> {
  profile.validate()?;

  let athlete_id = Uuid::new_v4();
  let age = derive_age(profile.birth_date);

  let mut names: Vec<&str> = vec!["athlete_id"];
  names.extend(PROFILE_COLUMNS);
  names.extend(["age", "active", "registered_by", "created_at"]);

  let mut params = vec![SqlValue::Text(encode_uuid(athlete_id))];
  params.extend(profile_params(profile));
  params.extend([
    SqlValue::Integer(i64::from(age)),
    SqlValue::Integer(1),
    SqlValue::Text(encode_uuid(actor)),
    SqlValue::Text(encode_dt(Utc::now())),
  ]);

  let placeholders = (1..=names.len())
    .map(|i| format!("?{i}"))
    .collect::<Vec<_>>()
    .join(", ");
  let insert_sql = format!(
    "INSERT INTO athletes ({}) VALUES ({placeholders})",
    names.join(", ")
  );
  let select_sql = select_athlete_sql();
  let id_str = encode_uuid(athlete_id);

  let conn = pool.acquire().await?;
  let raw: RawAthlete = conn
    .call(move |conn| {
      conn.execute(&insert_sql, rusqlite::params_from_iter(params))?;
      Ok(conn.query_row(&select_sql, rusqlite::params![id_str], RawAthlete::from_row)?)
    })
    .await?;
  drop(conn);

  tracing::info!(%athlete_id, age, "athlete registered");
  raw.into_athlete()
}

/// Replace the profile of an existing athlete and re-derive its age.
pub async fn update(pool: &Pool, athlete_id: Uuid, update: AthleteUpdate) -> Result<Athlete> {
  update.profile.validate()?;

  let age = derive_age(update.profile.birth_date);
  let assignments = PROFILE_COLUMNS
    .iter()
    .enumerate()
    .map(|(i, name)| format!("{name} = ?{}", i + 1))
    .collect::<Vec<_>>()
    .join(", ");
  let n = PROFILE_COLUMNS.len();
  let update_sql = format!(
    "UPDATE athletes SET {assignments}, age = ?{}, active = COALESCE(?{}, active)
     WHERE athlete_id = ?{}",
    n + 1,
    n + 2,
    n + 3,
  );

  let mut params = profile_params(update.profile);
  params.extend([
    SqlValue::Integer(i64::from(age)),
    update.active.map_or(SqlValue::Null, |a| SqlValue::Integer(i64::from(a))),
    SqlValue::Text(encode_uuid(athlete_id)),
  ]);
  let select_sql = select_athlete_sql();
  let id_str = encode_uuid(athlete_id);

  let conn = pool.acquire().await?;
  let raw: Option<RawAthlete> = conn
    .call(move |conn| {
      let changed = conn.execute(&update_sql, rusqlite::params_from_iter(params))?;
      if changed == 0 {
        return Ok(None);
      }
      Ok(Some(conn.query_row(
        &select_sql,
        rusqlite::params![id_str],
        RawAthlete::from_row,
      )?))
    })
    .await?;
  drop(conn);

  raw
    .ok_or(Error::AthleteNotFound(athlete_id))?
    .into_athlete()
}

pub async fn get(pool: &Pool, athlete_id: Uuid) -> Result<Option<Athlete>> {
  let sql = select_athlete_sql();
  let id_str = encode_uuid(athlete_id);

  let conn = pool.acquire().await?;
  let raw: Option<RawAthlete> = conn
    .call(move |conn| {
      Ok(conn
        .query_row(&sql, rusqlite::params![id_str], RawAthlete::from_row)
        .optional()?)
    })
    .await?;
  drop(conn);

  raw.map(RawAthlete::into_athlete).transpose()
}

/// Make `%` and `_` match literally under `ESCAPE '\'`.
fn escape_like(text: &str) -> String {
  let mut out = String::with_capacity(text.len());
  for c in text.chars() {
    if matches!(c, '\\' | '%' | '_') {
      out.push('\\');
    }
    out.push(c);
  }
  out
}

pub async fn list(pool: &Pool, query: &AthleteQuery) -> Result<Vec<Athlete>> {
  let mut clauses: Vec<String> = Vec::new();
  let mut params: Vec<SqlValue> = Vec::new();

  if let Some(active) = query.active {
    params.push(SqlValue::Integer(i64::from(active)));
    clauses.push(format!("active = ?{}", params.len()));
  }
  if let Some(discipline_id) = query.discipline_id {
    params.push(SqlValue::Text(encode_uuid(discipline_id)));
    clauses.push(format!("discipline_id = ?{}", params.len()));
  }
  if let Some(text) = query.text.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
    params.push(SqlValue::Text(format!("%{}%", escape_like(text))));
    let p = params.len();
    clauses.push(format!(
      "(first_names LIKE ?{p} ESCAPE '\\' \
       OR last_names LIKE ?{p} ESCAPE '\\' \
       OR document_number LIKE ?{p} ESCAPE '\\')"
    ));
  }

  let where_clause = if clauses.is_empty() {
    String::new()
  } else {
    format!(" WHERE {}", clauses.join(" AND "))
  };
  let sql = format!(
    "SELECT {ATHLETE_COLUMNS} FROM athletes{where_clause} ORDER BY last_names, first_names"
  );

  let conn = pool.acquire().await?;
  let raws: Vec<RawAthlete> = conn
    .call(move |conn| {
      let mut stmt = conn.prepare(&sql)?;
      let rows = stmt
        .query_map(rusqlite::params_from_iter(params), RawAthlete::from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
      Ok(rows)
    })
    .await?;
  drop(conn);

  raws.into_iter().map(RawAthlete::into_athlete).collect()
}

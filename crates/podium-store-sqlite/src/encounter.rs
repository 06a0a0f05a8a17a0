//! The composite encounter writer and encounter reads.
//!
//! An encounter and all of its children are written inside one SQLite
//! transaction run by a single connection-thread closure. Any failing
//! statement returns early, the transaction guard drops, and SQLite rolls
//! everything back.

use chrono::Utc;
use podium_core::encounter::{
  Diagnosis, DiagnosisKind, Encounter, EncounterDetail, EncounterQuery, ManagementPlan,
  NewEncounter, PhysicalExam, RequestedExam,
};
use rusqlite::{Connection, OptionalExtension as _, Row, types::Value as SqlValue};
use uuid::Uuid;

use crate::{
  Error, Result,
  encode::{
    ENCOUNTER_COLUMNS, RawEncounter, decode_date, encode_date, encode_dt, encode_time,
    encode_uuid,
  },
  pool::Pool,
};

// ─── Write ───────────────────────────────────────────────────────────────────

fn insert_encounter(conn: &Connection, encounter: &Encounter) -> rusqlite::Result<()> {
  let visit = &encounter.visit;
  conn.execute(
    &format!(
      "INSERT INTO encounters ({ENCOUNTER_COLUMNS})
       VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)"
    ),
    rusqlite::params![
      encode_uuid(encounter.encounter_id),
      encode_uuid(visit.athlete_id),
      encode_date(visit.visit_date),
      encode_time(visit.visit_time),
      visit.reason,
      visit.current_illness,
      visit.personal_history,
      visit.family_history,
      visit.surgical_history,
      visit.allergy_history,
      visit.current_medications,
      visit.habits,
      visit.systems_review,
      encode_uuid(encounter.clinician_id),
      encode_dt(encounter.created_at),
    ],
  )?;
  Ok(())
}

const PHYSICAL_EXAM_COLUMNS: &str = "weight_kg, height_cm, bmi, blood_pressure, heart_rate, \
  respiratory_rate, temperature_c, oxygen_saturation, general_state, head_neck, thorax, \
  cardiovascular, respiratory, abdomen, extremities, neurological, skin, notes";

fn insert_physical_exam(
  conn: &Connection,
  encounter_id: &str,
  exam: &PhysicalExam,
) -> rusqlite::Result<()> {
  conn.execute(
    &format!(
      "INSERT INTO physical_exams (encounter_id, {PHYSICAL_EXAM_COLUMNS})
       VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19)"
    ),
    rusqlite::params![
      encounter_id,
      exam.weight_kg,
      exam.height_cm,
      exam.bmi,
      exam.blood_pressure,
      exam.heart_rate,
      exam.respiratory_rate,
      exam.temperature_c,
      exam.oxygen_saturation,
      exam.general_state,
      exam.head_neck,
      exam.thorax,
      exam.cardiovascular,
      exam.respiratory,
      exam.abdomen,
      exam.extremities,
      exam.neurological,
      exam.skin,
      exam.notes,
    ],
  )?;
  Ok(())
}

fn insert_diagnosis(
  conn: &Connection,
  encounter_id: &str,
  position: usize,
  diagnosis: &Diagnosis,
) -> rusqlite::Result<()> {
  conn.execute(
    "INSERT INTO diagnoses (diagnosis_id, encounter_id, position, kind, code, description)
     VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
    rusqlite::params![
      encode_uuid(Uuid::new_v4()),
      encounter_id,
      position as i64,
      diagnosis.kind.as_str(),
      diagnosis.code.trim(),
      diagnosis.description,
    ],
  )?;
  Ok(())
}

fn insert_requested_exam(
  conn: &Connection,
  encounter_id: &str,
  position: usize,
  exam: &RequestedExam,
) -> rusqlite::Result<()> {
  conn.execute(
    "INSERT INTO requested_exams
       (exam_id, encounter_id, position, exam_type, exam_name, justification, urgent)
     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
    rusqlite::params![
      encode_uuid(Uuid::new_v4()),
      encounter_id,
      position as i64,
      exam.exam_type,
      exam.exam_name,
      exam.justification,
      exam.urgent,
    ],
  )?;
  Ok(())
}

fn insert_management_plan(
  conn: &Connection,
  encounter_id: &str,
  position: usize,
  plan: &ManagementPlan,
) -> rusqlite::Result<()> {
  conn.execute(
    "INSERT INTO management_plans
       (plan_id, encounter_id, position, plan_type, description, medication, dose,
        route, frequency, duration, recommendations, next_follow_up)
     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
    rusqlite::params![
      encode_uuid(Uuid::new_v4()),
      encounter_id,
      position as i64,
      plan.plan_type,
      plan.description,
      plan.medication,
      plan.dose,
      plan.route,
      plan.frequency,
      plan.duration,
      plan.recommendations,
      plan.next_follow_up.map(encode_date),
    ],
  )?;
  Ok(())
}

/// Write `input` and all of its children atomically, authored by `actor`.
///
/// Top-level validation happens before a connection is borrowed. Once the
/// transaction is open, any failure (a bad child row, a missing athlete, a
/// lost connection) yields [`Error::EncounterRolledBack`] and leaves no row
/// behind.
pub async fn record(pool: &Pool, input: NewEncounter, actor: Uuid) -> Result<Encounter> {
  input.validate()?;

  let NewEncounter { visit, physical_exam, diagnoses, requested_exams, management_plans } = input;
  let encounter = Encounter {
    encounter_id: Uuid::new_v4(),
    visit,
    clinician_id: actor,
    created_at: Utc::now(),
  };
  let encounter_id = encounter.encounter_id;
  tracing::debug!(
    %encounter_id,
    athlete_id = %encounter.visit.athlete_id,
    physical_exam = physical_exam.is_some(),
    diagnoses = diagnoses.len(),
    requested_exams = requested_exams.len(),
    management_plans = management_plans.len(),
    "recording encounter"
  );

  let row = encounter.clone();
  let conn = pool.acquire().await?;
  conn
    .call(move |conn| {
      let tx = conn.transaction()?;
      let id_str = encode_uuid(row.encounter_id);

      insert_encounter(&tx, &row)?;
      if let Some(exam) = &physical_exam {
        insert_physical_exam(&tx, &id_str, exam)?;
      }
      for (position, diagnosis) in diagnoses.iter().enumerate() {
        insert_diagnosis(&tx, &id_str, position, diagnosis)?;
      }
      for (position, exam) in requested_exams.iter().enumerate() {
        insert_requested_exam(&tx, &id_str, position, exam)?;
      }
      for (position, plan) in management_plans.iter().enumerate() {
        insert_management_plan(&tx, &id_str, position, plan)?;
      }

      tx.commit()?;
      Ok(())
    })
    .await
    .map_err(|e| {
      tracing::warn!(%encounter_id, error = %e, "encounter write rolled back");
      Error::EncounterRolledBack(e)
    })?;
  drop(conn);

  Ok(encounter)
}

// ─── Read ────────────────────────────────────────────────────────────────────

fn physical_exam_from_row(row: &Row<'_>) -> rusqlite::Result<PhysicalExam> {
  Ok(PhysicalExam {
    weight_kg:         row.get(0)?,
    height_cm:         row.get(1)?,
    bmi:               row.get(2)?,
    blood_pressure:    row.get(3)?,
    heart_rate:        row.get(4)?,
    respiratory_rate:  row.get(5)?,
    temperature_c:     row.get(6)?,
    oxygen_saturation: row.get(7)?,
    general_state:     row.get(8)?,
    head_neck:         row.get(9)?,
    thorax:            row.get(10)?,
    cardiovascular:    row.get(11)?,
    respiratory:       row.get(12)?,
    abdomen:           row.get(13)?,
    extremities:       row.get(14)?,
    neurological:      row.get(15)?,
    skin:              row.get(16)?,
    notes:             row.get(17)?,
  })
}

struct RawDiagnosis {
  kind:        String,
  code:        String,
  description: Option<String>,
}

impl RawDiagnosis {
  fn into_diagnosis(self) -> Result<Diagnosis> {
    let kind = DiagnosisKind::parse(&self.kind)
      .ok_or_else(|| Error::Corrupt(format!("diagnosis kind {:?}", self.kind)))?;
    Ok(Diagnosis { kind, code: self.code, description: self.description })
  }
}

struct RawPlan {
  plan:           ManagementPlan,
  next_follow_up: Option<String>,
}

impl RawPlan {
  fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      plan:           ManagementPlan {
        plan_type:       row.get(0)?,
        description:     row.get(1)?,
        medication:      row.get(2)?,
        dose:            row.get(3)?,
        route:           row.get(4)?,
        frequency:       row.get(5)?,
        duration:        row.get(6)?,
        recommendations: row.get(7)?,
        next_follow_up:  None,
      },
      next_follow_up: row.get(8)?,
    })
  }

  fn into_plan(self) -> Result<ManagementPlan> {
    let next_follow_up = self.next_follow_up.as_deref().map(decode_date).transpose()?;
    Ok(ManagementPlan { next_follow_up, ..self.plan })
  }
}

struct RawDetail {
  encounter:        RawEncounter,
  physical_exam:    Option<PhysicalExam>,
  diagnoses:        Vec<RawDiagnosis>,
  requested_exams:  Vec<RequestedExam>,
  management_plans: Vec<RawPlan>,
}

fn read_detail(conn: &Connection, id_str: &str) -> rusqlite::Result<Option<RawDetail>> {
  let Some(encounter) = conn
    .query_row(
      &format!("SELECT {ENCOUNTER_COLUMNS} FROM encounters WHERE encounter_id = ?1"),
      rusqlite::params![id_str],
      RawEncounter::from_row,
    )
    .optional()?
  else {
    return Ok(None);
  };

  let physical_exam = conn
    .query_row(
      &format!("SELECT {PHYSICAL_EXAM_COLUMNS} FROM physical_exams WHERE encounter_id = ?1"),
      rusqlite::params![id_str],
      physical_exam_from_row,
    )
    .optional()?;

  let diagnoses = conn
    .prepare(
      "SELECT kind, code, description FROM diagnoses
       WHERE encounter_id = ?1 ORDER BY position",
    )?
    .query_map(rusqlite::params![id_str], |row| {
      Ok(RawDiagnosis {
        kind:        row.get(0)?,
        code:        row.get(1)?,
        description: row.get(2)?,
      })
    })?
    .collect::<rusqlite::Result<Vec<_>>>()?;

  let requested_exams = conn
    .prepare(
      "SELECT exam_type, exam_name, justification, urgent FROM requested_exams
       WHERE encounter_id = ?1 ORDER BY position",
    )?
    .query_map(rusqlite::params![id_str], |row| {
      Ok(RequestedExam {
        exam_type:     row.get(0)?,
        exam_name:     row.get(1)?,
        justification: row.get(2)?,
        urgent:        row.get(3)?,
      })
    })?
    .collect::<rusqlite::Result<Vec<_>>>()?;

  let management_plans = conn
    .prepare(
      "SELECT plan_type, description, medication, dose, route, frequency, duration,
              recommendations, next_follow_up
       FROM management_plans WHERE encounter_id = ?1 ORDER BY position",
    )?
    .query_map(rusqlite::params![id_str], RawPlan::from_row)?
    .collect::<rusqlite::Result<Vec<_>>>()?;

  Ok(Some(RawDetail {
    encounter,
    physical_exam,
    diagnoses,
    requested_exams,
    management_plans,
  }))
}

/// An encounter with its children in the order they were written.
pub async fn get(pool: &Pool, encounter_id: Uuid) -> Result<Option<EncounterDetail>> {
  let id_str = encode_uuid(encounter_id);

  let conn = pool.acquire().await?;
  let raw: Option<RawDetail> = conn
    .call(move |conn| Ok(read_detail(conn, &id_str)?))
    .await?;
  drop(conn);

  let Some(raw) = raw else {
    return Ok(None);
  };
  Ok(Some(EncounterDetail {
    encounter:        raw.encounter.into_encounter()?,
    physical_exam:    raw.physical_exam,
    diagnoses:        raw
      .diagnoses
      .into_iter()
      .map(RawDiagnosis::into_diagnosis)
      .collect::<Result<_>>()?,
    requested_exams:  raw.requested_exams,
    management_plans: raw
      .management_plans
      .into_iter()
      .map(RawPlan::into_plan)
      .collect::<Result<_>>()?,
  }))
}

/// Encounters matching `query`, newest visit first, at most `limit`.
pub async fn list(
  pool: &Pool,
  query: &EncounterQuery,
  limit: Option<usize>,
) -> Result<Vec<Encounter>> {
  let mut clauses: Vec<String> = Vec::new();
  let mut params: Vec<SqlValue> = Vec::new();

  if let Some(athlete_id) = query.athlete_id {
    params.push(SqlValue::Text(encode_uuid(athlete_id)));
    clauses.push(format!("athlete_id = ?{}", params.len()));
  }
  if let Some(from) = query.from {
    params.push(SqlValue::Text(encode_date(from)));
    clauses.push(format!("visit_date >= ?{}", params.len()));
  }
  if let Some(until) = query.until {
    params.push(SqlValue::Text(encode_date(until)));
    clauses.push(format!("visit_date <= ?{}", params.len()));
  }

  let where_clause = if clauses.is_empty() {
    String::new()
  } else {
    format!(" WHERE {}", clauses.join(" AND "))
  };
  let limit_clause = limit.map(|n| format!(" LIMIT {n}")).unwrap_or_default();
  let sql = format!(
    "SELECT {ENCOUNTER_COLUMNS} FROM encounters{where_clause}
     ORDER BY visit_date DESC, visit_time DESC, created_at DESC{limit_clause}"
  );

  let conn = pool.acquire().await?;
  let raws: Vec<RawEncounter> = conn
    .call(move |conn| {
      let mut stmt = conn.prepare(&sql)?;
      let rows = stmt
        .query_map(rusqlite::params_from_iter(params), RawEncounter::from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
      Ok(rows)
    })
    .await?;
  drop(conn);

  raws.into_iter().map(RawEncounter::into_encounter).collect()
}

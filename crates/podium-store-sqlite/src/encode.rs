//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings, calendar dates as `YYYY-MM-DD`
//! and times of day as `HH:MM:SS`, so lexical order is chronological order.
//! UUIDs are stored as hyphenated lowercase strings.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use podium_core::{
  athlete::{Athlete, AthleteProfile, Discipline},
  encounter::{Encounter, VisitDetails},
  tracking::{ColumnType, Scalar, TrackingKind, TrackingRecord},
};
use rusqlite::{Row, types::Value as SqlValue};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── NaiveDate / NaiveTime ───────────────────────────────────────────────────

pub fn encode_date(d: NaiveDate) -> String { d.format("%Y-%m-%d").to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d")
    .map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

pub fn encode_time(t: NaiveTime) -> String { t.format("%H:%M:%S").to_string() }

pub fn decode_time(s: &str) -> Result<NaiveTime> {
  NaiveTime::parse_from_str(s, "%H:%M:%S")
    .map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

// ─── Tracking values ─────────────────────────────────────────────────────────

pub fn encode_scalar(value: &Scalar) -> SqlValue {
  match value {
    Scalar::Bool(b) => SqlValue::Integer(i64::from(*b)),
    Scalar::Integer(i) => SqlValue::Integer(*i),
    Scalar::Real(f) => SqlValue::Real(*f),
    Scalar::Text(s) => SqlValue::Text(s.clone()),
    Scalar::Date(d) => SqlValue::Text(encode_date(*d)),
  }
}

/// Render a stored column value as JSON according to its schema type.
pub fn decode_column(ty: ColumnType, value: SqlValue) -> Value {
  match (ty, value) {
    (_, SqlValue::Null) => Value::Null,
    (ColumnType::Bool, SqlValue::Integer(i)) => Value::Bool(i != 0),
    (ColumnType::Real, SqlValue::Integer(i)) => serde_json::Number::from_f64(i as f64)
      .map(Value::Number)
      .unwrap_or(Value::Null),
    (_, SqlValue::Integer(i)) => Value::from(i),
    (_, SqlValue::Real(f)) => serde_json::Number::from_f64(f)
      .map(Value::Number)
      .unwrap_or(Value::Null),
    (_, SqlValue::Text(s)) => Value::String(s),
    (_, SqlValue::Blob(_)) => Value::Null,
  }
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Select list matching [`RawDiscipline::from_row`].
pub const DISCIPLINE_COLUMNS: &str =
  "discipline_id, name, category, description, active, created_at";

/// Raw values read directly from a `disciplines` row.
pub struct RawDiscipline {
  pub discipline_id: String,
  pub name:          String,
  pub category:      Option<String>,
  pub description:   Option<String>,
  pub active:        bool,
  pub created_at:    String,
}

impl RawDiscipline {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      discipline_id: row.get(0)?,
      name:          row.get(1)?,
      category:      row.get(2)?,
      description:   row.get(3)?,
      active:        row.get(4)?,
      created_at:    row.get(5)?,
    })
  }

  pub fn into_discipline(self) -> Result<Discipline> {
    Ok(Discipline {
      discipline_id: decode_uuid(&self.discipline_id)?,
      name:          self.name,
      category:      self.category,
      description:   self.description,
      active:        self.active,
      created_at:    decode_dt(&self.created_at)?,
    })
  }
}

/// Select list matching [`RawAthlete::from_row`].
pub const ATHLETE_COLUMNS: &str = "athlete_id, document_type, document_number, \
  first_names, last_names, birth_date, age, sex, address, municipality, phone, \
  mobile, email, emergency_contact, emergency_phone, health_insurer, blood_type, \
  discipline_id, photo_url, active, registered_by, created_at";

/// Raw values read directly from an `athletes` row.
pub struct RawAthlete {
  pub athlete_id:        String,
  pub document_type:     String,
  pub document_number:   String,
  pub first_names:       String,
  pub last_names:        String,
  pub birth_date:        String,
  pub age:               u32,
  pub sex:               Option<String>,
  pub address:           Option<String>,
  pub municipality:      Option<String>,
  pub phone:             Option<String>,
  pub mobile:            Option<String>,
  pub email:             Option<String>,
  pub emergency_contact: Option<String>,
  pub emergency_phone:   Option<String>,
  pub health_insurer:    Option<String>,
  pub blood_type:        Option<String>,
  pub discipline_id:     Option<String>,
  pub photo_url:         Option<String>,
  pub active:            bool,
  pub registered_by:     String,
  pub created_at:        String,
}

impl RawAthlete {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      athlete_id:        row.get(0)?,
      document_type:     row.get(1)?,
      document_number:   row.get(2)?,
      first_names:       row.get(3)?,
      last_names:        row.get(4)?,
      birth_date:        row.get(5)?,
      age:               row.get(6)?,
      sex:               row.get(7)?,
      address:           row.get(8)?,
      municipality:      row.get(9)?,
      phone:             row.get(10)?,
      mobile:            row.get(11)?,
      email:             row.get(12)?,
      emergency_contact: row.get(13)?,
      emergency_phone:   row.get(14)?,
      health_insurer:    row.get(15)?,
      blood_type:        row.get(16)?,
      discipline_id:     row.get(17)?,
      photo_url:         row.get(18)?,
      active:            row.get(19)?,
      registered_by:     row.get(20)?,
      created_at:        row.get(21)?,
    })
  }

  pub fn into_athlete(self) -> Result<Athlete> {
    Ok(Athlete {
      athlete_id:    decode_uuid(&self.athlete_id)?,
      profile:       AthleteProfile {
        document_type:     self.document_type,
        document_number:   self.document_number,
        first_names:       self.first_names,
        last_names:        self.last_names,
        birth_date:        decode_date(&self.birth_date)?,
        sex:               self.sex,
        address:           self.address,
        municipality:      self.municipality,
        phone:             self.phone,
        mobile:            self.mobile,
        email:             self.email,
        emergency_contact: self.emergency_contact,
        emergency_phone:   self.emergency_phone,
        health_insurer:    self.health_insurer,
        blood_type:        self.blood_type,
        discipline_id:     self.discipline_id.as_deref().map(decode_uuid).transpose()?,
        photo_url:         self.photo_url,
      },
      age:           self.age,
      active:        self.active,
      registered_by: decode_uuid(&self.registered_by)?,
      created_at:    decode_dt(&self.created_at)?,
    })
  }
}

/// Select list matching [`RawEncounter::from_row`].
pub const ENCOUNTER_COLUMNS: &str = "encounter_id, athlete_id, visit_date, \
  visit_time, reason, current_illness, personal_history, family_history, \
  surgical_history, allergy_history, current_medications, habits, \
  systems_review, clinician_id, created_at";

/// Raw values read directly from an `encounters` row.
pub struct RawEncounter {
  pub encounter_id:        String,
  pub athlete_id:          String,
  pub visit_date:          String,
  pub visit_time:          String,
  pub reason:              String,
  pub current_illness:     Option<String>,
  pub personal_history:    Option<String>,
  pub family_history:      Option<String>,
  pub surgical_history:    Option<String>,
  pub allergy_history:     Option<String>,
  pub current_medications: Option<String>,
  pub habits:              Option<String>,
  pub systems_review:      Option<String>,
  pub clinician_id:        String,
  pub created_at:          String,
}

impl RawEncounter {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      encounter_id:        row.get(0)?,
      athlete_id:          row.get(1)?,
      visit_date:          row.get(2)?,
      visit_time:          row.get(3)?,
      reason:              row.get(4)?,
      current_illness:     row.get(5)?,
      personal_history:    row.get(6)?,
      family_history:      row.get(7)?,
      surgical_history:    row.get(8)?,
      allergy_history:     row.get(9)?,
      current_medications: row.get(10)?,
      habits:              row.get(11)?,
      systems_review:      row.get(12)?,
      clinician_id:        row.get(13)?,
      created_at:          row.get(14)?,
    })
  }

  pub fn into_encounter(self) -> Result<Encounter> {
    Ok(Encounter {
      encounter_id: decode_uuid(&self.encounter_id)?,
      visit:        VisitDetails {
        athlete_id:          decode_uuid(&self.athlete_id)?,
        visit_date:          decode_date(&self.visit_date)?,
        visit_time:          decode_time(&self.visit_time)?,
        reason:              self.reason,
        current_illness:     self.current_illness,
        personal_history:    self.personal_history,
        family_history:      self.family_history,
        surgical_history:    self.surgical_history,
        allergy_history:     self.allergy_history,
        current_medications: self.current_medications,
        habits:              self.habits,
        systems_review:      self.systems_review,
      },
      clinician_id: decode_uuid(&self.clinician_id)?,
      created_at:   decode_dt(&self.created_at)?,
    })
  }
}

/// Select list for a tracking table: the four fixed columns followed by the
/// kind's payload columns in schema order.
pub fn tracking_columns(kind: TrackingKind) -> String {
  let mut names = vec!["record_id", "athlete_id", kind.actor_column(), "created_at"];
  names.extend(kind.columns().iter().map(|c| c.name));
  names.join(", ")
}

/// Raw values read from a tracking row selected with [`tracking_columns`].
pub struct RawTrackingRecord {
  pub record_id:  String,
  pub athlete_id: String,
  pub actor_id:   String,
  pub created_at: String,
  pub values:     Vec<SqlValue>,
}

impl RawTrackingRecord {
  pub fn from_row(kind: TrackingKind, row: &Row<'_>) -> rusqlite::Result<Self> {
    let values = (0..kind.columns().len())
      .map(|i| row.get::<_, SqlValue>(4 + i))
      .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(Self {
      record_id: row.get(0)?,
      athlete_id: row.get(1)?,
      actor_id: row.get(2)?,
      created_at: row.get(3)?,
      values,
    })
  }

  pub fn into_record(self, kind: TrackingKind) -> Result<TrackingRecord> {
    let fields: Map<String, Value> = kind
      .columns()
      .iter()
      .zip(self.values)
      .map(|(column, value)| (column.name.to_owned(), decode_column(column.ty, value)))
      .collect();

    Ok(TrackingRecord {
      record_id: decode_uuid(&self.record_id)?,
      kind,
      athlete_id: decode_uuid(&self.athlete_id)?,
      actor_id: decode_uuid(&self.actor_id)?,
      created_at: decode_dt(&self.created_at)?,
      fields,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn dates_and_times_sort_lexically() {
    let a = encode_date(NaiveDate::from_ymd_opt(2024, 2, 9).unwrap());
    let b = encode_date(NaiveDate::from_ymd_opt(2024, 11, 1).unwrap());
    assert!(a < b);
    assert_eq!(a, "2024-02-09");

    let t = NaiveTime::from_hms_opt(7, 5, 0).unwrap();
    assert_eq!(encode_time(t), "07:05:00");
    assert_eq!(decode_time("07:05:00").unwrap(), t);
  }

  #[test]
  fn bool_columns_decode_from_integers() {
    assert_eq!(decode_column(ColumnType::Bool, SqlValue::Integer(1)), Value::Bool(true));
    assert_eq!(decode_column(ColumnType::Bool, SqlValue::Integer(0)), Value::Bool(false));
    assert_eq!(decode_column(ColumnType::Text, SqlValue::Null), Value::Null);
  }

  #[test]
  fn real_columns_decode_integral_storage_as_numbers() {
    let v = decode_column(ColumnType::Real, SqlValue::Integer(75));
    assert_eq!(v.as_f64(), Some(75.0));
  }

  #[test]
  fn scalar_encoding() {
    assert_eq!(encode_scalar(&Scalar::Bool(true)), SqlValue::Integer(1));
    assert_eq!(
      encode_scalar(&Scalar::Date(NaiveDate::from_ymd_opt(2024, 1, 5).unwrap())),
      SqlValue::Text("2024-01-05".into())
    );
  }

  #[test]
  fn tracking_select_list_leads_with_fixed_columns() {
    let cols = tracking_columns(TrackingKind::Injury);
    assert!(cols.starts_with("record_id, athlete_id, recorded_by, created_at, injured_on"));
  }
}

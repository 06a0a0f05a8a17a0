//! Tracking records: the six longitudinal record kinds written through one
//! schema-driven code path.
//!
//! Every kind carries a fixed, ordered column schema. Caller payloads are
//! loosely-typed JSON maps; [`TrackingKind::validate`] checks every key
//! against the schema and converts every value to the column's type before a
//! statement is ever built. Column names reaching SQL therefore always come
//! from the static schema, never from the payload.

use std::{fmt, str::FromStr};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::{Error, Result};

/// The subject reference column shared by every kind.
pub const ATHLETE_COLUMN: &str = "athlete_id";

// ─── Column schema ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
  Text,
  Integer,
  Real,
  /// Calendar date, `YYYY-MM-DD`.
  Date,
  Bool,
}

impl ColumnType {
  fn describe(self) -> &'static str {
    match self {
      Self::Text => "a string",
      Self::Integer => "an integer",
      Self::Real => "a number",
      Self::Date => "a YYYY-MM-DD date",
      Self::Bool => "a boolean",
    }
  }
}

/// One legal column of a tracking kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
  pub name:     &'static str,
  pub ty:       ColumnType,
  pub required: bool,
}

const fn req(name: &'static str, ty: ColumnType) -> Column {
  Column { name, ty, required: true }
}

const fn opt(name: &'static str, ty: ColumnType) -> Column {
  Column { name, ty, required: false }
}

use ColumnType::{Bool, Date, Integer, Real, Text};

const MEASURE_COLUMNS: &[Column] = &[
  req("measured_on", Date),
  opt("weight_kg", Real),
  opt("height_cm", Real),
  opt("bmi", Real),
  opt("body_fat_pct", Real),
  opt("muscle_mass_kg", Real),
  opt("arm_circumference_cm", Real),
  opt("waist_circumference_cm", Real),
  opt("hip_circumference_cm", Real),
  opt("leg_circumference_cm", Real),
  opt("notes", Text),
];

const PERFORMANCE_TEST_COLUMNS: &[Column] = &[
  req("tested_on", Date),
  req("test_name", Text),
  opt("test_category", Text),
  opt("result_value", Real),
  opt("unit", Text),
  opt("attempt", Integer),
  opt("notes", Text),
];

const INJURY_COLUMNS: &[Column] = &[
  req("injured_on", Date),
  req("injury_type", Text),
  opt("affected_area", Text),
  opt("severity", Text),
  opt("description", Text),
  opt("diagnosis", Text),
  opt("treatment", Text),
  opt("estimated_recovery_days", Integer),
  opt("recovered_on", Date),
  opt("recovered", Bool),
  opt("notes", Text),
];

const NUTRITION_COLUMNS: &[Column] = &[
  req("followed_up_on", Date),
  opt("current_weight_kg", Real),
  opt("target_weight_kg", Real),
  req("meal_plan", Text),
  opt("recommendations", Text),
  opt("notes", Text),
];

const LAB_COLUMNS: &[Column] = &[
  req("lab_date", Date),
  req("test_type", Text),
  opt("results", Text),
  opt("reference_range", Text),
  opt("interpretation", Text),
  opt("notes", Text),
];

const OTHER_COLUMNS: &[Column] = &[
  req("followed_up_on", Date),
  req("follow_up_type", Text),
  opt("description", Text),
  opt("recommendations", Text),
  opt("notes", Text),
];

// ─── TrackingKind ────────────────────────────────────────────────────────────

/// The closed set of tracking record kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TrackingKind {
  /// Anthropometric measures.
  Measure,
  PerformanceTest,
  Injury,
  /// Nutrition follow-ups.
  Nutrition,
  /// Laboratory results.
  Lab,
  /// Other professional follow-ups.
  Other,
}

impl TrackingKind {
  pub const ALL: [Self; 6] = [
    Self::Measure,
    Self::PerformanceTest,
    Self::Injury,
    Self::Nutrition,
    Self::Lab,
    Self::Other,
  ];

  /// The selector string; matches the serde representation.
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Measure => "measure",
      Self::PerformanceTest => "performance-test",
      Self::Injury => "injury",
      Self::Nutrition => "nutrition",
      Self::Lab => "lab",
      Self::Other => "other",
    }
  }

  pub fn table(self) -> &'static str {
    match self {
      Self::Measure => "anthropometric_measures",
      Self::PerformanceTest => "performance_tests",
      Self::Injury => "injuries",
      Self::Nutrition => "nutrition_follow_ups",
      Self::Lab => "lab_results",
      Self::Other => "other_follow_ups",
    }
  }

  /// The column stamped with the acting user's id.
  pub fn actor_column(self) -> &'static str {
    match self {
      Self::Measure | Self::PerformanceTest => "evaluator_id",
      Self::Injury => "recorded_by",
      Self::Nutrition => "nutritionist_id",
      Self::Lab => "clinician_id",
      Self::Other => "professional_id",
    }
  }

  /// The date column records of this kind are ordered by, newest first.
  pub fn date_column(self) -> &'static str {
    match self {
      Self::Measure => "measured_on",
      Self::PerformanceTest => "tested_on",
      Self::Injury => "injured_on",
      Self::Nutrition | Self::Other => "followed_up_on",
      Self::Lab => "lab_date",
    }
  }

  /// Legal payload columns, in storage order. Excludes the athlete reference
  /// and the actor column, which every kind carries.
  pub fn columns(self) -> &'static [Column] {
    match self {
      Self::Measure => MEASURE_COLUMNS,
      Self::PerformanceTest => PERFORMANCE_TEST_COLUMNS,
      Self::Injury => INJURY_COLUMNS,
      Self::Nutrition => NUTRITION_COLUMNS,
      Self::Lab => LAB_COLUMNS,
      Self::Other => OTHER_COLUMNS,
    }
  }

  pub fn column(self, name: &str) -> Option<&'static Column> {
    self.columns().iter().find(|c| c.name == name)
  }

  /// Check `payload` against this kind's schema and convert it to typed
  /// values.
  ///
  /// - Keys outside the schema fail with [`Error::UnknownColumn`].
  /// - A value for the actor column is discarded; the store stamps it.
  /// - Missing, `null` or blank required columns fail with
  ///   [`Error::MissingField`]. Optional columns given as `null` or blank are
  ///   left out, so the stored row takes the column default.
  /// - Numeric and boolean columns also accept their string spelling, as
  ///   submitted by HTML forms. Text columns store numbers and booleans
  ///   in their JSON spelling.
  pub fn validate(self, payload: &Map<String, Value>) -> Result<ValidatedRecord> {
    for key in payload.keys() {
      let legal = key == ATHLETE_COLUMN
        || key == self.actor_column()
        || self.column(key).is_some();
      if !legal {
        return Err(Error::UnknownColumn {
          kind:   self.as_str(),
          column: key.clone(),
        });
      }
    }

    let athlete_id = match payload.get(ATHLETE_COLUMN).map(non_blank) {
      Some(Some(Value::String(s))) => {
        Uuid::parse_str(s.trim()).map_err(|_| Error::InvalidValue {
          column:   ATHLETE_COLUMN.into(),
          expected: "a UUID",
          found:    s.clone(),
        })?
      }
      Some(Some(other)) => {
        return Err(Error::InvalidValue {
          column:   ATHLETE_COLUMN.into(),
          expected: "a UUID",
          found:    other.to_string(),
        });
      }
      _ => return Err(Error::MissingField(ATHLETE_COLUMN)),
    };

    let mut values = Vec::new();
    for column in self.columns() {
      match payload.get(column.name).and_then(non_blank) {
        Some(value) => values.push((column, convert(column, value)?)),
        None if column.required => return Err(Error::MissingField(column.name)),
        None => {}
      }
    }

    Ok(ValidatedRecord { kind: self, athlete_id, values })
  }
}

impl fmt::Display for TrackingKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for TrackingKind {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> {
    Self::ALL
      .into_iter()
      .find(|k| k.as_str() == s)
      .ok_or_else(|| Error::UnknownTrackingKind(s.to_owned()))
  }
}

// ─── Values ──────────────────────────────────────────────────────────────────

/// A payload value converted to its column's type.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
  Bool(bool),
  Integer(i64),
  Real(f64),
  Text(String),
  Date(NaiveDate),
}

/// `None` for `null` and whitespace-only strings.
fn non_blank(value: &Value) -> Option<&Value> {
  match value {
    Value::Null => None,
    Value::String(s) if s.trim().is_empty() => None,
    v => Some(v),
  }
}

fn convert(column: &Column, value: &Value) -> Result<Scalar> {
  let invalid = || Error::InvalidValue {
    column:   column.name.into(),
    expected: column.ty.describe(),
    found:    value.to_string(),
  };

  if value.is_array() || value.is_object() {
    return Err(invalid());
  }

  let scalar = match (column.ty, value) {
    (Text, Value::String(s)) => Scalar::Text(s.clone()),
    (Text, Value::Number(n)) => Scalar::Text(n.to_string()),
    (Text, Value::Bool(b)) => Scalar::Text(b.to_string()),

    (Integer, Value::Number(n)) => match n.as_i64() {
      Some(i) => Scalar::Integer(i),
      None => match n.as_f64() {
        Some(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => {
          Scalar::Integer(f as i64)
        }
        _ => return Err(invalid()),
      },
    },
    (Integer, Value::String(s)) => {
      Scalar::Integer(s.trim().parse().map_err(|_| invalid())?)
    }

    (Real, Value::Number(n)) => Scalar::Real(n.as_f64().ok_or_else(invalid)?),
    (Real, Value::String(s)) => {
      let f: f64 = s.trim().parse().map_err(|_| invalid())?;
      if !f.is_finite() {
        return Err(invalid());
      }
      Scalar::Real(f)
    }

    (Date, Value::String(s)) => Scalar::Date(parse_date(s.trim()).ok_or_else(invalid)?),

    (Bool, Value::Bool(b)) => Scalar::Bool(*b),
    (Bool, Value::Number(n)) => match n.as_i64() {
      Some(0) => Scalar::Bool(false),
      Some(1) => Scalar::Bool(true),
      _ => return Err(invalid()),
    },
    (Bool, Value::String(s)) => match s.trim() {
      "true" => Scalar::Bool(true),
      "false" => Scalar::Bool(false),
      _ => return Err(invalid()),
    },

    _ => return Err(invalid()),
  };
  Ok(scalar)
}

/// Accepts a plain date or an RFC 3339 timestamp (its UTC date is used).
fn parse_date(s: &str) -> Option<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d").ok().or_else(|| {
    DateTime::parse_from_rfc3339(s)
      .ok()
      .map(|dt| dt.with_timezone(&Utc).date_naive())
  })
}

/// A payload that passed [`TrackingKind::validate`]. `values` holds only the
/// supplied columns, in schema order.
#[derive(Debug, Clone)]
pub struct ValidatedRecord {
  pub kind:       TrackingKind,
  pub athlete_id: Uuid,
  pub values:     Vec<(&'static Column, Scalar)>,
}

// ─── Stored record ───────────────────────────────────────────────────────────

/// A persisted tracking record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackingRecord {
  pub record_id:  Uuid,
  pub kind:       TrackingKind,
  pub athlete_id: Uuid,
  /// Value of the kind's actor column.
  pub actor_id:   Uuid,
  pub created_at: DateTime<Utc>,
  /// Every schema column, `null` where unset.
  pub fields:     Map<String, Value>,
}

impl TrackingRecord {
  pub fn field(&self, name: &str) -> Option<&Value> { self.fields.get(name) }
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  fn payload(v: Value) -> Map<String, Value> {
    match v {
      Value::Object(m) => m,
      _ => unreachable!(),
    }
  }

  #[test]
  fn kind_round_trips_through_selector() {
    for kind in TrackingKind::ALL {
      assert_eq!(kind.as_str().parse::<TrackingKind>().unwrap(), kind);
      let json = serde_json::to_value(kind).unwrap();
      assert_eq!(json, Value::String(kind.as_str().into()));
    }
    assert!(matches!(
      "vitals".parse::<TrackingKind>(),
      Err(Error::UnknownTrackingKind(_))
    ));
  }

  #[test]
  fn every_kind_has_its_date_column_as_required_date() {
    for kind in TrackingKind::ALL {
      let col = kind.column(kind.date_column()).unwrap();
      assert!(col.required);
      assert_eq!(col.ty, ColumnType::Date);
      assert!(kind.column(kind.actor_column()).is_none());
    }
  }

  #[test]
  fn unknown_key_is_rejected() {
    let athlete = Uuid::new_v4();
    let p = payload(json!({
      "athlete_id": athlete,
      "measured_on": "2024-11-15",
      "weight_kg": 75.5,
      "id); DROP TABLE athletes; --": 1,
    }));
    let err = TrackingKind::Measure.validate(&p).unwrap_err();
    assert!(matches!(err, Error::UnknownColumn { kind: "measure", .. }));
  }

  #[test]
  fn column_of_another_kind_is_rejected() {
    let p = payload(json!({
      "athlete_id": Uuid::new_v4(),
      "lab_date": "2024-11-15",
      "test_type": "Hemogram",
      "meal_plan": "High protein",
    }));
    let err = TrackingKind::Lab.validate(&p).unwrap_err();
    assert!(matches!(err, Error::UnknownColumn { ref column, .. } if column == "meal_plan"));
  }

  #[test]
  fn missing_required_column_is_rejected() {
    let p = payload(json!({ "athlete_id": Uuid::new_v4(), "weight_kg": 70 }));
    let err = TrackingKind::Measure.validate(&p).unwrap_err();
    assert!(matches!(err, Error::MissingField("measured_on")));

    let p = payload(json!({ "measured_on": "2024-11-15" }));
    let err = TrackingKind::Measure.validate(&p).unwrap_err();
    assert!(matches!(err, Error::MissingField("athlete_id")));
  }

  #[test]
  fn blank_required_column_counts_as_missing() {
    let p = payload(json!({
      "athlete_id": Uuid::new_v4(),
      "injured_on": "2024-10-20",
      "injury_type": "  ",
    }));
    let err = TrackingKind::Injury.validate(&p).unwrap_err();
    assert!(matches!(err, Error::MissingField("injury_type")));
  }

  #[test]
  fn actor_column_is_dropped_from_payload() {
    let p = payload(json!({
      "athlete_id": Uuid::new_v4(),
      "injured_on": "2024-10-20",
      "injury_type": "Muscular",
      "recorded_by": Uuid::new_v4(),
    }));
    let rec = TrackingKind::Injury.validate(&p).unwrap();
    assert!(rec.values.iter().all(|(c, _)| c.name != "recorded_by"));
  }

  #[test]
  fn values_are_converted_by_column_type() {
    let athlete = Uuid::new_v4();
    let p = payload(json!({
      "athlete_id": athlete.to_string(),
      "injured_on": "2024-10-20",
      "injury_type": "Articular",
      "estimated_recovery_days": "21",
      "recovered": false,
      "recovered_on": "",
      "severity": "Leve",
    }));
    let rec = TrackingKind::Injury.validate(&p).unwrap();
    assert_eq!(rec.athlete_id, athlete);

    let names: Vec<_> = rec.values.iter().map(|(c, _)| c.name).collect();
    // Schema order, only supplied keys.
    assert_eq!(names, [
      "injured_on",
      "injury_type",
      "severity",
      "estimated_recovery_days",
      "recovered",
    ]);

    let get = |n: &str| rec.values.iter().find(|(c, _)| c.name == n).unwrap().1.clone();
    assert_eq!(
      get("injured_on"),
      Scalar::Date(NaiveDate::from_ymd_opt(2024, 10, 20).unwrap())
    );
    assert_eq!(get("estimated_recovery_days"), Scalar::Integer(21));
    assert_eq!(get("recovered"), Scalar::Bool(false));
  }

  #[test]
  fn mistyped_values_are_rejected() {
    let base = json!({ "athlete_id": Uuid::new_v4(), "measured_on": "2024-11-15" });

    let mut p = payload(base.clone());
    p.insert("weight_kg".into(), json!("heavy"));
    assert!(matches!(
      TrackingKind::Measure.validate(&p),
      Err(Error::InvalidValue { .. })
    ));

    let mut p = payload(base.clone());
    p.insert("weight_kg".into(), json!([75.5]));
    assert!(matches!(
      TrackingKind::Measure.validate(&p),
      Err(Error::InvalidValue { .. })
    ));

    let mut p = payload(base);
    p.insert("measured_on".into(), json!("15/11/2024"));
    assert!(matches!(
      TrackingKind::Measure.validate(&p),
      Err(Error::InvalidValue { .. })
    ));
  }

  #[test]
  fn text_columns_take_numbers_and_booleans_as_text() {
    let p = payload(json!({
      "athlete_id": Uuid::new_v4(),
      "lab_date": "2024-06-01",
      "test_type": "Hb",
      "results": 13.5,
      "reference_range": 12,
      "interpretation": true,
    }));
    let rec = TrackingKind::Lab.validate(&p).unwrap();
    let get = |n: &str| rec.values.iter().find(|(c, _)| c.name == n).unwrap().1.clone();
    assert_eq!(get("results"), Scalar::Text("13.5".into()));
    assert_eq!(get("reference_range"), Scalar::Text("12".into()));
    assert_eq!(get("interpretation"), Scalar::Text("true".into()));

    let p = payload(json!({
      "athlete_id": Uuid::new_v4(),
      "injured_on": "2024-10-20",
      "injury_type": "Muscular",
      "affected_area": 3,
    }));
    let rec = TrackingKind::Injury.validate(&p).unwrap();
    let area = rec.values.iter().find(|(c, _)| c.name == "affected_area").unwrap();
    assert_eq!(area.1, Scalar::Text("3".into()));
  }

  #[test]
  fn malformed_athlete_id_is_rejected() {
    let p = payload(json!({ "athlete_id": 7, "lab_date": "2024-01-01", "test_type": "x" }));
    assert!(matches!(
      TrackingKind::Lab.validate(&p),
      Err(Error::InvalidValue { .. })
    ));
  }
}

//! Athletes and the disciplines they compete in.
//!
//! An athlete is the subject every clinical and tracking record points at.
//! Its document number is the natural key; uniqueness is enforced by the
//! store's own constraint, never by a read-then-write check.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

/// Days per year used when deriving an age from a birth date.
pub const DAYS_PER_YEAR: f64 = 365.25;

// ─── Age ─────────────────────────────────────────────────────────────────────

/// Whole years elapsed between `birth_date` and `today`: the elapsed days
/// divided by [`DAYS_PER_YEAR`], floored. Dates on or after `today` give 0.
pub fn age_on(birth_date: NaiveDate, today: NaiveDate) -> u32 {
  let days = (today - birth_date).num_days();
  if days <= 0 {
    return 0;
  }
  (days as f64 / DAYS_PER_YEAR).floor() as u32
}

/// [`age_on`] against the current UTC date.
pub fn derive_age(birth_date: NaiveDate) -> u32 {
  age_on(birth_date, Utc::now().date_naive())
}

// ─── Discipline ──────────────────────────────────────────────────────────────

/// A sport discipline athletes are registered under.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Discipline {
  pub discipline_id: Uuid,
  pub name:          String,
  pub category:      Option<String>,
  pub description:   Option<String>,
  pub active:        bool,
  pub created_at:    DateTime<Utc>,
}

/// Input to [`crate::store::ClinicalStore::add_discipline`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewDiscipline {
  pub name:        String,
  pub category:    Option<String>,
  pub description: Option<String>,
}

impl NewDiscipline {
  pub fn validate(&self) -> Result<()> {
    if self.name.trim().is_empty() {
      return Err(Error::MissingField("name"));
    }
    Ok(())
  }
}

// ─── Athlete ─────────────────────────────────────────────────────────────────

/// Demographic attributes supplied by the caller when registering or
/// updating an athlete.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AthleteProfile {
  /// E.g. "CC" (citizenship card) or "TI" (identity card).
  pub document_type:     String,
  /// Natural key; unique across all athletes.
  pub document_number:   String,
  pub first_names:       String,
  pub last_names:        String,
  pub birth_date:        NaiveDate,
  pub sex:               Option<String>,
  pub address:           Option<String>,
  pub municipality:      Option<String>,
  pub phone:             Option<String>,
  pub mobile:            Option<String>,
  pub email:             Option<String>,
  pub emergency_contact: Option<String>,
  pub emergency_phone:   Option<String>,
  /// Health insurance provider.
  pub health_insurer:    Option<String>,
  pub blood_type:        Option<String>,
  pub discipline_id:     Option<Uuid>,
  pub photo_url:         Option<String>,
}

impl AthleteProfile {
  /// Check required fields. Runs before any store access.
  pub fn validate(&self) -> Result<()> {
    let required = [
      ("document_type", &self.document_type),
      ("document_number", &self.document_number),
      ("first_names", &self.first_names),
      ("last_names", &self.last_names),
    ];
    for (name, value) in required {
      if value.trim().is_empty() {
        return Err(Error::MissingField(name));
      }
    }

    if self.birth_date > Utc::now().date_naive() {
      return Err(Error::InvalidValue {
        column:   "birth_date".into(),
        expected: "a date not in the future",
        found:    self.birth_date.to_string(),
      });
    }
    Ok(())
  }
}

/// A registered athlete.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Athlete {
  pub athlete_id:    Uuid,
  #[serde(flatten)]
  pub profile:       AthleteProfile,
  /// Derived from `birth_date` at write time; see [`derive_age`].
  pub age:           u32,
  pub active:        bool,
  /// The actor who registered the athlete.
  pub registered_by: Uuid,
  pub created_at:    DateTime<Utc>,
}

/// Input to [`crate::store::ClinicalStore::update_athlete`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AthleteUpdate {
  #[serde(flatten)]
  pub profile: AthleteProfile,
  /// Leaves the current flag untouched when `None`.
  #[serde(default)]
  pub active:  Option<bool>,
}

/// Parameters for [`crate::store::ClinicalStore::list_athletes`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AthleteQuery {
  pub active:        Option<bool>,
  pub discipline_id: Option<Uuid>,
  /// Case-insensitive substring matched against names and document number.
  pub text:          Option<String>,
}

#[cfg(test)]
mod tests {
  use chrono::Duration;

  use super::*;

  #[test]
  fn age_floors_half_years() {
    let today = NaiveDate::from_ymd_opt(2026, 10, 17).unwrap();
    // 20.5 * 365.25 = 7487.625 days.
    let birth = today - Duration::days(7488);
    assert_eq!(age_on(birth, today), 20);
  }

  #[test]
  fn age_one_day_short_of_birthday() {
    let today = NaiveDate::from_ymd_opt(2026, 10, 17).unwrap();
    let birth = today - Duration::days(7305 - 1);
    assert_eq!(age_on(birth, today), 19);
    assert_eq!(age_on(today - Duration::days(7305), today), 20);
  }

  #[test]
  fn age_of_future_birth_date_is_zero() {
    let today = NaiveDate::from_ymd_opt(2026, 10, 17).unwrap();
    assert_eq!(age_on(today + Duration::days(3), today), 0);
    assert_eq!(age_on(today, today), 0);
  }

  fn profile() -> AthleteProfile {
    AthleteProfile {
      document_type:     "CC".into(),
      document_number:   "1075000111".into(),
      first_names:       "Juan Carlos".into(),
      last_names:        "Rodríguez".into(),
      birth_date:        NaiveDate::from_ymd_opt(2002, 3, 9).unwrap(),
      sex:               Some("M".into()),
      address:           None,
      municipality:      Some("Neiva".into()),
      phone:             None,
      mobile:            None,
      email:             None,
      emergency_contact: None,
      emergency_phone:   None,
      health_insurer:    None,
      blood_type:        Some("O+".into()),
      discipline_id:     None,
      photo_url:         None,
    }
  }

  #[test]
  fn profile_requires_document_number() {
    let mut p = profile();
    p.document_number = "  ".into();
    assert!(matches!(p.validate(), Err(Error::MissingField("document_number"))));
  }

  #[test]
  fn profile_rejects_future_birth_date() {
    let mut p = profile();
    p.birth_date = Utc::now().date_naive() + Duration::days(1);
    assert!(matches!(p.validate(), Err(Error::InvalidValue { .. })));
  }

  #[test]
  fn valid_profile_passes() { profile().validate().unwrap(); }
}

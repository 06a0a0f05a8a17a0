//! Clinical encounters and the four child record kinds they contain.
//!
//! An encounter is written together with its children as one unit and is
//! immutable afterwards. Children have no lifecycle of their own.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Visit ───────────────────────────────────────────────────────────────────

/// Caller-supplied metadata of a clinical visit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisitDetails {
  pub athlete_id:          Uuid,
  pub visit_date:          NaiveDate,
  pub visit_time:          NaiveTime,
  pub reason:              String,
  /// History of the present illness.
  pub current_illness:     Option<String>,
  pub personal_history:    Option<String>,
  pub family_history:      Option<String>,
  pub surgical_history:    Option<String>,
  pub allergy_history:     Option<String>,
  pub current_medications: Option<String>,
  pub habits:              Option<String>,
  pub systems_review:      Option<String>,
}

/// A committed encounter row, without its children.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Encounter {
  pub encounter_id: Uuid,
  #[serde(flatten)]
  pub visit:        VisitDetails,
  /// The actor who authored the encounter.
  pub clinician_id: Uuid,
  pub created_at:   DateTime<Utc>,
}

// ─── Children ────────────────────────────────────────────────────────────────

/// Vitals and findings recorded during the visit. BMI is taken as given.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PhysicalExam {
  pub weight_kg:         Option<f64>,
  pub height_cm:         Option<f64>,
  pub bmi:               Option<f64>,
  /// Free text, e.g. "120/80".
  pub blood_pressure:    Option<String>,
  pub heart_rate:        Option<u32>,
  pub respiratory_rate:  Option<u32>,
  pub temperature_c:     Option<f64>,
  pub oxygen_saturation: Option<f64>,
  pub general_state:     Option<String>,
  pub head_neck:         Option<String>,
  pub thorax:            Option<String>,
  pub cardiovascular:    Option<String>,
  pub respiratory:       Option<String>,
  pub abdomen:           Option<String>,
  pub extremities:       Option<String>,
  pub neurological:      Option<String>,
  pub skin:              Option<String>,
  pub notes:             Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosisKind {
  Principal,
  Secondary,
  Related,
}

impl DiagnosisKind {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Principal => "principal",
      Self::Secondary => "secondary",
      Self::Related => "related",
    }
  }

  pub fn parse(s: &str) -> Option<Self> {
    match s {
      "principal" => Some(Self::Principal),
      "secondary" => Some(Self::Secondary),
      "related" => Some(Self::Related),
      _ => None,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnosis {
  pub kind:        DiagnosisKind,
  /// ICD-10 code, e.g. "S83.5". Shape is checked by the store.
  pub code:        String,
  pub description: Option<String>,
}

/// An external test or study requested during the visit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestedExam {
  pub exam_type:     String,
  pub exam_name:     String,
  pub justification: Option<String>,
  #[serde(default)]
  pub urgent:        bool,
}

/// A treatment directive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManagementPlan {
  pub plan_type:       String,
  pub description:     Option<String>,
  pub medication:      Option<String>,
  pub dose:            Option<String>,
  pub route:           Option<String>,
  pub frequency:       Option<String>,
  pub duration:        Option<String>,
  pub recommendations: Option<String>,
  pub next_follow_up:  Option<NaiveDate>,
}

// ─── NewEncounter ────────────────────────────────────────────────────────────

/// Input to [`crate::store::ClinicalStore::record_encounter`]. Child
/// sequences are written in the order given.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewEncounter {
  #[serde(flatten)]
  pub visit:            VisitDetails,
  #[serde(default)]
  pub physical_exam:    Option<PhysicalExam>,
  #[serde(default)]
  pub diagnoses:        Vec<Diagnosis>,
  #[serde(default)]
  pub requested_exams:  Vec<RequestedExam>,
  #[serde(default)]
  pub management_plans: Vec<ManagementPlan>,
}

impl NewEncounter {
  /// Convenience constructor with no children.
  pub fn new(visit: VisitDetails) -> Self {
    Self {
      visit,
      physical_exam: None,
      diagnoses: Vec::new(),
      requested_exams: Vec::new(),
      management_plans: Vec::new(),
    }
  }

  /// Check the top-level required fields. Runs before a transaction is
  /// opened; child content is left to the store's constraints.
  pub fn validate(&self) -> Result<()> {
    if self.visit.athlete_id.is_nil() {
      return Err(Error::MissingField("athlete_id"));
    }
    if self.visit.reason.trim().is_empty() {
      return Err(Error::MissingField("reason"));
    }
    Ok(())
  }
}

/// An encounter together with its children, as read back from the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncounterDetail {
  pub encounter:        Encounter,
  pub physical_exam:    Option<PhysicalExam>,
  pub diagnoses:        Vec<Diagnosis>,
  pub requested_exams:  Vec<RequestedExam>,
  pub management_plans: Vec<ManagementPlan>,
}

/// Parameters for [`crate::store::ClinicalStore::list_encounters`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EncounterQuery {
  pub athlete_id: Option<Uuid>,
  /// Inclusive lower bound on `visit_date`.
  pub from:       Option<NaiveDate>,
  /// Inclusive upper bound on `visit_date`.
  pub until:      Option<NaiveDate>,
}

#[cfg(test)]
mod tests {
  use super::*;

  fn visit() -> VisitDetails {
    VisitDetails {
      athlete_id:          Uuid::new_v4(),
      visit_date:          NaiveDate::from_ymd_opt(2024, 11, 15).unwrap(),
      visit_time:          NaiveTime::from_hms_opt(9, 30, 0).unwrap(),
      reason:              "Knee pain after training".into(),
      current_illness:     None,
      personal_history:    None,
      family_history:      None,
      surgical_history:    None,
      allergy_history:     None,
      current_medications: None,
      habits:              None,
      systems_review:      None,
    }
  }

  #[test]
  fn blank_reason_is_rejected() {
    let mut v = visit();
    v.reason = "   ".into();
    let err = NewEncounter::new(v).validate().unwrap_err();
    assert!(matches!(err, Error::MissingField("reason")));
  }

  #[test]
  fn nil_athlete_is_rejected() {
    let mut v = visit();
    v.athlete_id = Uuid::nil();
    let err = NewEncounter::new(v).validate().unwrap_err();
    assert!(matches!(err, Error::MissingField("athlete_id")));
  }

  #[test]
  fn children_default_to_empty_when_deserialising() {
    let json = serde_json::json!({
      "athlete_id": Uuid::new_v4(),
      "visit_date": "2024-11-15",
      "visit_time": "09:30:00",
      "reason": "Routine check",
      "diagnoses": [{ "kind": "principal", "code": "Z00.0", "description": null }],
    });
    let enc: NewEncounter = serde_json::from_value(json).unwrap();
    assert!(enc.physical_exam.is_none());
    assert_eq!(enc.diagnoses.len(), 1);
    assert_eq!(enc.diagnoses[0].kind, DiagnosisKind::Principal);
    assert!(enc.requested_exams.is_empty());
    assert!(enc.management_plans.is_empty());
    enc.validate().unwrap();
  }
}

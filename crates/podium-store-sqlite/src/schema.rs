//! SQL schema for the Podium SQLite store.
//!
//! Executed once at pool startup. Tracking tables must carry every column
//! named by [`podium_core::tracking::TrackingKind::columns`]; the
//! `tracking_tables_match_core_schema` test keeps the two in step.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

CREATE TABLE IF NOT EXISTS disciplines (
    discipline_id TEXT PRIMARY KEY,
    name          TEXT NOT NULL UNIQUE,
    category      TEXT,
    description   TEXT,
    active        INTEGER NOT NULL DEFAULT 1,
    created_at    TEXT NOT NULL
);

-- document_number is the natural key. The UNIQUE constraint is the only
-- source of truth for it; writers never pre-check.
CREATE TABLE IF NOT EXISTS athletes (
    athlete_id        TEXT PRIMARY KEY,
    document_type     TEXT NOT NULL,
    document_number   TEXT NOT NULL UNIQUE,
    first_names       TEXT NOT NULL,
    last_names        TEXT NOT NULL,
    birth_date        TEXT NOT NULL,   -- YYYY-MM-DD
    age               INTEGER NOT NULL,
    sex               TEXT,
    address           TEXT,
    municipality      TEXT,
    phone             TEXT,
    mobile            TEXT,
    email             TEXT,
    emergency_contact TEXT,
    emergency_phone   TEXT,
    health_insurer    TEXT,
    blood_type        TEXT,
    discipline_id     TEXT REFERENCES disciplines(discipline_id),
    photo_url         TEXT,
    active            INTEGER NOT NULL DEFAULT 1,
    registered_by     TEXT NOT NULL,
    created_at        TEXT NOT NULL
);

-- ─── Encounters ─────────────────────────────────────────────────────────────
-- Written together with their children in one transaction; never updated.

CREATE TABLE IF NOT EXISTS encounters (
    encounter_id        TEXT PRIMARY KEY,
    athlete_id          TEXT NOT NULL REFERENCES athletes(athlete_id),
    visit_date          TEXT NOT NULL,   -- YYYY-MM-DD
    visit_time          TEXT NOT NULL,   -- HH:MM:SS
    reason              TEXT NOT NULL,
    current_illness     TEXT,
    personal_history    TEXT,
    family_history      TEXT,
    surgical_history    TEXT,
    allergy_history     TEXT,
    current_medications TEXT,
    habits              TEXT,
    systems_review      TEXT,
    clinician_id        TEXT NOT NULL,
    created_at          TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS physical_exams (
    encounter_id      TEXT PRIMARY KEY REFERENCES encounters(encounter_id),
    weight_kg         REAL,
    height_cm         REAL,
    bmi               REAL,
    blood_pressure    TEXT,
    heart_rate        INTEGER,
    respiratory_rate  INTEGER,
    temperature_c     REAL,
    oxygen_saturation REAL,
    general_state     TEXT,
    head_neck         TEXT,
    thorax            TEXT,
    cardiovascular    TEXT,
    respiratory       TEXT,
    abdomen           TEXT,
    extremities       TEXT,
    neurological      TEXT,
    skin              TEXT,
    notes             TEXT
);

-- position preserves caller order; it is the only ordering children have.
CREATE TABLE IF NOT EXISTS diagnoses (
    diagnosis_id TEXT PRIMARY KEY,
    encounter_id TEXT NOT NULL REFERENCES encounters(encounter_id),
    position     INTEGER NOT NULL,
    kind         TEXT NOT NULL CHECK (kind IN ('principal', 'secondary', 'related')),
    -- ICD-10 shape: letter, two digits, optional dotted suffix.
    code         TEXT NOT NULL CHECK (
                   length(code) BETWEEN 3 AND 8
                   AND code GLOB '[A-Z][0-9][0-9A-Z]*'
                 ),
    description  TEXT,
    UNIQUE (encounter_id, position)
);

CREATE TABLE IF NOT EXISTS requested_exams (
    exam_id       TEXT PRIMARY KEY,
    encounter_id  TEXT NOT NULL REFERENCES encounters(encounter_id),
    position      INTEGER NOT NULL,
    exam_type     TEXT NOT NULL,
    exam_name     TEXT NOT NULL,
    justification TEXT,
    urgent        INTEGER NOT NULL DEFAULT 0,
    UNIQUE (encounter_id, position)
);

CREATE TABLE IF NOT EXISTS management_plans (
    plan_id         TEXT PRIMARY KEY,
    encounter_id    TEXT NOT NULL REFERENCES encounters(encounter_id),
    position        INTEGER NOT NULL,
    plan_type       TEXT NOT NULL,
    description     TEXT,
    medication      TEXT,
    dose            TEXT,
    route           TEXT,
    frequency       TEXT,
    duration        TEXT,
    recommendations TEXT,
    next_follow_up  TEXT,
    UNIQUE (encounter_id, position)
);

-- ─── Tracking records ───────────────────────────────────────────────────────
-- Each table: record_id, athlete_id, the kind's actor column, created_at,
-- then the kind's payload columns.

CREATE TABLE IF NOT EXISTS anthropometric_measures (
    record_id              TEXT PRIMARY KEY,
    athlete_id             TEXT NOT NULL REFERENCES athletes(athlete_id),
    evaluator_id           TEXT NOT NULL,
    created_at             TEXT NOT NULL,
    measured_on            TEXT NOT NULL,
    weight_kg              REAL,
    height_cm              REAL,
    bmi                    REAL,
    body_fat_pct           REAL,
    muscle_mass_kg         REAL,
    arm_circumference_cm   REAL,
    waist_circumference_cm REAL,
    hip_circumference_cm   REAL,
    leg_circumference_cm   REAL,
    notes                  TEXT,
    UNIQUE (athlete_id, measured_on)
);

CREATE TABLE IF NOT EXISTS performance_tests (
    record_id     TEXT PRIMARY KEY,
    athlete_id    TEXT NOT NULL REFERENCES athletes(athlete_id),
    evaluator_id  TEXT NOT NULL,
    created_at    TEXT NOT NULL,
    tested_on     TEXT NOT NULL,
    test_name     TEXT NOT NULL,
    test_category TEXT,
    result_value  REAL,
    unit          TEXT,
    attempt       INTEGER NOT NULL DEFAULT 1,
    notes         TEXT,
    UNIQUE (athlete_id, test_name, tested_on, attempt)
);

CREATE TABLE IF NOT EXISTS injuries (
    record_id               TEXT PRIMARY KEY,
    athlete_id              TEXT NOT NULL REFERENCES athletes(athlete_id),
    recorded_by             TEXT NOT NULL,
    created_at              TEXT NOT NULL,
    injured_on              TEXT NOT NULL,
    injury_type             TEXT NOT NULL,
    affected_area           TEXT,
    severity                TEXT,
    description             TEXT,
    diagnosis               TEXT,
    treatment               TEXT,
    estimated_recovery_days INTEGER,
    recovered_on            TEXT,
    recovered               INTEGER NOT NULL DEFAULT 0,
    notes                   TEXT
);

CREATE TABLE IF NOT EXISTS nutrition_follow_ups (
    record_id         TEXT PRIMARY KEY,
    athlete_id        TEXT NOT NULL REFERENCES athletes(athlete_id),
    nutritionist_id   TEXT NOT NULL,
    created_at        TEXT NOT NULL,
    followed_up_on    TEXT NOT NULL,
    current_weight_kg REAL,
    target_weight_kg  REAL,
    meal_plan         TEXT NOT NULL,
    recommendations   TEXT,
    notes             TEXT
);

CREATE TABLE IF NOT EXISTS lab_results (
    record_id       TEXT PRIMARY KEY,
    athlete_id      TEXT NOT NULL REFERENCES athletes(athlete_id),
    clinician_id    TEXT NOT NULL,
    created_at      TEXT NOT NULL,
    lab_date        TEXT NOT NULL,
    test_type       TEXT NOT NULL,
    results         TEXT,
    reference_range TEXT,
    interpretation  TEXT,
    notes           TEXT,
    UNIQUE (athlete_id, lab_date, test_type)
);

CREATE TABLE IF NOT EXISTS other_follow_ups (
    record_id       TEXT PRIMARY KEY,
    athlete_id      TEXT NOT NULL REFERENCES athletes(athlete_id),
    professional_id TEXT NOT NULL,
    created_at      TEXT NOT NULL,
    followed_up_on  TEXT NOT NULL,
    follow_up_type  TEXT NOT NULL,
    description     TEXT,
    recommendations TEXT,
    notes           TEXT
);

CREATE INDEX IF NOT EXISTS athletes_name_idx        ON athletes(last_names, first_names);
CREATE INDEX IF NOT EXISTS encounters_athlete_idx   ON encounters(athlete_id, visit_date, visit_time);
CREATE INDEX IF NOT EXISTS diagnoses_encounter_idx  ON diagnoses(encounter_id);
CREATE INDEX IF NOT EXISTS exams_encounter_idx      ON requested_exams(encounter_id);
CREATE INDEX IF NOT EXISTS plans_encounter_idx      ON management_plans(encounter_id);
CREATE INDEX IF NOT EXISTS measures_athlete_idx     ON anthropometric_measures(athlete_id, measured_on);
CREATE INDEX IF NOT EXISTS tests_athlete_idx        ON performance_tests(athlete_id, tested_on);
CREATE INDEX IF NOT EXISTS injuries_athlete_idx     ON injuries(athlete_id, injured_on);
CREATE INDEX IF NOT EXISTS nutrition_athlete_idx    ON nutrition_follow_ups(athlete_id, followed_up_on);
CREATE INDEX IF NOT EXISTS labs_athlete_idx         ON lab_results(athlete_id, lab_date);
CREATE INDEX IF NOT EXISTS others_athlete_idx       ON other_follow_ups(athlete_id, followed_up_on);

PRAGMA user_version = 1;
";

//! SQL schema for the admissions SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
///
/// `foreign_keys` must be on for the cascade and the applicant reference
/// check to fire; it is a per-connection setting.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS applicants (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    first_name    TEXT NOT NULL,
    last_name     TEXT NOT NULL,
    gender        TEXT NOT NULL,
    dob           TEXT,            -- YYYY-MM-DD or NULL
    guardian_name TEXT NOT NULL,
    email         TEXT NOT NULL,
    phone         TEXT NOT NULL,
    address       TEXT NOT NULL,
    created_at    TEXT NOT NULL,   -- RFC 3339 UTC; never updated
    updated_at    TEXT NOT NULL
);

-- One application per applicant, removed together with it.
CREATE TABLE IF NOT EXISTS applications (
    id                INTEGER PRIMARY KEY AUTOINCREMENT,
    applicant_id      INTEGER NOT NULL UNIQUE
                      REFERENCES applicants(id) ON DELETE CASCADE,
    apply_grade       TEXT NOT NULL,
    extra_curriculars TEXT,        -- JSON array or NULL
    photo             TEXT,        -- path relative to the media root
    birth_certificate TEXT,
    health_record     TEXT,
    status            TEXT NOT NULL DEFAULT 'pending'
                      CHECK (status IN ('pending', 'approved', 'rejected')),
    submitted_at      TEXT NOT NULL,
    updated_at        TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS applications_status_idx ON applications(status);
CREATE INDEX IF NOT EXISTS applications_grade_idx  ON applications(apply_grade);

PRAGMA user_version = 1;
";

//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings, dates as `YYYY-MM-DD`, and
//! `extra_curriculars` as a compact JSON array.

use admissions_core::{
  applicant::Applicant,
  application::{Application, ApplicationStatus},
};
use chrono::{DateTime, NaiveDate, Utc};
use serde_json::Value;

use crate::{Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::Decode(format!("timestamp {s:?}: {e}")))
}

// ─── NaiveDate ───────────────────────────────────────────────────────────────

const DATE_FORMAT: &str = "%Y-%m-%d";

pub fn encode_date(d: NaiveDate) -> String { d.format(DATE_FORMAT).to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, DATE_FORMAT).map_err(|e| Error::Decode(format!("date {s:?}: {e}")))
}

// ─── ApplicationStatus ───────────────────────────────────────────────────────

pub fn encode_status(s: ApplicationStatus) -> &'static str { s.into() }

pub fn decode_status(s: &str) -> Result<ApplicationStatus> {
  s.parse().map_err(|_| Error::Decode(format!("unknown status: {s:?}")))
}

// ─── extra_curriculars ───────────────────────────────────────────────────────

pub fn encode_extras(items: &[Value]) -> Result<String> { Ok(serde_json::to_string(items)?) }

pub fn decode_extras(s: &str) -> Result<Vec<Value>> { Ok(serde_json::from_str(s)?) }

// ─── LIKE patterns ───────────────────────────────────────────────────────────

/// Build a `LIKE ... ESCAPE '\'` pattern matching `needle` anywhere.
pub fn like_pattern(needle: &str) -> String {
  let mut pattern = String::with_capacity(needle.len() + 2);
  pattern.push('%');
  for c in needle.chars() {
    if matches!(c, '%' | '_' | '\\') {
      pattern.push('\\');
    }
    pattern.push(c);
  }
  pattern.push('%');
  pattern
}

// ─── Row types ───────────────────────────────────────────────────────────────

pub const APPLICANT_COLUMNS: &str = "id, first_name, last_name, gender, dob, guardian_name, \
                                     email, phone, address, created_at, updated_at";

/// Raw values read directly from an `applicants` row.
pub struct RawApplicant {
  pub id:            i64,
  pub first_name:    String,
  pub last_name:     String,
  pub gender:        String,
  pub dob:           Option<String>,
  pub guardian_name: String,
  pub email:         String,
  pub phone:         String,
  pub address:       String,
  pub created_at:    String,
  pub updated_at:    String,
}

impl RawApplicant {
  /// Read a row selected with [`APPLICANT_COLUMNS`].
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:            row.get(0)?,
      first_name:    row.get(1)?,
      last_name:     row.get(2)?,
      gender:        row.get(3)?,
      dob:           row.get(4)?,
      guardian_name: row.get(5)?,
      email:         row.get(6)?,
      phone:         row.get(7)?,
      address:       row.get(8)?,
      created_at:    row.get(9)?,
      updated_at:    row.get(10)?,
    })
  }

  pub fn into_applicant(self) -> Result<Applicant> {
    Ok(Applicant {
      id:            self.id,
      first_name:    self.first_name,
      last_name:     self.last_name,
      gender:        self.gender,
      dob:           self.dob.as_deref().map(decode_date).transpose()?,
      guardian_name: self.guardian_name,
      email:         self.email,
      phone:         self.phone,
      address:       self.address,
      created_at:    decode_dt(&self.created_at)?,
      updated_at:    decode_dt(&self.updated_at)?,
    })
  }
}

pub const APPLICATION_COLUMNS: &str = "id, applicant_id, apply_grade, extra_curriculars, photo, \
                                       birth_certificate, health_record, status, submitted_at, \
                                       updated_at";

/// Raw values read directly from an `applications` row.
pub struct RawApplication {
  pub id:                i64,
  pub applicant_id:      i64,
  pub apply_grade:       String,
  pub extra_curriculars: Option<String>,
  pub photo:             Option<String>,
  pub birth_certificate: Option<String>,
  pub health_record:     Option<String>,
  pub status:            String,
  pub submitted_at:      String,
  pub updated_at:        String,
}

impl RawApplication {
  /// Read a row selected with [`APPLICATION_COLUMNS`].
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:                row.get(0)?,
      applicant_id:      row.get(1)?,
      apply_grade:       row.get(2)?,
      extra_curriculars: row.get(3)?,
      photo:             row.get(4)?,
      birth_certificate: row.get(5)?,
      health_record:     row.get(6)?,
      status:            row.get(7)?,
      submitted_at:      row.get(8)?,
      updated_at:        row.get(9)?,
    })
  }

  pub fn into_application(self) -> Result<Application> {
    Ok(Application {
      id:                self.id,
      applicant_id:      self.applicant_id,
      apply_grade:       self.apply_grade,
      extra_curriculars: self.extra_curriculars.as_deref().map(decode_extras).transpose()?,
      photo:             self.photo,
      birth_certificate: self.birth_certificate,
      health_record:     self.health_record,
      status:            decode_status(&self.status)?,
      submitted_at:      decode_dt(&self.submitted_at)?,
      updated_at:        decode_dt(&self.updated_at)?,
    })
  }
}

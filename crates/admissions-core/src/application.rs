//! Applications: admission records linked one-to-one to an applicant.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::{AsRefStr, Display, EnumIter, EnumString, IntoStaticStr};
use validator::Validate;

use crate::{
  FieldErrors, Result,
  extracurriculars::ExtraCurricularsInput,
  patch::{REQUIRED, WriteMode, reject_blank, required_text},
};

// ─── Status ──────────────────────────────────────────────────────────────────

/// Review outcome of an application.
///
/// Any value may replace any other; no transition order is enforced.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Default,
  Serialize,
  Deserialize,
  AsRefStr,
  Display,
  EnumString,
  EnumIter,
  IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ApplicationStatus {
  #[default]
  Pending,
  Approved,
  Rejected,
}

impl ApplicationStatus {
  /// Parse a caller-supplied status, reporting unknown values against the
  /// `status` field.
  pub fn parse_field(raw: &str) -> Result<Self> {
    let raw = raw.trim();
    Self::from_str(raw)
      .map_err(|_| crate::Error::invalid("status", format!("\"{raw}\" is not a valid choice.")))
  }
}

// ─── Attachments ─────────────────────────────────────────────────────────────

/// The three optional document uploads an application can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, AsRefStr, EnumString, EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum Attachment {
  Photo,
  BirthCertificate,
  HealthRecord,
}

impl Attachment {
  /// Name of the request/response field carrying this attachment.
  pub fn field(self) -> &'static str {
    match self {
      Self::Photo => "photo",
      Self::BirthCertificate => "birth_certificate",
      Self::HealthRecord => "health_record",
    }
  }

  /// Directory, relative to the media root, that uploads are filed under.
  pub fn directory(self) -> &'static str {
    match self {
      Self::Photo => "photos",
      Self::BirthCertificate => "birth_certificates",
      Self::HealthRecord => "health_records",
    }
  }
}

// ─── Stored record ───────────────────────────────────────────────────────────

/// A persisted application.
///
/// File attributes hold a path relative to the media root; no binary data
/// lives in the record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Application {
  pub id:                i64,
  pub applicant_id:      i64,
  pub apply_grade:       String,
  pub extra_curriculars: Option<Vec<Value>>,
  pub photo:             Option<String>,
  pub birth_certificate: Option<String>,
  pub health_record:     Option<String>,
  pub status:            ApplicationStatus,
  /// Set once at creation.
  pub submitted_at:      DateTime<Utc>,
  /// Reset on every mutation.
  pub updated_at:        DateTime<Utc>,
}

impl Application {
  pub fn attachment(&self, which: Attachment) -> Option<&str> {
    match which {
      Attachment::Photo => self.photo.as_deref(),
      Attachment::BirthCertificate => self.birth_certificate.as_deref(),
      Attachment::HealthRecord => self.health_record.as_deref(),
    }
  }
}

// ─── Draft ───────────────────────────────────────────────────────────────────

/// A complete set of application attributes, ready to be stored.
#[derive(Debug, Clone, PartialEq, Validate)]
pub struct ApplicationDraft {
  pub applicant_id:      i64,
  #[validate(length(max = 50, message = "Ensure this field has no more than 50 characters."))]
  pub apply_grade:       String,
  pub extra_curriculars: Option<Vec<Value>>,
  pub photo:             Option<String>,
  pub birth_certificate: Option<String>,
  pub health_record:     Option<String>,
  pub status:            ApplicationStatus,
}

impl ApplicationDraft {
  /// A pending application with no extracurriculars or documents.
  pub fn new(applicant_id: i64, apply_grade: impl Into<String>) -> Self {
    Self {
      applicant_id,
      apply_grade: apply_grade.into(),
      extra_curriculars: None,
      photo: None,
      birth_certificate: None,
      health_record: None,
      status: ApplicationStatus::default(),
    }
  }

  pub fn attachment_mut(&mut self, which: Attachment) -> &mut Option<String> {
    match which {
      Attachment::Photo => &mut self.photo,
      Attachment::BirthCertificate => &mut self.birth_certificate,
      Attachment::HealthRecord => &mut self.health_record,
    }
  }

  pub fn check(&self) -> Result<()> {
    let mut errors = FieldErrors::default();
    self.collect_errors(&mut errors);
    errors.into_result()
  }

  /// Record this draft's failures in `errors`, skipping fields that already
  /// carry a message.
  pub(crate) fn collect_errors(&self, errors: &mut FieldErrors) {
    reject_blank(errors, &[("apply_grade", &self.apply_grade)]);
    if let Err(e) = self.validate() {
      errors.absorb(e);
    }
  }
}

// ─── Input ───────────────────────────────────────────────────────────────────

/// Application attributes as supplied by a caller; every field may be absent.
///
/// File attributes carry a stored media path, or `Some(None)` to clear the
/// reference.
#[derive(Debug, Clone, Default)]
pub struct ApplicationInput {
  pub applicant:         Option<i64>,
  pub apply_grade:       Option<String>,
  pub extra_curriculars: Option<Option<ExtraCurricularsInput>>,
  pub status:            Option<String>,
  pub photo:             Option<Option<String>>,
  pub birth_certificate: Option<Option<String>>,
  pub health_record:     Option<Option<String>>,
}

impl ApplicationInput {
  pub fn attachment_mut(&mut self, which: Attachment) -> &mut Option<Option<String>> {
    match which {
      Attachment::Photo => &mut self.photo,
      Attachment::BirthCertificate => &mut self.birth_certificate,
      Attachment::HealthRecord => &mut self.health_record,
    }
  }

  /// Build a draft for a new application. `status` defaults to pending.
  pub fn into_draft(self) -> Result<ApplicationDraft> { self.resolve(None, WriteMode::Full) }

  /// Build the draft that results from applying this input to `current`.
  pub fn apply_to(self, current: &Application, mode: WriteMode) -> Result<ApplicationDraft> {
    self.resolve(Some(current), mode)
  }

  fn resolve(self, current: Option<&Application>, mode: WriteMode) -> Result<ApplicationDraft> {
    let mut errors = FieldErrors::default();

    let applicant_id = match (self.applicant, current, mode) {
      (Some(id), _, _) => id,
      (None, Some(current), WriteMode::Partial) => current.applicant_id,
      (None, _, _) => {
        errors.add("applicant", REQUIRED);
        0
      }
    };

    let apply_grade = required_text(
      &mut errors,
      "apply_grade",
      self.apply_grade,
      current.map(|c| c.apply_grade.as_str()),
      mode,
    );

    let extra_curriculars = match self.extra_curriculars {
      Some(Some(input)) => match input.resolve() {
        Ok(list) => Some(list),
        Err(crate::Error::Validation(e)) => {
          errors.merge(e);
          None
        }
        Err(other) => return Err(other),
      },
      Some(None) => None,
      None => current.and_then(|c| c.extra_curriculars.clone()),
    };

    let status = match self.status {
      Some(raw) => match ApplicationStatus::parse_field(&raw) {
        Ok(status) => status,
        Err(crate::Error::Validation(e)) => {
          errors.merge(e);
          ApplicationStatus::default()
        }
        Err(other) => return Err(other),
      },
      None => current.map(|c| c.status).unwrap_or_default(),
    };

    let keep = |incoming: Option<Option<String>>, stored: Option<&String>| match incoming {
      Some(value) => value,
      None => stored.cloned(),
    };

    let draft = ApplicationDraft {
      applicant_id,
      apply_grade,
      extra_curriculars,
      photo: keep(self.photo, current.and_then(|c| c.photo.as_ref())),
      birth_certificate: keep(
        self.birth_certificate,
        current.and_then(|c| c.birth_certificate.as_ref()),
      ),
      health_record: keep(self.health_record, current.and_then(|c| c.health_record.as_ref())),
      status,
    };

    draft.collect_errors(&mut errors);
    errors.into_result()?;
    Ok(draft)
  }
}

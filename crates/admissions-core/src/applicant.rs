//! Applicants: a prospective student's personal and contact record.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{
  FieldErrors, Result,
  patch::{WriteMode, double_option, reject_blank, required_text},
};

// ─── Stored record ───────────────────────────────────────────────────────────

/// A persisted applicant. `id` and both timestamps are assigned by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Applicant {
  pub id:            i64,
  pub first_name:    String,
  pub last_name:     String,
  /// Free text, not an enumeration.
  pub gender:        String,
  pub dob:           Option<NaiveDate>,
  pub guardian_name: String,
  pub email:         String,
  pub phone:         String,
  pub address:       String,
  /// Set once at creation.
  pub created_at:    DateTime<Utc>,
  /// Reset on every mutation.
  pub updated_at:    DateTime<Utc>,
}

// ─── Draft ───────────────────────────────────────────────────────────────────

/// A complete set of applicant attributes, ready to be validated and stored.
#[derive(Debug, Clone, PartialEq, Eq, Validate)]
pub struct ApplicantDraft {
  #[validate(length(max = 30, message = "Ensure this field has no more than 30 characters."))]
  pub first_name:    String,
  #[validate(length(max = 30, message = "Ensure this field has no more than 30 characters."))]
  pub last_name:     String,
  #[validate(length(max = 10, message = "Ensure this field has no more than 10 characters."))]
  pub gender:        String,
  pub dob:           Option<NaiveDate>,
  #[validate(length(max = 100, message = "Ensure this field has no more than 100 characters."))]
  pub guardian_name: String,
  #[validate(
    email(message = "Enter a valid email address."),
    length(max = 100, message = "Ensure this field has no more than 100 characters.")
  )]
  pub email:         String,
  #[validate(length(max = 20, message = "Ensure this field has no more than 20 characters."))]
  pub phone:         String,
  pub address:       String,
}

impl ApplicantDraft {
  /// Check blank, length and email rules. Every offending field is reported.
  pub fn check(&self) -> Result<()> {
    let mut errors = FieldErrors::default();
    self.collect_errors(&mut errors);
    errors.into_result()
  }

  /// Record this draft's failures in `errors`, skipping fields that already
  /// carry a message.
  pub(crate) fn collect_errors(&self, errors: &mut FieldErrors) {
    reject_blank(errors, &[
      ("first_name", &self.first_name),
      ("last_name", &self.last_name),
      ("gender", &self.gender),
      ("guardian_name", &self.guardian_name),
      ("email", &self.email),
      ("phone", &self.phone),
      ("address", &self.address),
    ]);
    if let Err(e) = self.validate() {
      errors.absorb(e);
    }
  }
}

// ─── Input ───────────────────────────────────────────────────────────────────

/// Applicant attributes as supplied by a caller; every field may be absent.
///
/// This is the write contract of the applicant resource. `id`, `created_at`
/// and `updated_at` are not part of it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApplicantInput {
  pub first_name:    Option<String>,
  pub last_name:     Option<String>,
  pub gender:        Option<String>,
  #[serde(default, deserialize_with = "double_option")]
  pub dob:           Option<Option<NaiveDate>>,
  pub guardian_name: Option<String>,
  pub email:         Option<String>,
  pub phone:         Option<String>,
  pub address:       Option<String>,
}

impl ApplicantInput {
  /// Build a draft for a new applicant. All required attributes must be
  /// present.
  pub fn into_draft(self) -> Result<ApplicantDraft> { self.resolve(None, WriteMode::Full) }

  /// Build the draft that results from applying this input to `current`.
  pub fn apply_to(self, current: &Applicant, mode: WriteMode) -> Result<ApplicantDraft> {
    self.resolve(Some(current), mode)
  }

  fn resolve(self, current: Option<&Applicant>, mode: WriteMode) -> Result<ApplicantDraft> {
    let mut errors = FieldErrors::default();
    let mut text = |field: &str, incoming: Option<String>, stored: Option<&str>| {
      required_text(&mut errors, field, incoming, stored, mode)
    };

    let draft = ApplicantDraft {
      first_name:    text("first_name", self.first_name, current.map(|c| c.first_name.as_str())),
      last_name:     text("last_name", self.last_name, current.map(|c| c.last_name.as_str())),
      gender:        text("gender", self.gender, current.map(|c| c.gender.as_str())),
      guardian_name: text(
        "guardian_name",
        self.guardian_name,
        current.map(|c| c.guardian_name.as_str()),
      ),
      email:         text("email", self.email, current.map(|c| c.email.as_str())),
      phone:         text("phone", self.phone, current.map(|c| c.phone.as_str())),
      address:       text("address", self.address, current.map(|c| c.address.as_str())),
      dob:           match self.dob {
        Some(dob) => dob,
        None => current.and_then(|c| c.dob),
      },
    };

    draft.collect_errors(&mut errors);
    errors.into_result()?;
    Ok(draft)
  }
}

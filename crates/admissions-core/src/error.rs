//! Error types for `admissions-core`.

use std::{collections::BTreeMap, fmt};

use serde::Serialize;
use thiserror::Error;

/// Field name used for failures that do not belong to a single field.
pub const NON_FIELD_ERRORS: &str = "non_field_errors";

#[derive(Debug, Error)]
pub enum Error {
  #[error("validation failed: {0}")]
  Validation(FieldErrors),

  #[error("applicant not found: {0}")]
  ApplicantNotFound(i64),

  #[error("application not found: {0}")]
  ApplicationNotFound(i64),

  #[error("applicant {0} already has an application")]
  Conflict(i64),

  #[error("storage error: {0}")]
  Storage(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  /// A validation failure carrying a single message for `field`.
  pub fn invalid(field: &str, message: impl Into<String>) -> Self {
    let mut errors = FieldErrors::default();
    errors.add(field, message);
    Self::Validation(errors)
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

// ─── FieldErrors ─────────────────────────────────────────────────────────────

/// Validation messages keyed by the offending field.
///
/// Serialises as `{"field": ["message", ...]}`. Field order is stable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
  pub fn add(&mut self, field: &str, message: impl Into<String>) {
    self.0.entry(field.to_owned()).or_default().push(message.into());
  }

  pub fn is_empty(&self) -> bool { self.0.is_empty() }

  pub fn contains(&self, field: &str) -> bool { self.0.contains_key(field) }

  /// Messages recorded for `field`, empty if none.
  pub fn messages(&self, field: &str) -> &[String] {
    self.0.get(field).map(Vec::as_slice).unwrap_or(&[])
  }

  /// Fold in everything from `other`.
  pub fn merge(&mut self, other: FieldErrors) {
    for (field, messages) in other.0 {
      self.0.entry(field).or_default().extend(messages);
    }
  }

  /// Fold in derive-based validation failures. Fields that already carry a
  /// message (e.g. "may not be blank") are left alone so a single problem is
  /// not reported twice.
  pub fn absorb(&mut self, errors: validator::ValidationErrors) {
    for (field, failures) in errors.field_errors() {
      let field = field.to_string();
      if self.0.contains_key(&field) {
        continue;
      }
      for failure in failures {
        let message = failure
          .message
          .as_ref()
          .map(|m| m.to_string())
          .unwrap_or_else(|| failure.code.to_string());
        self.add(&field, message);
      }
    }
  }

  /// `Ok(())` when nothing was recorded, otherwise [`Error::Validation`].
  pub fn into_result(self) -> Result<()> {
    if self.is_empty() { Ok(()) } else { Err(Error::Validation(self)) }
  }
}

impl fmt::Display for FieldErrors {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let mut first = true;
    for (field, messages) in &self.0 {
      for message in messages {
        if !first {
          f.write_str("; ")?;
        }
        write!(f, "{field}: {message}")?;
        first = false;
      }
    }
    Ok(())
  }
}

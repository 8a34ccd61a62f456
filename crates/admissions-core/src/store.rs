//! The `AdmissionsStore` trait and supporting query types.
//!
//! The trait is implemented by storage backends (e.g.
//! `admissions-store-sqlite`). The HTTP layer depends on this abstraction, not
//! on any concrete backend.

use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::{
  applicant::{Applicant, ApplicantDraft},
  application::{Application, ApplicationDraft, ApplicationStatus},
};

// ─── Query types ─────────────────────────────────────────────────────────────

/// Parameters for [`AdmissionsStore::list_applicants`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApplicantFilter {
  /// Case-insensitive substring matched against first name, last name, email
  /// and phone.
  pub search: Option<String>,
}

/// Parameters for [`AdmissionsStore::list_applications`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApplicationFilter {
  pub status:      Option<ApplicationStatus>,
  pub apply_grade: Option<String>,
}

/// Application counts per review status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusSummary {
  pub total:    u64,
  pub pending:  u64,
  pub approved: u64,
  pub rejected: u64,
}

impl StatusSummary {
  pub fn record(&mut self, status: ApplicationStatus, count: u64) {
    match status {
      ApplicationStatus::Pending => self.pending += count,
      ApplicationStatus::Approved => self.approved += count,
      ApplicationStatus::Rejected => self.rejected += count,
    }
    self.total += count;
  }
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over an admissions store backend.
///
/// Writes take drafts and validate them before touching storage. Referential
/// integrity (an application's applicant must exist, at most one application
/// per applicant, deleting an applicant deletes its application) is the
/// backend's responsibility and must hold under concurrent writers.
///
/// Backend errors convert into [`crate::Error`] so callers can tell
/// validation failures, missing records and conflicts apart.
pub trait AdmissionsStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + Into<crate::Error> + 'static;

  // ── Applicants ────────────────────────────────────────────────────────

  /// All applicants matching `filter`, ordered by id ascending.
  fn list_applicants<'a>(
    &'a self,
    filter: &'a ApplicantFilter,
  ) -> impl Future<Output = Result<Vec<Applicant>, Self::Error>> + Send + 'a;

  /// Retrieve an applicant by id. Returns `None` if not found.
  fn get_applicant(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<Option<Applicant>, Self::Error>> + Send + '_;

  /// Validate and persist a new applicant. The store assigns the id and both
  /// timestamps.
  fn create_applicant(
    &self,
    draft: ApplicantDraft,
  ) -> impl Future<Output = Result<Applicant, Self::Error>> + Send + '_;

  /// Replace the attributes of an existing applicant and reset `updated_at`.
  /// `created_at` is never changed.
  fn update_applicant(
    &self,
    id: i64,
    draft: ApplicantDraft,
  ) -> impl Future<Output = Result<Applicant, Self::Error>> + Send + '_;

  /// Delete an applicant together with its application, if any.
  fn delete_applicant(&self, id: i64) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Applications ──────────────────────────────────────────────────────

  /// All applications matching `filter`, ordered by id ascending.
  fn list_applications<'a>(
    &'a self,
    filter: &'a ApplicationFilter,
  ) -> impl Future<Output = Result<Vec<Application>, Self::Error>> + Send + 'a;

  /// Retrieve an application by id. Returns `None` if not found.
  fn get_application(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<Option<Application>, Self::Error>> + Send + '_;

  /// Validate and persist a new application.
  ///
  /// Fails with a validation error on `applicant` if the applicant does not
  /// exist, and with [`crate::Error::Conflict`] if it already has an
  /// application.
  fn create_application(
    &self,
    draft: ApplicationDraft,
  ) -> impl Future<Output = Result<Application, Self::Error>> + Send + '_;

  /// Replace the attributes of an existing application and reset
  /// `updated_at`. The same applicant rules as for creation apply.
  fn update_application(
    &self,
    id: i64,
    draft: ApplicationDraft,
  ) -> impl Future<Output = Result<Application, Self::Error>> + Send + '_;

  fn delete_application(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Count applications per status.
  fn status_summary(&self) -> impl Future<Output = Result<StatusSummary, Self::Error>> + Send + '_;
}

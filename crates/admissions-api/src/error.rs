//! API error type and [`axum::response::IntoResponse`] implementation.

use admissions_core::{FieldErrors, error::NON_FIELD_ERRORS};
use axum::{
  Json,
  extract::rejection::{JsonRejection, PathRejection, QueryRejection},
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("validation failed: {0}")]
  Validation(FieldErrors),

  #[error("not found: {0}")]
  NotFound(String),

  #[error("conflict: {0}")]
  Conflict(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("media error: {0}")]
  Media(#[from] std::io::Error),
}

impl ApiError {
  /// A request body that could not be decoded at all.
  pub fn malformed(message: impl Into<String>) -> Self {
    let mut errors = FieldErrors::default();
    errors.add(NON_FIELD_ERRORS, message);
    Self::Validation(errors)
  }

  /// Convert any store error through the domain error type.
  pub fn store<E: Into<admissions_core::Error>>(err: E) -> Self { Self::from(err.into()) }
}

impl From<admissions_core::Error> for ApiError {
  fn from(err: admissions_core::Error) -> Self {
    use admissions_core::Error as E;
    match err {
      E::Validation(errors) => Self::Validation(errors),
      E::ApplicantNotFound(id) => Self::NotFound(format!("applicant {id} not found")),
      E::ApplicationNotFound(id) => Self::NotFound(format!("application {id} not found")),
      E::Conflict(id) => Self::Conflict(format!("applicant {id} already has an application")),
      E::Storage(e) => Self::Store(e),
    }
  }
}

impl From<JsonRejection> for ApiError {
  fn from(rejection: JsonRejection) -> Self { Self::malformed(rejection.body_text()) }
}

impl From<PathRejection> for ApiError {
  fn from(rejection: PathRejection) -> Self { Self::malformed(rejection.body_text()) }
}

impl From<QueryRejection> for ApiError {
  fn from(rejection: QueryRejection) -> Self { Self::malformed(rejection.body_text()) }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    match self {
      ApiError::Validation(fields) => (
        StatusCode::BAD_REQUEST,
        Json(json!({ "error": "validation failed", "fields": fields })),
      )
        .into_response(),
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, Json(json!({ "error": m }))).into_response(),
      ApiError::Conflict(m) => (StatusCode::CONFLICT, Json(json!({ "error": m }))).into_response(),
      ApiError::Store(_) | ApiError::Media(_) => {
        tracing::error!(error = %self, "request failed");
        (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "error": self.to_string() })))
          .into_response()
      }
    }
  }
}

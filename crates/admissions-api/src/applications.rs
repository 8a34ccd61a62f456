//! Handlers for `/applications` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/applications` | Optional `?status=` and `?apply_grade=`; ordered by id |
//! | `GET`    | `/applications/summary` | Counts per status |
//! | `POST`   | `/applications` | JSON, form or multipart body; returns 201 |
//! | `GET`    | `/applications/:id` | 404 if not found |
//! | `PUT`    | `/applications/:id` | `applicant` and `apply_grade` required |
//! | `PATCH`  | `/applications/:id` | Any subset of attributes |
//! | `DELETE` | `/applications/:id` | |
//!
//! Document fields are returned as URLs under the configured media prefix.
//! Uploads are written only after the rest of the request has validated, and
//! files created for a write that the store then rejects are removed.

use admissions_core::{
  application::{Application, ApplicationStatus, Attachment},
  patch::WriteMode,
  store::{AdmissionsStore, ApplicationFilter, StatusSummary},
};
use axum::{
  Json,
  extract::State,
  http::StatusCode,
  response::IntoResponse,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::{
  AppState,
  error::ApiError,
  extract::{Path, Query},
  media::MediaStore,
  payload::ApplicationPayload,
};

// ─── Response ────────────────────────────────────────────────────────────────

/// Wire representation of an application.
#[derive(Debug, Serialize)]
pub struct ApplicationResponse {
  pub id:                i64,
  /// Id of the linked applicant.
  pub applicant:         i64,
  pub apply_grade:       String,
  pub extra_curriculars: Option<Vec<Value>>,
  pub photo:             Option<String>,
  pub birth_certificate: Option<String>,
  pub health_record:     Option<String>,
  pub status:            ApplicationStatus,
  pub submitted_at:      DateTime<Utc>,
  pub updated_at:        DateTime<Utc>,
}

impl ApplicationResponse {
  pub fn new(app: Application, media: &MediaStore) -> Self {
    let url = |which| app.attachment(which).map(|path| media.url(path));
    Self {
      photo:             url(Attachment::Photo),
      birth_certificate: url(Attachment::BirthCertificate),
      health_record:     url(Attachment::HealthRecord),
      id:                app.id,
      applicant:         app.applicant_id,
      apply_grade:       app.apply_grade,
      extra_curriculars: app.extra_curriculars,
      status:            app.status,
      submitted_at:      app.submitted_at,
      updated_at:        app.updated_at,
    }
  }
}

// ─── List ─────────────────────────────────────────────────────────────────────

/// `GET /applications[?status=<status>][&apply_grade=<grade>]`
pub async fn list<S>(
  State(state): State<AppState<S>>,
  Query(filter): Query<ApplicationFilter>,
) -> Result<Json<Vec<ApplicationResponse>>, ApiError>
where
  S: AdmissionsStore + 'static,
{
  let applications = state
    .store
    .list_applications(&filter)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(
    applications
      .into_iter()
      .map(|a| ApplicationResponse::new(a, &state.media))
      .collect(),
  ))
}

/// `GET /applications/summary`
pub async fn summary<S>(State(state): State<AppState<S>>) -> Result<Json<StatusSummary>, ApiError>
where
  S: AdmissionsStore + 'static,
{
  let summary = state.store.status_summary().await.map_err(ApiError::store)?;
  Ok(Json(summary))
}

// ─── Create ───────────────────────────────────────────────────────────────────

/// `POST /applications`
pub async fn create<S>(
  State(state): State<AppState<S>>,
  payload: ApplicationPayload,
) -> Result<impl IntoResponse, ApiError>
where
  S: AdmissionsStore + 'static,
{
  let (input, uploads) = payload.into_parts()?;
  let mut draft = input.into_draft()?;
  let written = uploads.write(&state.media, &mut draft).await?;
  let application = match state.store.create_application(draft).await {
    Ok(application) => application,
    Err(e) => {
      written.discard(&state.media).await;
      return Err(ApiError::store(e));
    }
  };
  tracing::info!(
    application_id = application.id,
    applicant_id = application.applicant_id,
    "application submitted"
  );
  Ok((
    StatusCode::CREATED,
    Json(ApplicationResponse::new(application, &state.media)),
  ))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /applications/:id`
pub async fn get_one<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<i64>,
) -> Result<Json<ApplicationResponse>, ApiError>
where
  S: AdmissionsStore + 'static,
{
  let application = fetch(&state, id).await?;
  Ok(Json(ApplicationResponse::new(application, &state.media)))
}

async fn fetch<S>(state: &AppState<S>, id: i64) -> Result<Application, ApiError>
where
  S: AdmissionsStore + 'static,
{
  state
    .store
    .get_application(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("application {id} not found")))
}

// ─── Update ───────────────────────────────────────────────────────────────────

/// `PUT /applications/:id`
pub async fn replace<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<i64>,
  payload: ApplicationPayload,
) -> Result<Json<ApplicationResponse>, ApiError>
where
  S: AdmissionsStore + 'static,
{
  update(&state, id, payload, WriteMode::Full).await
}

/// `PATCH /applications/:id`
pub async fn patch<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<i64>,
  payload: ApplicationPayload,
) -> Result<Json<ApplicationResponse>, ApiError>
where
  S: AdmissionsStore + 'static,
{
  update(&state, id, payload, WriteMode::Partial).await
}

async fn update<S>(
  state: &AppState<S>,
  id: i64,
  payload: ApplicationPayload,
  mode: WriteMode,
) -> Result<Json<ApplicationResponse>, ApiError>
where
  S: AdmissionsStore + 'static,
{
  let (input, uploads) = payload.into_parts()?;
  let current = fetch(state, id).await?;
  let mut draft = input.apply_to(&current, mode)?;
  let written = uploads.write(&state.media, &mut draft).await?;
  let application = match state.store.update_application(id, draft).await {
    Ok(application) => application,
    Err(e) => {
      written.discard(&state.media).await;
      return Err(ApiError::store(e));
    }
  };
  if application.status != current.status {
    tracing::info!(
      application_id = id,
      from = %current.status,
      to = %application.status,
      "application status changed"
    );
  }
  Ok(Json(ApplicationResponse::new(application, &state.media)))
}

// ─── Delete ───────────────────────────────────────────────────────────────────

/// `DELETE /applications/:id`
pub async fn delete<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<i64>,
) -> Result<StatusCode, ApiError>
where
  S: AdmissionsStore + 'static,
{
  state
    .store
    .delete_application(id)
    .await
    .map_err(ApiError::store)?;
  tracing::info!(application_id = id, "application deleted");
  Ok(StatusCode::NO_CONTENT)
}

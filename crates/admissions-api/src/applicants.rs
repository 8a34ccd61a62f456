//! Handlers for `/applicants` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/applicants` | Optional `?search=`; ordered by id |
//! | `POST`   | `/applicants` | Body: every required attribute; returns 201 |
//! | `GET`    | `/applicants/:id` | 404 if not found |
//! | `PUT`    | `/applicants/:id` | Body: every required attribute |
//! | `PATCH`  | `/applicants/:id` | Body: any subset of attributes |
//! | `DELETE` | `/applicants/:id` | Also deletes the linked application |

use admissions_core::{
  applicant::{Applicant, ApplicantInput},
  patch::WriteMode,
  store::{AdmissionsStore, ApplicantFilter},
};
use axum::{
  Json,
  extract::State,
  http::StatusCode,
  response::IntoResponse,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use crate::{
  AppState,
  error::ApiError,
  extract::{JsonBody, Path, Query},
};

// ─── Response ────────────────────────────────────────────────────────────────

/// Wire representation of an applicant.
#[derive(Debug, Serialize)]
pub struct ApplicantResponse {
  pub id:            i64,
  pub first_name:    String,
  pub last_name:     String,
  pub gender:        String,
  pub dob:           Option<NaiveDate>,
  pub guardian_name: String,
  pub email:         String,
  pub phone:         String,
  pub address:       String,
  pub created_at:    DateTime<Utc>,
  pub updated_at:    DateTime<Utc>,
}

impl From<Applicant> for ApplicantResponse {
  fn from(a: Applicant) -> Self {
    Self {
      id:            a.id,
      first_name:    a.first_name,
      last_name:     a.last_name,
      gender:        a.gender,
      dob:           a.dob,
      guardian_name: a.guardian_name,
      email:         a.email,
      phone:         a.phone,
      address:       a.address,
      created_at:    a.created_at,
      updated_at:    a.updated_at,
    }
  }
}

// ─── List ─────────────────────────────────────────────────────────────────────

/// `GET /applicants[?search=<text>]`
pub async fn list<S>(
  State(state): State<AppState<S>>,
  Query(filter): Query<ApplicantFilter>,
) -> Result<Json<Vec<ApplicantResponse>>, ApiError>
where
  S: AdmissionsStore + 'static,
{
  let applicants = state
    .store
    .list_applicants(&filter)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(applicants.into_iter().map(ApplicantResponse::from).collect()))
}

// ─── Create ───────────────────────────────────────────────────────────────────

/// `POST /applicants`
pub async fn create<S>(
  State(state): State<AppState<S>>,
  JsonBody(body): JsonBody<ApplicantInput>,
) -> Result<impl IntoResponse, ApiError>
where
  S: AdmissionsStore + 'static,
{
  let draft = body.into_draft()?;
  let applicant = state
    .store
    .create_applicant(draft)
    .await
    .map_err(ApiError::store)?;
  tracing::info!(applicant_id = applicant.id, "applicant created");
  Ok((StatusCode::CREATED, Json(ApplicantResponse::from(applicant))))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /applicants/:id`
pub async fn get_one<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<i64>,
) -> Result<Json<ApplicantResponse>, ApiError>
where
  S: AdmissionsStore + 'static,
{
  let applicant = fetch(&state, id).await?;
  Ok(Json(applicant.into()))
}

async fn fetch<S>(state: &AppState<S>, id: i64) -> Result<Applicant, ApiError>
where
  S: AdmissionsStore + 'static,
{
  state
    .store
    .get_applicant(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("applicant {id} not found")))
}

// ─── Update ───────────────────────────────────────────────────────────────────

/// `PUT /applicants/:id`
pub async fn replace<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<i64>,
  JsonBody(body): JsonBody<ApplicantInput>,
) -> Result<Json<ApplicantResponse>, ApiError>
where
  S: AdmissionsStore + 'static,
{
  update(&state, id, body, WriteMode::Full).await
}

/// `PATCH /applicants/:id`
pub async fn patch<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<i64>,
  JsonBody(body): JsonBody<ApplicantInput>,
) -> Result<Json<ApplicantResponse>, ApiError>
where
  S: AdmissionsStore + 'static,
{
  update(&state, id, body, WriteMode::Partial).await
}

async fn update<S>(
  state: &AppState<S>,
  id: i64,
  body: ApplicantInput,
  mode: WriteMode,
) -> Result<Json<ApplicantResponse>, ApiError>
where
  S: AdmissionsStore + 'static,
{
  let current = fetch(state, id).await?;
  let draft = body.apply_to(&current, mode)?;
  let applicant = state
    .store
    .update_applicant(id, draft)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(applicant.into()))
}

// ─── Delete ───────────────────────────────────────────────────────────────────

/// `DELETE /applicants/:id`
pub async fn delete<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<i64>,
) -> Result<StatusCode, ApiError>
where
  S: AdmissionsStore + 'static,
{
  state
    .store
    .delete_applicant(id)
    .await
    .map_err(ApiError::store)?;
  tracing::info!(applicant_id = id, "applicant deleted");
  Ok(StatusCode::NO_CONTENT)
}

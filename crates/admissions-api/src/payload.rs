//! Request body extractors.
//!
//! Applicant writes are plain JSON. Application writes may arrive as JSON,
//! `application/x-www-form-urlencoded`, or `multipart/form-data` (the only
//! encoding that can carry document uploads); all three are normalised into
//! an [`ApplicationPayload`]. Uploaded bytes are held in memory until the
//! handler has validated the rest of the request.

use admissions_core::{
  FieldErrors,
  application::{ApplicationDraft, ApplicationInput, Attachment},
  extracurriculars::ExtraCurricularsInput,
  patch::double_option,
};
use axum::{
  Form, Json,
  extract::{FromRequest, Multipart, Request},
  http::header,
};
use bytes::Bytes;
use serde::Deserialize;
use serde_json::Value;

use crate::{error::ApiError, media::MediaStore};

const NOT_A_FILE: &str = "The submitted data was not a file. Check the encoding type on the form.";
const BAD_PK: &str = "Incorrect type. Expected pk value.";

// ─── JSON ────────────────────────────────────────────────────────────────────

/// An applicant reference as it may appear in JSON: `3` or `"3"`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PkValue {
  Int(i64),
  Text(String),
}

/// JSON body accepted by the application write endpoints.
#[derive(Debug, Deserialize)]
struct ApplicationJson {
  applicant:         Option<PkValue>,
  apply_grade:       Option<String>,
  #[serde(default, deserialize_with = "double_option")]
  extra_curriculars: Option<Option<ExtraCurricularsInput>>,
  status:            Option<String>,
  #[serde(default, deserialize_with = "double_option")]
  photo:             Option<Option<Value>>,
  #[serde(default, deserialize_with = "double_option")]
  birth_certificate: Option<Option<Value>>,
  #[serde(default, deserialize_with = "double_option")]
  health_record:     Option<Option<Value>>,
}

// ─── Normalised payload ──────────────────────────────────────────────────────

/// A file field in a write request.
#[derive(Debug)]
enum FilePart {
  /// Remove the stored reference.
  Clear,
  Upload { file_name: Option<String>, bytes: Bytes },
}

/// An application write request, independent of its encoding.
#[derive(Debug, Default)]
pub struct ApplicationPayload {
  input:  ApplicationInput,
  files:  Vec<(Attachment, FilePart)>,
  errors: FieldErrors,
}

impl ApplicationPayload {
  fn set_applicant(&mut self, raw: &str) {
    let raw = raw.trim();
    if raw.is_empty() {
      return;
    }
    match raw.parse::<i64>() {
      Ok(id) => self.input.applicant = Some(id),
      Err(_) => self.errors.add("applicant", BAD_PK),
    }
  }

  /// Apply one text field from a form or multipart body. Unknown names are
  /// ignored.
  fn set_text(&mut self, name: &str, value: String) {
    if let Some(which) = attachment(name) {
      if value.is_empty() {
        self.files.push((which, FilePart::Clear));
      } else {
        self.errors.add(which.field(), NOT_A_FILE);
      }
      return;
    }
    match name {
      "applicant" => self.set_applicant(&value),
      "apply_grade" => self.input.apply_grade = Some(value),
      "status" => self.input.status = Some(value),
      "extra_curriculars" => {
        self.input.extra_curriculars = Some(Some(ExtraCurricularsInput::RawString(value)));
      }
      _ => {}
    }
  }

  fn from_json(body: ApplicationJson) -> Self {
    let mut payload = Self::default();
    match body.applicant {
      Some(PkValue::Int(id)) => payload.input.applicant = Some(id),
      Some(PkValue::Text(raw)) => payload.set_applicant(&raw),
      None => {}
    }
    payload.input.apply_grade = body.apply_grade;
    payload.input.extra_curriculars = body.extra_curriculars;
    payload.input.status = body.status;

    for (which, value) in [
      (Attachment::Photo, body.photo),
      (Attachment::BirthCertificate, body.birth_certificate),
      (Attachment::HealthRecord, body.health_record),
    ] {
      match value {
        None => {}
        Some(None) => payload.files.push((which, FilePart::Clear)),
        Some(Some(_)) => payload.errors.add(which.field(), NOT_A_FILE),
      }
    }
    payload
  }

  fn from_form(pairs: Vec<(String, String)>) -> Self {
    let mut payload = Self::default();
    for (name, value) in pairs {
      payload.set_text(&name, value);
    }
    payload
  }

  async fn from_multipart(mut multipart: Multipart) -> Result<Self, ApiError> {
    let mut payload = Self::default();
    while let Some(field) = multipart
      .next_field()
      .await
      .map_err(|e| ApiError::malformed(e.body_text()))?
    {
      let name = field.name().unwrap_or_default().to_owned();
      let file_name = field.file_name().map(str::to_owned);

      match (attachment(&name), file_name) {
        (Some(which), Some(file_name)) => {
          let bytes = field.bytes().await.map_err(|e| ApiError::malformed(e.body_text()))?;
          // Browsers send an empty, unnamed part for an untouched file input.
          if file_name.is_empty() && bytes.is_empty() {
            continue;
          }
          let file_name = (!file_name.is_empty()).then_some(file_name);
          payload.files.push((which, FilePart::Upload { file_name, bytes }));
        }
        _ => {
          let value = field.text().await.map_err(|e| ApiError::malformed(e.body_text()))?;
          payload.set_text(&name, value);
        }
      }
    }
    Ok(payload)
  }

  /// Separate the caller's field values from the uploaded documents.
  ///
  /// Field-level problems found while decoding are reported here, before
  /// anything touches the media store.
  pub fn into_parts(self) -> Result<(ApplicationInput, PendingUploads), ApiError> {
    if !self.errors.is_empty() {
      return Err(ApiError::Validation(self.errors));
    }

    let mut input = self.input;
    let mut uploads = Vec::new();
    for (which, part) in self.files {
      // A later part for the same field replaces an earlier one.
      uploads.retain(|(w, _, _)| *w != which);
      match part {
        FilePart::Clear => *input.attachment_mut(which) = Some(None),
        FilePart::Upload { file_name, bytes } => {
          *input.attachment_mut(which) = None;
          uploads.push((which, file_name, bytes));
        }
      }
    }
    Ok((input, PendingUploads(uploads)))
  }
}

// ─── Uploads ─────────────────────────────────────────────────────────────────

/// Uploaded documents not yet written to the media store.
#[derive(Debug, Default)]
pub struct PendingUploads(Vec<(Attachment, Option<String>, Bytes)>);

impl PendingUploads {
  /// Write every upload and point the matching draft field at it.
  ///
  /// Call this only once the draft has been validated. If a write fails
  /// part-way, files created by earlier writes are removed.
  pub async fn write(
    self,
    media: &MediaStore,
    draft: &mut ApplicationDraft,
  ) -> Result<WrittenUploads, ApiError> {
    let mut written = WrittenUploads::default();
    for (which, file_name, bytes) in self.0 {
      match media.save(which, file_name.as_deref(), &bytes).await {
        Ok(stored) => {
          if stored.created {
            written.created.push(stored.path.clone());
          }
          *draft.attachment_mut(which) = Some(stored.path);
        }
        Err(e) => {
          written.discard(media).await;
          return Err(e.into());
        }
      }
    }
    Ok(written)
  }
}

/// Files created for one request, kept so they can be removed if the record
/// write that references them fails.
#[derive(Debug, Default)]
#[must_use]
pub struct WrittenUploads {
  created: Vec<String>,
}

impl WrittenUploads {
  /// Remove the files this request created. Files whose content was already
  /// stored are left alone.
  pub async fn discard(self, media: &MediaStore) {
    for path in self.created {
      if let Err(e) = media.remove(&path).await {
        tracing::warn!(path = %path, error = %e, "failed to remove unreferenced upload");
      }
    }
  }
}

fn attachment(name: &str) -> Option<Attachment> { name.parse().ok() }

impl<S> FromRequest<S> for ApplicationPayload
where
  S: Send + Sync,
{
  type Rejection = ApiError;

  async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
    let content_type = req
      .headers()
      .get(header::CONTENT_TYPE)
      .and_then(|v| v.to_str().ok())
      .map(str::to_ascii_lowercase)
      .unwrap_or_default();

    if content_type.starts_with("multipart/form-data") {
      let multipart = Multipart::from_request(req, state)
        .await
        .map_err(|e| ApiError::malformed(e.body_text()))?;
      Self::from_multipart(multipart).await
    } else if content_type.starts_with("application/x-www-form-urlencoded") {
      let Form(pairs) = Form::<Vec<(String, String)>>::from_request(req, state)
        .await
        .map_err(|e| ApiError::malformed(e.body_text()))?;
      Ok(Self::from_form(pairs))
    } else {
      let Json(body) = Json::<ApplicationJson>::from_request(req, state).await?;
      Ok(Self::from_json(body))
    }
  }
}

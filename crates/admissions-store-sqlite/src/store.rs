//! [`SqliteStore`]: the SQLite implementation of [`AdmissionsStore`].

use std::path::Path;

use admissions_core::{
  applicant::{Applicant, ApplicantDraft},
  application::{Application, ApplicationDraft},
  store::{AdmissionsStore, ApplicantFilter, ApplicationFilter, StatusSummary},
};
use chrono::Utc;
use rusqlite::{OptionalExtension as _, ffi};

use crate::{
  Error, Result,
  encode::{
    APPLICANT_COLUMNS, APPLICATION_COLUMNS, RawApplicant, RawApplication, decode_status,
    encode_date, encode_dt, encode_extras, encode_status, like_pattern,
  },
  schema::SCHEMA,
};

// ─── Constraint mapping ──────────────────────────────────────────────────────

/// Translate a failed application write into a domain error.
///
/// The applicant reference and the one-application-per-applicant rule are
/// enforced by the schema, so concurrent writers cannot slip past them.
fn application_write_error(err: tokio_rusqlite::Error, applicant_id: i64) -> Error {
  if let tokio_rusqlite::Error::Rusqlite(rusqlite::Error::SqliteFailure(ref failure, _)) = err {
    match failure.extended_code {
      ffi::SQLITE_CONSTRAINT_FOREIGNKEY => {
        return admissions_core::Error::invalid("applicant", "applicant not found").into();
      }
      ffi::SQLITE_CONSTRAINT_UNIQUE => {
        return admissions_core::Error::Conflict(applicant_id).into();
      }
      _ => {}
    }
  }
  Error::Database(err)
}

/// Column values of an applicant draft, encoded for binding.
struct ApplicantParams {
  first_name:    String,
  last_name:     String,
  gender:        String,
  dob:           Option<String>,
  guardian_name: String,
  email:         String,
  phone:         String,
  address:       String,
}

impl From<&ApplicantDraft> for ApplicantParams {
  fn from(d: &ApplicantDraft) -> Self {
    Self {
      first_name:    d.first_name.clone(),
      last_name:     d.last_name.clone(),
      gender:        d.gender.clone(),
      dob:           d.dob.map(encode_date),
      guardian_name: d.guardian_name.clone(),
      email:         d.email.clone(),
      phone:         d.phone.clone(),
      address:       d.address.clone(),
    }
  }
}

/// Column values of an application draft, encoded for binding.
struct ApplicationParams {
  applicant_id:      i64,
  apply_grade:       String,
  extra_curriculars: Option<String>,
  photo:             Option<String>,
  birth_certificate: Option<String>,
  health_record:     Option<String>,
  status:            &'static str,
}

impl ApplicationParams {
  fn encode(d: &ApplicationDraft) -> Result<Self> {
    Ok(Self {
      applicant_id:      d.applicant_id,
      apply_grade:       d.apply_grade.clone(),
      extra_curriculars: d.extra_curriculars.as_deref().map(encode_extras).transpose()?,
      photo:             d.photo.clone(),
      birth_certificate: d.birth_certificate.clone(),
      health_record:     d.health_record.clone(),
      status:            encode_status(d.status),
    })
  }
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// An admissions store backed by a single SQLite file.
///
/// Clones share one reference-counted connection.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── AdmissionsStore impl ────────────────────────────────────────────────────

impl AdmissionsStore for SqliteStore {
  type Error = Error;

  // ── Applicants ────────────────────────────────────────────────────────────

  async fn list_applicants(&self, filter: &ApplicantFilter) -> Result<Vec<Applicant>> {
    let pattern = filter
      .search
      .as_deref()
      .map(str::trim)
      .filter(|s| !s.is_empty())
      .map(like_pattern);

    let raws: Vec<RawApplicant> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          r"SELECT {APPLICANT_COLUMNS} FROM applicants
            WHERE ?1 IS NULL
               OR first_name LIKE ?1 ESCAPE '\'
               OR last_name  LIKE ?1 ESCAPE '\'
               OR email      LIKE ?1 ESCAPE '\'
               OR phone      LIKE ?1 ESCAPE '\'
            ORDER BY id ASC"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![pattern], RawApplicant::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawApplicant::into_applicant).collect()
  }

  async fn get_applicant(&self, id: i64) -> Result<Option<Applicant>> {
    let raw: Option<RawApplicant> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {APPLICANT_COLUMNS} FROM applicants WHERE id = ?1"),
              rusqlite::params![id],
              RawApplicant::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawApplicant::into_applicant).transpose()
  }

  async fn create_applicant(&self, draft: ApplicantDraft) -> Result<Applicant> {
    draft.check()?;

    let now = Utc::now();
    let p = ApplicantParams::from(&draft);
    let at_str = encode_dt(now);

    let id: i64 = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO applicants (
             first_name, last_name, gender, dob, guardian_name,
             email, phone, address, created_at, updated_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)",
          rusqlite::params![
            p.first_name,
            p.last_name,
            p.gender,
            p.dob,
            p.guardian_name,
            p.email,
            p.phone,
            p.address,
            at_str,
          ],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await?;

    tracing::debug!(applicant_id = id, "applicant created");

    Ok(Applicant {
      id,
      first_name: draft.first_name,
      last_name: draft.last_name,
      gender: draft.gender,
      dob: draft.dob,
      guardian_name: draft.guardian_name,
      email: draft.email,
      phone: draft.phone,
      address: draft.address,
      created_at: now,
      updated_at: now,
    })
  }

  async fn update_applicant(&self, id: i64, draft: ApplicantDraft) -> Result<Applicant> {
    draft.check()?;

    let p = ApplicantParams::from(&draft);
    let at_str = encode_dt(Utc::now());

    let raw: Option<RawApplicant> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let changed = tx.execute(
          "UPDATE applicants SET
             first_name = ?1, last_name = ?2, gender = ?3, dob = ?4,
             guardian_name = ?5, email = ?6, phone = ?7, address = ?8,
             updated_at = ?9
           WHERE id = ?10",
          rusqlite::params![
            p.first_name,
            p.last_name,
            p.gender,
            p.dob,
            p.guardian_name,
            p.email,
            p.phone,
            p.address,
            at_str,
            id,
          ],
        )?;
        if changed == 0 {
          return Ok(None);
        }
        let raw = tx.query_row(
          &format!("SELECT {APPLICANT_COLUMNS} FROM applicants WHERE id = ?1"),
          rusqlite::params![id],
          RawApplicant::from_row,
        )?;
        tx.commit()?;
        Ok(Some(raw))
      })
      .await?;

    raw
      .ok_or(admissions_core::Error::ApplicantNotFound(id))?
      .into_applicant()
  }

  async fn delete_applicant(&self, id: i64) -> Result<()> {
    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute("DELETE FROM applicants WHERE id = ?1", rusqlite::params![id])?)
      })
      .await?;

    if changed == 0 {
      return Err(admissions_core::Error::ApplicantNotFound(id).into());
    }
    tracing::debug!(applicant_id = id, "applicant deleted with its application");
    Ok(())
  }

  // ── Applications ──────────────────────────────────────────────────────────

  async fn list_applications(&self, filter: &ApplicationFilter) -> Result<Vec<Application>> {
    let status = filter.status.map(encode_status);
    let grade = filter.apply_grade.clone();

    let raws: Vec<RawApplication> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {APPLICATION_COLUMNS} FROM applications
           WHERE (?1 IS NULL OR status = ?1)
             AND (?2 IS NULL OR apply_grade = ?2)
           ORDER BY id ASC"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![status, grade], RawApplication::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawApplication::into_application).collect()
  }

  async fn get_application(&self, id: i64) -> Result<Option<Application>> {
    let raw: Option<RawApplication> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {APPLICATION_COLUMNS} FROM applications WHERE id = ?1"),
              rusqlite::params![id],
              RawApplication::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawApplication::into_application).transpose()
  }

  async fn create_application(&self, draft: ApplicationDraft) -> Result<Application> {
    draft.check()?;

    let now = Utc::now();
    let p = ApplicationParams::encode(&draft)?;
    let at_str = encode_dt(now);
    let applicant_id = draft.applicant_id;

    let id: i64 = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO applications (
             applicant_id, apply_grade, extra_curriculars,
             photo, birth_certificate, health_record,
             status, submitted_at, updated_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)",
          rusqlite::params![
            p.applicant_id,
            p.apply_grade,
            p.extra_curriculars,
            p.photo,
            p.birth_certificate,
            p.health_record,
            p.status,
            at_str,
          ],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await
      .map_err(|e| application_write_error(e, applicant_id))?;

    tracing::debug!(application_id = id, applicant_id, "application created");

    Ok(Application {
      id,
      applicant_id,
      apply_grade: draft.apply_grade,
      extra_curriculars: draft.extra_curriculars,
      photo: draft.photo,
      birth_certificate: draft.birth_certificate,
      health_record: draft.health_record,
      status: draft.status,
      submitted_at: now,
      updated_at: now,
    })
  }

  async fn update_application(&self, id: i64, draft: ApplicationDraft) -> Result<Application> {
    draft.check()?;

    let p = ApplicationParams::encode(&draft)?;
    let at_str = encode_dt(Utc::now());
    let applicant_id = draft.applicant_id;

    let raw: Option<RawApplication> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let changed = tx.execute(
          "UPDATE applications SET
             applicant_id = ?1, apply_grade = ?2, extra_curriculars = ?3,
             photo = ?4, birth_certificate = ?5, health_record = ?6,
             status = ?7, updated_at = ?8
           WHERE id = ?9",
          rusqlite::params![
            p.applicant_id,
            p.apply_grade,
            p.extra_curriculars,
            p.photo,
            p.birth_certificate,
            p.health_record,
            p.status,
            at_str,
            id,
          ],
        )?;
        if changed == 0 {
          return Ok(None);
        }
        let raw = tx.query_row(
          &format!("SELECT {APPLICATION_COLUMNS} FROM applications WHERE id = ?1"),
          rusqlite::params![id],
          RawApplication::from_row,
        )?;
        tx.commit()?;
        Ok(Some(raw))
      })
      .await
      .map_err(|e| application_write_error(e, applicant_id))?;

    raw
      .ok_or(admissions_core::Error::ApplicationNotFound(id))?
      .into_application()
  }

  async fn delete_application(&self, id: i64) -> Result<()> {
    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute("DELETE FROM applications WHERE id = ?1", rusqlite::params![id])?)
      })
      .await?;

    if changed == 0 {
      return Err(admissions_core::Error::ApplicationNotFound(id).into());
    }
    Ok(())
  }

  async fn status_summary(&self) -> Result<StatusSummary> {
    let rows: Vec<(String, i64)> = self
      .conn
      .call(|conn| {
        let mut stmt =
          conn.prepare("SELECT status, COUNT(*) FROM applications GROUP BY status")?;
        let rows = stmt
          .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    let mut summary = StatusSummary::default();
    for (status, count) in rows {
      summary.record(decode_status(&status)?, count.max(0) as u64);
    }
    Ok(summary)
  }
}

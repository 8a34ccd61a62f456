//! Router tests driving the API over an in-memory store.

use std::{path::PathBuf, sync::Arc};

use admissions_store_sqlite::SqliteStore;
use axum::{
  Router,
  body::{Body, to_bytes},
  http::{Method, Request, StatusCode, header},
};
use serde_json::{Value, json};
use tower::ServiceExt;
use uuid::Uuid;

use crate::{MediaStore, api_router};

struct Harness {
  router: Router,
  media:  PathBuf,
}

impl Drop for Harness {
  fn drop(&mut self) { std::fs::remove_dir_all(&self.media).ok(); }
}

async fn harness() -> Harness {
  let store = SqliteStore::open_in_memory().await.unwrap();
  let media = std::env::temp_dir().join(format!("admissions-api-{}", Uuid::new_v4()));
  let router = api_router(Arc::new(store), Arc::new(MediaStore::new(&media, "/media/")));
  Harness { router, media }
}

impl Harness {
  async fn send(&self, req: Request<Body>) -> (StatusCode, Value) {
    let resp = self.router.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
    (status, body)
  }

  async fn json(&self, method: Method, uri: &str, body: Value) -> (StatusCode, Value) {
    let req = Request::builder()
      .method(method)
      .uri(uri)
      .header(header::CONTENT_TYPE, "application/json")
      .body(Body::from(body.to_string()))
      .unwrap();
    self.send(req).await
  }

  async fn get(&self, uri: &str) -> (StatusCode, Value) {
    self.send(Request::builder().uri(uri).body(Body::empty()).unwrap()).await
  }

  async fn delete(&self, uri: &str) -> (StatusCode, Value) {
    let req = Request::builder().method(Method::DELETE).uri(uri).body(Body::empty()).unwrap();
    self.send(req).await
  }

  /// Number of files stored under one attachment directory.
  fn stored_files(&self, directory: &str) -> usize {
    std::fs::read_dir(self.media.join(directory)).map(|dir| dir.count()).unwrap_or(0)
  }

  async fn create_applicant(&self, first_name: &str) -> i64 {
    let (status, body) = self.json(Method::POST, "/applicants", applicant_body(first_name)).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["id"].as_i64().unwrap()
  }

  async fn create_application(&self, applicant: i64) -> i64 {
    let (status, body) = self
      .json(
        Method::POST,
        "/applications",
        json!({ "applicant": applicant, "apply_grade": "Grade 4" }),
      )
      .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["id"].as_i64().unwrap()
  }
}

fn applicant_body(first_name: &str) -> Value {
  json!({
    "first_name": first_name,
    "last_name": "Okafor",
    "gender": "female",
    "dob": "2014-09-02",
    "guardian_name": "Chidi Okafor",
    "email": "chidi@example.com",
    "phone": "08030000000",
    "address": "12 Marina Street, Lagos",
  })
}

const BOUNDARY: &str = "admissions-boundary";

fn multipart(parts: &[(&str, Option<&str>, &[u8])]) -> Request<Body> {
  multipart_to(Method::POST, "/applications", parts)
}

fn multipart_to(method: Method, uri: &str, parts: &[(&str, Option<&str>, &[u8])]) -> Request<Body> {
  let mut body = Vec::new();
  for (name, file_name, data) in parts {
    body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
    match file_name {
      Some(file_name) => body.extend_from_slice(
        format!(
          "Content-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\n\
           Content-Type: application/octet-stream\r\n\r\n"
        )
        .as_bytes(),
      ),
      None => body.extend_from_slice(
        format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
      ),
    }
    body.extend_from_slice(data);
    body.extend_from_slice(b"\r\n");
  }
  body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

  Request::builder()
    .method(method)
    .uri(uri)
    .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={BOUNDARY}"))
    .body(Body::from(body))
    .unwrap()
}

// ─── Applicants ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn applicant_create_then_get() {
  let h = harness().await;
  let (status, created) = h.json(Method::POST, "/applicants", applicant_body("Ngozi")).await;
  assert_eq!(status, StatusCode::CREATED);
  assert_eq!(created["first_name"], "Ngozi");
  assert_eq!(created["dob"], "2014-09-02");
  assert!(created["created_at"].is_string());

  let id = created["id"].as_i64().unwrap();
  let (status, fetched) = h.get(&format!("/applicants/{id}")).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(fetched, created);
}

#[tokio::test]
async fn applicant_validation_reports_each_field() {
  let h = harness().await;
  let mut body = applicant_body(&"n".repeat(31));
  body["email"] = json!("chidi.example.com");
  body["phone"] = json!("   ");

  let (status, err) = h.json(Method::POST, "/applicants", body).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(err["error"], "validation failed");
  assert_eq!(err["fields"]["email"][0], "Enter a valid email address.");
  assert_eq!(err["fields"]["phone"][0], "This field may not be blank.");
  assert_eq!(
    err["fields"]["first_name"][0],
    "Ensure this field has no more than 30 characters."
  );

  let (_, list) = h.get("/applicants").await;
  assert_eq!(list, json!([]));
}

#[tokio::test]
async fn unparseable_path_and_query_are_json_errors() {
  let h = harness().await;

  let (status, err) = h.get("/applicants/abc").await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(err["error"], "validation failed");
  assert!(err["fields"]["non_field_errors"].is_array());

  let (status, err) = h.get("/applications?status=waitlisted").await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert!(err["fields"]["non_field_errors"].is_array());
}

#[tokio::test]
async fn malformed_json_is_a_bad_request() {
  let h = harness().await;
  let req = Request::builder()
    .method(Method::POST)
    .uri("/applicants")
    .header(header::CONTENT_TYPE, "application/json")
    .body(Body::from("{ not json"))
    .unwrap();
  let (status, err) = h.send(req).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert!(err["fields"]["non_field_errors"].is_array());
}

#[tokio::test]
async fn applicant_missing_is_404() {
  let h = harness().await;
  assert_eq!(h.get("/applicants/99").await.0, StatusCode::NOT_FOUND);
  assert_eq!(h.delete("/applicants/99").await.0, StatusCode::NOT_FOUND);
  let (status, _) = h.json(Method::PATCH, "/applicants/99", json!({ "phone": "1" })).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn applicant_patch_changes_only_supplied_fields() {
  let h = harness().await;
  let id = h.create_applicant("Ngozi").await;

  let (status, patched) = h
    .json(Method::PATCH, &format!("/applicants/{id}"), json!({ "phone": "08099999999" }))
    .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(patched["phone"], "08099999999");
  assert_eq!(patched["first_name"], "Ngozi");
}

#[tokio::test]
async fn applicant_put_requires_every_required_field() {
  let h = harness().await;
  let id = h.create_applicant("Ngozi").await;

  let (status, err) = h
    .json(Method::PUT, &format!("/applicants/{id}"), json!({ "phone": "08099999999" }))
    .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(err["fields"]["first_name"][0], "This field is required.");

  let mut body = applicant_body("Amaka");
  body["dob"] = Value::Null;
  let (status, replaced) = h.json(Method::PUT, &format!("/applicants/{id}"), body).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(replaced["first_name"], "Amaka");
  assert_eq!(replaced["dob"], Value::Null);
}

#[tokio::test]
async fn applicants_list_in_creation_order_and_search() {
  let h = harness().await;
  let a = h.create_applicant("Ngozi").await;
  let b = h.create_applicant("Tunde").await;
  let c = h.create_applicant("Amaka").await;

  let (_, list) = h.get("/applicants").await;
  let ids: Vec<i64> = list.as_array().unwrap().iter().map(|v| v["id"].as_i64().unwrap()).collect();
  assert_eq!(ids, vec![a, b, c]);

  let (_, found) = h.get("/applicants?search=tun").await;
  assert_eq!(found.as_array().unwrap().len(), 1);
  assert_eq!(found[0]["first_name"], "Tunde");
}

#[tokio::test]
async fn deleting_applicant_removes_its_application() {
  let h = harness().await;
  let applicant = h.create_applicant("Ngozi").await;
  let application = h.create_application(applicant).await;

  let (status, body) = h.delete(&format!("/applicants/{applicant}")).await;
  assert_eq!(status, StatusCode::NO_CONTENT);
  assert_eq!(body, Value::Null);

  assert_eq!(h.get(&format!("/applications/{application}")).await.0, StatusCode::NOT_FOUND);
}

// ─── Applications ────────────────────────────────────────────────────────────

#[tokio::test]
async fn application_defaults_to_pending() {
  let h = harness().await;
  let applicant = h.create_applicant("Ngozi").await;
  let id = h.create_application(applicant).await;

  let (status, app) = h.get(&format!("/applications/{id}")).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(app["applicant"], applicant);
  assert_eq!(app["status"], "pending");
  assert_eq!(app["extra_curriculars"], Value::Null);
  assert_eq!(app["photo"], Value::Null);
}

#[tokio::test]
async fn second_application_for_applicant_conflicts() {
  let h = harness().await;
  let applicant = h.create_applicant("Ngozi").await;
  h.create_application(applicant).await;

  let (status, _) = h
    .json(
      Method::POST,
      "/applications",
      json!({ "applicant": applicant, "apply_grade": "Grade 5" }),
    )
    .await;
  assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn application_for_unknown_applicant_is_rejected() {
  let h = harness().await;
  let (status, err) = h
    .json(Method::POST, "/applications", json!({ "applicant": 77, "apply_grade": "Grade 1" }))
    .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert!(err["fields"]["applicant"].is_array());
}

#[tokio::test]
async fn extra_curriculars_string_is_coerced_to_list() {
  let h = harness().await;
  let applicant = h.create_applicant("Ngozi").await;

  let (status, app) = h
    .json(
      Method::POST,
      "/applications",
      json!({
        "applicant": applicant,
        "apply_grade": "Grade 4",
        "extra_curriculars": "[\"chess\",\"debate\"]",
      }),
    )
    .await;
  assert_eq!(status, StatusCode::CREATED);
  assert_eq!(app["extra_curriculars"], json!(["chess", "debate"]));
}

#[tokio::test]
async fn extra_curriculars_list_is_stored_unchanged() {
  let h = harness().await;
  let applicant = h.create_applicant("Ngozi").await;

  let (status, app) = h
    .json(
      Method::POST,
      "/applications",
      json!({
        "applicant": applicant,
        "apply_grade": "Grade 4",
        "extra_curriculars": ["robotics"],
      }),
    )
    .await;
  assert_eq!(status, StatusCode::CREATED);
  assert_eq!(app["extra_curriculars"], json!(["robotics"]));

  let id = app["id"].as_i64().unwrap();
  let (_, fetched) = h.get(&format!("/applications/{id}")).await;
  assert_eq!(fetched["extra_curriculars"], json!(["robotics"]));
}

#[tokio::test]
async fn extra_curriculars_invalid_json_is_rejected() {
  let h = harness().await;
  let applicant = h.create_applicant("Ngozi").await;

  for bad in [json!("not json"), json!("{\"a\": 1}"), json!(7)] {
    let (status, err) = h
      .json(
        Method::POST,
        "/applications",
        json!({ "applicant": applicant, "apply_grade": "Grade 4", "extra_curriculars": bad }),
      )
      .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(err["fields"]["extra_curriculars"][0], "extra_curriculars must be JSON array");
  }
  assert_eq!(h.get("/applications").await.1, json!([]));
}

#[tokio::test]
async fn multipart_upload_is_stored_and_linked() {
  let h = harness().await;
  let applicant = h.create_applicant("Ngozi").await;
  let applicant_id = applicant.to_string();

  let req = multipart(&[
    ("applicant", None, applicant_id.as_bytes()),
    ("apply_grade", None, &b"Grade 4"[..]),
    ("extra_curriculars", None, &br#"["football"]"#[..]),
    ("photo", Some("portrait.PNG"), &b"not-really-a-png"[..]),
  ]);
  let (status, app) = h.send(req).await;
  assert_eq!(status, StatusCode::CREATED, "{app}");
  assert_eq!(app["extra_curriculars"], json!(["football"]));

  let url = app["photo"].as_str().unwrap();
  assert!(url.starts_with("/media/photos/"));
  assert!(url.ends_with(".png"));

  let relative = url.trim_start_matches("/media/");
  let stored = tokio::fs::read(h.media.join(relative)).await.unwrap();
  assert_eq!(stored, b"not-really-a-png");
}

#[tokio::test]
async fn rejected_multipart_leaves_no_upload_behind() {
  let h = harness().await;
  let applicant = h.create_applicant("Ngozi").await;
  let applicant_id = applicant.to_string();

  let req = multipart(&[
    ("applicant", None, applicant_id.as_bytes()),
    ("apply_grade", None, &b"Grade 4"[..]),
    ("extra_curriculars", None, &b"not json"[..]),
    ("photo", Some("portrait.png"), &b"first-photo"[..]),
  ]);
  let (status, err) = h.send(req).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(err["fields"]["extra_curriculars"][0], "extra_curriculars must be JSON array");
  assert_eq!(h.stored_files("photos"), 0);

  let (status, _) = h
    .send(multipart_to(Method::PATCH, "/applications/404", &[(
      "photo",
      Some("portrait.png"),
      &b"second-photo"[..],
    )]))
    .await;
  assert_eq!(status, StatusCode::NOT_FOUND);
  assert_eq!(h.stored_files("photos"), 0);
}

#[tokio::test]
async fn conflicting_multipart_removes_only_its_own_upload() {
  let h = harness().await;
  let applicant = h.create_applicant("Ngozi").await;
  let applicant_id = applicant.to_string();

  let first = multipart(&[
    ("applicant", None, applicant_id.as_bytes()),
    ("apply_grade", None, &b"Grade 4"[..]),
    ("photo", Some("portrait.png"), &b"shared-photo"[..]),
  ]);
  let (status, app) = h.send(first).await;
  assert_eq!(status, StatusCode::CREATED, "{app}");
  assert_eq!(h.stored_files("photos"), 1);

  // Same bytes as the stored photo: the existing file must survive the conflict.
  let shared = multipart(&[
    ("applicant", None, applicant_id.as_bytes()),
    ("apply_grade", None, &b"Grade 5"[..]),
    ("photo", Some("portrait.png"), &b"shared-photo"[..]),
  ]);
  assert_eq!(h.send(shared).await.0, StatusCode::CONFLICT);

  let fresh = multipart(&[
    ("applicant", None, applicant_id.as_bytes()),
    ("apply_grade", None, &b"Grade 5"[..]),
    ("photo", Some("other.png"), &b"fresh-photo"[..]),
  ]);
  assert_eq!(h.send(fresh).await.0, StatusCode::CONFLICT);

  assert_eq!(h.stored_files("photos"), 1);
  let url = app["photo"].as_str().unwrap();
  assert!(h.media.join(url.trim_start_matches("/media/")).exists());
}

#[tokio::test]
async fn status_can_move_in_any_direction() {
  let h = harness().await;
  let applicant = h.create_applicant("Ngozi").await;
  let id = h.create_application(applicant).await;
  let uri = format!("/applications/{id}");

  for status in ["approved", "rejected", "pending", "approved"] {
    let (code, app) = h.json(Method::PATCH, &uri, json!({ "status": status })).await;
    assert_eq!(code, StatusCode::OK);
    assert_eq!(app["status"], status);
    assert_eq!(app["apply_grade"], "Grade 4");
  }

  let (code, err) = h.json(Method::PATCH, &uri, json!({ "status": "waitlisted" })).await;
  assert_eq!(code, StatusCode::BAD_REQUEST);
  assert!(err["fields"]["status"].is_array());
}

#[tokio::test]
async fn application_filters_and_summary() {
  let h = harness().await;
  let a = h.create_applicant("Ngozi").await;
  let b = h.create_applicant("Tunde").await;
  let first = h.create_application(a).await;
  h.create_application(b).await;
  h.json(Method::PATCH, &format!("/applications/{first}"), json!({ "status": "approved" }))
    .await;

  let (_, approved) = h.get("/applications?status=approved").await;
  assert_eq!(approved.as_array().unwrap().len(), 1);
  assert_eq!(approved[0]["id"], first);

  let (status, summary) = h.get("/applications/summary").await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(summary, json!({ "total": 2, "pending": 1, "approved": 1, "rejected": 0 }));
}

#[tokio::test]
async fn application_delete_keeps_applicant() {
  let h = harness().await;
  let applicant = h.create_applicant("Ngozi").await;
  let id = h.create_application(applicant).await;

  assert_eq!(h.delete(&format!("/applications/{id}")).await.0, StatusCode::NO_CONTENT);
  assert_eq!(h.get(&format!("/applicants/{applicant}")).await.0, StatusCode::OK);
  // The applicant is free to apply again.
  h.create_application(applicant).await;
}

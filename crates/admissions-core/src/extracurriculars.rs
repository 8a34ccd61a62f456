//! Coercion rule for the `extra_curriculars` attribute.
//!
//! Callers may send either a structured JSON array or a string holding a
//! JSON-encoded array (multipart and form bodies can only carry strings).
//! Whatever arrives is resolved to a list before it reaches the store.

use serde::Deserialize;
use serde_json::Value;

use crate::{Error, Result};

pub const FIELD: &str = "extra_curriculars";
pub const NOT_AN_ARRAY: &str = "extra_curriculars must be JSON array";

/// The two accepted shapes of an incoming `extra_curriculars` value.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ExtraCurricularsInput {
  /// A string to be parsed as JSON, e.g. `"[\"chess\",\"debate\"]"`.
  RawString(String),
  /// An already-structured value.
  Structured(Value),
}

impl ExtraCurricularsInput {
  /// Resolve to the stored list form.
  ///
  /// Raw strings that fail to parse, and any value that is not an array after
  /// parsing, are rejected. Array elements are not inspected.
  pub fn resolve(self) -> Result<Vec<Value>> {
    let value = match self {
      Self::RawString(raw) => {
        serde_json::from_str::<Value>(&raw).map_err(|_| Error::invalid(FIELD, NOT_AN_ARRAY))?
      }
      Self::Structured(value) => value,
    };

    match value {
      Value::Array(items) => Ok(items),
      _ => Err(Error::invalid(FIELD, NOT_AN_ARRAY)),
    }
  }
}

impl From<&str> for ExtraCurricularsInput {
  fn from(raw: &str) -> Self { Self::RawString(raw.to_owned()) }
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  fn message(err: Error) -> String {
    match err {
      Error::Validation(errors) => errors.messages(FIELD).join(""),
      other => panic!("unexpected error {other:?}"),
    }
  }

  #[test]
  fn json_string_is_parsed_into_a_list() {
    let input = ExtraCurricularsInput::from(r#"["chess","debate"]"#);
    assert_eq!(input.resolve().unwrap(), vec![json!("chess"), json!("debate")]);
  }

  #[test]
  fn structured_list_passes_through() {
    let input = ExtraCurricularsInput::Structured(json!(["robotics"]));
    assert_eq!(input.resolve().unwrap(), vec![json!("robotics")]);
  }

  #[test]
  fn elements_are_not_shape_checked() {
    let input = ExtraCurricularsInput::Structured(json!([{"club": "chess", "years": 2}, 3]));
    assert_eq!(input.resolve().unwrap().len(), 2);
  }

  #[test]
  fn unparseable_string_is_rejected() {
    let err = ExtraCurricularsInput::from("not json").resolve().unwrap_err();
    assert_eq!(message(err), NOT_AN_ARRAY);
  }

  #[test]
  fn parsed_non_list_is_rejected() {
    let err = ExtraCurricularsInput::from(r#"{"club":"chess"}"#).resolve().unwrap_err();
    assert_eq!(message(err), NOT_AN_ARRAY);

    let err = ExtraCurricularsInput::from("42").resolve().unwrap_err();
    assert_eq!(message(err), NOT_AN_ARRAY);
  }

  #[test]
  fn structured_non_list_is_rejected() {
    let err = ExtraCurricularsInput::Structured(json!({"club": "chess"})).resolve().unwrap_err();
    assert_eq!(message(err), NOT_AN_ARRAY);
  }

  #[test]
  fn deserialises_strings_as_raw() {
    let raw: ExtraCurricularsInput = serde_json::from_value(json!("[\"a\"]")).unwrap();
    assert_eq!(raw, ExtraCurricularsInput::RawString("[\"a\"]".into()));

    let structured: ExtraCurricularsInput = serde_json::from_value(json!(["a"])).unwrap();
    assert_eq!(structured, ExtraCurricularsInput::Structured(json!(["a"])));
  }
}

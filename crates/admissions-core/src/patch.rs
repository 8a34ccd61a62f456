//! Helpers for write payloads that distinguish "absent" from "null".
//!
//! Nullable attributes use `Option<Option<T>>`: `None` leaves the stored value
//! alone, `Some(None)` clears it, `Some(Some(v))` replaces it.

use serde::{Deserialize, Deserializer};

/// Use with `#[serde(default, deserialize_with = "double_option")]`.
pub fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
  T: Deserialize<'de>,
  D: Deserializer<'de>,
{
  Option::<T>::deserialize(deserializer).map(Some)
}

/// Whether a write replaces the whole record or only the supplied fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
  /// Every required attribute must be supplied (create and `PUT`).
  Full,
  /// Only supplied attributes change (`PATCH`).
  Partial,
}

pub(crate) const REQUIRED: &str = "This field is required.";
pub(crate) const BLANK: &str = "This field may not be blank.";

/// Resolve one required text attribute against an optional stored value.
///
/// Incoming text is trimmed. A missing value falls back to `current` unless
/// the write is [`WriteMode::Full`], in which case it is reported as required.
pub(crate) fn required_text(
  errors: &mut crate::FieldErrors,
  field: &str,
  incoming: Option<String>,
  current: Option<&str>,
  mode: WriteMode,
) -> String {
  match (incoming, current, mode) {
    (Some(value), _, _) => value.trim().to_owned(),
    (None, Some(current), WriteMode::Partial) => current.to_owned(),
    (None, _, _) => {
      errors.add(field, REQUIRED);
      String::new()
    }
  }
}

/// Record a "may not be blank" failure for every empty value.
pub(crate) fn reject_blank(errors: &mut crate::FieldErrors, fields: &[(&str, &str)]) {
  for (field, value) in fields {
    if value.is_empty() && !errors.contains(field) {
      errors.add(field, BLANK);
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[derive(Debug, Deserialize)]
  struct Body {
    #[serde(default, deserialize_with = "double_option")]
    dob: Option<Option<String>>,
  }

  #[test]
  fn absent_null_and_value_are_distinct() {
    let absent: Body = serde_json::from_str("{}").unwrap();
    let null: Body = serde_json::from_str(r#"{"dob":null}"#).unwrap();
    let value: Body = serde_json::from_str(r#"{"dob":"2015-04-01"}"#).unwrap();
    assert_eq!(absent.dob, None);
    assert_eq!(null.dob, Some(None));
    assert_eq!(value.dob, Some(Some("2015-04-01".to_owned())));
  }

  #[test]
  fn partial_write_falls_back_to_current() {
    let mut errors = crate::FieldErrors::default();
    let v = required_text(&mut errors, "phone", None, Some("555"), WriteMode::Partial);
    assert_eq!(v, "555");
    let v = required_text(&mut errors, "phone", None, Some("555"), WriteMode::Full);
    assert_eq!(v, "");
    assert_eq!(errors.messages("phone"), [REQUIRED]);
  }
}

use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

use crate::datatype::Datatype;
use crate::value::{Value, ValueError};

/// Errors returned when a raw value does not fit a Property's datatype.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ValidationError {
    #[error("expected a string, got: {0}")]
    NotAString(String),

    #[error(
        "{0:?} is not a valid slug; use only lowercase letters and numbers, \
         separated by single dashes"
    )]
    InvalidSlug(String),

    #[error("{0:?} is not a valid absolute URL")]
    InvalidUrl(String),

    #[error("expected an array, got: {0}")]
    NotAnArray(String),

    #[error("array element at index {index} is not a valid URL: {value}")]
    InvalidArrayElement { index: usize, value: String },

    #[error("expected an integer, got: {0}")]
    NotAnInteger(String),

    #[error(transparent)]
    Value(#[from] ValueError),
}

impl ValidationError {
    /// Position of the offending element for array faults, so callers can
    /// point at a single field without re-scanning.
    pub fn index(&self) -> Option<usize> {
        match self {
            ValidationError::InvalidArrayElement { index, .. } => Some(*index),
            ValidationError::Value(ValueError::NonStringArrayElement(index)) => Some(*index),
            _ => None,
        }
    }
}

/// Check `value` against `datatype` and wrap it in a [`Value`].
///
/// Only the datatypes with a defined shape are checked; the rest are
/// advisory and pass through. `null` is never a valid value.
pub fn validate(value: serde_json::Value, datatype: &Datatype) -> Result<Value, ValidationError> {
    match datatype {
        Datatype::String => {
            require_str(&value)?;
        }
        Datatype::Slug => {
            let s = require_str(&value)?;
            if !SLUG_RE.is_match(s) {
                return Err(ValidationError::InvalidSlug(s.to_string()));
            }
        }
        Datatype::AtomicUrl => {
            let s = require_str(&value)?;
            validate_url(s)?;
        }
        Datatype::ResourceArray => {
            let items = value
                .as_array()
                .ok_or_else(|| ValidationError::NotAnArray(value.to_string()))?;
            for (index, item) in items.iter().enumerate() {
                match item.as_str() {
                    Some(s) if is_valid_url(s) => {}
                    _ => {
                        return Err(ValidationError::InvalidArrayElement {
                            index,
                            value: item.to_string(),
                        })
                    }
                }
            }
        }
        Datatype::Integer => {
            let whole = match &value {
                serde_json::Value::Number(n) => {
                    n.is_i64() || n.is_u64() || n.as_f64().is_some_and(|f| f % 1.0 == 0.0)
                }
                _ => false,
            };
            if !whole {
                return Err(ValidationError::NotAnInteger(value.to_string()));
            }
        }
        Datatype::Boolean
        | Datatype::Date
        | Datatype::Float
        | Datatype::Markdown
        | Datatype::Timestamp
        | Datatype::Unknown(_) => {}
    }
    Ok(Value::try_from(value)?)
}

/// Require `s` to parse as an absolute URL.
pub fn validate_url(s: &str) -> Result<(), ValidationError> {
    url::Url::parse(s)
        .map(|_| ())
        .map_err(|_| ValidationError::InvalidUrl(s.to_string()))
}

pub fn is_valid_url(s: &str) -> bool {
    validate_url(s).is_ok()
}

// --- helpers -----------------------------------------------------------------

fn require_str(value: &serde_json::Value) -> Result<&str, ValidationError> {
    value
        .as_str()
        .ok_or_else(|| ValidationError::NotAString(value.to_string()))
}

/// `^[a-z0-9]+(-[a-z0-9]+)*$`
static SLUG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9]+(-[a-z0-9]+)*$").expect("invalid slug regex"));

// --- tests -------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn string_accepts_only_strings() {
        assert_eq!(
            validate(json!("hello"), &Datatype::String),
            Ok(Value::from("hello"))
        );
        assert!(matches!(
            validate(json!(5), &Datatype::String),
            Err(ValidationError::NotAString(_))
        ));
    }

    #[test]
    fn valid_slug() {
        assert!(validate(json!("valid-slug-123"), &Datatype::Slug).is_ok());
        assert!(validate(json!("a"), &Datatype::Slug).is_ok());
    }

    #[test]
    fn invalid_slugs_rejected() {
        for bad in ["Not-Valid!", "UPPER", "double--dash", "-leading", "trailing-", ""] {
            assert!(
                matches!(validate(json!(bad), &Datatype::Slug), Err(ValidationError::InvalidSlug(_))),
                "{bad:?} should not be a slug"
            );
        }
    }

    #[test]
    fn atomic_url_must_be_absolute() {
        assert!(validate(json!("https://atomicdata.dev/properties/name"), &Datatype::AtomicUrl).is_ok());
        assert!(matches!(
            validate(json!("/relative/path"), &Datatype::AtomicUrl),
            Err(ValidationError::InvalidUrl(_))
        ));
    }

    #[test]
    fn resource_array_reports_index_of_first_bad_element() {
        let err = validate(
            json!(["https://example.com/a", "not a url", "also bad"]),
            &Datatype::ResourceArray,
        )
        .unwrap_err();
        assert_eq!(err.index(), Some(1));
    }

    #[test]
    fn resource_array_requires_array() {
        let err = validate(json!("https://example.com/a"), &Datatype::ResourceArray).unwrap_err();
        assert!(matches!(err, ValidationError::NotAnArray(_)));
        assert_eq!(err.index(), None);
    }

    #[test]
    fn integer_requires_whole_number() {
        assert!(validate(json!(42), &Datatype::Integer).is_ok());
        assert!(validate(json!(-3), &Datatype::Integer).is_ok());
        assert!(validate(json!(4.0), &Datatype::Integer).is_ok());
        assert!(matches!(
            validate(json!(4.5), &Datatype::Integer),
            Err(ValidationError::NotAnInteger(_))
        ));
        assert!(validate(json!("42"), &Datatype::Integer).is_err());
    }

    #[test]
    fn advisory_datatypes_pass_through() {
        assert!(validate(json!("anything"), &Datatype::Boolean).is_ok());
        assert!(validate(json!(1.5), &Datatype::Unknown("https://x.example/dt".into())).is_ok());
    }

    #[test]
    fn null_is_never_valid() {
        assert_eq!(
            validate(json!(null), &Datatype::Markdown),
            Err(ValidationError::Value(ValueError::Null))
        );
    }

    #[test]
    fn validated_values_have_serializable_native_form() {
        let cases = [
            (json!("some-slug"), Datatype::Slug),
            (json!("https://example.com"), Datatype::AtomicUrl),
            (json!(["https://example.com/x"]), Datatype::ResourceArray),
            (json!(12), Datatype::Integer),
            (json!(1_700_000_000_000_i64), Datatype::Timestamp),
            (json!("# title"), Datatype::Markdown),
        ];
        for (raw, dt) in cases {
            let native = validate(raw, &dt).unwrap().to_native(&dt).unwrap();
            let once = serde_json::to_string(&native).unwrap();
            let reparsed: serde_json::Value = serde_json::from_str(&once).unwrap();
            assert_eq!(serde_json::to_string(&reparsed).unwrap(), once);
        }
    }
}

//! JSON-AD parsing into a [`Resource`].
//!
//! A JSON-AD document is an object whose `@id` is the subject and whose other
//! keys are property URLs. Values are taken as the server sent them: parsing
//! trusts the server and does not validate datatypes.

use atomicdata::Value;

use crate::error::ClientError;
use crate::resource::Resource;

const ID_KEY: &str = "@id";

/// Fill `resource` from a JSON-AD document.
///
/// On success the resource becomes `Ready`. On failure it becomes `Error`,
/// carrying the same error that is returned so the caller can report it.
pub fn parse_json_ad_resource(text: &str, resource: &mut Resource) -> Result<(), ClientError> {
    match fill(text, resource) {
        Ok(()) => {
            resource.set_ready();
            Ok(())
        }
        Err(e) => {
            resource.set_error(e.clone());
            Err(e)
        }
    }
}

fn fill(text: &str, resource: &mut Resource) -> Result<(), ClientError> {
    let parse_error = |resource: &Resource, message: String| ClientError::Parse {
        subject: resource.subject().to_string(),
        message,
    };

    let json: serde_json::Value =
        serde_json::from_str(text).map_err(|e| parse_error(resource, e.to_string()))?;
    let serde_json::Value::Object(map) = json else {
        return Err(parse_error(resource, "expected a JSON object".into()));
    };

    // `@id` first, so per-property errors name the right subject.
    if let Some(id) = map.get(ID_KEY) {
        let id = id
            .as_str()
            .ok_or_else(|| parse_error(resource, format!("@id must be a string, got {id}")))?;
        resource.set_subject(id);
    }

    for (key, raw) in map {
        if key == ID_KEY {
            continue;
        }
        let value = Value::try_from(raw).map_err(|source| ClientError::PropertyValue {
            subject: resource.subject().to_string(),
            property: key.clone(),
            source,
        })?;
        resource.set_unsafe(key, value);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::ResourceStatus;
    use atomicdata::urls::properties::{DESCRIPTION, NAME};
    use atomicdata::ValueError;

    #[test]
    fn parses_subject_and_values() {
        let mut r = Resource::new("https://x/placeholder");
        let text = format!(r#"{{"@id":"https://x/y","{DESCRIPTION}":"hi"}}"#);
        parse_json_ad_resource(&text, &mut r).unwrap();
        assert_eq!(r.subject(), "https://x/y");
        assert_eq!(r.get(DESCRIPTION).unwrap().to_string(), "hi");
        assert_eq!(r.status(), ResourceStatus::Ready);
        assert!(!r.has_unsaved_changes());
        assert_eq!(r.pending_commit().subject(), "https://x/y");
    }

    #[test]
    fn invalid_json_sets_error_status() {
        let mut r = Resource::new("https://x/y");
        let err = parse_json_ad_resource("{not json", &mut r).unwrap_err();
        assert!(matches!(err, ClientError::Parse { .. }));
        assert_eq!(r.status(), ResourceStatus::Error);
        assert_eq!(r.error(), Some(&err));
    }

    #[test]
    fn non_string_id_is_rejected() {
        let mut r = Resource::new("https://x/y");
        let err = parse_json_ad_resource(r#"{"@id": 5}"#, &mut r).unwrap_err();
        assert!(err.to_string().contains("@id must be a string"));
    }

    #[test]
    fn top_level_array_is_rejected() {
        let mut r = Resource::new("https://x/y");
        assert!(parse_json_ad_resource("[]", &mut r).is_err());
        assert_eq!(r.status(), ResourceStatus::Error);
    }

    #[test]
    fn non_string_arrays_do_not_fail_the_resource() {
        let mut r = Resource::new("https://x/y");
        let text = format!(
            r#"{{"@id":"https://x/y","https://x/props/items":[{{"{NAME}":"inner"}}],"https://x/props/nums":[1,2]}}"#
        );
        parse_json_ad_resource(&text, &mut r).unwrap();
        assert_eq!(r.status(), ResourceStatus::Ready);
        assert_eq!(
            r.get("https://x/props/items").unwrap().to_json(),
            serde_json::json!([{ (NAME): "inner" }])
        );
        assert_eq!(r.get("https://x/props/nums").unwrap().to_string(), "1,2");
    }

    #[test]
    fn failing_property_is_named_in_error() {
        let mut r = Resource::new("https://x/placeholder");
        let text = format!(r#"{{"@id":"https://x/y","{NAME}":null}}"#);
        let err = parse_json_ad_resource(&text, &mut r).unwrap_err();
        assert_eq!(
            err,
            ClientError::PropertyValue {
                subject: "https://x/y".into(),
                property: NAME.into(),
                source: ValueError::Null,
            }
        );
    }
}

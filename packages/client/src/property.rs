//! Property definitions: the schema of one predicate, read from a plain resource.

use atomicdata::urls::properties;
use atomicdata::Datatype;

use crate::error::ClientError;
use crate::resource::Resource;

/// Datatype, shortname, and description of a property URL.
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    pub subject: String,
    pub datatype: Datatype,
    pub shortname: String,
    pub description: String,
    /// For URL-valued properties, the class the target should be.
    pub class_type: Option<String>,
}

impl Property {
    /// Read the property fields from its backing resource.
    ///
    /// # Errors
    ///
    /// [`ClientError::IncompleteProperty`] when `datatype`, `shortname`, or
    /// `description` is absent. The error lists every property the resource
    /// did have, for debugging.
    pub fn from_resource(resource: &Resource) -> Result<Self, ClientError> {
        let required = |url: &str, name: &'static str| {
            resource
                .get(url)
                .map(ToString::to_string)
                .ok_or_else(|| incomplete(resource, name))
        };

        let datatype = required(properties::DATATYPE, "datatype")?;
        let shortname = required(properties::SHORTNAME, "shortname")?;
        let description = required(properties::DESCRIPTION, "description")?;

        Ok(Self {
            subject: resource.subject().to_string(),
            datatype: Datatype::from_url(&datatype),
            shortname,
            description,
            class_type: resource.get(properties::CLASSTYPE).map(ToString::to_string),
        })
    }
}

fn incomplete(resource: &Resource, missing: &'static str) -> ClientError {
    let propvals: serde_json::Map<String, serde_json::Value> = resource
        .propvals()
        .iter()
        .map(|(k, v)| (k.clone(), v.to_json()))
        .collect();
    ClientError::IncompleteProperty {
        subject: resource.subject().to_string(),
        missing,
        propvals: serde_json::Value::Object(propvals).to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use atomicdata::urls::datatypes;
    use atomicdata::Value;

    fn property_resource() -> Resource {
        let mut r = Resource::new_local("https://example.com/properties/color");
        r.set_unsafe(properties::DATATYPE, Value::from(datatypes::SLUG));
        r.set_unsafe(properties::SHORTNAME, Value::from("color"));
        r.set_unsafe(properties::DESCRIPTION, Value::from("A color name"));
        r
    }

    #[test]
    fn reads_complete_property() {
        let p = Property::from_resource(&property_resource()).unwrap();
        assert_eq!(p.datatype, Datatype::Slug);
        assert_eq!(p.shortname, "color");
        assert_eq!(p.description, "A color name");
        assert_eq!(p.class_type, None);
    }

    #[test]
    fn missing_description_names_subject_and_propvals() {
        let mut r = property_resource();
        r.remove_propval(properties::DESCRIPTION);
        let err = Property::from_resource(&r).unwrap_err();
        match &err {
            ClientError::IncompleteProperty { subject, missing, propvals } => {
                assert_eq!(subject, "https://example.com/properties/color");
                assert_eq!(*missing, "description");
                assert!(propvals.contains("color"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}

//! The closed set of Atomic Data datatypes.
//!
//! Every operation that depends on the datatype (validation, native
//! conversion, URL mapping) matches on [`Datatype`] exhaustively, so adding a
//! variant makes the compiler point at every place that needs a decision.

use crate::urls::datatypes;

/// The declared datatype of a Property.
///
/// Datatype URLs that are not recognised map to [`Datatype::Unknown`], which
/// keeps the original URL and is treated as advisory (never validated).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Datatype {
    /// An absolute URL pointing at another resource.
    AtomicUrl,
    Boolean,
    /// An ISO 8601 calendar date (`YYYY-MM-DD`).
    Date,
    Float,
    /// A whole number.
    Integer,
    Markdown,
    /// An ordered list of resource URLs.
    ResourceArray,
    /// Lowercase alphanumeric segments joined by single dashes.
    Slug,
    String,
    /// Milliseconds since the unix epoch.
    Timestamp,
    /// Any datatype this crate does not know about, carrying its URL.
    Unknown(String),
}

impl Datatype {
    /// Resolve a datatype from its canonical URL.
    ///
    /// Never fails: unrecognised URLs become [`Datatype::Unknown`].
    pub fn from_url(url: &str) -> Self {
        match url {
            datatypes::ATOMIC_URL => Datatype::AtomicUrl,
            datatypes::BOOLEAN => Datatype::Boolean,
            datatypes::DATE => Datatype::Date,
            datatypes::FLOAT => Datatype::Float,
            datatypes::INTEGER => Datatype::Integer,
            datatypes::MARKDOWN => Datatype::Markdown,
            datatypes::RESOURCE_ARRAY => Datatype::ResourceArray,
            datatypes::SLUG => Datatype::Slug,
            datatypes::STRING => Datatype::String,
            datatypes::TIMESTAMP => Datatype::Timestamp,
            other => Datatype::Unknown(other.to_string()),
        }
    }

    /// The canonical URL of this datatype.
    pub fn url(&self) -> &str {
        match self {
            Datatype::AtomicUrl => datatypes::ATOMIC_URL,
            Datatype::Boolean => datatypes::BOOLEAN,
            Datatype::Date => datatypes::DATE,
            Datatype::Float => datatypes::FLOAT,
            Datatype::Integer => datatypes::INTEGER,
            Datatype::Markdown => datatypes::MARKDOWN,
            Datatype::ResourceArray => datatypes::RESOURCE_ARRAY,
            Datatype::Slug => datatypes::SLUG,
            Datatype::String => datatypes::STRING,
            Datatype::Timestamp => datatypes::TIMESTAMP,
            Datatype::Unknown(url) => url,
        }
    }
}

/// Formats the datatype as its canonical URL.
impl std::fmt::Display for Datatype {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.url())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_urls_map_both_ways() {
        for dt in [
            Datatype::AtomicUrl,
            Datatype::Boolean,
            Datatype::Date,
            Datatype::Float,
            Datatype::Integer,
            Datatype::Markdown,
            Datatype::ResourceArray,
            Datatype::Slug,
            Datatype::String,
            Datatype::Timestamp,
        ] {
            assert_eq!(Datatype::from_url(dt.url()), dt);
        }
    }

    #[test]
    fn unknown_url_is_preserved() {
        let dt = Datatype::from_url("https://example.com/datatypes/color");
        assert_eq!(dt, Datatype::Unknown("https://example.com/datatypes/color".into()));
        assert_eq!(dt.to_string(), "https://example.com/datatypes/color");
    }
}

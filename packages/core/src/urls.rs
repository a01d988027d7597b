//! Canonical Atomic Data URLs used by the client core.
//!
//! Commit fields are serialized under these property URLs, and the
//! [`Datatype`](crate::Datatype) mapping is keyed by the datatype URLs.

/// Property URLs.
pub mod properties {
    pub const DESCRIPTION: &str = "https://atomicdata.dev/properties/description";
    pub const SHORTNAME: &str = "https://atomicdata.dev/properties/shortname";
    pub const DATATYPE: &str = "https://atomicdata.dev/properties/datatype";
    pub const CLASSTYPE: &str = "https://atomicdata.dev/properties/classtype";
    pub const IS_A: &str = "https://atomicdata.dev/properties/isA";
    pub const NAME: &str = "https://atomicdata.dev/properties/name";
    pub const PARENT: &str = "https://atomicdata.dev/properties/parent";
    pub const PUBLIC_KEY: &str = "https://atomicdata.dev/properties/publicKey";

    /// Fields of a serialized commit.
    pub mod commit {
        pub const SUBJECT: &str = "https://atomicdata.dev/properties/subject";
        pub const CREATED_AT: &str = "https://atomicdata.dev/properties/createdAt";
        pub const SET: &str = "https://atomicdata.dev/properties/set";
        pub const REMOVE: &str = "https://atomicdata.dev/properties/remove";
        pub const DESTROY: &str = "https://atomicdata.dev/properties/destroy";
        pub const SIGNER: &str = "https://atomicdata.dev/properties/signer";
        pub const SIGNATURE: &str = "https://atomicdata.dev/properties/signature";
    }
}

/// Class URLs.
pub mod classes {
    pub const COMMIT: &str = "https://atomicdata.dev/classes/Commit";
    pub const PROPERTY: &str = "https://atomicdata.dev/classes/Property";
    pub const AGENT: &str = "https://atomicdata.dev/classes/Agent";
}

/// Datatype URLs.
pub mod datatypes {
    pub const ATOMIC_URL: &str = "https://atomicdata.dev/datatypes/atomicURL";
    pub const BOOLEAN: &str = "https://atomicdata.dev/datatypes/boolean";
    pub const DATE: &str = "https://atomicdata.dev/datatypes/date";
    pub const FLOAT: &str = "https://atomicdata.dev/datatypes/float";
    pub const INTEGER: &str = "https://atomicdata.dev/datatypes/integer";
    pub const MARKDOWN: &str = "https://atomicdata.dev/datatypes/markdown";
    pub const RESOURCE_ARRAY: &str = "https://atomicdata.dev/datatypes/resourceArray";
    pub const SLUG: &str = "https://atomicdata.dev/datatypes/slug";
    pub const STRING: &str = "https://atomicdata.dev/datatypes/string";
    pub const TIMESTAMP: &str = "https://atomicdata.dev/datatypes/timestamp";
}

/// Media type of the JSON-AD wire format, used for `Accept` and `Content-Type`.
pub const JSON_AD_MEDIA_TYPE: &str = "application/ad+json";

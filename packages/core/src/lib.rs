//! Core of the Atomic Data client layer.
//!
//! This crate holds everything that does not touch the network: typed
//! property values, datatype validation, and the commit pipeline that turns a
//! diff into a signed, byte-exact payload a server can verify. The async
//! resource cache lives in `atomicdata-client`; agent identities live in
//! `atomicdata-agent`.
//!
//! # Crate layout
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`urls`] | Canonical property, class, and datatype URLs |
//! | [`datatype`] | The closed [`Datatype`] sum type |
//! | [`value`] | [`Value`] and its coercion accessors |
//! | [`validation`] | [`validate`] a raw value against a datatype |
//! | [`commit`] | [`CommitBuilder`], [`Commit`], deterministic serialization |
//! | [`signing`] | Ed25519 over base64 keys |
//!
//! # Quick start
//!
//! ```rust,ignore
//! use atomicdata::{validate, CommitBuilder, Datatype, serialize_deterministically};
//!
//! let value = validate(serde_json::json!("my-slug"), &Datatype::Slug)?;
//!
//! let mut diff = CommitBuilder::new("https://example.com/thing");
//! diff.set_value(atomicdata::urls::properties::SHORTNAME, value.to_native(&Datatype::Slug)?);
//!
//! let commit = diff.sign(&private_key, "https://example.com/agents/abc")?;
//! let body = serialize_deterministically(&commit)?;
//! ```

pub mod commit;
pub mod datatype;
pub mod signing;
pub mod urls;
pub mod validation;
pub mod value;

pub use commit::{serialize_deterministically, sign_at, verify_commit, Commit, CommitBuilder, CommitError};
pub use datatype::Datatype;
pub use signing::{public_key_from_private, sign_to_base64, verify_base64, ProofError, SigningError};
pub use validation::{is_valid_url, validate, validate_url, ValidationError};
pub use value::{Value, ValueError};

//! Commits: signed, append-only descriptions of a change to one resource.
//!
//! A [`CommitBuilder`] accumulates a diff (`set`, `remove`, `destroy`). Signing
//! consumes it and yields an immutable [`Commit`]. The signature covers the
//! deterministic serialization of every commit field except `signature`:
//!
//! 1. empty `set` / `remove` are dropped, `destroy` only appears when true;
//! 2. field names become their Atomic Data property URLs;
//! 3. `isA: [Commit]` is injected;
//! 4. the object is written as JCS (RFC 8785): sorted keys, no whitespace.
//!
//! The same bytes are the body of the `POST /commit` request, so key order is
//! part of the protocol.

use std::collections::{BTreeMap, BTreeSet};

use chrono::Utc;
use serde_json::{Map, Value as Json};
use thiserror::Error;

use crate::signing::{sign_to_base64, verify_base64, ProofError, SigningError};
use crate::urls::{classes, properties::commit as fields, properties::IS_A};

/// Errors returned by [`Commit::from_json_ad`].
#[derive(Debug, Clone, Error, PartialEq)]
pub enum CommitError {
    #[error("commit is not valid JSON: {0}")]
    InvalidJson(String),
    #[error("commit must be a JSON object")]
    NotAnObject,
    #[error("commit is missing required field {0}")]
    MissingField(&'static str),
    #[error("commit field {field} has the wrong shape: {reason}")]
    InvalidField { field: &'static str, reason: String },
}

/// Accumulates the pending diff for one subject.
///
/// `set` and `remove` are kept ordered so that two builders holding the same
/// changes serialize identically, whatever order they were recorded in.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CommitBuilder {
    subject: String,
    set: BTreeMap<String, Json>,
    remove: BTreeSet<String>,
    destroy: bool,
}

impl CommitBuilder {
    pub fn new(subject: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            ..Self::default()
        }
    }

    /// A builder that deletes the whole resource.
    pub fn destroying(subject: impl Into<String>) -> Self {
        Self {
            destroy: true,
            ..Self::new(subject)
        }
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn set(&self) -> &BTreeMap<String, Json> {
        &self.set
    }

    pub fn remove(&self) -> &BTreeSet<String> {
        &self.remove
    }

    pub fn destroy(&self) -> bool {
        self.destroy
    }

    /// Record a new native value for `property`, cancelling an earlier removal.
    pub fn set_value(&mut self, property: impl Into<String>, native: Json) {
        let property = property.into();
        self.remove.remove(&property);
        self.set.insert(property, native);
    }

    /// Record the removal of `property`, cancelling an earlier set.
    pub fn remove_property(&mut self, property: impl Into<String>) {
        let property = property.into();
        self.set.remove(&property);
        self.remove.insert(property);
    }

    /// True when signing this builder would describe no change.
    pub fn is_empty(&self) -> bool {
        self.set.is_empty() && self.remove.is_empty() && !self.destroy
    }

    /// Sign with the current time as `createdAt`.
    pub fn sign(self, private_key: &str, agent_subject: &str) -> Result<Commit, SigningError> {
        sign_at(self, agent_subject, private_key, Utc::now().timestamp_millis())
    }
}

/// A signed commit, ready to be posted.
#[derive(Debug, Clone, PartialEq)]
pub struct Commit {
    pub subject: String,
    pub set: BTreeMap<String, Json>,
    pub remove: BTreeSet<String>,
    pub destroy: bool,
    /// Subject URL of the signing Agent.
    pub signer: String,
    /// Unix milliseconds.
    pub created_at: i64,
    /// Base64 ed25519 signature over everything above.
    pub signature: String,
}

impl Commit {
    /// The bytes that the signature covers: the deterministic serialization
    /// with `signature` left out.
    pub fn signing_message(&self) -> Result<String, SigningError> {
        serde_jcs::to_string(&self.to_json_ad(false))
            .map_err(|e| SigningError::Canonicalization(e.to_string()))
    }

    /// Parse a property-URL-keyed commit, as produced by
    /// [`serialize_deterministically`].
    pub fn from_json_ad(text: &str) -> Result<Self, CommitError> {
        let json: Json =
            serde_json::from_str(text).map_err(|e| CommitError::InvalidJson(e.to_string()))?;
        let obj = json.as_object().ok_or(CommitError::NotAnObject)?;

        let set = match obj.get(fields::SET) {
            None => BTreeMap::new(),
            Some(Json::Object(map)) => map.clone().into_iter().collect(),
            Some(other) => return Err(invalid("set", format!("expected an object, got {other}"))),
        };

        let remove = match obj.get(fields::REMOVE) {
            None => BTreeSet::new(),
            Some(Json::Array(items)) => items
                .iter()
                .map(|item| {
                    item.as_str()
                        .map(str::to_string)
                        .ok_or_else(|| invalid("remove", format!("{item} is not a string")))
                })
                .collect::<Result<_, _>>()?,
            Some(other) => return Err(invalid("remove", format!("expected an array, got {other}"))),
        };

        let destroy = match obj.get(fields::DESTROY) {
            None => false,
            Some(Json::Bool(b)) => *b,
            Some(other) => return Err(invalid("destroy", format!("expected a boolean, got {other}"))),
        };

        let created_at = obj
            .get(fields::CREATED_AT)
            .ok_or(CommitError::MissingField("createdAt"))?
            .as_i64()
            .ok_or_else(|| invalid("createdAt", "expected an integer".into()))?;

        Ok(Self {
            subject: required_str(obj, fields::SUBJECT, "subject")?,
            set,
            remove,
            destroy,
            signer: required_str(obj, fields::SIGNER, "signer")?,
            created_at,
            signature: required_str(obj, fields::SIGNATURE, "signature")?,
        })
    }

    fn to_json_ad(&self, with_signature: bool) -> Json {
        let mut obj = Map::new();
        obj.insert(fields::SUBJECT.into(), Json::String(self.subject.clone()));
        if !self.set.is_empty() {
            let set: Map<String, Json> = self.set.clone().into_iter().collect();
            obj.insert(fields::SET.into(), Json::Object(set));
        }
        if !self.remove.is_empty() {
            let remove: Vec<Json> = self.remove.iter().cloned().map(Json::String).collect();
            obj.insert(fields::REMOVE.into(), Json::Array(remove));
        }
        if self.destroy {
            obj.insert(fields::DESTROY.into(), Json::Bool(true));
        }
        obj.insert(fields::CREATED_AT.into(), Json::from(self.created_at));
        obj.insert(fields::SIGNER.into(), Json::String(self.signer.clone()));
        if with_signature {
            obj.insert(fields::SIGNATURE.into(), Json::String(self.signature.clone()));
        }
        obj.insert(
            IS_A.into(),
            Json::Array(vec![Json::String(classes::COMMIT.into())]),
        );
        Json::Object(obj)
    }
}

/// Stamp `signer` and `created_at` onto the diff and sign it.
///
/// Deterministic: the same inputs always yield the same signature.
///
/// # Errors
///
/// [`SigningError::MissingSigner`] when `signer` is empty, and
/// [`SigningError::InvalidPrivateKey`] when the key does not decode.
pub fn sign_at(
    builder: CommitBuilder,
    signer: &str,
    private_key: &str,
    created_at: i64,
) -> Result<Commit, SigningError> {
    if signer.is_empty() {
        return Err(SigningError::MissingSigner);
    }
    let CommitBuilder {
        subject,
        set,
        remove,
        destroy,
    } = builder;

    let mut commit = Commit {
        subject,
        set,
        remove,
        destroy,
        signer: signer.to_string(),
        created_at,
        signature: String::new(),
    };
    let message = commit.signing_message()?;
    commit.signature = sign_to_base64(&message, private_key)?;
    Ok(commit)
}

/// The wire form of a signed commit (JCS, property-URL keys, `isA` injected).
pub fn serialize_deterministically(commit: &Commit) -> Result<String, SigningError> {
    serde_jcs::to_string(&commit.to_json_ad(true))
        .map_err(|e| SigningError::Canonicalization(e.to_string()))
}

/// Check that `commit.signature` was made by `public_key` over the rest of
/// the commit.
pub fn verify_commit(commit: &Commit, public_key: &str) -> Result<(), ProofError> {
    let message = commit
        .signing_message()
        .map_err(|e| ProofError::Canonicalization(e.to_string()))?;
    verify_base64(&message, &commit.signature, public_key)
}

// --- helpers -----------------------------------------------------------------

fn invalid(field: &'static str, reason: String) -> CommitError {
    CommitError::InvalidField { field, reason }
}

fn required_str(
    obj: &Map<String, Json>,
    url: &str,
    field: &'static str,
) -> Result<String, CommitError> {
    obj.get(url)
        .ok_or(CommitError::MissingField(field))?
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| invalid(field, "expected a string".into()))
}

// --- tests -------------------------------------------------------------------

//! The error type of the client layer.
//!
//! Fetch and parse failures are captured onto the affected
//! [`Resource`](crate::Resource) rather than returned, so the type is
//! `Clone` and carries messages instead of live transport errors.

use atomicdata::{CommitError, SigningError, ValidationError, ValueError};
use atomicdata_agent::{AgentError, SessionError};
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ClientError {
    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Agent(#[from] AgentError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Value(#[from] ValueError),

    #[error(transparent)]
    Signing(#[from] SigningError),

    #[error(transparent)]
    Commit(#[from] CommitError),

    /// The request never produced a response.
    #[error("request to {url} failed: {message}")]
    Network { url: String, message: String },

    #[error("{subject} returned {status}. Server: {body}")]
    BadStatus {
        subject: String,
        status: u16,
        body: String,
    },

    #[error("Commit failed. Server replied with {status}: {body}")]
    CommitRejected { status: u16, body: String },

    #[error("could not parse JSON-AD for {subject}: {message}")]
    Parse { subject: String, message: String },

    /// A single property of a JSON-AD document could not become a value.
    #[error("could not read property {property} of {subject}: {source}")]
    PropertyValue {
        subject: String,
        property: String,
        source: ValueError,
    },

    #[error("property {subject} has no {missing}; found: {propvals}")]
    IncompleteProperty {
        subject: String,
        missing: &'static str,
        propvals: String,
    },

    #[error("no agent is set in the store; one is required to sign commits")]
    NoAgent,

    #[error("invalid store configuration: {0}")]
    Config(String),
}

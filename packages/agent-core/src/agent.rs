//! Agent identity: an ed25519 keypair plus the Agent's subject URL.
//!
//! The private key is authoritative; the public key is always derived from
//! it. Key derivation is cheap and synchronous here, so it happens once at
//! construction and the result is cached on the Agent.
//!
//! # Typical host lifecycle
//!
//! ```text
//! First run:
//!   keys    = generate_key_pair()
//!   subject = session.agent_subject(&keys.public_key)
//!   agent   = Agent::new(keys.private_key, Some(&subject))
//!   secret  = agent.build_secret()        // persist or show this
//!
//! Subsequent runs:
//!   agent = Agent::from_secret(&secret)
//! ```

use atomicdata::{
    public_key_from_private, sign_to_base64, validate_url, Commit, CommitBuilder, SigningError,
};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use ed25519_dalek::SigningKey;
use rand::rngs::OsRng;
use thiserror::Error;

/// Errors that can occur when building or using an [`Agent`].
#[derive(Debug, Clone, Error, PartialEq)]
pub enum AgentError {
    #[error("agent subject is not a valid URL: {0:?}")]
    InvalidSubject(String),

    #[error("invalid agent private key: {0}")]
    InvalidPrivateKey(String),

    #[error("agent has no subject; one is required to build a secret")]
    MissingSubject,

    #[error("malformed agent secret: {0}")]
    MalformedSecret(String),

    #[error(transparent)]
    Signing(#[from] SigningError),
}

/// A freshly generated keypair, both halves base64 encoded.
#[derive(Clone, PartialEq, Eq)]
pub struct KeyPair {
    pub private_key: String,
    pub public_key: String,
}

/// Generate a new keypair using OS randomness.
pub fn generate_key_pair() -> KeyPair {
    let signing_key = SigningKey::generate(&mut OsRng);
    KeyPair {
        private_key: STANDARD.encode(signing_key.to_bytes()),
        public_key: STANDARD.encode(signing_key.verifying_key().as_bytes()),
    }
}

/// An identity authorized to sign commits.
#[derive(Clone, PartialEq, Eq)]
pub struct Agent {
    subject: Option<String>,
    private_key: String,
    public_key: String,
}

impl Agent {
    /// Build an agent from a base64 private key and an optional subject URL.
    pub fn new(private_key: impl Into<String>, subject: Option<&str>) -> Result<Self, AgentError> {
        if let Some(subject) = subject {
            validate_url(subject).map_err(|_| AgentError::InvalidSubject(subject.to_string()))?;
        }
        let private_key = private_key.into();
        let public_key = public_key_from_private(&private_key).map_err(|e| match e {
            SigningError::InvalidPrivateKey(msg) => AgentError::InvalidPrivateKey(msg),
            other => AgentError::Signing(other),
        })?;
        Ok(Self {
            subject: subject.map(str::to_string),
            private_key,
            public_key,
        })
    }

    /// A new agent with a random keypair and no subject yet.
    pub fn generate() -> Self {
        let keys = generate_key_pair();
        Self {
            subject: None,
            private_key: keys.private_key,
            public_key: keys.public_key,
        }
    }

    /// Attach (or replace) the subject URL.
    pub fn with_subject(self, subject: &str) -> Result<Self, AgentError> {
        validate_url(subject).map_err(|_| AgentError::InvalidSubject(subject.to_string()))?;
        Ok(Self {
            subject: Some(subject.to_string()),
            ..self
        })
    }

    pub fn subject(&self) -> Option<&str> {
        self.subject.as_deref()
    }

    /// The base64 private key. **Keep this secret.**
    pub fn private_key(&self) -> &str {
        &self.private_key
    }

    /// The base64 public key derived from the private key.
    pub fn public_key(&self) -> &str {
        &self.public_key
    }

    /// Sign an arbitrary message, returning a base64 signature.
    pub fn sign(&self, message: &str) -> Result<String, AgentError> {
        Ok(sign_to_base64(message, &self.private_key)?)
    }

    /// Sign a pending diff as this agent.
    ///
    /// An agent without a subject cannot sign commits: the server needs the
    /// signer URL to look up the public key.
    pub fn sign_commit(&self, builder: CommitBuilder) -> Result<Commit, AgentError> {
        let signer = self.subject.as_deref().unwrap_or_default();
        Ok(builder.sign(&self.private_key, signer)?)
    }
}

/// Never prints the private key.
impl std::fmt::Debug for Agent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Agent")
            .field("subject", &self.subject)
            .field("public_key", &self.public_key)
            .field("private_key", &"<redacted>")
            .finish()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

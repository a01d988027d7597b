//! Server session: URL helpers for the Atomic server a client talks to.
//!
//! A [`ServerSession`] wraps the server's base URL and computes every
//! endpoint the client layer needs. There is no I/O here; the store makes
//! the actual HTTP calls.

use atomicdata::validate_url;
use thiserror::Error;
use urlencoding::encode;

/// Errors that can occur when building a [`ServerSession`].
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SessionError {
    #[error("base URL is not a valid URL: {0:?}")]
    InvalidUrl(String),

    #[error("base URL must not end with a slash: {0:?}")]
    TrailingSlash(String),
}

/// A validated server base URL plus endpoint computation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerSession {
    /// e.g. `https://atomicdata.dev`, never with a trailing slash.
    base_url: String,
}

impl ServerSession {
    pub fn new(base_url: impl Into<String>) -> Result<Self, SessionError> {
        let base_url = base_url.into();
        validate_url(&base_url).map_err(|_| SessionError::InvalidUrl(base_url.clone()))?;
        if base_url.ends_with('/') {
            return Err(SessionError::TrailingSlash(base_url));
        }
        Ok(Self { base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `{base_url}/commit`: `POST` signed commits here.
    pub fn commit_url(&self) -> String {
        format!("{}/commit", self.base_url)
    }

    /// `{base_url}/path?subject={subject_encoded}`: fetch an off-origin
    /// resource through this server.
    pub fn proxy_url(&self, subject: &str) -> String {
        format!("{}/path?subject={}", self.base_url, encode(subject))
    }

    /// `{base_url}/agents/{public_key}`: the conventional subject for an
    /// agent registered on this server.
    pub fn agent_subject(&self, public_key: &str) -> String {
        format!("{}/agents/{}", self.base_url, public_key)
    }

    /// `{base_url}/{id}`
    pub fn subject_for(&self, id: &str) -> String {
        format!("{}/{}", self.base_url, id.trim_start_matches('/'))
    }

    /// Whether `subject` lives on this server.
    pub fn is_local(&self, subject: &str) -> bool {
        match subject.strip_prefix(&self.base_url) {
            Some(rest) => rest.is_empty() || rest.starts_with('/') || rest.starts_with('?'),
            None => false,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> ServerSession {
        ServerSession::new("https://atomicdata.dev").unwrap()
    }

    #[test]
    fn commit_url() {
        assert_eq!(session().commit_url(), "https://atomicdata.dev/commit");
    }

    #[test]
    fn proxy_url_encodes_subject() {
        assert_eq!(
            session().proxy_url("https://other.example/a?b=c"),
            "https://atomicdata.dev/path?subject=https%3A%2F%2Fother.example%2Fa%3Fb%3Dc"
        );
    }

    #[test]
    fn agent_subject() {
        assert_eq!(
            session().agent_subject("abc="),
            "https://atomicdata.dev/agents/abc="
        );
    }

    #[test]
    fn subject_for_strips_leading_slash() {
        assert_eq!(session().subject_for("/things/1"), "https://atomicdata.dev/things/1");
    }

    #[test]
    fn trailing_slash_rejected() {
        assert_eq!(
            ServerSession::new("https://atomicdata.dev/"),
            Err(SessionError::TrailingSlash("https://atomicdata.dev/".into()))
        );
    }

    #[test]
    fn invalid_url_rejected() {
        assert!(matches!(
            ServerSession::new("atomicdata.dev"),
            Err(SessionError::InvalidUrl(_))
        ));
    }

    #[test]
    fn is_local_checks_origin_boundary() {
        let s = session();
        assert!(s.is_local("https://atomicdata.dev/properties/name"));
        assert!(s.is_local("https://atomicdata.dev"));
        assert!(!s.is_local("https://atomicdata.dev.evil.example/x"));
        assert!(!s.is_local("https://example.com/x"));
    }
}

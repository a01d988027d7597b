//! Agent secret interchange.
//!
//! A secret is the base64 encoding of `{"privateKey": "...", "subject": "..."}`.
//! Users copy it between clients to carry one identity around.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::agent::{Agent, AgentError};

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SecretPayload {
    private_key: String,
    subject: String,
}

impl Agent {
    /// Restore an agent from a secret produced by [`Agent::build_secret`].
    pub fn from_secret(secret: &str) -> Result<Self, AgentError> {
        let bytes = STANDARD
            .decode(secret.trim())
            .map_err(|e| AgentError::MalformedSecret(format!("base64 decode failed: {e}")))?;
        let payload: SecretPayload = serde_json::from_slice(&bytes)
            .map_err(|e| AgentError::MalformedSecret(e.to_string()))?;
        Agent::new(payload.private_key, Some(&payload.subject))
    }

    /// Export this agent as a secret string.
    pub fn build_secret(&self) -> Result<String, AgentError> {
        let subject = self.subject().ok_or(AgentError::MissingSubject)?;
        let payload = SecretPayload {
            private_key: self.private_key().to_string(),
            subject: subject.to_string(),
        };
        let json = serde_json::to_string(&payload)
            .map_err(|e| AgentError::MalformedSecret(e.to_string()))?;
        Ok(STANDARD.encode(json))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PRIVATE_KEY: &str = "CapMWIhFUT+w7ANv9oCPqrHrwZpkP2JhzF9JnyT6WcI=";
    const SUBJECT: &str = "https://localhost/agents/7LsjMW5gOfDdJzK/atgjQ1t20J/rw8MjVg6xwqm+h8U=";
    const SECRET: &str = "eyJwcml2YXRlS2V5IjoiQ2FwTVdJaEZVVCt3N0FOdjlvQ1Bxckhyd1pwa1AySmh6RjlKbnlUNldjST0iLCJzdWJqZWN0IjoiaHR0cHM6Ly9sb2NhbGhvc3QvYWdlbnRzLzdMc2pNVzVnT2ZEZEp6Sy9hdGdqUTF0MjBKL3J3OE1qVmc2eHdxbStoOFU9In0=";

    #[test]
    fn builds_known_secret() {
        let agent = Agent::new(PRIVATE_KEY, Some(SUBJECT)).unwrap();
        assert_eq!(agent.build_secret().unwrap(), SECRET);
    }

    #[test]
    fn restores_from_secret() {
        let agent = Agent::from_secret(SECRET).unwrap();
        assert_eq!(agent.private_key(), PRIVATE_KEY);
        assert_eq!(agent.subject(), Some(SUBJECT));
    }

    #[test]
    fn secret_requires_subject() {
        let agent = Agent::new(PRIVATE_KEY, None).unwrap();
        assert_eq!(agent.build_secret(), Err(AgentError::MissingSubject));
    }

    #[test]
    fn garbage_secret_is_rejected() {
        assert!(matches!(
            Agent::from_secret("not base64 at all!"),
            Err(AgentError::MalformedSecret(_))
        ));
        let not_json = STANDARD.encode("hello");
        assert!(matches!(
            Agent::from_secret(&not_json),
            Err(AgentError::MalformedSecret(_))
        ));
    }
}

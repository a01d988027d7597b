//! Ed25519 signing and verification over base64-encoded keys.
//!
//! Private keys are the 32-byte ed25519 seed, public keys the 32-byte
//! verifying key, and signatures the 64-byte raw signature, all in standard
//! (padded) base64.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use ed25519_dalek::{Signer, SigningKey, Verifier, VerifyingKey};
use thiserror::Error;

/// Errors returned while producing a signature.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SigningError {
    #[error("cannot sign commit: no agent passed")]
    MissingSigner,
    #[error("invalid private key: {0}")]
    InvalidPrivateKey(String),
    #[error("canonicalization failed: {0}")]
    Canonicalization(String),
}

/// Errors returned while checking a signature.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ProofError {
    #[error("invalid public key: {0}")]
    InvalidPublicKey(String),
    #[error("signature decoding failed: {0}")]
    DecodingFailed(String),
    #[error("signature verification failed")]
    VerificationFailed,
    #[error("canonicalization failed: {0}")]
    Canonicalization(String),
}

/// Sign the UTF-8 bytes of `message` and return the base64 signature.
pub fn sign_to_base64(message: &str, private_key: &str) -> Result<String, SigningError> {
    let signing_key = signing_key_from_base64(private_key)?;
    let signature = signing_key.sign(message.as_bytes());
    Ok(STANDARD.encode(signature.to_bytes()))
}

/// Derive the base64 public key belonging to a base64 private key.
pub fn public_key_from_private(private_key: &str) -> Result<String, SigningError> {
    let signing_key = signing_key_from_base64(private_key)?;
    Ok(STANDARD.encode(signing_key.verifying_key().as_bytes()))
}

/// Check a base64 `signature` of `message` against a base64 public key.
pub fn verify_base64(message: &str, signature: &str, public_key: &str) -> Result<(), ProofError> {
    let key_bytes: [u8; 32] = STANDARD
        .decode(public_key)
        .map_err(|e| ProofError::InvalidPublicKey(format!("base64 decode failed: {e}")))?
        .try_into()
        .map_err(|_| ProofError::InvalidPublicKey("key must be 32 bytes".into()))?;
    let verifying_key = VerifyingKey::from_bytes(&key_bytes)
        .map_err(|e| ProofError::InvalidPublicKey(format!("invalid Ed25519 key: {e}")))?;

    let sig_bytes: [u8; 64] = STANDARD
        .decode(signature)
        .map_err(|e| ProofError::DecodingFailed(format!("base64 decode failed: {e}")))?
        .try_into()
        .map_err(|_| ProofError::DecodingFailed("signature must be exactly 64 bytes".into()))?;
    let signature = ed25519_dalek::Signature::from_bytes(&sig_bytes);

    verifying_key
        .verify(message.as_bytes(), &signature)
        .map_err(|_| ProofError::VerificationFailed)
}

pub(crate) fn signing_key_from_base64(private_key: &str) -> Result<SigningKey, SigningError> {
    let seed: [u8; 32] = STANDARD
        .decode(private_key)
        .map_err(|e| SigningError::InvalidPrivateKey(format!("base64 decode failed: {e}")))?
        .try_into()
        .map_err(|_| SigningError::InvalidPrivateKey("key must be 32 bytes".into()))?;
    Ok(SigningKey::from_bytes(&seed))
}

#[cfg(test)]
mod tests {
    use super::*;

    const PRIVATE_KEY: &str = "CapMWIhFUT+w7ANv9oCPqrHrwZpkP2JhzF9JnyT6WcI=";
    const PUBLIC_KEY: &str = "7LsjMW5gOfDdJzK/atgjQ1t20J/rw8MjVg6xwqm+h8U=";

    #[test]
    fn derives_known_public_key() {
        assert_eq!(public_key_from_private(PRIVATE_KEY).unwrap(), PUBLIC_KEY);
    }

    #[test]
    fn signs_known_vector() {
        let sig = sign_to_base64("hello atomic", PRIVATE_KEY).unwrap();
        assert_eq!(
            sig,
            "jXpB85EoHi3e8PSNFLMc/JnW+R+BXBtKrIqtDinadC9jkAEh6Q0qhrK26bAcwgOSyA2l/cc8ruKjw0tYS5x9BA=="
        );
        verify_base64("hello atomic", &sig, PUBLIC_KEY).unwrap();
    }

    #[test]
    fn tampered_message_fails_verification() {
        let sig = sign_to_base64("hello atomic", PRIVATE_KEY).unwrap();
        assert_eq!(
            verify_base64("hello atomik", &sig, PUBLIC_KEY),
            Err(ProofError::VerificationFailed)
        );
    }

    #[test]
    fn rejects_short_private_key() {
        assert!(matches!(
            sign_to_base64("x", "c2hvcnQ="),
            Err(SigningError::InvalidPrivateKey(_))
        ));
    }

    #[test]
    fn rejects_non_base64_signature() {
        assert!(matches!(
            verify_base64("x", "***", PUBLIC_KEY),
            Err(ProofError::DecodingFailed(_))
        ));
    }
}

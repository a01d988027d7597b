//! Pure-logic agent primitives for Atomic Data.
//!
//! This crate has **no I/O**. It holds the signing identity ([`Agent`]), the
//! secret string used to move an identity between clients, and
//! [`ServerSession`], which computes every server URL the client layer talks
//! to. The network side lives in `atomicdata-client`.

pub mod agent;
pub mod secret;
pub mod session;

pub use agent::{generate_key_pair, Agent, AgentError, KeyPair};
pub use session::{ServerSession, SessionError};

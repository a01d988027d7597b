//! One subject, its property values, and its pending diff.
//!
//! # Lifecycle
//!
//! ```text
//! Loading ──fetch + parse ok──▶ Ready
//!    └────fetch/parse failed──▶ Error
//! ```
//!
//! `Ready` and `Error` are terminal for a given object; a refresh produces a
//! new `Resource` for the same subject. [`Resource::new_local`] creates one
//! directly in `Ready`.
//!
//! # Snapshot and diff
//!
//! `propvals` is what the client currently believes. The embedded
//! [`CommitBuilder`] is what still has to be sent. [`Resource::save`] takes
//! the diff out, so a successful save can never send it twice. A failed save
//! puts it back for a later retry. The optimistic `propvals` are not rolled
//! back in either case.

use std::collections::BTreeMap;

use atomicdata::urls::properties;
use atomicdata::{validate, CommitBuilder, Value};

use crate::error::ClientError;
use crate::store::Store;

/// Where a resource is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceStatus {
    Loading,
    Ready,
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Resource {
    subject: String,
    propvals: BTreeMap<String, Value>,
    status: ResourceStatus,
    error: Option<ClientError>,
    commit_builder: CommitBuilder,
}

impl Resource {
    /// A placeholder that is still being fetched.
    pub fn new(subject: impl Into<String>) -> Self {
        let subject = subject.into();
        Self {
            commit_builder: CommitBuilder::new(subject.clone()),
            subject,
            propvals: BTreeMap::new(),
            status: ResourceStatus::Loading,
            error: None,
        }
    }

    /// A resource created on this client, ready to be filled and saved.
    pub fn new_local(subject: impl Into<String>) -> Self {
        Self {
            status: ResourceStatus::Ready,
            ..Self::new(subject)
        }
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn status(&self) -> ResourceStatus {
        self.status
    }

    pub fn is_ready(&self) -> bool {
        self.status == ResourceStatus::Ready
    }

    /// The captured fetch or parse failure, when `status` is `Error`.
    pub fn error(&self) -> Option<&ClientError> {
        self.error.as_ref()
    }

    /// Look up one property value. Never fails.
    pub fn get(&self, property: &str) -> Option<&Value> {
        self.propvals.get(property)
    }

    pub fn propvals(&self) -> &BTreeMap<String, Value> {
        &self.propvals
    }

    /// The `isA` classes of this resource, or an empty list.
    pub fn get_classes(&self) -> Vec<String> {
        self.get(properties::IS_A)
            .and_then(|v| v.to_array().ok())
            .map(<[String]>::to_vec)
            .unwrap_or_default()
    }

    /// The diff that the next [`save`](Self::save) will send.
    pub fn pending_commit(&self) -> &CommitBuilder {
        &self.commit_builder
    }

    pub fn has_unsaved_changes(&self) -> bool {
        !self.commit_builder.is_empty()
    }

    /// Write a value without validating it or recording it in the diff.
    /// Used for data that came from the server.
    pub fn set_unsafe(&mut self, property: impl Into<String>, value: Value) {
        self.propvals.insert(property.into(), value);
    }

    /// Validate `value` against the property's datatype, then apply it
    /// locally and record its native form in the pending diff.
    ///
    /// On any failure the resource is left untouched.
    pub async fn set_validate(
        &mut self,
        property: &str,
        value: serde_json::Value,
        store: &Store,
    ) -> Result<Value, ClientError> {
        let definition = store.get_property(property).await?;
        let validated = validate(value, &definition.datatype)?;
        let native = validated.to_native(&definition.datatype)?;

        self.propvals.insert(property.to_string(), validated.clone());
        self.commit_builder.set_value(property, native);
        Ok(validated)
    }

    /// Drop a property locally and record its removal in the pending diff.
    pub fn remove_propval(&mut self, property: &str) {
        self.propvals.remove(property);
        self.commit_builder.remove_property(property);
    }

    /// Sign the pending diff with the store's agent and post it.
    ///
    /// On success the diff is gone, the resource is written to the store's
    /// cache (notifying subscribers), and its subject is returned.
    ///
    /// # Errors
    ///
    /// [`ClientError::NoAgent`] when the store has no agent. Signing and
    /// network failures are returned as-is, with the diff restored.
    pub async fn save(&mut self, store: &Store) -> Result<String, ClientError> {
        let agent = store.get_agent().ok_or(ClientError::NoAgent)?;
        let diff = std::mem::replace(
            &mut self.commit_builder,
            CommitBuilder::new(self.subject.clone()),
        );

        let commit = match agent.sign_commit(diff.clone()) {
            Ok(commit) => commit,
            Err(e) => {
                self.commit_builder = diff;
                return Err(e.into());
            }
        };
        if let Err(e) = store.post_commit(&commit).await {
            self.commit_builder = diff;
            return Err(e);
        }

        self.status = ResourceStatus::Ready;
        self.error = None;
        store.add_resource(self.clone());
        Ok(self.subject.clone())
    }

    /// Delete this resource on the server, then drop it from the cache.
    ///
    /// Any pending diff is ignored.
    pub async fn destroy(&self, store: &Store) -> Result<(), ClientError> {
        let agent = store.get_agent().ok_or(ClientError::NoAgent)?;
        let commit = agent.sign_commit(CommitBuilder::destroying(self.subject.clone()))?;
        store.post_commit(&commit).await?;
        store.remove_resource(&self.subject);
        Ok(())
    }

    /// Only the JSON-AD parser may move a resource to another subject, and
    /// only before anything has been recorded in its diff.
    pub(crate) fn set_subject(&mut self, subject: impl Into<String>) {
        self.subject = subject.into();
        self.commit_builder = CommitBuilder::new(self.subject.clone());
    }

    pub(crate) fn set_ready(&mut self) {
        self.status = ResourceStatus::Ready;
        self.error = None;
    }

    pub(crate) fn set_error(&mut self, error: ClientError) {
        self.status = ResourceStatus::Error;
        self.error = Some(error);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SUBJECT: &str = "https://example.com/things/1";

    #[test]
    fn new_resource_is_loading() {
        let r = Resource::new(SUBJECT);
        assert_eq!(r.status(), ResourceStatus::Loading);
        assert_eq!(r.subject(), SUBJECT);
        assert!(r.get(properties::NAME).is_none());
        assert!(!r.has_unsaved_changes());
    }

    #[test]
    fn set_unsafe_does_not_touch_diff() {
        let mut r = Resource::new_local(SUBJECT);
        r.set_unsafe(properties::NAME, Value::from("thing"));
        assert_eq!(r.get(properties::NAME), Some(&Value::from("thing")));
        assert!(!r.has_unsaved_changes());
    }

    #[test]
    fn remove_propval_records_removal() {
        let mut r = Resource::new_local(SUBJECT);
        r.set_unsafe(properties::NAME, Value::from("thing"));
        r.remove_propval(properties::NAME);
        assert!(r.get(properties::NAME).is_none());
        assert!(r.pending_commit().remove().contains(properties::NAME));
    }

    #[test]
    fn get_classes_reads_is_a() {
        let mut r = Resource::new_local(SUBJECT);
        assert!(r.get_classes().is_empty());
        r.set_unsafe(
            properties::IS_A,
            Value::from(vec![atomicdata::urls::classes::PROPERTY.to_string()]),
        );
        assert_eq!(r.get_classes(), vec![atomicdata::urls::classes::PROPERTY.to_string()]);
    }

    #[test]
    fn error_state_keeps_error() {
        let mut r = Resource::new(SUBJECT);
        r.set_error(ClientError::NoAgent);
        assert_eq!(r.status(), ResourceStatus::Error);
        assert_eq!(r.error(), Some(&ClientError::NoAgent));
    }
}

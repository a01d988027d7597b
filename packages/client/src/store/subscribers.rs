//! Subject-keyed observer registry.
//!
//! Callbacks are invoked on a snapshot of the list taken before iteration, so
//! a callback that subscribes or unsubscribes while being notified cannot
//! skip or repeat its neighbours.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use crate::resource::Resource;

/// Receives the new snapshot of a resource whenever its cache slot changes.
pub type Callback = Arc<dyn Fn(&Arc<Resource>) + Send + Sync>;

#[derive(Default)]
pub(crate) struct SubscriberRegistry {
    by_subject: Mutex<HashMap<String, Vec<Callback>>>,
}

impl SubscriberRegistry {
    /// Duplicate registrations are kept; each one is invoked.
    pub(crate) fn subscribe(&self, subject: &str, callback: Callback) {
        self.lock()
            .entry(subject.to_string())
            .or_default()
            .push(callback);
    }

    /// Remove every registration of `callback` (by pointer identity).
    pub(crate) fn unsubscribe(&self, subject: &str, callback: &Callback) {
        let mut by_subject = self.lock();
        if let Some(list) = by_subject.get_mut(subject) {
            list.retain(|existing| !same_callback(existing, callback));
            if list.is_empty() {
                by_subject.remove(subject);
            }
        }
    }

    pub(crate) fn snapshot(&self, subject: &str) -> Vec<Callback> {
        self.lock().get(subject).cloned().unwrap_or_default()
    }

    pub(crate) fn count(&self, subject: &str) -> usize {
        self.lock().get(subject).map_or(0, Vec::len)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Vec<Callback>>> {
        self.by_subject.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

// Compare data pointers only; vtable pointers for the same closure may differ
// between codegen units.
fn same_callback(a: &Callback, b: &Callback) -> bool {
    std::ptr::eq(
        Arc::as_ptr(a) as *const (),
        Arc::as_ptr(b) as *const (),
    )
}

//! Subject-keyed resource cache with change notification.
//!
//! # Reads
//!
//! [`Store::get_resource_loading`] never waits. On a cache miss it inserts a
//! `Loading` placeholder, starts a fetch in the background, and returns the
//! placeholder. The fetched resource later replaces the placeholder and every
//! subscriber of that subject is called with it. Callers that need the fresh
//! value subscribe instead of polling.
//!
//! # Writes
//!
//! [`Resource::save`] and [`Resource::destroy`] sign through the store's
//! [`Agent`] and post to `{base_url}/commit`.
//!
//! # Overlapping fetches
//!
//! Every cache write bumps a per-subject generation. A fetch remembers the
//! generation it started under and only writes its result if nothing newer
//! happened to that subject meanwhile, so a slow response cannot overwrite a
//! fresher one. The generation table holds one entry per cached or in-flight
//! subject and shrinks again on [`Store::remove_resource`].
//!
//! # Canonical subjects
//!
//! A server may answer with an `@id` other than the subject that was asked
//! for. The result is then cached under both subjects and the subscribers of
//! both are notified, so the requested slot never stays `Loading`.
//!
//! # Sharing
//!
//! `Store` is a cheap handle around an [`Arc`]; clone it to hand it to every
//! consumer. Locks are never held across an `.await`.

mod subscribers;
mod transport;

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use atomicdata::{serialize_deterministically, Commit};
use atomicdata_agent::{Agent, ServerSession};
use tracing::{debug, info, warn};

use crate::config::StoreConfig;
use crate::error::ClientError;
use crate::parse::parse_json_ad_resource;
use crate::property::Property;
use crate::resource::{Resource, ResourceStatus};

pub use subscribers::Callback;
use subscribers::SubscriberRegistry;
use transport::Transport;

/// Receives every error the store captures instead of returning.
pub type ErrorHandler = Arc<dyn Fn(&ClientError) + Send + Sync>;

/// How [`Store::fetch_resource`] should treat the cache and the network.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FetchOptions {
    /// Fetch even when a settled copy is already cached.
    pub force_refresh: bool,
    /// Fetch off-origin subjects through `{base_url}/path`.
    pub via_proxy: bool,
}

/// Handle to the shared resource cache.
#[derive(Clone)]
pub struct Store {
    inner: Arc<Inner>,
}

struct Inner {
    session: RwLock<ServerSession>,
    agent: RwLock<Option<Agent>>,
    resources: RwLock<HashMap<String, Arc<Resource>>>,
    /// Latest generation per subject. Lock before `resources` when both are needed.
    generations: Mutex<Generations>,
    subscribers: SubscriberRegistry,
    error_handler: RwLock<Option<ErrorHandler>>,
    transport: Transport,
}

#[derive(Default)]
struct Generations {
    counter: u64,
    latest: HashMap<String, u64>,
}

impl Generations {
    fn bump(&mut self, subject: &str) -> u64 {
        self.counter += 1;
        self.latest.insert(subject.to_string(), self.counter);
        self.counter
    }

    fn is_current(&self, subject: &str, generation: u64) -> bool {
        self.latest.get(subject) == Some(&generation)
    }

    /// Forget `subject`. Outstanding tickets for it can no longer match, and
    /// the counter never reuses a number, so a later fetch starts clean.
    fn forget(&mut self, subject: &str) {
        self.latest.remove(subject);
    }
}

impl Store {
    /// A store for `base_url` without an agent.
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        Ok(Self::with_parts(
            ServerSession::new(base_url)?,
            None,
            reqwest::Client::new(),
        ))
    }

    /// Build a store from [`StoreConfig`], importing the agent secret if set.
    pub fn from_config(config: &StoreConfig) -> Result<Self, ClientError> {
        let session = ServerSession::new(config.base_url.as_str())?;
        let agent = config
            .agent_secret
            .as_deref()
            .map(Agent::from_secret)
            .transpose()?;

        let mut builder = reqwest::Client::builder();
        if let Some(secs) = config.request_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder
            .build()
            .map_err(|e| ClientError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self::with_parts(session, agent, client))
    }

    fn with_parts(session: ServerSession, agent: Option<Agent>, client: reqwest::Client) -> Self {
        Self {
            inner: Arc::new(Inner {
                session: RwLock::new(session),
                agent: RwLock::new(agent),
                resources: RwLock::new(HashMap::new()),
                generations: Mutex::new(Generations::default()),
                subscribers: SubscriberRegistry::default(),
                error_handler: RwLock::new(None),
                transport: Transport::new(client),
            }),
        }
    }

    // --- Configuration -------------------------------------------------------

    pub fn get_base_url(&self) -> String {
        read(&self.inner.session).base_url().to_string()
    }

    /// Replace the server base URL. Must be a valid URL without a trailing slash.
    pub fn set_base_url(&self, base_url: &str) -> Result<(), ClientError> {
        let session = ServerSession::new(base_url)?;
        *write(&self.inner.session) = session;
        Ok(())
    }

    pub fn get_agent(&self) -> Option<Agent> {
        read(&self.inner.agent).clone()
    }

    /// Set the agent used to sign commits; `None` makes the store read-only.
    pub fn set_agent(&self, agent: Option<Agent>) {
        *write(&self.inner.agent) = agent;
    }

    /// Register the hook that receives captured errors.
    pub fn set_error_handler(&self, handler: ErrorHandler) {
        *write(&self.inner.error_handler) = Some(handler);
    }

    /// Log a captured error and pass it to the error handler, if any.
    pub fn report(&self, error: &ClientError) {
        warn!(%error, "atomic store error");
        let handler = read(&self.inner.error_handler).clone();
        if let Some(handler) = handler {
            handler(error);
        }
    }

    /// A fresh random subject under the base URL.
    pub fn create_subject(&self) -> String {
        let id = uuid::Uuid::now_v7().simple().to_string();
        read(&self.inner.session).subject_for(&id)
    }

    // --- Reads ---------------------------------------------------------------

    /// Return the cached resource, or a `Loading` placeholder while a
    /// background fetch runs. Never waits.
    ///
    /// Must be called inside a tokio runtime for the fetch to start; outside
    /// one the placeholder stays `Loading` until
    /// [`fetch_resource`](Self::fetch_resource) is called.
    pub fn get_resource_loading(&self, subject: &str) -> Arc<Resource> {
        let (placeholder, generation) = {
            let mut generations = lock(&self.inner.generations);
            let mut resources = write(&self.inner.resources);
            if let Some(cached) = resources.get(subject) {
                return Arc::clone(cached);
            }
            let placeholder = Arc::new(Resource::new(subject));
            resources.insert(subject.to_string(), Arc::clone(&placeholder));
            (placeholder, generations.bump(subject))
        };

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let store = self.clone();
                let subject = subject.to_string();
                handle.spawn(async move {
                    store
                        .fetch_under(&subject, FetchOptions::default(), generation)
                        .await;
                });
            }
            Err(_) => warn!(subject, "no tokio runtime; resource stays loading"),
        }
        placeholder
    }

    /// Fetch `subject` from the network and write it into the cache.
    ///
    /// Without `force_refresh`, a cached resource that is already `Ready` or
    /// `Error` is returned as-is. Failures do not surface here: they are
    /// captured on the returned resource and reported.
    pub async fn fetch_resource(&self, subject: &str, options: FetchOptions) -> Arc<Resource> {
        if !options.force_refresh {
            if let Some(cached) = self.cached(subject) {
                if cached.status() != ResourceStatus::Loading {
                    return cached;
                }
            }
        }
        let generation = lock(&self.inner.generations).bump(subject);
        self.fetch_under(subject, options, generation).await
    }

    /// Wait for a settled (`Ready` or `Error`) copy of `subject`.
    pub async fn get_resource_async(&self, subject: &str) -> Arc<Resource> {
        self.fetch_resource(subject, FetchOptions::default()).await
    }

    /// Resolve `subject` as a Property.
    pub async fn get_property(&self, subject: &str) -> Result<Property, ClientError> {
        let resource = self.get_resource_async(subject).await;
        if let Some(error) = resource.error() {
            return Err(error.clone());
        }
        Property::from_resource(&resource)
    }

    /// Whatever is in the cache for `subject`, without fetching.
    pub fn cached(&self, subject: &str) -> Option<Arc<Resource>> {
        read(&self.inner.resources).get(subject).cloned()
    }

    // --- Writes --------------------------------------------------------------

    /// Replace the cache slot for `resource.subject()` and notify its subscribers.
    pub fn add_resource(&self, resource: Resource) -> Arc<Resource> {
        let resource = Arc::new(resource);
        {
            let mut generations = lock(&self.inner.generations);
            generations.bump(resource.subject());
            write(&self.inner.resources)
                .insert(resource.subject().to_string(), Arc::clone(&resource));
        }
        self.notify(&resource);
        resource
    }

    /// Drop `subject` from the cache. A later read fetches it again.
    pub fn remove_resource(&self, subject: &str) -> Option<Arc<Resource>> {
        let mut generations = lock(&self.inner.generations);
        generations.forget(subject);
        write(&self.inner.resources).remove(subject)
    }

    /// Sign-independent half of saving: serialize and post a commit.
    pub async fn post_commit(&self, commit: &Commit) -> Result<(), ClientError> {
        let body = serialize_deterministically(commit)?;
        let url = read(&self.inner.session).commit_url();
        match self.inner.transport.post_commit(&url, body).await {
            Ok(_) => {
                info!(subject = %commit.subject, destroy = commit.destroy, "commit accepted");
                Ok(())
            }
            Err(e) => {
                warn!(subject = %commit.subject, error = %e, "commit failed");
                Err(e)
            }
        }
    }

    // --- Subscriptions -------------------------------------------------------

    pub fn subscribe(&self, subject: &str, callback: Callback) {
        self.inner.subscribers.subscribe(subject, callback);
    }

    /// Remove `callback` from `subject`, matching by pointer identity.
    pub fn unsubscribe(&self, subject: &str, callback: &Callback) {
        self.inner.subscribers.unsubscribe(subject, callback);
    }

    pub fn subscriber_count(&self, subject: &str) -> usize {
        self.inner.subscribers.count(subject)
    }

    /// Call every subscriber of the resource's subject with it.
    pub fn notify(&self, resource: &Arc<Resource>) {
        self.notify_as(resource.subject(), resource);
    }

    fn notify_as(&self, subject: &str, resource: &Arc<Resource>) {
        for callback in self.inner.subscribers.snapshot(subject) {
            callback(resource);
        }
    }

    // --- Internal ------------------------------------------------------------

    async fn fetch_under(&self, subject: &str, options: FetchOptions, generation: u64) -> Arc<Resource> {
        let url = {
            let session = read(&self.inner.session);
            if options.via_proxy && !session.is_local(subject) {
                session.proxy_url(subject)
            } else {
                subject.to_string()
            }
        };
        debug!(subject, url, "fetching resource");

        let mut resource = Resource::new(subject);
        match self.inner.transport.get_json_ad(&url, subject).await {
            Ok(body) => {
                if let Err(e) = parse_json_ad_resource(&body, &mut resource) {
                    self.report(&e);
                }
            }
            Err(e) => {
                resource.set_error(e.clone());
                self.report(&e);
            }
        }

        let resource = Arc::new(resource);
        let canonical = resource.subject();
        let moved = canonical != subject;
        let written = {
            let mut generations = lock(&self.inner.generations);
            let current = generations.is_current(subject, generation);
            if current {
                let mut resources = write(&self.inner.resources);
                resources.insert(subject.to_string(), Arc::clone(&resource));
                if moved {
                    generations.bump(canonical);
                    resources.insert(canonical.to_string(), Arc::clone(&resource));
                }
            }
            current
        };
        if !written {
            debug!(subject, "discarding superseded fetch result");
            return resource;
        }
        if moved {
            debug!(subject, canonical, "server answered with another @id");
            self.notify_as(subject, &resource);
        }
        self.notify(&resource);
        resource
    }
}

// --- lock helpers ------------------------------------------------------------

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// --- tests -------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use atomicdata::urls::properties::DESCRIPTION;
    use atomicdata::Value;
    use std::sync::atomic::{AtomicUsize, Ordering};

    // Nothing listens here; fetches fail fast with a connection error.
    const BASE: &str = "http://127.0.0.1:9";

    fn store() -> Store {
        Store::new(BASE).unwrap()
    }

    fn counting_callback() -> (Arc<AtomicUsize>, Callback) {
        let hits = Arc::new(AtomicUsize::new(0));
        let h = Arc::clone(&hits);
        let cb: Callback = Arc::new(move |_: &Arc<Resource>| {
            h.fetch_add(1, Ordering::SeqCst);
        });
        (hits, cb)
    }

    #[tokio::test]
    async fn get_resource_loading_returns_same_placeholder() {
        let store = store();
        let subject = format!("{BASE}/things/1");
        let first = store.get_resource_loading(&subject);
        let second = store.get_resource_loading(&subject);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.status(), ResourceStatus::Loading);
    }

    #[test]
    fn get_resource_loading_without_runtime_still_returns_placeholder() {
        let store = store();
        let r = store.get_resource_loading("https://example.com/x");
        assert_eq!(r.status(), ResourceStatus::Loading);
        assert!(store.cached("https://example.com/x").is_some());
    }

    #[test]
    fn subscriber_called_once_per_add_until_unsubscribed() {
        let store = store();
        let subject = "https://example.com/things/1";
        let (hits, cb) = counting_callback();
        store.subscribe(subject, Arc::clone(&cb));

        store.add_resource(Resource::new_local(subject));
        assert_eq!(hits.load(Ordering::SeqCst), 1);

        store.unsubscribe(subject, &cb);
        store.add_resource(Resource::new_local(subject));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn notify_passes_new_resource() {
        let store = store();
        let subject = "https://example.com/things/2";
        let seen = Arc::new(Mutex::new(None));
        let s = Arc::clone(&seen);
        store.subscribe(
            subject,
            Arc::new(move |r: &Arc<Resource>| {
                *s.lock().unwrap() = r.get(DESCRIPTION).cloned();
            }),
        );

        let mut resource = Resource::new_local(subject);
        resource.set_unsafe(DESCRIPTION, Value::from("fresh"));
        store.add_resource(resource);
        assert_eq!(*seen.lock().unwrap(), Some(Value::from("fresh")));
    }

    #[test]
    fn notify_without_subscribers_is_a_no_op() {
        let store = store();
        store.notify(&Arc::new(Resource::new_local("https://example.com/lonely")));
    }

    #[test]
    fn callback_unsubscribing_itself_does_not_skip_others() {
        let store = store();
        let subject = "https://example.com/things/3";
        let (hits, counter) = counting_callback();

        let slot: Arc<Mutex<Option<Callback>>> = Arc::new(Mutex::new(None));
        let store_handle = store.clone();
        let slot_handle = Arc::clone(&slot);
        let self_removing: Callback = Arc::new(move |r: &Arc<Resource>| {
            if let Some(me) = slot_handle.lock().unwrap().as_ref() {
                store_handle.unsubscribe(r.subject(), me);
            }
        });
        *slot.lock().unwrap() = Some(Arc::clone(&self_removing));

        store.subscribe(subject, self_removing);
        store.subscribe(subject, counter);
        store.add_resource(Resource::new_local(subject));

        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(store.subscriber_count(subject), 1);
    }

    #[test]
    fn remove_resource_clears_slot() {
        let store = store();
        let subject = "https://example.com/things/4";
        store.add_resource(Resource::new_local(subject));
        assert!(store.remove_resource(subject).is_some());
        assert!(store.cached(subject).is_none());
    }

    #[tokio::test]
    async fn remove_resource_forgets_generation_and_voids_pending_fetch() {
        let store = store();
        let subject = format!("{BASE}/things/7");
        let pending = lock(&store.inner.generations).bump(&subject);

        store.remove_resource(&subject);
        assert!(!lock(&store.inner.generations).latest.contains_key(&subject));

        store.fetch_under(&subject, FetchOptions::default(), pending).await;
        assert!(store.cached(&subject).is_none());
    }

    #[test]
    fn base_url_validation() {
        let store = store();
        assert!(store.set_base_url("https://atomicdata.dev/").is_err());
        assert!(store.set_base_url("nope").is_err());
        store.set_base_url("https://atomicdata.dev").unwrap();
        assert_eq!(store.get_base_url(), "https://atomicdata.dev");
    }

    #[test]
    fn create_subject_is_under_base_url() {
        let store = store();
        let a = store.create_subject();
        let b = store.create_subject();
        assert!(a.starts_with(&format!("{BASE}/")));
        assert_ne!(a, b);
    }

    #[test]
    fn report_reaches_error_handler() {
        let store = store();
        let (hits, _) = counting_callback();
        let h = Arc::clone(&hits);
        store.set_error_handler(Arc::new(move |_: &ClientError| {
            h.fetch_add(1, Ordering::SeqCst);
        }));
        store.report(&ClientError::NoAgent);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn unreachable_server_captures_error_on_resource() {
        let store = store();
        let subject = format!("{BASE}/things/5");
        let r = store.fetch_resource(&subject, FetchOptions::default()).await;
        assert_eq!(r.status(), ResourceStatus::Error);
        assert!(matches!(r.error(), Some(ClientError::Network { .. })));
    }

    #[tokio::test]
    async fn superseded_fetch_does_not_overwrite_cache() {
        let store = store();
        let subject = format!("{BASE}/things/6");
        let stale = lock(&store.inner.generations).bump(&subject);

        let mut newer = Resource::new_local(subject.clone());
        newer.set_unsafe(DESCRIPTION, Value::from("newer"));
        store.add_resource(newer);

        let fetched = store.fetch_under(&subject, FetchOptions::default(), stale).await;
        assert_eq!(fetched.status(), ResourceStatus::Error);
        let cached = store.cached(&subject).unwrap();
        assert_eq!(cached.get(DESCRIPTION), Some(&Value::from("newer")));
    }

    #[tokio::test]
    async fn save_without_agent_fails() {
        let store = store();
        let mut r = Resource::new_local(store.create_subject());
        assert_eq!(r.save(&store).await, Err(ClientError::NoAgent));
    }
}

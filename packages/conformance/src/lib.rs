//! Shared helpers for the Atomic Data client end-to-end tests.
//!
//! Provides [`spawn_server`]: an in-process Atomic server stand-in bound to an
//! ephemeral port. It serves JSON-AD for every resource it holds, proxies
//! lookups through `/path?subject=`, and accepts commits at `/commit` after
//! checking their signatures against the signer's registered public key.
//! Tests seed data directly through the returned [`MockServer`] handle.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use atomicdata::urls::{properties, JSON_AD_MEDIA_TYPE};
use atomicdata::{verify_commit, Commit};
use atomicdata_agent::Agent;
use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use serde::Deserialize;
use serde_json::{Map, Value as Json};

type Propvals = Map<String, Json>;

/// State of the mock server, shared between the HTTP handlers and the test.
pub struct MockServer {
    base_url: String,
    resources: Mutex<HashMap<String, Propvals>>,
    commits: Mutex<Vec<Commit>>,
    gets: AtomicUsize,
    reject_commits: AtomicBool,
}

impl MockServer {
    fn new(base_url: String) -> Self {
        Self {
            base_url,
            resources: Mutex::new(HashMap::new()),
            commits: Mutex::new(Vec::new()),
            gets: AtomicUsize::new(0),
            reject_commits: AtomicBool::new(false),
        }
    }

    /// e.g. `http://127.0.0.1:51234`, no trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `{base_url}/{path}`
    pub fn subject(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Store `propvals` under `subject`, replacing what was there. An `@id`
    /// in `propvals` is served as-is instead of `subject`.
    pub fn put_resource(&self, subject: &str, propvals: Json) {
        let propvals = match propvals {
            Json::Object(map) => map,
            other => panic!("resource body must be an object, got {other}"),
        };
        self.resources_mut().insert(subject.to_string(), propvals);
    }

    /// Define a property at `{base_url}/properties/{shortname}`.
    pub fn put_property(&self, shortname: &str, datatype: &str) -> String {
        let subject = self.subject(&format!("properties/{shortname}"));
        let mut propvals = Propvals::new();
        propvals.insert(properties::SHORTNAME.into(), shortname.into());
        propvals.insert(properties::DATATYPE.into(), datatype.into());
        propvals.insert(
            properties::DESCRIPTION.into(),
            format!("The {shortname} of a thing").into(),
        );
        self.resources_mut().insert(subject.clone(), propvals);
        subject
    }

    /// Publish the agent's public key so its commits verify. Returns the
    /// agent's subject.
    pub fn register_agent(&self, agent: &Agent) -> String {
        let subject = self.subject(&format!("agents/{}", agent.public_key()));
        let mut propvals = Propvals::new();
        propvals.insert(properties::PUBLIC_KEY.into(), agent.public_key().into());
        self.resources_mut().insert(subject.clone(), propvals);
        subject
    }

    pub fn resource(&self, subject: &str) -> Option<Propvals> {
        self.resources_mut().get(subject).cloned()
    }

    /// Every commit accepted so far, in arrival order.
    pub fn commits(&self) -> Vec<Commit> {
        self.commits
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of resource `GET`s served, including 404s.
    pub fn get_count(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    /// Make `/commit` answer 500 until switched back.
    pub fn reject_commits(&self, reject: bool) {
        self.reject_commits.store(reject, Ordering::SeqCst);
    }

    fn resources_mut(&self) -> std::sync::MutexGuard<'_, HashMap<String, Propvals>> {
        self.resources.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn serve(&self, subject: &str) -> Response {
        self.gets.fetch_add(1, Ordering::SeqCst);
        let Some(mut propvals) = self.resource(subject) else {
            return (StatusCode::NOT_FOUND, format!("Resource not found: {subject}")).into_response();
        };
        propvals.entry("@id").or_insert_with(|| subject.into());
        (
            [(header::CONTENT_TYPE, JSON_AD_MEDIA_TYPE)],
            Json::Object(propvals).to_string(),
        )
            .into_response()
    }

    fn accept(&self, body: &str) -> Result<(), (StatusCode, String)> {
        if self.reject_commits.load(Ordering::SeqCst) {
            return Err((StatusCode::INTERNAL_SERVER_ERROR, "commits are disabled".into()));
        }
        let commit = Commit::from_json_ad(body).map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;

        let public_key = self
            .resource(&commit.signer)
            .and_then(|agent| agent.get(properties::PUBLIC_KEY).cloned())
            .and_then(|key| key.as_str().map(str::to_string))
            .ok_or_else(|| (StatusCode::UNAUTHORIZED, format!("unknown signer {}", commit.signer)))?;
        verify_commit(&commit, &public_key).map_err(|e| (StatusCode::UNAUTHORIZED, e.to_string()))?;

        {
            let mut resources = self.resources_mut();
            if commit.destroy {
                resources.remove(&commit.subject);
            } else {
                let target = resources.entry(commit.subject.clone()).or_default();
                for (property, value) in &commit.set {
                    target.insert(property.clone(), value.clone());
                }
                for property in &commit.remove {
                    target.remove(property);
                }
            }
        }
        self.commits
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(commit);
        Ok(())
    }
}

#[derive(Deserialize)]
struct ProxyQuery {
    subject: String,
}

async fn get_resource(State(server): State<Arc<MockServer>>, Path(rest): Path<String>) -> Response {
    let subject = server.subject(&rest);
    server.serve(&subject)
}

async fn get_proxied(State(server): State<Arc<MockServer>>, Query(q): Query<ProxyQuery>) -> Response {
    server.serve(&q.subject)
}

async fn post_commit(State(server): State<Arc<MockServer>>, body: String) -> Response {
    match server.accept(&body) {
        Ok(()) => (StatusCode::OK, "commit applied").into_response(),
        Err(rejection) => rejection.into_response(),
    }
}

/// Start an ephemeral mock server and return its shared state.
///
/// The server runs in a background `tokio` task bound to an OS-assigned port
/// on `127.0.0.1`.
///
/// # Panics
///
/// Panics if the TCP listener cannot be bound or the server fails to start.
pub async fn spawn_server() -> Arc<MockServer> {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral port");
    let addr = listener.local_addr().expect("get local addr");
    let server = Arc::new(MockServer::new(format!("http://{addr}")));

    let router = Router::new()
        .route("/commit", post(post_commit))
        .route("/path", get(get_proxied))
        .route("/{*rest}", get(get_resource))
        .with_state(Arc::clone(&server));

    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("mock server error");
    });

    server
}

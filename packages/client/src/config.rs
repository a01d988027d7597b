//! Store configuration, populated from environment variables.

/// Runtime configuration for a [`Store`](crate::Store).
///
/// | Variable | Default | Description |
/// |----------|---------|-------------|
/// | `ATOMIC_BASE_URL` | `http://localhost:9883` | Server base URL, no trailing slash |
/// | `ATOMIC_AGENT_SECRET` | (absent) | Agent secret used to sign commits |
/// | `ATOMIC_REQUEST_TIMEOUT_SECS` | (absent = no timeout) | Per-request HTTP timeout |
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Base URL of the Atomic server, e.g. `"https://atomicdata.dev"`.
    pub base_url: String,

    /// Base64 agent secret. `None` means the store starts without an agent
    /// and can read but not write.
    pub agent_secret: Option<String>,

    /// HTTP timeout in seconds. `None` leaves requests unbounded.
    pub request_timeout_secs: Option<u64>,
}

pub const DEFAULT_BASE_URL: &str = "http://localhost:9883";

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.into(),
            agent_secret: None,
            request_timeout_secs: None,
        }
    }
}

impl StoreConfig {
    /// Populate config from environment variables, applying defaults where absent.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let request_timeout_secs = lookup("ATOMIC_REQUEST_TIMEOUT_SECS")
            .and_then(|v| v.parse::<u64>().ok())
            .filter(|secs| *secs > 0);

        Self {
            base_url: lookup("ATOMIC_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.into()),
            agent_secret: lookup("ATOMIC_AGENT_SECRET").filter(|s| !s.trim().is_empty()),
            request_timeout_secs,
        }
    }
}

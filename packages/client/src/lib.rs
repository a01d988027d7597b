//! Async Atomic Data client layer.
//!
//! A [`Store`] caches [`Resource`]s by subject, fetches them as JSON-AD,
//! notifies subscribers when a subject changes, and posts signed commits for
//! local edits. Values are validated against their property's datatype before
//! they enter a diff.
//!
//! # Crate layout
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`store`] | Cache, background fetches, subscriptions, commit posting |
//! | [`resource`] | One subject's values plus its pending diff |
//! | [`property`] | Property definitions resolved from resources |
//! | [`parse`] | JSON-AD text into a [`Resource`] |
//! | [`config`] | [`StoreConfig`] from environment variables |
//! | [`error`] | [`ClientError`] |
//! | [`logging`] | `tracing` subscriber setup for binaries and tests |
//!
//! # Example
//!
//! ```rust,ignore
//! use atomicdata_client::{Store, StoreConfig};
//!
//! let store = Store::from_config(&StoreConfig::from_env())?;
//! let mut thing = store.get_resource_async("https://atomicdata.dev/things/1").await.as_ref().clone();
//! thing.set_validate(atomicdata::urls::properties::DESCRIPTION, "hello".into(), &store).await?;
//! thing.save(&store).await?;
//! ```

pub mod config;
pub mod error;
pub mod logging;
pub mod parse;
pub mod property;
pub mod resource;
pub mod store;

pub use config::StoreConfig;
pub use error::ClientError;
pub use parse::parse_json_ad_resource;
pub use property::Property;
pub use resource::{Resource, ResourceStatus};
pub use store::{Callback, ErrorHandler, FetchOptions, Store};

//! Versioned request/response stores.
//!
//! The engine only talks to the `CacheStorage` trait. `CacheDb` is the
//! SQLite-backed implementation:
//!
//! - Named stores created on first open
//! - Entries keyed by SHA-256 of the request URL
//! - Insertion order preserved for eviction
//! - Atomic bulk insert for install
//! - WAL mode for concurrent access

pub mod connection;
pub mod eviction;
pub mod hash;
pub mod migrations;
pub mod stores;
pub mod version;

use async_trait::async_trait;

pub use crate::Error;
use crate::net::{Request, Response};

pub use connection::CacheDb;
pub use eviction::enforce_limit;
pub use version::VersionRegistry;

/// Store adapter consumed by the worker.
///
/// Every operation addresses a store by name. Writes to a store that does not
/// exist yet create it, as `open` does.
#[async_trait]
pub trait CacheStorage: Send + Sync {
    /// Create the store if absent.
    async fn open(&self, store: &str) -> Result<(), Error>;

    /// Insert every pair or none of them.
    async fn put_all(&self, store: &str, entries: Vec<(Request, Response)>) -> Result<(), Error>;

    /// Insert or replace one entry. A replaced entry becomes the newest.
    async fn put(&self, store: &str, request: &Request, response: &Response) -> Result<(), Error>;

    /// Look up `request` in one store.
    async fn match_in(&self, store: &str, request: &Request) -> Result<Option<Response>, Error>;

    /// Look up `request` across every store; first match wins.
    async fn match_any(&self, request: &Request) -> Result<Option<Response>, Error>;

    /// Keys of one store, oldest first. Empty when the store does not exist.
    async fn keys(&self, store: &str) -> Result<Vec<Request>, Error>;

    /// Remove one entry. Returns whether anything was removed.
    async fn delete(&self, store: &str, request: &Request) -> Result<bool, Error>;

    /// Remove a whole store. Returns whether it existed.
    async fn delete_store(&self, store: &str) -> Result<bool, Error>;

    /// Names of all stores in creation order.
    async fn store_names(&self) -> Result<Vec<String>, Error>;
}

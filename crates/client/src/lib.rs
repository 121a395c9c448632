//! Network-side implementations for stash.
//!
//! This crate provides the reqwest-backed fetch transport the worker uses in
//! production, and the HTTP update check behind CHECK_UPDATE.

pub mod fetch;
pub mod update;

pub use fetch::{FetchClient, FetchConfig};
pub use update::RemoteUpdateCheck;

//! Core types and the cache-strategy engine for stash.
//!
//! This crate provides:
//! - Request/response value types and the `Network` seam
//! - Versioned cache stores with a SQLite backend
//! - The worker engine (classification, strategies, lifecycle, control messages)
//! - Unified error types and configuration

pub mod cache;
pub mod config;
pub mod error;
pub mod net;
pub mod worker;

pub use cache::{CacheDb, CacheStorage, VersionRegistry};
pub use config::AppConfig;
pub use error::Error;
pub use net::{Network, Request, RequestMode, Response};
pub use worker::{Event, EventOutcome, FetchOutcome, Worker, WorkerState};

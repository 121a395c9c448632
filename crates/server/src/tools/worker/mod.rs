//! Worker-facing tools: intercept a fetch, drive the lifecycle, post a
//! control message.

pub mod fetch;
pub mod lifecycle;
pub mod message;

pub use fetch::{SwFetchParams, fetch_impl};
pub use lifecycle::{SwLifecycleParams, lifecycle_impl};
pub use message::{SwMessageParams, message_impl};

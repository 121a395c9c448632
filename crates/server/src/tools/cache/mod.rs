//! Store inspection tools.

pub mod lookup;
pub mod stores;

pub use lookup::{CacheMatchParams, match_impl};
pub use stores::stores_impl;

//! Query result caching for entity stores.
//!
//! This module provides the memoization used by store lookups:
//! - Keys cover every query parameter and hash to fixed-length strings
//! - Results are served cache-first with no TTL
//! - Any confirmed mutation clears the cache wholesale

mod key;
mod query_cache;
mod traits;

pub use key::QueryKey;
pub use query_cache::{CachedQuery, QueryCache};
pub use traits::{CacheResult, CacheSource};

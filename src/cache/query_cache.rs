//! In-memory query result cache owned by a store snapshot.

use chrono::{DateTime, Utc};
use std::collections::HashMap;

use super::key::QueryKey;

/// A memoized query result.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedQuery<R> {
  /// The cached records in order
  pub entities: Vec<R>,
  /// When the result was stored
  pub cached_at: DateTime<Utc>,
  /// Human-readable query label for logs
  pub description: String,
}

/// Query cache with wholesale invalidation.
///
/// Entries never expire on their own. Any confirmed mutation clears the
/// whole map and bumps `epoch`; results fetched under an older epoch are
/// refused by `insert_at`.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryCache<R> {
  entries: HashMap<String, CachedQuery<R>>,
  epoch: u64,
}

impl<R> Default for QueryCache<R> {
  fn default() -> Self {
    Self {
      entries: HashMap::new(),
      epoch: 0,
    }
  }
}

impl<R: Clone> QueryCache<R> {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn get(&self, key: &QueryKey) -> Option<&CachedQuery<R>> {
    self.entries.get(&key.cache_hash())
  }

  pub fn contains(&self, key: &QueryKey) -> bool {
    self.entries.contains_key(&key.cache_hash())
  }

  pub fn insert(&mut self, key: &QueryKey, entities: Vec<R>) {
    self.entries.insert(
      key.cache_hash(),
      CachedQuery {
        entities,
        cached_at: Utc::now(),
        description: key.description(),
      },
    );
  }

  /// Insert only if no invalidation happened since `epoch` was read.
  ///
  /// Returns whether the entry was stored.
  pub fn insert_at(&mut self, epoch: u64, key: &QueryKey, entities: Vec<R>) -> bool {
    if epoch != self.epoch {
      return false;
    }
    self.insert(key, entities);
    true
  }

  pub fn clear(&mut self) {
    self.entries.clear();
    self.epoch += 1;
  }

  pub fn epoch(&self) -> u64 {
    self.epoch
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }
}

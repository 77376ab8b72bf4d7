//! Derived computations over store collections.
//!
//! Everything here is a pure function of the records it is given, so views
//! stay consistent with whatever snapshot they were computed from.

use rust_decimal::Decimal;
use std::cmp::Reverse;
use std::collections::BTreeMap;
use tokio::sync::watch;

use crate::record::{Amounted, Dated, Named, Record};
use crate::store::Snapshot;

/// Sum of amounts.
pub fn total<R: Amounted>(items: &[R]) -> Decimal {
  items.iter().map(Amounted::amount).sum()
}

/// Sum of amounts grouped by `key` (e.g., category name).
pub fn totals_by<R, K, F>(items: &[R], key: F) -> BTreeMap<K, Decimal>
where
  R: Amounted,
  K: Ord,
  F: Fn(&R) -> K,
{
  let mut totals = BTreeMap::new();
  for item in items {
    *totals.entry(key(item)).or_insert(Decimal::ZERO) += item.amount();
  }
  totals
}

/// The `n` most recent records, newest first. Ties keep collection order.
pub fn recent<R: Dated + Clone>(items: &[R], n: usize) -> Vec<R> {
  let mut sorted = items.to_vec();
  sorted.sort_by_key(|r| Reverse(r.date()));
  sorted.truncate(n);
  sorted
}

/// Case-insensitive substring match over each record's search text.
pub fn filter_by_text<R: Record>(items: &[R], term: &str) -> Vec<R> {
  let term = term.trim().to_lowercase();
  if term.is_empty() {
    return items.to_vec();
  }
  items
    .iter()
    .filter(|r| r.search_text().to_lowercase().contains(&term))
    .cloned()
    .collect()
}

pub fn sorted_by_name<R: Named + Clone>(items: &[R]) -> Vec<R> {
  let mut sorted = items.to_vec();
  sorted.sort_by_cached_key(|r| r.name().to_lowercase());
  sorted
}

/// A computation over a store's collection that is redone only after the
/// store publishes a new snapshot.
pub struct Derived<R, T> {
  source: watch::Receiver<Snapshot<R>>,
  compute: Box<dyn Fn(&[R]) -> T + Send + Sync>,
  value: Option<T>,
}

impl<R: Record, T> Derived<R, T> {
  pub fn new(
    source: watch::Receiver<Snapshot<R>>,
    compute: impl Fn(&[R]) -> T + Send + Sync + 'static,
  ) -> Self {
    Self {
      source,
      compute: Box::new(compute),
      value: None,
    }
  }

  /// Current value, recomputed if the snapshot changed since last read.
  pub fn get(&mut self) -> &T {
    // A closed channel means the store is gone; keep serving the last value
    let stale = self.source.has_changed().unwrap_or(false);
    let value = match self.value.take() {
      Some(value) if !stale => value,
      _ => {
        let snapshot = self.source.borrow_and_update();
        (self.compute)(&snapshot.items)
      }
    };
    self.value.insert(value)
  }
}

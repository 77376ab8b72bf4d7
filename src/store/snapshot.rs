use chrono::{DateTime, Utc};
use std::collections::BTreeSet;

use crate::cache::QueryCache;
use crate::query::{QueryDescriptor, SortDirection};
use crate::record::{Placement, Record};

/// Complete state of one store at a point in time.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot<R> {
  /// The mirrored collection in display order
  pub items: Vec<R>,
  /// Server count for the current query, adjusted locally while mutations
  /// are in flight
  pub total_count: usize,
  /// A paginated load is in flight
  pub loading: bool,
  /// Latest user-facing error; cleared only by `EntityStore::clear_error`
  pub error: Option<String>,
  /// When the store last heard a success from the server
  pub last_synced: Option<DateTime<Utc>>,
  /// Descriptor of the current page
  pub query: QueryDescriptor,
  pub cache: QueryCache<R>,
  /// Identifiers with an optimistic mutation awaiting the server
  pub pending: BTreeSet<String>,
}

impl<R> Default for Snapshot<R> {
  fn default() -> Self {
    Self {
      items: Vec::new(),
      total_count: 0,
      loading: false,
      error: None,
      last_synced: None,
      query: QueryDescriptor::default(),
      cache: QueryCache::default(),
      pending: BTreeSet::new(),
    }
  }
}

impl<R: Record> Snapshot<R> {
  pub fn get(&self, id: &str) -> Option<&R> {
    self.items.iter().find(|r| r.id() == id)
  }

  pub(crate) fn get_mut(&mut self, id: &str) -> Option<&mut R> {
    self.items.iter_mut().find(|r| r.id() == id)
  }

  pub(crate) fn position(&self, id: &str) -> Option<usize> {
    self.items.iter().position(|r| r.id() == id)
  }

  /// Placement under the current sort. Name-ordered collections keep their
  /// alphabetical slot only while the page is unsorted or sorted by name
  /// ascending; any other server order falls back to head insertion.
  fn placement(&self) -> Placement {
    match (R::placement(), &self.query.sort) {
      (Placement::Alphabetical, Some(sort))
        if !(sort.column == "name" && sort.direction == SortDirection::Asc) =>
      {
        Placement::Head
      }
      (placement, _) => placement,
    }
  }

  /// Insert a new record where its placement puts it.
  pub(crate) fn place(&mut self, record: R) {
    match self.placement() {
      Placement::Head => self.items.insert(0, record),
      Placement::Tail => self.items.push(record),
      Placement::Alphabetical => {
        let key = record.sort_key();
        let index = self
          .items
          .iter()
          .position(|r| r.sort_key() > key)
          .unwrap_or(self.items.len());
        self.items.insert(index, record);
      }
    }
  }

  /// Put back a record removed from `index`.
  pub(crate) fn restore(&mut self, index: usize, record: R) {
    match self.placement() {
      Placement::Alphabetical => {
        self.items.push(record);
        self.items.sort_by_cached_key(|r| r.sort_key());
      }
      Placement::Head | Placement::Tail => {
        let index = index.min(self.items.len());
        self.items.insert(index, record);
      }
    }
  }
}

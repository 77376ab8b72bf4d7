//! Pagination, search and sort parameters for collection loads.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Extra entity-specific filter parameters (e.g., `categoryId`).
///
/// Ordered so that equal filter sets always render the same cache key.
pub type Filters = BTreeMap<String, String>;

pub const DEFAULT_PAGE_SIZE: usize = 20;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
  #[default]
  Asc,
  Desc,
}

impl SortDirection {
  pub fn as_str(&self) -> &'static str {
    match self {
      SortDirection::Asc => "asc",
      SortDirection::Desc => "desc",
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Sort {
  pub column: String,
  pub direction: SortDirection,
}

/// Describes one page of a server collection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryDescriptor {
  /// Zero-based page index
  pub page: usize,
  pub page_size: usize,
  /// Free-text search term; empty means no filtering
  #[serde(default)]
  pub search: String,
  #[serde(default)]
  pub sort: Option<Sort>,
}

impl Default for QueryDescriptor {
  fn default() -> Self {
    Self {
      page: 0,
      page_size: DEFAULT_PAGE_SIZE,
      search: String::new(),
      sort: None,
    }
  }
}

impl QueryDescriptor {
  pub fn new(page: usize, page_size: usize) -> Self {
    Self {
      page,
      page_size,
      ..Self::default()
    }
  }

  pub fn with_page(mut self, page: usize) -> Self {
    self.page = page;
    self
  }

  pub fn with_search(mut self, search: impl Into<String>) -> Self {
    self.search = search.into();
    self
  }

  pub fn with_sort(mut self, column: impl Into<String>, direction: SortDirection) -> Self {
    self.sort = Some(Sort {
      column: column.into(),
      direction,
    });
    self
  }

  /// Index of the first record on this page.
  pub fn offset(&self) -> usize {
    self.page * self.page_size
  }
}

/// One page of records plus the authoritative server count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<R> {
  pub items: Vec<R>,
  pub total_count: usize,
}

impl<R> Page<R> {
  pub fn new(items: Vec<R>, total_count: usize) -> Self {
    Self { items, total_count }
  }
}

//! Cache keys for store queries.

use sha2::{Digest, Sha256};

use crate::query::{Filters, QueryDescriptor};

/// Every query a store can memoize.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum QueryKey {
  /// A paginated collection load
  Page(QueryDescriptor),
  /// A free-text lookup with its limit and extra filters
  Search {
    term: String,
    limit: usize,
    filters: Filters,
  },
  /// The most recent `limit` records
  Recent { limit: usize },
}

impl QueryKey {
  /// Stable, fixed-length key covering every parameter of the query. Terms
  /// are keyed exactly as they are sent to the server.
  pub fn cache_hash(&self) -> String {
    let input = match self {
      Self::Page(q) => {
        let sort = q
          .sort
          .as_ref()
          .map(|s| format!("{}:{}", s.column, s.direction.as_str()))
          .unwrap_or_default();
        format!(
          "page:{}:{}:{}:{}",
          q.page,
          q.page_size,
          q.search,
          sort
        )
      }
      Self::Search {
        term,
        limit,
        filters,
      } => format!(
        "search:{}:{}:{}",
        term,
        limit,
        render_filters(filters)
      ),
      Self::Recent { limit } => format!("recent:{}", limit),
    };

    // SHA256 hash for stable, fixed-length keys
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
  }

  pub fn description(&self) -> String {
    match self {
      Self::Page(q) => {
        if q.search.is_empty() {
          format!("page {} (size {})", q.page, q.page_size)
        } else {
          format!("page {} (size {}) matching '{}'", q.page, q.page_size, q.search)
        }
      }
      Self::Search {
        term,
        limit,
        filters,
      } => {
        if filters.is_empty() {
          format!("search '{}' limit {}", term, limit)
        } else {
          format!(
            "search '{}' limit {} [{}]",
            term,
            limit,
            render_filters(filters)
          )
        }
      }
      Self::Recent { limit } => format!("{} most recent", limit),
    }
  }
}

fn render_filters(filters: &Filters) -> String {
  filters
    .iter()
    .map(|(k, v)| format!("{}={}", k, v))
    .collect::<Vec<_>>()
    .join("&")
}

//! Read paths: paginated loads with latest-wins supersession, and cache-first
//! lookups.

use chrono::Utc;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info, warn};

use super::EntityStore;
use crate::cache::{CacheResult, QueryKey};
use crate::error::StoreError;
use crate::gateway::{Response, SearchPayload};
use crate::query::{Filters, QueryDescriptor, SortDirection};
use crate::record::Record;

/// What became of a paginated load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
  /// The page replaced the collection
  Applied,
  /// A newer load was issued while this one was in flight; its result was
  /// dropped
  Superseded,
  /// The gateway failed; the error slot holds the message
  Failed,
}

/// Tickets for paginated loads. Only the most recently issued ticket may
/// write its result, so a slow stale response can never overwrite a newer
/// one. The in-flight request itself is not cancelled.
#[derive(Debug, Default)]
pub(super) struct LoadGate {
  latest: AtomicU64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct LoadTicket(u64);

impl LoadGate {
  pub(super) fn issue(&self) -> LoadTicket {
    LoadTicket(self.latest.fetch_add(1, Ordering::SeqCst) + 1)
  }

  pub(super) fn is_current(&self, ticket: LoadTicket) -> bool {
    self.latest.load(Ordering::SeqCst) == ticket.0
  }
}

impl<R: Record> EntityStore<R> {
  /// Load one page, replacing the collection and the authoritative count.
  ///
  /// Failures are recorded in the error slot rather than returned.
  pub async fn load_paginated(&self, query: QueryDescriptor) -> LoadOutcome {
    let ticket = self.loads.issue();
    let key = QueryKey::Page(query.clone());

    let mut epoch = 0;
    self.state.send_modify(|s| {
      s.loading = true;
      if s.query != query {
        // A different page/search/sort invalidates everything memoized
        s.cache.clear();
        s.query = query.clone();
      }
      epoch = s.cache.epoch();
    });
    debug!(entity = R::entity_type(), query = %key.description(), "loading");

    let result = self.gateway.list(&query).await;

    if !self.loads.is_current(ticket) {
      debug!(entity = R::entity_type(), query = %key.description(), "load superseded");
      return LoadOutcome::Superseded;
    }

    match result {
      Ok(page) => {
        info!(
          entity = R::entity_type(),
          query = %key.description(),
          items = page.items.len(),
          total = page.total_count,
          "page loaded"
        );
        self.state.send_modify(|s| {
          s.cache.insert_at(epoch, &key, page.items.clone());
          s.items = page.items;
          s.total_count = page.total_count;
          s.loading = false;
          s.last_synced = Some(Utc::now());
        });
        LoadOutcome::Applied
      }
      Err(error) => {
        warn!(entity = R::entity_type(), %error, "load failed");
        let message = error.user_message(&format!(
          "Could not load {}. Please try again.",
          Self::collection_label()
        ));
        self.state.send_modify(|s| s.loading = false);
        self.report(message);
        LoadOutcome::Failed
      }
    }
  }

  /// Reload the current descriptor.
  pub async fn reload(&self) -> LoadOutcome {
    self.load_paginated(self.query()).await
  }

  pub async fn set_page(&self, page: usize) -> LoadOutcome {
    self.load_paginated(self.query().with_page(page)).await
  }

  /// New search term; restarts at the first page.
  pub async fn set_search(&self, term: &str) -> LoadOutcome {
    self
      .load_paginated(self.query().with_page(0).with_search(term))
      .await
  }

  pub async fn set_sort(&self, column: &str, direction: SortDirection) -> LoadOutcome {
    self
      .load_paginated(self.query().with_sort(column, direction))
      .await
  }

  /// Cache-first free-text lookup. Failures yield an empty list and are
  /// recorded in the error slot.
  pub async fn search(&self, term: &str, limit: usize, filters: &Filters) -> Vec<R> {
    let key = QueryKey::Search {
      term: term.to_string(),
      limit,
      filters: filters.clone(),
    };
    let result = self
      .lookup(key, self.gateway.search(term, limit, filters))
      .await;
    debug!(
      entity = R::entity_type(),
      term,
      hit = result.is_hit(),
      found = result.data.len(),
      "search"
    );
    result.data
  }

  /// Cache-first fetch of the `limit` most recent records.
  pub async fn recent(&self, limit: usize) -> Vec<R> {
    let result = self
      .lookup(QueryKey::Recent { limit }, self.gateway.recent(limit))
      .await;
    debug!(entity = R::entity_type(), limit, hit = result.is_hit(), "recent");
    result.data
  }

  async fn lookup<F>(&self, key: QueryKey, fetch: F) -> CacheResult<Vec<R>>
  where
    F: Future<Output = Result<Response<SearchPayload<R>>, StoreError>>,
  {
    let (hit, epoch) = {
      let state = self.state.borrow();
      let hit = state
        .cache
        .get(&key)
        .map(|cached| (cached.entities.clone(), cached.cached_at));
      (hit, state.cache.epoch())
    };

    if let Some((entities, cached_at)) = hit {
      return CacheResult::from_cache(entities, cached_at);
    }

    match fetch.await.and_then(Response::into_result) {
      Ok(payload) => {
        let items = payload.into_items();
        let stored = self
          .state
          .send_if_modified(|s| s.cache.insert_at(epoch, &key, items.clone()));
        if !stored {
          debug!(entity = R::entity_type(), query = %key.description(), "cache invalidated during fetch");
        }
        CacheResult::from_network(items)
      }
      Err(error) => {
        warn!(entity = R::entity_type(), query = %key.description(), %error, "lookup failed");
        self.report(error.user_message(&format!(
          "Could not search {}. Please try again.",
          Self::collection_label()
        )));
        CacheResult::from_network(Vec::new())
      }
    }
  }
}

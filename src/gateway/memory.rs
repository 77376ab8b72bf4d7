use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use tracing::trace;

use super::envelope::{ApiError, Envelope, Response, SearchPayload};
use super::Gateway;
use crate::error::StoreError;
use crate::query::{Filters, Page, QueryDescriptor};
use crate::record::Record;
use crate::resolver::Resolvers;

/// Gateway methods, for call counting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Call {
  List,
  Create,
  Update,
  Delete,
  Search,
  Recent,
}

/// In-process backend holding records in a vector, newest first.
///
/// Behaves like the REST backend for the parts stores rely on: it assigns
/// identifiers on create, applies patches, paginates and substring-filters
/// lists. Sort parameters and extra search filters are accepted but not
/// applied. Knobs simulate the network: an offline switch, queued one-shot
/// failures, latency (globally or per list page) and envelope-shaped replies.
pub struct InMemoryGateway<R> {
  records: Mutex<Vec<R>>,
  next_id: AtomicU64,
  offline: AtomicBool,
  envelopes: AtomicBool,
  failures: Mutex<VecDeque<StoreError>>,
  latency: Mutex<Duration>,
  page_latency: Mutex<HashMap<usize, Duration>>,
  calls: Mutex<HashMap<Call, usize>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
  mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<R: Record> Default for InMemoryGateway<R> {
  fn default() -> Self {
    Self::new()
  }
}

impl<R: Record> InMemoryGateway<R> {
  pub fn new() -> Self {
    Self {
      records: Mutex::new(Vec::new()),
      next_id: AtomicU64::new(1),
      offline: AtomicBool::new(false),
      envelopes: AtomicBool::new(false),
      failures: Mutex::new(VecDeque::new()),
      latency: Mutex::new(Duration::ZERO),
      page_latency: Mutex::new(HashMap::new()),
      calls: Mutex::new(HashMap::new()),
    }
  }

  pub fn with_records(records: Vec<R>) -> Self {
    let gateway = Self::new();
    *lock(&gateway.records) = records;
    gateway
  }

  /// Every call fails with a transport error while offline.
  pub fn set_offline(&self, offline: bool) {
    self.offline.store(offline, Ordering::SeqCst);
  }

  /// The next call (of any kind) fails with `error`.
  pub fn fail_next(&self, error: StoreError) {
    lock(&self.failures).push_back(error);
  }

  /// Answer create/update/search/recent with `Result` envelopes.
  pub fn use_envelopes(&self, enabled: bool) {
    self.envelopes.store(enabled, Ordering::SeqCst);
  }

  pub fn set_latency(&self, latency: Duration) {
    *lock(&self.latency) = latency;
  }

  /// Extra latency for list calls on `page`.
  pub fn set_page_latency(&self, page: usize, latency: Duration) {
    lock(&self.page_latency).insert(page, latency);
  }

  pub fn calls(&self, call: Call) -> usize {
    lock(&self.calls).get(&call).copied().unwrap_or(0)
  }

  pub fn records(&self) -> Vec<R> {
    lock(&self.records).clone()
  }

  /// Count the call, wait out the latency, then apply failure knobs.
  async fn enter(&self, call: Call, extra: Duration) -> Result<(), StoreError> {
    *lock(&self.calls).entry(call).or_insert(0) += 1;

    let latency = *lock(&self.latency) + extra;
    if !latency.is_zero() {
      tokio::time::sleep(latency).await;
    }

    if self.offline.load(Ordering::SeqCst) {
      trace!(?call, "offline");
      return Err(StoreError::Transport("backend unreachable".to_string()));
    }

    match lock(&self.failures).pop_front() {
      Some(error) => Err(error),
      None => Ok(()),
    }
  }

  /// Wrap an outcome in the configured response shape.
  fn respond<T>(&self, outcome: Result<T, StoreError>) -> Result<Response<T>, StoreError> {
    if !self.envelopes.load(Ordering::SeqCst) {
      return outcome.map(Response::Raw);
    }
    match outcome {
      Ok(value) => Ok(Response::Envelope(Envelope::success(value))),
      Err(StoreError::Rejected { code, message, .. }) => Ok(Response::Envelope(Envelope {
        is_success: false,
        value: None,
        error: Some(ApiError { message, code }),
      })),
      Err(other) => Err(other),
    }
  }

  fn not_found(id: &str) -> StoreError {
    StoreError::Rejected {
      status: Some(404),
      code: Some("NOT_FOUND".to_string()),
      message: Some(format!("{} {} does not exist", R::entity_type(), id)),
    }
  }

  fn matching(&self, term: &str) -> Vec<R> {
    let term = term.trim().to_lowercase();
    lock(&self.records)
      .iter()
      .filter(|r| term.is_empty() || r.search_text().to_lowercase().contains(&term))
      .cloned()
      .collect()
  }
}

#[async_trait]
impl<R: Record> Gateway<R> for InMemoryGateway<R> {
  async fn list(&self, query: &QueryDescriptor) -> Result<Page<R>, StoreError> {
    let extra = lock(&self.page_latency)
      .get(&query.page)
      .copied()
      .unwrap_or_default();
    self.enter(Call::List, extra).await?;

    let matching = self.matching(&query.search);
    let total_count = matching.len();
    let items = matching
      .into_iter()
      .skip(query.offset())
      .take(query.page_size)
      .collect();
    Ok(Page::new(items, total_count))
  }

  async fn create(&self, input: &R::Input) -> Result<Response<String>, StoreError> {
    if let Err(e) = self.enter(Call::Create, Duration::ZERO).await {
      return self.respond(Err(e));
    }

    let n = self.next_id.fetch_add(1, Ordering::SeqCst);
    let id = format!("{}-{}", R::resource(), n);
    let record = R::draft(id.clone(), input, &Resolvers::new());
    lock(&self.records).insert(0, record);
    self.respond(Ok(id))
  }

  async fn update(&self, id: &str, patch: &R::Patch) -> Result<Response<String>, StoreError> {
    if let Err(e) = self.enter(Call::Update, Duration::ZERO).await {
      return self.respond(Err(e));
    }

    let outcome = {
      let mut records = lock(&self.records);
      match records.iter_mut().find(|r| r.id() == id) {
        Some(record) => {
          record.merge(patch);
          Ok(id.to_string())
        }
        None => Err(Self::not_found(id)),
      }
    };
    self.respond(outcome)
  }

  async fn delete(&self, id: &str) -> Result<(), StoreError> {
    self.enter(Call::Delete, Duration::ZERO).await?;

    let mut records = lock(&self.records);
    match records.iter().position(|r| r.id() == id) {
      Some(index) => {
        records.remove(index);
        Ok(())
      }
      None => Err(Self::not_found(id)),
    }
  }

  async fn search(
    &self,
    term: &str,
    limit: usize,
    _filters: &Filters,
  ) -> Result<Response<SearchPayload<R>>, StoreError> {
    if let Err(e) = self.enter(Call::Search, Duration::ZERO).await {
      return self.respond(Err(e));
    }

    let mut items = self.matching(term);
    items.truncate(limit);
    self.respond(Ok(SearchPayload::List(items)))
  }

  async fn recent(&self, limit: usize) -> Result<Response<SearchPayload<R>>, StoreError> {
    if let Err(e) = self.enter(Call::Recent, Duration::ZERO).await {
      return self.respond(Err(e));
    }

    let mut items = self.records();
    items.truncate(limit);
    self.respond(Ok(SearchPayload::Paged { items }))
  }
}

//! Optimistic entity store.
//!
//! An `EntityStore<R>` mirrors one server collection. Every mutation follows
//! the same three steps, each snapshot write happening synchronously:
//!
//! 1. apply the change to the snapshot (`Phase::OptimisticApplied`)
//! 2. await the gateway
//! 3. reconcile (`Phase::Confirmed`) or restore the captured state
//!    (`Phase::RolledBack`)
//!
//! The snapshot is never borrowed across an await, so interleaved operations
//! cannot tear each other's read-modify-write. Operations on different
//! identifiers are independent; two updates to the same identifier resolve
//! in response-arrival order.
//!
//! Consumers read through `snapshot()` / `view()` or `subscribe()` to a
//! watch channel that fires on every change.

mod load;
mod mutate;
mod snapshot;

#[cfg(test)]
mod tests;

pub use load::LoadOutcome;
pub use snapshot::Snapshot;

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::debug;

use crate::error::StoreError;
use crate::notify::{Notifier, TracingNotifier};
use crate::query::QueryDescriptor;
use crate::record::{Named, Record, TempIds};
use crate::resolver::{NameResolver, Resolvers};
use crate::gateway::Gateway;

use load::LoadGate;

/// Lifecycle of one optimistic mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
  Idle,
  OptimisticApplied,
  Confirmed,
  RolledBack,
}

pub struct EntityStore<R: Record> {
  gateway: Arc<dyn Gateway<R>>,
  resolvers: Resolvers,
  notifier: Arc<dyn Notifier>,
  state: watch::Sender<Snapshot<R>>,
  loads: LoadGate,
  temp_ids: TempIds,
}

impl<R: Record> EntityStore<R> {
  pub fn new(gateway: Arc<dyn Gateway<R>>) -> Self {
    let (state, _) = watch::channel(Snapshot::default());
    Self {
      gateway,
      resolvers: Resolvers::new(),
      notifier: Arc::new(TracingNotifier),
      state,
      loads: LoadGate::default(),
      temp_ids: TempIds::new(),
    }
  }

  /// Name lookups used when drafting temporary records.
  pub fn with_resolvers(mut self, resolvers: Resolvers) -> Self {
    self.resolvers = resolvers;
    self
  }

  pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
    self.notifier = notifier;
    self
  }

  /// Initial descriptor used by `reload` before any explicit load.
  pub fn with_query(self, query: QueryDescriptor) -> Self {
    self.state.send_modify(|s| s.query = query);
    self
  }

  // ==========================================================================
  // Reads
  // ==========================================================================

  pub fn snapshot(&self) -> Snapshot<R> {
    self.state.borrow().clone()
  }

  /// Reactive handle; `changed()` resolves after every snapshot update.
  pub fn subscribe(&self) -> watch::Receiver<Snapshot<R>> {
    self.state.subscribe()
  }

  /// Run a pure computation over the current collection.
  pub fn view<T>(&self, f: impl FnOnce(&[R]) -> T) -> T {
    f(&self.state.borrow().items)
  }

  pub fn items(&self) -> Vec<R> {
    self.state.borrow().items.clone()
  }

  pub fn get(&self, id: &str) -> Option<R> {
    self.state.borrow().get(id).cloned()
  }

  /// Like `get`, failing with `NotFound` when the record is not loaded.
  pub fn require(&self, id: &str) -> Result<R, StoreError> {
    self.get(id).ok_or_else(|| StoreError::NotFound {
      entity: R::entity_type(),
      id: id.to_string(),
    })
  }

  pub fn total_count(&self) -> usize {
    self.state.borrow().total_count
  }

  pub fn is_loading(&self) -> bool {
    self.state.borrow().loading
  }

  pub fn error(&self) -> Option<String> {
    self.state.borrow().error.clone()
  }

  pub fn last_synced(&self) -> Option<DateTime<Utc>> {
    self.state.borrow().last_synced
  }

  pub fn query(&self) -> QueryDescriptor {
    self.state.borrow().query.clone()
  }

  pub fn is_pending(&self, id: &str) -> bool {
    self.state.borrow().pending.contains(id)
  }

  /// `OptimisticApplied` while a mutation on `id` awaits the server.
  pub fn phase(&self, id: &str) -> Phase {
    if self.is_pending(id) {
      Phase::OptimisticApplied
    } else {
      Phase::Idle
    }
  }

  /// Acknowledge the current error message.
  pub fn clear_error(&self) {
    self.state.send_if_modified(|s| s.error.take().is_some());
  }

  // ==========================================================================
  // Internal helpers
  // ==========================================================================

  fn transition(&self, operation: &'static str, id: &str, phase: Phase) {
    debug!(entity = R::entity_type(), operation, id, ?phase, "mutation phase");
  }

  /// Record a user-facing error and forward it to the notifier.
  fn report(&self, message: String) {
    self.notifier.error(&message);
    self.state.send_modify(|s| s.error = Some(message));
  }

  fn fallback(action: &str) -> String {
    format!("Could not {} {}. Please try again.", action, R::entity_type())
  }

  fn collection_label() -> String {
    R::resource().replace('-', " ")
  }
}

impl<R: Record + Named> NameResolver for EntityStore<R> {
  fn resolve(&self, id: &str) -> Option<String> {
    self.state.borrow().get(id).map(|r| r.name().to_string())
  }
}

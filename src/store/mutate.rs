//! Optimistic mutations. Each applies to the snapshot before the gateway
//! call, then confirms or restores exactly what it captured.

use chrono::Utc;
use tracing::{info, warn};

use super::{EntityStore, Phase};
use crate::error::StoreError;
use crate::gateway::Response;
use crate::record::Record;

impl<R: Record> EntityStore<R> {
  /// Create a record. It is visible immediately under a temporary id, which
  /// is swapped for the server's id on success.
  pub async fn create(&self, input: R::Input) -> Result<String, StoreError> {
    let temp_id = self.temp_ids.next();
    let draft = R::draft(temp_id.clone(), &input, &self.resolvers);

    self.state.send_modify(|s| {
      s.place(draft);
      s.total_count += 1;
      s.pending.insert(temp_id.clone());
    });
    self.transition("create", &temp_id, Phase::OptimisticApplied);

    match self
      .gateway
      .create(&input)
      .await
      .and_then(Response::into_result)
    {
      Ok(id) => {
        self.state.send_modify(|s| {
          if let Some(record) = s.get_mut(&temp_id) {
            record.set_id(id.clone());
          }
          s.pending.remove(&temp_id);
          s.cache.clear();
          s.last_synced = Some(Utc::now());
        });
        self.transition("create", &id, Phase::Confirmed);
        info!(entity = R::entity_type(), %temp_id, %id, "created");
        self.notifier.success(&format!("Created {}", R::entity_type()));
        Ok(id)
      }
      Err(error) => {
        self.state.send_modify(|s| {
          // A reload may already have dropped the draft; only undo what is
          // still there
          if let Some(index) = s.position(&temp_id) {
            s.items.remove(index);
            s.total_count = s.total_count.saturating_sub(1);
          }
          s.pending.remove(&temp_id);
        });
        self.transition("create", &temp_id, Phase::RolledBack);
        warn!(entity = R::entity_type(), %temp_id, %error, "create rolled back");
        self.report(error.user_message(&Self::fallback("create")));
        Err(error)
      }
    }
  }

  /// Apply a partial update. On failure the record returns to exactly what
  /// it was before the call.
  pub async fn update(&self, id: &str, patch: R::Patch) -> Result<String, StoreError> {
    let mut previous = None;
    self.state.send_if_modified(|s| match s.get_mut(id) {
      Some(record) => {
        previous = Some(record.clone());
        record.merge(&patch);
        s.pending.insert(id.to_string());
        true
      }
      None => false,
    });

    if previous.is_some() {
      self.transition("update", id, Phase::OptimisticApplied);
    } else {
      warn!(entity = R::entity_type(), id, "update of a record that is not loaded");
    }

    match self
      .gateway
      .update(id, &patch)
      .await
      .and_then(Response::into_result)
    {
      Ok(confirmed) => {
        self.state.send_modify(|s| {
          s.pending.remove(id);
          s.cache.clear();
          s.last_synced = Some(Utc::now());
        });
        self.transition("update", id, Phase::Confirmed);
        self.notifier.success(&format!("Updated {}", R::entity_type()));
        Ok(confirmed)
      }
      Err(error) => {
        if let Some(previous) = previous {
          self.state.send_modify(|s| {
            if let Some(record) = s.get_mut(id) {
              *record = previous;
            }
            s.pending.remove(id);
          });
          self.transition("update", id, Phase::RolledBack);
        }
        warn!(entity = R::entity_type(), id, %error, "update failed");
        self.report(error.user_message(&Self::fallback("update")));
        Err(error)
      }
    }
  }

  /// Delete a record. On failure it is put back and the count restored.
  pub async fn delete(&self, id: &str) -> Result<(), StoreError> {
    let mut removed = None;
    self.state.send_if_modified(|s| match s.position(id) {
      Some(index) => {
        let record = s.items.remove(index);
        // An already-zero count is left alone and must not be raised on rollback
        let counted = s.total_count > 0;
        if counted {
          s.total_count -= 1;
        }
        s.pending.insert(id.to_string());
        removed = Some((index, record, counted));
        true
      }
      None => false,
    });

    if removed.is_some() {
      self.transition("delete", id, Phase::OptimisticApplied);
    } else {
      warn!(entity = R::entity_type(), id, "delete of a record that is not loaded");
    }

    match self.gateway.delete(id).await {
      Ok(()) => {
        self.state.send_modify(|s| {
          s.pending.remove(id);
          s.cache.clear();
          s.last_synced = Some(Utc::now());
        });
        self.transition("delete", id, Phase::Confirmed);
        self.notifier.success(&format!("Deleted {}", R::entity_type()));
        Ok(())
      }
      Err(error) => {
        if let Some((index, record, counted)) = removed {
          self.state.send_modify(|s| {
            s.restore(index, record);
            if counted {
              s.total_count += 1;
            }
            s.pending.remove(id);
          });
          self.transition("delete", id, Phase::RolledBack);
        }
        warn!(entity = R::entity_type(), id, %error, "delete failed");
        self.report(error.user_message(&Self::fallback("delete")));
        Err(error)
      }
    }
  }
}

//! Core traits for records held by an entity store.

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{de::DeserializeOwned, Serialize};
use std::fmt::Debug;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::resolver::Resolvers;

/// Prefix that marks client-generated identifiers.
pub const TEMP_ID_PREFIX: &str = "tmp-";

/// Where a newly created record lands in the collection, and how a deleted
/// one is put back after a failed delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
  /// Newest first; rollback restores the original index.
  Head,
  /// Kept sorted by `sort_key`; rollback re-sorts.
  Alphabetical,
  /// Appended; rollback restores the original index.
  Tail,
}

/// A server-owned record that an `EntityStore` mirrors.
///
/// Implementors provide the identifier accessors plus the two payloads the
/// store sends on mutation: `Input` for creates and `Patch` for partial
/// updates.
pub trait Record:
  Clone + Debug + PartialEq + Send + Sync + Serialize + DeserializeOwned + 'static
{
  /// Create payload.
  type Input: Clone + Debug + Send + Sync + Serialize + DeserializeOwned + 'static;
  /// Partial update payload.
  type Patch: Clone + Debug + Send + Sync + Serialize + DeserializeOwned + 'static;

  /// Singular human name (e.g., "account", "scheduled expense")
  fn entity_type() -> &'static str;

  /// REST collection path segment (e.g., "accounts")
  fn resource() -> &'static str;

  fn id(&self) -> &str;

  fn set_id(&mut self, id: String);

  /// Build a record from create input, resolving denormalized display names
  /// through `names`.
  fn draft(id: String, input: &Self::Input, names: &Resolvers) -> Self;

  /// Shallow merge: every field present in the patch overwrites.
  fn merge(&mut self, patch: &Self::Patch);

  fn placement() -> Placement {
    Placement::Head
  }

  /// Ordering key for `Placement::Alphabetical`.
  fn sort_key(&self) -> String {
    self.id().to_lowercase()
  }

  /// Text matched by free-text filters.
  fn search_text(&self) -> String;
}

/// Records with a display name.
pub trait Named {
  fn name(&self) -> &str;
}

/// Records carrying a monetary amount.
pub trait Amounted {
  fn amount(&self) -> Decimal;
}

/// Records anchored to a calendar date.
pub trait Dated {
  fn date(&self) -> NaiveDate;
}

/// Generator for temporary identifiers.
///
/// Ids look like `tmp-<unix-millis>-<seq>`; the sequence keeps ids unique
/// when several are minted within the same millisecond.
#[derive(Debug, Default)]
pub struct TempIds {
  seq: AtomicU64,
}

impl TempIds {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn next(&self) -> String {
    let seq = self.seq.fetch_add(1, Ordering::Relaxed);
    format!(
      "{}{}-{}",
      TEMP_ID_PREFIX,
      Utc::now().timestamp_millis(),
      seq
    )
  }
}

pub fn is_temporary(id: &str) -> bool {
  id.starts_with(TEMP_ID_PREFIX)
}

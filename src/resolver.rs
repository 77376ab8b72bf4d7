//! Read-only name lookups across stores.
//!
//! Movement records (expenses, incomes, transfers) carry the display names of
//! the catalog records they reference. When a store drafts a temporary record
//! it fills those names through a `NameResolver` registered for each role, so
//! the optimistic row looks like the confirmed one.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Read-only capability: map an identifier to a display name.
pub trait NameResolver: Send + Sync {
  fn resolve(&self, id: &str) -> Option<String>;
}

impl NameResolver for BTreeMap<String, String> {
  fn resolve(&self, id: &str) -> Option<String> {
    self.get(id).cloned()
  }
}

/// Foreign-key roles a record can reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Role {
  Account,
  Category,
  Concept,
  Client,
  Person,
  Provider,
  PaymentMethod,
}

/// Display names supplied by the caller, taking precedence over resolvers.
pub type DisplayOverrides = BTreeMap<Role, String>;

/// Registry of resolvers keyed by role.
#[derive(Clone, Default)]
pub struct Resolvers {
  by_role: HashMap<Role, Arc<dyn NameResolver>>,
}

impl Resolvers {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with(mut self, role: Role, resolver: Arc<dyn NameResolver>) -> Self {
    self.by_role.insert(role, resolver);
    self
  }

  pub fn resolve(&self, role: Role, id: &str) -> Option<String> {
    self.by_role.get(&role).and_then(|r| r.resolve(id))
  }

  /// Display name for `id` in `role`: override, then resolver, else "".
  pub fn display(&self, role: Role, id: &str, overrides: &DisplayOverrides) -> String {
    if let Some(name) = overrides.get(&role) {
      return name.clone();
    }
    if id.is_empty() {
      return String::new();
    }
    self.resolve(role, id).unwrap_or_default()
  }

  /// Same as `display` for optional references.
  pub fn display_opt(&self, role: Role, id: Option<&str>, overrides: &DisplayOverrides) -> String {
    match id {
      Some(id) => self.display(role, id, overrides),
      None => overrides.get(&role).cloned().unwrap_or_default(),
    }
  }
}

impl fmt::Debug for Resolvers {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let mut roles: Vec<&Role> = self.by_role.keys().collect();
    roles.sort();
    f.debug_struct("Resolvers").field("roles", &roles).finish()
  }
}

//! Name/description records that other records reference.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{merge_fields, merge_optional};
use crate::record::{Named, Placement, Record};
use crate::resolver::Resolvers;

macro_rules! catalog_record {
  (
    $(#[$meta:meta])*
    $name:ident, $input:ident, $patch:ident, $entity:literal, $resource:literal
  ) => {
    $(#[$meta])*
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct $name {
      pub id: String,
      pub name: String,
      #[serde(default, skip_serializing_if = "Option::is_none")]
      pub description: Option<String>,
      #[serde(default, skip_serializing_if = "Option::is_none")]
      pub user_id: Option<String>,
      #[serde(default, skip_serializing_if = "Option::is_none")]
      pub created_at: Option<DateTime<Utc>>,
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct $input {
      pub name: String,
      #[serde(default, skip_serializing_if = "Option::is_none")]
      pub description: Option<String>,
    }

    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct $patch {
      #[serde(default, skip_serializing_if = "Option::is_none")]
      pub name: Option<String>,
      #[serde(default, skip_serializing_if = "Option::is_none")]
      pub description: Option<String>,
    }

    impl Record for $name {
      type Input = $input;
      type Patch = $patch;

      fn entity_type() -> &'static str {
        $entity
      }

      fn resource() -> &'static str {
        $resource
      }

      fn id(&self) -> &str {
        &self.id
      }

      fn set_id(&mut self, id: String) {
        self.id = id;
      }

      fn draft(id: String, input: &Self::Input, _names: &Resolvers) -> Self {
        Self {
          id,
          name: input.name.clone(),
          description: input.description.clone(),
          user_id: None,
          created_at: None,
        }
      }

      fn merge(&mut self, patch: &Self::Patch) {
        merge_fields!(self, patch; name);
        merge_optional!(self, patch; description);
      }

      fn placement() -> Placement {
        Placement::Alphabetical
      }

      fn sort_key(&self) -> String {
        self.name.to_lowercase()
      }

      fn search_text(&self) -> String {
        match &self.description {
          Some(description) => format!("{} {}", self.name, description),
          None => self.name.clone(),
        }
      }
    }

    impl Named for $name {
      fn name(&self) -> &str {
        &self.name
      }
    }
  };
}

catalog_record!(
  /// Spending/earning classification (e.g., "Groceries").
  Category, CategoryInput, CategoryPatch, "category", "categories"
);

catalog_record!(
  /// Finer-grained label under a category (e.g., "Weekly shop").
  Concept, ConceptInput, ConceptPatch, "concept", "concepts"
);

catalog_record!(
  /// Source of income.
  Client, ClientInput, ClientPatch, "client", "clients"
);

catalog_record!(Person, PersonInput, PersonPatch, "person", "persons");

catalog_record!(
  /// Payee of expenses.
  Provider, ProviderInput, ProviderPatch, "provider", "providers"
);

catalog_record!(
  PaymentMethod,
  PaymentMethodInput,
  PaymentMethodPatch,
  "payment method",
  "payment-methods"
);

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{merge_fields, merge_optional};
use crate::record::{Amounted, Named, Placement, Record};
use crate::resolver::Resolvers;

/// A place money lives (bank account, wallet, card).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
  pub id: String,
  pub name: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub account_type: Option<String>,
  #[serde(default)]
  pub balance: Decimal,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub currency: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub user_id: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountInput {
  pub name: String,
  #[serde(default)]
  pub balance: Decimal,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub account_type: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub currency: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountPatch {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub name: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub balance: Option<Decimal>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub account_type: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub currency: Option<String>,
}

impl Record for Account {
  type Input = AccountInput;
  type Patch = AccountPatch;

  fn entity_type() -> &'static str {
    "account"
  }

  fn resource() -> &'static str {
    "accounts"
  }

  fn id(&self) -> &str {
    &self.id
  }

  fn set_id(&mut self, id: String) {
    self.id = id;
  }

  fn draft(id: String, input: &AccountInput, _names: &Resolvers) -> Self {
    Self {
      id,
      name: input.name.clone(),
      account_type: input.account_type.clone(),
      balance: input.balance,
      currency: input.currency.clone(),
      user_id: None,
      created_at: None,
    }
  }

  fn merge(&mut self, patch: &AccountPatch) {
    merge_fields!(self, patch; name, balance);
    merge_optional!(self, patch; account_type, currency);
  }

  fn placement() -> Placement {
    Placement::Alphabetical
  }

  fn sort_key(&self) -> String {
    self.name.to_lowercase()
  }

  fn search_text(&self) -> String {
    match &self.account_type {
      Some(kind) => format!("{} {}", self.name, kind),
      None => self.name.clone(),
    }
  }
}

impl Named for Account {
  fn name(&self) -> &str {
    &self.name
  }
}

impl Amounted for Account {
  fn amount(&self) -> Decimal {
    self.balance
  }
}

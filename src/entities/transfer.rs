use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{merge_fields, merge_optional};
use crate::record::{Amounted, Dated, Record};
use crate::resolver::{Resolvers, Role};

/// Money moved between two of the user's accounts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transfer {
  pub id: String,
  pub amount: Decimal,
  pub date: NaiveDate,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub description: Option<String>,
  pub from_account_id: String,
  #[serde(default)]
  pub from_account_name: String,
  pub to_account_id: String,
  #[serde(default)]
  pub to_account_name: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub user_id: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferInput {
  pub amount: Decimal,
  pub date: NaiveDate,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub description: Option<String>,
  pub from_account_id: String,
  pub to_account_id: String,
  /// Both ends are accounts, so overrides are per side rather than per role
  #[serde(skip)]
  pub from_account_name: Option<String>,
  #[serde(skip)]
  pub to_account_name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferPatch {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub amount: Option<Decimal>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub date: Option<NaiveDate>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub description: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub from_account_id: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub to_account_id: Option<String>,
}

impl Record for Transfer {
  type Input = TransferInput;
  type Patch = TransferPatch;

  fn entity_type() -> &'static str {
    "transfer"
  }

  fn resource() -> &'static str {
    "transfers"
  }

  fn id(&self) -> &str {
    &self.id
  }

  fn set_id(&mut self, id: String) {
    self.id = id;
  }

  fn draft(id: String, input: &TransferInput, names: &Resolvers) -> Self {
    let account_name = |override_name: &Option<String>, account_id: &str| {
      override_name
        .clone()
        .or_else(|| names.resolve(Role::Account, account_id))
        .unwrap_or_default()
    };
    Self {
      id,
      amount: input.amount,
      date: input.date,
      description: input.description.clone(),
      from_account_id: input.from_account_id.clone(),
      from_account_name: account_name(&input.from_account_name, &input.from_account_id),
      to_account_id: input.to_account_id.clone(),
      to_account_name: account_name(&input.to_account_name, &input.to_account_id),
      user_id: None,
      created_at: None,
    }
  }

  fn merge(&mut self, patch: &TransferPatch) {
    merge_fields!(self, patch; amount, date, from_account_id, to_account_id);
    merge_optional!(self, patch; description);
  }

  fn search_text(&self) -> String {
    format!(
      "{} {} {}",
      self.description.as_deref().unwrap_or_default(),
      self.from_account_name,
      self.to_account_name
    )
  }
}

impl Amounted for Transfer {
  fn amount(&self) -> Decimal {
    self.amount
  }
}

impl Dated for Transfer {
  fn date(&self) -> NaiveDate {
    self.date
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::collections::BTreeMap;
  use std::sync::Arc;

  #[test]
  fn test_draft_resolves_both_accounts() {
    let mut accounts = BTreeMap::new();
    accounts.insert("acc-1".to_string(), "Checking".to_string());
    accounts.insert("acc-2".to_string(), "Savings".to_string());
    let resolvers = Resolvers::new().with(Role::Account, Arc::new(accounts));

    let transfer = Transfer::draft(
      "tmp-1".to_string(),
      &TransferInput {
        amount: Decimal::from(200),
        date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
        description: None,
        from_account_id: "acc-1".to_string(),
        to_account_id: "acc-2".to_string(),
        from_account_name: None,
        to_account_name: Some("Rainy day".to_string()),
      },
      &resolvers,
    );
    assert_eq!(transfer.from_account_name, "Checking");
    assert_eq!(transfer.to_account_name, "Rainy day");
  }
}

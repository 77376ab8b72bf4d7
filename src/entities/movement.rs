//! Expenses and incomes: dated amounts against an account.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{merge_fields, merge_optional};
use crate::record::{Amounted, Dated, Record};
use crate::resolver::{DisplayOverrides, Resolvers, Role};

// ============================================================================
// Expense
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Expense {
  pub id: String,
  pub amount: Decimal,
  pub date: NaiveDate,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub description: Option<String>,
  pub category_id: String,
  #[serde(default)]
  pub category_name: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub concept_id: Option<String>,
  #[serde(default)]
  pub concept_name: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub provider_id: Option<String>,
  #[serde(default)]
  pub provider_name: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub payment_method_id: Option<String>,
  #[serde(default)]
  pub payment_method_name: String,
  pub account_id: String,
  #[serde(default)]
  pub account_name: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub user_id: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseInput {
  pub amount: Decimal,
  pub date: NaiveDate,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub description: Option<String>,
  pub category_id: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub concept_id: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub provider_id: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub payment_method_id: Option<String>,
  pub account_id: String,
  /// Display names to use instead of resolving; never sent to the server
  #[serde(skip)]
  pub display: DisplayOverrides,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpensePatch {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub amount: Option<Decimal>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub date: Option<NaiveDate>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub description: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub category_id: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub concept_id: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub provider_id: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub payment_method_id: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub account_id: Option<String>,
}

impl Record for Expense {
  type Input = ExpenseInput;
  type Patch = ExpensePatch;

  fn entity_type() -> &'static str {
    "expense"
  }

  fn resource() -> &'static str {
    "expenses"
  }

  fn id(&self) -> &str {
    &self.id
  }

  fn set_id(&mut self, id: String) {
    self.id = id;
  }

  fn draft(id: String, input: &ExpenseInput, names: &Resolvers) -> Self {
    let overrides = &input.display;
    Self {
      id,
      amount: input.amount,
      date: input.date,
      description: input.description.clone(),
      category_id: input.category_id.clone(),
      category_name: names.display(Role::Category, &input.category_id, overrides),
      concept_id: input.concept_id.clone(),
      concept_name: names.display_opt(Role::Concept, input.concept_id.as_deref(), overrides),
      provider_id: input.provider_id.clone(),
      provider_name: names.display_opt(Role::Provider, input.provider_id.as_deref(), overrides),
      payment_method_id: input.payment_method_id.clone(),
      payment_method_name: names.display_opt(
        Role::PaymentMethod,
        input.payment_method_id.as_deref(),
        overrides,
      ),
      account_id: input.account_id.clone(),
      account_name: names.display(Role::Account, &input.account_id, overrides),
      user_id: None,
      created_at: None,
    }
  }

  fn merge(&mut self, patch: &ExpensePatch) {
    merge_fields!(self, patch; amount, date, category_id, account_id);
    merge_optional!(self, patch; description, concept_id, provider_id, payment_method_id);
  }

  fn search_text(&self) -> String {
    [
      self.description.as_deref().unwrap_or_default(),
      self.category_name.as_str(),
      self.concept_name.as_str(),
      self.provider_name.as_str(),
    ]
    .join(" ")
  }
}

impl Amounted for Expense {
  fn amount(&self) -> Decimal {
    self.amount
  }
}

impl Dated for Expense {
  fn date(&self) -> NaiveDate {
    self.date
  }
}

// ============================================================================
// Income
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Income {
  pub id: String,
  pub amount: Decimal,
  pub date: NaiveDate,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub description: Option<String>,
  pub category_id: String,
  #[serde(default)]
  pub category_name: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub concept_id: Option<String>,
  #[serde(default)]
  pub concept_name: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub client_id: Option<String>,
  #[serde(default)]
  pub client_name: String,
  pub account_id: String,
  #[serde(default)]
  pub account_name: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub user_id: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomeInput {
  pub amount: Decimal,
  pub date: NaiveDate,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub description: Option<String>,
  pub category_id: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub concept_id: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub client_id: Option<String>,
  pub account_id: String,
  #[serde(skip)]
  pub display: DisplayOverrides,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomePatch {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub amount: Option<Decimal>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub date: Option<NaiveDate>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub description: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub category_id: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub concept_id: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub client_id: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub account_id: Option<String>,
}

impl Record for Income {
  type Input = IncomeInput;
  type Patch = IncomePatch;

  fn entity_type() -> &'static str {
    "income"
  }

  fn resource() -> &'static str {
    "incomes"
  }

  fn id(&self) -> &str {
    &self.id
  }

  fn set_id(&mut self, id: String) {
    self.id = id;
  }

  fn draft(id: String, input: &IncomeInput, names: &Resolvers) -> Self {
    let overrides = &input.display;
    Self {
      id,
      amount: input.amount,
      date: input.date,
      description: input.description.clone(),
      category_id: input.category_id.clone(),
      category_name: names.display(Role::Category, &input.category_id, overrides),
      concept_id: input.concept_id.clone(),
      concept_name: names.display_opt(Role::Concept, input.concept_id.as_deref(), overrides),
      client_id: input.client_id.clone(),
      client_name: names.display_opt(Role::Client, input.client_id.as_deref(), overrides),
      account_id: input.account_id.clone(),
      account_name: names.display(Role::Account, &input.account_id, overrides),
      user_id: None,
      created_at: None,
    }
  }

  fn merge(&mut self, patch: &IncomePatch) {
    merge_fields!(self, patch; amount, date, category_id, account_id);
    merge_optional!(self, patch; description, concept_id, client_id);
  }

  fn search_text(&self) -> String {
    [
      self.description.as_deref().unwrap_or_default(),
      self.category_name.as_str(),
      self.concept_name.as_str(),
      self.client_name.as_str(),
    ]
    .join(" ")
  }
}

impl Amounted for Income {
  fn amount(&self) -> Decimal {
    self.amount
  }
}

impl Dated for Income {
  fn date(&self) -> NaiveDate {
    self.date
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::resolver::NameResolver;
  use std::collections::BTreeMap;
  use std::sync::Arc;

  fn names(pairs: &[(&str, &str)]) -> Arc<dyn NameResolver> {
    let map: BTreeMap<String, String> = pairs
      .iter()
      .map(|(k, v)| (k.to_string(), v.to_string()))
      .collect();
    Arc::new(map)
  }

  fn input() -> ExpenseInput {
    ExpenseInput {
      amount: Decimal::new(4250, 2),
      date: NaiveDate::from_ymd_opt(2024, 3, 9).unwrap(),
      description: Some("Weekly shop".to_string()),
      category_id: "cat-1".to_string(),
      concept_id: None,
      provider_id: Some("prov-1".to_string()),
      payment_method_id: None,
      account_id: "acc-1".to_string(),
      display: DisplayOverrides::new(),
    }
  }

  #[test]
  fn test_draft_resolves_display_names() {
    let resolvers = Resolvers::new()
      .with(Role::Category, names(&[("cat-1", "Groceries")]))
      .with(Role::Account, names(&[("acc-1", "Checking")]));
    let expense = Expense::draft("tmp-1".to_string(), &input(), &resolvers);
    assert_eq!(expense.category_name, "Groceries");
    assert_eq!(expense.account_name, "Checking");
    // No provider resolver registered
    assert_eq!(expense.provider_name, "");
    assert_eq!(expense.concept_name, "");
  }

  #[test]
  fn test_draft_prefers_explicit_display_override() {
    let resolvers = Resolvers::new().with(Role::Provider, names(&[("prov-1", "ACME")]));
    let mut input = input();
    input.display.insert(Role::Provider, "ACME Corp".to_string());
    let expense = Expense::draft("tmp-1".to_string(), &input, &resolvers);
    assert_eq!(expense.provider_name, "ACME Corp");
  }

  #[test]
  fn test_display_overrides_are_not_serialized() {
    let mut input = input();
    input.display.insert(Role::Category, "Food".to_string());
    let json = serde_json::to_value(&input).unwrap();
    assert!(json.get("display").is_none());
    assert_eq!(json["categoryId"], "cat-1");
  }

  #[test]
  fn test_income_merge() {
    let mut income = Income::draft(
      "inc-1".to_string(),
      &IncomeInput {
        amount: Decimal::from(1500),
        date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
        description: None,
        category_id: "cat-9".to_string(),
        concept_id: None,
        client_id: None,
        account_id: "acc-1".to_string(),
        display: DisplayOverrides::new(),
      },
      &Resolvers::new(),
    );
    income.merge(&IncomePatch {
      amount: Some(Decimal::from(1600)),
      client_id: Some("cli-1".to_string()),
      ..IncomePatch::default()
    });
    assert_eq!(income.amount, Decimal::from(1600));
    assert_eq!(income.client_id.as_deref(), Some("cli-1"));
  }
}

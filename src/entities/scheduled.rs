//! Recurring expenses and incomes.

use chrono::{DateTime, Days, Months, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{merge_fields, merge_optional};
use crate::record::{Amounted, Dated, Record};
use crate::resolver::{DisplayOverrides, Resolvers, Role};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
  Daily,
  Weekly,
  Monthly,
  Yearly,
}

impl Frequency {
  /// The occurrence following `date`. Month arithmetic clamps to the last
  /// day of shorter months.
  pub fn advance(&self, date: NaiveDate) -> Option<NaiveDate> {
    match self {
      Frequency::Daily => date.checked_add_days(Days::new(1)),
      Frequency::Weekly => date.checked_add_days(Days::new(7)),
      Frequency::Monthly => date.checked_add_months(Months::new(1)),
      Frequency::Yearly => date.checked_add_months(Months::new(12)),
    }
  }
}

/// First occurrence on or after `from`, stepping from `start` and stopping
/// past `end`.
fn next_occurrence(
  frequency: Frequency,
  start: NaiveDate,
  end: Option<NaiveDate>,
  from: NaiveDate,
) -> Option<NaiveDate> {
  let mut current = start;
  while current < from {
    current = frequency.advance(current)?;
  }
  match end {
    Some(end) if current > end => None,
    _ => Some(current),
  }
}

// ============================================================================
// Scheduled expense
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledExpense {
  pub id: String,
  pub amount: Decimal,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub description: Option<String>,
  pub frequency: Frequency,
  pub start_date: NaiveDate,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub end_date: Option<NaiveDate>,
  #[serde(default = "default_active")]
  pub active: bool,
  pub category_id: String,
  #[serde(default)]
  pub category_name: String,
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

fn default_active() -> bool {
  true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledExpenseInput {
  pub amount: Decimal,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub description: Option<String>,
  pub frequency: Frequency,
  pub start_date: NaiveDate,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub end_date: Option<NaiveDate>,
  pub category_id: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub provider_id: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub payment_method_id: Option<String>,
  pub account_id: String,
  #[serde(skip)]
  pub display: DisplayOverrides,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledExpensePatch {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub amount: Option<Decimal>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub description: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub frequency: Option<Frequency>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub start_date: Option<NaiveDate>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub end_date: Option<NaiveDate>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub active: Option<bool>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub category_id: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub provider_id: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub payment_method_id: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub account_id: Option<String>,
}

impl ScheduledExpense {
  /// Next due date on or after `from`, if the schedule is still running.
  pub fn next_occurrence(&self, from: NaiveDate) -> Option<NaiveDate> {
    if !self.active {
      return None;
    }
    next_occurrence(self.frequency, self.start_date, self.end_date, from)
  }
}

impl Record for ScheduledExpense {
  type Input = ScheduledExpenseInput;
  type Patch = ScheduledExpensePatch;

  fn entity_type() -> &'static str {
    "scheduled expense"
  }

  fn resource() -> &'static str {
    "scheduled-expenses"
  }

  fn id(&self) -> &str {
    &self.id
  }

  fn set_id(&mut self, id: String) {
    self.id = id;
  }

  fn draft(id: String, input: &ScheduledExpenseInput, names: &Resolvers) -> Self {
    let overrides = &input.display;
    Self {
      id,
      amount: input.amount,
      description: input.description.clone(),
      frequency: input.frequency,
      start_date: input.start_date,
      end_date: input.end_date,
      active: true,
      category_id: input.category_id.clone(),
      category_name: names.display(Role::Category, &input.category_id, overrides),
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

  fn merge(&mut self, patch: &ScheduledExpensePatch) {
    merge_fields!(self, patch; amount, frequency, start_date, active, category_id, account_id);
    merge_optional!(self, patch; description, end_date, provider_id, payment_method_id);
  }

  fn search_text(&self) -> String {
    format!(
      "{} {} {}",
      self.description.as_deref().unwrap_or_default(),
      self.category_name,
      self.provider_name
    )
  }
}

impl Amounted for ScheduledExpense {
  fn amount(&self) -> Decimal {
    self.amount
  }
}

impl Dated for ScheduledExpense {
  fn date(&self) -> NaiveDate {
    self.start_date
  }
}

// ============================================================================
// Scheduled income
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledIncome {
  pub id: String,
  pub amount: Decimal,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub description: Option<String>,
  pub frequency: Frequency,
  pub start_date: NaiveDate,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub end_date: Option<NaiveDate>,
  #[serde(default = "default_active")]
  pub active: bool,
  pub category_id: String,
  #[serde(default)]
  pub category_name: String,
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
pub struct ScheduledIncomeInput {
  pub amount: Decimal,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub description: Option<String>,
  pub frequency: Frequency,
  pub start_date: NaiveDate,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub end_date: Option<NaiveDate>,
  pub category_id: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub client_id: Option<String>,
  pub account_id: String,
  #[serde(skip)]
  pub display: DisplayOverrides,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledIncomePatch {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub amount: Option<Decimal>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub description: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub frequency: Option<Frequency>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub start_date: Option<NaiveDate>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub end_date: Option<NaiveDate>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub active: Option<bool>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub category_id: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub client_id: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub account_id: Option<String>,
}

impl ScheduledIncome {
  pub fn next_occurrence(&self, from: NaiveDate) -> Option<NaiveDate> {
    if !self.active {
      return None;
    }
    next_occurrence(self.frequency, self.start_date, self.end_date, from)
  }
}

impl Record for ScheduledIncome {
  type Input = ScheduledIncomeInput;
  type Patch = ScheduledIncomePatch;

  fn entity_type() -> &'static str {
    "scheduled income"
  }

  fn resource() -> &'static str {
    "scheduled-incomes"
  }

  fn id(&self) -> &str {
    &self.id
  }

  fn set_id(&mut self, id: String) {
    self.id = id;
  }

  fn draft(id: String, input: &ScheduledIncomeInput, names: &Resolvers) -> Self {
    let overrides = &input.display;
    Self {
      id,
      amount: input.amount,
      description: input.description.clone(),
      frequency: input.frequency,
      start_date: input.start_date,
      end_date: input.end_date,
      active: true,
      category_id: input.category_id.clone(),
      category_name: names.display(Role::Category, &input.category_id, overrides),
      client_id: input.client_id.clone(),
      client_name: names.display_opt(Role::Client, input.client_id.as_deref(), overrides),
      account_id: input.account_id.clone(),
      account_name: names.display(Role::Account, &input.account_id, overrides),
      user_id: None,
      created_at: None,
    }
  }

  fn merge(&mut self, patch: &ScheduledIncomePatch) {
    merge_fields!(self, patch; amount, frequency, start_date, active, category_id, account_id);
    merge_optional!(self, patch; description, end_date, client_id);
  }

  fn search_text(&self) -> String {
    format!(
      "{} {} {}",
      self.description.as_deref().unwrap_or_default(),
      self.category_name,
      self.client_name
    )
  }
}

impl Amounted for ScheduledIncome {
  fn amount(&self) -> Decimal {
    self.amount
  }
}

impl Dated for ScheduledIncome {
  fn date(&self) -> NaiveDate {
    self.start_date
  }
}

//! Finance record types.
//!
//! Field names serialize in camelCase to match the backend. Every record
//! carries ownership metadata (`userId`, `createdAt`) that the server fills;
//! drafts leave it empty until a reload brings the confirmed copy.

mod account;
mod catalog;
mod movement;
mod scheduled;
mod transfer;

pub use account::{Account, AccountInput, AccountPatch};
pub use catalog::{
  Category, CategoryInput, CategoryPatch, Client, ClientInput, ClientPatch, Concept, ConceptInput,
  ConceptPatch, PaymentMethod, PaymentMethodInput, PaymentMethodPatch, Person, PersonInput,
  PersonPatch, Provider, ProviderInput, ProviderPatch,
};
pub use movement::{Expense, ExpenseInput, ExpensePatch, Income, IncomeInput, IncomePatch};
pub use scheduled::{
  Frequency, ScheduledExpense, ScheduledExpenseInput, ScheduledExpensePatch, ScheduledIncome,
  ScheduledIncomeInput, ScheduledIncomePatch,
};
pub use transfer::{Transfer, TransferInput, TransferPatch};

/// Copy every `Some` field of a patch onto the record.
macro_rules! merge_fields {
  ($record:expr, $patch:expr; $($field:ident),+ $(,)?) => {
    $(
      if let Some(value) = &$patch.$field {
        $record.$field = value.clone();
      }
    )+
  };
}

/// Same as `merge_fields!` for optional record fields: a `Some` in the
/// patch sets the field, `None` leaves it alone.
macro_rules! merge_optional {
  ($record:expr, $patch:expr; $($field:ident),+ $(,)?) => {
    $(
      if let Some(value) = &$patch.$field {
        $record.$field = Some(value.clone());
      }
    )+
  };
}

pub(crate) use merge_fields;
pub(crate) use merge_optional;

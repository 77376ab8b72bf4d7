//! Composition root: one store per entity, wired to a gateway factory and to
//! each other for display-name resolution.

use color_eyre::{eyre::eyre, Result};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use url::Url;

use crate::config::Config;
use crate::entities::{
  Account, Category, Client as ClientRecord, Concept, Expense, Income, PaymentMethod, Person,
  Provider, ScheduledExpense, ScheduledIncome, Transfer,
};
use crate::gateway::{Gateway, InMemoryGateway, RestGateway};
use crate::notify::Notifier;
use crate::query::QueryDescriptor;
use crate::record::Record;
use crate::resolver::{Resolvers, Role};
use crate::store::{EntityStore, LoadOutcome};

/// Produces the gateway each store talks to.
pub trait GatewayFactory {
  fn gateway<R: Record>(&self) -> Arc<dyn Gateway<R>>;
}

/// Gateways against the configured REST backend, sharing one HTTP client.
#[derive(Debug, Clone)]
pub struct RestFactory {
  client: Client,
  base: Url,
}

impl RestFactory {
  pub fn new(client: Client, base: Url) -> Self {
    Self { client, base }
  }

  /// Build the HTTP client from config; FINTRACK_API_TOKEN, when set, is sent
  /// as a bearer token on every request.
  pub fn from_config(config: &Config) -> Result<Self> {
    let base = Url::parse(&config.api.url)
      .map_err(|e| eyre!("Invalid API url {:?}: {}", config.api.url, e))?;

    let mut headers = HeaderMap::new();
    if let Some(token) = Config::api_token() {
      let mut value = HeaderValue::from_str(&format!("Bearer {}", token))
        .map_err(|e| eyre!("Invalid API token: {}", e))?;
      value.set_sensitive(true);
      headers.insert(AUTHORIZATION, value);
    }

    let client = Client::builder()
      .timeout(Duration::from_secs(config.api.timeout_secs))
      .default_headers(headers)
      .build()
      .map_err(|e| eyre!("Failed to build HTTP client: {}", e))?;

    Ok(Self::new(client, base))
  }
}

impl GatewayFactory for RestFactory {
  fn gateway<R: Record>(&self) -> Arc<dyn Gateway<R>> {
    Arc::new(RestGateway::<R>::new(self.client.clone(), self.base.clone()))
  }
}

/// Fresh, empty in-process gateways.
#[derive(Debug, Default, Clone, Copy)]
pub struct MemoryFactory;

impl GatewayFactory for MemoryFactory {
  fn gateway<R: Record>(&self) -> Arc<dyn Gateway<R>> {
    Arc::new(InMemoryGateway::<R>::new())
  }
}

fn assemble<R: Record>(
  gateway: Arc<dyn Gateway<R>>,
  notifier: &Arc<dyn Notifier>,
  resolvers: Resolvers,
  query: &QueryDescriptor,
) -> Arc<EntityStore<R>> {
  Arc::new(
    EntityStore::new(gateway)
      .with_notifier(notifier.clone())
      .with_resolvers(resolvers)
      .with_query(query.clone()),
  )
}

pub struct Stores {
  pub accounts: Arc<EntityStore<Account>>,
  pub categories: Arc<EntityStore<Category>>,
  pub concepts: Arc<EntityStore<Concept>>,
  pub clients: Arc<EntityStore<ClientRecord>>,
  pub persons: Arc<EntityStore<Person>>,
  pub providers: Arc<EntityStore<Provider>>,
  pub payment_methods: Arc<EntityStore<PaymentMethod>>,
  pub expenses: Arc<EntityStore<Expense>>,
  pub incomes: Arc<EntityStore<Income>>,
  pub transfers: Arc<EntityStore<Transfer>>,
  pub scheduled_expenses: Arc<EntityStore<ScheduledExpense>>,
  pub scheduled_incomes: Arc<EntityStore<ScheduledIncome>>,
}

impl Stores {
  /// Catalog and account stores are built first so the movement stores can
  /// resolve names from whatever they currently hold.
  pub fn build<F: GatewayFactory>(
    factory: &F,
    notifier: Arc<dyn Notifier>,
    page_size: usize,
  ) -> Self {
    let query = QueryDescriptor::new(0, page_size);

    let accounts = assemble(factory.gateway::<Account>(), &notifier, Resolvers::new(), &query);
    let categories = assemble(factory.gateway::<Category>(), &notifier, Resolvers::new(), &query);
    let concepts = assemble(factory.gateway::<Concept>(), &notifier, Resolvers::new(), &query);
    let clients = assemble(factory.gateway::<ClientRecord>(), &notifier, Resolvers::new(), &query);
    let persons = assemble(factory.gateway::<Person>(), &notifier, Resolvers::new(), &query);
    let providers = assemble(factory.gateway::<Provider>(), &notifier, Resolvers::new(), &query);
    let payment_methods = assemble(
      factory.gateway::<PaymentMethod>(),
      &notifier,
      Resolvers::new(),
      &query,
    );

    let spending = Resolvers::new()
      .with(Role::Category, categories.clone())
      .with(Role::Concept, concepts.clone())
      .with(Role::Provider, providers.clone())
      .with(Role::PaymentMethod, payment_methods.clone())
      .with(Role::Account, accounts.clone());
    let earning = Resolvers::new()
      .with(Role::Category, categories.clone())
      .with(Role::Concept, concepts.clone())
      .with(Role::Client, clients.clone())
      .with(Role::Account, accounts.clone());
    let moving = Resolvers::new().with(Role::Account, accounts.clone());

    Self {
      expenses: assemble(factory.gateway::<Expense>(), &notifier, spending.clone(), &query),
      incomes: assemble(factory.gateway::<Income>(), &notifier, earning.clone(), &query),
      transfers: assemble(factory.gateway::<Transfer>(), &notifier, moving, &query),
      scheduled_expenses: assemble(
        factory.gateway::<ScheduledExpense>(),
        &notifier,
        spending,
        &query,
      ),
      scheduled_incomes: assemble(
        factory.gateway::<ScheduledIncome>(),
        &notifier,
        earning,
        &query,
      ),
      accounts,
      categories,
      concepts,
      clients,
      persons,
      providers,
      payment_methods,
    }
  }

  /// Load the first page of every store concurrently. Returns how many loads
  /// failed; their messages are in each store's error slot.
  pub async fn load_all(&self) -> usize {
    let outcomes = futures::join!(
      self.accounts.reload(),
      self.categories.reload(),
      self.concepts.reload(),
      self.clients.reload(),
      self.persons.reload(),
      self.providers.reload(),
      self.payment_methods.reload(),
      self.expenses.reload(),
      self.incomes.reload(),
      self.transfers.reload(),
      self.scheduled_expenses.reload(),
      self.scheduled_incomes.reload(),
    );
    let outcomes = [
      outcomes.0, outcomes.1, outcomes.2, outcomes.3, outcomes.4, outcomes.5, outcomes.6,
      outcomes.7, outcomes.8, outcomes.9, outcomes.10, outcomes.11,
    ];
    let failed = outcomes
      .iter()
      .filter(|outcome| **outcome == LoadOutcome::Failed)
      .count();
    info!(failed, "initial load finished");
    failed
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::{ApiConfig, LoggingConfig, StoreConfig};
  use crate::entities::{AccountInput, CategoryInput, ExpenseInput, TransferInput};
  use crate::notify::NullNotifier;
  use chrono::NaiveDate;
  use rust_decimal::Decimal;

  fn stores() -> Stores {
    Stores::build(&MemoryFactory, Arc::new(NullNotifier), 20)
  }

  #[tokio::test]
  async fn test_movement_drafts_resolve_catalog_names() {
    let stores = stores();
    let category = stores
      .categories
      .create(CategoryInput {
        name: "Groceries".to_string(),
        description: None,
      })
      .await
      .unwrap();
    let account = stores
      .accounts
      .create(AccountInput {
        name: "Checking".to_string(),
        balance: Decimal::from(1000),
        account_type: None,
        currency: Some("EUR".to_string()),
      })
      .await
      .unwrap();

    let id = stores
      .expenses
      .create(ExpenseInput {
        amount: Decimal::new(4250, 2),
        date: NaiveDate::from_ymd_opt(2024, 2, 10).unwrap(),
        description: Some("Weekly shop".to_string()),
        category_id: category,
        concept_id: None,
        provider_id: None,
        payment_method_id: None,
        account_id: account.clone(),
        display: Default::default(),
      })
      .await
      .unwrap();

    let expense = stores.expenses.require(&id).unwrap();
    assert_eq!(expense.category_name, "Groceries");
    assert_eq!(expense.account_name, "Checking");

    let transfer = stores
      .transfers
      .create(TransferInput {
        amount: Decimal::from(50),
        date: NaiveDate::from_ymd_opt(2024, 2, 11).unwrap(),
        description: None,
        from_account_id: account,
        to_account_id: "elsewhere".to_string(),
        from_account_name: None,
        to_account_name: None,
      })
      .await
      .unwrap();
    let transfer = stores.transfers.require(&transfer).unwrap();
    assert_eq!(transfer.from_account_name, "Checking");
    assert_eq!(transfer.to_account_name, "");
  }

  #[tokio::test]
  async fn test_load_all_with_empty_backends() {
    let stores = stores();
    assert_eq!(stores.load_all().await, 0);
    assert_eq!(stores.expenses.query().page_size, 20);
    assert!(stores.persons.last_synced().is_some());
  }

  #[test]
  fn test_rest_factory_rejects_bad_url() {
    let config = Config {
      api: ApiConfig {
        url: "not a url".to_string(),
        timeout_secs: 5,
      },
      store: StoreConfig::default(),
      logging: LoggingConfig::default(),
    };
    assert!(RestFactory::from_config(&config).is_err());
  }
}

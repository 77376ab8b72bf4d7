use clap::{Parser, Subcommand, ValueEnum};
use color_eyre::{eyre::eyre, Result};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;

use fintrack::app::{MemoryFactory, RestFactory, Stores};
use fintrack::config::{Config, LoggingConfig, StoreConfig};
use fintrack::notify::TracingNotifier;
use fintrack::query::Filters;
use fintrack::{logging, EntityStore, LoadOutcome, Record};

#[derive(Parser, Debug)]
#[command(name = "fintrack")]
#[command(about = "Personal-finance records from the command line")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/fintrack/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// Use an empty in-process backend instead of the configured API
  #[arg(long)]
  demo: bool,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Show one page of a collection
  List {
    entity: EntityKind,
    #[arg(long, default_value_t = 0)]
    page: usize,
    #[arg(long)]
    search: Option<String>,
  },
  /// Free-text search
  Search {
    entity: EntityKind,
    term: String,
    #[arg(long)]
    limit: Option<usize>,
    /// Extra filters as key=value
    #[arg(long = "filter", value_parser = parse_filter)]
    filters: Vec<(String, String)>,
  },
  /// Most recent records
  Recent {
    entity: EntityKind,
    #[arg(long)]
    limit: Option<usize>,
  },
  /// Create a record from a JSON payload
  Create { entity: EntityKind, json: String },
  /// Apply a partial JSON update
  Update {
    entity: EntityKind,
    id: String,
    json: String,
  },
  Delete { entity: EntityKind, id: String },
}

impl Command {
  fn entity(&self) -> EntityKind {
    match self {
      Command::List { entity, .. }
      | Command::Search { entity, .. }
      | Command::Recent { entity, .. }
      | Command::Create { entity, .. }
      | Command::Update { entity, .. }
      | Command::Delete { entity, .. } => *entity,
    }
  }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum EntityKind {
  Accounts,
  Categories,
  Concepts,
  Clients,
  Persons,
  Providers,
  PaymentMethods,
  Expenses,
  Incomes,
  Transfers,
  ScheduledExpenses,
  ScheduledIncomes,
}

fn parse_filter(raw: &str) -> std::result::Result<(String, String), String> {
  raw
    .split_once('=')
    .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
    .filter(|(k, _)| !k.is_empty())
    .ok_or_else(|| format!("expected key=value, got {:?}", raw))
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();

  let (stores, settings, _guard) = if args.demo {
    let guard = logging::init(&LoggingConfig::default())?;
    let stores = Stores::build(
      &MemoryFactory,
      Arc::new(TracingNotifier),
      StoreConfig::default().page_size,
    );
    (stores, StoreConfig::default(), guard)
  } else {
    let config = Config::load(args.config.as_deref())?;
    let guard = logging::init(&config.logging)?;
    let factory = RestFactory::from_config(&config)?;
    let stores = Stores::build(&factory, Arc::new(TracingNotifier), config.store.page_size);
    (stores, config.store, guard)
  };

  let command = &args.command;
  match command.entity() {
    EntityKind::Accounts => run(&stores.accounts, command, &settings).await,
    EntityKind::Categories => run(&stores.categories, command, &settings).await,
    EntityKind::Concepts => run(&stores.concepts, command, &settings).await,
    EntityKind::Clients => run(&stores.clients, command, &settings).await,
    EntityKind::Persons => run(&stores.persons, command, &settings).await,
    EntityKind::Providers => run(&stores.providers, command, &settings).await,
    EntityKind::PaymentMethods => run(&stores.payment_methods, command, &settings).await,
    EntityKind::Expenses => run(&stores.expenses, command, &settings).await,
    EntityKind::Incomes => run(&stores.incomes, command, &settings).await,
    EntityKind::Transfers => run(&stores.transfers, command, &settings).await,
    EntityKind::ScheduledExpenses => run(&stores.scheduled_expenses, command, &settings).await,
    EntityKind::ScheduledIncomes => run(&stores.scheduled_incomes, command, &settings).await,
  }
}

async fn run<R: Record>(
  store: &EntityStore<R>,
  command: &Command,
  settings: &StoreConfig,
) -> Result<()> {
  match command {
    Command::List { page, search, .. } => {
      let mut query = store.query().with_page(*page);
      if let Some(term) = search {
        query = query.with_search(term.as_str());
      }
      if store.load_paginated(query).await != LoadOutcome::Applied {
        return Err(failure(store));
      }
      #[derive(Serialize)]
      #[serde(rename_all = "camelCase")]
      struct Listing<T> {
        items: Vec<T>,
        total_count: usize,
      }
      print_json(&Listing {
        items: store.items(),
        total_count: store.total_count(),
      })
    }
    Command::Search {
      term, limit, filters, ..
    } => {
      let filters: Filters = filters.iter().cloned().collect();
      let found = store
        .search(term, limit.unwrap_or(settings.page_size), &filters)
        .await;
      check(store)?;
      print_json(&found)
    }
    Command::Recent { limit, .. } => {
      let found = store.recent(limit.unwrap_or(settings.recent_limit)).await;
      check(store)?;
      print_json(&found)
    }
    Command::Create { json, .. } => {
      let input: R::Input = serde_json::from_str(json)
        .map_err(|e| eyre!("Invalid {} payload: {}", R::entity_type(), e))?;
      let id = store.create(input).await.map_err(|_| failure(store))?;
      println!("{}", id);
      Ok(())
    }
    Command::Update { id, json, .. } => {
      let patch: R::Patch = serde_json::from_str(json)
        .map_err(|e| eyre!("Invalid {} patch: {}", R::entity_type(), e))?;
      store.update(id, patch).await.map_err(|_| failure(store))?;
      println!("{}", id);
      Ok(())
    }
    Command::Delete { id, .. } => {
      store.delete(id).await.map_err(|_| failure(store))?;
      Ok(())
    }
  }
}

/// Turn the store's error slot into the command's error.
fn failure<R: Record>(store: &EntityStore<R>) -> color_eyre::Report {
  eyre!(store
    .error()
    .unwrap_or_else(|| format!("{} operation failed", R::entity_type())))
}

fn check<R: Record>(store: &EntityStore<R>) -> Result<()> {
  match store.error() {
    Some(message) => Err(eyre!(message)),
    None => Ok(()),
  }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
  println!("{}", serde_json::to_string_pretty(value)?);
  Ok(())
}

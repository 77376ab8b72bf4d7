use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use super::*;
use crate::cache::QueryKey;
use crate::entities::{
  Account, AccountInput, Category, CategoryInput, CategoryPatch, Expense, ExpenseInput,
};
use crate::gateway::{Call, InMemoryGateway};
use crate::notify::Notifier;
use crate::query::{Filters, SortDirection};
use crate::record::is_temporary;
use crate::resolver::{DisplayOverrides, Role};

#[derive(Default)]
struct RecordingNotifier {
  errors: Mutex<Vec<String>>,
  successes: Mutex<Vec<String>>,
}

impl Notifier for RecordingNotifier {
  fn error(&self, message: &str) {
    self.errors.lock().unwrap().push(message.to_string());
  }

  fn success(&self, message: &str) {
    self.successes.lock().unwrap().push(message.to_string());
  }
}

fn category(id: &str, name: &str) -> Category {
  Category {
    id: id.to_string(),
    name: name.to_string(),
    description: None,
    user_id: None,
    created_at: None,
  }
}

fn account(id: &str, name: &str, balance: i64) -> Account {
  Account {
    id: id.to_string(),
    name: name.to_string(),
    account_type: None,
    balance: Decimal::from(balance),
    currency: Some("EUR".to_string()),
    user_id: None,
    created_at: None,
  }
}

fn expense(id: &str, amount: i64, day: u32) -> Expense {
  Expense {
    id: id.to_string(),
    amount: Decimal::from(amount),
    date: NaiveDate::from_ymd_opt(2024, 3, day).unwrap(),
    description: None,
    category_id: "cat-1".to_string(),
    category_name: "Food".to_string(),
    concept_id: None,
    concept_name: String::new(),
    provider_id: None,
    provider_name: String::new(),
    payment_method_id: None,
    payment_method_name: String::new(),
    account_id: "acc-1".to_string(),
    account_name: "Checking".to_string(),
    user_id: None,
    created_at: None,
  }
}

fn five_categories() -> Vec<Category> {
  vec![
    category("c1", "Bills"),
    category("c2", "Food"),
    category("c3", "Health"),
    category("c4", "Rent"),
    category("c5", "Travel"),
  ]
}

async fn loaded<R: Record>(
  records: Vec<R>,
) -> (Arc<InMemoryGateway<R>>, EntityStore<R>, Arc<RecordingNotifier>) {
  let gateway = Arc::new(InMemoryGateway::with_records(records));
  let notifier = Arc::new(RecordingNotifier::default());
  let store = EntityStore::new(gateway.clone()).with_notifier(notifier.clone());
  assert_eq!(store.reload().await, LoadOutcome::Applied);
  (gateway, store, notifier)
}

fn names(store: &EntityStore<Category>) -> Vec<String> {
  store.view(|items| items.iter().map(|c| c.name.clone()).collect())
}

// ============================================================================
// Loads
// ============================================================================

#[tokio::test]
async fn test_load_replaces_items_and_count() {
  let (_, store, _) = loaded(five_categories()).await;

  assert_eq!(store.items().len(), 5);
  assert_eq!(store.total_count(), 5);
  assert!(!store.is_loading());
  assert!(store.last_synced().is_some());
  assert!(store.snapshot().cache.contains(&QueryKey::Page(store.query())));
}

#[tokio::test]
async fn test_load_failure_keeps_items_and_records_message() {
  let (gateway, store, notifier) = loaded(five_categories()).await;
  gateway.set_offline(true);

  assert_eq!(store.reload().await, LoadOutcome::Failed);
  assert_eq!(store.items().len(), 5);
  assert!(!store.is_loading());
  assert_eq!(
    store.error().as_deref(),
    Some("Could not load categories. Please try again.")
  );
  assert_eq!(notifier.errors.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_stale_load_is_superseded() {
  let records: Vec<Category> = (0..30)
    .map(|i| category(&format!("c{:02}", i), &format!("Category {:02}", i)))
    .collect();
  let gateway = Arc::new(InMemoryGateway::with_records(records));
  gateway.set_page_latency(1, Duration::from_millis(50));
  let store = EntityStore::new(gateway.clone());

  let (slow, fast) = tokio::join!(
    store.load_paginated(QueryDescriptor::new(1, 20)),
    store.load_paginated(QueryDescriptor::new(0, 20)),
  );

  assert_eq!(slow, LoadOutcome::Superseded);
  assert_eq!(fast, LoadOutcome::Applied);
  assert_eq!(store.query().page, 0);
  assert_eq!(store.items().len(), 20);
  assert_eq!(store.items()[0].id, "c00");
  assert_eq!(store.total_count(), 30);
}

#[tokio::test]
async fn test_changing_query_clears_cache() {
  let (gateway, store, _) = loaded(five_categories()).await;
  store.search("foo", 5, &Filters::new()).await;
  let search_key = QueryKey::Search {
    term: "foo".to_string(),
    limit: 5,
    filters: Filters::new(),
  };
  assert!(store.snapshot().cache.contains(&search_key));

  assert_eq!(store.set_search("rent").await, LoadOutcome::Applied);
  assert_eq!(store.query().search, "rent");
  assert_eq!(store.query().page, 0);
  assert_eq!(names(&store), vec!["Rent"]);
  assert!(!store.snapshot().cache.contains(&search_key));
  assert_eq!(gateway.calls(Call::List), 2);
}

// ============================================================================
// Create
// ============================================================================

#[tokio::test]
async fn test_create_is_visible_before_the_server_answers() {
  let (gateway, store, _) = loaded(five_categories()).await;
  gateway.set_latency(Duration::from_millis(50));

  let observe = async {
    tokio::time::sleep(Duration::from_millis(10)).await;
    let draft = store
      .items()
      .into_iter()
      .find(|c| c.name == "Groceries")
      .unwrap();
    assert!(is_temporary(&draft.id));
    assert!(store.is_pending(&draft.id));
    assert_eq!(store.phase(&draft.id), Phase::OptimisticApplied);
    assert_eq!(store.total_count(), 6);
  };
  let create = store.create(CategoryInput {
    name: "Groceries".to_string(),
    description: None,
  });
  let (created, ()) = tokio::join!(create, observe);

  let id = created.unwrap();
  assert_eq!(id, "categories-1");
  assert_eq!(store.phase(&id), Phase::Idle);
}

#[tokio::test]
async fn test_create_reconciles_id_in_place() {
  let (_, store, notifier) = loaded(five_categories()).await;

  let id = store
    .create(CategoryInput {
      name: "Groceries".to_string(),
      description: None,
    })
    .await
    .unwrap();

  assert_eq!(
    names(&store),
    vec!["Bills", "Food", "Groceries", "Health", "Rent", "Travel"]
  );
  assert_eq!(store.items()[2].id, id);
  assert!(store.items().iter().all(|c| !is_temporary(&c.id)));
  assert_eq!(store.total_count(), 6);
  assert!(store.snapshot().pending.is_empty());
  assert_eq!(notifier.successes.lock().unwrap().as_slice(), ["Created category"]);
}

#[tokio::test]
async fn test_offline_account_create_rolls_back() {
  let (gateway, store, notifier) =
    loaded(vec![account("a1", "Checking", 500), account("a2", "Wallet", 40)]).await;
  let before = store.snapshot();
  gateway.set_offline(true);

  let result = store
    .create(AccountInput {
      name: "Savings".to_string(),
      balance: Decimal::from(100),
      account_type: None,
      currency: None,
    })
    .await;

  assert!(matches!(result, Err(StoreError::Transport(_))));
  assert_eq!(store.items(), before.items);
  assert_eq!(store.total_count(), 2);
  assert!(store.snapshot().pending.is_empty());
  let message = "Could not create account. Please try again.";
  assert_eq!(store.error().as_deref(), Some(message));
  assert_eq!(notifier.errors.lock().unwrap().as_slice(), [message]);
}

#[tokio::test]
async fn test_rejected_envelope_message_reaches_user() {
  let (gateway, store, _) = loaded(five_categories()).await;
  gateway.use_envelopes(true);
  gateway.fail_next(StoreError::rejected("A category named Food already exists"));

  let result = store
    .create(CategoryInput {
      name: "Food".to_string(),
      description: None,
    })
    .await;

  assert!(result.is_err());
  assert_eq!(store.items().len(), 5);
  assert_eq!(
    store.error().as_deref(),
    Some("A category named Food already exists")
  );
}

#[tokio::test]
async fn test_draft_resolves_names_from_sibling_store() {
  let (_, categories, _) = loaded(vec![category("cat-9", "Dining out")]).await;
  let categories = Arc::new(categories);
  let gateway = Arc::new(InMemoryGateway::<Expense>::new());
  let expenses = EntityStore::new(gateway)
    .with_resolvers(Resolvers::new().with(Role::Category, categories.clone()));

  let mut display = DisplayOverrides::new();
  display.insert(Role::Account, "Joint".to_string());
  let id = expenses
    .create(ExpenseInput {
      amount: Decimal::from(12),
      date: NaiveDate::from_ymd_opt(2024, 3, 4).unwrap(),
      description: None,
      category_id: "cat-9".to_string(),
      concept_id: None,
      provider_id: None,
      payment_method_id: None,
      account_id: "acc-7".to_string(),
      display,
    })
    .await
    .unwrap();

  let created = expenses.require(&id).unwrap();
  assert_eq!(created.category_name, "Dining out");
  assert_eq!(created.account_name, "Joint");
  assert_eq!(expenses.items()[0].id, id);
}

// ============================================================================
// Update
// ============================================================================

#[tokio::test]
async fn test_failed_update_restores_exact_record() {
  let mut food = category("c2", "Food");
  food.description = Some("Supermarket and markets".to_string());
  let (gateway, store, _) = loaded(vec![category("c1", "Bills"), food.clone()]).await;
  gateway.fail_next(StoreError::Transport("connection reset".to_string()));

  let result = store
    .update(
      "c2",
      CategoryPatch {
        name: Some("Groceries".to_string()),
        description: Some("changed".to_string()),
      },
    )
    .await;

  assert!(result.is_err());
  assert_eq!(store.get("c2"), Some(food));
  assert!(!store.is_pending("c2"));
  assert_eq!(
    store.error().as_deref(),
    Some("Could not update category. Please try again.")
  );
}

#[tokio::test]
async fn test_update_keeps_merge_and_invalidates_cache() {
  let (gateway, store, _) = loaded(five_categories()).await;
  store.search("foo", 5, &Filters::new()).await;

  let id = store
    .update(
      "c2",
      CategoryPatch {
        name: Some("Groceries".to_string()),
        ..CategoryPatch::default()
      },
    )
    .await
    .unwrap();

  assert_eq!(id, "c2");
  assert_eq!(store.get("c2").unwrap().name, "Groceries");
  assert_eq!(gateway.records()[1].name, "Groceries");
  store.search("foo", 5, &Filters::new()).await;
  assert_eq!(gateway.calls(Call::Search), 2);
}

#[tokio::test]
async fn test_update_of_unloaded_record_still_dispatches() {
  let (gateway, store, _) = loaded(five_categories()).await;
  let before = store.items();

  let result = store
    .update(
      "missing",
      CategoryPatch {
        name: Some("Ghost".to_string()),
        ..CategoryPatch::default()
      },
    )
    .await;

  assert!(matches!(
    result,
    Err(StoreError::Rejected {
      status: Some(404),
      ..
    })
  ));
  assert_eq!(gateway.calls(Call::Update), 1);
  assert_eq!(store.items(), before);
  assert_eq!(
    store.error().as_deref(),
    Some("category missing does not exist")
  );
}

// ============================================================================
// Delete
// ============================================================================

#[tokio::test]
async fn test_delete_removes_immediately_and_on_confirm() {
  let (gateway, store, _) = loaded(five_categories()).await;
  let synced_at_load = store.last_synced().unwrap();
  gateway.set_latency(Duration::from_millis(30));

  let observe = async {
    tokio::time::sleep(Duration::from_millis(5)).await;
    assert_eq!(store.items().len(), 4);
    assert_eq!(store.total_count(), 4);
    assert!(store.is_pending("c3"));
  };
  let (deleted, ()) = tokio::join!(store.delete("c3"), observe);

  deleted.unwrap();
  assert_eq!(store.items().len(), 4);
  assert_eq!(store.total_count(), 4);
  assert!(store.get("c3").is_none());
  assert!(!store.is_pending("c3"));
  assert!(store.last_synced().unwrap() > synced_at_load);
  assert_eq!(gateway.records().len(), 4);
}

#[tokio::test]
async fn test_failed_delete_restores_order_and_count() {
  let (gateway, store, _) = loaded(five_categories()).await;
  gateway.set_offline(true);

  assert!(store.delete("c3").await.is_err());

  assert_eq!(names(&store), vec!["Bills", "Food", "Health", "Rent", "Travel"]);
  assert_eq!(store.total_count(), 5);
  assert_eq!(
    store.error().as_deref(),
    Some("Could not delete category. Please try again.")
  );
}

#[tokio::test]
async fn test_failed_delete_under_descending_sort_keeps_server_order() {
  let mut descending = five_categories();
  descending.reverse();
  let (gateway, store, _) = loaded(descending).await;
  assert_eq!(
    store.set_sort("name", SortDirection::Desc).await,
    LoadOutcome::Applied
  );
  gateway.set_offline(true);

  assert!(store.delete("c4").await.is_err());

  assert_eq!(names(&store), vec!["Travel", "Rent", "Health", "Food", "Bills"]);
  assert_eq!(store.total_count(), 5);
}

#[tokio::test]
async fn test_create_under_descending_sort_goes_to_head() {
  let mut descending = five_categories();
  descending.reverse();
  let (_, store, _) = loaded(descending).await;
  store.set_sort("name", SortDirection::Desc).await;

  store
    .create(CategoryInput {
      name: "Gifts".to_string(),
      description: None,
    })
    .await
    .unwrap();

  assert_eq!(names(&store)[0], "Gifts");
}

#[tokio::test]
async fn test_failed_delete_never_raises_a_zero_count() {
  let (gateway, store, _) = loaded(five_categories()).await;
  store.state.send_modify(|s| s.total_count = 0);
  gateway.set_offline(true);

  assert!(store.delete("c2").await.is_err());

  assert_eq!(store.total_count(), 0);
  assert_eq!(store.items().len(), 5);
}

#[tokio::test]
async fn test_failed_delete_returns_dated_record_to_its_index() {
  let (gateway, store, _) = loaded(vec![
    expense("e3", 30, 3),
    expense("e2", 20, 2),
    expense("e1", 10, 1),
  ])
  .await;
  gateway.fail_next(StoreError::Transport("timeout".to_string()));

  assert!(store.delete("e2").await.is_err());

  let ids: Vec<String> = store.items().into_iter().map(|e| e.id).collect();
  assert_eq!(ids, vec!["e3", "e2", "e1"]);
  assert_eq!(store.total_count(), 3);
}

// ============================================================================
// Search / recent
// ============================================================================

#[tokio::test]
async fn test_repeated_search_is_served_from_cache() {
  let (gateway, store, _) = loaded(five_categories()).await;

  let first = store.search("Food", 10, &Filters::new()).await;
  let second = store.search("Food", 10, &Filters::new()).await;

  assert_eq!(first, second);
  assert_eq!(first.len(), 1);
  assert_eq!(gateway.calls(Call::Search), 1);
}

#[tokio::test]
async fn test_differently_written_terms_are_fetched_separately() {
  let (gateway, store, _) = loaded(five_categories()).await;

  store.search("Food", 10, &Filters::new()).await;
  store.search("food", 10, &Filters::new()).await;
  store.search(" Food ", 10, &Filters::new()).await;

  assert_eq!(gateway.calls(Call::Search), 3);
  assert_eq!(store.snapshot().cache.len(), 4);
}

#[tokio::test]
async fn test_mutation_invalidates_search_cache() {
  let (gateway, store, _) = loaded(five_categories()).await;
  store.recent(3).await;
  store.search("r", 10, &Filters::new()).await;

  store
    .create(CategoryInput {
      name: "Rates".to_string(),
      description: None,
    })
    .await
    .unwrap();
  assert!(store.snapshot().cache.is_empty());

  let recent = store.recent(3).await;
  assert_eq!(recent[0].name, "Rates");
  assert_eq!(gateway.calls(Call::Recent), 2);
}

#[tokio::test]
async fn test_confirmed_delete_invalidates_search_cache() {
  let (gateway, store, notifier) = loaded(five_categories()).await;
  assert_eq!(store.search("Rent", 10, &Filters::new()).await.len(), 1);

  store.delete("c4").await.unwrap();
  assert!(store.snapshot().cache.is_empty());

  assert!(store.search("Rent", 10, &Filters::new()).await.is_empty());
  assert_eq!(gateway.calls(Call::Search), 2);
  assert_eq!(
    notifier.successes.lock().unwrap().as_slice(),
    ["Deleted category".to_string()]
  );
}

#[tokio::test]
async fn test_search_failure_returns_empty() {
  let (gateway, store, _) = loaded(five_categories()).await;
  gateway.set_offline(true);

  assert!(store.search("food", 10, &Filters::new()).await.is_empty());
  assert_eq!(
    store.error().as_deref(),
    Some("Could not search categories. Please try again.")
  );
  assert_eq!(store.snapshot().cache.len(), 1);
}

// ============================================================================
// Error slot, concurrency, subscription
// ============================================================================

#[tokio::test]
async fn test_error_is_sticky_until_cleared() {
  let (gateway, store, _) = loaded(five_categories()).await;
  gateway.fail_next(StoreError::Transport("down".to_string()));
  assert_eq!(store.reload().await, LoadOutcome::Failed);

  assert_eq!(store.reload().await, LoadOutcome::Applied);
  assert!(store.error().is_some());

  store.clear_error();
  assert!(store.error().is_none());
}

#[tokio::test]
async fn test_operations_on_different_ids_are_independent() {
  let (gateway, store, _) = loaded(five_categories()).await;
  // The update enters the gateway first and takes the queued failure
  gateway.fail_next(StoreError::Transport("reset".to_string()));

  let (updated, deleted) = tokio::join!(
    store.update(
      "c1",
      CategoryPatch {
        name: Some("Utilities".to_string()),
        ..CategoryPatch::default()
      },
    ),
    store.delete("c5"),
  );

  assert!(updated.is_err());
  assert!(deleted.is_ok());
  assert_eq!(names(&store), vec!["Bills", "Food", "Health", "Rent"]);
  assert_eq!(store.total_count(), 4);
}

#[tokio::test]
async fn test_subscribers_see_every_change() {
  let (_, store, _) = loaded(five_categories()).await;
  let mut rx = store.subscribe();
  rx.borrow_and_update();

  store.delete("c1").await.unwrap();

  assert!(rx.has_changed().unwrap());
  assert_eq!(rx.borrow_and_update().items.len(), 4);
}

#[tokio::test]
async fn test_store_resolves_names_of_loaded_records() {
  let (_, store, _) = loaded(five_categories()).await;

  assert_eq!(store.resolve("c4").as_deref(), Some("Rent"));
  assert_eq!(store.resolve("nope"), None);
  assert!(matches!(
    store.require("nope"),
    Err(StoreError::NotFound { entity: "category", .. })
  ));
}

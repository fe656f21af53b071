use super::*;
use crate::backend::domain::stats::today;
use crate::backend::storage::test_utils::{InMemoryRemote, StaticSession, TestEnvironment};
use crate::backend::storage::{
    BroadcastChangeFeed, ChangeEvent, ChangeKind, LocalRepository, SnapshotStorage, StoreSnapshot,
};
use chrono::{Datelike, Duration, NaiveDate};
use shared::{TransactionCategory, TransactionType};
use std::time::Duration as StdDuration;

fn offline_store() -> FinanceStore {
    FinanceStore::new(Arc::new(LocalRepository::new()))
}

fn new_tx(description: &str, amount: f64, date: NaiveDate) -> NewTransaction {
    NewTransaction {
        description: description.to_string(),
        amount,
        category: TransactionCategory::Other,
        transaction_type: TransactionType::from_amount(amount),
        date,
    }
}

fn first_of_previous_month(day: NaiveDate) -> NaiveDate {
    let last_of_previous = day.with_day(1).unwrap() - Duration::days(1);
    last_of_previous.with_day(1).unwrap()
}

fn stored_tx(id: &str, amount: f64) -> Transaction {
    new_tx("stored", amount, NaiveDate::from_ymd_opt(2025, 10, 1).unwrap()).with_id(id.to_string())
}

async fn remote_store(remote: Arc<InMemoryRemote>, user_id: &str) -> FinanceStore {
    let store = FinanceStore::new(remote);
    store.set_current_user_id(Some(user_id.to_string())).await;
    store
}

fn assert_balance_matches(state: &StoreState) {
    let sum: f64 = state.transactions.iter().map(|t| t.amount).sum();
    assert!((state.balance - sum).abs() < 1e-9, "balance {} != sum {}", state.balance, sum);
}

#[tokio::test]
async fn test_offline_balance_tracks_sum_of_transactions() {
    let store = offline_store();
    store.load_transactions().await.unwrap();
    assert_balance_matches(&store.state().await);

    let day = today();
    let coffee = store.add_transaction(new_tx("Coffee", -4.5, day)).await.unwrap();
    let salary = store.add_transaction(new_tx("Salary", 2500.0, day)).await.unwrap();
    assert_balance_matches(&store.state().await);

    let patch = TransactionPatch {
        amount: Some(-6.0),
        ..Default::default()
    };
    store.update_transaction(&coffee.id, patch).await.unwrap();
    assert_balance_matches(&store.state().await);

    store.delete_transaction(&salary.id).await.unwrap();
    let state = store.state().await;
    assert_balance_matches(&state);
    assert_eq!(state.transactions.len(), 5);
    assert!(!state.is_loading);
    assert!(state.error.is_none());
}

#[tokio::test]
async fn test_monthly_stats_only_count_current_month() {
    let store = offline_store();
    let day = today();
    for amount in [100.0, 200.0, -50.0, -30.0] {
        store.add_transaction(new_tx("this month", amount, day)).await.unwrap();
    }
    store
        .add_transaction(new_tx("last month", 500.0, first_of_previous_month(day)))
        .await
        .unwrap();

    store.calculate_monthly_stats().await;

    let state = store.state().await;
    assert_eq!(state.monthly_income, 300.0);
    assert_eq!(state.monthly_expenses, 80.0);
    assert_eq!(state.balance, 720.0);
}

#[tokio::test]
async fn test_add_goal_creates_exactly_one_deadline_event() {
    let store = offline_store();
    let deadline = NaiveDate::from_ymd_opt(2025, 12, 1).unwrap();
    let events_before = store.events().await.len();

    let goal = store
        .add_goal(NewGoal {
            name: "Vacation".to_string(),
            target_amount: 2000.0,
            current_amount: 0.0,
            deadline,
            recurring: false,
        })
        .await
        .unwrap();

    let events = store.events().await;
    assert_eq!(events.len(), events_before + 1);
    let goal_events: Vec<_> = events.iter().filter(|e| e.event_type == EventType::Goal).collect();
    assert_eq!(goal_events.len(), 1);
    assert_eq!(goal_events[0].date, deadline);
    assert_eq!(goal_events[0].title, "Deadline: Vacation");
    assert_eq!(store.goals().await[0].id, goal.id);
}

#[tokio::test]
async fn test_switching_user_clears_working_set() {
    let store = offline_store();
    store.set_current_user_id(Some("u1".to_string())).await;
    store.load_transactions().await.unwrap();
    store.load_goals().await.unwrap();
    store.load_events().await.unwrap();
    assert!(store.state().await.balance != 0.0);

    store.set_current_user_id(Some("u2".to_string())).await;

    let state = store.state().await;
    assert!(state.transactions.is_empty());
    assert!(state.goals.is_empty());
    assert!(state.events.is_empty());
    assert_eq!(state.balance, 0.0);
    assert_eq!(state.monthly_income, 0.0);
    assert_eq!(state.monthly_expenses, 0.0);
    assert_eq!(state.current_user_id.as_deref(), Some("u2"));
}

#[tokio::test]
async fn test_same_user_keeps_working_set() {
    let store = offline_store();
    store.set_current_user_id(Some("u1".to_string())).await;
    store.load_transactions().await.unwrap();

    store.set_current_user_id(Some("u1".to_string())).await;

    assert_eq!(store.transactions().await.len(), 4);
}

#[tokio::test]
async fn test_adopting_first_user_keeps_working_set() {
    let store = offline_store();
    let kept = store
        .add_transaction(new_tx("Before sign-in", -10.0, today()))
        .await
        .unwrap();
    assert!(store.current_user_id().await.is_none());

    store.set_current_user_id(Some("u1".to_string())).await;

    let state = store.state().await;
    assert_eq!(state.transactions, vec![kept]);
    assert_eq!(state.balance, -10.0);
    assert_eq!(state.current_user_id.as_deref(), Some("u1"));
}

#[tokio::test]
async fn test_offline_sync_keeps_edits_made_before_it() {
    let store = offline_store();
    store
        .add_transaction(new_tx("Before sync", -10.0, today()))
        .await
        .unwrap();

    store.sync().await.unwrap();

    let state = store.state().await;
    assert_eq!(state.transactions.len(), 1);
    assert_eq!(state.transactions[0].description, "Before sync");
    assert_eq!(state.current_user_id.as_deref(), Some(DEMO_USER_ID));
    assert_balance_matches(&state);
}

#[tokio::test]
async fn test_restore_for_other_user_starts_clean() {
    let env = TestEnvironment::new().unwrap();
    env.snapshots
        .save(&StoreSnapshot {
            transactions: vec![stored_tx("t1", 3000.0)],
            balance: 3000.0,
            current_user_id: Some("u1".to_string()),
            ..Default::default()
        })
        .unwrap();

    let store = FinanceStore::builder(Arc::new(LocalRepository::new()))
        .snapshots(Arc::new(env.snapshots.clone()))
        .build();
    store.init(Some("u2")).await;

    let state = store.state().await;
    assert_eq!(
        state,
        StoreState {
            current_user_id: Some("u2".to_string()),
            ..Default::default()
        }
    );
    let persisted = env.snapshots.load().unwrap().unwrap();
    assert!(persisted.transactions.is_empty());
}

#[tokio::test]
async fn test_restore_for_same_user_keeps_data() {
    let env = TestEnvironment::new().unwrap();
    env.snapshots
        .save(&StoreSnapshot {
            transactions: vec![stored_tx("t1", 3000.0)],
            balance: 3000.0,
            current_user_id: Some("u1".to_string()),
            ..Default::default()
        })
        .unwrap();

    let store = FinanceStore::builder(Arc::new(LocalRepository::new()))
        .snapshots(Arc::new(env.snapshots.clone()))
        .build();
    store.init(Some("u1")).await;

    let state = store.state().await;
    assert_eq!(state.transactions.len(), 1);
    assert_eq!(state.balance, 3000.0);
    assert!(!state.is_loading);
}

#[tokio::test]
async fn test_offline_edits_survive_restart() {
    let env = TestEnvironment::new().unwrap();
    let snapshots: Arc<dyn SnapshotStorage> = Arc::new(env.snapshots.clone());

    let first = FinanceStore::builder(Arc::new(LocalRepository::new()))
        .snapshots(Arc::clone(&snapshots))
        .build();
    first.init(None).await;
    first.sync().await.unwrap();
    first.add_transaction(new_tx("Books", -42.0, today())).await.unwrap();
    first.teardown().await;

    let second = FinanceStore::builder(Arc::new(LocalRepository::new()))
        .snapshots(snapshots)
        .build();
    second.init(Some(DEMO_USER_ID)).await;
    second.load_transactions().await.unwrap();

    let transactions = second.transactions().await;
    assert_eq!(transactions.len(), 5);
    assert_eq!(transactions[0].description, "Books");
}

#[tokio::test]
async fn test_offline_load_is_idempotent() {
    let store = offline_store();
    store.load_transactions().await.unwrap();
    let first = store.transactions().await;

    store.load_transactions().await.unwrap();
    let second = store.transactions().await;

    assert_eq!(first, second);
    assert_eq!(second.len(), 4);
}

#[tokio::test]
async fn test_offline_load_keeps_local_edits() {
    let store = offline_store();
    store.add_transaction(new_tx("Only one", -10.0, today())).await.unwrap();

    store.load_transactions().await.unwrap();

    let transactions = store.transactions().await;
    assert_eq!(transactions.len(), 1);
    assert_eq!(store.state().await.balance, -10.0);
}

#[tokio::test]
async fn test_resubscribing_keeps_one_subscription_per_table() {
    let feed = Arc::new(BroadcastChangeFeed::new());
    let store = FinanceStore::builder(Arc::new(InMemoryRemote::new()))
        .change_feed(feed.clone())
        .build();
    store.set_current_user_id(Some("u1".to_string())).await;

    assert_eq!(store.setup_realtime_subscriptions().await, 3);
    assert_eq!(store.setup_realtime_subscriptions().await, 3);
    assert_eq!(store.active_subscription_count(), 3);

    // Aborted tasks release their receivers once polled
    for _ in 0..3 {
        tokio::task::yield_now().await;
    }
    for table in Table::SUBSCRIBED {
        assert_eq!(feed.subscriber_count(table, "u1"), 1, "{}", table.as_str());
    }

    assert_eq!(store.cleanup_subscriptions(), 3);
    assert_eq!(store.active_subscription_count(), 0);
    assert_eq!(store.setup_realtime_subscriptions().await, 3);
    assert_eq!(store.active_subscription_count(), 3);
}

#[tokio::test]
async fn test_offline_mode_opens_no_subscriptions() {
    let store = FinanceStore::builder(Arc::new(LocalRepository::new()))
        .change_feed(Arc::new(BroadcastChangeFeed::new()))
        .build();
    store.set_current_user_id(Some(DEMO_USER_ID.to_string())).await;

    assert_eq!(store.setup_realtime_subscriptions().await, 0);
    assert_eq!(store.active_subscription_count(), 0);
}

#[tokio::test]
async fn test_remote_add_updates_balance_without_reload() {
    let remote = Arc::new(InMemoryRemote::new());
    remote.put_transaction("u1", stored_tx("t1", 1000.0));
    let store = remote_store(remote.clone(), "u1").await;
    store.load_transactions().await.unwrap();
    let fetches = remote.transaction_fetches();

    store.add_transaction(new_tx("Rent", -800.0, today())).await.unwrap();

    let state = store.state().await;
    assert_eq!(state.balance, 200.0);
    assert_eq!(state.monthly_expenses, 800.0);
    assert_eq!(remote.transaction_fetches(), fetches);
    assert_eq!(remote.stored_transactions("u1").len(), 2);
}

#[tokio::test]
async fn test_remote_load_replaces_held_list() {
    let remote = Arc::new(InMemoryRemote::new());
    let store = remote_store(remote.clone(), "u1").await;
    store.load_transactions().await.unwrap();
    assert!(store.transactions().await.is_empty());

    remote.put_transaction("u1", stored_tx("t1", 50.0));
    remote.put_transaction("u2", stored_tx("t2", 70.0));
    store.load_transactions().await.unwrap();

    let state = store.state().await;
    assert_eq!(state.transactions.len(), 1);
    assert_eq!(state.balance, 50.0);
}

#[tokio::test]
async fn test_remote_write_without_user_is_not_authenticated() {
    let store = FinanceStore::new(Arc::new(InMemoryRemote::new()));

    let err = store.add_transaction(new_tx("Rent", -800.0, today())).await.unwrap_err();

    assert_eq!(err, StoreError::NotAuthenticated);
    let state = store.state().await;
    assert_eq!(state.error.as_deref(), Some("User not authenticated"));
    assert!(!state.is_loading);
}

#[tokio::test]
async fn test_backend_failure_is_recorded_and_returned() {
    let remote = Arc::new(InMemoryRemote::new());
    remote.put_transaction("u1", stored_tx("t1", 10.0));
    let store = remote_store(remote.clone(), "u1").await;
    store.load_transactions().await.unwrap();

    remote.set_failing(true);
    let err = store.delete_goal("g-1").await.unwrap_err();

    assert_eq!(err, StoreError::Backend("Failed to fetch".to_string()));
    let state = store.state().await;
    assert_eq!(state.error.as_deref(), Some("Failed to fetch"));
    assert!(!state.is_loading);
    assert_eq!(state.transactions.len(), 1);

    remote.set_failing(false);
    store.load_transactions().await.unwrap();
    assert!(store.state().await.error.is_none());
}

#[tokio::test]
async fn test_update_of_unknown_record_is_not_found() {
    let store = offline_store();

    let err = store
        .update_event("missing", EventPatch::default())
        .await
        .unwrap_err();

    assert_eq!(err, StoreError::not_found("Event", "missing"));
    assert_eq!(store.state().await.error.as_deref(), Some("Event not found: missing"));
}

#[tokio::test]
async fn test_delete_of_unknown_record_is_a_no_op() {
    let store = offline_store();
    store.load_transactions().await.unwrap();
    let before = store.state().await;

    store.delete_transaction("missing").await.unwrap();

    let after = store.state().await;
    assert_eq!(after.transactions, before.transactions);
    assert_eq!(after.balance, before.balance);
}

#[tokio::test]
async fn test_change_notification_reloads_table() {
    let remote = Arc::new(InMemoryRemote::new());
    let feed = Arc::new(BroadcastChangeFeed::new());
    let store = FinanceStore::builder(remote.clone())
        .change_feed(feed.clone())
        .sessions(Arc::new(StaticSession::signed_in("u1")))
        .build();
    assert_eq!(
        store.sync().await.unwrap(),
        SyncOutcome::Synced {
            user_id: "u1".to_string()
        }
    );
    assert!(store.transactions().await.is_empty());

    remote.put_transaction("u1", stored_tx("t1", 99.0));
    let delivered = feed.publish(ChangeEvent {
        table: Table::Transactions,
        user_id: "u1".to_string(),
        kind: ChangeKind::Insert,
    });
    assert_eq!(delivered, 1);

    tokio::time::timeout(StdDuration::from_secs(2), async {
        while store.transactions().await.is_empty() {
            tokio::time::sleep(StdDuration::from_millis(10)).await;
        }
    })
    .await
    .unwrap();
    assert_eq!(store.state().await.balance, 99.0);
}

#[tokio::test]
async fn test_sync_without_session_loads_nothing() {
    let remote = Arc::new(InMemoryRemote::new());
    remote.put_transaction("u1", stored_tx("t1", 10.0));
    let store = FinanceStore::builder(remote)
        .sessions(Arc::new(StaticSession::signed_out()))
        .build();

    assert_eq!(store.sync().await.unwrap(), SyncOutcome::NoSession);
    assert!(store.transactions().await.is_empty());
    assert!(store.current_user_id().await.is_none());
}

#[tokio::test]
async fn test_offline_sync_uses_demo_user_and_seeds() {
    let store = offline_store();

    let outcome = store.sync().await.unwrap();

    assert_eq!(
        outcome,
        SyncOutcome::Synced {
            user_id: DEMO_USER_ID.to_string()
        }
    );
    let state = store.state().await;
    assert_eq!(state.transactions.len(), 4);
    assert_eq!(state.goals.len(), 2);
    assert_eq!(state.events.len(), 4);
    assert_balance_matches(&state);
}

#[tokio::test]
async fn test_sync_reports_first_failure() {
    let remote = Arc::new(InMemoryRemote::new());
    remote.set_failing(true);
    let store = FinanceStore::builder(remote)
        .sessions(Arc::new(StaticSession::signed_in("u1")))
        .build();

    let err = store.sync().await.unwrap_err();

    assert_eq!(err, StoreError::Backend("Failed to fetch".to_string()));
    assert_eq!(store.current_user_id().await.as_deref(), Some("u1"));
    assert!(!store.state().await.is_loading);
}

#[tokio::test]
async fn test_clear_store_resets_everything() {
    let env = TestEnvironment::new().unwrap();
    let store = FinanceStore::builder(Arc::new(LocalRepository::new()))
        .snapshots(Arc::new(env.snapshots.clone()))
        .build();
    store.sync().await.unwrap();
    assert!(env.snapshots.path().exists());

    store.clear_store().await;

    assert_eq!(store.state().await, StoreState::default());
    assert!(env.snapshots.load().unwrap().is_none());
}

#[test]
fn test_goal_deadline_event_shape() {
    let goal = NewGoal {
        name: "TV".to_string(),
        target_amount: 3500.0,
        current_amount: 0.0,
        deadline: NaiveDate::from_ymd_opt(2025, 10, 29).unwrap(),
        recurring: false,
    }
    .with_id("g1".to_string());

    let event = goal_deadline_event(&goal);
    assert_eq!(event.event_type, EventType::Goal);
    assert_eq!(event.time, chrono::NaiveTime::from_hms_opt(9, 0, 0).unwrap());
    assert_eq!(event.description, "Deadline for goal \"TV\".");
    assert_eq!(event.amount, None);
}

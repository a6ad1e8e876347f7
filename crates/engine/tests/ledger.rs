use std::time::Duration;

use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement, TransactionTrait,
};
use uuid::Uuid;

use engine::{Engine, EngineError, STARTER_CATALOG, TransferCmd};
use migration::MigratorTrait;

/// The pool is pinned to a single connection, so concurrent units of work
/// queue on it instead of contending for SQLite's write lock.
async fn engine_with_db() -> (Engine, DatabaseConnection) {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options.max_connections(1).sqlx_logging(false);
    let db = Database::connect(options).await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder()
        .database(db.clone())
        .build()
        .await
        .unwrap();
    engine.seed_catalog().await.unwrap();
    (engine, db)
}

async fn count(db: &DatabaseConnection, sql: &str) -> i64 {
    let backend = db.get_database_backend();
    let row = db
        .query_one(Statement::from_string(backend, sql.to_string()))
        .await
        .unwrap()
        .unwrap();
    row.try_get::<i64>("", "n").unwrap()
}

async fn balance(engine: &Engine, account_id: Uuid) -> i64 {
    engine.account(account_id).await.unwrap().balance
}

/// Spend coins until `target` is left: hoodies (300) then books (50).
async fn drain_to(engine: &Engine, account_id: Uuid, target: i64) {
    while balance(engine, account_id).await - target >= 300 {
        engine.purchase(account_id, "hoody").await.unwrap();
    }
    while balance(engine, account_id).await - target >= 50 {
        engine.purchase(account_id, "book").await.unwrap();
    }
    assert_eq!(balance(engine, account_id).await, target);
}

#[tokio::test]
async fn new_account_starts_with_starting_balance() {
    let (engine, _db) = engine_with_db().await;

    let alice = engine.create_or_authenticate("alice").await.unwrap();

    let account = engine.account(alice).await.unwrap();
    assert_eq!(account.name, "alice");
    assert_eq!(account.balance, 1000);
}

#[tokio::test]
async fn authenticate_returns_existing_account() {
    let (engine, db) = engine_with_db().await;

    let first = engine.create_or_authenticate("alice").await.unwrap();
    engine.purchase(first, "pen").await.unwrap();
    let second = engine.create_or_authenticate("  alice ").await.unwrap();

    assert_eq!(first, second);
    assert_eq!(balance(&engine, second).await, 990);
    assert_eq!(count(&db, "SELECT COUNT(*) AS n FROM accounts").await, 1);
}

#[tokio::test]
async fn equivalent_unicode_names_share_an_account() {
    let (engine, _db) = engine_with_db().await;

    let composed = engine.create_or_authenticate("Jos\u{e9}").await.unwrap();
    let decomposed = engine.create_or_authenticate("Jose\u{301}").await.unwrap();

    assert_eq!(composed, decomposed);
}

#[tokio::test]
async fn concurrent_first_authentication_creates_one_account() {
    let (engine, db) = engine_with_db().await;

    let (a, b) = tokio::join!(
        engine.create_or_authenticate("erin"),
        engine.create_or_authenticate("erin"),
    );

    assert_eq!(a.unwrap(), b.unwrap());
    assert_eq!(
        count(&db, "SELECT COUNT(*) AS n FROM accounts WHERE name = 'erin'").await,
        1
    );
}

#[tokio::test]
async fn blank_account_name_is_rejected() {
    let (engine, db) = engine_with_db().await;

    let err = engine.create_or_authenticate("   ").await.unwrap_err();

    assert!(matches!(err, EngineError::InvalidAccountName(_)));
    assert_eq!(count(&db, "SELECT COUNT(*) AS n FROM accounts").await, 0);
}

#[tokio::test]
async fn purchase_debits_price_and_records_item() {
    let (engine, _db) = engine_with_db().await;
    let alice = engine.create_or_authenticate("alice").await.unwrap();

    engine.purchase(alice, "t-shirt").await.unwrap();

    let summary = engine.summary(alice).await.unwrap();
    assert_eq!(summary.balance, 920);
    assert_eq!(summary.inventory.len(), 1);
    assert_eq!(summary.quantity_of("t-shirt"), 1);
}

#[tokio::test]
async fn repeated_purchases_append_one_record_each() {
    let (engine, db) = engine_with_db().await;
    let alice = engine.create_or_authenticate("alice").await.unwrap();

    engine.purchase(alice, "cup").await.unwrap();
    engine.purchase(alice, "cup").await.unwrap();
    engine.purchase(alice, "pen").await.unwrap();

    assert_eq!(count(&db, "SELECT COUNT(*) AS n FROM purchases").await, 3);
    let summary = engine.summary(alice).await.unwrap();
    assert_eq!(summary.quantity_of("cup"), 2);
    assert_eq!(summary.quantity_of("pen"), 1);
    assert_eq!(summary.balance, 1000 - 20 - 20 - 10);
}

#[tokio::test]
async fn purchase_of_unknown_item_is_rejected() {
    let (engine, db) = engine_with_db().await;
    let alice = engine.create_or_authenticate("alice").await.unwrap();

    let err = engine.purchase(alice, "gold-bar").await.unwrap_err();

    assert_eq!(err, EngineError::InvalidItem("gold-bar".to_string()));
    assert_eq!(balance(&engine, alice).await, 1000);
    assert_eq!(count(&db, "SELECT COUNT(*) AS n FROM purchases").await, 0);
}

#[tokio::test]
async fn purchase_without_enough_coins_leaves_balance_untouched() {
    let (engine, db) = engine_with_db().await;
    let alice = engine.create_or_authenticate("alice").await.unwrap();
    drain_to(&engine, alice, 50).await;
    let purchases_before = count(&db, "SELECT COUNT(*) AS n FROM purchases").await;

    let err = engine.purchase(alice, "t-shirt").await.unwrap_err();

    assert!(matches!(err, EngineError::InsufficientFunds(_)));
    assert!(!err.is_transient());
    assert_eq!(balance(&engine, alice).await, 50);
    assert_eq!(
        count(&db, "SELECT COUNT(*) AS n FROM purchases").await,
        purchases_before
    );
}

#[tokio::test]
async fn purchase_can_spend_the_last_coin() {
    let (engine, _db) = engine_with_db().await;
    let alice = engine.create_or_authenticate("alice").await.unwrap();
    drain_to(&engine, alice, 100).await;

    engine.purchase(alice, "book").await.unwrap();
    engine.purchase(alice, "book").await.unwrap();

    assert_eq!(balance(&engine, alice).await, 0);
    let err = engine.purchase(alice, "pen").await.unwrap_err();
    assert!(matches!(err, EngineError::InsufficientFunds(_)));
}

#[tokio::test]
async fn purchase_for_unknown_account_fails() {
    let (engine, db) = engine_with_db().await;
    let ghost = Uuid::new_v4();

    let err = engine.purchase(ghost, "pen").await.unwrap_err();

    assert_eq!(err, EngineError::UnknownAccount(ghost.to_string()));
    assert_eq!(count(&db, "SELECT COUNT(*) AS n FROM purchases").await, 0);
}

#[tokio::test]
async fn failure_after_debit_rolls_back_purchase() {
    let (engine, db) = engine_with_db().await;
    let alice = engine.create_or_authenticate("alice").await.unwrap();
    db.execute_unprepared(
        "CREATE TRIGGER reject_purchase BEFORE INSERT ON purchases \
         BEGIN SELECT RAISE(ABORT, 'injected failure'); END;",
    )
    .await
    .unwrap();

    let err = engine.purchase(alice, "t-shirt").await.unwrap_err();

    assert!(matches!(err, EngineError::Database(_)));
    assert_eq!(balance(&engine, alice).await, 1000);
    assert_eq!(count(&db, "SELECT COUNT(*) AS n FROM purchases").await, 0);
}

#[tokio::test]
async fn transfer_moves_coins_between_accounts() {
    let (engine, db) = engine_with_db().await;
    let bob = engine.create_or_authenticate("bob").await.unwrap();
    let carol = engine.create_or_authenticate("carol").await.unwrap();

    engine
        .transfer(TransferCmd::new(bob, "carol", 100))
        .await
        .unwrap();

    let bob_summary = engine.summary(bob).await.unwrap();
    let carol_summary = engine.summary(carol).await.unwrap();
    assert_eq!(bob_summary.balance, 900);
    assert_eq!(carol_summary.balance, 1100);

    assert_eq!(bob_summary.sent.len(), 1);
    assert_eq!(bob_summary.sent[0].counterparty, "carol");
    assert_eq!(bob_summary.sent[0].amount, 100);
    assert!(bob_summary.received.is_empty());

    assert_eq!(carol_summary.received.len(), 1);
    assert_eq!(carol_summary.received[0].counterparty, "bob");
    assert_eq!(carol_summary.received[0].amount, 100);
    assert!(carol_summary.sent.is_empty());

    assert_eq!(count(&db, "SELECT COUNT(*) AS n FROM transfers").await, 1);
}

#[tokio::test]
async fn transfers_conserve_total_coins() {
    let (engine, _db) = engine_with_db().await;
    let bob = engine.create_or_authenticate("bob").await.unwrap();
    let carol = engine.create_or_authenticate("carol").await.unwrap();
    let dave = engine.create_or_authenticate("dave").await.unwrap();

    engine.transfer(TransferCmd::new(bob, "carol", 250)).await.unwrap();
    engine.transfer(TransferCmd::new(carol, "dave", 1250)).await.unwrap();
    engine.transfer(TransferCmd::new(dave, "bob", 1)).await.unwrap();

    assert_eq!(balance(&engine, bob).await, 751);
    assert_eq!(balance(&engine, carol).await, 0);
    assert_eq!(balance(&engine, dave).await, 2249);
    assert_eq!(
        balance(&engine, bob).await + balance(&engine, carol).await + balance(&engine, dave).await,
        3000
    );
}

#[tokio::test]
async fn transfer_history_is_newest_first() {
    let (engine, _db) = engine_with_db().await;
    let bob = engine.create_or_authenticate("bob").await.unwrap();
    let carol = engine.create_or_authenticate("carol").await.unwrap();
    engine.create_or_authenticate("dave").await.unwrap();

    engine.transfer(TransferCmd::new(bob, "carol", 10)).await.unwrap();
    engine.transfer(TransferCmd::new(bob, "dave", 20)).await.unwrap();
    engine.transfer(TransferCmd::new(bob, "carol", 30)).await.unwrap();
    engine.transfer(TransferCmd::new(carol, "bob", 5)).await.unwrap();

    let summary = engine.summary(bob).await.unwrap();
    let sent: Vec<(&str, i64)> = summary
        .sent
        .iter()
        .map(|t| (t.counterparty.as_str(), t.amount))
        .collect();
    assert_eq!(sent, vec![("carol", 30), ("dave", 20), ("carol", 10)]);
    assert_eq!(summary.received.len(), 1);
    assert_eq!(summary.received[0].counterparty, "carol");
    assert_eq!(summary.total_sent(), 60);
    assert_eq!(summary.balance, 1000 - 60 + 5);
}

#[tokio::test]
async fn self_transfer_is_rejected() {
    let (engine, db) = engine_with_db().await;
    let bob = engine.create_or_authenticate("bob").await.unwrap();

    let err = engine
        .transfer(TransferCmd::new(bob, "bob", 10))
        .await
        .unwrap_err();

    assert_eq!(err, EngineError::SelfTransfer);
    assert_eq!(balance(&engine, bob).await, 1000);
    assert_eq!(count(&db, "SELECT COUNT(*) AS n FROM transfers").await, 0);
}

#[tokio::test]
async fn malformed_transfer_requests_are_rejected() {
    let (engine, _db) = engine_with_db().await;
    let bob = engine.create_or_authenticate("bob").await.unwrap();
    engine.create_or_authenticate("carol").await.unwrap();

    for cmd in [
        TransferCmd::new(bob, "carol", 0),
        TransferCmd::new(bob, "carol", -5),
        TransferCmd::new(bob, "  ", 10),
    ] {
        let err = engine.transfer(cmd).await.unwrap_err();
        assert!(
            matches!(err, EngineError::InvalidTransferRequest(_)),
            "unexpected error: {err:?}"
        );
    }
    assert_eq!(balance(&engine, bob).await, 1000);
}

#[tokio::test]
async fn transfer_to_unknown_recipient_is_rejected() {
    let (engine, _db) = engine_with_db().await;
    let bob = engine.create_or_authenticate("bob").await.unwrap();

    let err = engine
        .transfer(TransferCmd::new(bob, "nobody", 10))
        .await
        .unwrap_err();

    assert_eq!(err, EngineError::UnknownRecipient("nobody".to_string()));
    assert_eq!(balance(&engine, bob).await, 1000);
}

#[tokio::test]
async fn uncovered_transfer_changes_nothing() {
    let (engine, db) = engine_with_db().await;
    let bob = engine.create_or_authenticate("bob").await.unwrap();
    let carol = engine.create_or_authenticate("carol").await.unwrap();

    let err = engine
        .transfer(TransferCmd::new(bob, "carol", 1001))
        .await
        .unwrap_err();

    assert!(matches!(err, EngineError::InsufficientFunds(_)));
    assert_eq!(balance(&engine, bob).await, 1000);
    assert_eq!(balance(&engine, carol).await, 1000);
    assert_eq!(count(&db, "SELECT COUNT(*) AS n FROM transfers").await, 0);
}

#[tokio::test]
async fn failure_after_credit_rolls_back_both_balances() {
    let (engine, db) = engine_with_db().await;
    let bob = engine.create_or_authenticate("bob").await.unwrap();
    let carol = engine.create_or_authenticate("carol").await.unwrap();
    db.execute_unprepared(
        "CREATE TRIGGER reject_transfer BEFORE INSERT ON transfers \
         BEGIN SELECT RAISE(ABORT, 'injected failure'); END;",
    )
    .await
    .unwrap();

    let err = engine
        .transfer(TransferCmd::new(bob, "carol", 100))
        .await
        .unwrap_err();

    assert!(matches!(err, EngineError::Database(_)));
    assert_eq!(balance(&engine, bob).await, 1000);
    assert_eq!(balance(&engine, carol).await, 1000);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn concurrent_purchases_cannot_overdraw() {
    let (engine, db) = engine_with_db().await;
    let alice = engine.create_or_authenticate("alice").await.unwrap();
    drain_to(&engine, alice, 100).await;
    let purchases_before = count(&db, "SELECT COUNT(*) AS n FROM purchases").await;

    let (first, second) = tokio::join!(
        engine.purchase(alice, "t-shirt"),
        engine.purchase(alice, "t-shirt"),
    );

    let results = [first, second];
    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(results.iter().any(|r| matches!(
        r,
        Err(EngineError::InsufficientFunds(_))
    )));
    assert_eq!(balance(&engine, alice).await, 20);
    assert_eq!(
        count(&db, "SELECT COUNT(*) AS n FROM purchases").await,
        purchases_before + 1
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn concurrent_transfers_cannot_overdraw() {
    let (engine, _db) = engine_with_db().await;
    let bob = engine.create_or_authenticate("bob").await.unwrap();
    let carol = engine.create_or_authenticate("carol").await.unwrap();
    let dave = engine.create_or_authenticate("dave").await.unwrap();
    drain_to(&engine, bob, 100).await;

    let first = tokio::spawn({
        let engine = engine.clone();
        async move { engine.transfer(TransferCmd::new(bob, "carol", 80)).await }
    });
    let second = tokio::spawn({
        let engine = engine.clone();
        async move { engine.transfer(TransferCmd::new(bob, "dave", 80)).await }
    });
    let results = [first.await.unwrap(), second.await.unwrap()];

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(results.iter().any(|r| matches!(
        r,
        Err(EngineError::InsufficientFunds(_))
    )));
    assert_eq!(balance(&engine, bob).await, 20);
    assert_eq!(
        balance(&engine, carol).await + balance(&engine, dave).await,
        2080
    );
}

#[tokio::test]
async fn seeding_twice_keeps_one_row_per_item() {
    let (engine, db) = engine_with_db().await;

    let inserted = engine.seed_catalog().await.unwrap();

    assert_eq!(inserted, 0);
    assert_eq!(
        count(&db, "SELECT COUNT(*) AS n FROM catalog").await,
        STARTER_CATALOG.len() as i64
    );
    assert_eq!(
        count(
            &db,
            "SELECT COUNT(*) AS n FROM (SELECT name FROM catalog GROUP BY name HAVING COUNT(*) > 1)"
        )
        .await,
        0
    );
}

#[tokio::test]
async fn catalog_lists_seeded_prices() {
    let (engine, _db) = engine_with_db().await;

    let items = engine.catalog().await.unwrap();

    assert_eq!(items.len(), STARTER_CATALOG.len());
    let names: Vec<&str> = items.iter().map(|i| i.name.as_str()).collect();
    let mut sorted = names.clone();
    sorted.sort_unstable();
    assert_eq!(names, sorted);
    let t_shirt = items.iter().find(|i| i.name == "t-shirt").unwrap();
    assert_eq!(t_shirt.price, 80);
}

#[tokio::test]
async fn summary_of_unknown_account_fails() {
    let (engine, _db) = engine_with_db().await;
    let ghost = Uuid::new_v4();

    let err = engine.summary(ghost).await.unwrap_err();

    assert_eq!(err, EngineError::UnknownAccount(ghost.to_string()));
}

#[tokio::test]
async fn database_rejects_negative_balances_and_self_transfers() {
    let (engine, db) = engine_with_db().await;
    let bob = engine.create_or_authenticate("bob").await.unwrap();
    let backend = db.get_database_backend();

    let negative = db
        .execute(Statement::from_sql_and_values(
            backend,
            "UPDATE accounts SET balance = -1 WHERE id = ?",
            vec![bob.to_string().into()],
        ))
        .await;
    assert!(negative.is_err());

    let self_transfer = db
        .execute(Statement::from_sql_and_values(
            backend,
            "INSERT INTO transfers (from_id, to_id, amount, created_at) VALUES (?, ?, 10, '2026-01-01 00:00:00+00:00')",
            vec![bob.to_string().into(), bob.to_string().into()],
        ))
        .await;
    assert!(self_transfer.is_err());

    assert_eq!(balance(&engine, bob).await, 1000);
}

#[tokio::test]
async fn unit_of_work_times_out_without_side_effects() {
    let (engine, db) = engine_with_db().await;
    let alice = engine.create_or_authenticate("alice").await.unwrap();
    let limit = Duration::from_millis(100);
    let bounded = Engine::builder()
        .database(db.clone())
        .unit_timeout(limit)
        .build()
        .await
        .unwrap();

    // Holds the only pooled connection, so the purchase cannot start.
    let blocker = db.begin().await.unwrap();
    let err = bounded.purchase(alice, "t-shirt").await.unwrap_err();
    blocker.rollback().await.unwrap();

    assert_eq!(err, EngineError::Timeout(limit));
    assert!(err.is_transient());
    assert_eq!(balance(&engine, alice).await, 1000);
    assert_eq!(engine.summary(alice).await.unwrap().inventory.len(), 0);
}

#[tokio::test]
async fn builder_without_database_fails() {
    let err = Engine::builder().build().await.unwrap_err();

    assert!(matches!(err, EngineError::StorageUnavailable(_)));
}

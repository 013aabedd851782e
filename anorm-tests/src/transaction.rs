use crate::registry;
use anorm::{Connection, Entity, Orm, OrmError, TxManager};
use std::sync::{Arc, LazyLock};
use tokio::sync::Mutex;

#[derive(Entity, Default, Debug, Clone, PartialEq)]
pub struct Account {
    #[orm("pk{T} ig{T} def{id INTEGER}")]
    pub id: i64,
    #[orm("def{owner VARCHAR(64) NOT NULL}")]
    pub owner: String,
    #[orm("def{balance INTEGER NOT NULL}")]
    pub balance: i64,
}

static MUTEX: LazyLock<Mutex<()>> = LazyLock::new(|| Mutex::new(()));

pub async fn transaction(connection: Arc<dyn Connection>) {
    let _lock = MUTEX.lock().await;

    // Setup
    let registry = registry(connection);
    registry
        .register_default::<Account>()
        .await
        .expect("Failed to register Account");
    let orm = Orm::<Account>::new(&registry).expect("Failed to create the Account handle");
    orm.delete()
        .execute(None)
        .await
        .expect("Failed to clear the account table");

    // Rollback
    let manager = TxManager::new();
    orm.begin_tx(&manager)
        .await
        .expect("Failed to begin the transaction");
    assert!(orm.in_transaction().await);
    orm.insert()
        .one(&mut Account {
            owner: "alice".into(),
            balance: 100,
            ..Default::default()
        })
        .await
        .expect("Failed to insert inside the transaction");
    assert_eq!(
        orm.select_count()
            .count(None)
            .await
            .expect("Failed to count inside the transaction"),
        1
    );
    manager
        .rollback()
        .await
        .expect("Failed to roll back the transaction");
    assert!(!orm.in_transaction().await);
    assert_eq!(
        orm.select_count()
            .count(None)
            .await
            .expect("Failed to count after the rollback"),
        0
    );

    // A handle binds one transaction at most
    let error = orm
        .begin_tx(&TxManager::new())
        .await
        .expect_err("The handle already had a transaction");
    assert_eq!(
        error.downcast_ref::<OrmError>(),
        Some(&OrmError::AlreadyBoundTx)
    );

    // Commit
    let orm = Orm::<Account>::new(&registry).expect("Failed to create the Account handle");
    let manager = TxManager::new();
    orm.begin_tx(&manager)
        .await
        .expect("Failed to begin the transaction");
    assert_eq!(manager.len().await, 1);
    let mut account = Account {
        owner: "bob".into(),
        balance: 50,
        ..Default::default()
    };
    orm.insert()
        .one(&mut account)
        .await
        .expect("Failed to insert inside the transaction");
    account.balance = 75;
    orm.update()
        .by_pk(&account)
        .await
        .expect("Failed to update inside the transaction");
    manager
        .commit()
        .await
        .expect("Failed to commit the transaction");
    let error = manager
        .commit()
        .await
        .expect_err("The transaction is already committed");
    assert_eq!(error.downcast_ref::<OrmError>(), Some(&OrmError::TxNotOpen));

    let other = Orm::<Account>::new(&registry).expect("Failed to create the Account handle");
    let bob_example = Account {
        owner: "bob".into(),
        ..Default::default()
    };
    let (committed, total) = tokio::join!(
        other.select().one(Some(&bob_example)),
        other.select_count().count(None),
    );
    let committed = committed
        .expect("Failed to select the committed account")
        .expect("The committed account must be found");
    assert_eq!(committed, account);
    assert_eq!(total.expect("Failed to count the accounts"), 1);
}

use crate::registry;
use anorm::{Connection, Entity, Orm, Value};
use std::sync::{Arc, LazyLock};
use tokio::sync::Mutex;

#[derive(Entity, Default, Debug, Clone, PartialEq)]
pub struct SimpleUser {
    #[orm("pk{T} ig{T} def{id INTEGER}")]
    pub id: i64,
    #[orm("def{name VARCHAR(64) NOT NULL}")]
    pub name: String,
    #[orm("def{age INTEGER NOT NULL}")]
    pub age: i32,
}

static MUTEX: LazyLock<Mutex<()>> = LazyLock::new(|| Mutex::new(()));

pub async fn simple(connection: Arc<dyn Connection>) {
    let _lock = MUTEX.lock().await;

    // Setup
    let registry = registry(connection);
    let meta = registry
        .register_default::<SimpleUser>()
        .await
        .expect("Failed to register SimpleUser");
    assert_eq!(meta.table_name, "simple_user");
    assert_eq!(meta.primary_keys, ["id"]);
    let orm = Orm::<SimpleUser>::new(&registry).expect("Failed to create the SimpleUser handle");
    orm.delete()
        .execute(None)
        .await
        .expect("Failed to clear the simple_user table");

    // Insert
    let mut user = SimpleUser {
        name: "a".into(),
        age: 20,
        ..Default::default()
    };
    orm.insert()
        .one(&mut user)
        .await
        .expect("Failed to insert the user");
    assert!(user.id > 0, "The generated id must be written back");

    // Select by example
    let found = orm
        .select()
        .one(Some(&SimpleUser {
            name: "a".into(),
            ..Default::default()
        }))
        .await
        .expect("Failed to select the user")
        .expect("The user must be found");
    assert_eq!(found, user);

    // Update only the name
    let updated = orm
        .update()
        .set(["name"])
        .by_pk(&SimpleUser {
            id: user.id,
            name: "b".into(),
            age: 99,
        })
        .await
        .expect("Failed to update the user");
    assert_eq!(updated, 1);
    let found = orm
        .select()
        .list(Some(&SimpleUser {
            id: user.id,
            ..Default::default()
        }))
        .await
        .expect("Failed to select the updated user");
    assert_eq!(
        found,
        [SimpleUser {
            id: user.id,
            name: "b".into(),
            age: 20,
        }]
    );

    // Raw SQL
    let affected = orm
        .exec_raw(
            "UPDATE simple_user SET age = age + ? WHERE id = ?",
            vec![Value::from(1_i32), Value::from(user.id)],
        )
        .await
        .expect("Failed to run the raw update");
    assert_eq!(affected.rows_affected, 1);
    let raw = orm
        .query_raw(
            "SELECT id, name, age FROM simple_user WHERE age > ?",
            vec![Value::from(20_i32)],
        )
        .await
        .expect("Failed to run the raw query");
    assert_eq!(raw.len(), 1);
    assert_eq!(raw[0].age, 21);

    // Delete by example
    let deleted = orm
        .delete()
        .execute(Some(&SimpleUser {
            name: "b".into(),
            ..Default::default()
        }))
        .await
        .expect("Failed to delete the user");
    assert_eq!(deleted, 1);
    let count = orm
        .select_count()
        .count(None)
        .await
        .expect("Failed to count the users");
    assert_eq!(count, 0);
}

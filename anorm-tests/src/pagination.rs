use crate::registry;
use anorm::{Connection, Entity, MySql, OrderBy, Orm, Pg, Predicate};
use std::sync::{Arc, LazyLock};
use tokio::sync::Mutex;

#[derive(Entity, Default, Debug, Clone, PartialEq)]
pub struct Item {
    #[orm("pk{T} ig{T} def{id INTEGER}")]
    pub id: i64,
    #[orm("def{label VARCHAR(32) NOT NULL}")]
    pub label: String,
    #[orm("def{weight INTEGER NOT NULL}")]
    pub weight: i32,
}

static MUTEX: LazyLock<Mutex<()>> = LazyLock::new(|| Mutex::new(()));

pub async fn pagination(connection: Arc<dyn Connection>) {
    let _lock = MUTEX.lock().await;

    // Setup
    let registry = registry(connection);
    registry
        .register_default::<Item>()
        .await
        .expect("Failed to register Item");
    let orm = Orm::<Item>::new(&registry).expect("Failed to create the Item handle");
    orm.delete()
        .execute(None)
        .await
        .expect("Failed to clear the item table");
    let items = (1..=25)
        .map(|weight| Item {
            label: format!("item {weight}"),
            weight,
            ..Default::default()
        })
        .collect::<Vec<_>>();
    let inserted = orm
        .insert()
        .batch(&items)
        .await
        .expect("Failed to insert the items");
    assert_eq!(inserted, 25);

    // Pages
    let (page, total) = orm
        .select()
        .order_by(OrderBy::asc("t.weight"))
        .page(None, &Pg, 10, 10)
        .await
        .expect("Failed to read the second page");
    assert_eq!(total, 25);
    assert_eq!(
        page.iter().map(|v| v.weight).collect::<Vec<_>>(),
        (11..=20).collect::<Vec<_>>()
    );
    let (page, total) = orm
        .select()
        .order_by(OrderBy::asc("t.weight"))
        .page(None, &MySql, 20, 10)
        .await
        .expect("Failed to read the last page");
    assert_eq!(total, 25);
    assert_eq!(page.len(), 5);
    assert_eq!(page[0].label, "item 21");

    let (page, total) = orm
        .select()
        .and_where(Predicate::le("t.weight", 3_i32))
        .page(None, &Pg, 0, 10)
        .await
        .expect("Failed to read a filtered page");
    assert_eq!((page.len(), total), (3, 3));

    let (page, total) = orm
        .select()
        .page(
            Some(&Item {
                weight: 999,
                ..Default::default()
            }),
            &Pg,
            0,
            10,
        )
        .await
        .expect("Failed to read an empty page");
    assert!(page.is_empty());
    assert_eq!(total, 0);

    // Update on explicit predicates only
    let updated = orm
        .update()
        .set(["label"])
        .only_where(Predicate::lt("weight", 5_i32))
        .by_pk(&Item {
            label: "low".into(),
            ..Default::default()
        })
        .await
        .expect("Failed to update the low weights");
    assert_eq!(updated, 4);
    let low = orm
        .select_count()
        .count(Some(&Item {
            label: "low".into(),
            ..Default::default()
        }))
        .await
        .expect("Failed to count the low weights");
    assert_eq!(low, 4);

    // Update each record by primary key
    let mut top = orm
        .select()
        .and_where(Predicate::gt("t.weight", 22_i32))
        .list(None)
        .await
        .expect("Failed to select the top weights");
    top.iter_mut().for_each(|v| v.label = "top".into());
    let updated = orm
        .update()
        .list(false, &top)
        .await
        .expect("Failed to update the top weights");
    assert_eq!(updated, 3);

    // Delete on predicates
    let deleted = orm
        .delete()
        .and_where(Predicate::eq("label", "top"))
        .and_where_if(false, Predicate::eq("weight", 1_i32))
        .execute(None)
        .await
        .expect("Failed to delete the top weights");
    assert_eq!(deleted, 3);
    let count = orm
        .select_count()
        .count(None)
        .await
        .expect("Failed to count the items");
    assert_eq!(count, 22);
}

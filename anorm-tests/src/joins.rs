use crate::registry;
use anorm::{
    Connection, Entity, JoinClause, JoinType, NullField, OrderBy, Orm, Predicate,
};
use std::sync::{Arc, LazyLock};
use tokio::sync::Mutex;

#[derive(Entity, Default, Debug, Clone, PartialEq)]
pub struct Department {
    #[orm("pk{T} ig{T} def{id INTEGER}")]
    pub id: i64,
    #[orm("def{title VARCHAR(64) NOT NULL}")]
    pub title: String,
}

#[derive(Entity, Default, Debug, Clone, PartialEq)]
pub struct Employee {
    #[orm("pk{T} ig{T} def{id INTEGER}")]
    pub id: i64,
    #[orm("def{name VARCHAR(64) NOT NULL}")]
    pub name: String,
    #[orm("def{department_id INTEGER NOT NULL}")]
    pub department_id: i64,
    #[orm("ig{T} ug{T} join{left, department_id, department, id, title}")]
    pub department_title: String,
}

static MUTEX: LazyLock<Mutex<()>> = LazyLock::new(|| Mutex::new(()));

pub async fn joins(connection: Arc<dyn Connection>) {
    let _lock = MUTEX.lock().await;

    // Setup
    let registry = registry(connection);
    registry
        .register_default::<Department>()
        .await
        .expect("Failed to register Department");
    let meta = registry
        .register::<Employee>(|config| {
            config.join_null_fields.insert(
                "department_title".into(),
                NullField::literal("IFNULL", "none"),
            );
        })
        .await
        .expect("Failed to register Employee");
    assert_eq!(meta.join_refs.len(), 1);
    assert_eq!(meta.join_refs[0].join_type, JoinType::Left);
    let departments = Orm::<Department>::new(&registry).expect("Failed to create the handle");
    let employees = Orm::<Employee>::new(&registry).expect("Failed to create the handle");
    departments
        .delete()
        .execute(None)
        .await
        .expect("Failed to clear the department table");
    employees
        .delete()
        .execute(None)
        .await
        .expect("Failed to clear the employee table");

    let mut engineering = Department {
        title: "Engineering".into(),
        ..Default::default()
    };
    departments
        .insert()
        .one(&mut engineering)
        .await
        .expect("Failed to insert the department");
    let inserted = employees
        .insert()
        .batch(&[
            Employee {
                name: "Ada".into(),
                department_id: engineering.id,
                ..Default::default()
            },
            Employee {
                name: "Linus".into(),
                department_id: engineering.id,
                ..Default::default()
            },
            Employee {
                name: "Nobody".into(),
                department_id: engineering.id + 1000,
                ..Default::default()
            },
        ])
        .await
        .expect("Failed to insert the employees");
    assert_eq!(inserted, 3);

    // Without join the virtual column is not read
    let plain = employees
        .select()
        .order_by(OrderBy::asc("t.id"))
        .list(None)
        .await
        .expect("Failed to select the employees");
    assert_eq!(plain.len(), 3);
    assert!(plain.iter().all(|v| v.department_title.is_empty()));

    // With join
    let joined = employees
        .select()
        .join()
        .order_by(OrderBy::asc("t.id"))
        .list(None)
        .await
        .expect("Failed to select the employees with join");
    let titles = joined
        .iter()
        .map(|v| (v.name.as_str(), v.department_title.as_str()))
        .collect::<Vec<_>>();
    assert_eq!(
        titles,
        [("Ada", "Engineering"), ("Linus", "Engineering"), ("Nobody", "none")]
    );

    // The virtual field never filters by example
    let found = employees
        .select()
        .join()
        .list(Some(&Employee {
            name: "Linus".into(),
            department_title: "Marketing".into(),
            ..Default::default()
        }))
        .await
        .expect("Failed to select by example with join");
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].department_title, "Engineering");

    let count = employees
        .select_count()
        .join_clause(JoinClause {
            join_type: JoinType::Inner,
            table: "department".into(),
            alias: "d".into(),
            left: "d.id".into(),
            right: "t.department_id".into(),
        })
        .and_where(Predicate::eq("d.title", "Engineering"))
        .count(None)
        .await
        .expect("Failed to count the engineers");
    assert_eq!(count, 2);
}

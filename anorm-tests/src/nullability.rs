use crate::registry;
use anorm::{Connection, Entity, NullField, Nullable, OrderBy, Orm, Predicate};
use std::sync::{Arc, LazyLock};
use time::macros::datetime;
use tokio::sync::Mutex;

#[derive(Entity, Default, Debug, Clone, PartialEq)]
pub struct Profile {
    #[orm("pk{T} ig{T} def{id INTEGER}")]
    pub id: i64,
    #[orm("def{nickname VARCHAR(32)}")]
    pub nickname: Nullable<String>,
    #[orm("def{score INTEGER}")]
    pub score: Nullable<i32>,
    #[orm("def{born VARCHAR(32)}")]
    pub born: Option<time::PrimitiveDateTime>,
}

static MUTEX: LazyLock<Mutex<()>> = LazyLock::new(|| Mutex::new(()));

pub async fn nullability(connection: Arc<dyn Connection>) {
    let _lock = MUTEX.lock().await;

    // Setup
    let registry = registry(connection.clone());
    registry
        .register_default::<Profile>()
        .await
        .expect("Failed to register Profile");
    let orm = Orm::<Profile>::new(&registry).expect("Failed to create the Profile handle");
    orm.delete()
        .execute(None)
        .await
        .expect("Failed to clear the profile table");

    let mut profiles = [
        Profile {
            id: 0,
            nickname: Nullable::null(),
            score: Nullable::new(0),
            born: None,
        },
        Profile {
            id: 0,
            nickname: Nullable::new("neo".into()),
            score: Nullable::null(),
            born: Some(datetime!(1990-05-01 10:00)),
        },
    ];
    orm.insert()
        .list(false, &mut profiles)
        .await
        .expect("Failed to insert the profiles");
    assert!(profiles.iter().all(|v| v.id > 0));

    // A valid zero filters
    let found = orm
        .select()
        .list(Some(&Profile {
            score: Nullable::new(0),
            ..Default::default()
        }))
        .await
        .expect("Failed to select by a valid zero");
    assert_eq!(found, [profiles[0].clone()]);
    assert!(!found[0].nickname.valid);
    assert_eq!(found[0].born, None);

    // A valid empty string filters as well
    let found = orm
        .select()
        .list(Some(&Profile {
            nickname: Nullable::new(String::new()),
            ..Default::default()
        }))
        .await
        .expect("Failed to select by an empty nickname");
    assert!(found.is_empty());

    // Timestamps
    let found = orm
        .select()
        .one(Some(&Profile {
            born: Some(datetime!(1990-05-01 10:00)),
            ..Default::default()
        }))
        .await
        .expect("Failed to select by timestamp")
        .expect("The profile must be found");
    assert_eq!(found, profiles[1]);
    assert_eq!(found.score.into_option(), None);

    let count = orm
        .select_count()
        .and_where(Predicate::is_null("t.nickname"))
        .count(None)
        .await
        .expect("Failed to count the anonymous profiles");
    assert_eq!(count, 1);

    // NULL replacement in the projection
    let registry = crate::registry(connection);
    registry
        .register::<Profile>(|config| {
            config.null_fields.insert(
                "nickname".into(),
                NullField::parameter("IFNULL", "anonymous"),
            );
        })
        .await
        .expect("Failed to register Profile again in a new registry");
    let orm = Orm::<Profile>::new(&registry).expect("Failed to create the Profile handle");
    let found = orm
        .select()
        .order_by(OrderBy::asc("t.id"))
        .list(None)
        .await
        .expect("Failed to select with a null replacement");
    assert_eq!(found.len(), 2);
    assert_eq!(found[0].nickname, Nullable::new("anonymous".to_string()));
    assert_eq!(found[1].nickname, Nullable::new("neo".to_string()));
}

mod resource {
    pub mod mock;
}

#[cfg(test)]
mod tests {
    use crate::resource::mock::MockConnection;
    use anorm::{
        Config, DataSourcePool, Entity, Error, ExecHook, JoinClause, JoinType, MySql, NullField,
        Orm, OrmError, Pg, Predicate, Query, Registry, TxManager, Value,
    };
    use std::sync::{Arc, Mutex};
    use time::{PrimitiveDateTime, macros::datetime};

    #[derive(Entity, Default, Debug, Clone, PartialEq)]
    struct Book {
        #[orm("pk{T} ig{T}")]
        id: i64,
        title: String,
        #[orm("c{author_name}")]
        author: String,
        pages: u32,
        #[orm("ug{T}")]
        created: Option<PrimitiveDateTime>,
        #[orm("ig{T} ug{T} join{inner, author_name, author, name, country}")]
        country: String,
    }

    #[derive(Entity, Default, Debug)]
    struct Counter {
        #[orm("pk{T} ig{T}")]
        id: u32,
        hits: i32,
    }

    #[derive(Entity, Default, Debug)]
    struct Pair {
        #[orm("pk{T}")]
        left: i32,
        #[orm("pk{T}")]
        right: i32,
    }

    const BOOK_COLUMNS: &str =
        "t.id AS id, t.title AS title, t.author_name AS author, t.pages AS pages, t.created AS created";
    const BOOK_LABELS: [&str; 5] = ["id", "title", "author", "pages", "created"];

    fn dune() -> Book {
        Book {
            id: 1,
            title: "Dune".into(),
            author: "Herbert".into(),
            pages: 412,
            created: Some(datetime!(1965-08-01 0:00)),
            ..Default::default()
        }
    }

    fn book_row(id: i64, title: &str) -> Vec<Value> {
        vec![
            Value::Int64(Some(id)),
            Value::Varchar(Some(title.into())),
            Value::Varchar(Some("Herbert".into())),
            Value::Int64(Some(412)),
            Value::Null,
        ]
    }

    async fn setup_with(config: Config) -> (MockConnection, Registry) {
        let mock = MockConnection::new();
        let pool = Arc::new(DataSourcePool::new());
        pool.push(mock.as_dyn());
        let registry = Registry::new(config, pool);
        registry.register_default::<Book>().await.unwrap();
        registry.register_default::<Counter>().await.unwrap();
        registry.register_default::<Pair>().await.unwrap();
        (mock, registry)
    }

    async fn setup() -> (MockConnection, Registry) {
        setup_with(Config::default()).await
    }

    fn orm_error(error: &Error) -> Option<&OrmError> {
        error.downcast_ref::<OrmError>()
    }

    #[tokio::test]
    async fn insert_one() {
        let (mock, registry) = setup().await;
        let orm = Orm::<Book>::new(&registry).unwrap();
        let mut book = dune();
        book.id = 0;
        mock.respond_affected(1, Some(42));
        orm.insert().one(&mut book).await.unwrap();
        assert_eq!(book.id, 42);
        assert_eq!(
            mock.queries(),
            [Query::new(
                "INSERT INTO book (title, author_name, pages, created) VALUES (?, ?, ?, ?)",
                vec![
                    Value::Varchar(Some("Dune".into())),
                    Value::Varchar(Some("Herbert".into())),
                    Value::UInt32(Some(412)),
                    Value::Timestamp(Some(datetime!(1965-08-01 0:00))),
                ]
            )]
        );

        mock.clear();
        orm.insert().ignore(["created"]).one(&mut book).await.unwrap();
        assert_eq!(
            mock.sqls(),
            ["INSERT INTO book (title, author_name, pages) VALUES (?, ?, ?)"]
        );
        assert_eq!(book.id, 42, "No generated id, the record is unchanged");
    }

    #[tokio::test]
    async fn insert_generated_keys() {
        let (mock, registry) = setup().await;
        let counters = Orm::<Counter>::new(&registry).unwrap();
        let mut counter = Counter { id: 0, hits: 3 };
        mock.respond_affected(1, Some(7));
        counters.insert().one(&mut counter).await.unwrap();
        assert_eq!(counter.id, 7);

        let pairs = Orm::<Pair>::new(&registry).unwrap();
        let mut pair = Pair { left: 1, right: 2 };
        mock.respond_affected(1, Some(9));
        pairs.insert().one(&mut pair).await.unwrap();
        assert_eq!((pair.left, pair.right), (1, 2));
        assert_eq!(
            mock.sqls().last().map(String::as_str),
            Some("INSERT INTO pair (left, right) VALUES (?, ?)")
        );
    }

    #[tokio::test]
    async fn insert_many() {
        let (mock, registry) = setup().await;
        let orm = Orm::<Book>::new(&registry).unwrap();
        let books = vec![dune(), Book::default()];
        mock.respond_affected(2, Some(8));
        assert_eq!(orm.insert().batch(&books).await.unwrap(), 2);
        assert_eq!(
            mock.sqls(),
            ["INSERT INTO book (title, author_name, pages, created) VALUES (?, ?, ?, ?), (?, ?, ?, ?)"]
        );
        assert_eq!(mock.queries()[0].params.len(), 8);
        assert_eq!(books[1].id, 0);

        mock.clear();
        assert_eq!(orm.insert().batch(&[]).await.unwrap(), 0);
        assert!(mock.sqls().is_empty());

        let mut books = vec![Book::default(), Book::default(), Book::default()];
        mock.respond_error("first failure")
            .respond_affected(1, Some(5))
            .respond_error("last failure");
        let error = orm.insert().list(true, &mut books).await.unwrap_err();
        assert_eq!(error.to_string(), "last failure");
        assert_eq!(mock.sqls().len(), 3);
        assert_eq!(books[1].id, 5);

        mock.clear();
        mock.respond_error("stop here");
        let error = orm.insert().list(false, &mut books).await.unwrap_err();
        assert_eq!(error.to_string(), "stop here");
        assert_eq!(mock.sqls().len(), 1);
    }

    #[tokio::test]
    async fn select() {
        let (mock, registry) = setup().await;
        let orm = Orm::<Book>::new(&registry).unwrap();
        mock.respond_rows(&BOOK_LABELS, vec![book_row(1, "Dune")]);
        let example = Book {
            title: "Dune".into(),
            ..Default::default()
        };
        let books = orm.select().list(Some(&example)).await.unwrap();
        assert_eq!(
            books,
            [Book {
                created: None,
                ..dune()
            }]
        );
        assert_eq!(
            mock.queries(),
            [Query::new(
                format!("SELECT {BOOK_COLUMNS} FROM book AS t WHERE t.title = ?"),
                vec![Value::Varchar(Some("Dune".into()))]
            )]
        );

        mock.clear();
        let example = Book {
            author: "Herbert".into(),
            country: "US".into(),
            ..Default::default()
        };
        orm.select()
            .and_where(Predicate::gt("t.pages", 100_u32))
            .list(Some(&example))
            .await
            .unwrap();
        assert_eq!(
            mock.sqls(),
            [format!(
                "SELECT {BOOK_COLUMNS} FROM book AS t WHERE t.pages > ? AND t.author_name = ?"
            )]
        );

        mock.clear();
        orm.select()
            .and_where(Predicate::gt("t.pages", 100_u32))
            .only_where(Predicate::like("t.title", "D%"))
            .list(Some(&example))
            .await
            .unwrap();
        assert_eq!(
            mock.queries(),
            [Query::new(
                format!("SELECT {BOOK_COLUMNS} FROM book AS t WHERE t.title LIKE ?"),
                vec![Value::Varchar(Some("D%".into()))]
            )]
        );
    }

    #[tokio::test]
    async fn select_join() {
        let (mock, registry) = setup().await;
        let orm = Orm::<Book>::new(&registry).unwrap();
        let mut row = book_row(1, "Dune");
        row.push(Value::Varchar(Some("US".into())));
        let mut labels = BOOK_LABELS.to_vec();
        labels.push("country");
        mock.respond_rows(&labels, vec![row]);
        let books = orm.select().join().list(None).await.unwrap();
        assert_eq!(books[0].country, "US");
        assert_eq!(
            mock.sqls(),
            [format!(
                "SELECT {BOOK_COLUMNS}, rel1.country AS country FROM book AS t INNER JOIN author AS rel1 ON rel1.name = t.author_name"
            )]
        );
    }

    #[tokio::test]
    async fn select_one() {
        let (mock, registry) = setup().await;
        let orm = Orm::<Book>::new(&registry).unwrap();
        mock.respond_rows(&BOOK_LABELS, vec![book_row(1, "Dune"), book_row(2, "Emma")]);
        let error = orm.select().one(None).await.unwrap_err();
        assert_eq!(
            orm_error(&error),
            Some(&OrmError::TooManyResults { count: 2 })
        );
        assert!(orm.select().one(None).await.unwrap().is_none());
        mock.respond_rows(&BOOK_LABELS, vec![book_row(2, "Emma")]);
        let book = orm.select().one(None).await.unwrap().unwrap();
        assert_eq!(book.title, "Emma");
    }

    #[tokio::test]
    async fn update() {
        let (mock, registry) = setup().await;
        let orm = Orm::<Book>::new(&registry).unwrap();
        mock.respond_affected(1, None);
        assert_eq!(orm.update().by_pk(&dune()).await.unwrap(), 1);
        assert_eq!(
            mock.queries(),
            [Query::new(
                "UPDATE book SET title = ?, author_name = ?, pages = ? WHERE id = ?",
                vec![
                    Value::Varchar(Some("Dune".into())),
                    Value::Varchar(Some("Herbert".into())),
                    Value::UInt32(Some(412)),
                    Value::Int64(Some(1)),
                ]
            )]
        );

        mock.clear();
        orm.update().set(["created"]).by_pk(&dune()).await.unwrap();
        orm.update().ignore(["pages"]).by_pk(&dune()).await.unwrap();
        orm.update()
            .set(["id"])
            .and_where(Predicate::eq("id", 1_i64))
            .by_pk(&Book { id: 2, ..dune() })
            .await
            .unwrap();
        orm.update()
            .only_where(Predicate::eq("author_name", "Herbert"))
            .by_pk(&dune())
            .await
            .unwrap();
        assert_eq!(
            mock.sqls(),
            [
                "UPDATE book SET created = ? WHERE id = ?",
                "UPDATE book SET title = ?, author_name = ? WHERE id = ?",
                "UPDATE book SET id = ? WHERE id = ?",
                "UPDATE book SET title = ?, author_name = ?, pages = ? WHERE author_name = ?",
            ]
        );
        assert_eq!(
            mock.queries()[2].params,
            [Value::Int64(Some(2)), Value::Int64(Some(1))]
        );

        let pairs = Orm::<Pair>::new(&registry).unwrap();
        let error = pairs
            .update()
            .by_pk(&Pair { left: 1, right: 2 })
            .await
            .unwrap_err();
        assert!(matches!(
            orm_error(&error),
            Some(OrmError::NothingToUpdate { .. })
        ));
    }

    #[tokio::test]
    async fn update_list() {
        let (mock, registry) = setup().await;
        let orm = Orm::<Book>::new(&registry).unwrap();
        let books = [dune(), Book { id: 2, ..dune() }, Book { id: 3, ..dune() }];
        mock.respond_affected(1, None)
            .respond_error("locked")
            .respond_affected(1, None);
        let error = orm.update().list(true, &books).await.unwrap_err();
        assert_eq!(error.to_string(), "locked");
        assert_eq!(mock.sqls().len(), 3);

        mock.clear();
        mock.respond_affected(1, None)
            .respond_affected(1, None)
            .respond_affected(0, None);
        assert_eq!(orm.update().list(false, &books).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn delete_and_count() {
        let (mock, registry) = setup().await;
        let orm = Orm::<Book>::new(&registry).unwrap();
        let example = Book {
            author: "Herbert".into(),
            ..Default::default()
        };
        mock.respond_affected(3, None);
        assert_eq!(orm.delete().execute(Some(&example)).await.unwrap(), 3);
        orm.delete().execute(None).await.unwrap();
        orm.delete()
            .and_where_if(false, Predicate::eq("pages", 0_u32))
            .only_where(Predicate::is_null("created"))
            .execute(Some(&example))
            .await
            .unwrap();
        assert_eq!(
            mock.sqls(),
            [
                "DELETE FROM book WHERE author_name = ?",
                "DELETE FROM book",
                "DELETE FROM book WHERE created IS NULL",
            ]
        );

        mock.clear();
        mock.respond_rows(&["c"], vec![vec![Value::Int64(Some(3))]]);
        let example = Book {
            pages: 100,
            ..Default::default()
        };
        assert_eq!(orm.select_count().count(Some(&example)).await.unwrap(), 3);
        orm.select_count()
            .join_clause(JoinClause {
                join_type: JoinType::Inner,
                table: "author".into(),
                alias: "a".into(),
                left: "a.name".into(),
                right: "t.author_name".into(),
            })
            .and_where(Predicate::eq("a.country", "FR"))
            .count(None)
            .await
            .unwrap();
        assert_eq!(
            mock.sqls(),
            [
                "SELECT count(0) AS c FROM book AS t WHERE t.pages = ?",
                "SELECT count(0) AS c FROM book AS t INNER JOIN author AS a ON a.name = t.author_name WHERE a.country = ?",
            ]
        );
    }

    #[tokio::test]
    async fn page() {
        let (mock, registry) = setup().await;
        let orm = Orm::<Book>::new(&registry).unwrap();
        let (books, total) = orm.select().page(None, &Pg, 0, 10).await.unwrap();
        assert!(books.is_empty());
        assert_eq!(total, 0);
        assert_eq!(mock.sqls(), ["SELECT count(0) AS c FROM book AS t"]);

        mock.clear();
        mock.respond_rows(&["c"], vec![vec![Value::Int64(Some(12))]])
            .respond_rows(&BOOK_LABELS, vec![book_row(11, "Emma")]);
        let (books, total) = orm
            .select()
            .and_where(Predicate::ge("t.pages", 100_u32))
            .page(None, &Pg, 10, 5)
            .await
            .unwrap();
        assert_eq!(total, 12);
        assert_eq!(books.len(), 1);
        assert_eq!(
            mock.queries(),
            [
                Query::new(
                    "SELECT count(0) AS c FROM book AS t WHERE t.pages >= ?",
                    vec![Value::UInt32(Some(100))]
                ),
                Query::new(
                    format!("SELECT {BOOK_COLUMNS} FROM book AS t WHERE t.pages >= ? LIMIT ? OFFSET ?"),
                    vec![
                        Value::UInt32(Some(100)),
                        Value::UInt64(Some(5)),
                        Value::UInt64(Some(10)),
                    ]
                ),
            ]
        );

        mock.clear();
        orm.select().join().page(None, &MySql, 0, 10).await.unwrap();
        orm.select()
            .join()
            .count_join()
            .page(None, &MySql, 0, 10)
            .await
            .unwrap();
        assert_eq!(
            mock.sqls(),
            [
                "SELECT count(0) AS c FROM book AS t",
                "SELECT count(0) AS c FROM book AS t INNER JOIN author AS rel1 ON rel1.name = t.author_name",
            ]
        );
    }

    #[derive(Default)]
    struct Audit {
        entities: Mutex<Vec<String>>,
        errors: Mutex<Vec<Option<String>>>,
    }

    impl ExecHook for Audit {
        fn before_exec(&self, entity: &str, query: &mut Query) {
            self.entities.lock().unwrap().push(entity.to_string());
            query.sql = format!("/* audited */ {}", query.sql);
        }
        fn after_exec(&self, _entity: &str, _query: &Query, error: Option<&Error>) {
            self.errors
                .lock()
                .unwrap()
                .push(error.map(|e| e.to_string()));
        }
    }

    #[tokio::test]
    async fn hooks() {
        let audit = Arc::new(Audit::default());
        let (mock, registry) = setup_with(Config {
            insert_hooks: vec![audit.clone() as Arc<dyn ExecHook>],
            select_hooks: vec![audit.clone() as Arc<dyn ExecHook>],
            ..Default::default()
        })
        .await;
        let orm = Orm::<Book>::new(&registry).unwrap();
        mock.respond_error("duplicate key");
        assert!(orm.insert().one(&mut dune()).await.is_err());
        orm.select().list(None).await.unwrap();
        orm.delete().execute(None).await.unwrap();
        orm.exec_raw("DELETE FROM author", Vec::new()).await.unwrap();
        assert_eq!(
            mock.sqls(),
            [
                "/* audited */ INSERT INTO book (title, author_name, pages, created) VALUES (?, ?, ?, ?)".to_string(),
                format!("/* audited */ SELECT {BOOK_COLUMNS} FROM book AS t"),
                "DELETE FROM book".to_string(),
                "DELETE FROM author".to_string(),
            ]
        );
        let entities = audit.entities.lock().unwrap().clone();
        assert_eq!(entities.len(), 2);
        assert!(entities.iter().all(|v| v.ends_with("Book")));
        assert_eq!(
            *audit.errors.lock().unwrap(),
            [Some("duplicate key".to_string()), None]
        );
    }

    #[tokio::test]
    async fn raw() {
        let (mock, registry) = setup().await;
        let orm = Orm::<Book>::new(&registry).unwrap();
        mock.respond_rows(&["id", "title"], vec![vec![
            Value::Int64(Some(5)),
            Value::Varchar(Some("Emma".into())),
        ]]);
        let books = orm
            .query_raw("SELECT id, title FROM book WHERE id = ?", vec![5_i64.into()])
            .await
            .unwrap();
        assert_eq!(
            books,
            [Book {
                id: 5,
                title: "Emma".into(),
                ..Default::default()
            }]
        );
        mock.respond_affected(4, None);
        let result = orm
            .exec_raw("UPDATE book SET pages = pages + 1", Vec::new())
            .await
            .unwrap();
        assert_eq!(result.rows_affected, 4);
        assert_eq!(mock.queries()[0].params, [Value::Int64(Some(5))]);
    }

    #[tokio::test]
    async fn transaction() {
        let (mock, registry) = setup().await;
        let orm = Orm::<Book>::new(&registry).unwrap();
        let manager = TxManager::new();
        assert!(!orm.in_transaction().await);
        orm.begin_tx(&manager).await.unwrap();
        assert!(orm.in_transaction().await);
        assert_eq!(manager.len().await, 1);
        let error = orm.begin_tx(&manager).await.unwrap_err();
        assert_eq!(orm_error(&error), Some(&OrmError::AlreadyBoundTx));

        orm.delete().execute(None).await.unwrap();
        manager.commit().await.unwrap();
        assert!(!orm.in_transaction().await);
        orm.delete().execute(None).await.unwrap();
        assert_eq!(
            mock.sqls(),
            [
                "BEGIN",
                "/* tx */ DELETE FROM book",
                "COMMIT",
                "DELETE FROM book"
            ]
        );

        let error = manager.rollback().await.unwrap_err();
        assert_eq!(orm_error(&error), Some(&OrmError::TxNotOpen));
        let error = orm.begin_tx(&manager).await.unwrap_err();
        assert_eq!(orm_error(&error), Some(&OrmError::AlreadyBoundTx));
    }

    #[tokio::test]
    async fn null_fields() {
        let mock = MockConnection::new();
        let pool = Arc::new(DataSourcePool::new());
        pool.push(mock.as_dyn());
        let registry = Registry::new(Config::default(), pool);
        registry
            .register::<Book>(|config| {
                config
                    .null_fields
                    .insert("title".into(), NullField::parameter("IFNULL", "untitled"));
                config
                    .join_null_fields
                    .insert("country".into(), NullField::literal("COALESCE", "n/a"));
            })
            .await
            .unwrap();
        let orm = Orm::<Book>::new(&registry).unwrap();
        orm.select()
            .and_where(Predicate::eq("t.id", 1_i64))
            .list(None)
            .await
            .unwrap();
        orm.select().join().list(None).await.unwrap();
        assert_eq!(
            mock.queries(),
            [
                Query::new(
                    "SELECT t.id AS id, IFNULL(t.title, ?) AS title, t.author_name AS author, t.pages AS pages, t.created AS created FROM book AS t WHERE t.id = ?",
                    vec![Value::Varchar(Some("untitled".into())), Value::Int64(Some(1))]
                ),
                Query::new(
                    format!("SELECT {BOOK_COLUMNS}, COALESCE(rel1.country, 'n/a') AS country FROM book AS t INNER JOIN author AS rel1 ON rel1.name = t.author_name"),
                    Vec::new()
                ),
            ]
        );
    }
}

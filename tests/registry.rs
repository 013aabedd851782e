mod resource {
    pub mod mock;
}

#[cfg(test)]
mod tests {
    use crate::resource::mock::MockConnection;
    use anorm::{
        Config, DataSourcePool, Entity, IndexDef, JoinRef, JoinType, Orm, OrmError, Registry,
        Strategy,
    };
    use indoc::indoc;
    use std::{collections::HashSet, sync::Arc, time::Duration};

    #[allow(non_snake_case)]
    #[derive(Entity, Default)]
    struct UserAccount {
        #[orm("pk{T} ig{T} def{id INT NOT NULL}")]
        id: i64,
        #[orm("c{login} ug{T} def{login VARCHAR(32)}")]
        user_name: String,
        r#type: i8,
        #[orm("def{department_id INT}")]
        departmentID: i32,
        #[orm("ig{T} ug{T} join{left, department_id, department, id, title}")]
        department_title: String,
    }

    #[derive(Entity, Default)]
    struct Orphan {
        id: i64,
        #[orm("join{inner, dept, department, id, title}")]
        title: String,
    }

    #[derive(Entity, Default)]
    struct Sideways {
        id: i64,
        #[orm("join{sideways, id, department, id, title}")]
        title: String,
    }

    #[derive(Entity, Default)]
    struct Shipment {
        #[orm("pk{T}")]
        id: i64,
        status: String,
    }

    #[derive(Entity, Default)]
    struct ShipmentSummary {
        #[orm("pk{T}")]
        id: i64,
        #[orm("c{status}")]
        state: String,
    }

    fn orm_error(error: &anorm::Error) -> Option<&OrmError> {
        error.downcast_ref::<OrmError>()
    }

    fn registry(config: Config, mock: &MockConnection) -> Registry {
        let pool = Arc::new(DataSourcePool::new());
        pool.push(mock.as_dyn());
        Registry::new(config, pool)
    }

    fn strings(values: &[&str]) -> HashSet<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[tokio::test]
    async fn metadata() {
        let mock = MockConnection::new();
        let registry = registry(Config::default(), &mock);
        let meta = registry.register_default::<UserAccount>().await.unwrap();
        assert!(meta.type_name.ends_with("UserAccount"));
        assert_eq!(meta.table_name, "user_account");
        assert_eq!(
            meta.columns,
            ["id", "login", "type", "department_id", "department_title"]
        );
        assert_eq!(
            meta.fields,
            ["id", "user_name", "type", "departmentID", "department_title"]
        );
        assert_eq!(meta.column_of("user_name"), Some("login"));
        assert_eq!(meta.field_of("department_id"), Some("departmentID"));
        assert_eq!(meta.primary_keys, ["id"]);
        assert!(meta.is_primary_key("id"));
        assert_eq!(meta.insert_ignore, strings(&["id", "department_title"]));
        assert_eq!(
            meta.update_ignore,
            strings(&["login", "department_title"])
        );
        assert_eq!(
            meta.join_refs,
            [JoinRef::new(
                "department_title",
                JoinType::Left,
                "department_id",
                "department",
                "id",
                "title"
            )]
        );
        assert_eq!(meta.data_source, "_");
        assert_eq!(
            meta.column_definitions,
            ["id INT NOT NULL", "login VARCHAR(32)", "department_id INT"]
        );
        assert!(mock.sqls().is_empty(), "Nothing is migrated by default");
        assert_eq!(registry.len(), 1);
        assert!(registry.is_registered::<UserAccount>());
        assert!(!registry.is_registered::<Orphan>());
    }

    #[tokio::test]
    async fn overrides() {
        let mock = MockConnection::new();
        let registry = registry(Config::default(), &mock);
        let meta = registry
            .register::<UserAccount>(|config| {
                config.table = Some("accounts".into());
                config.column_name_strategy = Some(Strategy::CamelCase);
                config.data_source = Some("replica".into());
                config.update_ignores = vec!["type".into()];
                config.join_refs = vec![JoinRef::new(
                    "department_title",
                    JoinType::Inner,
                    "departmentId",
                    "dept",
                    "code",
                    "name",
                )];
            })
            .await
            .unwrap();
        assert_eq!(meta.table_name, "accounts");
        assert_eq!(
            meta.columns,
            ["id", "login", "type", "departmentId", "department_title"]
        );
        assert_eq!(meta.data_source, "replica");
        assert_eq!(
            meta.update_ignore,
            strings(&["login", "department_title", "type"])
        );
        assert_eq!(meta.join_refs.len(), 1);
        assert_eq!(meta.join_refs[0].join_type, JoinType::Inner);
        assert_eq!(meta.join_refs[0].rel_table, "dept");

        let registry = self::registry(
            Config {
                table_name_strategy: Strategy::AsIs,
                ..Default::default()
            },
            &mock,
        );
        let meta = registry.register_default::<UserAccount>().await.unwrap();
        assert_eq!(meta.table_name, "UserAccount");
        assert_eq!(meta.columns[3], "department_id");
    }

    #[tokio::test]
    async fn errors() {
        let mock = MockConnection::new();
        let registry = registry(Config::default(), &mock);

        let error = Orm::<UserAccount>::new(&registry).unwrap_err();
        assert!(matches!(
            orm_error(&error),
            Some(OrmError::UnknownEntity { .. })
        ));

        registry.register_default::<UserAccount>().await.unwrap();
        let error = registry
            .register_default::<UserAccount>()
            .await
            .unwrap_err();
        assert!(matches!(
            orm_error(&error),
            Some(OrmError::DuplicateRegistration { .. })
        ));
        assert_eq!(registry.len(), 1);

        registry
            .register::<Sideways>(|config| config.data_source = Some("archive".into()))
            .await
            .unwrap();
        let error = Orm::<Sideways>::new(&registry).unwrap_err();
        assert_eq!(
            orm_error(&error),
            Some(&OrmError::RequiredDataSource {
                name: "archive".into()
            })
        );
        assert!(Orm::<Sideways>::with_data_source(&registry, "_").is_ok());
    }

    #[tokio::test]
    async fn shared_table() {
        let mock = MockConnection::new();
        let registry = registry(Config::default(), &mock);
        let first = registry
            .register::<Shipment>(|config| config.table = Some("same".into()))
            .await
            .unwrap();
        let second = registry
            .register::<ShipmentSummary>(|config| config.table = Some("same".into()))
            .await
            .unwrap();
        assert_eq!(first.table_name, "same");
        assert_eq!(second.table_name, "same");
        assert_eq!(registry.len(), 2);

        let shipments = Orm::<Shipment>::new(&registry).unwrap();
        let summaries = Orm::<ShipmentSummary>::new(&registry).unwrap();
        shipments.delete().execute(None).await.unwrap();
        summaries
            .delete()
            .execute(Some(&ShipmentSummary {
                state: "lost".into(),
                ..Default::default()
            }))
            .await
            .unwrap();
        assert_eq!(
            mock.sqls(),
            ["DELETE FROM same", "DELETE FROM same WHERE status = ?"]
        );
    }

    #[tokio::test]
    async fn joins() {
        let mock = MockConnection::new();
        let registry = registry(Config::default(), &mock);

        let error = registry.register_default::<Orphan>().await.unwrap_err();
        assert_eq!(
            orm_error(&error),
            Some(&OrmError::UnknownJoinColumn {
                entity: std::any::type_name::<Orphan>().into(),
                field: "title".into(),
                column: "dept".into(),
            })
        );
        assert!(!registry.is_registered::<Orphan>());

        let meta = registry.register_default::<Sideways>().await.unwrap();
        assert!(meta.join_refs.is_empty());
        assert_eq!(meta.columns, ["id", "title"]);
    }

    #[tokio::test]
    async fn migration() {
        let mock = MockConnection::new();
        let registry = registry(
            Config {
                migrate: true,
                ..Default::default()
            },
            &mock,
        );
        registry
            .register::<UserAccount>(|config| {
                config.comment = "User accounts".into();
                config.indexes = vec![IndexDef::unique("uk_login", ["login"])];
            })
            .await
            .unwrap();
        assert_eq!(
            mock.sqls(),
            [indoc! {"
                CREATE TABLE IF NOT EXISTS user_account (
                id INT NOT NULL,
                login VARCHAR(32),
                department_id INT,
                PRIMARY KEY (id),
                UNIQUE KEY uk_login (login)
                ) COMMENT 'User accounts'"}]
        );

        // Failures while creating the table do not fail the registration
        mock.clear();
        mock.respond_error("table `sideways` already exists");
        let meta = registry.register_default::<Sideways>().await.unwrap();
        assert_eq!(meta.table_name, "sideways");
        assert_eq!(
            mock.sqls(),
            ["CREATE TABLE IF NOT EXISTS sideways (\n\n)"]
        );
        assert!(registry.is_registered::<Sideways>());
    }

    #[tokio::test]
    async fn migration_data_sources() {
        let registry = Registry::new(Config::default(), Arc::new(DataSourcePool::new()));
        let error = registry
            .register::<Sideways>(|config| config.migrate = true)
            .await
            .unwrap_err();
        assert_eq!(orm_error(&error), Some(&OrmError::NoMasterDataSource));
        assert!(registry.is_registered::<Sideways>());

        let master = MockConnection::new();
        let replica = MockConnection::new();
        let registry = registry_with_replica(&master, &replica);
        registry
            .register::<UserAccount>(|config| {
                config.migrate = true;
                config.data_source = Some("replica".into());
            })
            .await
            .unwrap();
        assert!(master.sqls().is_empty());
        assert_eq!(replica.sqls().len(), 1);
        assert!(replica.sqls()[0].starts_with("CREATE TABLE IF NOT EXISTS user_account"));

        replica.clear();
        let orm = Orm::<UserAccount>::new(&registry).unwrap();
        orm.select().list(None).await.unwrap();
        assert!(master.sqls().is_empty());
        assert_eq!(replica.sqls().len(), 1);
    }

    fn registry_with_replica(master: &MockConnection, replica: &MockConnection) -> Registry {
        let pool = Arc::new(DataSourcePool::new());
        pool.push(master.as_dyn());
        pool.push_named("replica", replica.as_dyn());
        Registry::new(Config::default(), pool)
    }

    #[tokio::test]
    async fn pool() {
        let master = MockConnection::new();
        let replica = MockConnection::new();
        let registry = registry_with_replica(&master, &replica);
        let pool = registry.pool().clone();
        assert_eq!(pool.names(), ["_", "master", "replica"]);
        assert!(pool.get("archive").is_none());
        assert!(pool.master().is_ok());

        let probe = pool.spawn_liveness_probe(Duration::from_millis(10));
        tokio::time::sleep(Duration::from_millis(50)).await;
        probe.abort();
        assert!(master.sqls().iter().any(|v| v == "SELECT 1"));
        assert!(replica.sqls().iter().any(|v| v == "SELECT 1"));
    }
}

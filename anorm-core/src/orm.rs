use crate::{
    AsValue, Config, Connection, DeleteOperation, Entity, ExecHook, InsertOperation,
    JoinClause, OrmError, Predicate, Projection, Query, RegisteredType, Registry, Result,
    RowLabeled, RowsAffected, SelectCountOperation, SelectOperation, SelectStatement, SqlWriter,
    Transaction, TxManager, UpdateOperation, Value, stream::TryStreamExt,
};
use std::{fmt, marker::PhantomData, sync::Arc};
use tokio::sync::Mutex;

/// Entry point for the operations on one entity type.
///
/// A handle is bound to one data source. After [`Orm::begin_tx`] every
/// statement it issues runs inside that transaction, until the transaction is
/// finished through its [`TxManager`].
pub struct Orm<E: Entity> {
    pub(crate) meta: Arc<RegisteredType>,
    pub(crate) config: Config,
    pub(crate) connection: Arc<dyn Connection>,
    transaction: Mutex<Option<Arc<dyn Transaction>>>,
    _entity: PhantomData<fn() -> E>,
}

impl<E: Entity> Orm<E> {
    /// Handle on the data source `E` was registered with.
    pub fn new(registry: &Registry) -> Result<Self> {
        let meta = registry.get::<E>()?;
        let connection = registry.pool().required(&meta.data_source)?;
        Ok(Self::from_parts(meta, registry.config().clone(), connection))
    }

    /// Handle on the named data source.
    pub fn with_data_source(registry: &Registry, name: &str) -> Result<Self> {
        let meta = registry.get::<E>()?;
        let connection = registry.pool().required(name)?;
        Ok(Self::from_parts(meta, registry.config().clone(), connection))
    }

    fn from_parts(meta: Arc<RegisteredType>, config: Config, connection: Arc<dyn Connection>) -> Self {
        log::debug!(
            "Created handle for `{}` on table `{}`",
            meta.type_name,
            meta.table_name
        );
        Self {
            meta,
            config,
            connection,
            transaction: Mutex::new(None),
            _entity: PhantomData,
        }
    }

    pub fn meta(&self) -> &RegisteredType {
        &self.meta
    }

    pub fn sql_writer(&self) -> &dyn SqlWriter {
        self.connection.sql_writer()
    }

    /// Start a transaction on this handle's connection and join it to `manager`.
    pub async fn begin_tx(&self, manager: &TxManager) -> Result<()> {
        let mut slot = self.transaction.lock().await;
        if slot.is_some() {
            return Err(OrmError::AlreadyBoundTx.into());
        }
        let transaction = self.connection.begin().await.map_err(|e| {
            log::error!("Cannot begin a transaction for `{}`: {:#}", self.meta.type_name, e);
            e
        })?;
        manager.join(transaction.clone()).await;
        *slot = Some(transaction);
        Ok(())
    }

    /// `true` while a bound transaction is still open.
    pub async fn in_transaction(&self) -> bool {
        self.active_transaction().await.is_some()
    }

    async fn active_transaction(&self) -> Option<Arc<dyn Transaction>> {
        self.transaction
            .lock()
            .await
            .as_ref()
            .filter(|v| v.is_active())
            .cloned()
    }

    pub fn insert(&self) -> InsertOperation<'_, E> {
        InsertOperation::new(self)
    }

    pub fn select(&self) -> SelectOperation<'_, E> {
        SelectOperation::new(self)
    }

    pub fn select_count(&self) -> SelectCountOperation<'_, E> {
        SelectCountOperation::new(self)
    }

    pub fn update(&self) -> UpdateOperation<'_, E> {
        UpdateOperation::new(self)
    }

    pub fn delete(&self) -> DeleteOperation<'_, E> {
        DeleteOperation::new(self)
    }

    /// Run a raw query and decode the rows, labels are matched to field names.
    pub async fn query_raw(&self, sql: impl Into<String>, params: Vec<Value>) -> Result<Vec<E>> {
        let rows = self
            .fetch("Orm.QueryRaw", &[], Query::new(sql, params))
            .await?;
        rows.into_iter().map(E::from_row).collect()
    }

    /// Run a raw modifying statement.
    pub async fn exec_raw(&self, sql: impl Into<String>, params: Vec<Value>) -> Result<RowsAffected> {
        self.execute("Orm.ExecRaw", &[], Query::new(sql, params))
            .await
    }

    pub(crate) async fn execute(
        &self,
        operation: &str,
        hooks: &[Arc<dyn ExecHook>],
        mut query: Query,
    ) -> Result<RowsAffected> {
        for hook in hooks {
            hook.before_exec(self.meta.type_name, &mut query);
        }
        log::debug!("{} {}", operation, query);
        let result = match self.active_transaction().await {
            Some(tx) => tx.execute(query.clone()).await,
            None => self.connection.execute(query.clone()).await,
        };
        if let Err(e) = &result {
            log::error!("{} failed: {:#}\n{}", operation, e, query);
        }
        for hook in hooks {
            hook.after_exec(self.meta.type_name, &query, result.as_ref().err());
        }
        result
    }

    pub(crate) async fn fetch(
        &self,
        operation: &str,
        hooks: &[Arc<dyn ExecHook>],
        mut query: Query,
    ) -> Result<Vec<RowLabeled>> {
        for hook in hooks {
            hook.before_exec(self.meta.type_name, &mut query);
        }
        log::debug!("{} {}", operation, query);
        let result = match self.active_transaction().await {
            Some(tx) => tx.fetch(query.clone()).try_collect::<Vec<_>>().await,
            None => {
                self.connection
                    .fetch(query.clone())
                    .try_collect::<Vec<_>>()
                    .await
            }
        };
        if let Err(e) = &result {
            log::error!("{} failed: {:#}\n{}", operation, e, query);
        }
        for hook in hooks {
            hook.after_exec(self.meta.type_name, &query, result.as_ref().err());
        }
        result
    }

    pub(crate) async fn fetch_entities(
        &self,
        operation: &str,
        query: Query,
    ) -> Result<Vec<E>> {
        let rows = self
            .fetch(operation, &self.config.select_hooks, query)
            .await?;
        rows.into_iter().map(E::from_row).collect()
    }

    /// `SELECT count(0) AS c FROM table AS t ...` and decode the count.
    pub(crate) async fn count(
        &self,
        operation: &str,
        predicate: Predicate,
        joins: Vec<JoinClause>,
    ) -> Result<u64> {
        let query = self.sql_writer().build_select(&SelectStatement {
            table: &self.meta.table_name,
            alias: "t",
            projection: vec![Projection::column("count(0)", "c")],
            joins,
            predicate,
            order_by: Vec::new(),
        });
        let rows = self
            .fetch(operation, &self.config.select_hooks, query)
            .await?;
        let Some(value) = rows
            .into_iter()
            .next()
            .and_then(|row| row.values.into_vec().into_iter().next())
        else {
            return Ok(0);
        };
        u64::try_from_value(value)
    }
}

impl<E: Entity> fmt::Debug for Orm<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Orm")
            .field("entity", &self.meta.type_name)
            .field("table", &self.meta.table_name)
            .finish()
    }
}

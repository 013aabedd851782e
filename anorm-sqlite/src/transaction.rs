use crate::{SqliteSqlWriter, connection::run_query};
use anorm_core::{
    Error, Executor, OrmError, Query, QueryResult, Result, SqlWriter, Transaction,
    future::{BoxFuture, FutureExt},
    stream::BoxStream,
};
use parking_lot::Mutex;
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

/// `BEGIN` ... `COMMIT` / `ROLLBACK` on the session of a [`crate::SqliteConnection`].
///
/// SQLite does not nest transactions and a connection is a single session, so
/// only one transaction can be open on it at a time. Handles that need
/// concurrent transactions must use distinct connections.
pub struct SqliteTransaction {
    connection: Arc<Mutex<rusqlite::Connection>>,
    active: AtomicBool,
}

impl SqliteTransaction {
    pub(crate) async fn begin(connection: Arc<Mutex<rusqlite::Connection>>) -> Result<Self> {
        if !connection.lock().is_autocommit() {
            return Err(Error::msg(
                "The SQLite session already has an open transaction, use another connection for concurrent transactions",
            ));
        }
        let result = Self {
            connection,
            active: AtomicBool::new(false),
        };
        result.execute(Query::from("BEGIN")).await?;
        result.active.store(true, Ordering::Release);
        Ok(result)
    }

    async fn finish(&self, sql: &'static str) -> Result<()> {
        if !self.active.swap(false, Ordering::AcqRel) {
            return Err(OrmError::TxNotOpen.into());
        }
        self.execute(Query::from(sql)).await.map(|_| ())
    }
}

impl Executor for SqliteTransaction {
    fn sql_writer(&self) -> &dyn SqlWriter {
        &SqliteSqlWriter
    }

    fn run<'s>(&'s self, query: Query) -> BoxStream<'s, Result<QueryResult>> {
        run_query(&self.connection, query)
    }
}

impl Transaction for SqliteTransaction {
    fn commit(&self) -> BoxFuture<'_, Result<()>> {
        self.finish("COMMIT").boxed()
    }

    fn rollback(&self) -> BoxFuture<'_, Result<()>> {
        self.finish("ROLLBACK").boxed()
    }

    fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }
}

use crate::{
    Query, QueryResult, Result, RowLabeled, RowsAffected, SqlWriter,
    future::{BoxFuture, FutureExt, TryFutureExt},
    stream::{BoxStream, StreamExt, TryStreamExt},
};
use std::sync::Arc;

/// Something that can run statements: a connection or an open transaction.
///
/// The methods return boxed futures and streams so that connections of
/// different drivers can share one pool as `Arc<dyn Connection>`.
pub trait Executor: Send + Sync {
    /// Dialect used to render statements for this executor.
    fn sql_writer(&self) -> &dyn SqlWriter;

    /// General method to send any query and return any result type (either row or count)
    fn run<'s>(&'s self, query: Query) -> BoxStream<'s, Result<QueryResult>>;

    /// Execute the query and returns the rows.
    fn fetch<'s>(&'s self, query: Query) -> BoxStream<'s, Result<RowLabeled>> {
        self.run(query)
            .filter_map(|v| async move {
                match v {
                    Ok(QueryResult::Row(v)) => Some(Ok(v)),
                    Err(e) => Some(Err(e)),
                    _ => None,
                }
            })
            .boxed()
    }

    /// Execute the query and return the total number of rows affected.
    fn execute<'s>(&'s self, query: Query) -> BoxFuture<'s, Result<RowsAffected>> {
        self.run(query)
            .filter_map(|v| async move {
                match v {
                    Ok(QueryResult::Affected(v)) => Some(Ok(v)),
                    Err(e) => Some(Err(e)),
                    _ => None,
                }
            })
            .try_collect()
            .boxed()
    }
}

/// A live database session.
pub trait Connection: Executor {
    /// Start a transaction on this connection.
    fn begin(&self) -> BoxFuture<'_, Result<Arc<dyn Transaction>>>;

    /// Cheap round trip used by the liveness probe.
    fn ping(&self) -> BoxFuture<'_, Result<()>> {
        self.execute(Query::from("SELECT 1")).map_ok(|_| ()).boxed()
    }
}

/// A transaction started by [`Connection::begin`]. Once committed or rolled
/// back it is no longer active and refuses to finish again.
pub trait Transaction: Executor {
    fn commit(&self) -> BoxFuture<'_, Result<()>>;
    fn rollback(&self) -> BoxFuture<'_, Result<()>>;
    fn is_active(&self) -> bool;
}

use anorm::{
    Connection, Error, Executor, GenericSqlWriter, OrmError, Query, QueryResult, Result, RowLabeled,
    RowNames, RowsAffected, SqlWriter, Transaction, Value,
    future::{BoxFuture, FutureExt},
    stream::{self, BoxStream, StreamExt},
};
use std::{
    collections::VecDeque,
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, Ordering},
    },
};

/// State shared by a mock connection and the transactions it starts.
#[derive(Default)]
pub struct MockState {
    queries: Mutex<Vec<Query>>,
    responses: Mutex<VecDeque<Result<Vec<QueryResult>>>>,
}

/// Connection recording every statement and answering with scripted responses.
///
/// Statements without a scripted response succeed with no rows and zero rows affected.
#[derive(Clone, Default)]
pub struct MockConnection {
    state: Arc<MockState>,
}

impl MockConnection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond_rows(&self, labels: &[&str], rows: Vec<Vec<Value>>) -> &Self {
        let labels = labels.iter().map(|v| v.to_string()).collect::<RowNames>();
        let rows = rows
            .into_iter()
            .map(|v| RowLabeled::new(labels.clone(), v.into_boxed_slice()).into())
            .collect();
        self.push(Ok(rows))
    }

    pub fn respond_affected(&self, rows_affected: u64, last_affected_id: Option<i64>) -> &Self {
        self.push(Ok(vec![
            RowsAffected {
                rows_affected,
                last_affected_id,
            }
            .into(),
        ]))
    }

    pub fn respond_error(&self, message: &str) -> &Self {
        self.push(Err(Error::msg(message.to_string())))
    }

    fn push(&self, response: Result<Vec<QueryResult>>) -> &Self {
        self.state.responses.lock().unwrap().push_back(response);
        self
    }

    /// Recorded statements, in execution order.
    pub fn queries(&self) -> Vec<Query> {
        self.state.queries.lock().unwrap().clone()
    }

    pub fn sqls(&self) -> Vec<String> {
        self.queries().into_iter().map(|v| v.sql).collect()
    }

    pub fn clear(&self) {
        self.state.queries.lock().unwrap().clear();
        self.state.responses.lock().unwrap().clear();
    }

    pub fn as_dyn(&self) -> Arc<dyn Connection> {
        Arc::new(self.clone())
    }
}

fn run(state: &MockState, query: Query) -> BoxStream<'static, Result<QueryResult>> {
    state.queries.lock().unwrap().push(query);
    let response = state
        .responses
        .lock()
        .unwrap()
        .pop_front()
        .unwrap_or_else(|| Ok(vec![RowsAffected::default().into()]));
    let items = match response {
        Ok(v) => v.into_iter().map(Ok).collect::<Vec<_>>(),
        Err(e) => vec![Err(e)],
    };
    stream::iter(items).boxed()
}

impl Executor for MockConnection {
    fn sql_writer(&self) -> &dyn SqlWriter {
        &GenericSqlWriter
    }

    fn run<'s>(&'s self, query: Query) -> BoxStream<'s, Result<QueryResult>> {
        run(&self.state, query)
    }
}

impl Connection for MockConnection {
    fn begin(&self) -> BoxFuture<'_, Result<Arc<dyn Transaction>>> {
        async move {
            self.state
                .queries
                .lock()
                .unwrap()
                .push(Query::from("BEGIN"));
            Ok(Arc::new(MockTransaction {
                state: self.state.clone(),
                active: AtomicBool::new(true),
            }) as Arc<dyn Transaction>)
        }
        .boxed()
    }
}

pub struct MockTransaction {
    state: Arc<MockState>,
    active: AtomicBool,
}

impl MockTransaction {
    fn finish(&self, sql: &str) -> Result<()> {
        if !self.active.swap(false, Ordering::AcqRel) {
            return Err(OrmError::TxNotOpen.into());
        }
        self.state.queries.lock().unwrap().push(Query::from(sql));
        Ok(())
    }
}

impl Executor for MockTransaction {
    fn sql_writer(&self) -> &dyn SqlWriter {
        &GenericSqlWriter
    }

    fn run<'s>(&'s self, query: Query) -> BoxStream<'s, Result<QueryResult>> {
        run(
            &self.state,
            Query::new(format!("/* tx */ {}", query.sql), query.params),
        )
    }
}

impl Transaction for MockTransaction {
    fn commit(&self) -> BoxFuture<'_, Result<()>> {
        async move { self.finish("COMMIT") }.boxed()
    }

    fn rollback(&self) -> BoxFuture<'_, Result<()>> {
        async move { self.finish("ROLLBACK") }.boxed()
    }

    fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }
}

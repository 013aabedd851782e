use crate::{
    SqliteSqlWriter, SqliteTransaction,
    extract::{from_sqlite, to_sqlite},
};
use anorm_core::{
    Connection, Context, Error, Executor, Query, QueryResult, Result, Row, RowLabeled, RowNames,
    RowsAffected, SqlWriter, Transaction,
    future::{BoxFuture, FutureExt},
    stream::{self, BoxStream, StreamExt},
};
use parking_lot::Mutex;
use rusqlite::{OpenFlags, params_from_iter};
use std::{fmt, sync::Arc};
use tokio::task::spawn_blocking;

const PREFIX: &str = "sqlite://";

/// A SQLite database, opened from a `sqlite://path?mode=rwc` url.
///
/// `rusqlite::Connection` is not `Sync`, every statement locks it and runs on the blocking pool.
/// Transactions started from this connection share the same session.
pub struct SqliteConnection {
    pub(crate) connection: Arc<Mutex<rusqlite::Connection>>,
    url: String,
}

impl SqliteConnection {
    /// Open the database. `sqlite://:memory:` opens a private in memory database, the `mode`
    /// query parameter accepts `ro`, `rw` and `rwc` (the default).
    pub async fn connect(url: &str) -> Result<SqliteConnection> {
        let Some(rest) = url.strip_prefix(PREFIX) else {
            return Err(Error::msg(format!(
                "Expected sqlite connection url to start with `{}`",
                PREFIX
            )));
        };
        let (path, query) = rest.split_once('?').unwrap_or((rest, ""));
        let path = urlencoding::decode(path)
            .with_context(|| format!("Error while decoding connection URL: `{}`", url))?
            .into_owned();
        let mut flags = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_CREATE
            | OpenFlags::SQLITE_OPEN_URI
            | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            match (key.as_ref(), value.as_ref()) {
                ("mode", "ro") => {
                    flags.remove(OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE);
                    flags.insert(OpenFlags::SQLITE_OPEN_READ_ONLY);
                }
                ("mode", "rw") => flags.remove(OpenFlags::SQLITE_OPEN_CREATE),
                ("mode", "rwc") => {}
                (key, value) => {
                    log::warn!("Ignoring unknown sqlite url parameter `{}={}`", key, value)
                }
            }
        }
        let memory = path.is_empty() || path == ":memory:";
        let connection = spawn_blocking(move || {
            if memory {
                rusqlite::Connection::open_in_memory()
            } else {
                rusqlite::Connection::open_with_flags(&path, flags)
            }
        })
        .await?
        .with_context(|| format!("Could not open the database `{}`", url))?;
        log::debug!("Connected to `{}`", url);
        Ok(Self {
            connection: Arc::new(Mutex::new(connection)),
            url: url.to_string(),
        })
    }
}

/// Run one statement on the blocking pool. Statements with result columns yield rows, the others
/// yield a single [`RowsAffected`].
pub(crate) fn run_query(
    connection: &Arc<Mutex<rusqlite::Connection>>,
    query: Query,
) -> BoxStream<'static, Result<QueryResult>> {
    let connection = connection.clone();
    stream::once(async move {
        let sql = query.to_string();
        spawn_blocking(move || run_blocking(&connection.lock(), &query))
            .await
            .map_err(Error::new)
            .and_then(|v| v)
            .with_context(|| format!("While executing the query:\n{}", sql))
    })
    .flat_map(|result| {
        stream::iter(match result {
            Ok(items) => items.into_iter().map(Ok).collect::<Vec<_>>(),
            Err(e) => vec![Err(e)],
        })
    })
    .boxed()
}

fn run_blocking(connection: &rusqlite::Connection, query: &Query) -> Result<Vec<QueryResult>> {
    let mut statement = connection.prepare(&query.sql)?;
    let params = query
        .params
        .iter()
        .map(to_sqlite)
        .collect::<Result<Vec<_>>>()?;
    if statement.column_count() == 0 {
        let rows_affected = statement.execute(params_from_iter(params.iter()))? as u64;
        let last_affected_id = is_insert(&query.sql).then(|| connection.last_insert_rowid());
        return Ok(vec![
            RowsAffected {
                rows_affected,
                last_affected_id,
            }
            .into(),
        ]);
    }
    let labels = statement
        .column_names()
        .into_iter()
        .map(String::from)
        .collect::<RowNames>();
    let count = labels.len();
    let mut rows = statement.query(params_from_iter(params.iter()))?;
    let mut result = Vec::new();
    while let Some(row) = rows.next()? {
        let values = (0..count)
            .map(|i| from_sqlite(row.get_ref(i)?))
            .collect::<Result<Row>>()?;
        result.push(RowLabeled::new(labels.clone(), values).into());
    }
    Ok(result)
}

fn is_insert(sql: &str) -> bool {
    sql.trim_start()
        .get(..6)
        .is_some_and(|v| v.eq_ignore_ascii_case("INSERT"))
}

impl Executor for SqliteConnection {
    fn sql_writer(&self) -> &dyn SqlWriter {
        &SqliteSqlWriter
    }

    fn run<'s>(&'s self, query: Query) -> BoxStream<'s, Result<QueryResult>> {
        run_query(&self.connection, query)
    }
}

impl Connection for SqliteConnection {
    fn begin(&self) -> BoxFuture<'_, Result<Arc<dyn Transaction>>> {
        async move {
            let transaction = SqliteTransaction::begin(self.connection.clone()).await?;
            Ok(Arc::new(transaction) as Arc<dyn Transaction>)
        }
        .boxed()
    }
}

impl fmt::Debug for SqliteConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqliteConnection")
            .field("url", &self.url)
            .finish()
    }
}

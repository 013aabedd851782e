use crate::Value;

/// Turns a complete `SELECT` into the query for one page.
///
/// Returns the rewritten SQL and the parameters to append after the ones the
/// statement already binds.
pub trait Pager: Send + Sync {
    fn page(&self, sql: &str, offset: u64, size: u64) -> (String, Vec<Value>);
}

/// `... LIMIT ?, ?` bound to `offset, size`.
#[derive(Default, Debug, Clone, Copy)]
pub struct MySql;

impl Pager for MySql {
    fn page(&self, sql: &str, offset: u64, size: u64) -> (String, Vec<Value>) {
        (
            format!("{sql} LIMIT ?, ?"),
            vec![Value::UInt64(Some(offset)), Value::UInt64(Some(size))],
        )
    }
}

/// `... LIMIT ? OFFSET ?` bound to `size, offset`.
#[derive(Default, Debug, Clone, Copy)]
pub struct Pg;

impl Pager for Pg {
    fn page(&self, sql: &str, offset: u64, size: u64) -> (String, Vec<Value>) {
        (
            format!("{sql} LIMIT ? OFFSET ?"),
            vec![Value::UInt64(Some(size)), Value::UInt64(Some(offset))],
        )
    }
}

/// `ROW_NUMBER()` window over the statement, rows `offset + 1` to `offset + size`.
/// The bounds saturate at `u64::MAX`.
#[derive(Debug, Clone)]
pub struct SqlServer {
    order_by: String,
}

impl SqlServer {
    /// `order_by` is the window ordering, as in `id asc`.
    pub fn new(order_by: impl Into<String>) -> Self {
        Self {
            order_by: order_by.into(),
        }
    }
}

impl Pager for SqlServer {
    fn page(&self, sql: &str, offset: u64, size: u64) -> (String, Vec<Value>) {
        (
            format!(
                "SELECT t.* FROM (SELECT _t.*, row_number() over (order by {}) as rn FROM ({}) as _t) as t WHERE t.rn between ? and ?",
                self.order_by, sql
            ),
            vec![
                Value::UInt64(Some(offset.saturating_add(1))),
                Value::UInt64(Some(offset.saturating_add(size))),
            ],
        )
    }
}

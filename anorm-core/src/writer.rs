use crate::{
    IndexDef, JoinType, Predicate, Query, TIME_FORMAT, TIMESTAMP_FORMAT, Value,
    possibly_parenthesized, separated_by,
};
use std::fmt::Write;
use time::format_description::well_known::Rfc3339;

macro_rules! write_integer {
    ($out:ident, $value:expr) => {{
        let mut buffer = itoa::Buffer::new();
        $out.push_str(buffer.format($value));
    }};
}
macro_rules! write_float {
    ($out:ident, $value:expr) => {{
        let value = $value;
        if value.is_finite() {
            let mut buffer = ryu::Buffer::new();
            $out.push_str(buffer.format_finite(value));
        } else {
            $out.push_str("NULL");
        }
    }};
}

/// Projected expression, rendered as `expression AS alias`.
#[derive(Debug, Clone, PartialEq)]
pub struct Projection {
    pub expression: String,
    pub alias: String,
    /// Parameters bound by `?` placeholders inside `expression`.
    pub params: Vec<Value>,
}

impl Projection {
    pub fn column(expression: impl Into<String>, alias: impl Into<String>) -> Self {
        Self {
            expression: expression.into(),
            alias: alias.into(),
            params: Vec::new(),
        }
    }
}

/// `join_type table AS alias ON left = right`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinClause {
    pub join_type: JoinType,
    pub table: String,
    pub alias: String,
    pub left: String,
    pub right: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub expression: String,
    pub descending: bool,
}

impl OrderBy {
    pub fn asc(expression: impl Into<String>) -> Self {
        Self {
            expression: expression.into(),
            descending: false,
        }
    }
    pub fn desc(expression: impl Into<String>) -> Self {
        Self {
            expression: expression.into(),
            descending: true,
        }
    }
}

/// Everything a `SELECT` needs.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectStatement<'a> {
    pub table: &'a str,
    pub alias: &'a str,
    pub projection: Vec<Projection>,
    pub joins: Vec<JoinClause>,
    pub predicate: Predicate,
    pub order_by: Vec<OrderBy>,
}

/// Migration DDL input.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateTable<'a> {
    pub table: &'a str,
    pub if_not_exists: bool,
    pub primary_keys: &'a [String],
    /// Complete column DDL fragments, as in `name VARCHAR(20) NOT NULL`.
    pub columns: &'a [String],
    pub indexes: &'a [IndexDef],
    pub comment: &'a str,
}

/// Renders statements into [`Query`] values.
///
/// Every method has a default producing plain SQL with `?` placeholders and
/// unquoted identifiers, drivers override only what their dialect changes.
pub trait SqlWriter: Send + Sync {
    fn write_escaped(&self, out: &mut String, value: &str, search: char, replace: &str) {
        let mut position = 0;
        for (i, c) in value.char_indices() {
            if c == search {
                out.push_str(&value[position..i]);
                out.push_str(replace);
                position = i + c.len_utf8();
            }
        }
        out.push_str(&value[position..]);
    }

    fn write_identifier(&self, out: &mut String, value: &str) {
        out.push_str(value);
    }

    /// `index` is the 1 based position of the parameter.
    fn write_placeholder(&self, out: &mut String, _index: usize) {
        out.push('?');
    }

    fn write_param(&self, out: &mut String, params: &mut Vec<Value>, value: Value) {
        params.push(value);
        self.write_placeholder(out, params.len());
    }

    /// Literal SQL form of a value. Non finite floats have no literal and
    /// are written as `NULL`.
    fn write_value(&self, out: &mut String, value: &Value) {
        match value {
            Value::Boolean(Some(v)) => out.push_str(if *v { "TRUE" } else { "FALSE" }),
            Value::Int8(Some(v)) => write_integer!(out, *v),
            Value::Int16(Some(v)) => write_integer!(out, *v),
            Value::Int32(Some(v)) => write_integer!(out, *v),
            Value::Int64(Some(v)) => write_integer!(out, *v),
            Value::UInt8(Some(v)) => write_integer!(out, *v),
            Value::UInt16(Some(v)) => write_integer!(out, *v),
            Value::UInt32(Some(v)) => write_integer!(out, *v),
            Value::UInt64(Some(v)) => write_integer!(out, *v),
            Value::Float32(Some(v)) => write_float!(out, *v),
            Value::Float64(Some(v)) => write_float!(out, *v),
            Value::Decimal(Some(v)) => out.push_str(&v.to_string()),
            Value::Varchar(Some(v)) => self.write_value_string(out, v),
            Value::Blob(Some(v)) => {
                out.push_str("X'");
                for b in v.iter() {
                    write!(out, "{:02X}", b).ok();
                }
                out.push('\'');
            }
            Value::Date(Some(v)) => self.write_value_string(out, &v.to_string()),
            Value::Time(Some(v)) => self.write_value_string(
                out,
                &v.format(TIME_FORMAT).unwrap_or_else(|_| v.to_string()),
            ),
            Value::Timestamp(Some(v)) => self.write_value_string(
                out,
                &v.format(TIMESTAMP_FORMAT).unwrap_or_else(|_| v.to_string()),
            ),
            Value::TimestampWithTimezone(Some(v)) => self.write_value_string(
                out,
                &v.format(&Rfc3339).unwrap_or_else(|_| v.to_string()),
            ),
            Value::Uuid(Some(v)) => self.write_value_string(out, &v.to_string()),
            _ => out.push_str("NULL"),
        }
    }

    fn write_value_string(&self, out: &mut String, value: &str) {
        out.push('\'');
        self.write_escaped(out, value, '\'', "''");
        out.push('\'');
    }

    fn write_join_type(&self, out: &mut String, join_type: &JoinType) {
        write!(out, "{}", join_type).ok();
    }

    fn write_join(&self, out: &mut String, join: &JoinClause) {
        self.write_join_type(out, &join.join_type);
        out.push(' ');
        self.write_identifier(out, &join.table);
        out.push_str(" AS ");
        self.write_identifier(out, &join.alias);
        out.push_str(" ON ");
        out.push_str(&join.left);
        out.push_str(" = ");
        out.push_str(&join.right);
    }

    /// Nested groups with more than one member are parenthesized.
    fn write_predicate(
        &self,
        out: &mut String,
        params: &mut Vec<Value>,
        predicate: &Predicate,
        nested: bool,
    ) {
        match predicate {
            Predicate::And(items) | Predicate::Or(items) => {
                let separator = if matches!(predicate, Predicate::And(..)) {
                    " AND "
                } else {
                    " OR "
                };
                let items = items.iter().filter(|v| !v.is_empty()).collect::<Vec<_>>();
                possibly_parenthesized!(
                    out,
                    nested && items.len() > 1,
                    separated_by(
                        out,
                        items,
                        |out, v| self.write_predicate(out, params, v, true),
                        separator,
                    )
                );
            }
            Predicate::Compare { column, op, value } => {
                out.push_str(column);
                out.push(' ');
                out.push_str(op.as_sql());
                out.push(' ');
                self.write_param(out, params, value.clone());
            }
            Predicate::In {
                column,
                values,
                negated,
            } => {
                if values.is_empty() {
                    // Matches nothing, or everything when negated
                    out.push_str(if *negated { "1 = 1" } else { "1 = 0" });
                    return;
                }
                out.push_str(column);
                out.push_str(if *negated { " NOT IN (" } else { " IN (" });
                separated_by(
                    out,
                    values,
                    |out, v| self.write_param(out, params, v.clone()),
                    ", ",
                );
                out.push(')');
            }
            Predicate::Between { column, low, high } => {
                out.push_str(column);
                out.push_str(" BETWEEN ");
                self.write_param(out, params, low.clone());
                out.push_str(" AND ");
                self.write_param(out, params, high.clone());
            }
            Predicate::IsNull { column, negated } => {
                out.push_str(column);
                out.push_str(if *negated { " IS NOT NULL" } else { " IS NULL" });
            }
            Predicate::Raw { sql, params: raw } => {
                possibly_parenthesized!(out, nested, out.push_str(sql));
                params.extend(raw.iter().cloned());
            }
        }
    }

    fn write_where(&self, out: &mut String, params: &mut Vec<Value>, predicate: &Predicate) {
        if predicate.is_empty() {
            return;
        }
        out.push_str(" WHERE ");
        self.write_predicate(out, params, predicate, false);
    }

    fn build_insert(&self, table: &str, columns: &[&str], rows: Vec<Vec<Value>>) -> Query {
        let mut out = String::with_capacity(64 + columns.len() * 16);
        let mut params = Vec::with_capacity(columns.len() * rows.len());
        out.push_str("INSERT INTO ");
        self.write_identifier(&mut out, table);
        out.push_str(" (");
        separated_by(
            &mut out,
            columns,
            |out, v| self.write_identifier(out, v),
            ", ",
        );
        out.push_str(") VALUES ");
        separated_by(
            &mut out,
            rows,
            |out, row| {
                out.push('(');
                separated_by(
                    out,
                    row,
                    |out, v| self.write_param(out, &mut params, v),
                    ", ",
                );
                out.push(')');
            },
            ", ",
        );
        Query::new(out, params)
    }

    fn build_select(&self, statement: &SelectStatement<'_>) -> Query {
        let mut out = String::with_capacity(128);
        let mut params = Vec::new();
        out.push_str("SELECT ");
        separated_by(
            &mut out,
            &statement.projection,
            |out, v| {
                out.push_str(&v.expression);
                params.extend(v.params.iter().cloned());
                if !v.alias.is_empty() {
                    out.push_str(" AS ");
                    self.write_identifier(out, &v.alias);
                }
            },
            ", ",
        );
        out.push_str(" FROM ");
        self.write_identifier(&mut out, statement.table);
        if !statement.alias.is_empty() {
            out.push_str(" AS ");
            self.write_identifier(&mut out, statement.alias);
        }
        for join in &statement.joins {
            out.push(' ');
            self.write_join(&mut out, join);
        }
        self.write_where(&mut out, &mut params, &statement.predicate);
        if !statement.order_by.is_empty() {
            out.push_str(" ORDER BY ");
            separated_by(
                &mut out,
                &statement.order_by,
                |out, v| {
                    out.push_str(&v.expression);
                    if v.descending {
                        out.push_str(" DESC");
                    }
                },
                ", ",
            );
        }
        Query::new(out, params)
    }

    fn build_update(&self, table: &str, sets: Vec<(&str, Value)>, predicate: &Predicate) -> Query {
        let mut out = String::with_capacity(64 + sets.len() * 16);
        let mut params = Vec::with_capacity(sets.len() + 1);
        out.push_str("UPDATE ");
        self.write_identifier(&mut out, table);
        out.push_str(" SET ");
        separated_by(
            &mut out,
            sets,
            |out, (column, value)| {
                self.write_identifier(out, column);
                out.push_str(" = ");
                self.write_param(out, &mut params, value);
            },
            ", ",
        );
        self.write_where(&mut out, &mut params, predicate);
        Query::new(out, params)
    }

    fn build_delete(&self, table: &str, predicate: &Predicate) -> Query {
        let mut out = String::with_capacity(64);
        let mut params = Vec::new();
        out.push_str("DELETE FROM ");
        self.write_identifier(&mut out, table);
        self.write_where(&mut out, &mut params, predicate);
        Query::new(out, params)
    }

    fn build_create_table(&self, statement: &CreateTable<'_>) -> Query {
        let mut out = String::with_capacity(256);
        out.push_str("CREATE TABLE ");
        if statement.if_not_exists {
            out.push_str("IF NOT EXISTS ");
        }
        self.write_identifier(&mut out, statement.table);
        out.push_str(" (\n");
        separated_by(
            &mut out,
            statement.columns,
            |out, v| out.push_str(v),
            ",\n",
        );
        if !statement.primary_keys.is_empty() {
            if !statement.columns.is_empty() {
                out.push_str(",\n");
            }
            out.push_str("PRIMARY KEY (");
            separated_by(
                &mut out,
                statement.primary_keys,
                |out, v| self.write_identifier(out, v),
                ", ",
            );
            out.push(')');
        }
        for index in statement.indexes {
            let mut fragment = String::new();
            self.write_index(&mut fragment, index);
            if !fragment.is_empty() {
                out.push_str(",\n");
                out.push_str(&fragment);
            }
        }
        out.push_str("\n)");
        self.write_table_comment(&mut out, statement.comment);
        Query::from(out)
    }

    fn write_index(&self, out: &mut String, index: &IndexDef) {
        if index.unique {
            out.push_str("UNIQUE ");
        }
        out.push_str("KEY ");
        self.write_identifier(out, &index.name);
        out.push_str(" (");
        separated_by(
            out,
            &index.columns,
            |out, v| self.write_identifier(out, v),
            ", ",
        );
        out.push(')');
    }

    fn write_table_comment(&self, out: &mut String, comment: &str) {
        if comment.is_empty() {
            return;
        }
        out.push_str(" COMMENT ");
        self.write_value_string(out, comment);
    }
}

/// Writer producing the default dialect.
#[derive(Default, Debug, Clone, Copy)]
pub struct GenericSqlWriter;

impl GenericSqlWriter {
    pub fn new() -> Self {
        Self
    }
}

impl SqlWriter for GenericSqlWriter {}


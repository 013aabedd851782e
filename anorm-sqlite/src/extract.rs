use anorm_core::{DATE_FORMAT, Error, Result, TIME_FORMAT, TIMESTAMP_FORMAT, Value};
use rusqlite::types::{Value as SqliteValue, ValueRef};
use time::format_description::well_known::Rfc3339;

/// Parameter binding. SQLite has no date, uuid or decimal storage class, those are bound as text.
pub(crate) fn to_sqlite(value: &Value) -> Result<SqliteValue> {
    if value.is_null() {
        return Ok(SqliteValue::Null);
    }
    Ok(match value {
        Value::Boolean(Some(v)) => SqliteValue::Integer(*v as i64),
        Value::Int8(Some(v)) => SqliteValue::Integer(*v as i64),
        Value::Int16(Some(v)) => SqliteValue::Integer(*v as i64),
        Value::Int32(Some(v)) => SqliteValue::Integer(*v as i64),
        Value::Int64(Some(v)) => SqliteValue::Integer(*v),
        Value::UInt8(Some(v)) => SqliteValue::Integer(*v as i64),
        Value::UInt16(Some(v)) => SqliteValue::Integer(*v as i64),
        Value::UInt32(Some(v)) => SqliteValue::Integer(*v as i64),
        Value::UInt64(Some(v)) => SqliteValue::Integer(i64::try_from(*v).map_err(|_| {
            Error::msg(format!("Value {} does not fit a SQLite INTEGER", v))
        })?),
        Value::Float32(Some(v)) => SqliteValue::Real(*v as f64),
        Value::Float64(Some(v)) => SqliteValue::Real(*v),
        Value::Decimal(Some(v)) => SqliteValue::Text(v.to_string()),
        Value::Varchar(Some(v)) => SqliteValue::Text(v.clone()),
        Value::Blob(Some(v)) => SqliteValue::Blob(v.to_vec()),
        Value::Date(Some(v)) => SqliteValue::Text(v.format(DATE_FORMAT)?),
        Value::Time(Some(v)) => SqliteValue::Text(v.format(TIME_FORMAT)?),
        Value::Timestamp(Some(v)) => SqliteValue::Text(v.format(TIMESTAMP_FORMAT)?),
        Value::TimestampWithTimezone(Some(v)) => SqliteValue::Text(v.format(&Rfc3339)?),
        Value::Uuid(Some(v)) => SqliteValue::Text(v.to_string()),
        v => {
            return Err(Error::msg(format!(
                "Cannot bind a {} value as a SQLite parameter",
                v.kind_name()
            )));
        }
    })
}

/// Column value as read, the entity conversion narrows it afterwards.
pub(crate) fn from_sqlite(value: ValueRef<'_>) -> Result<Value> {
    Ok(match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(v) => Value::Int64(Some(v)),
        ValueRef::Real(v) => Value::Float64(Some(v)),
        ValueRef::Text(v) => Value::Varchar(Some(
            String::from_utf8(v.to_vec())
                .map_err(|e| Error::new(e).context("SQLite returned TEXT that is not valid UTF-8"))?,
        )),
        ValueRef::Blob(v) => Value::Blob(Some(v.into())),
    })
}

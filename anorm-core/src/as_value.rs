use crate::{Error, FieldKind, Result, Value};
use anyhow::Context;
use rust_decimal::{
    Decimal,
    prelude::{FromPrimitive, ToPrimitive},
};
use std::{any, str::FromStr};
use time::{
    Date, OffsetDateTime, PrimitiveDateTime, Time, UtcOffset,
    format_description::{BorrowedFormatItem, well_known::Rfc3339},
    macros::{datetime, format_description},
};
use uuid::Uuid;

pub const DATE_FORMAT: &[BorrowedFormatItem<'_>] = format_description!("[year]-[month]-[day]");
pub const TIME_FORMAT: &[BorrowedFormatItem<'_>] =
    format_description!("[hour]:[minute]:[second].[subsecond]");
const TIME_FORMAT_SHORT: &[BorrowedFormatItem<'_>] = format_description!("[hour]:[minute]:[second]");
pub const TIMESTAMP_FORMAT: &[BorrowedFormatItem<'_>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second].[subsecond]");
const TIMESTAMP_FORMAT_SHORT: &[BorrowedFormatItem<'_>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");

/// Earliest instant a timestamp field can hold before it counts as unset: `0001-01-01 00:00:00`.
pub const ZERO_INSTANT: PrimitiveDateTime = datetime!(0001-01-01 0:00);

/// Conversion between native field types and [`Value`].
///
/// Every entity field type implements it, the derive macro reads and writes
/// fields exclusively through this trait.
pub trait AsValue {
    /// Classification used to write back generated keys.
    const KIND: FieldKind = FieldKind::Other;
    /// Typed NULL for this type.
    fn as_empty_value() -> Value;
    fn as_value(self) -> Value;
    /// Attempt to convert a dynamic [`Value`] into `Self`.
    ///
    /// Implementations accept the canonical variant and, where it is lossless,
    /// other widths or a textual representation.
    fn try_from_value(value: Value) -> Result<Self>
    where
        Self: Sized;
    /// Value used when a row does not carry the column at all.
    fn zero() -> Result<Self>
    where
        Self: Sized;
}

fn mismatch<T>(value: &Value) -> Error {
    Error::msg(format!(
        "Cannot convert {} value {} to {}",
        value.kind_name(),
        value,
        any::type_name::<T>()
    ))
}

macro_rules! impl_as_value_integer {
    ($source:ty, $variant:path, $kind:expr) => {
        impl AsValue for $source {
            const KIND: FieldKind = $kind;
            fn as_empty_value() -> Value {
                $variant(None)
            }
            fn as_value(self) -> Value {
                $variant(Some(self))
            }
            fn try_from_value(value: Value) -> Result<Self> {
                if let Some(v) = value.as_integer() {
                    return <$source>::try_from(v).map_err(|_| {
                        Error::msg(format!(
                            "Value {} is out of range for {}",
                            v,
                            any::type_name::<Self>()
                        ))
                    });
                }
                match value {
                    Value::Boolean(Some(v)) => Ok(v as $source),
                    Value::Varchar(Some(ref v)) => v.trim().parse::<$source>().with_context(|| {
                        format!("Cannot parse `{}` as {}", v, any::type_name::<Self>())
                    }),
                    _ => Err(mismatch::<Self>(&value)),
                }
            }
            fn zero() -> Result<Self> {
                Ok(0)
            }
        }
    };
}
impl_as_value_integer!(i8, Value::Int8, FieldKind::Signed);
impl_as_value_integer!(i16, Value::Int16, FieldKind::Signed);
impl_as_value_integer!(i32, Value::Int32, FieldKind::Signed);
impl_as_value_integer!(i64, Value::Int64, FieldKind::Signed);
impl_as_value_integer!(u8, Value::UInt8, FieldKind::Unsigned);
impl_as_value_integer!(u16, Value::UInt16, FieldKind::Unsigned);
impl_as_value_integer!(u32, Value::UInt32, FieldKind::Unsigned);
impl_as_value_integer!(u64, Value::UInt64, FieldKind::Unsigned);

macro_rules! impl_as_value_float {
    ($source:ty, $variant:path) => {
        impl AsValue for $source {
            fn as_empty_value() -> Value {
                $variant(None)
            }
            fn as_value(self) -> Value {
                $variant(Some(self))
            }
            fn try_from_value(value: Value) -> Result<Self> {
                if let Some(v) = value.as_integer() {
                    return Ok(v as $source);
                }
                match value {
                    Value::Float32(Some(v)) => Ok(v as $source),
                    Value::Float64(Some(v)) => Ok(v as $source),
                    Value::Decimal(Some(v)) => v
                        .to_f64()
                        .map(|v| v as $source)
                        .ok_or_else(|| mismatch::<Self>(&value)),
                    Value::Varchar(Some(ref v)) => v.trim().parse::<$source>().with_context(|| {
                        format!("Cannot parse `{}` as {}", v, any::type_name::<Self>())
                    }),
                    _ => Err(mismatch::<Self>(&value)),
                }
            }
            fn zero() -> Result<Self> {
                Ok(0.0)
            }
        }
    };
}
impl_as_value_float!(f32, Value::Float32);
impl_as_value_float!(f64, Value::Float64);

impl AsValue for bool {
    fn as_empty_value() -> Value {
        Value::Boolean(None)
    }
    fn as_value(self) -> Value {
        Value::Boolean(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        if let Some(v) = value.as_integer() {
            return Ok(v != 0);
        }
        match value {
            Value::Boolean(Some(v)) => Ok(v),
            Value::Varchar(Some(ref v)) => match v.trim() {
                "1" | "t" | "true" | "TRUE" => Ok(true),
                "0" | "f" | "false" | "FALSE" => Ok(false),
                _ => Err(mismatch::<Self>(&value)),
            },
            _ => Err(mismatch::<Self>(&value)),
        }
    }
    fn zero() -> Result<Self> {
        Ok(false)
    }
}

impl AsValue for String {
    fn as_empty_value() -> Value {
        Value::Varchar(None)
    }
    fn as_value(self) -> Value {
        Value::Varchar(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Varchar(Some(v)) => Ok(v),
            Value::Blob(Some(v)) => String::from_utf8(v.into_vec())
                .context("Cannot convert a BLOB that is not valid UTF-8 into String"),
            Value::Decimal(Some(v)) => Ok(v.to_string()),
            Value::Uuid(Some(v)) => Ok(v.to_string()),
            _ => Err(mismatch::<Self>(&value)),
        }
    }
    fn zero() -> Result<Self> {
        Ok(String::new())
    }
}

impl AsValue for Vec<u8> {
    fn as_empty_value() -> Value {
        Value::Blob(None)
    }
    fn as_value(self) -> Value {
        Value::Blob(Some(self.into_boxed_slice()))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Blob(Some(v)) => Ok(v.into_vec()),
            Value::Varchar(Some(v)) => Ok(v.into_bytes()),
            _ => Err(mismatch::<Self>(&value)),
        }
    }
    fn zero() -> Result<Self> {
        Ok(Vec::new())
    }
}

impl AsValue for Decimal {
    fn as_empty_value() -> Value {
        Value::Decimal(None)
    }
    fn as_value(self) -> Value {
        Value::Decimal(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        if let Some(v) = value.as_integer() {
            return Decimal::from_i128(v).ok_or_else(|| mismatch::<Self>(&value));
        }
        match value {
            Value::Decimal(Some(v)) => Ok(v),
            Value::Float32(Some(v)) => Decimal::from_f32(v).ok_or_else(|| mismatch::<Self>(&value)),
            Value::Float64(Some(v)) => Decimal::from_f64(v).ok_or_else(|| mismatch::<Self>(&value)),
            Value::Varchar(Some(ref v)) => Decimal::from_str(v.trim())
                .with_context(|| format!("Cannot parse `{}` as Decimal", v)),
            _ => Err(mismatch::<Self>(&value)),
        }
    }
    fn zero() -> Result<Self> {
        Ok(Decimal::ZERO)
    }
}

impl AsValue for Uuid {
    fn as_empty_value() -> Value {
        Value::Uuid(None)
    }
    fn as_value(self) -> Value {
        Value::Uuid(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Uuid(Some(v)) => Ok(v),
            Value::Varchar(Some(ref v)) => {
                Uuid::parse_str(v.trim()).with_context(|| format!("Cannot parse `{}` as Uuid", v))
            }
            Value::Blob(Some(ref v)) => Uuid::from_slice(v).context("Cannot convert BLOB into Uuid"),
            _ => Err(mismatch::<Self>(&value)),
        }
    }
    fn zero() -> Result<Self> {
        Ok(Uuid::nil())
    }
}

impl AsValue for Date {
    fn as_empty_value() -> Value {
        Value::Date(None)
    }
    fn as_value(self) -> Value {
        Value::Date(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Date(Some(v)) => Ok(v),
            Value::Timestamp(Some(v)) => Ok(v.date()),
            Value::Varchar(Some(ref v)) => Date::parse(v.trim(), DATE_FORMAT)
                .with_context(|| format!("Cannot parse `{}` as Date", v)),
            _ => Err(mismatch::<Self>(&value)),
        }
    }
    fn zero() -> Result<Self> {
        Ok(ZERO_INSTANT.date())
    }
}

impl AsValue for Time {
    fn as_empty_value() -> Value {
        Value::Time(None)
    }
    fn as_value(self) -> Value {
        Value::Time(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Time(Some(v)) => Ok(v),
            Value::Timestamp(Some(v)) => Ok(v.time()),
            Value::Varchar(Some(ref v)) => {
                let v = v.trim();
                Time::parse(v, TIME_FORMAT)
                    .or_else(|_| Time::parse(v, TIME_FORMAT_SHORT))
                    .with_context(|| format!("Cannot parse `{}` as Time", v))
            }
            _ => Err(mismatch::<Self>(&value)),
        }
    }
    fn zero() -> Result<Self> {
        Ok(Time::MIDNIGHT)
    }
}

fn parse_timestamp(value: &str) -> Result<PrimitiveDateTime> {
    let value = value.trim().replacen('T', " ", 1);
    PrimitiveDateTime::parse(&value, TIMESTAMP_FORMAT)
        .or_else(|_| PrimitiveDateTime::parse(&value, TIMESTAMP_FORMAT_SHORT))
        .with_context(|| format!("Cannot parse `{}` as a timestamp", value))
}

impl AsValue for PrimitiveDateTime {
    fn as_empty_value() -> Value {
        Value::Timestamp(None)
    }
    fn as_value(self) -> Value {
        Value::Timestamp(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Timestamp(Some(v)) => Ok(v),
            Value::TimestampWithTimezone(Some(v)) => {
                let v = v.to_offset(UtcOffset::UTC);
                Ok(PrimitiveDateTime::new(v.date(), v.time()))
            }
            Value::Date(Some(v)) => Ok(PrimitiveDateTime::new(v, Time::MIDNIGHT)),
            Value::Varchar(Some(ref v)) => parse_timestamp(v),
            _ => Err(mismatch::<Self>(&value)),
        }
    }
    fn zero() -> Result<Self> {
        Ok(ZERO_INSTANT)
    }
}

impl AsValue for OffsetDateTime {
    fn as_empty_value() -> Value {
        Value::TimestampWithTimezone(None)
    }
    fn as_value(self) -> Value {
        Value::TimestampWithTimezone(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::TimestampWithTimezone(Some(v)) => Ok(v),
            Value::Timestamp(Some(v)) => Ok(v.assume_utc()),
            Value::Varchar(Some(ref v)) => OffsetDateTime::parse(v.trim(), &Rfc3339)
                .or_else(|_| parse_timestamp(v).map(PrimitiveDateTime::assume_utc)),
            _ => Err(mismatch::<Self>(&value)),
        }
    }
    fn zero() -> Result<Self> {
        Ok(ZERO_INSTANT.assume_utc())
    }
}

impl<T: AsValue> AsValue for Option<T> {
    const KIND: FieldKind = T::KIND;
    fn as_empty_value() -> Value {
        T::as_empty_value()
    }
    fn as_value(self) -> Value {
        match self {
            Some(v) => v.as_value(),
            None => T::as_empty_value(),
        }
    }
    fn try_from_value(value: Value) -> Result<Self> {
        if value.is_null() {
            return Ok(None);
        }
        T::try_from_value(value).map(Some)
    }
    fn zero() -> Result<Self> {
        Ok(None)
    }
}

impl<T: AsValue> AsValue for Box<T> {
    const KIND: FieldKind = T::KIND;
    fn as_empty_value() -> Value {
        T::as_empty_value()
    }
    fn as_value(self) -> Value {
        (*self).as_value()
    }
    fn try_from_value(value: Value) -> Result<Self> {
        T::try_from_value(value).map(Box::new)
    }
    fn zero() -> Result<Self> {
        T::zero().map(Box::new)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Varchar(Some(value.to_string()))
    }
}

macro_rules! impl_from_for_value {
    ($($source:ty),+ $(,)?) => {
        $(
            impl From<$source> for Value {
                fn from(value: $source) -> Self {
                    value.as_value()
                }
            }
        )+
    };
}
impl_from_for_value!(
    bool,
    i8,
    i16,
    i32,
    i64,
    u8,
    u16,
    u32,
    u64,
    f32,
    f64,
    String,
    Vec<u8>,
    Decimal,
    Uuid,
    Date,
    Time,
    PrimitiveDateTime,
    OffsetDateTime,
);

use crate::{AsValue, Nullable, Value, ZERO_INSTANT};
use rust_decimal::Decimal;
use time::{Date, OffsetDateTime, PrimitiveDateTime, Time};
use uuid::Uuid;

/// Decides whether a field of an example record takes part in a filter.
///
/// A field that is absent contributes nothing to the derived `WHERE`.
/// Numbers are absent at zero (floats at or below zero), strings when empty,
/// timestamps at or before [`ZERO_INSTANT`]. Types that have no meaningful
/// "unset" state (booleans, blobs, uuids, decimals, dates, times) are always
/// absent and never filter by example.
pub trait Example {
    fn is_absent(&self) -> bool;
    /// Check applied to the payload of a valid [`Nullable`].
    fn is_absent_when_valid(&self) -> bool {
        false
    }
}

/// Field types that are not themselves optional wrappers.
///
/// `Option` and `Box` examine only one level of indirection.
pub trait Direct: Example {}

macro_rules! impl_example {
    ($($source:ty),+ => |$v:ident| $absent:expr) => {
        $(
            impl Example for $source {
                fn is_absent(&self) -> bool {
                    let $v = self;
                    $absent
                }
            }
            impl Direct for $source {}
        )+
    };
}
impl_example!(i8, i16, i32, i64, u8, u16, u32, u64 => |v| *v == 0);
impl_example!(f32, f64 => |v| *v <= 0.0);
impl_example!(String => |v| v.is_empty());
impl_example!(bool, Vec<u8>, Uuid, Decimal, Date, Time => |_v| true);

impl Example for PrimitiveDateTime {
    fn is_absent(&self) -> bool {
        *self <= ZERO_INSTANT
    }
    fn is_absent_when_valid(&self) -> bool {
        self.is_absent()
    }
}
impl Direct for PrimitiveDateTime {}

impl Example for OffsetDateTime {
    fn is_absent(&self) -> bool {
        *self <= ZERO_INSTANT.assume_utc()
    }
    fn is_absent_when_valid(&self) -> bool {
        self.is_absent()
    }
}
impl Direct for OffsetDateTime {}

impl<T: Example> Example for Nullable<T> {
    fn is_absent(&self) -> bool {
        !self.valid || self.value.is_absent_when_valid()
    }
}
impl<T: Example> Direct for Nullable<T> {}

impl<T: Direct> Example for Option<T> {
    fn is_absent(&self) -> bool {
        match self {
            Some(v) => v.is_absent(),
            None => true,
        }
    }
}

impl<T: Direct> Example for Box<T> {
    fn is_absent(&self) -> bool {
        (**self).is_absent()
    }
}

/// Predicate value contributed by a field of an example record, if any.
pub fn example_value<T: Example + AsValue + Clone>(value: &T) -> Option<Value> {
    if value.is_absent() {
        None
    } else {
        Some(value.clone().as_value())
    }
}

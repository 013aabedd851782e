use crate::{AsValue, FieldKind, Result, Value};

/// Value paired with an explicit validity flag, the nullable column wrapper.
///
/// An invalid `Nullable` is written as NULL and never contributes to a
/// by-example filter. A valid one filters even when its payload is the zero
/// value of `T`, timestamps excepted.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Nullable<T> {
    pub value: T,
    pub valid: bool,
}

impl<T> Nullable<T> {
    /// A valid value.
    pub const fn new(value: T) -> Self {
        Self { value, valid: true }
    }
    /// A NULL.
    pub fn null() -> Self
    where
        T: Default,
    {
        Self {
            value: T::default(),
            valid: false,
        }
    }
    pub fn as_option(&self) -> Option<&T> {
        self.valid.then_some(&self.value)
    }
    pub fn into_option(self) -> Option<T> {
        self.valid.then_some(self.value)
    }
}

impl<T: Default> From<Option<T>> for Nullable<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => Self::new(v),
            None => Self::null(),
        }
    }
}

impl<T: AsValue> AsValue for Nullable<T> {
    const KIND: FieldKind = T::KIND;
    fn as_empty_value() -> Value {
        T::as_empty_value()
    }
    fn as_value(self) -> Value {
        if self.valid {
            self.value.as_value()
        } else {
            T::as_empty_value()
        }
    }
    fn try_from_value(value: Value) -> Result<Self> {
        if value.is_null() {
            return Ok(Self {
                value: T::zero()?,
                valid: false,
            });
        }
        T::try_from_value(value).map(Self::new)
    }
    fn zero() -> Result<Self> {
        Ok(Self {
            value: T::zero()?,
            valid: false,
        })
    }
}

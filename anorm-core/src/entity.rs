use crate::{Result, RowLabeled, Value};
use std::fmt::{self, Debug};

/// Integer flavour of a field, decides how a generated key is written back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    Signed,
    Unsigned,
    Other,
}

/// Accessors for one field of an entity, generated by `#[derive(Entity)]`.
pub struct FieldDef<E> {
    /// Field name, raw identifier prefix removed.
    pub name: &'static str,
    /// Source of the `#[orm("...")]` attribute, empty when missing.
    pub tag: &'static str,
    pub kind: FieldKind,
    /// Current value of the field.
    pub get: fn(&E) -> Value,
    /// Value the field contributes to a by-example filter, `None` when absent.
    pub example: fn(&E) -> Option<Value>,
    /// Overwrite the field, converting the value.
    pub set: fn(&mut E, Value) -> Result<()>,
}

impl<E> Debug for FieldDef<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDef")
            .field("name", &self.name)
            .field("tag", &self.tag)
            .field("kind", &self.kind)
            .finish()
    }
}

/// A record type mapped to a table. Implement it with `#[derive(Entity)]`.
pub trait Entity: Sized + Send + Sync + 'static {
    /// Simple name of the type, input of the table naming strategy.
    fn entity_name() -> &'static str;
    /// Fields in declaration order.
    fn fields() -> &'static [FieldDef<Self>];
    /// Build the entity from a row whose labels are field names. Fields
    /// missing from the row get their zero value.
    fn from_row(row: RowLabeled) -> Result<Self>;

    fn field(name: &str) -> Option<&'static FieldDef<Self>> {
        Self::fields().iter().find(|v| v.name == name)
    }
}

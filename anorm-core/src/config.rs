use crate::{Error, JoinRef, Query, Strategy, Value};
use std::{collections::HashMap, fmt, sync::Arc};

/// Observer of the statements sent by one family of operations.
pub trait ExecHook: Send + Sync {
    /// Called before execution, the statement may be rewritten.
    fn before_exec(&self, _entity: &str, _query: &mut Query) {}
    /// Called after execution with the outcome.
    fn after_exec(&self, _entity: &str, _query: &Query, _error: Option<&Error>) {}
}

/// Defaults shared by every registered entity.
#[derive(Clone)]
pub struct Config {
    /// Create missing tables on registration, OR-combined with [`EntityConfig::migrate`].
    pub migrate: bool,
    pub table_name_strategy: Strategy,
    pub column_name_strategy: Strategy,
    pub insert_hooks: Vec<Arc<dyn ExecHook>>,
    pub update_hooks: Vec<Arc<dyn ExecHook>>,
    pub delete_hooks: Vec<Arc<dyn ExecHook>>,
    pub select_hooks: Vec<Arc<dyn ExecHook>>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            migrate: false,
            table_name_strategy: Strategy::Underline,
            column_name_strategy: Strategy::Underline,
            insert_hooks: Vec::new(),
            update_hooks: Vec::new(),
            delete_hooks: Vec::new(),
            select_hooks: Vec::new(),
        }
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("migrate", &self.migrate)
            .field("table_name_strategy", &self.table_name_strategy)
            .field("column_name_strategy", &self.column_name_strategy)
            .field("insert_hooks", &self.insert_hooks.len())
            .field("update_hooks", &self.update_hooks.len())
            .field("delete_hooks", &self.delete_hooks.len())
            .field("select_hooks", &self.select_hooks.len())
            .finish()
    }
}

/// Index created by migration.
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct IndexDef {
    pub name: String,
    pub columns: Vec<String>,
    pub unique: bool,
}

impl IndexDef {
    pub fn new<S: Into<String>>(name: impl Into<String>, columns: impl IntoIterator<Item = S>) -> Self {
        Self {
            name: name.into(),
            columns: columns.into_iter().map(Into::into).collect(),
            unique: false,
        }
    }
    pub fn unique<S: Into<String>>(
        name: impl Into<String>,
        columns: impl IntoIterator<Item = S>,
    ) -> Self {
        Self {
            unique: true,
            ..Self::new(name, columns)
        }
    }
}

/// Wraps a projected column in a NULL replacing function, as in
/// `IFNULL(t.name, ?) AS name`.
#[derive(Debug, Clone, PartialEq)]
pub struct NullField {
    pub function: String,
    pub default: Value,
    /// Bind the default as a parameter instead of writing it inline.
    pub as_parameter: bool,
}

impl NullField {
    /// The default is bound as a parameter.
    pub fn parameter(function: impl Into<String>, default: impl Into<Value>) -> Self {
        Self {
            function: function.into(),
            default: default.into(),
            as_parameter: true,
        }
    }
    /// The default is written as an SQL literal.
    pub fn literal(function: impl Into<String>, default: impl Into<Value>) -> Self {
        Self {
            function: function.into(),
            default: default.into(),
            as_parameter: false,
        }
    }
}

/// Per entity overrides, filled by the callback passed to `Registry::register`.
///
/// Column lists extend what the field attributes declare, join refs replace the
/// attribute ones for the same field.
#[derive(Default, Debug, Clone)]
pub struct EntityConfig {
    pub migrate: bool,
    /// Explicit table name, otherwise derived from the type name.
    pub table: Option<String>,
    pub comment: String,
    /// Overrides [`Config::column_name_strategy`] for this entity.
    pub column_name_strategy: Option<Strategy>,
    /// Named data source, `_` when missing.
    pub data_source: Option<String>,
    pub primary_keys: Vec<String>,
    pub column_definitions: Vec<String>,
    pub indexes: Vec<IndexDef>,
    pub insert_ignores: Vec<String>,
    pub update_ignores: Vec<String>,
    pub join_refs: Vec<JoinRef>,
    /// Keyed by field name, used when selecting without joins.
    pub null_fields: HashMap<String, NullField>,
    /// Keyed by field name, used when selecting with joins.
    pub join_null_fields: HashMap<String, NullField>,
}

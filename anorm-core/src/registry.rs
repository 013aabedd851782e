use crate::{
    Config, CreateTable, DEFAULT_DATA_SOURCE, DataSourcePool, Entity, EntityConfig, IndexDef,
    JoinRef, NullField, OrmError, Result, Tag,
};
use parking_lot::RwLock;
use std::{
    any::{TypeId, type_name},
    collections::{HashMap, HashSet},
    fmt,
    sync::Arc,
};

/// Everything known about a registered entity. Immutable once registered.
#[derive(Debug, Clone, PartialEq)]
pub struct RegisteredType {
    /// Fully qualified Rust type name.
    pub type_name: &'static str,
    pub table_name: String,
    /// Field names in declaration order.
    pub fields: Vec<&'static str>,
    /// Column names aligned with `fields`.
    pub columns: Vec<String>,
    pub field_to_column: HashMap<&'static str, String>,
    pub column_to_field: HashMap<String, &'static str>,
    pub primary_keys: Vec<String>,
    pub insert_ignore: HashSet<String>,
    pub update_ignore: HashSet<String>,
    /// Virtual columns, attribute ones in field order then configured ones.
    pub join_refs: Vec<JoinRef>,
    /// Name of the data source the entity uses by default.
    pub data_source: String,
    pub column_definitions: Vec<String>,
    pub indexes: Vec<IndexDef>,
    pub comment: String,
    pub null_fields: HashMap<String, NullField>,
    pub join_null_fields: HashMap<String, NullField>,
}

impl RegisteredType {
    pub fn column_of(&self, field: &str) -> Option<&str> {
        self.field_to_column.get(field).map(String::as_str)
    }
    pub fn field_of(&self, column: &str) -> Option<&'static str> {
        self.column_to_field.get(column).copied()
    }
    pub fn join_ref(&self, field: &str) -> Option<&JoinRef> {
        self.join_refs.iter().find(|v| v.field == field)
    }
    pub fn is_primary_key(&self, column: &str) -> bool {
        self.primary_keys.iter().any(|v| v == column)
    }

    /// Build the metadata of `E` from its field attributes and `config`.
    pub fn build<E: Entity>(global: &Config, config: &EntityConfig) -> Result<Self> {
        let strategy = config
            .column_name_strategy
            .unwrap_or(global.column_name_strategy);
        let mut result = RegisteredType {
            type_name: type_name::<E>(),
            table_name: config
                .table
                .clone()
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| global.table_name_strategy.resolve(E::entity_name())),
            fields: Vec::with_capacity(E::fields().len()),
            columns: Vec::with_capacity(E::fields().len()),
            field_to_column: HashMap::with_capacity(E::fields().len()),
            column_to_field: HashMap::with_capacity(E::fields().len()),
            primary_keys: Vec::new(),
            insert_ignore: HashSet::new(),
            update_ignore: HashSet::new(),
            join_refs: Vec::new(),
            data_source: config
                .data_source
                .clone()
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| DEFAULT_DATA_SOURCE.to_string()),
            column_definitions: Vec::new(),
            indexes: config.indexes.clone(),
            comment: config.comment.clone(),
            null_fields: config.null_fields.clone(),
            join_null_fields: config.join_null_fields.clone(),
        };
        for field in E::fields() {
            let tag = Tag::parse(field.tag);
            if !field.tag.is_empty() {
                log::debug!("{}.{} parsed: {}", result.type_name, field.name, tag);
            }
            let column = if tag.column.is_empty() {
                strategy.resolve(field.name)
            } else {
                tag.column.clone()
            };
            if tag.primary_key {
                result.primary_keys.push(column.clone());
            }
            if !tag.definition.is_empty() {
                result.column_definitions.push(tag.definition.clone());
            }
            if tag.insert_ignore {
                result.insert_ignore.insert(column.clone());
            }
            if tag.update_ignore {
                result.update_ignore.insert(column.clone());
            }
            if !tag.join.is_empty() {
                if let Some(join) = JoinRef::parse(field.name, &tag.join) {
                    result.join_refs.push(join);
                }
            }
            result.fields.push(field.name);
            result.field_to_column.insert(field.name, column.clone());
            result.column_to_field.insert(column.clone(), field.name);
            result.columns.push(column);
        }
        result
            .primary_keys
            .extend(config.primary_keys.iter().cloned());
        result
            .column_definitions
            .extend(config.column_definitions.iter().cloned());
        result
            .insert_ignore
            .extend(config.insert_ignores.iter().cloned());
        result
            .update_ignore
            .extend(config.update_ignores.iter().cloned());
        for join in &config.join_refs {
            match result.join_refs.iter_mut().find(|v| v.field == join.field) {
                Some(existing) => *existing = join.clone(),
                None => result.join_refs.push(join.clone()),
            }
        }
        for join in &result.join_refs {
            if !result.columns.contains(&join.self_column) {
                return Err(OrmError::UnknownJoinColumn {
                    entity: result.type_name.to_string(),
                    field: join.field.clone(),
                    column: join.self_column.clone(),
                }
                .into());
            }
        }
        Ok(result)
    }
}

/// Metadata of every registered entity, plus the configuration and the data
/// sources the handles draw from.
pub struct Registry {
    config: Config,
    pool: Arc<DataSourcePool>,
    types: RwLock<HashMap<TypeId, Arc<RegisteredType>>>,
}

impl Registry {
    pub fn new(config: Config, pool: Arc<DataSourcePool>) -> Self {
        Self {
            config,
            pool,
            types: Default::default(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn pool(&self) -> &Arc<DataSourcePool> {
        &self.pool
    }

    /// Register `E`, letting `configure` adjust its [`EntityConfig`].
    ///
    /// The metadata is visible to other callers before the migration DDL runs.
    /// A migration that fails to execute is logged and does not fail the
    /// registration, a missing data source does.
    pub async fn register<E: Entity>(
        &self,
        configure: impl FnOnce(&mut EntityConfig),
    ) -> Result<Arc<RegisteredType>> {
        let mut config = EntityConfig::default();
        configure(&mut config);
        let meta = Arc::new(RegisteredType::build::<E>(&self.config, &config)?);
        {
            let mut types = self.types.write();
            if types.contains_key(&TypeId::of::<E>()) {
                return Err(OrmError::DuplicateRegistration {
                    entity: meta.type_name.to_string(),
                }
                .into());
            }
            types.insert(TypeId::of::<E>(), meta.clone());
        }
        log::debug!(
            "Registered `{}` as table `{}` on data source `{}`",
            meta.type_name,
            meta.table_name,
            meta.data_source
        );
        if config.migrate || self.config.migrate {
            self.migrate(&meta, &config).await?;
        }
        Ok(meta)
    }

    /// Register `E` with the default configuration.
    pub async fn register_default<E: Entity>(&self) -> Result<Arc<RegisteredType>> {
        self.register::<E>(|_| {}).await
    }

    async fn migrate(&self, meta: &RegisteredType, config: &EntityConfig) -> Result<()> {
        let connection = match config.data_source.as_deref().filter(|v| !v.is_empty()) {
            Some(name) => self.pool.required(name)?,
            None => self.pool.master()?,
        };
        let query = connection.sql_writer().build_create_table(&CreateTable {
            table: &meta.table_name,
            if_not_exists: true,
            primary_keys: &meta.primary_keys,
            columns: &meta.column_definitions,
            indexes: &meta.indexes,
            comment: &meta.comment,
        });
        log::debug!(
            "Migrating `{}` into table `{}`: {}",
            meta.type_name,
            meta.table_name,
            query
        );
        if let Err(e) = connection.execute(query).await {
            log::error!(
                "Migration of `{}` into table `{}` failed: {:#}",
                meta.type_name,
                meta.table_name,
                e
            );
        }
        Ok(())
    }

    /// Metadata of `E`, or [`OrmError::UnknownEntity`].
    pub fn get<E: Entity>(&self) -> Result<Arc<RegisteredType>> {
        self.types
            .read()
            .get(&TypeId::of::<E>())
            .cloned()
            .ok_or_else(|| {
                OrmError::UnknownEntity {
                    entity: type_name::<E>().to_string(),
                }
                .into()
            })
    }

    pub fn is_registered<E: Entity>(&self) -> bool {
        self.types.read().contains_key(&TypeId::of::<E>())
    }

    pub fn len(&self) -> usize {
        self.types.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.read().is_empty()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("config", &self.config)
            .field("pool", &self.pool)
            .field("types", &self.len())
            .finish()
    }
}

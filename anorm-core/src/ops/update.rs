use crate::{Entity, Orm, OrmError, Predicate, Query, Result, Value};
use std::collections::HashSet;

/// Update builder, see [`Orm::update`].
///
/// Without [`UpdateOperation::only_where`] the record is located by its
/// primary key columns, except those listed in [`UpdateOperation::set`].
/// With an explicit set list only the listed columns are written, otherwise
/// every column outside the primary key and the update ignores is.
pub struct UpdateOperation<'a, E: Entity> {
    orm: &'a Orm<E>,
    set: Vec<String>,
    ignore: Vec<String>,
    wheres: Vec<Predicate>,
    only_wheres: Vec<Predicate>,
}

impl<'a, E: Entity> UpdateOperation<'a, E> {
    pub(crate) fn new(orm: &'a Orm<E>) -> Self {
        Self {
            orm,
            set: Vec::new(),
            ignore: Vec::new(),
            wheres: Vec::new(),
            only_wheres: Vec::new(),
        }
    }

    /// Also skip these columns, on top of the registered update ignores.
    pub fn ignore<S: Into<String>>(mut self, columns: impl IntoIterator<Item = S>) -> Self {
        self.ignore.extend(columns.into_iter().map(Into::into));
        self
    }

    /// Write only these columns.
    pub fn set<S: Into<String>>(mut self, columns: impl IntoIterator<Item = S>) -> Self {
        self.set.extend(columns.into_iter().map(Into::into));
        self
    }

    pub fn and_where(mut self, predicate: Predicate) -> Self {
        self.wheres.push(predicate);
        self
    }

    pub fn and_where_if(self, condition: bool, predicate: Predicate) -> Self {
        if condition {
            self.and_where(predicate)
        } else {
            self
        }
    }

    /// Filter exclusively on these predicates, the primary key is not used.
    pub fn only_where(mut self, predicate: Predicate) -> Self {
        self.only_wheres.push(predicate);
        self
    }

    pub fn only_where_if(self, condition: bool, predicate: Predicate) -> Self {
        if condition {
            self.only_where(predicate)
        } else {
            self
        }
    }

    fn build(&self, entity: &E) -> Result<Query> {
        let meta = &self.orm.meta;
        let set = self.set.iter().map(String::as_str).collect::<HashSet<_>>();
        let ignored = meta
            .update_ignore
            .iter()
            .map(String::as_str)
            .chain(self.ignore.iter().map(String::as_str))
            .collect::<HashSet<_>>();
        let by_primary_key = self.only_wheres.is_empty();
        let mut wheres = if by_primary_key {
            self.wheres.clone()
        } else {
            self.only_wheres.clone()
        };
        let mut sets: Vec<(&str, Value)> = Vec::new();
        for field in E::fields() {
            let Some(column) = meta.column_of(field.name) else {
                continue;
            };
            if meta.is_primary_key(column) && !set.contains(column) {
                if by_primary_key {
                    wheres.push(Predicate::eq(column, (field.get)(entity)));
                }
                continue;
            }
            let write = if set.is_empty() {
                !ignored.contains(column)
            } else {
                set.contains(column)
            };
            if write {
                sets.push((column, (field.get)(entity)));
            }
        }
        if sets.is_empty() {
            return Err(OrmError::NothingToUpdate {
                entity: meta.type_name.to_string(),
            }
            .into());
        }
        Ok(self
            .orm
            .sql_writer()
            .build_update(&meta.table_name, sets, &Predicate::And(wheres)))
    }

    async fn update_one(&self, operation: &str, entity: &E) -> Result<u64> {
        let query = self.build(entity)?;
        let result = self
            .orm
            .execute(operation, &self.orm.config.update_hooks, query)
            .await?;
        Ok(result.rows_affected)
    }

    /// Update one record, returns the number of rows affected.
    pub async fn by_pk(self, entity: &E) -> Result<u64> {
        self.update_one("OpsForUpdate.ByPK", entity).await
    }

    /// Update each record with the same clauses, returns the total number of
    /// rows affected. With `ignore_error` every record is attempted and the
    /// last error is returned, otherwise the first error stops the loop.
    pub async fn list(self, ignore_error: bool, entities: &[E]) -> Result<u64> {
        let mut total = 0;
        let mut error = None;
        for entity in entities {
            match self.update_one("OpsForUpdate.List", entity).await {
                Ok(v) => total += v,
                Err(e) if ignore_error => error = Some(e),
                Err(e) => return Err(e),
            }
        }
        match error {
            Some(e) => Err(e),
            None => Ok(total),
        }
    }
}

use crate::{Entity, FieldKind, Orm, Result, Value};
use std::collections::HashSet;

/// Insert builder, see [`Orm::insert`].
pub struct InsertOperation<'a, E: Entity> {
    orm: &'a Orm<E>,
    ignore: Vec<String>,
}

impl<'a, E: Entity> InsertOperation<'a, E> {
    pub(crate) fn new(orm: &'a Orm<E>) -> Self {
        Self {
            orm,
            ignore: Vec::new(),
        }
    }

    /// Also skip these columns, on top of the registered insert ignores.
    pub fn ignore<S: Into<String>>(mut self, columns: impl IntoIterator<Item = S>) -> Self {
        self.ignore.extend(columns.into_iter().map(Into::into));
        self
    }

    fn ignored(&self) -> HashSet<&str> {
        self.orm
            .meta
            .insert_ignore
            .iter()
            .map(String::as_str)
            .chain(self.ignore.iter().map(String::as_str))
            .collect()
    }

    fn build<'e>(&self, entities: impl IntoIterator<Item = &'e E>) -> crate::Query {
        let meta = &self.orm.meta;
        let ignored = self.ignored();
        let fields = E::fields()
            .iter()
            .filter_map(|field| {
                let column = meta.column_of(field.name)?;
                (!ignored.contains(column)).then_some((column, field))
            })
            .collect::<Vec<_>>();
        let columns = fields.iter().map(|(c, _)| *c).collect::<Vec<_>>();
        let rows = entities
            .into_iter()
            .map(|entity| fields.iter().map(|(_, f)| (f.get)(entity)).collect())
            .collect();
        self.orm
            .sql_writer()
            .build_insert(&meta.table_name, &columns, rows)
    }

    async fn insert_one(&self, entity: &mut E) -> Result<()> {
        let query = self.build([&*entity]);
        let result = self
            .orm
            .execute("OpsForInsert.One", &self.orm.config.insert_hooks, query)
            .await?;
        let id = result.last_affected_id.unwrap_or_default();
        let meta = &self.orm.meta;
        if id <= 0 || meta.primary_keys.len() != 1 {
            return Ok(());
        }
        let Some(field) = meta
            .field_of(&meta.primary_keys[0])
            .and_then(|name| E::field(name))
        else {
            return Ok(());
        };
        match field.kind {
            FieldKind::Signed => (field.set)(entity, Value::Int64(Some(id))),
            FieldKind::Unsigned => (field.set)(entity, Value::UInt64(Some(id as u64))),
            FieldKind::Other => Ok(()),
        }
    }

    /// Insert one record. With a single column primary key, the generated id
    /// is written back into the record.
    pub async fn one(self, entity: &mut E) -> Result<()> {
        self.insert_one(entity).await
    }

    /// Insert each record with [`InsertOperation::one`]. With `ignore_error`
    /// every record is attempted and the last error is returned, otherwise the
    /// first error stops the loop.
    pub async fn list(self, ignore_error: bool, entities: &mut [E]) -> Result<()> {
        let mut result = Ok(());
        for entity in entities.iter_mut() {
            if let Err(e) = self.insert_one(entity).await {
                if !ignore_error {
                    return Err(e);
                }
                result = Err(e);
            }
        }
        result
    }

    /// Insert all the records with one multi row statement, returns the
    /// number of rows inserted. Generated ids are not written back.
    pub async fn batch(self, entities: &[E]) -> Result<u64> {
        if entities.is_empty() {
            return Ok(0);
        }
        let query = self.build(entities);
        let result = self
            .orm
            .execute("OpsForInsert.Batch", &self.orm.config.insert_hooks, query)
            .await?;
        Ok(result.rows_affected)
    }
}

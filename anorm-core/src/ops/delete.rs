use crate::{Entity, Orm, Predicate, Result, derive_predicates, ops::where_predicate};

/// Delete builder, see [`Orm::delete`].
pub struct DeleteOperation<'a, E: Entity> {
    orm: &'a Orm<E>,
    wheres: Vec<Predicate>,
    only_wheres: Vec<Predicate>,
}

impl<'a, E: Entity> DeleteOperation<'a, E> {
    pub(crate) fn new(orm: &'a Orm<E>) -> Self {
        Self {
            orm,
            wheres: Vec::new(),
            only_wheres: Vec::new(),
        }
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

    /// Filter exclusively on these predicates, the example record is ignored.
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

    /// Delete the matching rows, returns how many were removed. Without
    /// predicates nor example every row of the table is deleted.
    pub async fn execute(self, example: Option<&E>) -> Result<u64> {
        let meta = &self.orm.meta;
        let predicate = where_predicate(self.only_wheres, self.wheres, || {
            example
                .map(|e| derive_predicates(meta, e, None))
                .unwrap_or_default()
        });
        let query = self
            .orm
            .sql_writer()
            .build_delete(&meta.table_name, &predicate);
        let result = self
            .orm
            .execute("OpsForDelete.Execute", &self.orm.config.delete_hooks, query)
            .await?;
        Ok(result.rows_affected)
    }
}

use crate::{Entity, JoinClause, Orm, Predicate, Result, derive_predicates, ops::where_predicate};

/// Count builder, see [`Orm::select_count`].
pub struct SelectCountOperation<'a, E: Entity> {
    orm: &'a Orm<E>,
    wheres: Vec<Predicate>,
    only_wheres: Vec<Predicate>,
    joins: Vec<JoinClause>,
}

impl<'a, E: Entity> SelectCountOperation<'a, E> {
    pub(crate) fn new(orm: &'a Orm<E>) -> Self {
        Self {
            orm,
            wheres: Vec::new(),
            only_wheres: Vec::new(),
            joins: Vec::new(),
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

    /// Join another table, the counted table is aliased `t`.
    pub fn join_clause(mut self, join: JoinClause) -> Self {
        self.joins.push(join);
        self
    }

    pub async fn count(self, example: Option<&E>) -> Result<u64> {
        let meta = &self.orm.meta;
        let predicate = where_predicate(self.only_wheres, self.wheres, || {
            example
                .map(|e| derive_predicates(meta, e, Some("t")))
                .unwrap_or_default()
        });
        self.orm
            .count("OpsForSelectCount.Count", predicate, self.joins)
            .await
    }
}

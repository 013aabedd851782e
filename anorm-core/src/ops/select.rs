use crate::{
    Entity, JoinClause, NullField, OrderBy, Orm, OrmError, Pager, Predicate, Projection,
    RegisteredType, Result, SelectStatement, SqlWriter, derive_predicates, ops::where_predicate,
};

/// Select builder, see [`Orm::select`].
///
/// Columns are projected as `t.column AS field`. With [`SelectOperation::join`]
/// the virtual join fields are read from their related tables, each related
/// table joined once as `rel1`, `rel2`, ...
pub struct SelectOperation<'a, E: Entity> {
    orm: &'a Orm<E>,
    join: bool,
    count_join: bool,
    wheres: Vec<Predicate>,
    only_wheres: Vec<Predicate>,
    order_by: Vec<OrderBy>,
}

impl<'a, E: Entity> SelectOperation<'a, E> {
    pub(crate) fn new(orm: &'a Orm<E>) -> Self {
        Self {
            orm,
            join: false,
            count_join: false,
            wheres: Vec::new(),
            only_wheres: Vec::new(),
            order_by: Vec::new(),
        }
    }

    /// Read the virtual join fields through their related tables.
    pub fn join(mut self) -> Self {
        self.join = true;
        self
    }

    /// Keep the joins in the count query of [`SelectOperation::page`].
    pub fn count_join(mut self) -> Self {
        self.count_join = true;
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

    pub fn order_by(mut self, order_by: OrderBy) -> Self {
        self.order_by.push(order_by);
        self
    }

    fn predicate(&self, example: Option<&E>) -> Predicate {
        let meta = &self.orm.meta;
        where_predicate(self.only_wheres.clone(), self.wheres.clone(), || {
            example
                .map(|e| derive_predicates(meta, e, Some("t")))
                .unwrap_or_default()
        })
    }

    fn statement(&self, example: Option<&E>) -> (SelectStatement<'_>, Vec<JoinClause>) {
        let (projection, joins) = projection(self.orm.sql_writer(), &self.orm.meta, self.join);
        (
            SelectStatement {
                table: &self.orm.meta.table_name,
                alias: "t",
                projection,
                joins: joins.clone(),
                predicate: self.predicate(example),
                order_by: self.order_by.clone(),
            },
            joins,
        )
    }

    /// At most one record, [`OrmError::TooManyResults`] when more match.
    pub async fn one(self, example: Option<&E>) -> Result<Option<E>> {
        let (statement, _) = self.statement(example);
        let query = self.orm.sql_writer().build_select(&statement);
        let mut result = self.orm.fetch_entities("OpsForSelect.One", query).await?;
        if result.len() > 1 {
            return Err(OrmError::TooManyResults {
                count: result.len(),
            }
            .into());
        }
        Ok(result.pop())
    }

    pub async fn list(self, example: Option<&E>) -> Result<Vec<E>> {
        let (statement, _) = self.statement(example);
        let query = self.orm.sql_writer().build_select(&statement);
        self.orm.fetch_entities("OpsForSelect.List", query).await
    }

    /// One page of records and the total number of matching rows.
    ///
    /// The total is counted first with the same predicates. When it is zero
    /// the page query is not sent.
    pub async fn page(
        self,
        example: Option<&E>,
        pager: &dyn Pager,
        offset: u64,
        size: u64,
    ) -> Result<(Vec<E>, u64)> {
        let (statement, joins) = self.statement(example);
        let count_joins = if self.join && self.count_join {
            joins
        } else {
            Vec::new()
        };
        let total = self
            .orm
            .count("OpsForSelect.Page", statement.predicate.clone(), count_joins)
            .await?;
        if total == 0 {
            return Ok((Vec::new(), 0));
        }
        let mut query = self.orm.sql_writer().build_select(&statement);
        let (sql, params) = pager.page(&query.sql, offset, size);
        query.sql = sql;
        query.params.extend(params);
        let result = self.orm.fetch_entities("OpsForSelect.Page", query).await?;
        Ok((result, total))
    }
}

fn null_projection(
    writer: &dyn SqlWriter,
    expression: String,
    alias: &str,
    null: Option<&NullField>,
) -> Projection {
    let Some(null) = null else {
        return Projection::column(expression, alias);
    };
    if null.as_parameter {
        Projection {
            expression: format!("{}({}, ?)", null.function, expression),
            alias: alias.to_string(),
            params: vec![null.default.clone()],
        }
    } else {
        let mut out = format!("{}({}, ", null.function, expression);
        writer.write_value(&mut out, &null.default);
        out.push(')');
        Projection::column(out, alias)
    }
}

/// Projected columns and, in join mode, the virtual columns with their joins.
pub(crate) fn projection(
    writer: &dyn SqlWriter,
    meta: &RegisteredType,
    join: bool,
) -> (Vec<Projection>, Vec<JoinClause>) {
    let null_fields = if join {
        &meta.join_null_fields
    } else {
        &meta.null_fields
    };
    let mut projection = meta
        .fields
        .iter()
        .zip(&meta.columns)
        .filter(|(field, _)| meta.join_ref(field).is_none())
        .map(|(field, column)| {
            null_projection(
                writer,
                format!("t.{column}"),
                field,
                null_fields.get(*field),
            )
        })
        .collect::<Vec<_>>();
    let mut joins = Vec::new();
    if !join {
        return (projection, joins);
    }
    let mut aliases: Vec<(&str, String)> = Vec::new();
    for join in &meta.join_refs {
        let alias = match aliases.iter().find(|(table, _)| *table == join.rel_table) {
            Some((_, alias)) => alias.clone(),
            None => {
                let alias = format!("rel{}", aliases.len() + 1);
                aliases.push((join.rel_table.as_str(), alias.clone()));
                joins.push(JoinClause {
                    join_type: join.join_type,
                    table: join.rel_table.clone(),
                    alias: alias.clone(),
                    left: format!("{}.{}", alias, join.rel_id),
                    right: format!("t.{}", join.self_column),
                });
                alias
            }
        };
        projection.push(null_projection(
            writer,
            format!("{}.{}", alias, join.rel_name),
            &join.field,
            meta.join_null_fields.get(&join.field),
        ));
    }
    (projection, joins)
}

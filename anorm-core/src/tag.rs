use std::fmt::{self, Display};

/// Structured form of a field's `#[orm("...")]` declaration.
///
/// The source text is a sequence of `key{value}` pairs:
/// - `pk{T}`: the column is part of the primary key.
/// - `c{name}`: explicit column name.
/// - `ig{T}` / `ug{T}`: skip the column on insert / update.
/// - `def{...}`: column DDL fragment used by migration.
/// - `join{type,self_column,rel_table,rel_id,rel_name}`: virtual column read from a related table.
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    pub primary_key: bool,
    pub column: String,
    pub insert_ignore: bool,
    pub update_ignore: bool,
    pub definition: String,
    pub join: String,
}

impl Tag {
    /// Parse a tag, unknown keys are ignored. Only the literal `T` sets a flag.
    pub fn parse(tag: &str) -> Tag {
        let mut result = Tag::default();
        for (key, value) in pairs(tag) {
            match key {
                "pk" => result.primary_key = value == "T",
                "c" => result.column = value.to_string(),
                "ig" => result.insert_ignore = value == "T",
                "ug" => result.update_ignore = value == "T",
                "def" => result.definition = value.to_string(),
                "join" => result.join = value.to_string(),
                _ => {}
            }
        }
        result
    }
}

impl Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "pk: {}, column: {}, insert_ignore: {}, update_ignore: {}, definition: {}, join: {}",
            self.primary_key,
            self.column,
            self.insert_ignore,
            self.update_ignore,
            self.definition,
            self.join
        )
    }
}

/// Every `key{value}` occurrence in order. Keys are ASCII alphanumeric, values
/// are non empty and contain no braces.
fn pairs(tag: &str) -> impl Iterator<Item = (&str, &str)> {
    let mut rest = tag;
    std::iter::from_fn(move || {
        loop {
            let open = rest.find('{')?;
            let key_start = rest[..open]
                .char_indices()
                .rev()
                .take_while(|(_, c)| c.is_ascii_alphanumeric())
                .last()
                .map(|(i, _)| i)
                .unwrap_or(open);
            let key = &rest[key_start..open];
            let after = &rest[open + 1..];
            let Some(end) = after.find(['{', '}']) else {
                rest = "";
                return None;
            };
            let value = &after[..end];
            let closed = after[end..].starts_with('}');
            rest = if closed { &after[end + 1..] } else { after };
            if closed && !key.is_empty() && !value.is_empty() {
                return Some((key, value));
            }
        }
    })
}

/// Join flavour of a virtual column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JoinType {
    Inner,
    Left,
    Right,
    Full,
}

impl JoinType {
    pub fn parse(value: &str) -> Option<JoinType> {
        Some(match value.trim().to_ascii_uppercase().as_str() {
            "INNER" => JoinType::Inner,
            "LEFT" => JoinType::Left,
            "RIGHT" => JoinType::Right,
            "FULL" => JoinType::Full,
            _ => return None,
        })
    }
}

impl Display for JoinType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            JoinType::Inner => "INNER JOIN",
            JoinType::Left => "LEFT JOIN",
            JoinType::Right => "RIGHT JOIN",
            JoinType::Full => "FULL JOIN",
        })
    }
}

/// A field whose value comes from `rel_table.rel_name`, matched on
/// `rel_table.rel_id = self_column`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinRef {
    pub field: String,
    pub join_type: JoinType,
    pub self_column: String,
    pub rel_table: String,
    pub rel_id: String,
    pub rel_name: String,
}

impl JoinRef {
    pub fn new(
        field: impl Into<String>,
        join_type: JoinType,
        self_column: impl Into<String>,
        rel_table: impl Into<String>,
        rel_id: impl Into<String>,
        rel_name: impl Into<String>,
    ) -> Self {
        Self {
            field: field.into(),
            join_type,
            self_column: self_column.into(),
            rel_table: rel_table.into(),
            rel_id: rel_id.into(),
            rel_name: rel_name.into(),
        }
    }

    /// Parse `type,self_column,rel_table,rel_id,rel_name`. A malformed
    /// specification is logged and skipped.
    pub fn parse(field: &str, value: &str) -> Option<JoinRef> {
        let parts = value.split(',').map(str::trim).collect::<Vec<_>>();
        let [join_type, self_column, rel_table, rel_id, rel_name] = parts[..] else {
            log::error!(
                "Cannot parse the join of field `{}`: `{}` must look like `left,self_id,rel_table,rel_id,rel_name`",
                field,
                value
            );
            return None;
        };
        let Some(join_type) = JoinType::parse(join_type) else {
            log::error!(
                "Cannot parse the join of field `{}`: unknown join type `{}`",
                field,
                join_type
            );
            return None;
        };
        Some(JoinRef::new(
            field,
            join_type,
            self_column,
            rel_table,
            rel_id,
            rel_name,
        ))
    }
}

use anorm_core::{IndexDef, SqlWriter, separated_by};

/// SQLite dialect: indexes are table constraints and tables carry no comment.
#[derive(Default, Debug, Clone, Copy)]
pub struct SqliteSqlWriter;

impl SqlWriter for SqliteSqlWriter {
    fn write_index(&self, out: &mut String, index: &IndexDef) {
        if !index.unique {
            log::warn!(
                "SQLite cannot declare the non unique index `{}` inside CREATE TABLE, it is skipped",
                index.name
            );
            return;
        }
        out.push_str("CONSTRAINT ");
        self.write_identifier(out, &index.name);
        out.push_str(" UNIQUE (");
        separated_by(
            out,
            &index.columns,
            |out, v| self.write_identifier(out, v),
            ", ",
        );
        out.push(')');
    }

    fn write_table_comment(&self, _out: &mut String, comment: &str) {
        if !comment.is_empty() {
            log::debug!("SQLite has no table comments, `{}` is not written", comment);
        }
    }
}

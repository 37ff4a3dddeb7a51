use crate::{
    ColumnDef, ColumnRef, TableRef, separated_by,
    writer::{Context, Fragment},
};

/// Dialect printer rendering the statements issued by the row operations.
///
/// Values never appear in the text: every value is a placeholder bound on the
/// prepared statement, in the order the columns are listed.
pub trait SqlWriter {
    /// Escape occurrences of `search` char with `replace` while copying into buffer.
    fn write_escaped(
        &self,
        _context: &mut Context,
        out: &mut String,
        value: &str,
        search: char,
        replace: &str,
    ) {
        let mut position = 0;
        for (i, c) in value.char_indices() {
            if c == search {
                out.push_str(&value[position..i]);
                out.push_str(replace);
                position = i + c.len_utf8();
            }
        }
        out.push_str(&value[position..]);
    }

    /// Quote identifiers ("name") doubling inner quotes.
    fn write_identifier_quoted(&self, context: &mut Context, out: &mut String, value: &str) {
        out.push('"');
        self.write_escaped(context, out, value, '"', "\"\"");
        out.push('"');
    }

    fn write_table_ref(&self, context: &mut Context, out: &mut String, value: &TableRef) {
        if !value.schema.is_empty() {
            self.write_identifier_quoted(context, out, &value.schema);
            out.push('.');
        }
        self.write_identifier_quoted(context, out, &value.name);
    }

    /// Render a column reference optionally qualifying with schema/table.
    fn write_column_ref(&self, context: &mut Context, out: &mut String, value: &ColumnRef) {
        if context.qualify_columns && !value.table.is_empty() {
            if !value.schema.is_empty() {
                self.write_identifier_quoted(context, out, value.schema);
                out.push('.');
            }
            self.write_identifier_quoted(context, out, value.table);
            out.push('.');
        }
        self.write_identifier_quoted(context, out, value.name);
    }

    /// Positional parameter marker.
    fn write_placeholder(&self, context: &mut Context, out: &mut String) {
        context.placeholders += 1;
        out.push('?');
    }

    /// Equality on each column joined with AND, nothing for an empty list.
    fn write_condition(&self, context: &mut Context, out: &mut String, columns: &[&ColumnDef]) {
        if columns.is_empty() {
            return;
        }
        out.push_str("\nWHERE ");
        let mut context = context.enter(Fragment::Where);
        separated_by(
            out,
            columns,
            |out, v| {
                self.write_column_ref(&mut context, out, &v.column_ref);
                out.push_str(" = ");
                self.write_placeholder(&mut context, out);
            },
            " AND ",
        );
    }

    fn write_transaction_begin(&self, out: &mut String) {
        out.push_str("BEGIN;");
    }

    fn write_transaction_commit(&self, out: &mut String) {
        out.push_str("COMMIT;");
    }

    fn write_transaction_rollback(&self, out: &mut String) {
        out.push_str("ROLLBACK;");
    }

    /// Emit a single row INSERT with one placeholder per column.
    fn write_insert(&self, out: &mut String, table: &TableRef, columns: &[&ColumnDef]) {
        out.reserve(64 + columns.len() * 24);
        if !out.is_empty() {
            out.push('\n');
        }
        out.push_str("INSERT INTO ");
        let mut context = Context::new(Fragment::Insert);
        self.write_table_ref(&mut context, out, table);
        if columns.is_empty() {
            out.push_str(" DEFAULT VALUES;");
            return;
        }
        out.push_str(" (");
        separated_by(
            out,
            columns,
            |out, v| {
                self.write_identifier_quoted(&mut context, out, v.name());
            },
            ", ",
        );
        out.push_str(") VALUES\n(");
        let mut context = context.enter(Fragment::InsertValues);
        separated_by(
            out,
            columns,
            |out, _| {
                self.write_placeholder(&mut context, out);
            },
            ", ",
        );
        out.push_str(");");
    }

    /// Emit UPDATE setting `set` columns on the rows matching `condition`.
    fn write_update(
        &self,
        out: &mut String,
        table: &TableRef,
        set: &[&ColumnDef],
        condition: &[&ColumnDef],
    ) {
        out.reserve(64 + (set.len() + condition.len()) * 24);
        if !out.is_empty() {
            out.push('\n');
        }
        out.push_str("UPDATE ");
        let mut context = Context::new(Fragment::Update);
        self.write_table_ref(&mut context, out, table);
        out.push_str(" SET\n");
        {
            let mut context = context.enter(Fragment::UpdateSet);
            separated_by(
                out,
                set,
                |out, v| {
                    self.write_column_ref(&mut context, out, &v.column_ref);
                    out.push_str(" = ");
                    self.write_placeholder(&mut context, out);
                },
                ",\n",
            );
        }
        self.write_condition(&mut context, out, condition);
        out.push(';');
    }

    /// Emit DELETE of the rows matching `condition`.
    fn write_delete(&self, out: &mut String, table: &TableRef, condition: &[&ColumnDef]) {
        out.reserve(48 + condition.len() * 24);
        if !out.is_empty() {
            out.push('\n');
        }
        out.push_str("DELETE FROM ");
        let mut context = Context::new(Fragment::Delete);
        self.write_table_ref(&mut context, out, table);
        self.write_condition(&mut context, out, condition);
        out.push(';');
    }

    /// Emit SELECT of `columns` from the rows matching `condition`.
    fn write_select(
        &self,
        out: &mut String,
        table: &TableRef,
        columns: &[ColumnDef],
        condition: &[&ColumnDef],
    ) {
        out.reserve(64 + (columns.len() + condition.len()) * 24);
        if !out.is_empty() {
            out.push('\n');
        }
        out.push_str("SELECT ");
        let mut context = Context::new(Fragment::Select);
        separated_by(
            out,
            columns,
            |out, v| {
                self.write_column_ref(&mut context, out, &v.column_ref);
            },
            ", ",
        );
        out.push_str("\nFROM ");
        self.write_table_ref(&mut context.enter(Fragment::SelectFrom), out, table);
        self.write_condition(&mut context, out, condition);
        out.push(';');
    }
}

/// Fallback generic SQL writer.
#[derive(Default)]
pub struct GenericSqlWriter;

impl GenericSqlWriter {
    pub fn new() -> Self {
        Self {}
    }
}

impl SqlWriter for GenericSqlWriter {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{PrimaryKeyType, Value};
    use indoc::indoc;

    fn column(name: &'static str, primary_key: bool) -> ColumnDef {
        ColumnDef {
            column_ref: ColumnRef {
                name,
                table: "account",
                schema: "",
            },
            field: name,
            value: Value::Int64(None),
            primary_key: if primary_key {
                PrimaryKeyType::PrimaryKey
            } else {
                PrimaryKeyType::None
            },
            ..Default::default()
        }
    }

    #[test]
    fn render_statements() {
        let writer = GenericSqlWriter::new();
        let table = TableRef::new("account", "bank");
        let id = column("id", true);
        let name = column("na\"me", false);

        let mut out = String::new();
        writer.write_insert(&mut out, &table, &[&id, &name]);
        assert_eq!(
            out,
            indoc! {r#"
                INSERT INTO "bank"."account" ("id", "na""me") VALUES
                (?, ?);
            "#}
            .trim()
        );

        let mut out = String::new();
        writer.write_update(&mut out, &table, &[&name], &[&id]);
        assert_eq!(
            out,
            indoc! {r#"
                UPDATE "bank"."account" SET
                "na""me" = ?
                WHERE "id" = ?;
            "#}
            .trim()
        );

        let mut out = String::new();
        writer.write_delete(&mut out, &table, &[]);
        assert_eq!(out, r#"DELETE FROM "bank"."account";"#);

        let mut out = String::new();
        writer.write_select(&mut out, &table, &[id.clone(), name.clone()], &[&id, &name]);
        assert_eq!(
            out,
            indoc! {r#"
                SELECT "id", "na""me"
                FROM "bank"."account"
                WHERE "id" = ? AND "na""me" = ?;
            "#}
            .trim()
        );
    }

    struct NumberedWriter;

    impl SqlWriter for NumberedWriter {
        fn write_placeholder(&self, context: &mut Context, out: &mut String) {
            context.placeholders += 1;
            out.push('$');
            out.push_str(&context.placeholders.to_string());
        }
    }

    #[test]
    fn numbered_placeholders() {
        let table = TableRef::new("account", "");
        let id = column("id", true);
        let name = column("name", false);
        let balance = column("balance", false);

        let mut out = String::new();
        NumberedWriter.write_update(&mut out, &table, &[&name, &balance], &[&id]);
        assert_eq!(
            out,
            indoc! {r#"
                UPDATE "account" SET
                "name" = $1,
                "balance" = $2
                WHERE "id" = $3;
            "#}
            .trim()
        );

        let mut out = String::new();
        NumberedWriter.write_insert(&mut out, &table, &[&id, &name, &balance]);
        assert!(out.ends_with("($1, $2, $3);"));
    }

    #[test]
    fn insert_without_columns() {
        let mut out = String::new();
        GenericSqlWriter::new().write_insert(&mut out, &TableRef::new("counter", ""), &[]);
        assert_eq!(out, r#"INSERT INTO "counter" DEFAULT VALUES;"#);
    }
}

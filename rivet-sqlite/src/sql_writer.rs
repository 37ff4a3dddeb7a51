use rivet_core::SqlWriter;

/// Sqlite dialect, the generic statements with immediate transactions.
pub struct SqliteSqlWriter {}

impl SqlWriter for SqliteSqlWriter {
    // Write lock acquired at BEGIN.
    fn write_transaction_begin(&self, out: &mut String) {
        out.push_str("BEGIN IMMEDIATE;");
    }
}

#[cfg(test)]
mod tests {
    use super::SqliteSqlWriter;
    use rivet_core::{ColumnDef, ColumnRef, PrimaryKeyType, SqlWriter, TableRef, Value};

    #[test]
    fn transaction_statements() {
        let writer = SqliteSqlWriter {};
        let mut out = String::new();
        writer.write_transaction_begin(&mut out);
        assert_eq!(out, "BEGIN IMMEDIATE;");
        out.clear();
        writer.write_transaction_commit(&mut out);
        assert_eq!(out, "COMMIT;");
    }

    #[test]
    fn delete_by_key() {
        let id = ColumnDef {
            column_ref: ColumnRef {
                name: "id",
                table: "item",
                schema: "",
            },
            field: "id",
            value: Value::Int64(None),
            primary_key: PrimaryKeyType::PrimaryKey,
            ..Default::default()
        };
        let mut out = String::new();
        SqliteSqlWriter {}.write_delete(&mut out, &TableRef::new("item", ""), &[&id]);
        assert_eq!(out, "DELETE FROM \"item\"\nWHERE \"id\" = ?;");
    }
}

#[cfg(test)]
mod tests {
    use indoc::indoc;
    use rivet::{Entity, GenericSqlWriter, OperationKind, RowOperation, SqlWriter, TableRef};
    use rivet_sqlite::{SqliteDriver, SqliteSqlWriter};

    const WRITER: GenericSqlWriter = GenericSqlWriter;

    #[derive(Entity, Default)]
    #[rivet(
        name = "my_table",
        schema = "store",
        where_condition(name = "byPair", columns = ("second_column", "third_column"))
    )]
    struct Table {
        #[rivet(primary_key, auto_increment)]
        id: i64,
        #[rivet(name = "special column")]
        _first_column: Option<String>,
        _second_column: f64,
        _third_column: i32,
    }

    #[derive(Entity, Default)]
    #[rivet(primary_key = ("left", "right"))]
    struct Link {
        left: i32,
        right: i32,
    }

    fn render<E: Entity>(kind: OperationKind, condition: &str) -> (String, Vec<&'static str>) {
        let mut operation = RowOperation::<E, SqliteDriver>::new(kind);
        if !condition.is_empty() {
            operation.set_where_condition(condition);
        }
        let (sql, columns) = operation
            .write_sql(&WRITER)
            .expect("Could not render the statement");
        (sql, columns.iter().map(|v| v.name()).collect())
    }

    #[test]
    fn insert() {
        let (sql, columns) = render::<Table>(OperationKind::Insert, "");
        assert_eq!(
            sql,
            indoc! {r#"
                INSERT INTO "store"."my_table" ("special column", "second_column", "third_column") VALUES
                (?, ?, ?);
            "#}
            .trim()
        );
        assert_eq!(columns, ["special column", "second_column", "third_column"]);
    }

    #[test]
    fn update() {
        let (sql, columns) = render::<Table>(OperationKind::Update, "");
        assert_eq!(
            sql,
            indoc! {r#"
                UPDATE "store"."my_table" SET
                "special column" = ?,
                "second_column" = ?,
                "third_column" = ?
                WHERE "id" = ?;
            "#}
            .trim()
        );
        assert_eq!(
            columns,
            ["special column", "second_column", "third_column", "id"]
        );

        let (sql, columns) = render::<Table>(OperationKind::Update, "byPair");
        assert_eq!(
            sql,
            indoc! {r#"
                UPDATE "store"."my_table" SET
                "special column" = ?,
                "second_column" = ?,
                "third_column" = ?
                WHERE "second_column" = ? AND "third_column" = ?;
            "#}
            .trim()
        );
        assert_eq!(columns.len(), 5);

        // Only key columns, they are written back
        let (sql, _) = render::<Link>(OperationKind::Update, "");
        assert_eq!(
            sql,
            indoc! {r#"
                UPDATE "link" SET
                "left" = ?,
                "right" = ?
                WHERE "left" = ? AND "right" = ?;
            "#}
            .trim()
        );
    }

    #[test]
    fn delete() {
        let (sql, columns) = render::<Link>(OperationKind::Delete, "");
        assert_eq!(
            sql,
            indoc! {r#"
                DELETE FROM "link"
                WHERE "left" = ? AND "right" = ?;
            "#}
            .trim()
        );
        assert_eq!(columns, ["left", "right"]);
    }

    #[test]
    fn select() {
        let (sql, columns) = render::<Table>(OperationKind::Select, "");
        assert_eq!(
            sql,
            indoc! {r#"
                SELECT "id", "special column", "second_column", "third_column"
                FROM "store"."my_table"
                WHERE "id" = ?;
            "#}
            .trim()
        );
        assert_eq!(columns, ["id"]);

        let mut operation = RowOperation::<Link, SqliteDriver>::new(OperationKind::Select);
        operation.set_where_condition("");
        let (sql, columns) = operation
            .write_sql(&WRITER)
            .expect("Could not render the statement");
        assert_eq!(
            sql,
            indoc! {r#"
                SELECT "left", "right"
                FROM "link";
            "#}
            .trim()
        );
        assert!(columns.is_empty());
    }

    #[test]
    fn invalid_statements() {
        let operation = RowOperation::<Table, SqliteDriver>::new(OperationKind::Save);
        assert!(operation.write_sql(&WRITER).is_err());

        let mut operation = RowOperation::<Table, SqliteDriver>::new(OperationKind::Delete);
        operation.set_where_condition("byNothing");
        let error = operation
            .write_sql(&WRITER)
            .expect_err("The condition is not declared");
        assert!(format!("{:#}", error).contains("byNothing"));
    }

    #[test]
    fn identifiers() {
        let mut out = String::new();
        let mut context = Default::default();
        WRITER.write_table_ref(
            &mut context,
            &mut out,
            &TableRef::new("odd \"name\"", "my schema"),
        );
        assert_eq!(out, r#""my schema"."odd ""name""""#);
    }

    #[test]
    fn transactions() {
        let writer = SqliteSqlWriter {};
        let mut out = String::new();
        writer.write_transaction_begin(&mut out);
        assert_eq!(out, "BEGIN IMMEDIATE;");
        out.clear();
        WRITER.write_transaction_begin(&mut out);
        assert_eq!(out, "BEGIN;");
        out.clear();
        writer.write_transaction_rollback(&mut out);
        assert_eq!(out, "ROLLBACK;");
    }
}

#[cfg(test)]
mod tests {
    use rivet_core::{
        Connection, Executor, QueryResult, Transaction, Value,
        stream::TryStreamExt,
    };
    use rivet_sqlite::SqliteConnection;
    use rivet_tests::{init_logs, silent_logs};
    use std::{path::Path, sync::Mutex};
    use tokio::fs;

    static MUTEX: Mutex<()> = Mutex::new(());

    async fn count(connection: &mut SqliteConnection, table: &str) -> i64 {
        let rows = connection
            .fetch(format!("SELECT COUNT(*) AS total FROM {};", table))
            .try_collect::<Vec<_>>()
            .await
            .expect("Could not count the rows");
        match rows[0].get_column("total") {
            Some(Value::Int64(Some(v))) => *v,
            v => panic!("Unexpected count {:?}", v),
        }
    }

    #[tokio::test]
    async fn create_database() {
        init_logs();
        const DB_PATH: &'static str = "../target/debug/creation.sqlite";
        let _guard = MUTEX.lock().unwrap();
        if Path::new(DB_PATH).exists() {
            fs::remove_file(DB_PATH)
                .await
                .expect(format!("Failed to remove test database file {}", DB_PATH).as_str());
        }
        assert!(
            !Path::new(DB_PATH).exists(),
            "Database file should not exist before test"
        );
        SqliteConnection::connect(format!("sqlite://{}", DB_PATH).into())
            .await
            .expect("Could not open the database");
        assert!(
            Path::new(DB_PATH).exists(),
            "Database file should be created after connection"
        );
        SqliteConnection::connect(format!("sqlite://{}?mode=ro", DB_PATH).into())
            .await
            .expect("Could not open the database");
        fs::remove_file(DB_PATH)
            .await
            .expect(format!("Failed to remove existing test database file {}", DB_PATH).as_str());
        silent_logs! {
            assert!(
                SqliteConnection::connect(format!("sqlite://{}?mode=ro", DB_PATH).into())
                    .await
                    .is_err(),
                "Should not be able to open in read only unexisting database"
            );
        };
    }

    #[tokio::test]
    async fn wrong_url() {
        silent_logs! {
            assert!(
                SqliteConnection::connect("postgres://some_value".into())
                    .await
                    .is_err()
            );
        };
    }

    #[tokio::test]
    async fn raw_statements() {
        init_logs();
        let mut connection = SqliteConnection::connect("sqlite://:memory:".into())
            .await
            .expect("Could not open the database");
        let results = connection
            .run(
                "CREATE TABLE numbers (value INTEGER NOT NULL);
                INSERT INTO numbers (value) VALUES (1), (2), (3);
                -- comment between statements
                SELECT value FROM numbers ORDER BY value;
                DELETE FROM numbers WHERE value > 1;",
            )
            .try_collect::<Vec<_>>()
            .await
            .expect("Could not run the statements");
        let rows = results
            .iter()
            .filter_map(|v| match v {
                QueryResult::Row(row) => Some(row.values()[0].clone()),
                _ => None,
            })
            .collect::<Vec<_>>();
        assert_eq!(
            rows,
            [
                Value::Int64(Some(1)),
                Value::Int64(Some(2)),
                Value::Int64(Some(3))
            ]
        );
        let affected = results
            .iter()
            .filter_map(|v| match v {
                QueryResult::Affected(v) => Some(v.rows_affected),
                _ => None,
            })
            .collect::<Vec<_>>();
        assert_eq!(affected, [0, 3, 2]);
        assert_eq!(count(&mut connection, "numbers").await, 1);

        // Only single statements can be prepared
        silent_logs! {
            assert!(
                connection
                    .prepare("SELECT 1; SELECT 2;".into())
                    .await
                    .is_err()
            );
            assert!(connection.prepare("   ".into()).await.is_err());
        };
        let mut query = connection
            .prepare("SELECT ? + ? AS total;".into())
            .await
            .expect("Could not prepare the query");
        query
            .bind(40)
            .and_then(|v| v.bind(2))
            .expect("Could not bind the parameters");
        let rows = connection
            .fetch(&mut query)
            .try_collect::<Vec<_>>()
            .await
            .expect("Could not run the query");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get_column("total"), Some(&Value::Int64(Some(42))));

        // Errors stop the remaining statements
        let error = silent_logs! {
            connection
                .execute(
                    "INSERT INTO numbers (value) VALUES (4);
                    INSERT INTO missing (value) VALUES (5);
                    INSERT INTO numbers (value) VALUES (6);",
                )
                .await
                .expect_err("The missing table must fail")
        };
        assert!(format!("{:#}", error).contains("missing"));
        assert_eq!(count(&mut connection, "numbers").await, 2);
    }

    #[tokio::test]
    async fn transaction_dropped() {
        init_logs();
        let mut connection = SqliteConnection::connect("sqlite://:memory:".into())
            .await
            .expect("Could not open the database");
        connection
            .execute("CREATE TABLE events (name TEXT NOT NULL);")
            .await
            .expect("Could not create the table");
        {
            let mut transaction = connection
                .begin()
                .await
                .expect("Could not begin the transaction");
            transaction
                .execute("INSERT INTO events (name) VALUES ('lost');")
                .await
                .expect("Could not insert the event");
            silent_logs! {
                drop(transaction);
            };
        }
        assert_eq!(count(&mut connection, "events").await, 0);

        let mut transaction = connection
            .begin()
            .await
            .expect("Could not begin the transaction");
        transaction
            .execute("INSERT INTO events (name) VALUES ('kept');")
            .await
            .expect("Could not insert the event");
        transaction
            .commit()
            .await
            .expect("Could not commit the transaction");
        assert_eq!(count(&mut connection, "events").await, 1);
    }
}

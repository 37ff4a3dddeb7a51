#[cfg(test)]
mod tests {
    use rivet_core::Driver;
    use rivet_sqlite::{SqliteConnection, SqliteDriver};
    use rivet_tests::{execute_tests, init_logs};
    use std::{path::Path, sync::Mutex};
    use tokio::fs;

    const DB_FILE: &str = "../target/debug/tests.sqlite";

    static FILE_LOCK: Mutex<()> = Mutex::new(());

    async fn open(url: String) -> SqliteConnection {
        SqliteDriver::new()
            .connect(url.clone().into())
            .await
            .unwrap_or_else(|e| panic!("Could not open {url}: {e:#}"))
    }

    #[tokio::test]
    async fn sqlite_file() {
        init_logs();
        let _lock = FILE_LOCK.lock().unwrap();
        if fs::try_exists(DB_FILE).await.unwrap_or(false) {
            fs::remove_file(DB_FILE)
                .await
                .unwrap_or_else(|e| panic!("Could not remove the old {DB_FILE}: {e}"));
        }
        let connection = open(format!("sqlite://{DB_FILE}?mode=rwc")).await;
        assert!(Path::new(DB_FILE).is_file(), "mode=rwc creates the file");
        execute_tests(connection).await;
    }

    #[tokio::test]
    async fn sqlite_memory() {
        init_logs();
        execute_tests(open("sqlite://:memory:".into()).await).await;
    }
}

use crate::count;
use rivet::{Connection, Entity, Transaction};
use std::sync::LazyLock;
use tokio::sync::Mutex;

static MUTEX: LazyLock<Mutex<()>> = LazyLock::new(|| Mutex::new(()));

#[derive(Entity, Debug, Default, Clone, PartialEq)]
#[rivet(name = "ledgers")]
pub struct Ledger {
    #[rivet(primary_key, auto_increment)]
    pub id: i64,
    pub title: String,
    #[rivet(cascade(insert, foreign_key = "ledger_id"))]
    pub entries: Vec<LedgerEntry>,
}

#[derive(Entity, Debug, Default, Clone, PartialEq)]
#[rivet(name = "ledger_entries")]
pub struct LedgerEntry {
    #[rivet(primary_key, auto_increment)]
    pub id: i64,
    pub ledger_id: i64,
    pub amount: i64,
}

fn ledger(title: &str) -> Ledger {
    Ledger {
        title: title.into(),
        entries: vec![
            LedgerEntry {
                amount: 10,
                ..Default::default()
            },
            LedgerEntry {
                amount: -4,
                ..Default::default()
            },
        ],
        ..Default::default()
    }
}

pub async fn transaction<C: Connection>(connection: &mut C) {
    let _lock = MUTEX.lock().await;

    // Setup
    connection
        .execute(
            "DROP TABLE IF EXISTS ledger_entries;
            DROP TABLE IF EXISTS ledgers;
            CREATE TABLE ledgers (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL
            );
            CREATE TABLE ledger_entries (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                ledger_id INTEGER NOT NULL REFERENCES ledgers(id),
                amount INTEGER NOT NULL
            );",
        )
        .await
        .expect("Could not create the ledger tables");

    // Rollback discards the row and its cascades
    let mut transaction = connection
        .begin()
        .await
        .expect("Could not begin the transaction");
    let mut discarded = ledger("discarded");
    Ledger::insert_one(&mut transaction, &mut discarded)
        .await
        .expect("Could not insert inside the transaction");
    assert_eq!(count::<LedgerEntry, _>(&mut transaction, "", vec![]).await, 2);
    transaction
        .rollback()
        .await
        .expect("Could not rollback the transaction");
    assert_eq!(count::<Ledger, _>(connection, "", vec![]).await, 0);
    assert_eq!(count::<LedgerEntry, _>(connection, "", vec![]).await, 0);

    // Commit keeps everything
    let mut transaction = connection
        .begin()
        .await
        .expect("Could not begin the transaction");
    let mut kept = ledger("kept");
    Ledger::insert_one(&mut transaction, &mut kept)
        .await
        .expect("Could not insert inside the transaction");
    transaction
        .commit()
        .await
        .expect("Could not commit the transaction");
    assert_eq!(count::<Ledger, _>(connection, "", vec![]).await, 1);
    assert_eq!(count::<LedgerEntry, _>(connection, "", vec![]).await, 2);
    let loaded = Ledger::find_pk(connection, &[kept.id.into()])
        .await
        .expect("Could not find the ledger")
        .expect("The ledger must exist");
    assert_eq!(loaded.title, "kept");
}

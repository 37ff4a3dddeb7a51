use crate::{RecordingExecutor, count};
use rivet::{Entity, Executor, Operation, SaveOperation, UpdateOperation, Value};
use std::sync::LazyLock;
use tokio::sync::Mutex;

static MUTEX: LazyLock<Mutex<()>> = LazyLock::new(|| Mutex::new(()));

#[derive(Entity, Debug, Default, Clone, PartialEq)]
#[rivet(name = "settings")]
pub struct Setting {
    #[rivet(primary_key, name = "setting_key")]
    pub key: String,
    pub value: Option<String>,
}

#[derive(Entity, Debug, Default, Clone, PartialEq)]
#[rivet(name = "notes", where_condition(name = "byTopic", columns = ("topic")))]
pub struct Note {
    #[rivet(primary_key, auto_increment)]
    pub id: i64,
    pub topic: String,
    pub body: String,
}

#[derive(Entity, Debug, Default, Clone, PartialEq)]
#[rivet(name = "stock")]
pub struct Stock {
    #[rivet(primary_key)]
    pub sku: String,
    pub quantity: i64,
}

/// Written by triggers on `stock` only.
#[derive(Entity, Debug, Default, Clone, PartialEq)]
#[rivet(name = "stock_audit")]
pub struct StockAudit {
    #[rivet(primary_key, auto_increment)]
    pub id: i64,
    pub sku: String,
    pub quantity: i64,
}

pub async fn upsert<E: Executor>(executor: &mut E) {
    let _lock = MUTEX.lock().await;

    // Setup
    executor
        .execute(
            "DROP TABLE IF EXISTS settings;
            DROP TABLE IF EXISTS notes;
            DROP TABLE IF EXISTS stock;
            DROP TABLE IF EXISTS stock_audit;
            CREATE TABLE settings (setting_key TEXT PRIMARY KEY, value TEXT);
            CREATE TABLE notes (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                topic TEXT NOT NULL,
                body TEXT NOT NULL
            );
            CREATE TABLE stock (sku TEXT PRIMARY KEY, quantity INTEGER NOT NULL);
            CREATE TABLE stock_audit (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                sku TEXT NOT NULL,
                quantity INTEGER NOT NULL
            );
            CREATE TRIGGER stock_inserted AFTER INSERT ON stock BEGIN
                INSERT INTO stock_audit (sku, quantity) VALUES (NEW.sku, NEW.quantity);
            END;
            CREATE TRIGGER stock_updated AFTER UPDATE ON stock BEGIN
                INSERT INTO stock_audit (sku, quantity) VALUES (NEW.sku, NEW.quantity);
                INSERT INTO stock_audit (sku, quantity) VALUES (OLD.sku, OLD.quantity);
            END;",
        )
        .await
        .expect("Could not create the upsert tables");

    // A new row falls through to the insert
    let mut setting = Setting {
        key: "theme".into(),
        value: Some("dark".into()),
    };
    let mut recorder = RecordingExecutor::new(executor);
    let result = setting
        .save(&mut recorder)
        .await
        .expect("Could not save the new setting");
    assert_eq!(result.rows_affected, 1);
    assert_eq!(recorder.written_tables(), ["settings", "settings"]);
    assert!(recorder.statements[0].starts_with("UPDATE"));
    assert!(recorder.statements[1].starts_with("INSERT"));

    // Saving the same row again only updates it
    recorder.statements.clear();
    let result = setting
        .save(&mut recorder)
        .await
        .expect("Could not save the setting again");
    assert_eq!(result.rows_affected, 1);
    assert_eq!(recorder.statements.len(), 1);
    assert!(recorder.statements[0].starts_with("UPDATE"));
    assert_eq!(count::<Setting, _>(executor, "", vec![]).await, 1);
    let found = Setting::find_pk(executor, &["theme".into()])
        .await
        .expect("Could not find the setting");
    assert_eq!(found, Some(setting.clone()));

    // Column aligned parameters
    let mut save = SaveOperation::<Setting, E::Driver>::new();
    save.execute_parameters(executor, vec!["font".into(), Value::Varchar(None)])
        .await
        .expect("Could not save from parameters");
    save.execute_parameters(executor, vec!["font".into(), "mono".into()])
        .await
        .expect("Could not save from parameters again");
    assert_eq!(save.rows_affected(), 2);
    assert!(
        save.execute_parameters(executor, vec!["font".into()])
            .await
            .is_err()
    );
    save.close();
    save.close();
    let found = Setting::find_pk(executor, &["font".into()])
        .await
        .expect("Could not find the setting")
        .expect("The setting must exist");
    assert_eq!(found.value.as_deref(), Some("mono"));
    assert_eq!(count::<Setting, _>(executor, "", vec![]).await, 2);

    // Batch save reuses the prepared statements
    let mut settings = vec![
        setting.clone(),
        Setting {
            key: "language".into(),
            value: None,
        },
    ];
    let mut save = SaveOperation::<Setting, E::Driver>::new();
    let result = save
        .execute_all(executor, settings.iter_mut())
        .await
        .expect("Could not save the settings");
    assert_eq!(result.rows_affected, 2);
    assert!(save.update().row_operation().is_prepared());
    assert!(save.insert().row_operation().is_prepared());
    save.close();
    assert!(!save.update().row_operation().is_prepared());
    assert_eq!(count::<Setting, _>(executor, "", vec![]).await, 3);

    // An update matching several rows is not a match, the row gets inserted
    let mut notes = vec![
        Note {
            topic: "rust".into(),
            body: "ownership".into(),
            ..Default::default()
        },
        Note {
            topic: "rust".into(),
            body: "borrowing".into(),
            ..Default::default()
        },
    ];
    Note::insert_many(executor, notes.iter_mut())
        .await
        .expect("Could not insert the notes");
    assert_ne!(notes[0].id, notes[1].id);
    let mut note = Note {
        topic: "rust".into(),
        body: "lifetimes".into(),
        ..Default::default()
    };
    let result = SaveOperation::<Note, E::Driver>::new()
        .where_condition("byTopic")
        .execute(executor, &mut note)
        .await
        .expect("Could not save the note");
    assert_eq!(result.rows_affected, 1);
    assert_ne!(note.id, 0);
    assert_eq!(
        count::<Note, _>(executor, "byTopic", vec!["rust".into()]).await,
        3
    );

    // Update by a named condition
    let mut update = UpdateOperation::<Note, E::Driver>::new().where_condition("byTopic");
    let result = update
        .execute(executor, &mut note)
        .await
        .expect("Could not update the notes");
    assert_eq!(result.rows_affected, 3);
    assert_eq!(update.rows_affected(), 3);
    assert_eq!(Operation::rows_affected(&update), 3);
    let bodies = Note::find_many(executor, "byTopic", vec!["rust".into()])
        .await
        .expect("Could not read the notes")
        .into_iter()
        .map(|v| v.body)
        .collect::<Vec<_>>();
    assert_eq!(bodies, ["lifetimes", "lifetimes", "lifetimes"]);

    // Rows written by triggers do not count, the second save stays an update
    let mut stock = Stock {
        sku: "bolt-m8".into(),
        quantity: 10,
    };
    let result = stock
        .save(executor)
        .await
        .expect("Could not save the new stock");
    assert_eq!(result.rows_affected, 1);
    assert!(result.last_affected_id.is_some());
    stock.quantity = 12;
    let mut recorder = RecordingExecutor::new(executor);
    let result = stock
        .save(&mut recorder)
        .await
        .expect("Could not save the stock again");
    assert_eq!(result.rows_affected, 1);
    assert_eq!(result.last_affected_id, None);
    assert_eq!(recorder.statements.len(), 1);
    assert!(recorder.statements[0].starts_with("UPDATE"));
    let result = UpdateOperation::<Stock, E::Driver>::new()
        .execute(executor, &mut stock)
        .await
        .expect("Could not update the stock");
    assert_eq!(result.rows_affected, 1);
    assert_eq!(result.last_affected_id, None);
    assert_eq!(count::<Stock, _>(executor, "", vec![]).await, 1);
    assert_eq!(count::<StockAudit, _>(executor, "", vec![]).await, 5);
}

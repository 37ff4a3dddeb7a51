use crate::count;
use rivet::{Entity, Executor, PrimaryKeyType, Value};
use rust_decimal::Decimal;
use std::sync::LazyLock;
use time::{
    Date, PrimitiveDateTime, Time,
    macros::{date, datetime, time},
};
use tokio::sync::Mutex;
use uuid::Uuid;

static MUTEX: LazyLock<Mutex<()>> = LazyLock::new(|| Mutex::new(()));

#[derive(Entity, Debug, Clone, PartialEq)]
#[rivet(name = "readings")]
pub struct Reading {
    #[rivet(primary_key)]
    pub id: Uuid,
    #[rivet(type = "TEXT")]
    pub amount: Decimal,
    pub day: Date,
    pub at: Time,
    pub taken_at: Option<PrimitiveDateTime>,
    pub active: bool,
    pub payload: Vec<u8>,
    pub ratio: f64,
    pub small: i16,
    #[rivet(name = "note_text")]
    pub note: Option<String>,
}

#[derive(Entity, Debug, Default, Clone, PartialEq)]
#[rivet(name = "reading_tags", primary_key = ("reading_id", "tag"))]
pub struct ReadingTag {
    pub reading_id: Uuid,
    pub tag: String,
    pub weight: u32,
}

pub async fn values<E: Executor>(executor: &mut E) {
    let _lock = MUTEX.lock().await;

    // Setup
    executor
        .execute(
            "DROP TABLE IF EXISTS reading_tags;
            DROP TABLE IF EXISTS readings;
            CREATE TABLE readings (
                id TEXT PRIMARY KEY,
                amount TEXT NOT NULL,
                day TEXT NOT NULL,
                at TEXT NOT NULL,
                taken_at TEXT,
                active INTEGER NOT NULL,
                payload BLOB NOT NULL,
                ratio REAL NOT NULL,
                small INTEGER NOT NULL,
                note_text TEXT
            );
            CREATE TABLE reading_tags (
                reading_id TEXT NOT NULL,
                tag TEXT NOT NULL,
                weight INTEGER NOT NULL,
                PRIMARY KEY (reading_id, tag)
            );",
        )
        .await
        .expect("Could not create the value tables");

    // Column metadata
    let columns = Reading::columns();
    assert_eq!(columns[0].primary_key, PrimaryKeyType::PrimaryKey);
    assert!(!columns[0].nullable);
    assert!(matches!(columns[0].value, Value::Uuid(None)));
    assert_eq!(columns[1].column_type, "TEXT");
    assert!(columns[4].nullable);
    assert!(matches!(columns[4].value, Value::Timestamp(None)));
    assert!(matches!(columns[6].value, Value::Blob(None)));
    assert_eq!(columns[9].name(), "note_text");
    assert_eq!(columns[9].field, "note");
    assert!(
        ReadingTag::columns()
            .iter()
            .filter(|v| v.is_primary_key())
            .all(|v| v.primary_key == PrimaryKeyType::PartOfPrimaryKey)
    );

    // Round trip of every supported type
    let mut reading = Reading {
        id: Uuid::parse_str("5e915574-bb30-4430-98cf-c5854f61fbbd").expect("Valid uuid"),
        amount: Decimal::new(1_250, 2),
        day: date!(2024 - 02 - 29),
        at: time!(23:59:58.250),
        taken_at: Some(datetime!(2024 - 03 - 01 6:30:00.5)),
        active: true,
        payload: vec![0, 1, 2, 254, 255],
        ratio: 0.125,
        small: -12,
        note: None,
    };
    Reading::insert_one(executor, &mut reading)
        .await
        .expect("Could not insert the reading");
    let loaded = Reading::find_pk(executor, &[reading.id.into()])
        .await
        .expect("Could not find the reading")
        .expect("The reading must exist");
    assert_eq!(loaded, reading);

    // Null and back
    reading.taken_at = None;
    reading.note = Some("calibrated".into());
    reading.active = false;
    reading
        .update(executor)
        .await
        .expect("Could not update the reading");
    let loaded = Reading::find_pk(executor, &[reading.id.into()])
        .await
        .expect("Could not find the reading")
        .expect("The reading must exist");
    assert_eq!(loaded.taken_at, None);
    assert_eq!(loaded.note.as_deref(), Some("calibrated"));
    assert!(!loaded.active);

    // Composite primary key
    let mut tags = ["north", "south"]
        .into_iter()
        .enumerate()
        .map(|(i, v)| ReadingTag {
            reading_id: reading.id,
            tag: v.into(),
            weight: i as u32 + 1,
        })
        .collect::<Vec<_>>();
    ReadingTag::insert_many(executor, tags.iter_mut())
        .await
        .expect("Could not insert the tags");
    let found = ReadingTag::find_pk(executor, &[reading.id.into(), "south".into()])
        .await
        .expect("Could not find the tag")
        .expect("The tag must exist");
    assert_eq!(found.weight, 2);
    tags[1].weight = 7;
    let result = tags[1]
        .update(executor)
        .await
        .expect("Could not update the tag");
    assert_eq!(result.rows_affected, 1);
    let result = tags[0]
        .delete(executor)
        .await
        .expect("Could not delete the tag");
    assert_eq!(result.rows_affected, 1);
    let remaining = ReadingTag::find_many(executor, "", vec![])
        .await
        .expect("Could not read the tags");
    assert_eq!(remaining, [tags[1].clone()]);
    assert_eq!(count::<Reading, _>(executor, "", vec![]).await, 1);
}

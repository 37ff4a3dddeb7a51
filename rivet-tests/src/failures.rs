use crate::{count, silent_logs};
use rivet::{
    Entity, ErrorKind, Executor, InsertOperation, OperationError, OperationKind, Value,
};
use std::sync::LazyLock;
use tokio::sync::Mutex;

static MUTEX: LazyLock<Mutex<()>> = LazyLock::new(|| Mutex::new(()));

#[derive(Entity, Debug, Default, Clone, PartialEq)]
#[rivet(name = "batches")]
pub struct Batch {
    #[rivet(primary_key, auto_increment)]
    pub id: i64,
    pub label: String,
    #[rivet(cascade(insert, foreign_key = "batch_id"))]
    pub items: Vec<BatchItem>,
}

#[derive(Entity, Debug, Default, Clone, PartialEq)]
#[rivet(
    name = "batch_items",
    where_condition(name = "byBatch", columns = ("batch_id"))
)]
pub struct BatchItem {
    #[rivet(primary_key, auto_increment)]
    pub id: i64,
    pub batch_id: i64,
    pub label: String,
}

/// Row without a `Default` implementation, loaded only when every column is present.
#[derive(Entity, Debug, Clone, PartialEq)]
#[rivet(name = "batches")]
pub struct BatchLabel {
    #[rivet(primary_key)]
    pub id: i64,
    pub label: String,
}

pub async fn failures<E: Executor>(executor: &mut E) {
    let _lock = MUTEX.lock().await;

    // Setup
    executor
        .execute(
            "DROP TABLE IF EXISTS batch_items;
            DROP TABLE IF EXISTS batches;
            CREATE TABLE batches (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                label TEXT NOT NULL
            );
            CREATE TABLE batch_items (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                batch_id INTEGER NOT NULL REFERENCES batches(id),
                label TEXT NOT NULL CHECK(label <> 'bad')
            );",
        )
        .await
        .expect("Could not create the failure tables");

    // The second child fails, the first stays and the third is never inserted
    let mut batch = Batch {
        label: "nightly".into(),
        items: ["good", "bad", "later"]
            .into_iter()
            .map(|v| BatchItem {
                label: v.into(),
                ..Default::default()
            })
            .collect(),
        ..Default::default()
    };
    let error = silent_logs! {
        batch
            .save(executor)
            .await
            .expect_err("The check constraint must reject the second item")
    };
    let details = error
        .downcast_ref::<OperationError>()
        .expect("The error must carry the operation details");
    assert_eq!(details.table, "batch_items");
    assert_eq!(details.kind, ErrorKind::Execution);
    assert_eq!(details.operation, OperationKind::Insert);
    let message = format!("{:#}", error);
    assert!(
        message.contains("While running the insert cascade on field `items`"),
        "Unexpected message: {}",
        message
    );
    assert_ne!(batch.id, 0);
    assert_ne!(batch.items[0].id, 0);
    assert_eq!(batch.items[2].id, 0);
    assert_eq!(count::<Batch, _>(executor, "", vec![]).await, 1);
    let labels = BatchItem::find_many(executor, "byBatch", vec![batch.id.into()])
        .await
        .expect("Could not read the items")
        .into_iter()
        .map(|v| v.label)
        .collect::<Vec<_>>();
    assert_eq!(labels, ["good"]);

    // Foreign key violation on the parent table
    let mut orphan = BatchItem {
        batch_id: 9_999,
        label: "orphan".into(),
        ..Default::default()
    };
    let error = silent_logs! {
        InsertOperation::<BatchItem, E::Driver>::new()
            .execute(executor, &mut orphan)
            .await
            .expect_err("The foreign key must reject the orphan")
    };
    let details = error
        .downcast_ref::<OperationError>()
        .expect("The error must carry the operation details");
    assert_eq!(details.table, "batch_items");
    assert_eq!(details.kind, ErrorKind::Execution);
    assert_eq!(orphan.id, 0);

    // Statement parameters are bound as given
    let mut parameters = InsertOperation::<BatchItem, E::Driver>::new();
    let error = silent_logs! {
        parameters
            .execute_parameters(executor, vec![Value::Int64(None), batch.id.into()])
            .await
            .expect_err("A null batch must fail")
    };
    assert!(format!("{:#}", error).contains("batch_items"));
    assert!(parameters.row_operation().is_prepared());
    parameters.close();
    assert!(!parameters.row_operation().is_prepared());
    parameters.close();

    // A closed operation prepares again on the next execution
    let result = parameters
        .execute_parameters(executor, vec![batch.id.into(), "reopened".into()])
        .await
        .expect("The operation must run again after a failure");
    assert_eq!(result.rows_affected, 1);
    assert_eq!(parameters.rows_affected(), 1);
    assert!(parameters.row_operation().is_prepared());
    parameters.close();
    assert_eq!(
        count::<BatchItem, _>(executor, "byBatch", vec![batch.id.into()]).await,
        2
    );

    // Conversion failures
    let mut wrong = Value::Varchar(Some("not a number".into()));
    let error = BatchItem::default()
        .set_field("batch_id", wrong.clone())
        .expect_err("A string is not an integer");
    assert!(format!("{:#}", error).contains("BatchItem.batch_id"));
    wrong = Value::Int64(Some(7));
    let mut item = BatchItem::default();
    item.set_field("batch_id", wrong)
        .expect("An integer is an integer");
    assert_eq!(item.batch_id, 7);
    assert!(item.set_field("missing", Value::Int64(Some(1))).is_err());

    // Rows without a default need every column
    let loaded = BatchLabel::find_pk(executor, &[batch.id.into()])
        .await
        .expect("Could not find the batch label")
        .expect("The batch must exist");
    assert_eq!(loaded.label, "nightly");
    let error = BatchLabel::from_row(rivet::RowLabeled::new(
        ["id".to_string()].into(),
        [Value::Int64(Some(1))].into(),
    ))
    .expect_err("The label column is missing");
    assert!(format!("{:#}", error).contains("Column `label` of `BatchLabel` is missing"));
    let partial = BatchItem::from_row(rivet::RowLabeled::new(
        ["label".to_string()].into(),
        [Value::Varchar(Some("partial".into()))].into(),
    ))
    .expect("Rows with a default can be partial");
    assert_eq!(partial.label, "partial");
    assert_eq!(partial.id, 0);
}

use crate::{RecordingExecutor, count};
use rivet::{Entity, Executor, Relationship};
use std::sync::LazyLock;
use tokio::sync::Mutex;

static MUTEX: LazyLock<Mutex<()>> = LazyLock::new(|| Mutex::new(()));

#[derive(Entity, Debug, Default, Clone, PartialEq)]
#[rivet(name = "customers")]
pub struct Customer {
    #[rivet(primary_key)]
    pub code: String,
    pub name: String,
}

#[derive(Entity, Debug, Default, Clone, PartialEq)]
#[rivet(name = "addresses")]
pub struct Address {
    #[rivet(primary_key, auto_increment)]
    pub id: i64,
    pub street: String,
}

#[derive(Entity, Debug, Default, Clone, PartialEq)]
#[rivet(name = "order_lines")]
pub struct OrderLine {
    #[rivet(primary_key, auto_increment)]
    pub id: i64,
    pub order_id: i64,
    pub product: String,
}

#[derive(Entity, Debug, Default, Clone, PartialEq)]
#[rivet(name = "orders")]
pub struct Order {
    #[rivet(primary_key, auto_increment)]
    pub id: i64,
    pub customer_code: String,
    #[rivet(cascade(insert, pre))]
    pub customer: Option<Customer>,
    #[rivet(cascade(insert, pre))]
    pub addresses: Vec<Address>,
    #[rivet(cascade(insert, foreign_key = "order_id"), cascade(delete))]
    pub lines: Vec<OrderLine>,
    #[rivet(ignore)]
    pub note: String,
}

#[derive(Entity, Debug, Default, Clone, PartialEq)]
#[rivet(name = "invoices")]
pub struct Invoice {
    #[rivet(primary_key, auto_increment)]
    pub id: i64,
    pub customer_code: String,
    #[rivet(cascade(select, parameters = ("customer_code")))]
    pub customer: Option<Customer>,
}

pub async fn ordering<E: Executor>(executor: &mut E) {
    let _lock = MUTEX.lock().await;

    // Setup
    executor
        .execute(
            "DROP TABLE IF EXISTS invoices;
            DROP TABLE IF EXISTS order_lines;
            DROP TABLE IF EXISTS orders;
            DROP TABLE IF EXISTS addresses;
            DROP TABLE IF EXISTS customers;
            CREATE TABLE customers (code TEXT PRIMARY KEY, name TEXT NOT NULL);
            CREATE TABLE addresses (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                street TEXT NOT NULL
            );
            CREATE TABLE orders (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                customer_code TEXT NOT NULL REFERENCES customers(code)
            );
            CREATE TABLE order_lines (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                order_id INTEGER NOT NULL REFERENCES orders(id),
                product TEXT NOT NULL
            );
            CREATE TABLE invoices (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                customer_code TEXT NOT NULL
            );",
        )
        .await
        .expect("Could not create the ordering tables");

    // Metadata
    let rules = Order::cascades();
    assert_eq!(
        rules.iter().map(|v| v.field).collect::<Vec<_>>(),
        ["customer", "addresses", "lines", "lines"]
    );
    assert_eq!(rules[0].relationship, Relationship::OneToOne);
    assert_eq!(rules[1].relationship, Relationship::OneToMany);
    assert!(!rules[0].post && !rules[1].post);
    assert!(rules[2].post);
    assert!(!rules[3].post);
    assert_eq!(
        Order::columns().iter().map(|v| v.name()).collect::<Vec<_>>(),
        ["id", "customer_code"]
    );

    // Pre cascades in declaration order, then the order, then the post cascade
    let mut order = Order {
        customer_code: "ACME".into(),
        customer: Some(Customer {
            code: "ACME".into(),
            name: "Acme Corporation".into(),
        }),
        addresses: vec![
            Address {
                street: "1 Main Street".into(),
                ..Default::default()
            },
            Address {
                street: "2 Side Street".into(),
                ..Default::default()
            },
        ],
        lines: vec![
            OrderLine {
                product: "anvil".into(),
                ..Default::default()
            },
            OrderLine {
                product: "rocket".into(),
                ..Default::default()
            },
        ],
        note: "fragile".into(),
        ..Default::default()
    };
    let mut recorder = RecordingExecutor::new(executor);
    let result = Order::insert_one(&mut recorder, &mut order)
        .await
        .expect("Could not insert the order");
    assert_eq!(result.rows_affected, 1);
    assert_eq!(
        recorder.written_tables(),
        [
            "customers",
            "addresses",
            "addresses",
            "orders",
            "order_lines",
            "order_lines"
        ]
    );
    assert_ne!(order.id, 0);
    assert!(order.addresses.iter().all(|v| v.id != 0));
    assert!(order.lines.iter().all(|v| v.order_id == order.id && v.id != 0));
    assert_eq!(order.note, "fragile");

    // Ignored and related fields are not loaded
    let loaded = Order::find_pk(executor, &[order.id.into()])
        .await
        .expect("Could not find the order")
        .expect("The order must exist");
    assert_eq!(loaded.customer_code, "ACME");
    assert!(loaded.customer.is_none());
    assert!(loaded.lines.is_empty());
    assert!(loaded.note.is_empty());

    // One to one select cascade, a missing customer leaves the field empty
    let rule = &Invoice::cascades()[0];
    assert_eq!(rule.relationship, Relationship::OneToOne);
    assert_eq!(rule.source_parameters, ["customer_code"]);
    let mut known = Invoice {
        customer_code: "ACME".into(),
        ..Default::default()
    };
    let mut unknown = Invoice {
        customer_code: "NOBODY".into(),
        ..Default::default()
    };
    Invoice::insert_many(executor, [&mut known, &mut unknown])
        .await
        .expect("Could not insert the invoices");
    let loaded = Invoice::find_pk(executor, &[known.id.into()])
        .await
        .expect("Could not find the invoice")
        .expect("The invoice must exist");
    assert_eq!(
        loaded.customer,
        Some(Customer {
            code: "ACME".into(),
            name: "Acme Corporation".into(),
        })
    );
    let loaded = Invoice::find_pk(executor, &[unknown.id.into()])
        .await
        .expect("Zero matches is not an error")
        .expect("The invoice must exist");
    assert_eq!(loaded.customer_code, "NOBODY");
    assert_eq!(loaded.customer, None);

    // Delete runs the lines first
    let mut recorder = RecordingExecutor::new(executor);
    let result = order
        .delete(&mut recorder)
        .await
        .expect("Could not delete the order");
    assert_eq!(result.rows_affected, 1);
    assert_eq!(
        recorder.written_tables(),
        ["order_lines", "order_lines", "orders"]
    );
    assert_eq!(count::<OrderLine, _>(executor, "", vec![]).await, 0);
    assert_eq!(count::<Customer, _>(executor, "", vec![]).await, 1);
    assert_eq!(count::<Address, _>(executor, "", vec![]).await, 2);
}

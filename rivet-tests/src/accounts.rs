use crate::count;
use rivet::{
    Entity, Executor, OperationError, OperationKind, SaveOperation, SelectOperation,
    stream::TryStreamExt, validate_cascades,
};
use std::{pin::pin, sync::LazyLock};
use tokio::sync::Mutex;

static MUTEX: LazyLock<Mutex<()>> = LazyLock::new(|| Mutex::new(()));

#[derive(Entity, Debug, Default, Clone, PartialEq)]
#[rivet(name = "accounts")]
pub struct Account {
    #[rivet(primary_key, auto_increment)]
    pub id: i64,
    pub name: String,
    #[rivet(cascade(all, foreign_key = "account_id"))]
    pub profiles: Vec<Profile>,
}

#[derive(Entity, Debug, Default, Clone, PartialEq)]
#[rivet(
    name = "profiles",
    where_condition(name = "byAccount", columns = ("account_id"))
)]
pub struct Profile {
    #[rivet(primary_key, auto_increment)]
    pub id: i64,
    pub account_id: i64,
    pub bio: String,
}

pub async fn accounts<E: Executor>(executor: &mut E) {
    let _lock = MUTEX.lock().await;

    // Setup
    executor
        .execute(
            "DROP TABLE IF EXISTS profiles;
            DROP TABLE IF EXISTS accounts;
            CREATE TABLE accounts (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL
            );
            CREATE TABLE profiles (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                account_id INTEGER NOT NULL REFERENCES accounts(id),
                bio TEXT NOT NULL
            );",
        )
        .await
        .expect("Could not create the accounts tables");
    validate_cascades::<Account>().expect("The account cascades must be valid");

    // Save a new account, the insert path assigns the identities
    let mut account = Account {
        id: 0,
        name: "x".into(),
        profiles: vec![Profile {
            bio: "b".into(),
            ..Default::default()
        }],
    };
    let result = account
        .save(executor)
        .await
        .expect("Could not save the new account");
    assert_eq!(result.rows_affected, 1);
    assert_ne!(account.id, 0);
    assert_ne!(account.profiles[0].id, 0);
    assert_eq!(account.profiles[0].account_id, account.id);
    assert_eq!(count::<Account, _>(executor, "", vec![]).await, 1);
    assert_eq!(
        count::<Profile, _>(executor, "byAccount", vec![account.id.into()]).await,
        1
    );

    // Select cascade reloads the profile
    let loaded = Account::find_pk(executor, &[account.id.into()])
        .await
        .expect("Could not find the account")
        .expect("The account must exist");
    assert_eq!(loaded, account);

    // Saving again goes through the update, cascading the profile updates
    account.name = "y".into();
    account.profiles[0].bio = "c".into();
    account.profiles.push(Profile {
        bio: "d".into(),
        ..Default::default()
    });
    let result = SaveOperation::<Account, E::Driver>::new()
        .execute(executor, &mut account)
        .await
        .expect("Could not save the account again");
    assert_eq!(result.rows_affected, 1);
    assert_eq!(count::<Account, _>(executor, "", vec![]).await, 1);
    // The update cascade does not insert the new profile
    assert_eq!(account.profiles[1].id, 0);
    assert_eq!(account.profiles[1].account_id, account.id);
    let loaded = Account::find_pk(executor, &[account.id.into()])
        .await
        .expect("Could not find the account")
        .expect("The account must exist");
    assert_eq!(loaded.name, "y");
    assert_eq!(loaded.profiles.len(), 1);
    assert_eq!(loaded.profiles[0].bio, "c");

    // Several accounts, streamed without cascades
    let mut others = vec![
        Account {
            name: "first".into(),
            profiles: vec![
                Profile {
                    bio: "first 1".into(),
                    ..Default::default()
                },
                Profile {
                    bio: "first 2".into(),
                    ..Default::default()
                },
            ],
            ..Default::default()
        },
        Account {
            name: "second".into(),
            ..Default::default()
        },
    ];
    let result = Account::insert_many(executor, others.iter_mut())
        .await
        .expect("Could not insert the accounts");
    assert_eq!(result.rows_affected, 2);
    assert_eq!(
        count::<Profile, _>(executor, "byAccount", vec![others[0].id.into()]).await,
        2
    );
    let mut select = SelectOperation::<Account, E::Driver>::new().where_condition("");
    let streamed = select
        .select(executor, vec![])
        .try_collect::<Vec<_>>()
        .await
        .expect("Could not stream the accounts");
    assert_eq!(streamed.len(), 3);
    assert!(streamed.iter().all(|v| v.profiles.is_empty()));
    {
        let mut stream = pin!(select.select(executor, vec![]));
        let first = stream
            .try_next()
            .await
            .expect("Could not read the first account");
        assert!(first.is_some());
    }
    select.close();
    select.close();

    // Delete cascades run before the account is removed
    let mut first = Account::find_pk(executor, &[others[0].id.into()])
        .await
        .expect("Could not find the account")
        .expect("The account must exist");
    assert_eq!(first.profiles.len(), 2);
    let result = first
        .delete(executor)
        .await
        .expect("Could not delete the account");
    assert_eq!(result.rows_affected, 1);
    assert_eq!(
        count::<Profile, _>(executor, "byAccount", vec![first.id.into()]).await,
        0
    );
    assert!(
        Account::find_pk(executor, &[first.id.into()])
            .await
            .expect("Could not look for the account")
            .is_none()
    );

    // Zero match delete
    let mut missing = Profile {
        id: 9_999,
        account_id: account.id,
        bio: "missing".into(),
    };
    let result = missing
        .delete(executor)
        .await
        .expect("Deleting a missing row is not an error");
    assert_eq!(result.rows_affected, 0);

    // Unknown where condition
    let error = Profile::find_many(executor, "byNothing", vec![])
        .await
        .expect_err("An unknown where condition must fail");
    let details = error
        .downcast_ref::<OperationError>()
        .expect("The error must carry the operation details");
    assert_eq!(details.table, "profiles");
    assert_eq!(details.operation, OperationKind::Select);
    assert!(format!("{:#}", error).contains("byNothing"));
}

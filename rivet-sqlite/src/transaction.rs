use crate::{SqliteConnection, SqliteDriver};
use rivet_core::{
    AsQuery, Driver, Executor, Query, QueryResult, Result, SqlWriter, Transaction,
    stream::Stream,
};

/// Transaction borrowing its connection.
///
/// Dropping it before `commit` rolls it back.
pub struct SqliteTransaction<'c> {
    connection: &'c mut SqliteConnection,
    open: bool,
}

impl<'c> SqliteTransaction<'c> {
    pub async fn new(connection: &'c mut SqliteConnection) -> Result<Self> {
        let mut sql = String::new();
        connection
            .driver()
            .sql_writer()
            .write_transaction_begin(&mut sql);
        connection.execute(sql).await?;
        log::trace!("Transaction started");
        Ok(Self {
            connection,
            open: true,
        })
    }

    async fn end(mut self, sql: String) -> Result<()> {
        self.connection.execute(sql).await?;
        self.open = false;
        Ok(())
    }
}

impl<'c> Executor for SqliteTransaction<'c> {
    type Driver = SqliteDriver;

    fn driver(&self) -> &SqliteDriver {
        self.connection.driver()
    }

    fn prepare(
        &mut self,
        query: String,
    ) -> impl Future<Output = Result<Query<SqliteDriver>>> + Send {
        self.connection.prepare(query)
    }

    fn run<'s>(
        &'s mut self,
        query: impl AsQuery<SqliteDriver> + 's,
    ) -> impl Stream<Item = Result<QueryResult>> + Send + 's {
        self.connection.run(query)
    }
}

impl<'c> Transaction<'c> for SqliteTransaction<'c> {
    fn commit(self) -> impl Future<Output = Result<()>> + Send {
        let mut sql = String::new();
        self.driver()
            .sql_writer()
            .write_transaction_commit(&mut sql);
        self.end(sql)
    }

    fn rollback(self) -> impl Future<Output = Result<()>> + Send {
        let mut sql = String::new();
        self.driver()
            .sql_writer()
            .write_transaction_rollback(&mut sql);
        self.end(sql)
    }
}

impl<'c> Drop for SqliteTransaction<'c> {
    fn drop(&mut self) {
        if self.open {
            log::warn!("Transaction dropped while still open, rolling back");
            let mut sql = String::new();
            self.connection
                .driver()
                .sql_writer()
                .write_transaction_rollback(&mut sql);
            if let Err(e) = self.connection.execute_blocking(&sql) {
                log::error!("{:#}", e.context("While rolling back the dropped transaction"));
            }
        }
    }
}

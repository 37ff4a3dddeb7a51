use crate::{Connection, Prepared, Result, SqlWriter, Transaction};
use std::{borrow::Cow, future::Future};

/// Backend entry point tying together connection, statement and dialect types.
pub trait Driver: Send + Sync + Sized + 'static {
    type Connection: Connection<Driver = Self>;
    type SqlWriter: SqlWriter;
    type Prepared: Prepared;
    type Transaction<'c>: Transaction<'c, Driver = Self>;

    /// Name of the driver, also the URL scheme it accepts.
    const NAME: &'static str;

    fn sql_writer(&self) -> Self::SqlWriter;

    fn connect(
        &self,
        url: Cow<'static, str>,
    ) -> impl Future<Output = Result<Self::Connection>> + Send {
        Self::Connection::connect(url)
    }
}

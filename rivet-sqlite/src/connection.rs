use crate::{
    Handle, SqliteDriver, SqlitePrepared, SqliteTransaction, connection_error,
    error_message_from_ptr,
    extract::{extract_name, extract_value},
};
use async_stream::stream;
use libsqlite3_sys::{
    SQLITE_DONE, SQLITE_OK, SQLITE_OPEN_CREATE, SQLITE_OPEN_READWRITE, SQLITE_OPEN_URI,
    SQLITE_ROW, sqlite3, sqlite3_busy_timeout, sqlite3_changes64, sqlite3_close, sqlite3_column_count,
    sqlite3_db_handle, sqlite3_errmsg, sqlite3_exec, sqlite3_finalize, sqlite3_last_insert_rowid,
    sqlite3_open_v2, sqlite3_prepare_v2, sqlite3_reset, sqlite3_sql, sqlite3_step, sqlite3_stmt,
    sqlite3_stmt_readonly, sqlite3_total_changes64,
};
use rivet_core::{
    AsQuery, Connection, Context, Driver, Error, Executor, Query, QueryResult, Result,
    RowLabeled, RowNames, RowsAffected, truncate_long,
    stream::{Stream, StreamExt},
};
use std::{
    borrow::Cow,
    ffi::{CStr, CString, c_char, c_int},
    pin::pin,
    ptr,
};
use tokio::task::spawn_blocking;

const BUSY_TIMEOUT_MS: c_int = 5_000;

pub struct SqliteConnection {
    pub(crate) connection: Handle<sqlite3>,
}

fn finalize(statement: *mut sqlite3_stmt) {
    unsafe {
        sqlite3_finalize(statement);
    }
}

/// Prepare the first statement of `sql`.
///
/// Returns `None` when only whitespace or comments are left, otherwise the
/// statement with the number of bytes it consumed.
fn prepare_statement(
    connection: *mut sqlite3,
    sql: &str,
) -> Result<Option<(Handle<sqlite3_stmt>, usize)>> {
    let mut statement = Handle::new(ptr::null_mut(), finalize);
    let mut tail: *const c_char = ptr::null();
    let head = sql.as_ptr() as *const c_char;
    let rc = unsafe {
        sqlite3_prepare_v2(
            connection,
            head,
            sql.len() as c_int,
            &mut *statement,
            &mut tail,
        )
    };
    if rc != SQLITE_OK {
        return Err(connection_error(connection));
    }
    let consumed = if tail.is_null() {
        sql.len()
    } else {
        tail as usize - head as usize
    };
    if statement.is_null() {
        return Ok(None);
    }
    Ok(Some((statement, consumed)))
}

/// Advance the statement by one row, `None` once it is done.
fn step(statement: &Handle<sqlite3_stmt>, labels: &mut Option<RowNames>) -> Result<Option<RowLabeled>> {
    unsafe {
        match sqlite3_step(**statement) {
            SQLITE_ROW => {
                let count = sqlite3_column_count(**statement);
                let labels = match labels.as_ref() {
                    Some(labels) => labels.clone(),
                    None => {
                        let names = (0..count)
                            .map(|i| extract_name(**statement, i))
                            .collect::<Result<RowNames>>()?;
                        *labels = Some(names.clone());
                        names
                    }
                };
                let values = (0..count)
                    .map(|i| extract_value(**statement, i))
                    .collect::<Result<_>>()?;
                Ok(Some(RowLabeled::new(labels, values)))
            }
            SQLITE_DONE => {
                sqlite3_reset(**statement);
                Ok(None)
            }
            _ => {
                let message =
                    error_message_from_ptr(sqlite3_errmsg(sqlite3_db_handle(**statement)));
                sqlite3_reset(**statement);
                Err(Error::msg(message))
            }
        }
    }
}

fn total_changes(connection: &Handle<sqlite3>) -> i64 {
    unsafe { sqlite3_total_changes64(**connection) }
}

/// Run a prepared statement to completion.
///
/// Yields its rows, then the effect of the statement unless it is read only.
fn run_statement<'a>(
    connection: &'a Handle<sqlite3>,
    statement: &'a Handle<sqlite3_stmt>,
) -> impl Stream<Item = Result<QueryResult>> + Send + 'a {
    stream! {
        let before = total_changes(connection);
        let mut labels = None;
        loop {
            match step(statement, &mut labels) {
                Ok(Some(row)) => yield Ok(QueryResult::Row(row)),
                Ok(None) => break,
                Err(error) => {
                    yield Err(error);
                    return;
                }
            }
        }
        if let Some(affected) = affected(connection, statement, before) {
            yield Ok(QueryResult::Affected(affected));
        }
    }
}

/// Effect of a completed statement, `None` for read only ones.
///
/// Rows written by triggers and foreign key actions are not counted. The
/// identity is reported for inserts only.
fn affected(
    connection: &Handle<sqlite3>,
    statement: &Handle<sqlite3_stmt>,
    before: i64,
) -> Option<RowsAffected> {
    if unsafe { sqlite3_stmt_readonly(**statement) } != 0 {
        return None;
    }
    // sqlite3_changes64 keeps the count of the last data statement, ddl leaves it stale
    let rows_affected = if total_changes(connection) == before {
        0
    } else {
        unsafe { sqlite3_changes64(**connection) }.max(0) as u64
    };
    Some(RowsAffected {
        rows_affected,
        last_affected_id: if rows_affected > 0 && inserts_rows(statement) {
            Some(unsafe { sqlite3_last_insert_rowid(**connection) })
        } else {
            None
        },
    })
}

fn inserts_rows(statement: &Handle<sqlite3_stmt>) -> bool {
    let sql = unsafe { sqlite3_sql(**statement) };
    if sql.is_null() {
        return false;
    }
    let sql = unsafe { CStr::from_ptr(sql) }.to_bytes();
    let start = sql
        .iter()
        .position(|v| !v.is_ascii_whitespace())
        .unwrap_or(sql.len());
    let keyword = sql[start..]
        .iter()
        .take_while(|v| v.is_ascii_alphabetic())
        .count();
    let keyword = &sql[start..start + keyword];
    keyword.eq_ignore_ascii_case(b"INSERT") || keyword.eq_ignore_ascii_case(b"REPLACE")
}

impl SqliteConnection {
    pub(crate) fn run_prepared<'s>(
        &'s self,
        prepared: &'s SqlitePrepared,
    ) -> impl Stream<Item = Result<QueryResult>> + Send + 's {
        run_statement(&self.connection, &prepared.statement).map(|v| {
            v.map_err(|e| {
                let error = e.context(format!(
                    "While executing the query:\n{}",
                    truncate_long!(prepared.sql())
                ));
                log::error!("{:#}", error);
                error
            })
        })
    }

    /// Run every statement of `sql` in order.
    pub(crate) fn run_unprepared<'s>(
        &'s self,
        sql: &'s str,
    ) -> impl Stream<Item = Result<QueryResult>> + Send + 's {
        stream! {
            let mut offset = 0;
            while offset < sql.len() {
                let prepared = prepare_statement(*self.connection, &sql[offset..]);
                let (statement, consumed) = match prepared {
                    Ok(Some(v)) => v,
                    Ok(None) => break,
                    Err(e) => {
                        let error = e.context(format!(
                            "While preparing the query:\n{}",
                            truncate_long!(&sql[offset..])
                        ));
                        log::error!("{:#}", error);
                        yield Err(error);
                        break;
                    }
                };
                let text = &sql[offset..offset + consumed];
                offset += consumed;
                let mut stream = pin!(run_statement(&self.connection, &statement));
                while let Some(value) = stream.next().await {
                    let failed = value.is_err();
                    yield value.map_err(|e| {
                        let error = e.context(format!(
                            "While executing the query:\n{}",
                            truncate_long!(text)
                        ));
                        log::error!("{:#}", error);
                        error
                    });
                    if failed {
                        return;
                    }
                }
            }
        }
    }

    /// Run `sql` outside of any stream, for use where awaiting is not possible.
    pub(crate) fn execute_blocking(&self, sql: &str) -> Result<()> {
        let sql = CString::new(sql).context("Could not create a CString from the query")?;
        let rc = unsafe {
            sqlite3_exec(
                *self.connection,
                sql.as_ptr(),
                None,
                ptr::null_mut(),
                ptr::null_mut(),
            )
        };
        if rc != SQLITE_OK {
            return Err(connection_error(*self.connection));
        }
        Ok(())
    }
}

impl Executor for SqliteConnection {
    type Driver = SqliteDriver;

    fn driver(&self) -> &SqliteDriver {
        &SqliteDriver {}
    }

    async fn prepare(&mut self, query: String) -> Result<Query<SqliteDriver>> {
        let connection = Handle::borrowed(*self.connection);
        let context = format!("While preparing the query:\n{}", truncate_long!(query));
        let statement = spawn_blocking(move || {
            let trimmed = query.trim_end();
            match prepare_statement(*connection, trimmed)? {
                Some((statement, consumed)) if trimmed[consumed..].trim().is_empty() => {
                    Ok(statement)
                }
                Some(..) => Err(Error::msg("Cannot prepare more than one statement at a time")),
                None => Err(Error::msg("The query does not contain any statement")),
            }
        })
        .await
        .map_err(Error::new)
        .and_then(|v| v)
        .context(context)
        .inspect_err(|e| log::error!("{:#}", e))?;
        Ok(Query::Prepared(SqlitePrepared::new(statement)))
    }

    fn run<'s>(
        &'s mut self,
        query: impl AsQuery<SqliteDriver> + 's,
    ) -> impl Stream<Item = Result<QueryResult>> + Send + 's {
        let connection: &'s SqliteConnection = self;
        stream! {
            let mut query = query.as_query();
            let mut stream = pin!(match query.as_mut() {
                Query::Raw(sql) => connection.run_unprepared(sql).left_stream(),
                Query::Prepared(prepared) => connection.run_prepared(prepared).right_stream(),
            });
            while let Some(value) = stream.next().await {
                yield value;
            }
        }
    }
}

impl Connection for SqliteConnection {
    /// Open `sqlite://<path>[?<uri parameters>]`, `sqlite://:memory:` for an in memory database.
    ///
    /// The file is created when missing unless the parameters restrict the
    /// mode (for example `?mode=ro`). Foreign keys are enforced.
    async fn connect(url: Cow<'static, str>) -> Result<SqliteConnection> {
        let prefix = format!("{}://", <Self::Driver as Driver>::NAME);
        let Some(location) = url.strip_prefix(&prefix) else {
            let error = Error::msg(format!(
                "Expected sqlite connection url to start with `{}`",
                &prefix
            ));
            log::error!("{:#}", error);
            return Err(error);
        };
        let context = || format!("While opening the connection to `{}`", url);
        let path = CString::new(format!("file:{}", location)).with_context(context)?;
        let mut connection = Handle::new(ptr::null_mut(), |p: *mut sqlite3| unsafe {
            sqlite3_close(p);
        });
        let rc = unsafe {
            sqlite3_open_v2(
                path.as_ptr(),
                &mut *connection,
                SQLITE_OPEN_READWRITE | SQLITE_OPEN_CREATE | SQLITE_OPEN_URI,
                ptr::null(),
            )
        };
        if rc != SQLITE_OK {
            let error = if connection.is_null() {
                Error::msg("Out of memory while opening the database")
            } else {
                connection_error(*connection)
            }
            .context(context());
            log::error!("{:#}", error);
            return Err(error);
        }
        unsafe {
            sqlite3_busy_timeout(*connection, BUSY_TIMEOUT_MS);
        }
        let result = Self { connection };
        result
            .execute_blocking("PRAGMA foreign_keys = ON;")
            .with_context(context)?;
        log::debug!("Connected to `{}`", url);
        Ok(result)
    }

    fn begin(&mut self) -> impl Future<Output = Result<SqliteTransaction<'_>>> + Send {
        SqliteTransaction::new(self)
    }
}

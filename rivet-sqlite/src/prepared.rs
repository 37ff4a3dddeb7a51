use crate::{Handle, connection_error};
use libsqlite3_sys::*;
use rivet_core::{
    DATE_FORMAT, Error, Prepared, Result, TIME_FORMAT, TIMESTAMP_FORMAT, Value, truncate_long,
};
use std::{
    ffi::{CStr, c_int},
    fmt::{self, Display},
    os::raw::{c_char, c_void},
};

/// Prepared sqlite statement, parameters are bound from index 1.
pub struct SqlitePrepared {
    pub(crate) statement: Handle<sqlite3_stmt>,
    pub(crate) index: u64,
}

impl SqlitePrepared {
    pub(crate) fn new(statement: Handle<sqlite3_stmt>) -> Self {
        Self {
            statement,
            index: 1,
        }
    }

    /// Text of the statement.
    pub fn sql(&self) -> String {
        unsafe {
            let sql = sqlite3_sql(*self.statement);
            if sql.is_null() {
                return String::new();
            }
            CStr::from_ptr(sql).to_string_lossy().into_owned()
        }
    }

    fn bind_text(&self, index: c_int, value: &str) -> c_int {
        unsafe {
            sqlite3_bind_text(
                *self.statement,
                index,
                value.as_ptr() as *const c_char,
                value.len() as c_int,
                SQLITE_TRANSIENT(),
            )
        }
    }
}

impl Prepared for SqlitePrepared {
    fn clear_bindings(&mut self) -> Result<&mut Self> {
        unsafe {
            sqlite3_reset(*self.statement);
            sqlite3_clear_bindings(*self.statement);
        }
        self.index = 1;
        Ok(self)
    }

    fn bind(&mut self, value: impl Into<Value>) -> Result<&mut Self> {
        let index = self.index;
        self.bind_index(value, index)
    }

    fn bind_index(&mut self, value: impl Into<Value>, index: u64) -> Result<&mut Self> {
        let value = value.into();
        let position = index as c_int;
        let statement = *self.statement;
        let rc = unsafe {
            match &value {
                v if v.is_null() => sqlite3_bind_null(statement, position),
                Value::Boolean(Some(v)) => sqlite3_bind_int(statement, position, *v as c_int),
                Value::Int8(Some(v)) => sqlite3_bind_int(statement, position, *v as c_int),
                Value::Int16(Some(v)) => sqlite3_bind_int(statement, position, *v as c_int),
                Value::Int32(Some(v)) => sqlite3_bind_int(statement, position, *v),
                Value::Int64(Some(v)) => sqlite3_bind_int64(statement, position, *v),
                Value::UInt8(Some(v)) => sqlite3_bind_int(statement, position, *v as c_int),
                Value::UInt16(Some(v)) => sqlite3_bind_int(statement, position, *v as c_int),
                Value::UInt32(Some(v)) => sqlite3_bind_int64(statement, position, *v as i64),
                Value::UInt64(Some(v)) => {
                    let Ok(v) = i64::try_from(*v) else {
                        return Err(Error::msg(format!(
                            "Cannot bind the u64 value {} into a sqlite integer because it's out of bounds",
                            v
                        )));
                    };
                    sqlite3_bind_int64(statement, position, v)
                }
                Value::Float32(Some(v)) => sqlite3_bind_double(statement, position, *v as f64),
                Value::Float64(Some(v)) => sqlite3_bind_double(statement, position, *v),
                Value::Decimal(Some(v)) => self.bind_text(position, &v.to_string()),
                Value::Varchar(Some(v)) => self.bind_text(position, v),
                Value::Blob(Some(v)) => sqlite3_bind_blob(
                    statement,
                    position,
                    v.as_ptr() as *const c_void,
                    v.len() as c_int,
                    SQLITE_TRANSIENT(),
                ),
                Value::Date(Some(v)) => self.bind_text(position, &v.format(DATE_FORMAT)?),
                Value::Time(Some(v)) => self.bind_text(position, &v.format(TIME_FORMAT)?),
                Value::Timestamp(Some(v)) => {
                    self.bind_text(position, &v.format(TIMESTAMP_FORMAT)?)
                }
                Value::Uuid(Some(v)) => self.bind_text(position, &v.to_string()),
                _ => {
                    let error = Error::msg(format!("Cannot use a {:?} as a query parameter", value));
                    log::error!("{:#}", error);
                    return Err(error);
                }
            }
        };
        if rc != SQLITE_OK {
            let error = connection_error(unsafe { sqlite3_db_handle(statement) }).context(format!(
                "Cannot bind parameter {} to query:\n{}",
                index,
                truncate_long!(self.sql())
            ));
            log::error!("{:#}", error);
            return Err(error);
        }
        self.index = index + 1;
        Ok(self)
    }
}

impl Display for SqlitePrepared {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sql())
    }
}

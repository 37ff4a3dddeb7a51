mod handle;
mod connection;
mod driver;
mod extract;
mod prepared;
mod sql_writer;
mod transaction;

use libsqlite3_sys::{sqlite3, sqlite3_errmsg};
use rivet_core::Error;
use std::ffi::{CStr, c_char};

pub(crate) use handle::*;
pub use connection::*;
pub use driver::*;
pub use prepared::*;
pub use sql_writer::*;
pub use transaction::*;

pub(crate) fn error_message_from_ptr(ptr: *const c_char) -> String {
    if ptr.is_null() {
        return "Unknown error (could not extract the error message)".into();
    }
    unsafe { CStr::from_ptr(ptr) }
        .to_string_lossy()
        .into_owned()
}

/// Last error reported on the connection.
pub(crate) fn connection_error(connection: *mut sqlite3) -> Error {
    Error::msg(error_message_from_ptr(unsafe { sqlite3_errmsg(connection) }))
}

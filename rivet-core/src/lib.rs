mod as_value;
mod cascade;
mod column;
mod connection;
mod decode_type;
mod driver;
mod entity;
mod error;
mod executor;
mod field;
mod operation;
mod prepared;
mod query;
mod table_ref;
mod transaction;
mod util;
mod value;
mod where_condition;
pub mod writer;

pub use ::anyhow::Context;
pub use as_value::*;
pub use cascade::*;
pub use column::*;
pub use connection::*;
pub use decode_type::*;
pub use driver::*;
pub use entity::*;
pub use error::*;
pub use executor::*;
pub use field::*;
pub use operation::*;
pub use prepared::*;
pub use query::*;
pub use table_ref::*;
pub use transaction::*;
pub use util::*;
pub use value::*;
pub use where_condition::*;
pub use writer::{GenericSqlWriter, SqlWriter};
pub mod stream {
    pub use ::futures::stream::*;
}
pub use ::futures::future;

pub type Result<T> = anyhow::Result<T>;
pub type Error = anyhow::Error;

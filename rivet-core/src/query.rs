use crate::{Driver, Error, Prepared, Result, Value, truncate_long};
use std::{
    fmt::{self, Display},
    sync::Arc,
};

/// Statement handed to an [`Executor`](crate::Executor).
///
/// `Raw` text may hold several statements separated by `;` and takes no
/// parameters, `Prepared` is a single driver statement with positional ones.
pub enum Query<D: Driver> {
    Raw(String),
    Prepared(D::Prepared),
}

impl<D: Driver> Query<D> {
    pub fn is_prepared(&self) -> bool {
        matches!(self, Query::Prepared(..))
    }

    fn prepared(&mut self, action: &str) -> Result<&mut D::Prepared> {
        match self {
            Query::Prepared(prepared) => Ok(prepared),
            Query::Raw(sql) => Err(Error::msg(format!(
                "Cannot {} a raw query:\n{}",
                action,
                truncate_long!(sql)
            ))),
        }
    }

    /// Forget the values bound by the previous execution.
    pub fn clear_bindings(&mut self) -> Result<&mut Self> {
        self.prepared("clear the bindings of")?.clear_bindings()?;
        Ok(self)
    }

    /// Bind the next parameter.
    pub fn bind(&mut self, value: impl Into<Value>) -> Result<&mut Self> {
        self.prepared("bind")?.bind(value)?;
        Ok(self)
    }

    /// Clear the bindings, then bind `values` in order.
    pub fn bind_all(&mut self, values: impl IntoIterator<Item = Value>) -> Result<&mut Self> {
        let prepared = self.prepared("bind")?;
        prepared.clear_bindings()?;
        for value in values {
            prepared.bind(value)?;
        }
        Ok(self)
    }
}

impl<D: Driver> Display for Query<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Query::Raw(sql) => f.write_str(&truncate_long!(sql)),
            Query::Prepared(prepared) => prepared.fmt(f),
        }
    }
}

impl<D: Driver> From<String> for Query<D> {
    fn from(value: String) -> Self {
        Query::Raw(value)
    }
}

impl<D: Driver> From<&str> for Query<D> {
    fn from(value: &str) -> Self {
        Query::Raw(value.to_owned())
    }
}

impl<D: Driver> AsMut<Query<D>> for Query<D> {
    fn as_mut(&mut self) -> &mut Query<D> {
        self
    }
}

/// Anything an executor can run: owned or borrowed queries and SQL text.
///
/// Borrowing (`&mut Query`) lets a prepared statement run many times.
pub trait AsQuery<D: Driver>: Send {
    type Output: AsMut<Query<D>> + Send;
    fn as_query(self) -> Self::Output;
}

impl<D: Driver> AsQuery<D> for Query<D> {
    type Output = Query<D>;
    fn as_query(self) -> Query<D> {
        self
    }
}

impl<'q, D: Driver + 'q> AsQuery<D> for &'q mut Query<D> {
    type Output = &'q mut Query<D>;
    fn as_query(self) -> &'q mut Query<D> {
        self
    }
}

impl<D: Driver> AsQuery<D> for String {
    type Output = Query<D>;
    fn as_query(self) -> Query<D> {
        self.into()
    }
}

impl<D: Driver> AsQuery<D> for &str {
    type Output = Query<D>;
    fn as_query(self) -> Query<D> {
        self.into()
    }
}

/// Effect of an insert, update or delete statement.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowsAffected {
    pub rows_affected: u64,
    /// Identity assigned by the store to the last inserted row, when it reports one.
    pub last_affected_id: Option<i64>,
}

impl RowsAffected {
    pub fn new(rows_affected: u64) -> Self {
        Self {
            rows_affected,
            last_affected_id: None,
        }
    }
}

/// Sums the counts, keeps the most recent identity.
impl Extend<RowsAffected> for RowsAffected {
    fn extend<T: IntoIterator<Item = RowsAffected>>(&mut self, iter: T) {
        for value in iter {
            self.rows_affected += value.rows_affected;
            self.last_affected_id = value.last_affected_id.or(self.last_affected_id);
        }
    }
}

/// Column labels of a result set, shared by all of its rows.
pub type RowNames = Arc<[String]>;
pub type Row = Box<[Value]>;

/// Result row, `values[i]` belongs to column `labels[i]`.
#[derive(Debug, Clone)]
pub struct RowLabeled {
    pub labels: RowNames,
    pub values: Row,
}

impl RowLabeled {
    pub fn new(labels: RowNames, values: Row) -> Self {
        Self { labels, values }
    }
    pub fn names(&self) -> &[String] {
        &self.labels
    }
    pub fn values(&self) -> &[Value] {
        &self.values
    }
    pub fn get_column(&self, name: &str) -> Option<&Value> {
        let index = self.labels.iter().position(|v| v == name)?;
        self.values.get(index)
    }
}

/// Item of the stream returned by [`Executor::run`](crate::Executor::run).
#[derive(Debug)]
pub enum QueryResult {
    Row(RowLabeled),
    Affected(RowsAffected),
}

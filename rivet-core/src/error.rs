use crate::OperationKind;
use std::fmt::{self, Display};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A field could not be read or written, or a value could not be converted.
    Binding,
    /// The store rejected the statement.
    Execution,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ErrorKind::Binding => "Binding",
            ErrorKind::Execution => "Execution",
        })
    }
}

/// Typed details attached as context to the errors raised by the operations.
///
/// ```rust,ignore
/// if let Err(error) = profile.save(&mut connection).await {
///     let details = error.downcast_ref::<OperationError>();
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationError {
    pub kind: ErrorKind,
    /// Full name of the table the operation targets.
    pub table: String,
    pub operation: OperationKind,
    /// Primary key of the row being processed, when known.
    pub row: Option<String>,
}

impl OperationError {
    pub fn new(kind: ErrorKind, table: String, operation: OperationKind) -> Self {
        Self {
            kind,
            table,
            operation,
            row: None,
        }
    }
    pub fn with_row(mut self, row: Option<String>) -> Self {
        self.row = row;
        self
    }
}

impl Display for OperationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} error while running {} on `{}`",
            self.kind, self.operation, self.table
        )?;
        if let Some(row) = &self.row {
            write!(f, " for the row with primary key {}", row)?;
        }
        Ok(())
    }
}

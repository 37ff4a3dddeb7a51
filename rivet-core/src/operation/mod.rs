mod modify;
mod row;
mod save;
mod select;

pub use modify::*;
pub use row::{RowOperation, insert_columns, update_columns};
pub use save::*;
pub use select::*;

use crate::OperationKind;

/// Common surface of the operations.
pub trait Operation {
    fn kind(&self) -> OperationKind;
    /// Rows touched (read, for a select) by the executions so far.
    fn rows_affected(&self) -> u64;
    /// Release the prepared statements. Idempotent, the drop does the same.
    fn close(&mut self);
}

use crate::{Result, Value};
use std::fmt::Display;

/// A parameterized, backend-prepared statement handle.
///
/// # Binding Semantics
/// * `bind` appends a value (the driver tracks the next position).
/// * `bind_index` sets the parameter at `index` (from 1) and continues from there.
/// * `clear_bindings` resets the statement so that it can be executed again.
///
/// The statement is released when the handle is dropped.
pub trait Prepared: Send + Sync + Display {
    fn clear_bindings(&mut self) -> Result<&mut Self>;
    /// Append a parameter value.
    fn bind(&mut self, value: impl Into<Value>) -> Result<&mut Self>;
    /// Bind a value at a specific index.
    fn bind_index(&mut self, value: impl Into<Value>, index: u64) -> Result<&mut Self>;
}

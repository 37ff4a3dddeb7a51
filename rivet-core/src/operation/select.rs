use crate::{
    Driver, Entity, Executor, Operation, OperationKind, Result, RowOperation, Value,
    WhereCondition,
    stream::{Stream, TryStreamExt},
};
use std::pin::pin;

/// Reads rows of `E` matching a where condition (the primary key by default).
///
/// [`select`](SelectOperation::select) streams the rows as they come from the
/// store. [`select_all`](SelectOperation::select_all) and
/// [`select_one`](SelectOperation::select_one) also run the select cascades of
/// each row once the read is complete.
pub struct SelectOperation<E: Entity, D: Driver> {
    operation: RowOperation<E, D>,
    cascade: bool,
    rows_read: u64,
}

impl<E: Entity, D: Driver> SelectOperation<E, D> {
    pub fn new() -> Self {
        Self {
            operation: RowOperation::new(OperationKind::Select),
            cascade: true,
            rows_read: 0,
        }
    }

    pub fn where_condition(mut self, condition: impl Into<WhereCondition>) -> Self {
        self.operation.set_where_condition(condition);
        self
    }

    pub fn with_cascades(mut self, cascade: bool) -> Self {
        self.cascade = cascade;
        self
    }

    /// Lazy stream of the matching rows, each one hydrated once. No cascade runs.
    pub fn select<'s, Exec: Executor<Driver = D>>(
        &'s mut self,
        executor: &'s mut Exec,
        parameters: Vec<Value>,
    ) -> impl Stream<Item = Result<E>> + Send + 's {
        self.operation.fetch(executor, parameters)
    }

    async fn run_cascades<Exec: Executor<Driver = D>>(
        &self,
        executor: &mut Exec,
        row: &mut E,
    ) -> Result<()> {
        if !self.cascade {
            return Ok(());
        }
        for rule in E::cascades()
            .iter()
            .filter(|v| v.kind == OperationKind::Select)
        {
            row.cascade(executor, rule).await?;
        }
        Ok(())
    }

    pub async fn select_all<Exec: Executor<Driver = D>>(
        &mut self,
        executor: &mut Exec,
        parameters: Vec<Value>,
    ) -> Result<Vec<E>> {
        let mut rows = self
            .operation
            .fetch(executor, parameters)
            .try_collect::<Vec<_>>()
            .await?;
        self.rows_read += rows.len() as u64;
        for row in rows.iter_mut() {
            self.run_cascades(executor, row).await?;
        }
        Ok(rows)
    }

    /// First matching row, the rest of the result is discarded.
    pub async fn select_one<Exec: Executor<Driver = D>>(
        &mut self,
        executor: &mut Exec,
        parameters: Vec<Value>,
    ) -> Result<Option<E>> {
        let row = {
            let mut stream = pin!(self.operation.fetch(executor, parameters));
            stream.try_next().await?
        };
        let Some(mut row) = row else {
            return Ok(None);
        };
        self.rows_read += 1;
        self.run_cascades(executor, &mut row).await?;
        Ok(Some(row))
    }

    pub fn rows_read(&self) -> u64 {
        self.rows_read
    }

    pub fn close(&mut self) {
        self.operation.close();
    }
}

impl<E: Entity, D: Driver> Default for SelectOperation<E, D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Entity, D: Driver> Operation for SelectOperation<E, D> {
    fn kind(&self) -> OperationKind {
        OperationKind::Select
    }
    fn rows_affected(&self) -> u64 {
        self.rows_read
    }
    fn close(&mut self) {
        self.operation.close();
    }
}

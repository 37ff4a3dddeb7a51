use crate::{
    Context, Driver, Entity, Error, ErrorKind, Executor, InsertOperation, Operation,
    OperationError, OperationKind, Result, RowLabeled, RowsAffected, UpdateOperation, Value,
    WhereCondition,
};

/// Upsert: update the row, insert it when the update did not match exactly one row.
///
/// The update runs scoped by its where condition (the primary key by default).
/// A result of one affected row ends the save, anything else (no match, or an
/// ambiguous condition matching several rows) falls through to the insert.
/// The save adds no cascade of its own, those of the update and of the insert
/// each run once for the statement they belong to.
pub struct SaveOperation<E: Entity, D: Driver> {
    update: UpdateOperation<E, D>,
    insert: InsertOperation<E, D>,
    rows_affected: u64,
}

impl<E: Entity, D: Driver> SaveOperation<E, D> {
    pub fn new() -> Self {
        Self {
            update: UpdateOperation::new(),
            insert: InsertOperation::new(),
            rows_affected: 0,
        }
    }

    /// Condition scoping the update.
    pub fn where_condition(mut self, condition: impl Into<WhereCondition>) -> Self {
        self.update = self.update.where_condition(condition);
        self
    }

    pub fn with_cascades(mut self, cascade: bool) -> Self {
        self.update = self.update.with_cascades(cascade);
        self.insert = self.insert.with_cascades(cascade);
        self
    }

    pub async fn execute<Exec: Executor<Driver = D>>(
        &mut self,
        executor: &mut Exec,
        row: &mut E,
    ) -> Result<RowsAffected> {
        let updated = self.update.execute(executor, row).await?;
        let result = if updated.rows_affected == 1 {
            updated
        } else {
            log::info!(
                "Save on `{}` updated {} rows, inserting the row",
                E::table(),
                updated.rows_affected
            );
            self.insert.execute(executor, row).await?
        };
        self.rows_affected += result.rows_affected;
        Ok(result)
    }

    pub async fn execute_all<'r, Exec, It>(
        &mut self,
        executor: &mut Exec,
        rows: It,
    ) -> Result<RowsAffected>
    where
        Exec: Executor<Driver = D>,
        It: IntoIterator<Item = &'r mut E>,
    {
        let mut result = RowsAffected::default();
        for row in rows {
            result.extend([self.execute(executor, row).await?]);
        }
        Ok(result)
    }

    /// Save the row described by `values`, aligned with [`Entity::columns`].
    pub async fn execute_parameters<Exec: Executor<Driver = D>>(
        &mut self,
        executor: &mut Exec,
        values: Vec<Value>,
    ) -> Result<RowsAffected> {
        let columns = E::columns();
        let binding = || OperationError::new(ErrorKind::Binding, E::table().full_name(), OperationKind::Save);
        if values.len() != columns.len() {
            return Err(Error::msg(format!(
                "Expected {} values, one for each column, found {}",
                columns.len(),
                values.len()
            ))
            .context(binding()));
        }
        let labels = columns.iter().map(|c| c.name().to_string()).collect();
        let mut row = E::from_row(RowLabeled::new(labels, values.into_boxed_slice()))
            .with_context(binding)?;
        self.execute(executor, &mut row).await
    }

    pub fn update(&self) -> &UpdateOperation<E, D> {
        &self.update
    }

    pub fn insert(&self) -> &InsertOperation<E, D> {
        &self.insert
    }

    pub fn rows_affected(&self) -> u64 {
        self.rows_affected
    }

    /// Close both the update and the insert.
    pub fn close(&mut self) {
        self.update.close();
        self.insert.close();
    }
}

impl<E: Entity, D: Driver> Default for SaveOperation<E, D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Entity, D: Driver> Operation for SaveOperation<E, D> {
    fn kind(&self) -> OperationKind {
        OperationKind::Save
    }
    fn rows_affected(&self) -> u64 {
        self.rows_affected
    }
    fn close(&mut self) {
        SaveOperation::close(self);
    }
}

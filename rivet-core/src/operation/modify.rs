use crate::{
    Context, Driver, Entity, ErrorKind, Executor, Operation, OperationKind, Result, RowOperation,
    RowsAffected, Value, WhereCondition, operation::row::describe_key,
};
use std::ops::{Deref, DerefMut};

/// Insert, update or delete of rows of `E`, surrounded by the cascades declared for that kind.
///
/// For each row: the pre cascades run in declaration order, then the statement,
/// then the post cascades. The first failure stops the row and is returned,
/// rows already processed are left as they are.
pub struct ModifyOperation<E: Entity, D: Driver> {
    operation: RowOperation<E, D>,
    cascade: bool,
}

impl<E: Entity, D: Driver> ModifyOperation<E, D> {
    /// `kind` is one of insert, update or delete.
    pub fn new(kind: OperationKind) -> Self {
        Self {
            operation: RowOperation::new(kind),
            cascade: true,
        }
    }

    pub fn where_condition(mut self, condition: impl Into<WhereCondition>) -> Self {
        self.operation.set_where_condition(condition);
        self
    }

    /// Enable or disable the cascades (enabled by default).
    pub fn with_cascades(mut self, cascade: bool) -> Self {
        self.cascade = cascade;
        self
    }

    pub fn row_operation(&self) -> &RowOperation<E, D> {
        &self.operation
    }

    async fn run_cascades<Exec: Executor<Driver = D>>(
        &self,
        executor: &mut Exec,
        row: &mut E,
        post: bool,
    ) -> Result<()> {
        if !self.cascade {
            return Ok(());
        }
        let kind = self.operation.kind();
        for rule in E::cascades()
            .iter()
            .filter(|v| v.kind == kind && v.post == post)
        {
            row.cascade(executor, rule).await?;
        }
        Ok(())
    }

    /// Execute for one row, returns the rows affected in the table of `E` only.
    pub async fn execute<Exec: Executor<Driver = D>>(
        &mut self,
        executor: &mut Exec,
        row: &mut E,
    ) -> Result<RowsAffected> {
        self.run_cascades(executor, row, false).await?;
        let result = self.operation.execute(executor, row).await?;
        if self.operation.kind() == OperationKind::Insert && result.rows_affected == 1 {
            if let (Some(id), Some(column)) = (
                result.last_affected_id,
                E::columns().iter().find(|c| c.auto_increment),
            ) {
                log::trace!("Assigned `{}.{}` = {}", E::table(), column.name(), id);
                row.set_field(column.field, Value::Int64(Some(id)))
                    .with_context(|| {
                        self.operation
                            .error(ErrorKind::Binding)
                            .with_row(describe_key(row))
                    })?;
            }
        }
        self.run_cascades(executor, row, true).await?;
        Ok(result)
    }

    /// Execute for every row in order, stopping at the first failure.
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

    /// Execute the statement alone binding `parameters` in order, no cascade runs.
    pub async fn execute_parameters<Exec: Executor<Driver = D>>(
        &mut self,
        executor: &mut Exec,
        parameters: Vec<Value>,
    ) -> Result<RowsAffected> {
        self.operation.execute_parameters(executor, parameters).await
    }

    pub fn rows_affected(&self) -> u64 {
        self.operation.rows_affected()
    }

    pub fn close(&mut self) {
        self.operation.close();
    }
}

impl<E: Entity, D: Driver> Operation for ModifyOperation<E, D> {
    fn kind(&self) -> OperationKind {
        self.operation.kind()
    }
    fn rows_affected(&self) -> u64 {
        self.operation.rows_affected()
    }
    fn close(&mut self) {
        self.operation.close();
    }
}

macro_rules! modify_operation {
    ($(#[$meta:meta])* $name:ident, $kind:path) => {
        $(#[$meta])*
        pub struct $name<E: Entity, D: Driver>(ModifyOperation<E, D>);

        impl<E: Entity, D: Driver> $name<E, D> {
            pub fn new() -> Self {
                Self(ModifyOperation::new($kind))
            }
            pub fn where_condition(self, condition: impl Into<WhereCondition>) -> Self {
                Self(self.0.where_condition(condition))
            }
            pub fn with_cascades(self, cascade: bool) -> Self {
                Self(self.0.with_cascades(cascade))
            }
        }

        impl<E: Entity, D: Driver> Default for $name<E, D> {
            fn default() -> Self {
                Self::new()
            }
        }

        impl<E: Entity, D: Driver> Deref for $name<E, D> {
            type Target = ModifyOperation<E, D>;
            fn deref(&self) -> &Self::Target {
                &self.0
            }
        }

        impl<E: Entity, D: Driver> DerefMut for $name<E, D> {
            fn deref_mut(&mut self) -> &mut Self::Target {
                &mut self.0
            }
        }

        impl<E: Entity, D: Driver> Operation for $name<E, D> {
            fn kind(&self) -> OperationKind {
                $kind
            }
            fn rows_affected(&self) -> u64 {
                self.0.rows_affected()
            }
            fn close(&mut self) {
                self.0.close();
            }
        }
    };
}

modify_operation!(
    /// Insert rows, writing back the identity assigned by the store before the post cascades.
    InsertOperation,
    OperationKind::Insert
);
modify_operation!(
    /// Update the rows matching the where condition (the primary key by default).
    UpdateOperation,
    OperationKind::Update
);
modify_operation!(
    /// Delete the rows matching the where condition (the primary key by default).
    DeleteOperation,
    OperationKind::Delete
);

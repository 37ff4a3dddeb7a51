use crate::{
    CascadeRule, ColumnDef, DeleteOperation, Error, Executor, InsertOperation, Result, Row,
    RowLabeled, RowsAffected, SaveOperation, SelectOperation, TableRef, UpdateOperation, Value,
    WhereCondition, WhereDef, future::BoxFuture,
};
use std::future::Future;

/// Row type mapped onto a table.
///
/// Usually derived with `#[derive(Entity)]`, it exposes the table binding
/// (table, columns, named where conditions, cascade rules) together with the
/// dynamic field access the operations use to bind and hydrate rows.
pub trait Entity: Send + Sync + Sized + 'static {
    fn table() -> &'static TableRef;
    fn columns() -> &'static [ColumnDef];

    fn primary_key_def() -> impl Iterator<Item = &'static ColumnDef> + Clone + Send {
        Self::columns().iter().filter(|c| c.is_primary_key())
    }

    /// Custom named where conditions, `primaryKey` and the empty name are always available.
    fn where_defs() -> &'static [WhereDef] {
        &[]
    }

    /// Cascade rules in field declaration order.
    fn cascades() -> &'static [CascadeRule] {
        &[]
    }

    fn from_row(row: RowLabeled) -> Result<Self>;

    /// Read the column field called `name` (field or column name).
    fn get_field(&self, name: &str) -> Result<Value>;

    /// Write the column field called `name` (field or column name), converting the value.
    fn set_field(&mut self, name: &str, value: Value) -> Result<()>;

    /// Values of every column, aligned with [`Entity::columns`].
    fn row(&self) -> Result<Row> {
        Self::columns()
            .iter()
            .map(|c| self.get_field(c.field))
            .collect()
    }

    fn primary_key(&self) -> Result<Row> {
        Self::primary_key_def()
            .map(|c| self.get_field(c.field))
            .collect()
    }

    /// Run the cascade `rule` declared on one of the fields of this row.
    fn cascade<'a, Exec: Executor>(
        &'a mut self,
        _executor: &'a mut Exec,
        rule: &'static CascadeRule,
    ) -> BoxFuture<'a, Result<RowsAffected>> {
        let error = Error::msg(format!(
            "`{}` has no cascade on field `{}`",
            Self::table(),
            rule.field
        ));
        Box::pin(async move { Err(error) })
    }

    fn insert_one<Exec: Executor>(
        executor: &mut Exec,
        row: &mut Self,
    ) -> impl Future<Output = Result<RowsAffected>> + Send {
        async move {
            InsertOperation::<Self, Exec::Driver>::new()
                .execute(executor, row)
                .await
        }
    }

    fn insert_many<'a, Exec, It>(
        executor: &mut Exec,
        rows: It,
    ) -> impl Future<Output = Result<RowsAffected>> + Send
    where
        Exec: Executor,
        It: IntoIterator<Item = &'a mut Self> + Send,
        It::IntoIter: Send,
    {
        async move {
            InsertOperation::<Self, Exec::Driver>::new()
                .execute_all(executor, rows)
                .await
        }
    }

    /// Find the row with the given primary key, running its select cascades.
    fn find_pk<Exec: Executor>(
        executor: &mut Exec,
        primary_key: &[Value],
    ) -> impl Future<Output = Result<Option<Self>>> + Send {
        let parameters = primary_key.to_vec();
        async move {
            SelectOperation::<Self, Exec::Driver>::new()
                .select_one(executor, parameters)
                .await
        }
    }

    fn find_many<Exec: Executor>(
        executor: &mut Exec,
        condition: impl Into<WhereCondition>,
        parameters: Vec<Value>,
    ) -> impl Future<Output = Result<Vec<Self>>> + Send {
        let condition = condition.into();
        async move {
            SelectOperation::<Self, Exec::Driver>::new()
                .where_condition(condition)
                .select_all(executor, parameters)
                .await
        }
    }

    /// Update the row, or insert it when the update does not match exactly one row.
    fn save<Exec: Executor>(
        &mut self,
        executor: &mut Exec,
    ) -> impl Future<Output = Result<RowsAffected>> + Send {
        async move {
            SaveOperation::<Self, Exec::Driver>::new()
                .execute(executor, self)
                .await
        }
    }

    fn update<Exec: Executor>(
        &mut self,
        executor: &mut Exec,
    ) -> impl Future<Output = Result<RowsAffected>> + Send {
        async move {
            UpdateOperation::<Self, Exec::Driver>::new()
                .execute(executor, self)
                .await
        }
    }

    fn delete<Exec: Executor>(
        &mut self,
        executor: &mut Exec,
    ) -> impl Future<Output = Result<RowsAffected>> + Send {
        async move {
            DeleteOperation::<Self, Exec::Driver>::new()
                .execute(executor, self)
                .await
        }
    }
}

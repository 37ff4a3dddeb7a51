use crate::{
    ColumnDef, Context, Driver, Entity, Error, ErrorKind, Executor, OperationError,
    OperationKind, Query, Result, RowLabeled, RowsAffected, SqlWriter, Value, WhereCondition,
    future::TryFutureExt,
    stream::{Stream, StreamExt},
    truncate_long,
};
use std::marker::PhantomData;

/// Columns written by an insert: every column the store does not assign.
pub fn insert_columns<E: Entity>() -> Vec<&'static ColumnDef> {
    E::columns().iter().filter(|c| !c.auto_increment).collect()
}

/// Columns written by an update: the non key columns, the key ones when there is nothing else.
pub fn update_columns<E: Entity>() -> Vec<&'static ColumnDef> {
    let result = E::columns()
        .iter()
        .filter(|c| !c.is_primary_key() && !c.auto_increment)
        .collect::<Vec<_>>();
    if result.is_empty() {
        E::primary_key_def().collect()
    } else {
        result
    }
}

pub(crate) fn describe_key<E: Entity>(row: &E) -> Option<String> {
    let key = row.primary_key().ok()?;
    Some(format!(
        "({})",
        key.iter()
            .map(|v| format!("{:?}", v))
            .collect::<Vec<_>>()
            .join(", ")
    ))
}

/// One parameterized statement against the table of `E`.
///
/// The statement is rendered and prepared on the first execution and reused
/// afterwards, `close` (or dropping the operation) releases it.
pub struct RowOperation<E: Entity, D: Driver> {
    kind: OperationKind,
    condition: WhereCondition,
    query: Option<Query<D>>,
    columns: Vec<&'static ColumnDef>,
    rows_affected: u64,
    _entity: PhantomData<fn() -> E>,
}

impl<E: Entity, D: Driver> RowOperation<E, D> {
    pub fn new(kind: OperationKind) -> Self {
        Self {
            kind,
            condition: if kind == OperationKind::Insert {
                WhereCondition::All
            } else {
                WhereCondition::PrimaryKey
            },
            query: None,
            columns: Vec::new(),
            rows_affected: 0,
            _entity: PhantomData,
        }
    }

    pub fn kind(&self) -> OperationKind {
        self.kind
    }

    pub fn condition(&self) -> &WhereCondition {
        &self.condition
    }

    /// Change the rows the statement applies to, the prepared statement is discarded.
    pub fn set_where_condition(&mut self, condition: impl Into<WhereCondition>) {
        self.condition = condition.into();
        self.close();
    }

    /// Sum of the rows touched by every execution so far.
    pub fn rows_affected(&self) -> u64 {
        self.rows_affected
    }

    pub fn is_prepared(&self) -> bool {
        self.query.is_some()
    }

    pub(crate) fn error(&self, kind: ErrorKind) -> OperationError {
        OperationError::new(kind, E::table().full_name(), self.kind)
    }

    /// Render the statement, returns it with the columns whose values are bound, in order.
    pub fn write_sql(&self, writer: &impl SqlWriter) -> Result<(String, Vec<&'static ColumnDef>)> {
        let mut sql = String::new();
        let table = E::table();
        let columns = match self.kind {
            OperationKind::Insert => {
                let columns = insert_columns::<E>();
                writer.write_insert(&mut sql, table, &columns);
                columns
            }
            OperationKind::Update => {
                let mut columns = update_columns::<E>();
                let condition = self.condition.resolve::<E>()?;
                writer.write_update(&mut sql, table, &columns, &condition);
                columns.extend(condition);
                columns
            }
            OperationKind::Delete => {
                let condition = self.condition.resolve::<E>()?;
                writer.write_delete(&mut sql, table, &condition);
                condition
            }
            OperationKind::Select => {
                let condition = self.condition.resolve::<E>()?;
                writer.write_select(&mut sql, table, E::columns(), &condition);
                condition
            }
            OperationKind::Save => {
                return Err(Error::msg(
                    "A save is composed of an update and an insert, it has no statement",
                ));
            }
        };
        Ok((sql, columns))
    }

    async fn prepare_query<Exec: Executor<Driver = D>>(&mut self, executor: &mut Exec) -> Result<()> {
        if self.query.is_some() {
            return Ok(());
        }
        let (sql, columns) = self.write_sql(&executor.driver().sql_writer())?;
        log::debug!(
            "Preparing {} on `{}`:\n{}",
            self.kind,
            E::table(),
            truncate_long!(sql)
        );
        let query = executor.prepare(sql).await?;
        self.query = Some(query);
        self.columns = columns;
        Ok(())
    }

    /// Prepare the statement unless it already is.
    pub async fn prepare<Exec: Executor<Driver = D>>(&mut self, executor: &mut Exec) -> Result<()> {
        let context = self.error(ErrorKind::Execution);
        self.prepare_query(executor).await.context(context)
    }

    fn bind(&mut self, values: Vec<Value>) -> Result<&mut Query<D>> {
        let Some(query) = self.query.as_mut() else {
            return Err(Error::msg("The statement was not prepared"));
        };
        query.bind_all(values)
    }

    async fn run<Exec: Executor<Driver = D>>(
        &mut self,
        executor: &mut Exec,
        values: Vec<Value>,
    ) -> Result<RowsAffected> {
        let query = self.bind(values)?;
        log::debug!("Executing {}", query);
        let result = executor.execute(query).await?;
        self.rows_affected += result.rows_affected;
        Ok(result)
    }

    /// Execute the statement binding the values read from `row`.
    pub async fn execute<Exec: Executor<Driver = D>>(
        &mut self,
        executor: &mut Exec,
        row: &E,
    ) -> Result<RowsAffected> {
        self.prepare(executor).await?;
        let values = self
            .columns
            .iter()
            .map(|c| row.get_field(c.field))
            .collect::<Result<Vec<_>>>()
            .with_context(|| self.error(ErrorKind::Binding).with_row(describe_key(row)))?;
        let context = self.error(ErrorKind::Execution).with_row(describe_key(row));
        self.run(executor, values).await.context(context)
    }

    /// Execute the statement binding `parameters` in order.
    pub async fn execute_parameters<Exec: Executor<Driver = D>>(
        &mut self,
        executor: &mut Exec,
        parameters: Vec<Value>,
    ) -> Result<RowsAffected> {
        self.prepare(executor).await?;
        let context = self.error(ErrorKind::Execution);
        self.run(executor, parameters).await.context(context)
    }

    /// Run the statement binding `parameters` in order and hydrate every returned row.
    pub fn fetch<'s, Exec: Executor<Driver = D>>(
        &'s mut self,
        executor: &'s mut Exec,
        parameters: Vec<Value>,
    ) -> impl Stream<Item = Result<E>> + Send + 's {
        let context = self.error(ErrorKind::Execution);
        let binding = self.error(ErrorKind::Binding);
        async move {
            self.prepare_query(executor).await?;
            let query = self.bind(parameters)?;
            log::debug!("Fetching {}", query);
            Ok::<_, Error>(executor.fetch(query).map(move |row| {
                row.and_then(|row: RowLabeled| E::from_row(row).context(binding.clone()))
            }))
        }
        .try_flatten_stream()
        .map(move |v| {
            v.map_err(|e| {
                if e.downcast_ref::<OperationError>().is_some() {
                    e
                } else {
                    e.context(context.clone())
                }
            })
        })
    }

    /// Release the prepared statement, the operation can still be executed again.
    pub fn close(&mut self) {
        if self.query.take().is_some() {
            log::trace!("Closed {} on `{}`", self.kind, E::table());
        }
        self.columns.clear();
    }
}

use async_stream::stream;
use rivet::{
    AsQuery, Executor, Query, QueryResult, Result,
    stream::{Stream, StreamExt},
};
use std::pin::pin;

/// Executor wrapper keeping the text of every statement it runs, in order.
pub struct RecordingExecutor<'e, E: Executor> {
    executor: &'e mut E,
    pub statements: Vec<String>,
}

impl<'e, E: Executor> RecordingExecutor<'e, E> {
    pub fn new(executor: &'e mut E) -> Self {
        Self {
            executor,
            statements: Vec::new(),
        }
    }

    /// Tables written by the recorded statements, in order.
    pub fn written_tables(&self) -> Vec<String> {
        self.statements
            .iter()
            .filter_map(|v| {
                let rest = v
                    .strip_prefix("INSERT INTO ")
                    .or_else(|| v.strip_prefix("UPDATE "))
                    .or_else(|| v.strip_prefix("DELETE FROM "))?;
                rest.split_whitespace()
                    .next()
                    .map(|v| v.trim_matches('"').to_string())
            })
            .collect()
    }
}

impl<'e, E: Executor> Executor for RecordingExecutor<'e, E> {
    type Driver = E::Driver;

    fn driver(&self) -> &E::Driver {
        self.executor.driver()
    }

    fn prepare(
        &mut self,
        query: String,
    ) -> impl Future<Output = Result<Query<E::Driver>>> + Send {
        self.executor.prepare(query)
    }

    fn run<'s>(
        &'s mut self,
        query: impl AsQuery<E::Driver> + 's,
    ) -> impl Stream<Item = Result<QueryResult>> + Send + 's {
        let statements = &mut self.statements;
        let executor = &mut *self.executor;
        stream! {
            let mut query = query.as_query();
            statements.push(query.as_mut().to_string());
            let mut stream = pin!(executor.run(query.as_mut()));
            while let Some(value) = stream.next().await {
                yield value;
            }
        }
    }
}

mod accounts;
mod failures;
mod ordering;
mod recorder;
mod transaction;
mod upsert;
mod values;

use crate::{
    accounts::accounts, failures::failures, ordering::ordering, upsert::upsert, values::values,
};
use log::LevelFilter;
pub use recorder::RecordingExecutor;
use rivet::{Connection, Entity, Executor, SelectOperation, Value, WhereCondition};
use std::env;
#[cfg(not(feature = "disable-transactions"))]
use transaction::transaction;

pub fn init_logs() {
    let mut logger = env_logger::builder();
    logger
        .is_test(true)
        .format_file(true)
        .format_line_number(true);
    if env::var("RUST_LOG").is_err() {
        logger.filter_level(LevelFilter::Warn);
    }
    let _ = logger.try_init();
}

pub async fn execute_tests<C: Connection>(mut connection: C) {
    accounts(&mut connection).await;
    upsert(&mut connection).await;
    ordering(&mut connection).await;
    failures(&mut connection).await;
    values(&mut connection).await;
    #[cfg(not(feature = "disable-transactions"))]
    transaction(&mut connection).await;
}

/// Rows of `E` matching `condition`, read without cascades.
pub(crate) async fn count<E: Entity, X: Executor>(
    executor: &mut X,
    condition: impl Into<WhereCondition>,
    parameters: Vec<Value>,
) -> usize {
    SelectOperation::<E, X::Driver>::new()
        .where_condition(condition)
        .with_cascades(false)
        .select_all(executor, parameters)
        .await
        .expect("Could not count the rows")
        .len()
}

#[macro_export]
macro_rules! silent_logs {
    ($($code:tt)+) => {{
        let level = log::max_level();
        log::set_max_level(log::LevelFilter::Off);
        let result = { $($code)+ };
        log::set_max_level(level);
        result
    }};
}

use crate::{ColumnDef, Entity, Error, Result};
use std::borrow::Cow;

/// Name of the condition matching the primary key columns.
pub const PRIMARY_KEY: &str = "primaryKey";
/// Name of the condition matching every row.
pub const ALL_ROWS: &str = "";

/// Named where condition declared on a row type, equality on each column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WhereDef {
    pub name: &'static str,
    /// Column (or field) names.
    pub columns: &'static [&'static str],
}

/// Rows a statement applies to.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub enum WhereCondition {
    #[default]
    PrimaryKey,
    All,
    Named(Cow<'static, str>),
    Columns(&'static [&'static str]),
}

impl WhereCondition {
    /// Columns the condition compares, in parameter order.
    pub fn resolve<E: Entity>(&self) -> Result<Vec<&'static ColumnDef>> {
        let columns = match self {
            WhereCondition::PrimaryKey => {
                let result = E::primary_key_def().collect::<Vec<_>>();
                if result.is_empty() {
                    return Err(Error::msg(format!(
                        "Table `{}` has no primary key, the `{}` condition is not available",
                        E::table(),
                        PRIMARY_KEY
                    )));
                }
                return Ok(result);
            }
            WhereCondition::All => return Ok(Vec::new()),
            WhereCondition::Named(name) => {
                let Some(def) = E::where_defs().iter().find(|v| v.name == name.as_ref()) else {
                    return Err(Error::msg(format!(
                        "Table `{}` does not declare a where condition named `{}`",
                        E::table(),
                        name
                    )));
                };
                def.columns
            }
            WhereCondition::Columns(columns) => *columns,
        };
        columns
            .iter()
            .map(|name| {
                E::columns()
                    .iter()
                    .find(|c| c.is_named(name))
                    .ok_or_else(|| {
                        Error::msg(format!(
                            "Table `{}` has no column `{}` used in a where condition",
                            E::table(),
                            name
                        ))
                    })
            })
            .collect()
    }
}

impl From<&str> for WhereCondition {
    fn from(value: &str) -> Self {
        match value {
            PRIMARY_KEY => WhereCondition::PrimaryKey,
            ALL_ROWS => WhereCondition::All,
            _ => WhereCondition::Named(Cow::Owned(value.to_owned())),
        }
    }
}

use crate::{
    Context, Entity, Error, ErrorKind, Executor, FieldAccessor, ModifyOperation, OperationError,
    Related, Result, RowsAffected, SaveOperation, SelectOperation, TableRef, Value,
    WhereCondition,
};
use proc_macro2::TokenStream;
use quote::{ToTokens, TokenStreamExt, quote};
use std::fmt::{self, Display};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relationship {
    OneToOne,
    OneToMany,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    Select,
    Insert,
    Update,
    Delete,
    Save,
}

impl Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OperationKind::Select => "select",
            OperationKind::Insert => "insert",
            OperationKind::Update => "update",
            OperationKind::Delete => "delete",
            OperationKind::Save => "save",
        })
    }
}

impl ToTokens for OperationKind {
    fn to_tokens(&self, tokens: &mut TokenStream) {
        tokens.append_all(match self {
            OperationKind::Select => quote!(::rivet::OperationKind::Select),
            OperationKind::Insert => quote!(::rivet::OperationKind::Insert),
            OperationKind::Update => quote!(::rivet::OperationKind::Update),
            OperationKind::Delete => quote!(::rivet::OperationKind::Delete),
            OperationKind::Save => quote!(::rivet::OperationKind::Save),
        });
    }
}

/// Relationship declared on a field of a source row type.
///
/// `kind` is the operation of the source row that triggers the cascade,
/// `operation` the one executed on the related rows (usually the same, an
/// update cascade may save its rows for example).
#[derive(Debug, Clone)]
pub struct CascadeRule {
    pub field: &'static str,
    pub kind: OperationKind,
    pub operation: OperationKind,
    /// Run after the source row statement instead of before.
    pub post: bool,
    pub relationship: Relationship,
    pub target: &'static TableRef,
    /// Condition name used by the child operation.
    pub where_condition: Option<&'static str>,
    /// Source fields supplying the select parameters, the primary key when empty.
    pub source_parameters: &'static [&'static str],
    /// Fields of the related rows receiving the source primary key.
    pub foreign_key: &'static [&'static str],
}

/// Check the cascade rules declared on `S`.
pub fn validate_cascades<S: Entity>() -> Result<()> {
    validate_rules(S::table(), S::primary_key_def().count(), S::cascades())
}

/// Check a cascade rule list of `table`, whose primary key has `primary_key` columns.
///
/// A field carries at most one rule per triggering kind, save never triggers a
/// cascade and select cascades are the only ones running a select.
pub fn validate_rules(table: &TableRef, primary_key: usize, rules: &[CascadeRule]) -> Result<()> {
    for (i, rule) in rules.iter().enumerate() {
        let fail = |message: String| {
            Err(Error::msg(format!(
                "Invalid {} cascade on field `{}` of `{}`: {}",
                rule.kind, rule.field, table, message
            )))
        };
        if rules[..i]
            .iter()
            .any(|v| v.field == rule.field && v.kind == rule.kind)
        {
            return fail(format!("the field already has a {} cascade", rule.kind));
        }
        if rule.kind == OperationKind::Save {
            return fail("save cannot trigger a cascade, use insert and update".into());
        }
        if (rule.kind == OperationKind::Select) != (rule.operation == OperationKind::Select) {
            return fail(format!(
                "a {} cascade cannot run a {} operation",
                rule.kind, rule.operation
            ));
        }
        if !rule.foreign_key.is_empty() {
            let expected = if rule.source_parameters.is_empty() {
                primary_key
            } else {
                rule.source_parameters.len()
            };
            if rule.foreign_key.len() != expected {
                return fail(format!(
                    "expected {} foreign key fields, found {}",
                    expected,
                    rule.foreign_key.len()
                ));
            }
        }
    }
    Ok(())
}

/// Runs one [`CascadeRule`] for a source row.
///
/// Select cascades load the related rows and store them in the field, the
/// others run the child operation on every row the field holds.
pub struct CascadeOperation<S, F> {
    rule: &'static CascadeRule,
    accessor: FieldAccessor<S, F>,
}

impl<S: Entity, F: Related> CascadeOperation<S, F> {
    pub fn new(rule: &'static CascadeRule, accessor: FieldAccessor<S, F>) -> Self {
        Self { rule, accessor }
    }

    pub fn rule(&self) -> &'static CascadeRule {
        self.rule
    }

    pub async fn execute<Exec: Executor>(
        self,
        executor: &mut Exec,
        source: &mut S,
    ) -> Result<RowsAffected> {
        let rule = self.rule;
        log::debug!(
            "Cascade {} `{}.{}` -> `{}` ({})",
            rule.kind,
            S::table(),
            rule.field,
            rule.target,
            if rule.post { "post" } else { "pre" }
        );
        let result = if F::RELATIONSHIP != rule.relationship {
            Err(Error::msg(format!(
                "Field `{}` holds a {:?} relationship but the cascade declares {:?}",
                self.accessor.name,
                F::RELATIONSHIP,
                rule.relationship
            ))
            .context(self.binding_error()))
        } else if rule.kind == OperationKind::Select {
            self.select(executor, source).await
        } else {
            self.modify(executor, source).await
        };
        result.with_context(|| {
            format!(
                "While running the {} cascade on field `{}` of `{}` targeting `{}`",
                rule.kind,
                rule.field,
                S::table(),
                rule.target
            )
        })
    }

    fn binding_error(&self) -> OperationError {
        OperationError::new(ErrorKind::Binding, S::table().full_name(), self.rule.kind)
    }

    fn source_parameters(&self, source: &S) -> Result<Vec<Value>> {
        if self.rule.source_parameters.is_empty() {
            return Ok(source.primary_key()?.into_vec());
        }
        self.rule
            .source_parameters
            .iter()
            .map(|name| source.get_field(name))
            .collect()
    }

    async fn select<Exec: Executor>(
        &self,
        executor: &mut Exec,
        source: &mut S,
    ) -> Result<RowsAffected> {
        let rule = self.rule;
        let parameters = self
            .source_parameters(source)
            .context(self.binding_error())?;
        let condition = match rule.where_condition {
            Some(name) => WhereCondition::from(name),
            None if !rule.foreign_key.is_empty() => WhereCondition::Columns(rule.foreign_key),
            None => WhereCondition::PrimaryKey,
        };
        let mut operation =
            SelectOperation::<F::Row, Exec::Driver>::new().where_condition(condition);
        let rows = operation.select_all(executor, parameters).await;
        operation.close();
        let rows = rows?;
        let result = RowsAffected::new(rows.len() as u64);
        self.accessor
            .get_mut(source)
            .replace(rows)
            .context(self.binding_error())?;
        Ok(result)
    }

    async fn modify<Exec: Executor>(
        &self,
        executor: &mut Exec,
        source: &mut S,
    ) -> Result<RowsAffected> {
        let rule = self.rule;
        let key = if rule.foreign_key.is_empty() || rule.operation == OperationKind::Delete {
            Vec::new()
        } else {
            self.source_parameters(source)
                .context(self.binding_error())?
        };
        let link = |row: &mut F::Row| -> Result<()> {
            for (field, value) in rule.foreign_key.iter().zip(key.iter()) {
                row.set_field(field, value.clone())
                    .context(self.binding_error())?;
            }
            Ok(())
        };
        let mut result = RowsAffected::default();
        let rows = self.accessor.get_mut(source).rows_mut();
        if rule.operation == OperationKind::Save {
            let mut operation = SaveOperation::<F::Row, Exec::Driver>::new();
            if let Some(name) = rule.where_condition {
                operation = operation.where_condition(name);
            }
            for row in rows {
                link(row)?;
                result.extend([operation.execute(executor, row).await?]);
            }
            operation.close();
        } else {
            let mut operation = ModifyOperation::<F::Row, Exec::Driver>::new(rule.operation);
            if let Some(name) = rule.where_condition {
                operation = operation.where_condition(name);
            }
            for row in rows {
                link(row)?;
                result.extend([operation.execute(executor, row).await?]);
            }
            operation.close();
        }
        Ok(result)
    }
}

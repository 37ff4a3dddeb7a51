use crate::decode_column::{ColumnMetadata, FieldMetadata, RelatedMetadata, decode_column};
use convert_case::{Case, Casing};
use proc_macro2::Span;
use syn::{
    Error, Expr, ExprLit, Ident, ItemStruct, Lit, LitStr, Result, parse::ParseBuffer,
    spanned::Spanned,
};
use rivet_core::{ALL_ROWS, PRIMARY_KEY};

pub(crate) struct WhereMetadata {
    pub(crate) name: String,
    pub(crate) columns: Vec<String>,
    pub(crate) span: Span,
}

pub(crate) struct TableMetadata {
    pub(crate) ident: Ident,
    pub(crate) name: String,
    pub(crate) schema: String,
    pub(crate) fields: Vec<FieldMetadata>,
    pub(crate) where_conditions: Vec<WhereMetadata>,
}

impl TableMetadata {
    pub(crate) fn columns(&self) -> impl Iterator<Item = &ColumnMetadata> + Clone {
        self.fields.iter().filter_map(|v| match v {
            FieldMetadata::Column(v) => Some(v),
            _ => None,
        })
    }

    pub(crate) fn related(&self) -> impl Iterator<Item = &RelatedMetadata> + Clone {
        self.fields.iter().filter_map(|v| match v {
            FieldMetadata::Related(v) => Some(v),
            _ => None,
        })
    }

    fn column(&self, name: &str) -> Option<&ColumnMetadata> {
        self.columns().find(|c| c.is_named(name))
    }
}

/// Names given as `"a"` or `("a", "b", ..)`.
pub(crate) fn decode_names(expr: &Expr) -> Result<Vec<String>> {
    match expr {
        Expr::Lit(ExprLit {
            lit: Lit::Str(v), ..
        }) => Ok(vec![v.value()]),
        Expr::Paren(v) => decode_names(&v.expr),
        Expr::Tuple(v) => v
            .elems
            .iter()
            .map(|v| match v {
                Expr::Lit(ExprLit {
                    lit: Lit::Str(v), ..
                }) => Ok(v.value()),
                _ => Err(Error::new(v.span(), "Expected a string literal name")),
            })
            .collect(),
        _ => Err(Error::new(
            expr.span(),
            "Expected a name (\"a\") or a list of names ((\"a\", \"b\"))",
        )),
    }
}

fn decode_where_condition(arg: &syn::meta::ParseNestedMeta) -> Result<WhereMetadata> {
    let span = arg.path.span();
    let mut name = None;
    let mut columns = Vec::new();
    arg.parse_nested_meta(|inner| {
        if inner.path.is_ident("name") {
            name = Some(inner.value().and_then(ParseBuffer::parse::<LitStr>)?.value());
        } else if inner.path.is_ident("columns") {
            columns = decode_names(&inner.value().and_then(ParseBuffer::parse::<Expr>)?)?;
        } else {
            return Err(inner.error(
                "Use it like: `#[rivet(where_condition(name = \"byEmail\", columns = (\"email\")))]`",
            ));
        }
        Ok(())
    })?;
    let Some(name) = name else {
        return Err(Error::new(span, "A where condition needs a `name`"));
    };
    if columns.is_empty() {
        return Err(Error::new(span, "A where condition needs at least one column"));
    }
    Ok(WhereMetadata {
        name,
        columns,
        span,
    })
}

pub(crate) fn decode_table(item: &ItemStruct) -> Result<TableMetadata> {
    let fields = item
        .fields
        .iter()
        .map(decode_column)
        .collect::<Result<Vec<_>>>()?;
    let mut table = TableMetadata {
        ident: item.ident.clone(),
        name: item.ident.to_string().to_case(Case::Snake),
        schema: String::new(),
        fields,
        where_conditions: Vec::new(),
    };
    if table.name.starts_with('_') {
        table.name.remove(0);
    }
    let mut primary_key = None::<(Vec<String>, Span)>;
    for attr in &item.attrs {
        if !attr.path().is_ident("rivet") {
            continue;
        }
        attr.parse_nested_meta(|arg| {
            if arg.path.is_ident("name") {
                table.name = arg.value().and_then(ParseBuffer::parse::<LitStr>)?.value();
            } else if arg.path.is_ident("schema") {
                table.schema = arg.value().and_then(ParseBuffer::parse::<LitStr>)?.value();
            } else if arg.path.is_ident("primary_key") {
                if primary_key.is_some() {
                    return Err(arg.error("Primary key attribute can appear just once on a table"));
                }
                let value = arg.value().and_then(ParseBuffer::parse::<Expr>)?;
                primary_key = Some((decode_names(&value)?, value.span()));
            } else if arg.path.is_ident("where_condition") {
                table.where_conditions.push(decode_where_condition(&arg)?);
            } else {
                return Err(arg.error("Unknown attribute inside rivet macro, expected one of: name, schema, primary_key, where_condition"));
            }
            Ok(())
        })?;
    }
    if let Some((names, span)) = primary_key {
        if table.columns().any(|c| c.primary_key) {
            return Err(Error::new(
                span,
                "The primary key is declared both on the table and on its fields",
            ));
        }
        for name in names {
            let Some(column) = table.fields.iter_mut().find_map(|v| match v {
                FieldMetadata::Column(c) if c.is_named(&name) => Some(c),
                _ => None,
            }) else {
                return Err(Error::new(span, format!("Column `{}` does not exist in the table", name)));
            };
            column.primary_key = true;
            column.nullable = false;
        }
    }
    validate(&table)?;
    Ok(table)
}

fn validate(table: &TableMetadata) -> Result<()> {
    for (i, condition) in table.where_conditions.iter().enumerate() {
        if condition.name == PRIMARY_KEY || condition.name == ALL_ROWS {
            return Err(Error::new(
                condition.span,
                format!("The where condition name `{}` is reserved", condition.name),
            ));
        }
        if table.where_conditions[..i]
            .iter()
            .any(|v| v.name == condition.name)
        {
            return Err(Error::new(
                condition.span,
                format!("Where condition `{}` is declared twice", condition.name),
            ));
        }
        if let Some(missing) = condition.columns.iter().find(|v| table.column(v).is_none()) {
            return Err(Error::new(
                condition.span,
                format!("Column `{}` does not exist in the table", missing),
            ));
        }
    }
    if table.columns().filter(|c| c.auto_increment).count() > 1 {
        return Err(Error::new(
            table.ident.span(),
            "A table can have at most one auto increment column",
        ));
    }
    let primary_key = table.columns().filter(|c| c.primary_key).count();
    for related in table.related() {
        for (i, cascade) in related.cascades.iter().enumerate() {
            if related.cascades[..i].iter().any(|v| v.kind == cascade.kind) {
                return Err(Error::new(
                    cascade.span,
                    format!(
                        "Field `{}` already has a {} cascade",
                        related.ident, cascade.kind
                    ),
                ));
            }
            if let Some(missing) = cascade.parameters.iter().find(|v| table.column(v).is_none()) {
                return Err(Error::new(
                    cascade.span,
                    format!("Parameter column `{}` does not exist in the table", missing),
                ));
            }
            if let Some(name) = &cascade.where_condition {
                if name.is_empty() {
                    return Err(Error::new(cascade.span, "Empty where condition name"));
                }
            }
            let keys = if cascade.parameters.is_empty() {
                primary_key
            } else {
                cascade.parameters.len()
            };
            if !cascade.foreign_key.is_empty() && cascade.foreign_key.len() != keys {
                return Err(Error::new(
                    cascade.span,
                    format!(
                        "Expected {} foreign key fields, found {}",
                        keys,
                        cascade.foreign_key.len()
                    ),
                ));
            }
        }
    }
    Ok(())
}

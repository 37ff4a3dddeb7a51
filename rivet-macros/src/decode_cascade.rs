use crate::decode_table::decode_names;
use proc_macro2::Span;
use syn::{
    Error, Expr, Ident, LitStr, Result, meta::ParseNestedMeta, parse::ParseBuffer,
    spanned::Spanned,
};
use rivet_core::OperationKind;

#[derive(Clone)]
pub(crate) struct CascadeMetadata {
    pub(crate) kind: OperationKind,
    pub(crate) operation: OperationKind,
    pub(crate) post: bool,
    pub(crate) where_condition: Option<String>,
    pub(crate) parameters: Vec<String>,
    pub(crate) foreign_key: Vec<String>,
    pub(crate) span: Span,
}

const USAGE: &str = "use it like: `#[rivet(cascade(insert, post, foreign_key = \"parent_id\"))]`";

fn operation_kind(ident: &Ident) -> Option<OperationKind> {
    Some(match ident.to_string().as_str() {
        "select" => OperationKind::Select,
        "insert" => OperationKind::Insert,
        "update" => OperationKind::Update,
        "delete" => OperationKind::Delete,
        "save" => OperationKind::Save,
        _ => return None,
    })
}

/// Decode `cascade(kind, ..)`, `all` expands to one cascade per kind.
pub(crate) fn decode_cascade(arg: &ParseNestedMeta) -> Result<Vec<CascadeMetadata>> {
    let span = arg.path.span();
    let mut kinds = Vec::<(OperationKind, Span)>::new();
    let mut all = false;
    let mut operation = None;
    let mut post = None;
    let mut where_condition = None;
    let mut parameters = Vec::new();
    let mut foreign_key = Vec::new();
    arg.parse_nested_meta(|inner| {
        let Some(ident) = inner.path.get_ident() else {
            return Err(inner.error(format!("Unexpected path in cascade, {}", USAGE)));
        };
        match ident.to_string().as_str() {
            "all" => all = true,
            "pre" | "post" => {
                if post.is_some() {
                    return Err(inner.error("Specify either `pre` or `post`, just once"));
                }
                post = Some(ident == "post");
            }
            "operation" => {
                let value = inner.value()?.parse::<Ident>()?;
                let Some(kind) = operation_kind(&value) else {
                    return Err(Error::new(
                        value.span(),
                        "Cascade operation must be one of: select, insert, update, delete, save",
                    ));
                };
                operation = Some(kind);
            }
            "where_condition" => {
                let value = inner.value().and_then(ParseBuffer::parse::<LitStr>)?;
                where_condition = Some(value.value());
            }
            "parameters" => {
                let value = inner.value().and_then(ParseBuffer::parse::<Expr>)?;
                parameters = decode_names(&value)?;
            }
            "foreign_key" => {
                let value = inner.value().and_then(ParseBuffer::parse::<Expr>)?;
                foreign_key = decode_names(&value)?;
            }
            _ => match operation_kind(ident) {
                Some(OperationKind::Save) => {
                    return Err(inner.error(
                        "A save does not trigger cascades, declare insert and update cascades with `operation = save`",
                    ));
                }
                Some(kind) => kinds.push((kind, ident.span())),
                None => {
                    return Err(inner.error(format!("Unknown cascade option `{}`, {}", ident, USAGE)));
                }
            },
        }
        Ok(())
    })?;
    if all {
        if !kinds.is_empty() || operation.is_some() || post.is_some() {
            return Err(Error::new(
                span,
                "`all` cannot be combined with other kinds, `pre`, `post` or `operation`",
            ));
        }
        kinds = [
            OperationKind::Select,
            OperationKind::Insert,
            OperationKind::Update,
            OperationKind::Delete,
        ]
        .into_iter()
        .map(|v| (v, span))
        .collect();
    }
    if kinds.is_empty() {
        return Err(Error::new(span, format!("Cascade kind missing, {}", USAGE)));
    }
    if kinds.len() > 1 && operation.is_some() {
        return Err(Error::new(span, "`operation` requires a single cascade kind"));
    }
    kinds
        .into_iter()
        .map(|(kind, span)| {
            let operation = operation.unwrap_or(kind);
            if (kind == OperationKind::Select) != (operation == OperationKind::Select) {
                return Err(Error::new(
                    span,
                    format!("A {} cascade cannot run a {} operation", kind, operation),
                ));
            }
            Ok(CascadeMetadata {
                kind,
                operation,
                post: post.unwrap_or(!matches!(kind, OperationKind::Delete | OperationKind::Select)),
                where_condition: where_condition.clone(),
                parameters: parameters.clone(),
                foreign_key: foreign_key.clone(),
                span,
            })
        })
        .collect()
}

use crate::decode_cascade::{CascadeMetadata, decode_cascade};
use quote::ToTokens;
use syn::{Error, Field, Ident, LitStr, Result, Type, parse::ParseBuffer, spanned::Spanned};
use rivet_core::{TypeDecoded, Value, decode_type};

pub(crate) struct ColumnMetadata {
    pub(crate) ident: Ident,
    pub(crate) ty: Type,
    pub(crate) name: String,
    pub(crate) column_type: String,
    pub(crate) value: Value,
    pub(crate) nullable: bool,
    pub(crate) primary_key: bool,
    pub(crate) unique: bool,
    pub(crate) auto_increment: bool,
}

impl ColumnMetadata {
    /// Names the column answers to in `get_field` and `set_field`.
    pub(crate) fn names(&self) -> Vec<String> {
        let field = self.ident.to_string();
        if field == self.name {
            vec![field]
        } else {
            vec![field, self.name.clone()]
        }
    }

    pub(crate) fn is_named(&self, name: &str) -> bool {
        self.name == name || self.ident == name
    }
}

/// Field holding related rows, driven by its cascades.
pub(crate) struct RelatedMetadata {
    pub(crate) ident: Ident,
    pub(crate) ty: Type,
    pub(crate) cascades: Vec<CascadeMetadata>,
}

pub(crate) enum FieldMetadata {
    Column(ColumnMetadata),
    Related(RelatedMetadata),
    Ignored(Ident),
}

impl FieldMetadata {
    pub(crate) fn ident(&self) -> &Ident {
        match self {
            FieldMetadata::Column(v) => &v.ident,
            FieldMetadata::Related(v) => &v.ident,
            FieldMetadata::Ignored(v) => v,
        }
    }
}

fn flag(arg: &syn::meta::ParseNestedMeta, name: &str) -> Result<()> {
    if arg.input.peek(syn::Token![=]) || arg.input.peek(syn::token::Paren) {
        return Err(arg.error(format!(
            "`{}` takes no value, use it like: `#[rivet({})]`",
            name, name
        )));
    }
    Ok(())
}

pub(crate) fn decode_column(field: &Field) -> Result<FieldMetadata> {
    let Some(ident) = field.ident.clone() else {
        return Err(Error::new(field.span(), "Entity fields must be named"));
    };
    let mut name = ident.to_string();
    if name.starts_with('_') {
        name.remove(0);
    }
    let mut column_type = String::new();
    let mut primary_key = false;
    let mut unique = false;
    let mut auto_increment = false;
    let mut ignore = false;
    let mut column_attribute = None;
    let mut cascades = Vec::<CascadeMetadata>::new();
    for attr in &field.attrs {
        if !attr.path().is_ident("rivet") {
            continue;
        }
        attr.parse_nested_meta(|arg| {
            let path = arg.path.to_token_stream().to_string();
            if arg.path.is_ident("name") {
                let value = arg.value().and_then(ParseBuffer::parse::<LitStr>).map_err(|e| {
                    Error::new(e.span(), "Error while parsing `name`, use it like: `#[rivet(name = \"my_column\")]`")
                })?;
                name = value.value();
            } else if arg.path.is_ident("type") {
                let value = arg.value().and_then(ParseBuffer::parse::<LitStr>).map_err(|e| {
                    Error::new(e.span(), "Error while parsing `type`, use it like: `#[rivet(type = \"VARCHAR(64)\")]`")
                })?;
                column_type = value.value();
            } else if arg.path.is_ident("primary_key") {
                flag(&arg, "primary_key")?;
                primary_key = true;
            } else if arg.path.is_ident("unique") {
                flag(&arg, "unique")?;
                unique = true;
            } else if arg.path.is_ident("auto_increment") {
                flag(&arg, "auto_increment")?;
                auto_increment = true;
            } else if arg.path.is_ident("ignore") {
                flag(&arg, "ignore")?;
                ignore = true;
                return Ok(());
            } else if arg.path.is_ident("cascade") {
                cascades.extend(decode_cascade(&arg)?);
                return Ok(());
            } else {
                return Err(arg.error(format!("Unknown attribute `{}` inside rivet macro", path)));
            }
            column_attribute.get_or_insert((arg.path.span(), path));
            Ok(())
        })?;
    }
    if ignore || !cascades.is_empty() {
        if let Some((span, attribute)) = column_attribute {
            return Err(Error::new(
                span,
                format!("`{}` applies to columns, this field is not persisted as a column", attribute),
            ));
        }
    }
    if ignore {
        if let Some(cascade) = cascades.first() {
            return Err(Error::new(cascade.span, "An ignored field cannot declare cascades"));
        }
        return Ok(FieldMetadata::Ignored(ident));
    }
    if !cascades.is_empty() {
        return Ok(FieldMetadata::Related(RelatedMetadata {
            ident,
            ty: field.ty.clone(),
            cascades,
        }));
    }
    let TypeDecoded { value, nullable } = decode_type(&field.ty)?;
    Ok(FieldMetadata::Column(ColumnMetadata {
        ident,
        ty: field.ty.clone(),
        name,
        column_type,
        value,
        nullable: nullable && !primary_key,
        primary_key,
        unique,
        auto_increment,
    }))
}

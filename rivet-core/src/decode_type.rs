use crate::{Value, matches_path};
use quote::ToTokens;
use std::mem;
use syn::{GenericArgument, PathArguments, Type, TypePath, TypeSlice, spanned::Spanned};

/// Column type inferred from a Rust field type.
#[derive(Default, Debug, Clone, PartialEq)]
pub struct TypeDecoded {
    pub value: Value,
    pub nullable: bool,
}

fn first_generic(path: &syn::Path) -> syn::Result<&Type> {
    let Some(segment) = path.segments.last() else {
        return Err(syn::Error::new(path.span(), "Path must be non empty"));
    };
    if let PathArguments::AngleBracketed(bracketed) = &segment.arguments {
        if let Some(GenericArgument::Type(ty)) = bracketed.args.first() {
            return Ok(ty);
        }
    }
    Err(syn::Error::new(
        path.span(),
        format!(
            "`{}` must have a type as the first generic argument",
            path.to_token_stream()
        ),
    ))
}

/// Map a field type to the `Value` variant that stores it.
///
/// `Option<T>` makes the column nullable, `Box<T>` is transparent, `Vec<u8>`,
/// `Box<[u8]>` and `[u8]` are blobs.
pub fn decode_type(ty: &Type) -> syn::Result<TypeDecoded> {
    let mut nullable = false;
    let value = 'data_type: {
        match ty {
            Type::Path(TypePath { path, .. }) => {
                if let Some(ident) = path.get_ident() {
                    let value = match ident.to_string().as_str() {
                        "bool" => Some(Value::Boolean(None)),
                        "i8" => Some(Value::Int8(None)),
                        "i16" => Some(Value::Int16(None)),
                        "i32" => Some(Value::Int32(None)),
                        "i64" => Some(Value::Int64(None)),
                        "u8" => Some(Value::UInt8(None)),
                        "u16" => Some(Value::UInt16(None)),
                        "u32" => Some(Value::UInt32(None)),
                        "u64" => Some(Value::UInt64(None)),
                        "isize" if mem::size_of::<isize>() == mem::size_of::<i32>() => {
                            Some(Value::Int32(None))
                        }
                        "isize" => Some(Value::Int64(None)),
                        "usize" if mem::size_of::<usize>() == mem::size_of::<u32>() => {
                            Some(Value::UInt32(None))
                        }
                        "usize" => Some(Value::UInt64(None)),
                        "f32" => Some(Value::Float32(None)),
                        "f64" => Some(Value::Float64(None)),
                        "str" => Some(Value::Varchar(None)),
                        _ => None,
                    };
                    if let Some(value) = value {
                        break 'data_type value;
                    }
                }
                if matches_path(path, &["std", "string", "String"]) {
                    break 'data_type Value::Varchar(None);
                } else if matches_path(path, &["rust_decimal", "Decimal"]) {
                    break 'data_type Value::Decimal(None);
                } else if matches_path(path, &["time", "Time"]) {
                    break 'data_type Value::Time(None);
                } else if matches_path(path, &["time", "Date"]) {
                    break 'data_type Value::Date(None);
                } else if matches_path(path, &["time", "PrimitiveDateTime"]) {
                    break 'data_type Value::Timestamp(None);
                } else if matches_path(path, &["uuid", "Uuid"]) {
                    break 'data_type Value::Uuid(None);
                }
                let is_option = matches_path(path, &["std", "option", "Option"]);
                let is_box = matches_path(path, &["std", "boxed", "Box"]);
                let is_vec = matches_path(path, &["std", "vec", "Vec"]);
                if is_option || is_box {
                    let inner = decode_type(first_generic(path)?)?;
                    nullable = is_option || inner.nullable;
                    break 'data_type inner.value;
                }
                if is_vec {
                    let inner = decode_type(first_generic(path)?)?;
                    if matches!(inner.value, Value::UInt8(..)) && !inner.nullable {
                        break 'data_type Value::Blob(None);
                    }
                }
                return Err(syn::Error::new(
                    ty.span(),
                    format!(
                        "Unknown column type `{}`, use #[rivet(ignore)] or #[rivet(cascade(..))] for non column fields",
                        path.to_token_stream()
                    ),
                ));
            }
            Type::Slice(TypeSlice { elem, .. }) => {
                let inner = decode_type(elem)?;
                if matches!(inner.value, Value::UInt8(..)) && !inner.nullable {
                    break 'data_type Value::Blob(None);
                }
                return Err(syn::Error::new(
                    ty.span(),
                    format!("Unsupported slice type `{}`", ty.to_token_stream()),
                ));
            }
            _ => {
                return Err(syn::Error::new(
                    ty.span(),
                    format!("Unexpected type `{}`", ty.to_token_stream()),
                ));
            }
        }
    };
    Ok(TypeDecoded { value, nullable })
}

#[cfg(test)]
mod tests {
    use super::*;
    use syn::parse_quote;

    #[test]
    fn decode_scalars() {
        let decoded = decode_type(&parse_quote!(i64)).unwrap();
        assert_eq!(decoded.value, Value::Int64(None));
        assert!(!decoded.nullable);
        let decoded = decode_type(&parse_quote!(std::string::String)).unwrap();
        assert_eq!(decoded.value, Value::Varchar(None));
        let decoded = decode_type(&parse_quote!(::time::PrimitiveDateTime)).unwrap();
        assert_eq!(decoded.value, Value::Timestamp(None));
    }

    #[test]
    fn decode_wrappers() {
        let decoded = decode_type(&parse_quote!(Option<Box<rust_decimal::Decimal>>)).unwrap();
        assert_eq!(decoded.value, Value::Decimal(None));
        assert!(decoded.nullable);
        let decoded = decode_type(&parse_quote!(Box<[u8]>)).unwrap();
        assert_eq!(decoded.value, Value::Blob(None));
        let decoded = decode_type(&parse_quote!(Vec<u8>)).unwrap();
        assert_eq!(decoded.value, Value::Blob(None));
    }

    #[test]
    fn decode_relationship_is_rejected() {
        assert!(decode_type(&parse_quote!(Vec<Profile>)).is_err());
        assert!(decode_type(&parse_quote!(Option<Profile>)).is_err());
    }
}

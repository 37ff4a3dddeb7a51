use proc_macro2::TokenStream;
use quote::{ToTokens, quote};
use rust_decimal::Decimal;
use time::{Date, PrimitiveDateTime, Time};
use uuid::Uuid;

/// Dynamically typed column value.
///
/// Every variant carries an `Option` payload: the empty variant (`Value::Int64(None)`)
/// both represents a typed `NULL` and doubles as the type descriptor stored in
/// [`ColumnDef::value`](crate::ColumnDef).
#[derive(Default, Debug, Clone)]
pub enum Value {
    #[default]
    Null,
    Boolean(Option<bool>),
    Int8(Option<i8>),
    Int16(Option<i16>),
    Int32(Option<i32>),
    Int64(Option<i64>),
    UInt8(Option<u8>),
    UInt16(Option<u16>),
    UInt32(Option<u32>),
    UInt64(Option<u64>),
    Float32(Option<f32>),
    Float64(Option<f64>),
    Decimal(Option<Decimal>),
    Varchar(Option<String>),
    Blob(Option<Box<[u8]>>),
    Date(Option<Date>),
    Time(Option<Time>),
    Timestamp(Option<PrimitiveDateTime>),
    Uuid(Option<Uuid>),
}

impl Value {
    /// True for `Null` and for every empty typed variant.
    pub fn is_null(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Boolean(v) => v.is_none(),
            Value::Int8(v) => v.is_none(),
            Value::Int16(v) => v.is_none(),
            Value::Int32(v) => v.is_none(),
            Value::Int64(v) => v.is_none(),
            Value::UInt8(v) => v.is_none(),
            Value::UInt16(v) => v.is_none(),
            Value::UInt32(v) => v.is_none(),
            Value::UInt64(v) => v.is_none(),
            Value::Float32(v) => v.is_none(),
            Value::Float64(v) => v.is_none(),
            Value::Decimal(v) => v.is_none(),
            Value::Varchar(v) => v.is_none(),
            Value::Blob(v) => v.is_none(),
            Value::Date(v) => v.is_none(),
            Value::Time(v) => v.is_none(),
            Value::Timestamp(v) => v.is_none(),
            Value::Uuid(v) => v.is_none(),
        }
    }

    pub fn same_type(&self, other: &Self) -> bool {
        core::mem::discriminant(self) == core::mem::discriminant(other)
    }

    /// Integer payload widened to `i128`, when the variant is an integer one.
    pub fn as_integer(&self) -> Option<i128> {
        match *self {
            Value::Int8(Some(v)) => Some(v as i128),
            Value::Int16(Some(v)) => Some(v as i128),
            Value::Int32(Some(v)) => Some(v as i128),
            Value::Int64(Some(v)) => Some(v as i128),
            Value::UInt8(Some(v)) => Some(v as i128),
            Value::UInt16(Some(v)) => Some(v as i128),
            Value::UInt32(Some(v)) => Some(v as i128),
            Value::UInt64(Some(v)) => Some(v as i128),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Boolean(l), Self::Boolean(r)) => l == r,
            (Self::Int8(l), Self::Int8(r)) => l == r,
            (Self::Int16(l), Self::Int16(r)) => l == r,
            (Self::Int32(l), Self::Int32(r)) => l == r,
            (Self::Int64(l), Self::Int64(r)) => l == r,
            (Self::UInt8(l), Self::UInt8(r)) => l == r,
            (Self::UInt16(l), Self::UInt16(r)) => l == r,
            (Self::UInt32(l), Self::UInt32(r)) => l == r,
            (Self::UInt64(l), Self::UInt64(r)) => l == r,
            (Self::Float32(l), Self::Float32(r)) => l == r,
            (Self::Float64(l), Self::Float64(r)) => l == r,
            (Self::Decimal(l), Self::Decimal(r)) => l == r,
            (Self::Varchar(l), Self::Varchar(r)) => l == r,
            (Self::Blob(l), Self::Blob(r)) => l == r,
            (Self::Date(l), Self::Date(r)) => l == r,
            (Self::Time(l), Self::Time(r)) => l == r,
            (Self::Timestamp(l), Self::Timestamp(r)) => l == r,
            (Self::Uuid(l), Self::Uuid(r)) => l == r,
            _ => self.same_type(other),
        }
    }
}

impl ToTokens for Value {
    fn to_tokens(&self, tokens: &mut TokenStream) {
        let ts = match self {
            Value::Null => quote!(::rivet::Value::Null),
            Value::Boolean(..) => quote!(::rivet::Value::Boolean(None)),
            Value::Int8(..) => quote!(::rivet::Value::Int8(None)),
            Value::Int16(..) => quote!(::rivet::Value::Int16(None)),
            Value::Int32(..) => quote!(::rivet::Value::Int32(None)),
            Value::Int64(..) => quote!(::rivet::Value::Int64(None)),
            Value::UInt8(..) => quote!(::rivet::Value::UInt8(None)),
            Value::UInt16(..) => quote!(::rivet::Value::UInt16(None)),
            Value::UInt32(..) => quote!(::rivet::Value::UInt32(None)),
            Value::UInt64(..) => quote!(::rivet::Value::UInt64(None)),
            Value::Float32(..) => quote!(::rivet::Value::Float32(None)),
            Value::Float64(..) => quote!(::rivet::Value::Float64(None)),
            Value::Decimal(..) => quote!(::rivet::Value::Decimal(None)),
            Value::Varchar(..) => quote!(::rivet::Value::Varchar(None)),
            Value::Blob(..) => quote!(::rivet::Value::Blob(None)),
            Value::Date(..) => quote!(::rivet::Value::Date(None)),
            Value::Time(..) => quote!(::rivet::Value::Time(None)),
            Value::Timestamp(..) => quote!(::rivet::Value::Timestamp(None)),
            Value::Uuid(..) => quote!(::rivet::Value::Uuid(None)),
        };
        tokens.extend(ts);
    }
}

use crate::{Error, Result, Value, truncate_long};
use rust_decimal::{
    Decimal,
    prelude::{FromPrimitive, ToPrimitive},
};
use std::{any, str::FromStr};
use time::{
    Date, PrimitiveDateTime, Time, format_description::BorrowedFormatItem, macros::format_description,
};
use uuid::Uuid;

/// Text layout used by drivers storing dates as strings.
pub const DATE_FORMAT: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");
/// Text layout used by drivers storing times as strings.
pub const TIME_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[hour]:[minute]:[second].[subsecond]");
/// Text layout used by drivers storing timestamps as strings.
pub const TIMESTAMP_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second].[subsecond]");

/// Conversion between native Rust types and the dynamically typed [`Value`].
///
/// This is what the field accessors generated by `#[derive(Entity)]` use to move
/// a field in and out of a statement. Decoding is lenient where stores are: an
/// integer column may come back with a wider integer variant (range checked), a
/// date may come back as text.
///
/// # Examples
/// ```rust
/// use rivet_core::{AsValue, Value};
/// let v = 42i32.as_value();
/// assert!(matches!(v, Value::Int32(Some(42))));
/// let n: i64 = AsValue::try_from_value(v).unwrap();
/// assert_eq!(n, 42);
/// ```
pub trait AsValue {
    /// The empty (NULL) variant for this type, also used as column type descriptor.
    fn as_empty_value() -> Value;
    /// Convert into the owned [`Value`] representation.
    fn as_value(self) -> Value;
    /// Attempt to convert a dynamic [`Value`] into `Self`.
    fn try_from_value(value: Value) -> Result<Self>
    where
        Self: Sized;
}

impl<T: AsValue> From<T> for Value {
    fn from(value: T) -> Self {
        value.as_value()
    }
}

impl From<&'static str> for Value {
    fn from(value: &'static str) -> Self {
        Value::Varchar(Some(value.into()))
    }
}

fn conversion_error<T>(value: &Value) -> Error {
    Error::msg(format!(
        "Cannot convert {value:?} to {}",
        any::type_name::<T>()
    ))
}

fn parse_error<T>(value: &str) -> Error {
    Error::msg(format!(
        "Cannot parse `{}` as {}",
        truncate_long!(value),
        any::type_name::<T>()
    ))
}

macro_rules! impl_as_integer {
    ($source:ty, $variant:path) => {
        impl AsValue for $source {
            fn as_empty_value() -> Value {
                $variant(None)
            }
            fn as_value(self) -> Value {
                $variant(Some(self))
            }
            fn try_from_value(value: Value) -> Result<Self> {
                if let $variant(Some(v)) = value {
                    return Ok(v);
                }
                if let Some(v) = value.as_integer() {
                    return <$source>::try_from(v).map_err(|_| {
                        Error::msg(format!(
                            "Value {v} is out of range for {}",
                            any::type_name::<Self>()
                        ))
                    });
                }
                match value {
                    Value::Boolean(Some(v)) => Ok(v as $source),
                    Value::Varchar(Some(ref v)) => v
                        .trim()
                        .parse::<$source>()
                        .map_err(|_| parse_error::<Self>(v)),
                    _ => Err(conversion_error::<Self>(&value)),
                }
            }
        }
    };
}

impl_as_integer!(i8, Value::Int8);
impl_as_integer!(i16, Value::Int16);
impl_as_integer!(i32, Value::Int32);
impl_as_integer!(i64, Value::Int64);
impl_as_integer!(u8, Value::UInt8);
impl_as_integer!(u16, Value::UInt16);
impl_as_integer!(u32, Value::UInt32);
impl_as_integer!(u64, Value::UInt64);

macro_rules! impl_as_float {
    ($source:ty, $variant:path, $to_decimal:ident) => {
        impl AsValue for $source {
            fn as_empty_value() -> Value {
                $variant(None)
            }
            fn as_value(self) -> Value {
                $variant(Some(self))
            }
            fn try_from_value(value: Value) -> Result<Self> {
                if let Some(v) = value.as_integer() {
                    return Ok(v as $source);
                }
                match value {
                    Value::Float32(Some(v)) => Ok(v as $source),
                    Value::Float64(Some(v)) => Ok(v as $source),
                    Value::Decimal(Some(v)) => v
                        .$to_decimal()
                        .ok_or_else(|| conversion_error::<Self>(&Value::Decimal(Some(v)))),
                    Value::Varchar(Some(ref v)) => v
                        .trim()
                        .parse::<$source>()
                        .map_err(|_| parse_error::<Self>(v)),
                    _ => Err(conversion_error::<Self>(&value)),
                }
            }
        }
    };
}

impl_as_float!(f32, Value::Float32, to_f32);
impl_as_float!(f64, Value::Float64, to_f64);

impl AsValue for bool {
    fn as_empty_value() -> Value {
        Value::Boolean(None)
    }
    fn as_value(self) -> Value {
        Value::Boolean(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        if let Some(v) = value.as_integer() {
            return Ok(v != 0);
        }
        match value {
            Value::Boolean(Some(v)) => Ok(v),
            Value::Varchar(Some(ref v)) => match v.trim() {
                "true" | "TRUE" | "1" => Ok(true),
                "false" | "FALSE" | "0" => Ok(false),
                _ => Err(parse_error::<Self>(v)),
            },
            _ => Err(conversion_error::<Self>(&value)),
        }
    }
}

impl AsValue for Decimal {
    fn as_empty_value() -> Value {
        Value::Decimal(None)
    }
    fn as_value(self) -> Value {
        Value::Decimal(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        if let Some(v) = value.as_integer() {
            return Decimal::from_i128(v).ok_or_else(|| conversion_error::<Self>(&value));
        }
        match value {
            Value::Decimal(Some(v)) => Ok(v),
            Value::Float32(Some(v)) => {
                Decimal::from_f32(v).ok_or_else(|| conversion_error::<Self>(&value))
            }
            Value::Float64(Some(v)) => {
                Decimal::from_f64(v).ok_or_else(|| conversion_error::<Self>(&value))
            }
            Value::Varchar(Some(ref v)) => {
                Decimal::from_str(v.trim()).map_err(|_| parse_error::<Self>(v))
            }
            _ => Err(conversion_error::<Self>(&value)),
        }
    }
}

impl AsValue for String {
    fn as_empty_value() -> Value {
        Value::Varchar(None)
    }
    fn as_value(self) -> Value {
        Value::Varchar(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Varchar(Some(v)) => Ok(v),
            Value::Blob(Some(v)) => String::from_utf8(v.into_vec()).map_err(Error::new),
            _ => Err(conversion_error::<Self>(&value)),
        }
    }
}

impl AsValue for Box<[u8]> {
    fn as_empty_value() -> Value {
        Value::Blob(None)
    }
    fn as_value(self) -> Value {
        Value::Blob(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Blob(Some(v)) => Ok(v),
            Value::Varchar(Some(v)) => Ok(v.into_bytes().into_boxed_slice()),
            _ => Err(conversion_error::<Self>(&value)),
        }
    }
}

impl AsValue for Vec<u8> {
    fn as_empty_value() -> Value {
        Value::Blob(None)
    }
    fn as_value(self) -> Value {
        Value::Blob(Some(self.into_boxed_slice()))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        <Box<[u8]> as AsValue>::try_from_value(value).map(Into::into)
    }
}

macro_rules! impl_as_temporal {
    ($source:ty, $variant:path, $format:expr) => {
        impl AsValue for $source {
            fn as_empty_value() -> Value {
                $variant(None)
            }
            fn as_value(self) -> Value {
                $variant(Some(self))
            }
            fn try_from_value(value: Value) -> Result<Self> {
                match value {
                    $variant(Some(v)) => Ok(v),
                    Value::Varchar(Some(ref v)) => {
                        <$source>::parse(v.trim(), $format).map_err(|_| parse_error::<Self>(v))
                    }
                    _ => Err(conversion_error::<Self>(&value)),
                }
            }
        }
    };
}

impl_as_temporal!(Date, Value::Date, DATE_FORMAT);
impl_as_temporal!(Time, Value::Time, TIME_FORMAT);
impl_as_temporal!(PrimitiveDateTime, Value::Timestamp, TIMESTAMP_FORMAT);

impl AsValue for Uuid {
    fn as_empty_value() -> Value {
        Value::Uuid(None)
    }
    fn as_value(self) -> Value {
        Value::Uuid(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Uuid(Some(v)) => Ok(v),
            Value::Varchar(Some(ref v)) => Uuid::parse_str(v.trim()).map_err(|_| parse_error::<Self>(v)),
            Value::Blob(Some(ref v)) => {
                Uuid::from_slice(v).map_err(|_| conversion_error::<Self>(&value))
            }
            _ => Err(conversion_error::<Self>(&value)),
        }
    }
}

impl<T: AsValue> AsValue for Option<T> {
    fn as_empty_value() -> Value {
        T::as_empty_value()
    }
    fn as_value(self) -> Value {
        match self {
            Some(v) => v.as_value(),
            None => T::as_empty_value(),
        }
    }
    fn try_from_value(value: Value) -> Result<Self> {
        if value.is_null() {
            return Ok(None);
        }
        T::try_from_value(value).map(Some)
    }
}

impl<T: AsValue> AsValue for Box<T> {
    fn as_empty_value() -> Value {
        T::as_empty_value()
    }
    fn as_value(self) -> Value {
        (*self).as_value()
    }
    fn try_from_value(value: Value) -> Result<Self> {
        T::try_from_value(value).map(Box::new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::{date, datetime, time};

    #[test]
    fn integers_widen_and_check_range() {
        assert_eq!(i32::try_from_value(Value::Int64(Some(7))).unwrap(), 7);
        assert_eq!(u8::try_from_value(Value::Int64(Some(255))).unwrap(), 255);
        assert!(u8::try_from_value(Value::Int64(Some(256))).is_err());
        assert!(u32::try_from_value(Value::Int64(Some(-1))).is_err());
        assert_eq!(i64::try_from_value(Value::Varchar(Some(" 12 ".into()))).unwrap(), 12);
    }

    #[test]
    fn null_maps_to_none() {
        assert_eq!(Option::<i64>::try_from_value(Value::Null).unwrap(), None);
        assert_eq!(
            Option::<String>::try_from_value(Value::Varchar(None)).unwrap(),
            None
        );
        assert!(i64::try_from_value(Value::Null).is_err());
        assert_eq!(Option::<i32>::None.as_value(), Value::Int32(None));
    }

    #[test]
    fn text_fallbacks() {
        assert_eq!(
            Date::try_from_value(Value::Varchar(Some("2024-02-29".into()))).unwrap(),
            date!(2024 - 02 - 29)
        );
        assert_eq!(
            Time::try_from_value(Value::Varchar(Some("07:30:15.5".into()))).unwrap(),
            time!(07:30:15.5)
        );
        assert_eq!(
            PrimitiveDateTime::try_from_value(Value::Varchar(Some(
                "2001-09-11 08:46:00.0".into()
            )))
            .unwrap(),
            datetime!(2001-09-11 08:46:00)
        );
        let uuid = Uuid::parse_str("5e915574-bb30-4430-98cf-c5854f61fbbd").unwrap();
        assert_eq!(
            Uuid::try_from_value(Value::Varchar(Some(uuid.to_string()))).unwrap(),
            uuid
        );
        assert_eq!(
            Decimal::try_from_value(Value::Varchar(Some("12.50".into()))).unwrap(),
            Decimal::new(1250, 2)
        );
        assert!(bool::try_from_value(Value::Int64(Some(1))).unwrap());
    }

    #[test]
    fn float_conversions() {
        assert_eq!(f64::try_from_value(Value::Float64(Some(2.5))).unwrap(), 2.5);
        assert_eq!(f32::try_from_value(Value::Float32(Some(0.5))).unwrap(), 0.5);
        assert_eq!(f32::try_from_value(Value::Float64(Some(1.25))).unwrap(), 1.25);
        assert_eq!(f64::try_from_value(Value::Int64(Some(3))).unwrap(), 3.0);
        assert_eq!(f64::try_from_value(Value::Varchar(Some("0.75".into()))).unwrap(), 0.75);
        assert!(f64::try_from_value(Value::Varchar(Some("many".into()))).is_err());
    }
}

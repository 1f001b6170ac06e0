//! Dynamically typed values flowing between mappers, fallbacks, factories and
//! member setters.

use std::{any::Any, fmt};

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, Utc};
use rust_decimal::Decimal;
use semver::Version;
use url::Url;
use uuid::Uuid;

use crate::error::{MappingError, Result};

/// A converted cell value on its way to a record member.
///
/// Scalars are stored in their widest representation; the mapper that
/// produced them has already checked the range of the final member type.
/// Containers and nested records travel as [`Value::Object`].
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Decimal(Decimal),
    Char(char),
    String(String),
    Guid(Uuid),
    Version(Version),
    Url(Url),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    DateTimeUtc(DateTime<Utc>),
    DateTimeOffset(DateTime<FixedOffset>),
    Time(NaiveTime),
    Duration(TimeDelta),
    /// Position of a unit variant in the enum's declared variant list.
    Enum(usize),
    Object(Box<dyn Any + Send>),
}

impl Value {
    pub fn object<T: Any + Send>(value: T) -> Self {
        Value::Object(Box::new(value))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "integer",
            Value::UInt(_) => "unsigned integer",
            Value::Float(_) => "float",
            Value::Decimal(_) => "decimal",
            Value::Char(_) => "char",
            Value::String(_) => "string",
            Value::Guid(_) => "guid",
            Value::Version(_) => "version",
            Value::Url(_) => "url",
            Value::Date(_) => "date",
            Value::DateTime(_) => "datetime",
            Value::DateTimeUtc(_) => "utc datetime",
            Value::DateTimeOffset(_) => "datetime with offset",
            Value::Time(_) => "time",
            Value::Duration(_) => "duration",
            Value::Enum(_) => "enum",
            Value::Object(_) => "object",
        }
    }

    /// Moves a boxed container or record out of the value.
    pub fn into_object<T: Any>(self) -> Result<T> {
        match self {
            Value::Object(boxed) => boxed.downcast::<T>().map(|b| *b).map_err(|_| {
                MappingError::TypeMismatch {
                    expected: std::any::type_name::<T>(),
                    found: "object of another type",
                }
            }),
            other => Err(mismatch::<T>(&other)),
        }
    }

    pub fn as_display(&self) -> Option<String> {
        let rendered = match self {
            Value::Null | Value::Object(_) => return None,
            Value::Bool(b) => b.to_string(),
            Value::Int(i) => i.to_string(),
            Value::UInt(u) => u.to_string(),
            Value::Float(f) => {
                if f.fract() == 0.0 && f.abs() < 1e15 {
                    (*f as i64).to_string()
                } else {
                    f.to_string()
                }
            }
            Value::Decimal(d) => d.to_string(),
            Value::Char(c) => c.to_string(),
            Value::String(s) => s.clone(),
            Value::Guid(g) => g.to_string(),
            Value::Version(v) => v.to_string(),
            Value::Url(u) => u.to_string(),
            Value::Date(d) => d.format("%Y-%m-%d").to_string(),
            Value::DateTime(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
            Value::DateTimeUtc(dt) => dt.to_rfc3339(),
            Value::DateTimeOffset(dt) => dt.to_rfc3339(),
            Value::Time(t) => t.format("%H:%M:%S").to_string(),
            Value::Duration(d) => d.to_string(),
            Value::Enum(index) => index.to_string(),
        };
        Some(rendered)
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("Null"),
            Value::Object(_) => f.write_str("Object(..)"),
            Value::String(s) => f.debug_tuple("String").field(s).finish(),
            Value::Enum(index) => f.debug_tuple("Enum").field(index).finish(),
            other => {
                let rendered = other.as_display().unwrap_or_default();
                write!(f, "{}({rendered})", other.kind_name())
            }
        }
    }
}

pub(crate) fn mismatch<T>(value: &Value) -> MappingError {
    MappingError::TypeMismatch {
        expected: std::any::type_name::<T>(),
        found: value.kind_name(),
    }
}

/// Extracts a member's concrete type from a [`Value`].
pub trait FromValue: Sized {
    fn from_value(value: Value) -> Result<Self>;
}

/// Wraps a typed value so it can be handed out by fixed fallbacks and value
/// maps.
pub trait IntoValue {
    fn into_value(self) -> Value;
}

macro_rules! signed_values {
    ($($ty:ty),*) => {$(
        impl FromValue for $ty {
            fn from_value(value: Value) -> Result<Self> {
                match value {
                    Value::Int(i) => <$ty>::try_from(i).map_err(|_| mismatch::<$ty>(&Value::Int(i))),
                    Value::UInt(u) => <$ty>::try_from(u).map_err(|_| mismatch::<$ty>(&Value::UInt(u))),
                    other => Err(mismatch::<$ty>(&other)),
                }
            }
        }

        impl IntoValue for $ty {
            fn into_value(self) -> Value {
                Value::Int(self as i64)
            }
        }
    )*};
}

macro_rules! unsigned_values {
    ($($ty:ty),*) => {$(
        impl FromValue for $ty {
            fn from_value(value: Value) -> Result<Self> {
                match value {
                    Value::UInt(u) => <$ty>::try_from(u).map_err(|_| mismatch::<$ty>(&Value::UInt(u))),
                    Value::Int(i) => <$ty>::try_from(i).map_err(|_| mismatch::<$ty>(&Value::Int(i))),
                    other => Err(mismatch::<$ty>(&other)),
                }
            }
        }

        impl IntoValue for $ty {
            fn into_value(self) -> Value {
                Value::UInt(self as u64)
            }
        }
    )*};
}

signed_values!(i8, i16, i32, i64, isize);
unsigned_values!(u8, u16, u32, u64, usize);

macro_rules! direct_values {
    ($($ty:ty => $variant:ident),* $(,)?) => {$(
        impl FromValue for $ty {
            fn from_value(value: Value) -> Result<Self> {
                match value {
                    Value::$variant(inner) => Ok(inner),
                    other => Err(mismatch::<$ty>(&other)),
                }
            }
        }

        impl IntoValue for $ty {
            fn into_value(self) -> Value {
                Value::$variant(self)
            }
        }
    )*};
}

direct_values!(
    bool => Bool,
    Decimal => Decimal,
    char => Char,
    String => String,
    Uuid => Guid,
    Version => Version,
    Url => Url,
    NaiveDate => Date,
    NaiveDateTime => DateTime,
    DateTime<Utc> => DateTimeUtc,
    DateTime<FixedOffset> => DateTimeOffset,
    NaiveTime => Time,
    TimeDelta => Duration,
);

impl FromValue for f64 {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Float(f) => Ok(f),
            Value::Int(i) => Ok(i as f64),
            Value::UInt(u) => Ok(u as f64),
            other => Err(mismatch::<f64>(&other)),
        }
    }
}

impl FromValue for f32 {
    fn from_value(value: Value) -> Result<Self> {
        f64::from_value(value).map(|f| f as f32)
    }
}

impl IntoValue for f64 {
    fn into_value(self) -> Value {
        Value::Float(self)
    }
}

impl IntoValue for f32 {
    fn into_value(self) -> Value {
        Value::Float(f64::from(self))
    }
}

impl IntoValue for &str {
    fn into_value(self) -> Value {
        Value::String(self.to_string())
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

impl<T: IntoValue> IntoValue for Option<T> {
    fn into_value(self) -> Value {
        match self {
            Some(inner) => inner.into_value(),
            None => Value::Null,
        }
    }
}

impl IntoValue for Value {
    fn into_value(self) -> Value {
        self
    }
}

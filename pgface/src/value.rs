use bytes::Bytes;
use std::fmt;

use crate::common::ByteStr;

/// A single column value of a data row.
///
/// Every value has a text form via [`Display`][fmt::Display], which is what the
/// text format of the protocol sends.
#[derive(Clone, Default, PartialEq)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(ByteStr),
    /// Raw bytes, displayed in postgres `bytea` hex format.
    Bytes(Bytes),
    #[cfg(feature = "time")]
    Date(time::Date),
    #[cfg(feature = "time")]
    Timestamp(time::PrimitiveDateTime),
    #[cfg(feature = "json")]
    Json(serde_json::Value),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Bool(b) => f.write_str(if *b { "true" } else { "false" }),
            Value::Int(i) => f.write_str(itoa::Buffer::new().format(*i)),
            Value::Float(n) if n.is_nan() => f.write_str("NaN"),
            Value::Float(n) if n.is_infinite() => {
                f.write_str(if n.is_sign_positive() { "Infinity" } else { "-Infinity" })
            }
            Value::Float(n) => write!(f, "{n}"),
            Value::Text(s) => f.write_str(s),
            Value::Bytes(b) => {
                f.write_str("\\x")?;
                for byte in b.iter() {
                    write!(f, "{byte:02x}")?;
                }
                Ok(())
            }
            #[cfg(feature = "time")]
            Value::Date(date) => crate::types::fmt_date(date, f),
            #[cfg(feature = "time")]
            Value::Timestamp(ts) => crate::types::fmt_timestamp(ts, f),
            #[cfg(feature = "json")]
            Value::Json(json) => write!(f, "{json}"),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("NULL"),
            Value::Text(s) => fmt::Debug::fmt(s, f),
            _ => fmt::Display::fmt(self, f),
        }
    }
}

macro_rules! from {
    ($($ty:ty => |$v:pat_param| $e:expr,)*) => {$(
        impl From<$ty> for Value {
            fn from($v: $ty) -> Self {
                $e
            }
        }
    )*};
}

from! {
    bool => |v| Value::Bool(v),
    i16 => |v| Value::Int(v.into()),
    i32 => |v| Value::Int(v.into()),
    i64 => |v| Value::Int(v),
    u32 => |v| Value::Int(v.into()),
    f32 => |v| Value::Float(v.into()),
    f64 => |v| Value::Float(v),
    &'static str => |v| Value::Text(ByteStr::from_static(v)),
    String => |v| Value::Text(ByteStr::from(v)),
    ByteStr => |v| Value::Text(v),
    Bytes => |v| Value::Bytes(v),
    Vec<u8> => |v| Value::Bytes(Bytes::from(v)),
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn text_form() {
        assert_eq!(Value::Null.to_string(), "");
        assert_eq!(Value::from(true).to_string(), "true");
        assert_eq!(Value::from(-42).to_string(), "-42");
        assert_eq!(Value::from(1.5).to_string(), "1.5");
        assert_eq!(Value::from(f64::NEG_INFINITY).to_string(), "-Infinity");
        assert_eq!(Value::from(f64::NAN).to_string(), "NaN");
        assert_eq!(Value::from("hi").to_string(), "hi");
        assert_eq!(Value::from(vec![0xde, 0xad, 0x01]).to_string(), "\\xdead01");
    }

    #[test]
    fn option_is_null() {
        assert!(Value::from(None::<i32>).is_null());
        assert_eq!(Value::from(Some(7)), Value::Int(7));
    }
}

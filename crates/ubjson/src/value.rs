//! [`UbjsonValue`] — the value tree produced and consumed by the codec.

use bigdecimal::BigDecimal;
use indexmap::IndexMap;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;

/// Prefix used to bridge binary data through JSON strings.
const DATA_URI_PREFIX: &str = "data:application/octet-stream;base64,";

/// A UBJSON value.
///
/// Covers every type the Draft-12 wire format can carry:
/// - JSON primitives (null, booleans, numbers, strings, arrays, objects)
/// - Arbitrary-precision decimals (marker `H`)
/// - Single code points (marker `C`)
/// - Binary data (the `[$U#` strongly-typed array shorthand)
#[derive(Debug, Clone, PartialEq)]
pub enum UbjsonValue {
    Null,
    Bool(bool),
    /// Signed integer within the native 64-bit range. Values outside it
    /// travel as [`HighPrec`](Self::HighPrec).
    Int(i64),
    /// Arbitrary-precision decimal, serialized as its canonical decimal
    /// string.
    HighPrec(BigDecimal),
    Float32(f32),
    Float64(f64),
    /// Single code point; encodes as `C` when it fits one UTF-8 byte.
    /// Decoding `C` always yields a one-codepoint [`Str`](Self::Str).
    Char(char),
    Str(String),
    /// Raw bytes; encoded with the `[$U#` shorthand.
    Bytes(Vec<u8>),
    Array(Vec<UbjsonValue>),
    /// Ordered mapping with unique keys; insertion order is preserved and
    /// duplicate inserts keep the first position (last value wins).
    Object(IndexMap<String, UbjsonValue>),
}

impl From<bool> for UbjsonValue {
    fn from(b: bool) -> Self {
        UbjsonValue::Bool(b)
    }
}

impl From<i64> for UbjsonValue {
    fn from(num: i64) -> Self {
        UbjsonValue::Int(num)
    }
}

impl From<u64> for UbjsonValue {
    fn from(num: u64) -> Self {
        if num <= i64::MAX as u64 {
            UbjsonValue::Int(num as i64)
        } else {
            UbjsonValue::HighPrec(BigDecimal::from(num))
        }
    }
}

impl From<i128> for UbjsonValue {
    fn from(num: i128) -> Self {
        if let Ok(small) = i64::try_from(num) {
            UbjsonValue::Int(small)
        } else {
            UbjsonValue::HighPrec(BigDecimal::from(num))
        }
    }
}

impl From<f64> for UbjsonValue {
    fn from(num: f64) -> Self {
        UbjsonValue::Float64(num)
    }
}

impl From<f32> for UbjsonValue {
    fn from(num: f32) -> Self {
        UbjsonValue::Float32(num)
    }
}

impl From<char> for UbjsonValue {
    fn from(c: char) -> Self {
        UbjsonValue::Char(c)
    }
}

impl From<&str> for UbjsonValue {
    fn from(s: &str) -> Self {
        UbjsonValue::Str(s.to_owned())
    }
}

impl From<String> for UbjsonValue {
    fn from(s: String) -> Self {
        UbjsonValue::Str(s)
    }
}

impl From<Vec<u8>> for UbjsonValue {
    fn from(bytes: Vec<u8>) -> Self {
        UbjsonValue::Bytes(bytes)
    }
}

impl From<BigDecimal> for UbjsonValue {
    fn from(dec: BigDecimal) -> Self {
        UbjsonValue::HighPrec(dec)
    }
}

impl From<serde_json::Value> for UbjsonValue {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => UbjsonValue::Null,
            serde_json::Value::Bool(b) => UbjsonValue::Bool(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    UbjsonValue::Int(i)
                } else if let Some(u) = n.as_u64() {
                    UbjsonValue::from(u)
                } else {
                    UbjsonValue::Float64(n.as_f64().unwrap_or(0.0))
                }
            }
            serde_json::Value::String(s) => match s.strip_prefix(DATA_URI_PREFIX) {
                Some(b64) => match BASE64.decode(b64) {
                    Ok(bytes) => UbjsonValue::Bytes(bytes),
                    Err(_) => UbjsonValue::Str(s),
                },
                None => UbjsonValue::Str(s),
            },
            serde_json::Value::Array(arr) => {
                UbjsonValue::Array(arr.into_iter().map(UbjsonValue::from).collect())
            }
            serde_json::Value::Object(obj) => UbjsonValue::Object(
                obj.into_iter()
                    .map(|(k, v)| (k, UbjsonValue::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<UbjsonValue> for serde_json::Value {
    fn from(v: UbjsonValue) -> Self {
        match v {
            UbjsonValue::Null => serde_json::Value::Null,
            UbjsonValue::Bool(b) => serde_json::Value::Bool(b),
            UbjsonValue::Int(i) => serde_json::Value::from(i),
            UbjsonValue::HighPrec(dec) => serde_json::Value::String(dec.to_string()),
            UbjsonValue::Float32(f) => serde_json::Value::from(f64::from(f)),
            UbjsonValue::Float64(f) => serde_json::Value::from(f),
            UbjsonValue::Char(c) => serde_json::Value::String(c.to_string()),
            UbjsonValue::Str(s) => serde_json::Value::String(s),
            UbjsonValue::Bytes(b) => {
                serde_json::Value::String(format!("{}{}", DATA_URI_PREFIX, BASE64.encode(&b)))
            }
            UbjsonValue::Array(arr) => {
                serde_json::Value::Array(arr.into_iter().map(serde_json::Value::from).collect())
            }
            UbjsonValue::Object(obj) => serde_json::Value::Object(
                obj.into_iter()
                    .map(|(k, v)| (k, serde_json::Value::from(v)))
                    .collect(),
            ),
        }
    }
}

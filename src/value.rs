use unicode_normalization::{is_nfc, UnicodeNormalization};

use crate::element::{serialize_elem, Element};
use crate::error::{Error, Result};
use crate::integer::{self, Integer};
use crate::map::CborMap;
use crate::{float, CANONICAL_NAN};

/// An owned CBOR value.
///
/// Construction through the `From` impls yields values that are already
/// canonical: text is NFC-normalized, floats with integer values collapse to
/// [`Value::Integer`], and NaN is pinned to its single canonical payload.
#[derive(Clone, Debug)]
pub enum Value {
    Null,
    Boolean(bool),
    Integer(Integer),
    Float(f64),
    Bytes(Vec<u8>),
    Text(String),
    Array(Vec<Value>),
    Map(CborMap),
    Tagged(u64, Box<Value>),
}

impl Value {
    /// Wrap a value in a tag.
    pub fn tagged(tag: u64, value: impl Into<Value>) -> Value {
        Value::Tagged(tag, Box::new(value.into()))
    }

    /// A short name for the kind of value, used in error reports.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Boolean(_) => "boolean",
            Value::Integer(_) => "integer",
            Value::Float(_) => "float",
            Value::Bytes(_) => "bytes",
            Value::Text(_) => "text",
            Value::Array(_) => "array",
            Value::Map(_) => "map",
            Value::Tagged(..) => "tagged",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_bool(&self) -> bool {
        matches!(self, Value::Boolean(_))
    }

    pub fn is_int(&self) -> bool {
        matches!(self, Value::Integer(_))
    }

    pub fn is_float(&self) -> bool {
        matches!(self, Value::Float(_))
    }

    pub fn is_bytes(&self) -> bool {
        matches!(self, Value::Bytes(_))
    }

    pub fn is_text(&self) -> bool {
        matches!(self, Value::Text(_))
    }

    pub fn is_array(&self) -> bool {
        matches!(self, Value::Array(_))
    }

    pub fn is_map(&self) -> bool {
        matches!(self, Value::Map(_))
    }

    pub fn is_tagged(&self) -> bool {
        matches!(self, Value::Tagged(..))
    }

    pub fn as_bool(&self) -> Option<bool> {
        if let Value::Boolean(val) = *self {
            Some(val)
        } else {
            None
        }
    }

    pub fn as_int(&self) -> Option<Integer> {
        if let Value::Integer(val) = *self {
            Some(val)
        } else {
            None
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Value::Integer(ref n) => n.as_i64(),
            _ => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match *self {
            Value::Integer(ref n) => n.as_u64(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Value::Integer(ref n) => Some(n.as_f64()),
            Value::Float(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        if let Value::Text(ref val) = *self {
            Some(val.as_str())
        } else {
            None
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        if let Value::Bytes(ref val) = *self {
            Some(val)
        } else {
            None
        }
    }

    pub fn as_array(&self) -> Option<&Vec<Value>> {
        if let Value::Array(ref array) = *self {
            Some(array)
        } else {
            None
        }
    }

    pub fn as_array_mut(&mut self) -> Option<&mut Vec<Value>> {
        match *self {
            Value::Array(ref mut array) => Some(array),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&CborMap> {
        if let Value::Map(ref map) = *self {
            Some(map)
        } else {
            None
        }
    }

    pub fn as_map_mut(&mut self) -> Option<&mut CborMap> {
        match *self {
            Value::Map(ref mut map) => Some(map),
            _ => None,
        }
    }

    pub fn as_tagged(&self) -> Option<(u64, &Value)> {
        if let Value::Tagged(tag, ref val) = *self {
            Some((tag, val))
        } else {
            None
        }
    }

    fn wrong_type(&self, expected: &'static str) -> Error {
        Error::WrongType {
            expected,
            actual: self.kind(),
        }
    }

    /// Extract a bool, or fail with [`Error::WrongType`].
    pub fn try_bool(&self) -> Result<bool> {
        self.as_bool().ok_or_else(|| self.wrong_type("boolean"))
    }

    /// Extract an `i64`. Fails with [`Error::OutOfRange`] when the value is
    /// an integer too large for the destination.
    pub fn try_i64(&self) -> Result<i64> {
        match self {
            Value::Integer(n) => n.as_i64().ok_or(Error::OutOfRange),
            _ => Err(self.wrong_type("integer")),
        }
    }

    /// Extract a `u64`. Fails with [`Error::OutOfRange`] for negative values.
    pub fn try_u64(&self) -> Result<u64> {
        match self {
            Value::Integer(n) => n.as_u64().ok_or(Error::OutOfRange),
            _ => Err(self.wrong_type("integer")),
        }
    }

    /// Extract a float, or fail with [`Error::WrongType`].
    pub fn try_f64(&self) -> Result<f64> {
        self.as_f64().ok_or_else(|| self.wrong_type("float"))
    }

    /// Extract a text string, or fail with [`Error::WrongType`].
    pub fn try_text(&self) -> Result<&str> {
        self.as_str().ok_or_else(|| self.wrong_type("text"))
    }

    /// Extract a byte string, or fail with [`Error::WrongType`].
    pub fn try_bytes(&self) -> Result<&[u8]> {
        self.as_bytes().ok_or_else(|| self.wrong_type("bytes"))
    }

    /// Extract an array, or fail with [`Error::WrongType`].
    pub fn try_array(&self) -> Result<&Vec<Value>> {
        self.as_array().ok_or_else(|| self.wrong_type("array"))
    }

    /// Extract a map, or fail with [`Error::WrongType`].
    pub fn try_map(&self) -> Result<&CborMap> {
        self.as_map().ok_or_else(|| self.wrong_type("map"))
    }

    /// Extract the payload of a specific tag. Fails with [`Error::WrongTag`]
    /// if tagged differently, or [`Error::WrongType`] if not tagged at all.
    pub fn try_tagged(&self, expected: u64) -> Result<&Value> {
        match self {
            Value::Tagged(tag, val) if *tag == expected => Ok(val),
            Value::Tagged(tag, _) => Err(Error::WrongTag {
                expected,
                actual: *tag,
            }),
            _ => Err(self.wrong_type("tagged")),
        }
    }

    /// Append the canonical encoding of this value to `buf`.
    pub fn encode(&self, buf: &mut Vec<u8>) {
        match self {
            Value::Null => serialize_elem(buf, Element::Null),
            Value::Boolean(v) => serialize_elem(buf, Element::Bool(*v)),
            Value::Integer(n) => match integer::get_int_internal(n) {
                integer::IntPriv::PosInt(v) => serialize_elem(buf, Element::Unsigned(v)),
                integer::IntPriv::NegInt(v) => serialize_elem(buf, Element::Negative(v)),
            },
            Value::Float(v) => serialize_elem(buf, Element::Float(*v)),
            Value::Bytes(v) => serialize_elem(buf, Element::Bytes(v)),
            Value::Text(v) => serialize_elem(buf, Element::Text(v)),
            Value::Array(v) => {
                serialize_elem(buf, Element::Array(v.len()));
                for item in v {
                    item.encode(buf);
                }
            }
            Value::Map(m) => {
                serialize_elem(buf, Element::Map(m.len()));
                for entry in m.entries() {
                    buf.extend_from_slice(&entry.key_bytes);
                    entry.value.encode(buf);
                }
            }
            Value::Tagged(tag, v) => {
                serialize_elem(buf, Element::Tag(*tag));
                v.encode(buf);
            }
        }
    }

    /// The canonical encoding of this value.
    pub fn to_vec(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        self.encode(&mut buf);
        buf
    }
}

// Floats compare by bit pattern so that the canonical NaN is equal to itself
// and values stay consistent with their encodings.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a.to_bits() == b.to_bits(),
            (Value::Bytes(a), Value::Bytes(b)) => a == b,
            (Value::Text(a), Value::Text(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            (Value::Tagged(ta, a), Value::Tagged(tb, b)) => ta == tb && a == b,
            _ => false,
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str(&crate::diag::diagnostic(self))
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Boolean(v)
    }
}

impl From<Integer> for Value {
    fn from(v: Integer) -> Self {
        Value::Integer(v)
    }
}

macro_rules! impl_from_int {
    ($t: ty) => {
        impl From<$t> for Value {
            fn from(v: $t) -> Self {
                Value::Integer(Integer::from(v))
            }
        }
    };
}

impl_from_int!(u8);
impl_from_int!(u16);
impl_from_int!(u32);
impl_from_int!(u64);
impl_from_int!(usize);
impl_from_int!(i8);
impl_from_int!(i16);
impl_from_int!(i32);
impl_from_int!(i64);
impl_from_int!(isize);

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        if let Some(n) = float::as_canonical_int(v) {
            Value::Integer(n)
        } else if v.is_nan() {
            Value::Float(CANONICAL_NAN)
        } else {
            Value::Float(v)
        }
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::from(v as f64)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        if is_nfc(v) {
            Value::Text(v.to_string())
        } else {
            Value::Text(v.nfc().collect())
        }
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        if is_nfc(&v) {
            Value::Text(v)
        } else {
            Value::Text(v.nfc().collect())
        }
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Bytes(v)
    }
}

impl From<&[u8]> for Value {
    fn from(v: &[u8]) -> Self {
        Value::Bytes(v.to_vec())
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Value::Array(v)
    }
}

impl From<CborMap> for Value {
    fn from(v: CborMap) -> Self {
        Value::Map(v)
    }
}

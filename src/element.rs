use byteorder::{BigEndian, ReadBytesExt};

use crate::{
    depth_tracking::DepthTracker,
    error::{Error, Result},
    float, integer,
    marker::*,
};

/// A single shallow CBOR item: either a primitive or the head of a container
/// whose children follow as subsequent elements.
#[derive(Clone, Debug, PartialEq)]
pub enum Element<'a> {
    /// Major type 0.
    Unsigned(u64),
    /// Major type 1. Holds the raw head argument; the value is `-(arg + 1)`.
    Negative(u64),
    /// Major type 2.
    Bytes(&'a [u8]),
    /// Major type 3. Already checked for UTF-8 and NFC on parse.
    Text(&'a str),
    /// Major type 4 head; the element count follows as further elements.
    Array(usize),
    /// Major type 5 head; `len` key-value pairs follow.
    Map(usize),
    /// Major type 6 head; exactly one child item follows.
    Tag(u64),
    /// Simple values 20/21.
    Bool(bool),
    /// Simple value 22.
    Null,
    /// Any of the three float widths, already checked for canonical form on
    /// parse. Serialization picks the narrowest exact width.
    Float(f64),
}

impl Element<'_> {
    pub fn name(&self) -> &'static str {
        use self::Element::*;
        match self {
            Unsigned(_) => "Unsigned",
            Negative(_) => "Negative",
            Bytes(_) => "Bytes",
            Text(_) => "Text",
            Array(_) => "Array",
            Map(_) => "Map",
            Tag(_) => "Tag",
            Bool(_) => "Bool",
            Null => "Null",
            Float(_) => "Float",
        }
    }
}

/// Serialize an element onto a byte vector in canonical form. Doesn't check
/// that Array & Map structures make sense, just writes elements out.
pub fn serialize_elem(buf: &mut Vec<u8>, elem: Element) {
    use self::Element::*;
    match elem {
        Unsigned(v) => write_head(buf, Major::Unsigned, v),
        Negative(v) => write_head(buf, Major::Negative, v),
        Bytes(v) => {
            write_head(buf, Major::Bytes, v.len() as u64);
            buf.extend_from_slice(v);
        }
        Text(v) => {
            write_head(buf, Major::Text, v.len() as u64);
            buf.extend_from_slice(v.as_bytes());
        }
        Array(len) => write_head(buf, Major::Array, len as u64),
        Map(len) => write_head(buf, Major::Map, len as u64),
        Tag(v) => write_head(buf, Major::Tag, v),
        Bool(v) => buf.push(0xe0 | if v { SIMPLE_TRUE } else { SIMPLE_FALSE }),
        Null => buf.push(0xe0 | SIMPLE_NULL),
        Float(v) => serialize_float(buf, v),
    }
}

/// Write a float in its one canonical form: an integer head when the value is
/// numerically a 64-bit-range integer, otherwise the narrowest exact float
/// width, with NaN pinned to the single pattern 0xf97e00.
fn serialize_float(buf: &mut Vec<u8>, v: f64) {
    if let Some(n) = float::as_canonical_int(v) {
        match integer::get_int_internal(&n) {
            integer::IntPriv::PosInt(n) => write_head(buf, Major::Unsigned, n),
            integer::IntPriv::NegInt(n) => write_head(buf, Major::Negative, n),
        }
    } else if v.is_nan() {
        buf.push(0xe0 | INFO_F16);
        buf.extend_from_slice(&float::CANONICAL_NAN_F16.to_be_bytes());
    } else if v.is_infinite() {
        let bits = if v > 0.0 {
            float::INFINITY_F16
        } else {
            float::NEG_INFINITY_F16
        };
        buf.push(0xe0 | INFO_F16);
        buf.extend_from_slice(&bits.to_be_bytes());
    } else if let Some(bits) = float::f16_from_f64(v) {
        buf.push(0xe0 | INFO_F16);
        buf.extend_from_slice(&bits.to_be_bytes());
    } else if let Some(f) = float::f32_from_f64(v) {
        buf.push(0xe0 | INFO_F32);
        buf.extend_from_slice(&f.to_bits().to_be_bytes());
    } else {
        buf.push(0xe0 | INFO_F64);
        buf.extend_from_slice(&v.to_bits().to_be_bytes());
    }
}

/// A streaming parser over canonically encoded CBOR. Yields one [`Element`]
/// per data item head, rejecting any encoding that is not in canonical form.
#[derive(Clone, Debug)]
pub struct Parser<'a> {
    data: &'a [u8],
    depth_tracking: DepthTracker,
    errored: bool,
}

impl<'a> Parser<'a> {
    pub fn new(data: &'a [u8]) -> Parser<'a> {
        Self {
            data,
            depth_tracking: DepthTracker::new(),
            errored: false,
        }
    }

    /// Number of input bytes not yet consumed.
    pub fn remaining(&self) -> usize {
        self.data.len()
    }

    // Read a head argument, rejecting any width that isn't the shortest able
    // to hold the value, plus the reserved and indefinite-length info values.
    fn read_arg(&mut self, marker: Marker) -> Result<u64> {
        match marker.info {
            info if info < 24 => Ok(info as u64),
            24 => {
                let v = self.data.read_u8().map_err(|_| Error::Underrun {
                    step: "decode u8 argument",
                    actual: 0,
                    expected: 1,
                })?;
                if v < 24 {
                    return Err(Error::NonCanonicalNumeric);
                }
                Ok(v as u64)
            }
            25 => {
                let v = self
                    .data
                    .read_u16::<BigEndian>()
                    .map_err(|_| Error::Underrun {
                        step: "decode u16 argument",
                        actual: self.data.len(),
                        expected: 2,
                    })?;
                if v <= u8::MAX as u16 {
                    return Err(Error::NonCanonicalNumeric);
                }
                Ok(v as u64)
            }
            26 => {
                let v = self
                    .data
                    .read_u32::<BigEndian>()
                    .map_err(|_| Error::Underrun {
                        step: "decode u32 argument",
                        actual: self.data.len(),
                        expected: 4,
                    })?;
                if v <= u16::MAX as u32 {
                    return Err(Error::NonCanonicalNumeric);
                }
                Ok(v as u64)
            }
            27 => {
                let v = self
                    .data
                    .read_u64::<BigEndian>()
                    .map_err(|_| Error::Underrun {
                        step: "decode u64 argument",
                        actual: self.data.len(),
                        expected: 8,
                    })?;
                if v <= u32::MAX as u64 {
                    return Err(Error::NonCanonicalNumeric);
                }
                Ok(v)
            }
            // 28-30 reserved, 31 indefinite length: neither has a canonical use
            _ => Err(Error::UnsupportedHeaderValue(marker.into_u8())),
        }
    }

    fn take_bytes(&mut self, len: usize, step: &'static str) -> Result<&'a [u8]> {
        if len > self.data.len() {
            return Err(Error::Underrun {
                step,
                actual: self.data.len(),
                expected: len,
            });
        }
        let (bytes, data) = self.data.split_at(len);
        self.data = data;
        Ok(bytes)
    }

    // Given a retrieved marker, try to turn it into the next element, which
    // may move through the indexed data. If we can't, error. This function
    // *does not* set the errored flag. That's up to the caller.
    fn parse_element(&mut self, marker: Marker) -> Result<Element<'a>> {
        let elem = match marker.major {
            Major::Unsigned => Element::Unsigned(self.read_arg(marker)?),
            Major::Negative => Element::Negative(self.read_arg(marker)?),
            Major::Bytes => {
                let len = self.read_arg(marker)? as usize;
                Element::Bytes(self.take_bytes(len, "get bytes content")?)
            }
            Major::Text => {
                let len = self.read_arg(marker)? as usize;
                let raw = self.take_bytes(len, "get text content")?;
                let string =
                    std::str::from_utf8(raw).map_err(|e| Error::InvalidString(e.to_string()))?;
                if !unicode_normalization::is_nfc(string) {
                    return Err(Error::NonCanonicalString);
                }
                Element::Text(string)
            }
            Major::Array => {
                let len = self.read_arg(marker)? as usize;
                // Each element needs at least one byte
                if len > self.data.len() {
                    return Err(Error::Underrun {
                        step: "get array elements",
                        actual: self.data.len(),
                        expected: len,
                    });
                }
                Element::Array(len)
            }
            Major::Map => {
                let len = self.read_arg(marker)? as usize;
                if len > self.data.len() / 2 {
                    return Err(Error::Underrun {
                        step: "get map entries",
                        actual: self.data.len(),
                        expected: len.saturating_mul(2),
                    });
                }
                Element::Map(len)
            }
            Major::Tag => Element::Tag(self.read_arg(marker)?),
            Major::Simple => self.parse_simple(marker)?,
        };
        self.depth_tracking.update_elem(&elem)?;
        Ok(elem)
    }

    fn parse_simple(&mut self, marker: Marker) -> Result<Element<'a>> {
        Ok(match marker.info {
            SIMPLE_FALSE => Element::Bool(false),
            SIMPLE_TRUE => Element::Bool(true),
            SIMPLE_NULL => Element::Null,
            INFO_F16 => {
                let bits = self
                    .data
                    .read_u16::<BigEndian>()
                    .map_err(|_| Error::Underrun {
                        step: "decode f16",
                        actual: self.data.len(),
                        expected: 2,
                    })?;
                // The only legal NaN is the canonical one
                if bits & 0x7c00 == 0x7c00 && bits & 0x03ff != 0 && bits != float::CANONICAL_NAN_F16
                {
                    return Err(Error::NonCanonicalNumeric);
                }
                let v = float::f16_to_f64(bits);
                if float::as_canonical_int(v).is_some() {
                    return Err(Error::NonCanonicalNumeric);
                }
                Element::Float(v)
            }
            INFO_F32 => {
                let v = self
                    .data
                    .read_f32::<BigEndian>()
                    .map_err(|_| Error::Underrun {
                        step: "decode f32",
                        actual: self.data.len(),
                        expected: 4,
                    })?;
                // NaN and infinities always fit in 2 bytes
                if !v.is_finite() {
                    return Err(Error::NonCanonicalNumeric);
                }
                let v = v as f64;
                if float::f16_from_f64(v).is_some() || float::as_canonical_int(v).is_some() {
                    return Err(Error::NonCanonicalNumeric);
                }
                Element::Float(v)
            }
            INFO_F64 => {
                let v = self
                    .data
                    .read_f64::<BigEndian>()
                    .map_err(|_| Error::Underrun {
                        step: "decode f64",
                        actual: self.data.len(),
                        expected: 8,
                    })?;
                if !v.is_finite() {
                    return Err(Error::NonCanonicalNumeric);
                }
                if float::f32_from_f64(v).is_some() || float::as_canonical_int(v).is_some() {
                    return Err(Error::NonCanonicalNumeric);
                }
                Element::Float(v)
            }
            info if info >= INFO_RESERVED => {
                return Err(Error::UnsupportedHeaderValue(marker.into_u8()))
            }
            info => return Err(Error::InvalidSimpleValue(info)),
        })
    }
}

impl<'a> std::iter::Iterator for Parser<'a> {
    type Item = Result<Element<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.errored {
            return None;
        }
        let (&byte, data) = self.data.split_first()?;
        self.data = data;
        let result = self.parse_element(Marker::from_u8(byte));
        if result.is_err() {
            self.errored = true;
        }
        Some(result)
    }
}

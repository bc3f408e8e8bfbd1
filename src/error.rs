//! Library error types.
//!
use std::fmt;

use serde::{de, ser};

/// A veil-pack Result, normally returning a veil-pack [`Error`].
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// A veil-pack error. Encompasses anything that can go wrong while decoding
/// canonical CBOR, extracting data from a decoded value, or manipulating an
/// envelope.
#[derive(Clone, Debug, PartialEq)]
pub enum Error {
    /// Input ended before an expected item completed.
    Underrun {
        /// What step of the decoding we were on when it failed.
        step: &'static str,
        /// The number of bytes actually remaining
        actual: usize,
        /// The number of bytes the step needed
        expected: usize,
    },
    /// Reserved or indefinite-length initial byte.
    UnsupportedHeaderValue(u8),
    /// Head argument or float encoding wider than the minimum.
    NonCanonicalNumeric,
    /// Simple value code outside the allowed set of false/true/null.
    InvalidSimpleValue(u8),
    /// Text string was not valid UTF-8.
    InvalidString(String),
    /// Text string was valid UTF-8 but not in Unicode NFC.
    NonCanonicalString,
    /// Decode succeeded but this many trailing bytes remained.
    UnusedData(usize),
    /// A map key's encoding was not strictly greater than its predecessor's.
    MisorderedMapKey,
    /// Two map keys had identical encodings.
    DuplicateMapKey,
    /// Extraction requested a key absent from the map.
    MissingMapKey,
    /// Integer did not fit the requested destination type.
    OutOfRange,
    /// Extraction expected a different kind of CBOR value.
    WrongType {
        /// The kind the caller asked for
        expected: &'static str,
        /// The kind actually present
        actual: &'static str,
    },
    /// Extraction expected a specific tag number.
    WrongTag {
        /// The tag the caller asked for
        expected: u64,
        /// The tag actually present
        actual: u64,
    },
    /// Tried to unwrap an envelope that isn't wrapped.
    NotWrapped,
    /// Tried to add a non-assertion envelope as an assertion.
    NotAssertion,
    /// An envelope query matched more than one element.
    AmbiguousType,
    /// An envelope had the wrong shape for the requested operation.
    InvalidType,
    /// Nesting depth limit exceeded.
    DepthLimit,
    /// Escape hatch for higher layers.
    Custom(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Error::Underrun {
                step,
                actual,
                expected,
            } => write!(
                f,
                "Expected {} more bytes, but got {} on step [{}]",
                expected, actual, step
            ),
            Error::UnsupportedHeaderValue(byte) => {
                write!(f, "Unsupported header byte 0x{:02x}", byte)
            }
            Error::NonCanonicalNumeric => write!(f, "Numeric value not in shortest encoding"),
            Error::InvalidSimpleValue(code) => write!(f, "Invalid simple value {}", code),
            Error::InvalidString(ref why) => write!(f, "Text string is not valid UTF-8: {}", why),
            Error::NonCanonicalString => write!(f, "Text string is not in Unicode NFC"),
            Error::UnusedData(n) => write!(f, "Decode left {} unused trailing bytes", n),
            Error::MisorderedMapKey => write!(f, "Map keys are not in ascending encoded order"),
            Error::DuplicateMapKey => write!(f, "Map has a duplicate key"),
            Error::MissingMapKey => write!(f, "Map is missing the requested key"),
            Error::OutOfRange => write!(f, "Integer out of range for destination type"),
            Error::WrongType { expected, actual } => {
                write!(f, "Expected {}, but value is {}", expected, actual)
            }
            Error::WrongTag { expected, actual } => {
                write!(f, "Expected tag {}, but value has tag {}", expected, actual)
            }
            Error::NotWrapped => write!(f, "Envelope is not wrapped"),
            Error::NotAssertion => write!(f, "Envelope is not an assertion"),
            Error::AmbiguousType => write!(f, "Envelope query matched more than one element"),
            Error::InvalidType => write!(f, "Envelope has the wrong shape for this operation"),
            Error::DepthLimit => write!(f, "Nesting depth limit exceeded"),
            Error::Custom(ref msg) => f.write_str(msg),
        }
    }
}

impl std::error::Error for Error {}

impl ser::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }
}

impl de::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }
}

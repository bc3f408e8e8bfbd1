//! The envelope wire mapping.
//!
//! An envelope serializes as a tagged CBOR value: the envelope tag wrapping
//! one case-specific payload. Nested envelopes carry their own envelope tag,
//! so any subtree of the encoding is itself a decodable envelope. Decoding
//! rebuilds digests bottom-up, so a decoded envelope's identity is recomputed
//! rather than trusted.

use crate::decode::decode_value;
use crate::digest::Digest;
use crate::error::{Error, Result};
use crate::map::CborMap;
use crate::value::Value;

use super::{Envelope, EnvelopeCase};

/// Tag wrapping every envelope.
pub const TAG_ENVELOPE: u64 = 200;
/// Tag wrapping an elided envelope's digest bytes.
pub const TAG_ELIDED: u64 = 203;
/// Tag wrapping an encrypted blob.
pub const TAG_ENCRYPTED: u64 = 204;
/// Tag wrapping a compressed blob.
pub const TAG_COMPRESSED: u64 = 205;
/// Tag wrapping a node's `[subject, assertions]` pair.
pub const TAG_NODE: u64 = 217;
/// Tag wrapping an assertion's one-entry predicate-object map.
pub const TAG_ASSERTION: u64 = 221;
/// Tag wrapping the envelope inside a wrapped envelope.
pub const TAG_WRAPPED: u64 = 224;
/// RFC 8949 "encoded CBOR" tag, wrapping a leaf's value.
pub const TAG_ENCODED_CBOR: u64 = 24;

impl Envelope {
    /// The envelope as a CBOR value.
    pub fn to_value(&self) -> Value {
        Value::tagged(TAG_ENVELOPE, self.case_value())
    }

    fn case_value(&self) -> Value {
        match self.case() {
            EnvelopeCase::Leaf(v) => Value::tagged(TAG_ENCODED_CBOR, v.clone()),
            EnvelopeCase::Wrapped(inner) => Value::tagged(TAG_WRAPPED, inner.to_value()),
            EnvelopeCase::Assertion { predicate, object } => {
                let mut map = CborMap::new();
                map.insert(predicate.to_value(), object.to_value());
                Value::tagged(TAG_ASSERTION, map)
            }
            EnvelopeCase::Node {
                subject,
                assertions,
            } => {
                // Assertions are already in digest order, which is also the
                // deterministic wire order
                let assertions: Vec<Value> = assertions.iter().map(|a| a.to_value()).collect();
                Value::tagged(
                    TAG_NODE,
                    Value::Array(vec![subject.to_value(), Value::Array(assertions)]),
                )
            }
            EnvelopeCase::Elided => {
                Value::tagged(TAG_ELIDED, self.digest().as_bytes().as_slice())
            }
            EnvelopeCase::Encrypted(payload) => Value::tagged(TAG_ENCRYPTED, payload.clone()),
            EnvelopeCase::Compressed(payload) => Value::tagged(TAG_COMPRESSED, payload.clone()),
        }
    }

    /// The envelope's canonical encoding.
    pub fn to_vec(&self) -> Vec<u8> {
        self.to_value().to_vec()
    }

    /// Rebuild an envelope from its CBOR value, recomputing every digest.
    pub fn from_value(value: &Value) -> Result<Envelope> {
        Self::case_from_value(value.try_tagged(TAG_ENVELOPE)?)
    }

    /// Decode an envelope from canonical CBOR bytes.
    pub fn from_slice(buf: &[u8]) -> Result<Envelope> {
        Self::from_value(&decode_value(buf)?)
    }

    fn case_from_value(content: &Value) -> Result<Envelope> {
        let (tag, payload) = content.as_tagged().ok_or(Error::InvalidType)?;
        match tag {
            TAG_ENCODED_CBOR => Ok(Envelope::new(payload.clone())),
            TAG_WRAPPED => Ok(Envelope::from_value(payload)?.wrap()),
            TAG_ASSERTION => {
                // An assertion is exactly a one-entry map; no fused or
                // shortcut form is accepted
                let map = payload.try_map()?;
                if map.len() != 1 {
                    return Err(Error::InvalidType);
                }
                let (predicate, object) = map.iter().next().expect("one entry");
                Ok(Envelope::assertion(
                    Envelope::from_value(predicate)?,
                    Envelope::from_value(object)?,
                ))
            }
            TAG_NODE => {
                let parts = payload.try_array()?;
                if parts.len() != 2 {
                    return Err(Error::InvalidType);
                }
                let subject = Envelope::from_value(&parts[0])?;
                let assertions = parts[1]
                    .try_array()?
                    .iter()
                    .map(Envelope::from_value)
                    .collect::<Result<Vec<Envelope>>>()?;
                if assertions.is_empty() {
                    return Err(Error::InvalidType);
                }
                // Only assertions (possibly obscured) may hang off a subject
                if assertions
                    .iter()
                    .any(|a| !a.is_assertion() && !a.is_obscured())
                {
                    return Err(Error::InvalidType);
                }
                Ok(Envelope::node(subject, assertions))
            }
            TAG_ELIDED => Ok(Envelope::elided(Digest::try_from(payload.try_bytes()?)?)),
            TAG_ENCRYPTED => Envelope::encrypted(payload.clone()),
            TAG_COMPRESSED => Envelope::compressed(payload.clone()),
            _ => Err(Error::InvalidType),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn roundtrip(e: &Envelope) -> Envelope {
        let bytes = e.to_vec();
        let back = Envelope::from_slice(&bytes).expect("decode");
        assert_eq!(back.digest(), e.digest(), "digest drift through the wire");
        assert_eq!(back.to_vec(), bytes, "re-encode drift");
        back
    }

    #[test]
    fn leaf_roundtrip() {
        let e = Envelope::new("Alice");
        let back = roundtrip(&e);
        assert_eq!(back.as_leaf(), Some(&Value::from("Alice")));
    }

    #[test]
    fn leaf_wire_shape() {
        let e = Envelope::new(42);
        // envelope tag around encoded-cbor tag around the value
        assert_eq!(e.to_value(), Value::tagged(200, Value::tagged(24, 42)));
        assert_eq!(e.to_vec(), vec![0xd8, 0xc8, 0xd8, 0x18, 0x18, 0x2a]);
    }

    #[test]
    fn node_roundtrip() {
        let e = Envelope::new("Alice")
            .add_assertion_for("knows", "Bob")
            .add_assertion_for("knows", "Carol")
            .add_assertion_for("age", 30);
        let back = roundtrip(&e);
        assert_eq!(back.assertions().len(), 3);
        assert_eq!(back.object_for("age").unwrap(), Envelope::new(30));
    }

    #[test]
    fn wrapped_and_assertion_roundtrip() {
        let e = Envelope::new("data").wrap().wrap();
        roundtrip(&e);

        let a = Envelope::assertion_with("knows", "Bob");
        let back = roundtrip(&a);
        assert!(back.is_assertion());
    }

    #[test]
    fn elided_roundtrip() {
        let e = Envelope::new("Alice").add_assertion_for("knows", "Bob");
        let elided = e.elide();
        let back = roundtrip(&elided);
        assert!(back.is_elided());
        assert_eq!(back.digest(), e.digest());
    }

    #[test]
    fn blob_roundtrip() {
        let original = Envelope::new("secret");
        let payload = Value::Array(vec![
            Value::from(original.digest().as_bytes().as_slice()),
            Value::from(vec![0x55u8; 8]),
        ]);
        let e = Envelope::encrypted(payload.clone()).unwrap();
        let back = roundtrip(&e);
        assert_eq!(back.digest(), original.digest());

        let c = Envelope::compressed(payload).unwrap();
        roundtrip(&c);
    }

    #[test]
    fn partially_elided_roundtrip() {
        let e = Envelope::new("Alice")
            .add_assertion_for("knows", "Bob")
            .add_assertion_for("knows", "Carol");
        let target: std::collections::HashSet<_> =
            [Envelope::assertion_with("knows", "Bob").digest()].into();
        let elided = e.elide_removing(&target);
        let back = roundtrip(&elided);
        assert_eq!(back.digest(), e.digest());
        assert_eq!(back.assertions().len(), 2);
        assert!(back.assertions().iter().any(|a| a.is_elided()));
    }

    #[test]
    fn malformed_rejected() {
        // Not an envelope tag
        assert_eq!(
            Envelope::from_value(&Value::tagged(99, 1)),
            Err(Error::WrongTag {
                expected: 200,
                actual: 99
            })
        );
        // Untagged case content
        assert_eq!(
            Envelope::from_value(&Value::tagged(200, 1)),
            Err(Error::InvalidType)
        );
        // Assertion payload must be a one-entry map
        let mut two = CborMap::new();
        two.insert(1, 2);
        two.insert(3, 4);
        assert_eq!(
            Envelope::from_value(&Value::tagged(200, Value::tagged(TAG_ASSERTION, two))),
            Err(Error::InvalidType)
        );
        // Node with no assertions
        let leaf = Envelope::new(1).to_value();
        assert_eq!(
            Envelope::from_value(&Value::tagged(
                200,
                Value::tagged(
                    TAG_NODE,
                    Value::from(vec![leaf.clone(), Value::Array(vec![])])
                )
            )),
            Err(Error::InvalidType)
        );
        // Node whose "assertion" is a plain leaf
        assert_eq!(
            Envelope::from_value(&Value::tagged(
                200,
                Value::tagged(
                    TAG_NODE,
                    Value::from(vec![leaf.clone(), Value::Array(vec![leaf])])
                )
            )),
            Err(Error::InvalidType)
        );
        // Elided digest must be exactly 32 bytes
        assert_eq!(
            Envelope::from_value(&Value::tagged(
                200,
                Value::tagged(TAG_ELIDED, vec![0u8; 31])
            )),
            Err(Error::InvalidType)
        );
    }
}

use std::cmp::{self, Ordering};
use std::convert::TryFrom;
use std::fmt;
use std::hash;

use constant_time_eq::constant_time_eq;
use sha2::{Digest as Sha2Digest, Sha256};

use crate::error::Error;

/// Number of bytes in a [`Digest`].
pub const DIGEST_SIZE: usize = 32;

/// A SHA-256 digest. Serves as an envelope's identity: it is impractical to
/// produce two envelopes with the same digest.
#[derive(Clone, Copy)]
pub struct Digest([u8; DIGEST_SIZE]);

impl Digest {
    /// Hash a byte slice.
    pub fn new(data: &[u8]) -> Digest {
        let mut hasher = Sha256::new();
        hasher.update(data);
        Digest(hasher.finalize().into())
    }

    /// Hash the concatenation of several byte slices without materializing it.
    pub fn from_parts<'a>(parts: impl IntoIterator<Item = &'a [u8]>) -> Digest {
        let mut hasher = Sha256::new();
        for part in parts {
            hasher.update(part);
        }
        Digest(hasher.finalize().into())
    }

    /// Wrap an existing 32-byte digest.
    pub fn from_bytes(bytes: [u8; DIGEST_SIZE]) -> Digest {
        Digest(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; DIGEST_SIZE] {
        &self.0
    }

    /// The full digest in lowercase hex.
    pub fn hex(&self) -> String {
        hex::encode(self.0)
    }

    /// The first seven hex characters, used as a compact identifier in tree
    /// output.
    pub fn short(&self) -> String {
        let mut s = self.hex();
        s.truncate(7);
        s
    }
}

impl Eq for Digest {}

impl PartialEq for Digest {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        constant_time_eq(&self.0, &other.0)
    }
}

// Not constant time; ordering only drives digest sorting and map placement,
// never a secret comparison.
impl cmp::Ord for Digest {
    fn cmp(&self, other: &Digest) -> Ordering {
        self.0.cmp(&other.0)
    }
}

impl cmp::PartialOrd for Digest {
    fn partial_cmp(&self, other: &Digest) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl hash::Hash for Digest {
    fn hash<H: hash::Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Digest({})", self.hex())
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.hex())
    }
}

impl AsRef<[u8]> for Digest {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl TryFrom<&[u8]> for Digest {
    type Error = Error;

    fn try_from(bytes: &[u8]) -> Result<Self, Error> {
        let bytes: [u8; DIGEST_SIZE] = bytes.try_into().map_err(|_| Error::InvalidType)?;
        Ok(Digest(bytes))
    }
}

use serde::{
    de::{Deserialize, Deserializer},
    ser::{Serialize, Serializer},
};

impl Serialize for Digest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_bytes(&self.0)
    }
}

impl<'de> Deserialize<'de> for Digest {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct DigestVisitor;
        impl<'de> serde::de::Visitor<'de> for DigestVisitor {
            type Value = Digest;

            fn expecting(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(fmt, "{} bytes", DIGEST_SIZE)
            }

            fn visit_bytes<E: serde::de::Error>(self, v: &[u8]) -> Result<Self::Value, E> {
                Digest::try_from(v).map_err(|_| E::invalid_length(v.len(), &self))
            }
        }

        deserializer.deserialize_bytes(DigestVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_vector() {
        // SHA-256 of the empty string
        assert_eq!(
            Digest::new(b"").hex(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
        // SHA-256 of "abc"
        assert_eq!(
            Digest::new(b"abc").hex(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn parts_match_concatenation() {
        let whole = Digest::new(b"hello world");
        let parts = Digest::from_parts([b"hello ".as_slice(), b"world".as_slice()]);
        assert_eq!(whole, parts);
    }

    #[test]
    fn short_form() {
        let d = Digest::new(b"abc");
        assert_eq!(d.short(), "ba7816b");
        assert_eq!(d.short().len(), 7);
    }

    #[test]
    fn slice_conversion() {
        let d = Digest::new(b"x");
        let copy = Digest::try_from(d.as_bytes().as_slice()).unwrap();
        assert_eq!(d, copy);
        assert_eq!(Digest::try_from(&[0u8; 31][..]), Err(Error::InvalidType));
    }
}

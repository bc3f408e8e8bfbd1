//! The CBOR map container.
//!
//! Entries are held in ascending lexicographic order of each key's canonical
//! encoding, which is the only order a canonical map may serialize in. The
//! encoded key bytes are kept alongside each entry so ordering, lookup, and
//! serialization never re-derive them.

use crate::error::{Error, Result};
use crate::value::Value;

#[derive(Clone, Debug)]
pub(crate) struct MapEntry {
    pub key_bytes: Vec<u8>,
    pub key: Value,
    pub value: Value,
}

/// A map of CBOR keys to CBOR values, iterated in canonical key order.
#[derive(Clone, Debug, Default)]
pub struct CborMap {
    entries: Vec<MapEntry>,
}

impl CborMap {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Insert a key-value pair, keeping canonical order. If the key was
    /// already present, its value is replaced and the old value returned.
    pub fn insert(&mut self, key: impl Into<Value>, value: impl Into<Value>) -> Option<Value> {
        let key = key.into();
        let key_bytes = key.to_vec();
        let value = value.into();
        match self
            .entries
            .binary_search_by(|e| e.key_bytes.as_slice().cmp(&key_bytes))
        {
            Ok(idx) => Some(std::mem::replace(&mut self.entries[idx].value, value)),
            Err(idx) => {
                self.entries.insert(
                    idx,
                    MapEntry {
                        key_bytes,
                        key,
                        value,
                    },
                );
                None
            }
        }
    }

    /// Remove a key, returning its value if it was present.
    pub fn remove(&mut self, key: &Value) -> Option<Value> {
        let key_bytes = key.to_vec();
        match self
            .entries
            .binary_search_by(|e| e.key_bytes.as_slice().cmp(&key_bytes))
        {
            Ok(idx) => Some(self.entries.remove(idx).value),
            Err(_) => None,
        }
    }

    /// Look up a key.
    pub fn get(&self, key: &Value) -> Option<&Value> {
        let key_bytes = key.to_vec();
        self.entries
            .binary_search_by(|e| e.key_bytes.as_slice().cmp(&key_bytes))
            .ok()
            .map(|idx| &self.entries[idx].value)
    }

    /// Look up a key, failing with [`Error::MissingMapKey`] if absent.
    pub fn try_get(&self, key: &Value) -> Result<&Value> {
        self.get(key).ok_or(Error::MissingMapKey)
    }

    pub fn contains_key(&self, key: &Value) -> bool {
        self.get(key).is_some()
    }

    /// Iterate entries in canonical key order.
    pub fn iter(&self) -> impl Iterator<Item = (&Value, &Value)> {
        self.entries.iter().map(|e| (&e.key, &e.value))
    }

    pub fn keys(&self) -> impl Iterator<Item = &Value> {
        self.entries.iter().map(|e| &e.key)
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.entries.iter().map(|e| &e.value)
    }

    pub(crate) fn entries(&self) -> &[MapEntry] {
        &self.entries
    }

    /// Append an entry decoded off the wire. The key must sort strictly after
    /// every existing key; anything else is a canonical-form violation.
    pub(crate) fn push_decoded(
        &mut self,
        key_bytes: Vec<u8>,
        key: Value,
        value: Value,
    ) -> Result<()> {
        if let Some(last) = self.entries.last() {
            match last.key_bytes.as_slice().cmp(&key_bytes) {
                std::cmp::Ordering::Less => (),
                std::cmp::Ordering::Equal => return Err(Error::DuplicateMapKey),
                std::cmp::Ordering::Greater => return Err(Error::MisorderedMapKey),
            }
        }
        self.entries.push(MapEntry {
            key_bytes,
            key,
            value,
        });
        Ok(())
    }
}

impl PartialEq for CborMap {
    fn eq(&self, other: &Self) -> bool {
        self.entries.len() == other.entries.len()
            && self
                .entries
                .iter()
                .zip(other.entries.iter())
                .all(|(a, b)| a.key_bytes == b.key_bytes && a.value == b.value)
    }
}

impl<K: Into<Value>, V: Into<Value>> FromIterator<(K, V)> for CborMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = CborMap::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

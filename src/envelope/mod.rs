//! The envelope structure: a recursive, content-addressed container over
//! canonical CBOR.
//!
//! Every envelope carries a SHA-256 digest computed once at construction.
//! Children are shared behind reference-counted handles, so the "mutating"
//! operations cheaply build new trees around unchanged subtrees. Two
//! envelopes with equal digests are the same envelope.

pub mod cbor;
mod elide;
mod proof;
mod tree;
mod walk;

pub use walk::EnvelopeEdge;

use std::sync::Arc;

use crate::digest::Digest;
use crate::element::{serialize_elem, Element};
use crate::error::{Error, Result};
use crate::value::Value;

/// The shape of an envelope.
#[derive(Clone, Debug)]
pub enum EnvelopeCase {
    /// A plain CBOR value.
    Leaf(Value),
    /// An envelope used as a value in its own right.
    Wrapped(Envelope),
    /// A predicate-object pair, attachable to a subject.
    Assertion {
        predicate: Envelope,
        object: Envelope,
    },
    /// A subject with at least one assertion about it. Assertions are held
    /// sorted ascending by digest, with duplicates collapsed.
    Node {
        subject: Envelope,
        assertions: Vec<Envelope>,
    },
    /// A subtree replaced by its digest.
    Elided,
    /// An opaque ciphertext blob carrying the plaintext's digest.
    Encrypted(Value),
    /// An opaque compressed blob carrying the uncompressed digest.
    Compressed(Value),
}

impl EnvelopeCase {
    /// Upper-case shape name, as used in tree output.
    pub fn name(&self) -> &'static str {
        match self {
            EnvelopeCase::Leaf(_) => "LEAF",
            EnvelopeCase::Wrapped(_) => "WRAPPED",
            EnvelopeCase::Assertion { .. } => "ASSERTION",
            EnvelopeCase::Node { .. } => "NODE",
            EnvelopeCase::Elided => "ELIDED",
            EnvelopeCase::Encrypted(_) => "ENCRYPTED",
            EnvelopeCase::Compressed(_) => "COMPRESSED",
        }
    }
}

/// A content-addressed envelope. Cheap to clone; children are shared.
#[derive(Clone)]
pub struct Envelope {
    case: Arc<EnvelopeCase>,
    digest: Digest,
}

impl Envelope {
    /// Wrap a CBOR value as a leaf envelope.
    ///
    /// The digest is the hash of the value's canonical encoding inside an
    /// encoded-CBOR tag, so it commits to exact bytes rather than an
    /// in-memory shape.
    pub fn new(value: impl Into<Value>) -> Envelope {
        let value = value.into();
        let mut buf = Vec::new();
        serialize_elem(&mut buf, Element::Tag(cbor::TAG_ENCODED_CBOR));
        value.encode(&mut buf);
        Envelope {
            case: Arc::new(EnvelopeCase::Leaf(value)),
            digest: Digest::new(&buf),
        }
    }

    /// Wrap this envelope so it can stand as a single value (e.g. the subject
    /// of further assertions about the envelope as a whole).
    pub fn wrap(&self) -> Envelope {
        Envelope {
            digest: Digest::new(self.digest.as_bytes()),
            case: Arc::new(EnvelopeCase::Wrapped(self.clone())),
        }
    }

    /// Recover the envelope inside a wrapped envelope.
    pub fn unwrap_envelope(&self) -> Result<Envelope> {
        match self.case() {
            EnvelopeCase::Wrapped(inner) => Ok(inner.clone()),
            _ => Err(Error::NotWrapped),
        }
    }

    /// Form an assertion from predicate and object envelopes.
    pub fn assertion(predicate: Envelope, object: Envelope) -> Envelope {
        let digest = Digest::from_parts([
            predicate.digest.as_bytes().as_slice(),
            object.digest.as_bytes().as_slice(),
        ]);
        Envelope {
            case: Arc::new(EnvelopeCase::Assertion { predicate, object }),
            digest,
        }
    }

    /// Form an assertion from anything convertible to leaf values.
    pub fn assertion_with(predicate: impl Into<Value>, object: impl Into<Value>) -> Envelope {
        Envelope::assertion(Envelope::new(predicate), Envelope::new(object))
    }

    /// An envelope that is nothing but a digest.
    pub fn elided(digest: Digest) -> Envelope {
        Envelope {
            case: Arc::new(EnvelopeCase::Elided),
            digest,
        }
    }

    /// Accept an opaque ciphertext blob. The blob is an array whose first
    /// element is the 32-byte digest of the plaintext envelope, which becomes
    /// this envelope's digest.
    pub fn encrypted(payload: Value) -> Result<Envelope> {
        let digest = blob_digest(&payload)?;
        Ok(Envelope {
            case: Arc::new(EnvelopeCase::Encrypted(payload)),
            digest,
        })
    }

    /// Accept an opaque compressed blob, shaped like [`Envelope::encrypted`]'s.
    pub fn compressed(payload: Value) -> Result<Envelope> {
        let digest = blob_digest(&payload)?;
        Ok(Envelope {
            case: Arc::new(EnvelopeCase::Compressed(payload)),
            digest,
        })
    }

    /// Build a node. Assertions are sorted ascending by digest and
    /// deduplicated; an empty assertion list yields the bare subject.
    pub(crate) fn node(subject: Envelope, mut assertions: Vec<Envelope>) -> Envelope {
        assertions.sort_by_key(|a| *a.digest().as_bytes());
        assertions.dedup_by(|a, b| a.digest() == b.digest());
        if assertions.is_empty() {
            return subject;
        }
        let digest = Digest::from_parts(
            std::iter::once(subject.digest.as_bytes().as_slice())
                .chain(assertions.iter().map(|a| a.digest.as_bytes().as_slice())),
        );
        Envelope {
            case: Arc::new(EnvelopeCase::Node {
                subject,
                assertions,
            }),
            digest,
        }
    }

    /// This envelope's digest, its identity.
    pub fn digest(&self) -> Digest {
        self.digest
    }

    /// This envelope's shape.
    pub fn case(&self) -> &EnvelopeCase {
        &self.case
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self.case(), EnvelopeCase::Leaf(_))
    }

    pub fn is_wrapped(&self) -> bool {
        matches!(self.case(), EnvelopeCase::Wrapped(_))
    }

    pub fn is_assertion(&self) -> bool {
        matches!(self.case(), EnvelopeCase::Assertion { .. })
    }

    pub fn is_node(&self) -> bool {
        matches!(self.case(), EnvelopeCase::Node { .. })
    }

    pub fn is_elided(&self) -> bool {
        matches!(self.case(), EnvelopeCase::Elided)
    }

    /// True for the cases that hide their content but keep their digest:
    /// elided, encrypted, and compressed envelopes.
    pub fn is_obscured(&self) -> bool {
        matches!(
            self.case(),
            EnvelopeCase::Elided | EnvelopeCase::Encrypted(_) | EnvelopeCase::Compressed(_)
        )
    }

    /// The leaf value, if this is a leaf.
    pub fn as_leaf(&self) -> Option<&Value> {
        match self.case() {
            EnvelopeCase::Leaf(v) => Some(v),
            _ => None,
        }
    }

    /// The predicate, if this is an assertion.
    pub fn as_predicate(&self) -> Option<&Envelope> {
        match self.case() {
            EnvelopeCase::Assertion { predicate, .. } => Some(predicate),
            _ => None,
        }
    }

    /// The object, if this is an assertion.
    pub fn as_object(&self) -> Option<&Envelope> {
        match self.case() {
            EnvelopeCase::Assertion { object, .. } => Some(object),
            _ => None,
        }
    }

    /// The subject: a node's subject, or the whole envelope otherwise.
    pub fn subject(&self) -> Envelope {
        match self.case() {
            EnvelopeCase::Node { subject, .. } => subject.clone(),
            _ => self.clone(),
        }
    }

    /// The assertions attached to this envelope, in digest order. Empty for
    /// anything but a node.
    pub fn assertions(&self) -> &[Envelope] {
        match self.case() {
            EnvelopeCase::Node { assertions, .. } => assertions,
            _ => &[],
        }
    }

    /// Attach an assertion, turning a bare envelope into a node or extending
    /// an existing node's assertion set. Adding an assertion already present
    /// (by digest) changes nothing.
    pub fn add_assertion(&self, assertion: Envelope) -> Result<Envelope> {
        if !assertion.is_assertion() {
            return Err(Error::NotAssertion);
        }
        Ok(self.add_assertion_unchecked(assertion))
    }

    /// Attach an assertion built from leaf predicate and object values.
    pub fn add_assertion_for(
        &self,
        predicate: impl Into<Value>,
        object: impl Into<Value>,
    ) -> Envelope {
        self.add_assertion_unchecked(Envelope::assertion_with(predicate, object))
    }

    fn add_assertion_unchecked(&self, assertion: Envelope) -> Envelope {
        match self.case() {
            EnvelopeCase::Node {
                subject,
                assertions,
            } => {
                if assertions.iter().any(|a| a.digest() == assertion.digest()) {
                    return self.clone();
                }
                let mut assertions = assertions.clone();
                assertions.push(assertion);
                Envelope::node(subject.clone(), assertions)
            }
            _ => Envelope::node(self.clone(), vec![assertion]),
        }
    }

    /// Remove an assertion by digest. Removing the last assertion of a node
    /// yields the bare subject; envelopes without that assertion come back
    /// unchanged.
    pub fn remove_assertion(&self, target: &Envelope) -> Envelope {
        match self.case() {
            EnvelopeCase::Node {
                subject,
                assertions,
            } => {
                let remaining: Vec<Envelope> = assertions
                    .iter()
                    .filter(|a| a.digest() != target.digest())
                    .cloned()
                    .collect();
                if remaining.len() == assertions.len() {
                    self.clone()
                } else {
                    Envelope::node(subject.clone(), remaining)
                }
            }
            _ => self.clone(),
        }
    }

    /// All assertions whose predicate has the given envelope's digest.
    pub fn assertions_with_predicate(&self, predicate: &Envelope) -> Vec<Envelope> {
        self.assertions()
            .iter()
            .filter(|a| {
                a.as_predicate()
                    .is_some_and(|p| p.digest() == predicate.digest())
            })
            .cloned()
            .collect()
    }

    /// The object of the unique assertion with the given predicate.
    ///
    /// Fails with [`Error::MissingMapKey`] when no assertion matches and
    /// [`Error::AmbiguousType`] when several do.
    pub fn object_for_predicate(&self, predicate: &Envelope) -> Result<Envelope> {
        let matches = self.assertions_with_predicate(predicate);
        match matches.len() {
            0 => Err(Error::MissingMapKey),
            1 => Ok(matches[0]
                .as_object()
                .ok_or(Error::InvalidType)?
                .clone()),
            _ => Err(Error::AmbiguousType),
        }
    }

    /// Convenience form of [`Envelope::object_for_predicate`] taking a leaf
    /// predicate value.
    pub fn object_for(&self, predicate: impl Into<Value>) -> Result<Envelope> {
        self.object_for_predicate(&Envelope::new(predicate))
    }

    /// Deserialize the subject's leaf value into a concrete type.
    ///
    /// Fails with [`Error::InvalidType`] when the subject isn't a leaf, and
    /// surfaces the usual extraction errors when the value doesn't fit `T`.
    pub fn extract<T: serde::de::DeserializeOwned>(&self) -> Result<T> {
        let subject = self.subject();
        match subject.as_leaf() {
            Some(value) => crate::de::from_value(value),
            None => Err(Error::InvalidType),
        }
    }

    /// Deserialize the object of the unique assertion with a leaf predicate.
    pub fn extract_object<T: serde::de::DeserializeOwned>(
        &self,
        predicate: impl Into<Value>,
    ) -> Result<T> {
        self.object_for(predicate)?.extract()
    }

    /// Direct children in the envelope structure.
    pub(crate) fn children(&self) -> Vec<&Envelope> {
        match self.case() {
            EnvelopeCase::Leaf(_)
            | EnvelopeCase::Elided
            | EnvelopeCase::Encrypted(_)
            | EnvelopeCase::Compressed(_) => Vec::new(),
            EnvelopeCase::Wrapped(inner) => vec![inner],
            EnvelopeCase::Assertion { predicate, object } => vec![predicate, object],
            EnvelopeCase::Node {
                subject,
                assertions,
            } => std::iter::once(subject).chain(assertions.iter()).collect(),
        }
    }

    /// The digests of every subtree reachable in this envelope, including its
    /// own.
    pub fn digests(&self) -> std::collections::HashSet<Digest> {
        let mut set = std::collections::HashSet::new();
        fn collect(env: &Envelope, set: &mut std::collections::HashSet<Digest>) {
            if set.insert(env.digest()) {
                for child in env.children() {
                    collect(child, set);
                }
            }
        }
        collect(self, &mut set);
        set
    }
}

// The blob payload of an encrypted or compressed envelope leads with the
// digest of the content it stands in for.
fn blob_digest(payload: &Value) -> Result<Digest> {
    let first = payload.try_array()?.first().ok_or(Error::InvalidType)?;
    Digest::try_from(first.try_bytes()?)
}

impl PartialEq for Envelope {
    fn eq(&self, other: &Self) -> bool {
        self.digest == other.digest
    }
}

impl Eq for Envelope {}

impl std::hash::Hash for Envelope {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.digest.hash(state);
    }
}

impl std::fmt::Debug for Envelope {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "Envelope({} {})", self.case.name(), self.digest.short())
    }
}

impl std::fmt::Display for Envelope {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str(&crate::diag::diagnostic(&self.to_value()))
    }
}

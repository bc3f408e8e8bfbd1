//! Structural elision: swapping subtrees for their digests and back.
//!
//! Because an elided envelope's digest *is* the digest of what it replaced,
//! every operation here preserves the digest of the root and of every
//! untouched ancestor.

use std::collections::{HashMap, HashSet};

use crate::digest::Digest;
use crate::error::{Error, Result};

use super::{Envelope, EnvelopeCase};

impl Envelope {
    /// Replace this whole envelope with its digest.
    pub fn elide(&self) -> Envelope {
        Envelope::elided(self.digest())
    }

    /// Elide every subtree whose digest is in `target`, leaving the rest of
    /// the structure intact. A matching assertion disappears whole; a match
    /// on just its predicate or object elides only that side.
    pub fn elide_removing(&self, target: &HashSet<Digest>) -> Envelope {
        if target.contains(&self.digest()) {
            return self.elide();
        }
        match self.case() {
            EnvelopeCase::Wrapped(inner) => inner.elide_removing(target).wrap(),
            EnvelopeCase::Assertion { predicate, object } => Envelope::assertion(
                predicate.elide_removing(target),
                object.elide_removing(target),
            ),
            EnvelopeCase::Node {
                subject,
                assertions,
            } => Envelope::node(
                subject.elide_removing(target),
                assertions
                    .iter()
                    .map(|a| a.elide_removing(target))
                    .collect(),
            ),
            _ => self.clone(),
        }
    }

    /// Keep only the subtrees on a path to a digest in `reveal`, eliding
    /// everything else. The root itself is always revealed; to expose a deep
    /// element, `reveal` must contain the digest of every envelope on the
    /// path down to it.
    pub fn elide_revealing(&self, reveal: &HashSet<Digest>) -> Envelope {
        match self.case() {
            EnvelopeCase::Wrapped(inner) => inner.reveal_child(reveal).wrap(),
            EnvelopeCase::Assertion { predicate, object } => Envelope::assertion(
                predicate.reveal_child(reveal),
                object.reveal_child(reveal),
            ),
            EnvelopeCase::Node {
                subject,
                assertions,
            } => Envelope::node(
                subject.reveal_child(reveal),
                assertions.iter().map(|a| a.reveal_child(reveal)).collect(),
            ),
            _ => self.clone(),
        }
    }

    // A child stays (and is recursively filtered) only if the reveal set
    // mentions it or something beneath it.
    fn reveal_child(&self, reveal: &HashSet<Digest>) -> Envelope {
        if self.mentions_any(reveal) {
            self.elide_revealing(reveal)
        } else {
            self.elide()
        }
    }

    // Whether this subtree or any descendant has a digest in `set`.
    fn mentions_any(&self, set: &HashSet<Digest>) -> bool {
        set.contains(&self.digest()) || self.children().iter().any(|c| c.mentions_any(set))
    }

    /// Restore every elided subtree of `self` from a fully populated `source`
    /// with the same digest, walking both in lockstep.
    pub fn unelide(&self, source: &Envelope) -> Result<Envelope> {
        if self.digest() != source.digest() {
            return Err(Error::InvalidType);
        }
        match (self.case(), source.case()) {
            (EnvelopeCase::Elided, _) => Ok(source.clone()),
            (EnvelopeCase::Wrapped(inner), EnvelopeCase::Wrapped(src)) => {
                Ok(inner.unelide(src)?.wrap())
            }
            (
                EnvelopeCase::Assertion { predicate, object },
                EnvelopeCase::Assertion {
                    predicate: src_p,
                    object: src_o,
                },
            ) => Ok(Envelope::assertion(
                predicate.unelide(src_p)?,
                object.unelide(src_o)?,
            )),
            (
                EnvelopeCase::Node {
                    subject,
                    assertions,
                },
                EnvelopeCase::Node {
                    subject: src_s,
                    assertions: src_a,
                },
            ) => {
                let subject = subject.unelide(src_s)?;
                let mut restored = Vec::with_capacity(assertions.len());
                for a in assertions {
                    // Equal node digests mean equal assertion digest sets
                    match src_a.iter().find(|s| s.digest() == a.digest()) {
                        Some(src) => restored.push(a.unelide(src)?),
                        None => restored.push(a.clone()),
                    }
                }
                Ok(Envelope::node(subject, restored))
            }
            _ => Ok(self.clone()),
        }
    }

    /// Restore elided subtrees from any number of candidate envelopes. Each
    /// elided node is replaced by the first source whose digest matches;
    /// restored subtrees are themselves scanned for further matches.
    pub fn walk_unelide<'a>(&self, sources: impl IntoIterator<Item = &'a Envelope>) -> Envelope {
        let mut by_digest: HashMap<Digest, Envelope> = HashMap::new();
        for source in sources {
            by_digest
                .entry(source.digest())
                .or_insert_with(|| source.clone());
        }
        self.walk_unelide_map(&by_digest)
    }

    fn walk_unelide_map(&self, sources: &HashMap<Digest, Envelope>) -> Envelope {
        match self.case() {
            EnvelopeCase::Elided => match sources.get(&self.digest()) {
                Some(src) if !src.is_elided() => src.walk_unelide_map(sources),
                _ => self.clone(),
            },
            EnvelopeCase::Wrapped(inner) => inner.walk_unelide_map(sources).wrap(),
            EnvelopeCase::Assertion { predicate, object } => Envelope::assertion(
                predicate.walk_unelide_map(sources),
                object.walk_unelide_map(sources),
            ),
            EnvelopeCase::Node {
                subject,
                assertions,
            } => Envelope::node(
                subject.walk_unelide_map(sources),
                assertions
                    .iter()
                    .map(|a| a.walk_unelide_map(sources))
                    .collect(),
            ),
            _ => self.clone(),
        }
    }
}

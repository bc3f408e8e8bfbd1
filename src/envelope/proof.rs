//! Inclusion proofs: minimal digest-preserving substructures.
//!
//! A proof for a set of target digests is a partial elision of the envelope
//! that keeps the same root digest while still containing a subtree for every
//! target. The holder of just the root digest can then confirm that the
//! targets exist somewhere inside the original.

use std::collections::{HashMap, HashSet};

use crate::digest::Digest;

use super::Envelope;

impl Envelope {
    /// Build the minimal proof that every digest in `targets` occurs in this
    /// envelope, or `None` if some target doesn't.
    pub fn proof_contains_set(&self, targets: &HashSet<Digest>) -> Option<Envelope> {
        let mut paths: HashMap<Digest, Vec<Digest>> = HashMap::new();
        collect_paths(self, &mut Vec::new(), &mut paths);

        let mut reveal: HashSet<Digest> = HashSet::new();
        for target in targets {
            reveal.extend(paths.get(target)?.iter().copied());
        }
        // Expose the ancestor paths, then elide the targets themselves: their
        // digests stay present, their content doesn't
        Some(self.elide_revealing(&reveal).elide_removing(targets))
    }

    /// Build the minimal proof that `target` occurs in this envelope.
    pub fn proof_contains(&self, target: &Envelope) -> Option<Envelope> {
        self.proof_contains_set(&HashSet::from([target.digest()]))
    }

    /// Check a proof against this envelope's digest: the proof must have the
    /// same root digest and contain a subtree for every target. Only the root
    /// digest of `self` is consulted, never its content.
    pub fn confirm_contains_set(&self, targets: &HashSet<Digest>, proof: &Envelope) -> bool {
        if self.digest() != proof.digest() {
            return false;
        }
        let reachable = proof.digests();
        targets.iter().all(|t| reachable.contains(t))
    }

    /// Check a proof for a single target.
    pub fn confirm_contains(&self, target: &Envelope, proof: &Envelope) -> bool {
        self.confirm_contains_set(&HashSet::from([target.digest()]), proof)
    }
}

// Record, for every subtree, the digests of its ancestor chain from the root
// down to and including itself. First sighting wins for shared subtrees.
fn collect_paths(env: &Envelope, path: &mut Vec<Digest>, out: &mut HashMap<Digest, Vec<Digest>>) {
    path.push(env.digest());
    if !out.contains_key(&env.digest()) {
        out.insert(env.digest(), path.clone());
        for child in env.children() {
            collect_paths(child, path, out);
        }
    }
    path.pop();
}

//! A cooperative visitor over envelope structure, mirroring the CBOR walker
//! but with envelope-specific edges.

use super::{Envelope, EnvelopeCase};

/// The edge the walker took from the parent envelope.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EnvelopeEdge {
    /// The root of the walk.
    None,
    /// A node's subject.
    Subject,
    /// One of a node's assertions.
    Assertion,
    /// An assertion's predicate.
    Predicate,
    /// An assertion's object.
    Object,
    /// The envelope inside a wrapped envelope.
    Content,
}

impl EnvelopeEdge {
    /// The short label used in tree output, if this edge carries one.
    pub fn label(&self) -> Option<&'static str> {
        match self {
            EnvelopeEdge::None | EnvelopeEdge::Assertion => None,
            EnvelopeEdge::Subject => Some("subj"),
            EnvelopeEdge::Predicate => Some("pred"),
            EnvelopeEdge::Object => Some("obj"),
            EnvelopeEdge::Content => Some("cont"),
        }
    }
}

impl Envelope {
    /// Walk the envelope depth-first. The visitor receives each envelope, its
    /// depth, the incoming edge, and the state its parent produced; it
    /// returns the state for descendants plus a stop-descent flag that skips
    /// children while continuing with siblings.
    pub fn walk<S, F>(&self, state: S, visit: &mut F)
    where
        S: Clone,
        F: FnMut(&Envelope, usize, EnvelopeEdge, S) -> (S, bool),
    {
        self.walk_inner(0, EnvelopeEdge::None, state, visit);
    }

    fn walk_inner<S, F>(&self, depth: usize, edge: EnvelopeEdge, state: S, visit: &mut F)
    where
        S: Clone,
        F: FnMut(&Envelope, usize, EnvelopeEdge, S) -> (S, bool),
    {
        let (state, stop) = visit(self, depth, edge, state);
        if stop {
            return;
        }
        match self.case() {
            EnvelopeCase::Wrapped(inner) => {
                inner.walk_inner(depth + 1, EnvelopeEdge::Content, state, visit);
            }
            EnvelopeCase::Assertion { predicate, object } => {
                predicate.walk_inner(depth + 1, EnvelopeEdge::Predicate, state.clone(), visit);
                object.walk_inner(depth + 1, EnvelopeEdge::Object, state, visit);
            }
            EnvelopeCase::Node {
                subject,
                assertions,
            } => {
                subject.walk_inner(depth + 1, EnvelopeEdge::Subject, state.clone(), visit);
                for assertion in assertions {
                    assertion.walk_inner(
                        depth + 1,
                        EnvelopeEdge::Assertion,
                        state.clone(),
                        visit,
                    );
                }
            }
            _ => (),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn visits_every_edge() {
        let e = Envelope::new("Alice").add_assertion_for("knows", "Bob");
        let log = std::cell::RefCell::new(Vec::new());
        e.walk((), &mut |env, depth, edge, state| {
            log.borrow_mut().push((depth, edge, env.case().name()));
            (state, false)
        });
        assert_eq!(
            log.into_inner(),
            vec![
                (0, EnvelopeEdge::None, "NODE"),
                (1, EnvelopeEdge::Subject, "LEAF"),
                (1, EnvelopeEdge::Assertion, "ASSERTION"),
                (2, EnvelopeEdge::Predicate, "LEAF"),
                (2, EnvelopeEdge::Object, "LEAF"),
            ]
        );
    }

    #[test]
    fn stop_descent_prunes_assertions() {
        let e = Envelope::new("Alice")
            .add_assertion_for("knows", "Bob")
            .add_assertion_for("knows", "Carol");
        let count = std::cell::RefCell::new(0usize);
        e.walk((), &mut |env, _depth, _edge, state| {
            *count.borrow_mut() += 1;
            (state, env.is_assertion())
        });
        // Root + subject + two assertion heads, but none of their sides
        assert_eq!(count.into_inner(), 4);
    }

    #[test]
    fn wrapped_content_edge() {
        let e = Envelope::new("x").wrap();
        let log = std::cell::RefCell::new(Vec::new());
        e.walk((), &mut |_env, depth, edge, state| {
            log.borrow_mut().push((depth, edge));
            (state, false)
        });
        assert_eq!(
            log.into_inner(),
            vec![(0, EnvelopeEdge::None), (1, EnvelopeEdge::Content)]
        );
    }
}

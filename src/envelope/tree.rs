//! Tree-format rendering of envelope structure.
//!
//! One line per envelope: a 7-character digest prefix, the incoming edge
//! label where one exists, and either the shape name or a leaf summary.
//! Indentation is two spaces per level.

use crate::registry::{with_tags, TagRegistry};

use super::{Envelope, EnvelopeCase};

impl Envelope {
    /// Render the envelope's structure as an indented tree, resolving tag
    /// names through the process-wide registry.
    pub fn format_tree(&self) -> String {
        with_tags(|tags| self.format_tree_with(tags))
    }

    /// Render the tree against an explicit registry.
    pub fn format_tree_with(&self, tags: &TagRegistry) -> String {
        let out = std::cell::RefCell::new(String::new());
        self.walk((), &mut |env: &Envelope, depth, edge, state: ()| {
            let mut out = out.borrow_mut();
            for _ in 0..depth {
                out.push_str("  ");
            }
            out.push_str(&env.digest().short());
            out.push(' ');
            if let Some(label) = edge.label() {
                out.push_str(label);
                out.push(' ');
            }
            out.push_str(&env.summary(tags));
            out.push('\n');
            (state, false)
        });
        out.into_inner()
    }

    // One-line description: leaves render their value, everything else its
    // shape name.
    fn summary(&self, tags: &TagRegistry) -> String {
        match self.case() {
            EnvelopeCase::Leaf(v) => crate::diag::diagnostic_with(v, tags, false),
            case => case.name().to_string(),
        }
    }

    /// The envelope's wire form in single-line diagnostic notation.
    pub fn diagnostic(&self) -> String {
        crate::diag::diagnostic(&self.to_value())
    }

    /// The envelope's wire form in multi-line diagnostic notation.
    pub fn diagnostic_pretty(&self) -> String {
        crate::diag::diagnostic_pretty(&self.to_value())
    }
}

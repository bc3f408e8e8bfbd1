//! The tag registry used for diagnostic output.
//!
//! A registry maps tag numbers to display names and optional summarisers.
//! It never influences encoding, decoding, or digests; unknown tags
//! round-trip unchanged and render by number. One process-wide registry
//! exists as a convenient default, but every rendering entry point also
//! accepts an explicit registry.

use std::collections::HashMap;
use std::sync::{Arc, LazyLock, RwLock};

use crate::envelope::cbor as envelope_tags;
use crate::value::Value;

/// Renders a one-line summary of a tag's payload in place of the default
/// recursive rendering.
pub type Summarizer = Arc<dyn Fn(&Value) -> String + Send + Sync>;

/// A mapping from tag numbers to display names and summarisers.
#[derive(Clone, Default)]
pub struct TagRegistry {
    names: HashMap<u64, String>,
    numbers: HashMap<String, u64>,
    summarizers: HashMap<u64, Summarizer>,
}

impl TagRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a display name for a tag, replacing any previous name.
    pub fn insert(&mut self, tag: u64, name: impl Into<String>) {
        let name = name.into();
        if let Some(old) = self.names.insert(tag, name.clone()) {
            self.numbers.remove(&old);
        }
        self.numbers.insert(name, tag);
    }

    /// Register a batch of names.
    pub fn insert_all<S: Into<String>>(&mut self, tags: impl IntoIterator<Item = (u64, S)>) {
        for (tag, name) in tags {
            self.insert(tag, name);
        }
    }

    /// Remove a tag's name and summariser.
    pub fn remove(&mut self, tag: u64) {
        if let Some(old) = self.names.remove(&tag) {
            self.numbers.remove(&old);
        }
        self.summarizers.remove(&tag);
    }

    /// The registered name for a tag, if any.
    pub fn name(&self, tag: u64) -> Option<&str> {
        self.names.get(&tag).map(|s| s.as_str())
    }

    /// Look a tag number up by its registered name.
    pub fn tag_named(&self, name: &str) -> Option<u64> {
        self.numbers.get(name).copied()
    }

    /// Register a payload summariser for a tag.
    pub fn set_summarizer(
        &mut self,
        tag: u64,
        summarizer: impl Fn(&Value) -> String + Send + Sync + 'static,
    ) {
        self.summarizers.insert(tag, Arc::new(summarizer));
    }

    /// Run the tag's summariser over a payload, if one is registered.
    pub fn summarize(&self, tag: u64, payload: &Value) -> Option<String> {
        self.summarizers.get(&tag).map(|f| f(payload))
    }

    /// The tag's display label: its registered name, or its numeric form.
    pub fn label(&self, tag: u64) -> String {
        match self.name(tag) {
            Some(name) => name.to_string(),
            None => tag.to_string(),
        }
    }
}

static GLOBAL: LazyLock<RwLock<TagRegistry>> = LazyLock::new(|| {
    let mut registry = TagRegistry::new();
    registry.insert(1, "date");
    registry.insert(envelope_tags::TAG_ENCODED_CBOR, "encoded-cbor");
    registry.insert(envelope_tags::TAG_ENVELOPE, "envelope");
    registry.insert(envelope_tags::TAG_ELIDED, "elided");
    registry.insert(envelope_tags::TAG_ENCRYPTED, "encrypted");
    registry.insert(envelope_tags::TAG_COMPRESSED, "compressed");
    registry.insert(envelope_tags::TAG_NODE, "node");
    registry.insert(envelope_tags::TAG_ASSERTION, "assertion");
    registry.insert(envelope_tags::TAG_WRAPPED, "wrapped-envelope");
    RwLock::new(registry)
});

/// Run a closure against the process-wide registry.
pub fn with_tags<R>(f: impl FnOnce(&TagRegistry) -> R) -> R {
    f(&GLOBAL.read().expect("tag registry poisoned"))
}

/// Run a closure against the process-wide registry with write access.
pub fn with_tags_mut<R>(f: impl FnOnce(&mut TagRegistry) -> R) -> R {
    f(&mut GLOBAL.write().expect("tag registry poisoned"))
}

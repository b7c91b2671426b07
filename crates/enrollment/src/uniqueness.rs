//! Last-edit-wins model for the remote CPF-uniqueness check.
//!
//! Every CPF edit produces a new tag; the existence request eventually issued
//! for that edit carries the tag, and a response is applied only if its tag
//! still matches the latest edit. There is no request cancellation; a
//! superseded response is simply discarded, so a slow answer for an old value
//! can never overwrite the state of the current one.

/// Tag identifying one edit generation of the probed value.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ProbeTag(u64);

/// Tracks the probed value, its edit generation and the latest applied result.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UniquenessProbe {
    generation: u64,
    value: String,
    exists: Option<bool>,
}

impl UniquenessProbe {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an edit: bumps the generation and clears any previous result
    /// (the old answer is for an old value).
    pub fn edit(&mut self, value: impl Into<String>) -> ProbeTag {
        self.generation += 1;
        self.value = value.into();
        self.exists = None;
        ProbeTag(self.generation)
    }

    /// The value the latest tag refers to.
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Tag of the latest edit (what a freshly issued request should carry).
    pub fn current_tag(&self) -> ProbeTag {
        ProbeTag(self.generation)
    }

    /// Whether `tag` still refers to the latest edit.
    pub fn is_current(&self, tag: ProbeTag) -> bool {
        tag.0 == self.generation
    }

    /// Apply a response for `tag`. Stale responses are discarded; returns
    /// whether the result was applied.
    pub fn resolve(&mut self, tag: ProbeTag, exists: bool) -> bool {
        if !self.is_current(tag) {
            return false;
        }
        self.exists = Some(exists);
        true
    }

    /// Latest applied result (`None` while unresolved).
    pub fn exists(&self) -> Option<bool> {
        self.exists
    }
}

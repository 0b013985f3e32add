use std::collections::HashSet;

/// Normalized URLs already claimed for fetching in this session
///
/// Append-only: nothing is ever removed once inserted.
#[derive(Debug, Clone, Default)]
pub struct VisitedSet {
    urls: HashSet<String>,
}

impl VisitedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a normalized URL; returns false if it was already present
    pub fn insert(&mut self, normalized: impl Into<String>) -> bool {
        self.urls.insert(normalized.into())
    }

    pub fn contains(&self, normalized: &str) -> bool {
        self.urls.contains(normalized)
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }
}

use dashmap::DashMap;
use lazy_static::lazy_static;
use std::sync::Arc;

use crate::fingerprint::Fingerprint;

/// Process-wide summary cache
///
/// Shared by every orchestrator built with [`SummaryCache::global`] and lives
/// until the process exits.
lazy_static! {
    static ref GLOBAL_CACHE: Arc<SummaryCache> = Arc::new(SummaryCache::new());
}

/// In-memory map from dataset fingerprint to computed summary
///
/// Entries are never evicted. Concurrent writers for the same fingerprint
/// store equal summaries, so last write wins.
#[derive(Debug, Default)]
pub struct SummaryCache {
    entries: DashMap<Fingerprint, String>,
}

impl SummaryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The cache shared across the whole process
    pub fn global() -> Arc<SummaryCache> {
        Arc::clone(&GLOBAL_CACHE)
    }

    /// Look up a previously computed summary
    ///
    /// # Arguments
    /// * `fingerprint` - Key of the dataset
    ///
    /// # Returns
    /// * `Option<String>` - The cached summary, if any
    pub fn get(&self, fingerprint: &Fingerprint) -> Option<String> {
        self.entries
            .get(fingerprint)
            .map(|entry| entry.value().clone())
    }

    /// Store a summary, replacing any existing entry for the key
    pub fn put(&self, fingerprint: Fingerprint, summary: String) {
        self.entries.insert(fingerprint, summary);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&self) {
        self.entries.clear();
    }
}

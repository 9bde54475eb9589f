//! Pre-mutation byte preservation
//!
//! A [`BackupSet`] maps a path to the bytes it held before its first
//! mutation during an operation. Recording is lazy: only the first capture
//! for a given path sticks, so the set always holds the true baseline even
//! when the same entry is patched repeatedly. Restore consumes the set
//! wholesale.

use std::collections::HashMap;

/// Preserved pre-mutation bytes, keyed by original path
#[derive(Debug, Default)]
pub struct BackupSet {
    entries: HashMap<String, Vec<u8>>,
}

impl BackupSet {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the baseline bytes for a path
    ///
    /// Only the first record for a given path is kept.
    pub fn record<S: Into<String>>(&mut self, path: S, bytes: Vec<u8>) {
        self.entries.entry(path.into()).or_insert(bytes);
    }

    /// Whether a baseline is already recorded for this path
    pub fn contains(&self, path: &str) -> bool {
        self.entries.contains_key(path)
    }

    /// The preserved bytes for a path, if recorded
    pub fn get(&self, path: &str) -> Option<&[u8]> {
        self.entries.get(path).map(Vec::as_slice)
    }

    /// Number of recorded paths
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing has been recorded
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drain every recorded (path, bytes) pair, in sorted path order
    ///
    /// Leaves the set empty, which is what makes restore idempotent.
    pub fn drain_sorted(&mut self) -> Vec<(String, Vec<u8>)> {
        let mut drained: Vec<_> = self.entries.drain().collect();
        drained.sort_by(|a, b| a.0.cmp(&b.0));
        drained
    }
}

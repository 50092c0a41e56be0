//! Per-run accumulation of phase outputs
//!
//! The store is created fresh for every pipeline run and passed explicitly to
//! the components that need it; nothing is process-wide, so independent runs
//! cannot interfere.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Phase output already recorded for id: {0}")]
    DuplicateKey(String),
    #[error("No phase output recorded for id: {0}")]
    NotFound(String),
}

/// One recorded phase output, in insertion order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ContextEntry {
    /// Phase id the output belongs to
    pub id: String,
    /// Text produced by the phase
    pub output: String,
    /// Monotonically increasing insertion sequence number
    pub seq: u64,
}

/// Ordered mapping from phase id to produced output.
///
/// An id is written at most once per run; insertion order is the only
/// ordering guarantee. Mutated only by the executor after a phase completes
/// successfully.
#[derive(Debug, Default)]
pub struct ContextStore {
    entries: Vec<ContextEntry>,
    next_seq: u64,
}

impl ContextStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a phase output. Fails if `id` was already written.
    pub fn put(&mut self, id: impl Into<String>, output: impl Into<String>) -> Result<(), StoreError> {
        let id = id.into();
        if self.entries.iter().any(|e| e.id == id) {
            return Err(StoreError::DuplicateKey(id));
        }

        let seq = self.next_seq;
        self.next_seq += 1;
        self.entries.push(ContextEntry {
            id,
            output: output.into(),
            seq,
        });
        Ok(())
    }

    /// Looks up the output recorded for `id`.
    pub fn get(&self, id: &str) -> Result<&str, StoreError> {
        self.entries
            .iter()
            .find(|e| e.id == id)
            .map(|e| e.output.as_str())
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.iter().any(|e| e.id == id)
    }

    /// Returns the ordered entries as of call time.
    ///
    /// The snapshot is an owned copy, safe to hand to selectors or readers on
    /// other threads.
    pub fn snapshot(&self) -> Vec<ContextEntry> {
        self.entries.clone()
    }

    /// Ordered `(id, output)` pairs, as needed by report rendering.
    pub fn pairs(&self) -> Vec<(String, String)> {
        self.entries
            .iter()
            .map(|e| (e.id.clone(), e.output.clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_and_get() {
        let mut store = ContextStore::new();
        store.put("theme", "THEME_OUT").unwrap();

        assert_eq!(store.get("theme").unwrap(), "THEME_OUT");
        assert!(store.contains("theme"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_duplicate_key_rejected() {
        let mut store = ContextStore::new();
        store.put("theme", "first").unwrap();

        let err = store.put("theme", "second").unwrap_err();
        assert_eq!(err, StoreError::DuplicateKey("theme".to_string()));

        // First write is untouched
        assert_eq!(store.get("theme").unwrap(), "first");
    }

    #[test]
    fn test_get_missing() {
        let store = ContextStore::new();
        let err = store.get("absent").unwrap_err();
        assert_eq!(err, StoreError::NotFound("absent".to_string()));
    }

    #[test]
    fn test_snapshot_preserves_insertion_order() {
        let mut store = ContextStore::new();
        store.put("zebra", "z").unwrap();
        store.put("alpha", "a").unwrap();
        store.put("mango", "m").unwrap();

        let snapshot = store.snapshot();
        let ids: Vec<&str> = snapshot.iter().map(|e| e.id.as_str()).collect();
        // Insertion order, not alphabetical
        assert_eq!(ids, vec!["zebra", "alpha", "mango"]);
    }

    #[test]
    fn test_sequence_numbers_increase() {
        let mut store = ContextStore::new();
        store.put("a", "1").unwrap();
        store.put("b", "2").unwrap();
        store.put("c", "3").unwrap();

        let seqs: Vec<u64> = store.snapshot().iter().map(|e| e.seq).collect();
        assert_eq!(seqs, vec![0, 1, 2]);
    }

    #[test]
    fn test_snapshot_is_detached() {
        let mut store = ContextStore::new();
        store.put("a", "1").unwrap();

        let snapshot = store.snapshot();
        store.put("b", "2").unwrap();

        assert_eq!(snapshot.len(), 1);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_pairs() {
        let mut store = ContextStore::new();
        store.put("theme", "THEME_OUT").unwrap();
        store.put("budget", "BUDGET_OUT").unwrap();

        assert_eq!(
            store.pairs(),
            vec![
                ("theme".to_string(), "THEME_OUT".to_string()),
                ("budget".to_string(), "BUDGET_OUT".to_string()),
            ]
        );
    }
}

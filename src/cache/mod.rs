//! Bounded memory of dispatched post identifiers
//!
//! [`SeenCache`] is an insertion-ordered set holding at most `capacity` ids.
//! Recording a new id beyond capacity evicts the oldest one (FIFO). Lookups
//! never refresh an entry's position, so this is not an LRU.
//!
//! # Example
//!
//! ```
//! use postwatch::cache::SeenCache;
//!
//! let mut seen = SeenCache::new(2);
//! seen.record("a".to_string());
//! seen.record("b".to_string());
//! seen.record("c".to_string());
//!
//! assert!(!seen.contains("a"));
//! assert_eq!(seen.iter().collect::<Vec<_>>(), vec!["b", "c"]);
//! ```

use std::collections::{HashSet, VecDeque};

/// Default number of ids remembered
pub const DEFAULT_CAPACITY: usize = 50;

/// Insertion-ordered, bounded set of post ids
#[derive(Debug, Clone)]
pub struct SeenCache {
    /// Ids in insertion order, oldest at the front
    order: VecDeque<String>,

    /// Membership index over `order`
    index: HashSet<String>,

    /// Maximum number of ids held
    capacity: usize,
}

impl SeenCache {
    /// Create an empty cache holding at most `capacity` ids
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            order: VecDeque::with_capacity(capacity),
            index: HashSet::with_capacity(capacity),
            capacity,
        }
    }

    /// Check whether an id has been recorded
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.index.contains(id)
    }

    /// Record an id, evicting the oldest entry once over capacity
    ///
    /// Returns `false` if the id was already present; its position is left
    /// unchanged in that case.
    pub fn record(&mut self, id: String) -> bool {
        if self.index.contains(&id) {
            return false;
        }

        self.index.insert(id.clone());
        self.order.push_back(id);

        while self.order.len() > self.capacity {
            if let Some(evicted) = self.order.pop_front() {
                self.index.remove(&evicted);
                tracing::trace!(id = %evicted, "Evicted oldest seen id");
            }
        }

        true
    }

    /// Number of ids currently held
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Check if the cache is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Maximum number of ids held
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Iterate ids from oldest to newest
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }
}

impl Default for SeenCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_record_and_contains() {
        let mut seen = SeenCache::new(3);
        assert!(seen.is_empty());

        assert!(seen.record("a".to_string()));
        assert!(seen.contains("a"));
        assert!(!seen.contains("b"));
        assert_eq!(seen.len(), 1);
    }

    #[test]
    fn test_fifo_eviction() {
        let mut seen = SeenCache::new(3);
        for id in ["a", "b", "c", "d"] {
            seen.record(id.to_string());
        }

        assert_eq!(seen.len(), 3);
        assert!(!seen.contains("a"));
        assert_eq!(seen.iter().collect::<Vec<_>>(), vec!["b", "c", "d"]);
    }

    #[test]
    fn test_lookup_does_not_refresh() {
        let mut seen = SeenCache::new(2);
        seen.record("a".to_string());
        seen.record("b".to_string());

        // Touching "a" must not protect it from eviction
        assert!(seen.contains("a"));
        seen.record("c".to_string());

        assert!(!seen.contains("a"));
        assert!(seen.contains("b"));
    }

    #[test]
    fn test_duplicate_record_keeps_order() {
        let mut seen = SeenCache::new(3);
        seen.record("a".to_string());
        seen.record("b".to_string());

        assert!(!seen.record("a".to_string()));
        assert_eq!(seen.iter().collect::<Vec<_>>(), vec!["a", "b"]);
    }

    #[test]
    fn test_zero_capacity_holds_nothing() {
        let mut seen = SeenCache::new(0);
        seen.record("a".to_string());
        assert!(seen.is_empty());
        assert!(!seen.contains("a"));
    }

    #[test]
    fn test_default_capacity() {
        assert_eq!(SeenCache::default().capacity(), DEFAULT_CAPACITY);
    }

    proptest! {
        #[test]
        fn prop_holds_most_recent_n(capacity in 1usize..64, extra in 1usize..64) {
            let mut seen = SeenCache::new(capacity);
            let total = capacity + extra;
            for i in 0..total {
                seen.record(format!("post-{i}"));
            }

            prop_assert_eq!(seen.len(), capacity);
            let expected: Vec<String> = (extra..total).map(|i| format!("post-{i}")).collect();
            let held: Vec<String> = seen.iter().map(str::to_string).collect();
            prop_assert_eq!(held, expected);
        }
    }
}

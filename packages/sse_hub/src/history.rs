//! Bounded, insertion-direction-aware event history.
//!
//! Every stream connection and every direct binding keeps one of these: an
//! ordered record of delivered items with a hard capacity. Pushing past
//! capacity evicts exactly one item from the opposite end, so the most
//! recently pushed item is always retained.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

/// Which end of the history new items land on.
///
/// Shared connections always append; direct bindings follow the target's
/// configured mode.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Append,
    Prepend,
}

/// A fixed-capacity ordered buffer of delivered items.
#[derive(Clone, Debug)]
pub struct BoundedHistory<T> {
    items: VecDeque<T>,
    capacity: usize,
}

impl<T> BoundedHistory<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            items: VecDeque::with_capacity(capacity.min(64)),
            capacity,
        }
    }

    /// Push an item onto the `mode` end, evicting from the opposite end when
    /// over capacity.
    ///
    /// Returns the evicted item so callers can pair the eviction with an
    /// external effect (e.g. detaching a rendered child) in the same step.
    /// With `capacity == 0` the pushed item itself comes straight back and
    /// nothing is stored.
    pub fn push(&mut self, item: T, mode: Mode) -> Option<T> {
        if self.capacity == 0 {
            return Some(item);
        }

        match mode {
            Mode::Append => {
                self.items.push_back(item);
                if self.items.len() > self.capacity {
                    self.items.pop_front()
                } else {
                    None
                }
            }
            Mode::Prepend => {
                self.items.push_front(item);
                if self.items.len() > self.capacity {
                    self.items.pop_back()
                } else {
                    None
                }
            }
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }
}

impl<T: Clone> BoundedHistory<T> {
    /// Immutable copy of the current contents in order. Consumers only ever
    /// see these copies, never the live buffer.
    pub fn snapshot(&self) -> Vec<T> {
        self.items.iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_evicts_oldest() {
        let mut h = BoundedHistory::new(3);
        for n in [1, 2, 3, 4] {
            h.push(n, Mode::Append);
        }
        assert_eq!(h.snapshot(), vec![2, 3, 4]);
    }

    #[test]
    fn prepend_evicts_newest_end() {
        let mut h = BoundedHistory::new(3);
        for n in [1, 2, 3, 4] {
            h.push(n, Mode::Prepend);
        }
        assert_eq!(h.snapshot(), vec![4, 3, 2]);
    }

    #[test]
    fn push_returns_evicted_item() {
        let mut h = BoundedHistory::new(2);
        assert_eq!(h.push("a", Mode::Append), None);
        assert_eq!(h.push("b", Mode::Append), None);
        assert_eq!(h.push("c", Mode::Append), Some("a"));
        assert_eq!(h.push("d", Mode::Prepend), Some("c"));
        assert_eq!(h.snapshot(), vec!["d", "b"]);
    }

    #[test]
    fn zero_capacity_stores_nothing() {
        let mut h = BoundedHistory::new(0);
        assert_eq!(h.push(1, Mode::Append), Some(1));
        assert_eq!(h.push(2, Mode::Prepend), Some(2));
        assert!(h.is_empty());
        assert!(h.snapshot().is_empty());
    }

    #[test]
    fn never_exceeds_capacity() {
        let mut h = BoundedHistory::new(5);
        for n in 0..100 {
            h.push(n, Mode::Append);
            assert!(h.len() <= 5);
        }
        assert_eq!(h.snapshot(), vec![95, 96, 97, 98, 99]);
    }

    #[test]
    fn snapshot_does_not_alias_storage() {
        let mut h = BoundedHistory::new(4);
        h.push(1, Mode::Append);
        let mut snap = h.snapshot();
        snap.push(99);
        assert_eq!(h.len(), 1);
        assert_eq!(h.snapshot(), vec![1]);
    }
}

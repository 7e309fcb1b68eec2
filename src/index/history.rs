//! Label History - the versioned labels of a single code
//!
//! Entries are kept in build order. The loader hands rows over sorted
//! ascending by effective-from, so build order is also time order.
//!
//! # Example
//! ```ignore
//! // ASN 681 renamed at 1592346088
//! // [(0, "University of Waikato, NZ"), (1592346088, "Quigley College, NZ")]
//! history.resolve(1600000000) == Some("Quigley College, NZ")
//! ```

use serde::{Deserialize, Serialize};

/// One (effective-from, label) pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelEntry {
    /// Unix timestamp (seconds) from which the label applies
    pub effective_from: i64,
    /// Human-readable label
    pub label: String,
}

impl LabelEntry {
    pub fn new(effective_from: i64, label: impl Into<String>) -> Self {
        Self {
            effective_from,
            label: label.into(),
        }
    }
}

/// Ordered label history for one code
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelHistory {
    entries: Vec<LabelEntry>,
}

impl LabelHistory {
    /// Create a history holding a single entry
    pub fn starting(effective_from: i64, label: impl Into<String>) -> Self {
        Self {
            entries: vec![LabelEntry::new(effective_from, label)],
        }
    }

    /// Append an entry in arrival order
    pub fn push(&mut self, effective_from: i64, label: impl Into<String>) {
        self.entries.push(LabelEntry::new(effective_from, label));
    }

    /// Find the label in force at `at`
    ///
    /// Walks from the newest entry backwards and returns the first one whose
    /// effective-from is not after `at`. For live data that is almost always
    /// the last entry. Among entries sharing an effective-from, the one
    /// appended last wins.
    pub fn resolve(&self, at: i64) -> Option<&str> {
        self.entries
            .iter()
            .rev()
            .find(|entry| entry.effective_from <= at)
            .map(|entry| entry.label.as_str())
    }

    /// The most recently appended entry
    pub fn latest(&self) -> Option<&LabelEntry> {
        self.entries.last()
    }

    pub fn entries(&self) -> &[LabelEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether entries are ascending by effective-from
    pub fn is_sorted(&self) -> bool {
        self.entries
            .windows(2)
            .all(|pair| pair[0].effective_from <= pair[1].effective_from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_entry() {
        let history = LabelHistory::starting(100, "Europe");

        assert_eq!(history.resolve(100), Some("Europe"));
        assert_eq!(history.resolve(i64::MAX), Some("Europe"));
        assert_eq!(history.resolve(99), None);
    }

    #[test]
    fn test_rename_picks_closest_preceding() {
        let mut history = LabelHistory::starting(0, "University of Waikato, NZ");
        history.push(1_592_346_088, "Quigley College, NZ");

        assert_eq!(history.resolve(1_592_346_087), Some("University of Waikato, NZ"));
        assert_eq!(history.resolve(1_592_346_088), Some("Quigley College, NZ"));
        assert_eq!(history.latest().map(|e| e.effective_from), Some(1_592_346_088));
    }

    #[test]
    fn test_duplicate_start_later_entry_wins() {
        let mut history = LabelHistory::starting(100, "A");
        history.push(100, "B");
        history.push(200, "C");

        assert_eq!(history.resolve(150), Some("B"));
        assert_eq!(history.resolve(100), Some("B"));
        assert_eq!(history.resolve(250), Some("C"));
        assert_eq!(history.resolve(50), None);
        assert_eq!(history.len(), 3);
    }

    #[test]
    fn test_is_sorted() {
        let mut history = LabelHistory::starting(10, "x");
        history.push(10, "y");
        assert!(history.is_sorted());

        history.push(5, "z");
        assert!(!history.is_sorted());
    }
}

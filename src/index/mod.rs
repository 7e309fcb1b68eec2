//! Temporal Label Indexes
//!
//! In-memory structures mapping a code to the label that was in force at a
//! given moment:
//!
//! - **LabelHistory**: ordered (effective-from, label) entries for one code
//! - **TemporalLabelIndex**: code → LabelHistory for one code-space
//! - **continents**: the compiled-in continent table
//!
//! # Architecture
//!
//! ```text
//! Rows (ORDER BY apply_from) → group by code → HashMap<code, LabelHistory>
//!
//! resolve("681", t):
//!   history = [(0, "Waikato"), (1592346088, "Quigley")]
//!                                  ↑ scan starts here, walks back
//! ```

mod continents;
mod history;
mod temporal;

pub use continents::{
    continent_index, continent_rows, CONTINENTS, CONTINENT_SOURCE, CONTINENT_TARGET,
};
pub use history::{LabelEntry, LabelHistory};
pub use temporal::TemporalLabelIndex;

use serde::{Deserialize, Serialize};

/// One raw mapping row as read from a label source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingRow {
    pub code: String,
    pub label: String,
    /// Unix timestamp (seconds) from which the label applies
    pub effective_from: i64,
}

impl MappingRow {
    pub fn new(code: impl Into<String>, label: impl Into<String>, effective_from: i64) -> Self {
        Self {
            code: code.into(),
            label: label.into(),
            effective_from,
        }
    }
}

/// Size statistics for an index
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IndexStats {
    /// Number of distinct codes
    pub codes: usize,
    /// Total history entries across all codes
    pub entries: usize,
    /// Longest single history
    pub max_history: usize,
}

impl std::fmt::Display for IndexStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} codes, {} entries (longest history {})",
            self.codes, self.entries, self.max_history
        )
    }
}

//! Temporal Label Index - code → label history for one code-space
//!
//! One index serves one taggable attribute (e.g. `country_code`). It knows
//! which tag it reads the code from and which tag the label is written to.
//!
//! # Design Notes
//! - Built wholesale from a row stream, never patched afterwards
//! - Rows must arrive ascending by effective-from; this is not checked
//! - Resolution is a backward scan of a short per-code history

use crate::index::history::LabelHistory;
use crate::index::{IndexStats, MappingRow};
use std::collections::HashMap;

/// Point-in-time label lookup for a single code-space
#[derive(Debug, Clone)]
pub struct TemporalLabelIndex {
    /// Tag the code is read from (e.g. "country_code")
    source_attribute: String,
    /// Tag the label is written to (e.g. "country_label")
    target_attribute: String,
    /// code → history
    histories: HashMap<String, LabelHistory>,
}

impl TemporalLabelIndex {
    /// Create an empty index
    pub fn new(source_attribute: impl Into<String>, target_attribute: impl Into<String>) -> Self {
        Self {
            source_attribute: source_attribute.into(),
            target_attribute: target_attribute.into(),
            histories: HashMap::new(),
        }
    }

    /// Create an index populated from `rows`
    ///
    /// `rows` must be ascending by `effective_from`; ties keep arrival order.
    pub fn build<I>(
        source_attribute: impl Into<String>,
        target_attribute: impl Into<String>,
        rows: I,
    ) -> Self
    where
        I: IntoIterator<Item = MappingRow>,
    {
        let mut index = Self::new(source_attribute, target_attribute);
        index.histories = Self::group(rows);
        index
    }

    /// Replace every history with the ones built from `rows`
    pub fn rebuild<I>(&mut self, rows: I)
    where
        I: IntoIterator<Item = MappingRow>,
    {
        self.histories = Self::group(rows);
    }

    /// Same attributes, new contents
    pub fn rebuilt<I>(&self, rows: I) -> Self
    where
        I: IntoIterator<Item = MappingRow>,
    {
        Self::build(
            self.source_attribute.clone(),
            self.target_attribute.clone(),
            rows,
        )
    }

    fn group<I>(rows: I) -> HashMap<String, LabelHistory>
    where
        I: IntoIterator<Item = MappingRow>,
    {
        let mut histories: HashMap<String, LabelHistory> = HashMap::new();

        for row in rows {
            histories
                .entry(row.code)
                .or_default()
                .push(row.effective_from, row.label);
        }

        histories
    }

    /// Label for `code` in force at `at`, if any
    pub fn resolve(&self, code: &str, at: i64) -> Option<&str> {
        self.histories.get(code)?.resolve(at)
    }

    /// Full history for a code
    pub fn history(&self, code: &str) -> Option<&LabelHistory> {
        self.histories.get(code)
    }

    pub fn source_attribute(&self) -> &str {
        &self.source_attribute
    }

    pub fn target_attribute(&self) -> &str {
        &self.target_attribute
    }

    /// Number of distinct codes
    pub fn len(&self) -> usize {
        self.histories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.histories.is_empty()
    }

    pub fn stats(&self) -> IndexStats {
        IndexStats {
            codes: self.histories.len(),
            entries: self.histories.values().map(LabelHistory::len).sum(),
            max_history: self
                .histories
                .values()
                .map(LabelHistory::len)
                .max()
                .unwrap_or(0),
        }
    }
}

//! Label Sources
//!
//! Where mapping rows come from when an index is (re)built:
//! - SQLite mapping tables (country, region, county, ASN)
//! - Static in-memory rows (continents, tests)

mod error;
mod sqlite;

pub use error::{SourceError, SourceResult};
pub use sqlite::SqliteLabelSource;

use crate::index::MappingRow;

/// A store of mapping rows for one code-space
pub trait LabelSource: Send + Sync {
    /// Load every row, ascending by effective-from
    fn load(&self) -> SourceResult<Vec<MappingRow>>;

    /// Short human-readable location, used in logs
    fn describe(&self) -> String;
}

/// Fixed rows held in memory
#[derive(Debug, Clone, Default)]
pub struct StaticLabelSource {
    rows: Vec<MappingRow>,
}

impl StaticLabelSource {
    /// Rows are sorted by effective-from, keeping the given order for ties
    pub fn new(mut rows: Vec<MappingRow>) -> Self {
        rows.sort_by_key(|row| row.effective_from);
        Self { rows }
    }
}

impl LabelSource for StaticLabelSource {
    fn load(&self) -> SourceResult<Vec<MappingRow>> {
        Ok(self.rows.clone())
    }

    fn describe(&self) -> String {
        format!("static ({} rows)", self.rows.len())
    }
}

/// Accept only plain SQL identifiers as table names
///
/// Table names are interpolated into queries, so anything beyond
/// `[A-Za-z_][A-Za-z0-9_]*` is refused.
pub fn check_table_name(table: &str) -> SourceResult<()> {
    let mut chars = table.chars();
    let valid = match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    };

    if valid {
        Ok(())
    } else {
        Err(SourceError::InvalidTable(table.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_source_sorts_stably() {
        let source = StaticLabelSource::new(vec![
            MappingRow::new("681", "C", 200),
            MappingRow::new("681", "A", 100),
            MappingRow::new("681", "B", 100),
        ]);

        let labels: Vec<String> = source.load().unwrap().into_iter().map(|r| r.label).collect();
        assert_eq!(labels, vec!["A", "B", "C"]);
        assert_eq!(source.describe(), "static (3 rows)");
    }

    #[test]
    fn test_table_names() {
        assert!(check_table_name("country_mappings").is_ok());
        assert!(check_table_name("_t2").is_ok());
        assert!(check_table_name("").is_err());
        assert!(check_table_name("2fast").is_err());
        assert!(check_table_name("a-b").is_err());
        assert!(check_table_name("x;--").is_err());
    }
}

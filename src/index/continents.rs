//! Static continent table
//!
//! Continent codes do not change, so they are compiled in rather than read
//! from the mapping database.

use crate::index::{MappingRow, TemporalLabelIndex};

pub const CONTINENT_SOURCE: &str = "continent_code";
pub const CONTINENT_TARGET: &str = "continent_label";

/// (code, label) pairs, all effective from the epoch
pub const CONTINENTS: &[(&str, &str)] = &[
    ("??", "Unassigned"),
    ("AF", "Africa"),
    ("AN", "Antarctica"),
    ("AS", "Asia"),
    ("EU", "Europe"),
    ("NA", "North America"),
    ("OC", "Oceania"),
    ("SA", "South America"),
];

/// Rows for the continent table
pub fn continent_rows() -> Vec<MappingRow> {
    CONTINENTS
        .iter()
        .map(|(code, label)| MappingRow::new(*code, *label, 0))
        .collect()
}

/// Index over the continent table
pub fn continent_index() -> TemporalLabelIndex {
    TemporalLabelIndex::build(CONTINENT_SOURCE, CONTINENT_TARGET, continent_rows())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_continent_lookup() {
        let index = continent_index();

        assert_eq!(index.len(), 8);
        assert_eq!(index.resolve("EU", 0), Some("Europe"));
        assert_eq!(index.resolve("EU", 1_700_000_000), Some("Europe"));
        assert_eq!(index.resolve("??", 42), Some("Unassigned"));
        assert_eq!(index.resolve("XX", 42), None);
    }

    #[test]
    fn test_continents_predate_epoch_only() {
        let index = continent_index();
        assert_eq!(index.resolve("AF", -1), None);
    }
}

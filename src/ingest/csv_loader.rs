//! CSV Mapping Loader
//!
//! Loads the `label,code,apply_from,apply_to` files produced by the region
//! and county generator scripts:
//!
//! ```text
//! "Auckland",NZ-AUK,0,0
//! "Waikato",NZ-WKO,0,0
//! ```
//!
//! A `0` (or empty) time column means "unbounded" and is stored as NULL.

use crate::ingest::{IngestError, IngestResult, MappingStore, StoredMapping};
use std::io::Read;
use std::path::Path;

/// Reads generator CSV into mapping rows
pub struct CsvMappingLoader {
    /// Whether the first line is a header
    has_header: bool,
}

impl Default for CsvMappingLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl CsvMappingLoader {
    /// Headerless input, as the generators emit it
    pub fn new() -> Self {
        Self { has_header: false }
    }

    /// Set whether the CSV has a header row
    pub fn with_header(mut self, has_header: bool) -> Self {
        self.has_header = has_header;
        self
    }

    /// Parse every row; the first malformed row fails the read
    pub fn read<R: Read>(&self, reader: R) -> IngestResult<Vec<StoredMapping>> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(self.has_header)
            .flexible(true)
            .from_reader(reader);

        let mut rows = Vec::new();
        for result in reader.records() {
            let record = result?;
            let line = record.position().map(|p| p.line()).unwrap_or(0);

            let column = |idx: usize, name: &str| {
                record
                    .get(idx)
                    .map(str::trim)
                    .ok_or_else(|| IngestError::Row {
                        line,
                        message: format!("missing {} column", name),
                    })
            };

            let label = column(0, "label")?;
            let code = column(1, "code")?;
            let apply_from = parse_bound(column(2, "apply_from")?, line)?;
            let apply_to = parse_bound(column(3, "apply_to")?, line)?;

            if code.is_empty() {
                return Err(IngestError::Row {
                    line,
                    message: "empty code".to_string(),
                });
            }

            rows.push(StoredMapping {
                code: code.to_string(),
                label: label.to_string(),
                orgname: None,
                apply_from,
                apply_to,
            });
        }

        Ok(rows)
    }

    /// Load a CSV file into `table`, creating it if needed
    ///
    /// All rows are committed in one transaction. Returns rows inserted.
    pub fn load(&self, store: &mut MappingStore, table: &str, path: &Path) -> IngestResult<usize> {
        let file = std::fs::File::open(path)?;
        let rows = self.read(std::io::BufReader::new(file))?;

        store.ensure_table(table)?;
        let inserted = store.insert_page(table, &rows)?;

        tracing::info!(
            "Loaded {} of {} rows from {:?} into {}",
            inserted,
            rows.len(),
            path,
            table
        );

        Ok(inserted)
    }
}

/// `""` or `"0"` → None, otherwise a unix timestamp
fn parse_bound(value: &str, line: u64) -> IngestResult<Option<i64>> {
    match value {
        "" | "0" => Ok(None),
        other => other.parse::<i64>().map(Some).map_err(|e| IngestError::Row {
            line,
            message: format!("invalid timestamp {:?}: {}", other, e),
        }),
    }
}

//! Mapping Ingestion
//!
//! Populates the mapping database the tagger reads from:
//! - ASN names from a paginated JSON API
//! - Region/county/country labels from generator CSV files
//!
//! Both paths write through [`MappingStore`], one transaction per page.

mod asn;
mod csv_loader;
mod error;
mod store;

pub use asn::{AsOrg, AsnIngestor, AsnPage, AsnRecord, HttpPageSource, PageInfo, PageSource};
pub use csv_loader::CsvMappingLoader;
pub use error::{IngestError, IngestResult};
pub use store::MappingStore;

/// Label used when the source has no name for an ASN
pub const UNKNOWN_NAME: &str = "Name Unknown";

/// A row as written to a mapping table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredMapping {
    pub code: String,
    pub label: String,
    /// Owning organisation (ASN tables only)
    pub orgname: Option<String>,
    /// Unix seconds; NULL means "since forever"
    pub apply_from: Option<i64>,
    pub apply_to: Option<i64>,
}

/// Result of ingesting one page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageOutcome {
    pub page: u32,
    /// Records in the response
    pub fetched: usize,
    /// Rows that were new to the table
    pub inserted: usize,
    pub has_next: bool,
}

/// Totals across an ingestion run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestSummary {
    pub pages: usize,
    pub fetched: usize,
    pub inserted: usize,
}

impl IngestSummary {
    pub fn record(&mut self, outcome: &PageOutcome) {
        self.pages += 1;
        self.fetched += outcome.fetched;
        self.inserted += outcome.inserted;
    }
}

//! # friendly-tagger
//!
//! Adds human-readable labels to coded tags in time-series records
//! (country, region and county codes, continents, AS numbers), choosing the
//! label that was in force at each record's timestamp.
//!
//! ## Features
//!
//! - **Time-versioned labels**: a code can be renamed; old records keep the old name
//! - **Periodic reload**: mapping tables are re-read as record time advances
//! - **Degraded service**: a failed reload keeps the previous labels serving
//! - **Ingestion**: ASN names from a paginated API, region/county labels from CSV
//!
//! ## Modules
//!
//! - [`index`]: Temporal label index and the continent table
//! - [`tagger`]: Tagging engine applying indices to record batches
//! - [`source`]: Where index rows come from (SQLite, static)
//! - [`ingest`]: Populating the mapping database
//! - [`record`]: The record contract and the JSON-lines metric type
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use friendly_tagger::index::MappingRow;
//! use friendly_tagger::record::Metric;
//! use friendly_tagger::source::StaticLabelSource;
//! use friendly_tagger::tagger::{AttributeSpec, TaggingEngine};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut engine = TaggingEngine::new(120);
//!     engine.configure(vec![AttributeSpec::new(
//!         "country_code",
//!         "country_label",
//!         StaticLabelSource::new(vec![MappingRow::new("US", "United States", 0)]),
//!     )])?;
//!
//!     let mut batch = vec![Metric::new("traffic", 500).tag("country_code", "US")];
//!     engine.apply(&mut batch);
//!
//!     assert_eq!(batch[0].get_tag("country_label"), Some("United States"));
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod index;
pub mod ingest;
pub mod record;
pub mod source;
pub mod tagger;

// Re-export top-level types for convenience
pub use index::{IndexStats, LabelEntry, LabelHistory, MappingRow, TemporalLabelIndex};

pub use tagger::{
    ApplyStats, AttributeSpec, ReloadOutcome, TaggerError, TaggerResult, TaggingEngine,
};

pub use source::{LabelSource, SourceError, SourceResult, SqliteLabelSource, StaticLabelSource};

pub use ingest::{
    AsnIngestor, CsvMappingLoader, HttpPageSource, IngestError, IngestResult, IngestSummary,
    MappingStore, PageSource, StoredMapping,
};

pub use record::{Metric, Record, Tag};

pub use config::{Config, ConfigError, IngestConfig, LoggingConfig, TableConfig, TaggerConfig};

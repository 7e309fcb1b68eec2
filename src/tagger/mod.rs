//! Tagging Engine
//!
//! Adds human-readable label tags to records carrying coded tags:
//!
//! ```text
//! batch ──► maybe_reload(first.timestamp) ──► per record, per tag:
//!             │                                 index[tag.key].resolve(tag.value, record.timestamp)
//!             ▼                                 ──► stage (target, label) ──► add after scan
//!   rebuild every reloadable index
//! ```
//!
//! The continent index is compiled in and never reloaded. Every other
//! index is rebuilt from its [`LabelSource`](crate::source::LabelSource)
//! when the reload interval has elapsed.

mod engine;
mod error;

pub use engine::{TaggingEngine, DEFAULT_RELOAD_INTERVAL_SECS};
pub use error::{TaggerError, TaggerResult};

use crate::source::LabelSource;

/// Reloadable attributes: (source tag, target tag)
pub const COUNTRY: (&str, &str) = ("country_code", "country_label");
pub const REGION: (&str, &str) = ("region_code", "region_label");
pub const COUNTY: (&str, &str) = ("county_code", "county_label");
pub const ASN: (&str, &str) = ("asn", "asn_label");

/// One taggable attribute and where its labels come from
pub struct AttributeSpec {
    /// Tag holding the code
    pub source_attribute: String,
    /// Tag that receives the label
    pub target_attribute: String,
    /// Rows for the attribute's index
    pub source: Box<dyn LabelSource>,
}

impl AttributeSpec {
    pub fn new(
        source_attribute: impl Into<String>,
        target_attribute: impl Into<String>,
        source: impl LabelSource + 'static,
    ) -> Self {
        Self {
            source_attribute: source_attribute.into(),
            target_attribute: target_attribute.into(),
            source: Box::new(source),
        }
    }
}

impl std::fmt::Debug for AttributeSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AttributeSpec")
            .field("source_attribute", &self.source_attribute)
            .field("target_attribute", &self.target_attribute)
            .field("source", &self.source.describe())
            .finish()
    }
}

/// What happened to the indices at the start of a batch
#[derive(Debug, Default)]
pub enum ReloadOutcome {
    /// Indices were fresh enough
    #[default]
    Skipped,
    /// Every reloadable index was rebuilt
    Reloaded,
    /// Rebuild failed; the previous indices were used
    Failed(TaggerError),
}

impl ReloadOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, ReloadOutcome::Failed(_))
    }
}

/// Summary of one `apply` call
#[derive(Debug, Default)]
pub struct ApplyStats {
    /// Records in the batch
    pub records: usize,
    /// Label tags added across the batch
    pub labels_added: usize,
    pub reload: ReloadOutcome,
}

//! Tagging engine - owns the indices and applies them to record batches

use crate::config::TaggerConfig;
use crate::index::{continent_index, TemporalLabelIndex};
use crate::record::Record;
use crate::source::SqliteLabelSource;
use crate::tagger::{
    ApplyStats, AttributeSpec, ReloadOutcome, TaggerError, TaggerResult, ASN, COUNTRY, COUNTY,
    REGION,
};
use std::collections::HashMap;

/// Seconds between reloads unless configured otherwise
pub const DEFAULT_RELOAD_INTERVAL_SECS: u64 = 120;

const DESCRIPTION: &str =
    "Add additional human-readable labels for certain tags within time series";

const SAMPLE_CONFIG: &str = r#"[tagger]
database = "mappings.db"
reload_interval_secs = 3600

[tagger.tables]
country = "country_mappings"
region = "region_mappings"
county = "county_mappings"
asn = "asn_mappings"
"#;

/// Enriches records with labels resolved at each record's timestamp
///
/// Cold until the first reload: only the continent table answers. A reload
/// builds a complete new set of indices before swapping it in, so a failed
/// reload leaves the previous set serving.
pub struct TaggingEngine {
    /// Reloadable attributes and their sources
    specs: Vec<AttributeSpec>,
    /// source attribute → index, replaced as a whole on reload
    loaded: HashMap<String, TemporalLabelIndex>,
    /// Compiled-in indices (continents), never reloaded
    fixed: HashMap<String, TemporalLabelIndex>,
    /// Timestamp of the last reload attempt (0 = never)
    last_reload: i64,
    reload_interval_secs: i64,
}

impl TaggingEngine {
    /// Create a cold engine with only the continent table
    pub fn new(reload_interval_secs: u64) -> Self {
        let continents = continent_index();
        let mut fixed = HashMap::new();
        fixed.insert(continents.source_attribute().to_string(), continents);

        Self {
            specs: Vec::new(),
            loaded: HashMap::new(),
            fixed,
            last_reload: 0,
            reload_interval_secs: i64::try_from(reload_interval_secs).unwrap_or(i64::MAX),
        }
    }

    /// Build an engine reading every default attribute from the configured database
    pub fn from_config(config: &TaggerConfig) -> TaggerResult<Self> {
        let tables = [
            (COUNTRY, &config.tables.country),
            (REGION, &config.tables.region),
            (COUNTY, &config.tables.county),
            (ASN, &config.tables.asn),
        ];

        let mut specs = Vec::with_capacity(tables.len());
        for ((source_attribute, target_attribute), table) in tables {
            let source = SqliteLabelSource::new(&config.database, table.as_str())?;
            specs.push(AttributeSpec::new(source_attribute, target_attribute, source));
        }

        let mut engine = Self::new(config.reload_interval_secs);
        engine.configure(specs)?;
        Ok(engine)
    }

    /// Register the reloadable attributes, replacing any previous set
    ///
    /// Newly registered attributes start with empty indices and the engine
    /// goes cold, so the next batch past one interval reloads them.
    pub fn configure(&mut self, specs: Vec<AttributeSpec>) -> TaggerResult<()> {
        let mut seen = std::collections::HashSet::new();
        for spec in &specs {
            if self.fixed.contains_key(&spec.source_attribute)
                || !seen.insert(spec.source_attribute.as_str())
            {
                return Err(TaggerError::DuplicateAttribute(spec.source_attribute.clone()));
            }
        }

        self.loaded = specs
            .iter()
            .map(|spec| {
                (
                    spec.source_attribute.clone(),
                    TemporalLabelIndex::new(&spec.source_attribute, &spec.target_attribute),
                )
            })
            .collect();
        self.specs = specs;
        self.last_reload = 0;

        for spec in &self.specs {
            tracing::debug!("Registered attribute {:?}", spec);
        }

        Ok(())
    }

    /// Reload if `now` is at least one interval past the last reload
    ///
    /// Returns whether a rebuild happened. On failure the previous indices
    /// stay in place and the next attempt waits a full interval.
    pub fn maybe_reload(&mut self, now: i64) -> TaggerResult<bool> {
        if now.saturating_sub(self.last_reload) < self.reload_interval_secs {
            tracing::debug!(
                "Skipping reload: last at {}, now {}, interval {}s",
                self.last_reload,
                now,
                self.reload_interval_secs
            );
            return Ok(false);
        }

        let result = self.reload_all();
        self.last_reload = now;
        result.map(|_| true)
    }

    /// Rebuild every reloadable index, unconditionally
    pub fn reload(&mut self, now: i64) -> TaggerResult<()> {
        let result = self.reload_all();
        self.last_reload = now;
        result
    }

    fn reload_all(&mut self) -> TaggerResult<()> {
        let mut fresh = HashMap::with_capacity(self.specs.len());

        for spec in &self.specs {
            let rows = spec.source.load().map_err(|source| TaggerError::Reload {
                attribute: spec.source_attribute.clone(),
                location: spec.source.describe(),
                source,
            })?;

            let index = TemporalLabelIndex::build(
                spec.source_attribute.as_str(),
                spec.target_attribute.as_str(),
                rows,
            );
            tracing::info!(
                "Loaded {} labels from {}: {}",
                spec.source_attribute,
                spec.source.describe(),
                index.stats()
            );
            fresh.insert(spec.source_attribute.clone(), index);
        }

        self.loaded = fresh;
        Ok(())
    }

    /// Enrich a batch in place
    ///
    /// The first record's timestamp decides whether to reload. Each record
    /// then resolves against its own timestamp. An empty batch does nothing.
    pub fn apply<R: Record>(&mut self, records: &mut [R]) -> ApplyStats {
        let Some(first) = records.first() else {
            return ApplyStats::default();
        };

        let reload = match self.maybe_reload(first.timestamp()) {
            Ok(true) => ReloadOutcome::Reloaded,
            Ok(false) => ReloadOutcome::Skipped,
            Err(e) => {
                tracing::error!("Label reload failed, keeping previous labels: {}", e);
                ReloadOutcome::Failed(e)
            }
        };

        let labels_added: usize = records
            .iter_mut()
            .map(|record| self.tag_record(record))
            .sum();

        ApplyStats {
            records: records.len(),
            labels_added,
            reload,
        }
    }

    /// Add every resolvable label to one record, returning how many were added
    pub fn tag_record<R: Record>(&self, record: &mut R) -> usize {
        let at = record.timestamp();

        // staged so that labels added here are not themselves scanned
        let staged: Vec<(&str, &str)> = record
            .tags()
            .into_iter()
            .filter_map(|(key, code)| {
                let index = self.index(key)?;
                let label = index.resolve(code, at)?;
                Some((index.target_attribute(), label))
            })
            .collect();

        for (target, label) in &staged {
            record.add_tag(target, label);
        }

        staged.len()
    }

    /// Index reading the given source attribute
    pub fn index(&self, source_attribute: &str) -> Option<&TemporalLabelIndex> {
        self.loaded
            .get(source_attribute)
            .or_else(|| self.fixed.get(source_attribute))
    }

    /// Resolve a single code outside of a batch
    pub fn resolve(&self, source_attribute: &str, code: &str, at: i64) -> Option<&str> {
        self.index(source_attribute)?.resolve(code, at)
    }

    /// Every source attribute the engine can enrich
    pub fn attributes(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .fixed
            .keys()
            .chain(self.loaded.keys())
            .map(String::as_str)
            .collect();
        names.sort_unstable();
        names
    }

    pub fn last_reload(&self) -> i64 {
        self.last_reload
    }

    pub fn reload_interval_secs(&self) -> i64 {
        self.reload_interval_secs
    }

    /// Whether a reload has been attempted
    pub fn is_warm(&self) -> bool {
        self.last_reload != 0
    }

    pub fn description(&self) -> &'static str {
        DESCRIPTION
    }

    pub fn sample_config(&self) -> &'static str {
        SAMPLE_CONFIG
    }
}

impl Default for TaggingEngine {
    fn default() -> Self {
        Self::new(DEFAULT_RELOAD_INTERVAL_SECS)
    }
}

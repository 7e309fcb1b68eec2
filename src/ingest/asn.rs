//! ASN Name Ingestion
//!
//! Pages through an AS-to-organisation API and stores one row per ASN
//! record in the ASN mapping table:
//!
//! ```text
//! GET <api_url>?verbose=true&page=1 → {data: [...], pageInfo: {hasNextPage: true}}
//! GET <api_url>?verbose=true&page=2 → ...
//! ```
//!
//! Each page is converted in full before anything is written, then
//! committed in a single transaction.

use crate::config::IngestConfig;
use crate::ingest::{
    IngestError, IngestResult, IngestSummary, MappingStore, PageOutcome, StoredMapping,
    UNKNOWN_NAME,
};
use async_trait::async_trait;
use chrono::DateTime;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

/// One page of the API response
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AsnPage {
    #[serde(default)]
    pub total_count: i64,
    #[serde(default)]
    pub page_info: PageInfo,
    #[serde(default)]
    pub data: Vec<AsnRecord>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    #[serde(default)]
    pub page_size: i64,
    #[serde(default)]
    pub page_offset: i64,
    #[serde(default)]
    pub has_next_page: bool,
}

/// One ASN as described by the API
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AsnRecord {
    #[serde(default)]
    pub asn: String,
    #[serde(default)]
    pub asn_name: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub org_id: Option<AsOrg>,
    /// RFC 3339 time of the last change
    #[serde(default)]
    pub changed: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AsOrg {
    #[serde(default)]
    pub org_name: String,
}

impl AsnRecord {
    /// Convert to a storable row
    ///
    /// Label is `"<name>, <country>"`; the change time becomes `apply_from`.
    pub fn to_mapping(&self) -> IngestResult<StoredMapping> {
        let name = if self.asn_name.is_empty() {
            UNKNOWN_NAME
        } else {
            self.asn_name.as_str()
        };

        let changed =
            DateTime::parse_from_rfc3339(&self.changed).map_err(|e| IngestError::Timestamp {
                value: self.changed.clone(),
                error: e.to_string(),
            })?;

        Ok(StoredMapping {
            code: self.asn.clone(),
            label: format!("{}, {}", name, self.country),
            orgname: self.org_id.as_ref().map(|org| org.org_name.clone()),
            apply_from: Some(changed.timestamp()),
            apply_to: None,
        })
    }
}

/// Anything that can hand out API pages
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Fetch a 1-based page
    async fn fetch_page(&self, page: u32) -> IngestResult<AsnPage>;
}

/// Pages fetched over HTTP
pub struct HttpPageSource {
    client: Client,
    api_url: String,
}

impl HttpPageSource {
    pub fn new(config: &IngestConfig) -> IngestResult<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            api_url: config.api_url.clone(),
        })
    }
}

#[async_trait]
impl PageSource for HttpPageSource {
    async fn fetch_page(&self, page: u32) -> IngestResult<AsnPage> {
        let response = self
            .client
            .get(&self.api_url)
            .query(&[("verbose", "true".to_string()), ("page", page.to_string())])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(IngestError::Api(format!(
                "{} returned {}",
                self.api_url,
                response.status()
            )));
        }

        response
            .json::<AsnPage>()
            .await
            .map_err(|e| IngestError::Decode(e.to_string()))
    }
}

/// Drives page-by-page ingestion into one mapping table
pub struct AsnIngestor<S> {
    source: S,
    table: String,
}

impl<S: PageSource> AsnIngestor<S> {
    pub fn new(source: S, table: impl Into<String>) -> Self {
        Self {
            source,
            table: table.into(),
        }
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// Fetch, convert and commit one page
    pub async fn ingest_page(
        &self,
        page: u32,
        store: &mut MappingStore,
    ) -> IngestResult<PageOutcome> {
        let body = self.source.fetch_page(page).await?;

        let rows = body
            .data
            .iter()
            .map(AsnRecord::to_mapping)
            .collect::<IngestResult<Vec<_>>>()?;

        let inserted = store.insert_page(&self.table, &rows)?;

        for row in &rows {
            tracing::debug!(
                "{} {} ({}) -- {}",
                row.code,
                row.label,
                row.orgname.as_deref().unwrap_or(""),
                row.apply_from.unwrap_or(0)
            );
        }
        tracing::info!(
            "Page {}: {} records, {} new (total {})",
            page,
            rows.len(),
            inserted,
            body.total_count
        );

        Ok(PageOutcome {
            page,
            fetched: rows.len(),
            inserted,
            has_next: body.page_info.has_next_page,
        })
    }

    /// Ingest pages from `start_page` until the API reports no next page
    ///
    /// Stops at the first failing page; pages before it stay committed.
    pub async fn run(&self, store: &mut MappingStore, start_page: u32) -> IngestResult<IngestSummary> {
        store.ensure_table(&self.table)?;

        let mut summary = IngestSummary::default();
        let mut page = start_page.max(1);

        loop {
            let outcome = self
                .ingest_page(page, store)
                .await
                .map_err(|e| IngestError::Page {
                    page,
                    source: Box::new(e),
                })?;

            summary.record(&outcome);

            if !outcome.has_next {
                break;
            }
            page += 1;
        }

        tracing::info!(
            "Ingested {} pages into {}: {} records, {} new",
            summary.pages,
            self.table,
            summary.fetched,
            summary.inserted
        );

        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{LabelSource, SqliteLabelSource};
    use std::sync::Mutex;

    /// Serves canned pages and records which pages were asked for
    struct CannedPages {
        pages: Vec<IngestResult<AsnPage>>,
        requested: Mutex<Vec<u32>>,
    }

    impl CannedPages {
        fn new(pages: Vec<IngestResult<AsnPage>>) -> Self {
            Self {
                pages,
                requested: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl PageSource for CannedPages {
        async fn fetch_page(&self, page: u32) -> IngestResult<AsnPage> {
            self.requested.lock().unwrap().push(page);
            match self.pages.get(page as usize - 1) {
                Some(Ok(body)) => Ok(body.clone()),
                Some(Err(e)) => Err(IngestError::Api(e.to_string())),
                None => Err(IngestError::Api(format!("no page {}", page))),
            }
        }
    }

    fn record(asn: &str, name: &str, changed: &str) -> AsnRecord {
        AsnRecord {
            asn: asn.to_string(),
            asn_name: name.to_string(),
            country: "NZ".to_string(),
            org_id: Some(AsOrg {
                org_name: "Example Org".to_string(),
            }),
            changed: changed.to_string(),
        }
    }

    fn page(records: Vec<AsnRecord>, has_next: bool) -> AsnPage {
        AsnPage {
            total_count: 3,
            page_info: PageInfo {
                page_size: 2,
                page_offset: 0,
                has_next_page: has_next,
            },
            data: records,
        }
    }

    #[test]
    fn test_decode_api_page() {
        let body = r#"{
            "totalCount": 1,
            "pageInfo": {"pageSize": 1, "pageOffset": 0, "hasNextPage": true},
            "data": [{
                "asn": "681",
                "asnName": "WAIKATO",
                "country": "NZ",
                "orgId": {"orgName": "University of Waikato"},
                "changed": "2020-06-16T22:21:28Z"
            }]
        }"#;

        let page: AsnPage = serde_json::from_str(body).unwrap();
        assert!(page.page_info.has_next_page);
        assert_eq!(page.data.len(), 1);

        let row = page.data[0].to_mapping().unwrap();
        assert_eq!(row.code, "681");
        assert_eq!(row.label, "WAIKATO, NZ");
        assert_eq!(row.orgname.as_deref(), Some("University of Waikato"));
        assert_eq!(row.apply_from, Some(1_592_346_088));
    }

    #[test]
    fn test_empty_name_becomes_unknown() {
        let row = record("64512", "", "2021-01-01T00:00:00Z").to_mapping().unwrap();
        assert_eq!(row.label, "Name Unknown, NZ");
    }

    #[test]
    fn test_bad_timestamp_is_an_error() {
        let result = record("64512", "X", "16/06/2020").to_mapping();
        assert!(matches!(result, Err(IngestError::Timestamp { .. })));
    }

    #[tokio::test]
    async fn test_run_follows_pages() {
        let source = CannedPages::new(vec![
            Ok(page(
                vec![
                    record("681", "WAIKATO", "2020-01-01T00:00:00Z"),
                    record("1234", "", "2020-01-01T00:00:00Z"),
                ],
                true,
            )),
            Ok(page(vec![record("681", "QUIGLEY", "2020-06-16T22:21:28Z")], false)),
        ]);
        let ingestor = AsnIngestor::new(source, "asn_mappings");
        let mut store = MappingStore::in_memory().unwrap();

        let summary = ingestor.run(&mut store, 1).await.unwrap();

        assert_eq!(summary.pages, 2);
        assert_eq!(summary.fetched, 3);
        assert_eq!(summary.inserted, 3);
        assert_eq!(*ingestor.source.requested.lock().unwrap(), vec![1, 2]);
        assert_eq!(store.count("asn_mappings").unwrap(), 3);
    }

    #[tokio::test]
    async fn test_run_resumes_from_start_page() {
        let source = CannedPages::new(vec![
            Err(IngestError::Api("never asked".to_string())),
            Ok(page(vec![record("681", "WAIKATO", "2020-01-01T00:00:00Z")], false)),
        ]);
        let ingestor = AsnIngestor::new(source, "asn_mappings");
        let mut store = MappingStore::in_memory().unwrap();

        let summary = ingestor.run(&mut store, 2).await.unwrap();

        assert_eq!(summary.pages, 1);
        assert_eq!(*ingestor.source.requested.lock().unwrap(), vec![2]);
    }

    #[tokio::test]
    async fn test_bad_record_fails_whole_page() {
        let source = CannedPages::new(vec![
            Ok(page(vec![record("1", "ONE", "2020-01-01T00:00:00Z")], true)),
            Ok(page(
                vec![
                    record("2", "TWO", "2020-01-01T00:00:00Z"),
                    record("3", "THREE", "not a time"),
                ],
                false,
            )),
        ]);
        let ingestor = AsnIngestor::new(source, "asn_mappings");
        let mut store = MappingStore::in_memory().unwrap();

        let err = ingestor.run(&mut store, 1).await.unwrap_err();

        assert!(matches!(err, IngestError::Page { page: 2, .. }));
        // page 1 committed, nothing from page 2
        assert_eq!(store.count("asn_mappings").unwrap(), 1);
    }

    #[tokio::test]
    async fn test_ingested_rows_feed_label_source() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mappings.db");

        let source = CannedPages::new(vec![Ok(page(
            vec![
                record("681", "QUIGLEY", "2020-06-16T22:21:28Z"),
                record("681", "WAIKATO", "2000-01-01T00:00:00Z"),
            ],
            false,
        ))]);
        let ingestor = AsnIngestor::new(source, "asn_mappings");
        let mut store = MappingStore::open(&path).unwrap();
        ingestor.run(&mut store, 1).await.unwrap();

        let rows = SqliteLabelSource::new(&path, ingestor.table())
            .unwrap()
            .load()
            .unwrap();
        let labels: Vec<&str> = rows.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels, vec!["WAIKATO, NZ", "QUIGLEY, NZ"]);
    }
}

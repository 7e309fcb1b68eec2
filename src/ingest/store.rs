//! Mapping Store - writable side of the mapping database
//!
//! Every table shares one layout:
//!
//! ```text
//! code TEXT NOT NULL | label TEXT NOT NULL | orgname TEXT | apply_from INTEGER | apply_to INTEGER
//! UNIQUE(code, apply_from)
//! ```
//!
//! Writes go in page-sized transactions; a failed page leaves nothing behind.

use crate::ingest::{IngestResult, StoredMapping};
use crate::source::check_table_name;
use rusqlite::{params, Connection, OpenFlags, TransactionBehavior};
use std::path::{Path, PathBuf};

/// Read-write handle on the mapping database
pub struct MappingStore {
    conn: Connection,
    path: Option<PathBuf>,
}

impl MappingStore {
    /// Create or open a mapping database
    pub fn open(path: &Path) -> IngestResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;

        // readers (the tagger) keep working while a page commits
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            ",
        )?;

        Ok(Self {
            conn,
            path: Some(path.to_path_buf()),
        })
    }

    /// Throwaway in-memory store
    pub fn in_memory() -> IngestResult<Self> {
        Ok(Self {
            conn: Connection::open_in_memory()?,
            path: None,
        })
    }

    /// Create a mapping table if it does not exist
    pub fn ensure_table(&self, table: &str) -> IngestResult<()> {
        check_table_name(table)?;

        self.conn.execute(
            &format!(
                "CREATE TABLE IF NOT EXISTS {} (
                    code TEXT NOT NULL,
                    label TEXT NOT NULL,
                    orgname TEXT,
                    apply_from INTEGER,
                    apply_to INTEGER,
                    UNIQUE(code, apply_from)
                )",
                table
            ),
            [],
        )?;

        Ok(())
    }

    /// Insert a page of rows in one exclusive transaction
    ///
    /// Rows that collide with an existing (code, apply_from) are skipped, as
    /// are NULL-bounded rows already stored with the same label. Returns how
    /// many rows were actually inserted. Any error rolls the whole page back.
    pub fn insert_page(&mut self, table: &str, rows: &[StoredMapping]) -> IngestResult<usize> {
        check_table_name(table)?;

        if rows.is_empty() {
            return Ok(0);
        }

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Exclusive)?;

        let mut inserted = 0;
        {
            // UNIQUE never matches NULL apply_from, hence the IS check
            let mut stmt = tx.prepare_cached(&format!(
                "INSERT OR IGNORE INTO {0} (code, label, orgname, apply_from, apply_to)
                 SELECT ?1, ?2, ?3, ?4, ?5
                 WHERE NOT EXISTS (
                     SELECT 1 FROM {0} WHERE code = ?1 AND label = ?2 AND apply_from IS ?4
                 )",
                table
            ))?;

            for row in rows {
                inserted += stmt.execute(params![
                    row.code,
                    row.label,
                    row.orgname,
                    row.apply_from,
                    row.apply_to
                ])?;
            }
        }

        tx.commit()?;

        Ok(inserted)
    }

    /// Number of rows in a table
    pub fn count(&self, table: &str) -> IngestResult<u64> {
        check_table_name(table)?;

        let count: i64 =
            self.conn
                .query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| {
                    row.get(0)
                })?;

        Ok(count as u64)
    }

    /// Database file path, `None` for in-memory stores
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::IngestError;
    use crate::source::{LabelSource, SqliteLabelSource};
    use tempfile::tempdir;

    fn mapping(code: &str, label: &str, apply_from: Option<i64>) -> StoredMapping {
        StoredMapping {
            code: code.to_string(),
            label: label.to_string(),
            orgname: None,
            apply_from,
            apply_to: None,
        }
    }

    #[test]
    fn test_insert_or_ignore_duplicates() {
        let mut store = MappingStore::in_memory().unwrap();
        store.ensure_table("asn_mappings").unwrap();

        let page = vec![
            mapping("681", "University of Waikato, NZ", Some(0)),
            mapping("681", "Quigley College, NZ", Some(1_592_346_088)),
        ];
        assert_eq!(store.insert_page("asn_mappings", &page).unwrap(), 2);

        // same page again: nothing new
        assert_eq!(store.insert_page("asn_mappings", &page).unwrap(), 0);
        assert_eq!(store.count("asn_mappings").unwrap(), 2);
    }

    #[test]
    fn test_unbounded_rows_are_not_duplicated() {
        let mut store = MappingStore::in_memory().unwrap();
        store.ensure_table("region_mappings").unwrap();

        let page = vec![mapping("NZ-AUK", "Auckland", None)];
        assert_eq!(store.insert_page("region_mappings", &page).unwrap(), 1);
        assert_eq!(store.insert_page("region_mappings", &page).unwrap(), 0);

        // a renamed label is new information
        let renamed = vec![mapping("NZ-AUK", "Tamaki Makaurau", None)];
        assert_eq!(store.insert_page("region_mappings", &renamed).unwrap(), 1);
        assert_eq!(store.count("region_mappings").unwrap(), 2);
    }

    #[test]
    fn test_failed_page_rolls_back() {
        let mut store = MappingStore::in_memory().unwrap();
        store.ensure_table("asn_mappings").unwrap();
        store
            .conn
            .execute_batch(
                "CREATE TRIGGER reject_bad BEFORE INSERT ON asn_mappings
                 WHEN NEW.label = 'bad'
                 BEGIN SELECT RAISE(ABORT, 'rejected'); END;",
            )
            .unwrap();

        let page = vec![
            mapping("1", "good", Some(0)),
            mapping("2", "bad", Some(0)),
        ];
        let result = store.insert_page("asn_mappings", &page);

        assert!(matches!(result, Err(IngestError::Store(_))));
        assert_eq!(store.count("asn_mappings").unwrap(), 0);
    }

    #[test]
    fn test_rejects_bad_table_name() {
        let mut store = MappingStore::in_memory().unwrap();
        assert!(matches!(
            store.ensure_table("drop table x"),
            Err(IngestError::Table(_))
        ));
        assert!(store.insert_page("x y", &[mapping("1", "a", None)]).is_err());
    }

    #[test]
    fn test_written_rows_are_readable_by_label_source() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("mappings.db");

        let mut store = MappingStore::open(&path).unwrap();
        store.ensure_table("country_mappings").unwrap();
        store
            .insert_page(
                "country_mappings",
                &[
                    mapping("NZ", "New Zealand", None),
                    mapping("US", "United States", Some(10)),
                ],
            )
            .unwrap();
        assert_eq!(store.path(), Some(path.as_path()));

        let source = SqliteLabelSource::new(&path, "country_mappings").unwrap();
        let rows = source.load().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].code, "NZ");
        assert_eq!(rows[0].effective_from, 0);
    }
}

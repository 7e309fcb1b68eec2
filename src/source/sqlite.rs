//! SQLite label source
//!
//! Reads one mapping table per code-space. Each table has at least the
//! columns `code`, `label` and `apply_from`; rows with a NULL `apply_from`
//! apply from the epoch.

use crate::index::MappingRow;
use crate::source::{check_table_name, LabelSource, SourceError, SourceResult};
use rusqlite::{Connection, OpenFlags};
use std::path::{Path, PathBuf};

/// Mapping table inside a SQLite database
#[derive(Debug, Clone)]
pub struct SqliteLabelSource {
    database: PathBuf,
    table: String,
}

impl SqliteLabelSource {
    pub fn new(database: impl Into<PathBuf>, table: impl Into<String>) -> SourceResult<Self> {
        let table = table.into();
        check_table_name(&table)?;

        Ok(Self {
            database: database.into(),
            table,
        })
    }

    pub fn database(&self) -> &Path {
        &self.database
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    fn open(&self) -> SourceResult<Connection> {
        if !self.database.exists() {
            return Err(SourceError::NotFound(self.database.display().to_string()));
        }

        let conn = Connection::open_with_flags(
            &self.database,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;

        Ok(conn)
    }
}

impl LabelSource for SqliteLabelSource {
    fn load(&self) -> SourceResult<Vec<MappingRow>> {
        let conn = self.open()?;

        // ascending effective time, then insertion order, so later rows win ties
        let query = format!(
            "SELECT code, label, COALESCE(apply_from, 0) FROM {}
             ORDER BY COALESCE(apply_from, 0), rowid",
            self.table
        );

        let mut stmt = conn.prepare(&query)?;
        let rows = stmt
            .query_map([], |row| {
                Ok(MappingRow {
                    code: row.get(0)?,
                    label: row.get(1)?,
                    effective_from: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(rows)
    }

    fn describe(&self) -> String {
        format!("sqlite:{}#{}", self.database.display(), self.table)
    }
}

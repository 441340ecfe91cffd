//! Persisted audit history for trend comparison.
//!
//! One JSON file per audited domain, newest record last, trimmed to a fixed
//! retention window. Writes go through a full rewrite of the file; concurrent
//! audits of the same domain are last-write-wins.

use crate::domain::models::AuditRecord;
use crate::error::{AuditError, Result};
use std::fs;
use std::path::{Path, PathBuf};

const RETAINED_RECORDS: usize = 5;

pub trait HistoryStore {
    /// Most recent record for the domain, if any.
    fn last(&self, domain: &str) -> Result<Option<AuditRecord>>;

    /// Append a record, trimming old entries past the retention window.
    fn append(&self, domain: &str, record: &AuditRecord) -> Result<()>;
}

/// File-backed store rooted at a directory; `<domain>.json` per site.
pub struct JsonFileHistory {
    dir: PathBuf,
}

impl JsonFileHistory {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, domain: &str) -> PathBuf {
        // Domains are host names, but sanitize anyway so a hostile input
        // cannot escape the store directory.
        let safe: String = domain
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '.' || c == '-' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.dir.join(format!("{safe}.json"))
    }

    fn read_records(&self, path: &Path) -> Result<Vec<AuditRecord>> {
        if !path.exists() {
            return Ok(Vec::new());
        }
        let raw = fs::read_to_string(path)
            .map_err(|e| AuditError::history(format!("read {}: {e}", path.display())))?;
        serde_json::from_str(&raw)
            .map_err(|e| AuditError::history(format!("parse {}: {e}", path.display())))
    }
}

impl HistoryStore for JsonFileHistory {
    fn last(&self, domain: &str) -> Result<Option<AuditRecord>> {
        let path = self.path_for(domain);
        let records = self.read_records(&path)?;
        Ok(records.into_iter().last())
    }

    fn append(&self, domain: &str, record: &AuditRecord) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .map_err(|e| AuditError::history(format!("create {}: {e}", self.dir.display())))?;

        let path = self.path_for(domain);
        let mut records = self.read_records(&path)?;
        records.push(record.clone());
        if records.len() > RETAINED_RECORDS {
            let drop = records.len() - RETAINED_RECORDS;
            records.drain(..drop);
        }

        let raw = serde_json::to_string_pretty(&records)
            .map_err(|e| AuditError::history(format!("serialize history: {e}")))?;
        fs::write(&path, raw)
            .map_err(|e| AuditError::history(format!("write {}: {e}", path.display())))?;
        log::debug!(
            "[HISTORY] {} now holds {} records",
            path.display(),
            records.len()
        );
        Ok(())
    }
}

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use sympto_core::{RawObservation, normalize};

use crate::error::{Result, StoreError};
use crate::store::Store;

/// Version written into every export.
pub const CURRENT_VERSION: u32 = 1;

/// Portable export of one user's observations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportDocument {
    pub version: u32,
    pub user_id: i64,
    /// RFC 3339 timestamp of the export.
    pub exported_at: String,
    pub records: Vec<RawObservation>,
}

impl Store {
    /// Export all of a user's records, oldest first.
    pub fn export_document(&self, user_id: i64) -> Result<ExportDocument> {
        Ok(ExportDocument {
            version: CURRENT_VERSION,
            user_id,
            exported_at: chrono::Utc::now().to_rfc3339(),
            records: self.all_records(user_id)?,
        })
    }

    pub fn export_json_string(&self, user_id: i64) -> Result<String> {
        let doc = self.export_document(user_id)?;
        serde_json::to_string_pretty(&doc)
            .map_err(|e| StoreError::InvalidData(format!("JSON export failed: {e}")))
    }

    pub fn export_json_file(&self, user_id: i64, path: &Path) -> Result<()> {
        let json = self.export_json_string(user_id)?;
        fs::write(path, json)?;
        tracing::info!(user_id, path = %path.display(), "records exported");
        Ok(())
    }

    /// Import an export into `user_id`, whatever user it was taken from.
    ///
    /// The whole document is validated before anything is written; records
    /// for dates already stored are overwritten. Returns the number of
    /// records imported.
    pub fn import_json_str(&self, user_id: i64, json: &str) -> Result<usize> {
        let doc: ExportDocument = serde_json::from_str(json)
            .map_err(|e| StoreError::InvalidData(format!("invalid JSON: {e}")))?;
        if doc.version > CURRENT_VERSION {
            return Err(StoreError::InvalidData(format!(
                "unsupported export version {} (newest known is {CURRENT_VERSION})",
                doc.version
            )));
        }
        normalize(&doc.records, None)?;

        let count = self.upsert_records(user_id, &doc.records)?;
        tracing::info!(user_id, count, "records imported");
        Ok(count)
    }

    pub fn import_json_file(&self, user_id: i64, path: &Path) -> Result<usize> {
        let json = fs::read_to_string(path)?;
        self.import_json_str(user_id, &json)
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{self, File, create_dir_all};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use uuid::Uuid;

use crate::dataset::TabularDataset;
use crate::error::StoreError;

// Constants
const UPLOADS_FILE: &str = "uploads.json";

/// A stored upload with its parsed rows and summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadRecord {
    /// Unique identifier of the upload
    pub id: Uuid,

    /// Owner of the upload
    pub user_id: String,

    /// Original file name as sent by the client
    pub filename: String,

    /// Parsed rows of the first sheet
    pub data: TabularDataset,

    /// Summary text shown alongside the data
    pub summary: String,

    /// Time the upload was stored
    pub created_at: DateTime<Utc>,
}

impl UploadRecord {
    /// Create a record with a fresh id and the current time
    pub fn new(user_id: &str, filename: &str, data: TabularDataset, summary: String) -> Self {
        UploadRecord {
            id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            filename: filename.to_string(),
            data,
            summary,
            created_at: Utc::now(),
        }
    }
}

/// Upload history kept in a JSON file
///
/// All records live in `uploads.json` inside the database directory. The
/// file is rewritten on every change while holding the write lock.
#[derive(Debug)]
pub struct UploadStore {
    path: PathBuf,
    records: RwLock<Vec<UploadRecord>>,
}

impl UploadStore {
    /// Open the store, creating the directory and file if they don't exist
    ///
    /// # Arguments
    /// * `database_dir` - Directory holding `uploads.json`
    ///
    /// # Returns
    /// * `Result<UploadStore, StoreError>` - The loaded store or an error
    pub fn open(database_dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        let dir = database_dir.as_ref();
        if !dir.exists() {
            create_dir_all(dir)?;
        }

        let path = dir.join(UPLOADS_FILE);
        if !path.exists() {
            let mut file = File::create(&path)?;
            file.write_all(b"[]")?;
        }

        let mut contents = String::new();
        File::open(&path)?.read_to_string(&mut contents)?;
        let records: Vec<UploadRecord> = serde_json::from_str(&contents)?;

        Ok(UploadStore {
            path,
            records: RwLock::new(records),
        })
    }

    /// Persist a new record
    pub fn save(&self, record: UploadRecord) -> Result<(), StoreError> {
        let mut records = self.records.write().unwrap_or_else(|e| e.into_inner());
        records.push(record);
        if let Err(e) = self.flush(&records) {
            records.pop();
            return Err(e);
        }
        Ok(())
    }

    /// Uploads owned by `user_id`, newest first
    pub fn history(&self, user_id: &str) -> Vec<UploadRecord> {
        let records = self.records.read().unwrap_or_else(|e| e.into_inner());
        let mut owned: Vec<UploadRecord> = records
            .iter()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect();
        owned.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        owned
    }

    /// Every upload in the store, newest first
    pub fn all(&self) -> Vec<UploadRecord> {
        let records = self.records.read().unwrap_or_else(|e| e.into_inner());
        let mut all = records.clone();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        all
    }

    /// Delete an upload owned by `user_id`
    ///
    /// # Errors
    /// * `StoreError::NotFound` if no upload has this id for this user
    pub fn delete(&self, id: Uuid, user_id: &str) -> Result<(), StoreError> {
        let mut records = self.records.write().unwrap_or_else(|e| e.into_inner());
        let index = records
            .iter()
            .position(|r| r.id == id && r.user_id == user_id)
            .ok_or(StoreError::NotFound)?;

        let removed = records.remove(index);
        if let Err(e) = self.flush(&records) {
            records.insert(index, removed);
            return Err(e);
        }
        Ok(())
    }

    // Write through a sibling file so a crash never leaves half a file behind
    fn flush(&self, records: &[UploadRecord]) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(records)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

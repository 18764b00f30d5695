//! Keyed, versioned exam date store with file-based persistence.
//!
//! All records live in a single JSON document keyed by course id:
//!
//! ```json
//! { "schema_version": 2, "records": { "loi-gauss": { ... } } }
//! ```
//!
//! Writes are per record and guarded by an optimistic version check that
//! runs under an exclusive lock on `<document>.lock`, so two processes
//! updating the same record cannot silently overwrite each other. The
//! document is replaced atomically through a temp file in the same
//! directory.

use std::collections::BTreeMap;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Utc;
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use thiserror::Error;
use tokio::fs;
use tracing::{debug, warn};

use crate::domain::ExamDateRecord;

/// Current on-disk schema version
pub const SCHEMA_VERSION: u32 = 2;

/// Errors that can occur with the exam date store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Record already exists: {0}")]
    AlreadyExists(String),

    #[error("Version conflict on {course_id}: expected {expected}, found {found}")]
    VersionConflict {
        course_id: String,
        expected: u64,
        found: u64,
    },

    #[error("Failed to lock store: {0}")]
    Lock(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// The persisted document
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoreDocument {
    schema_version: u32,

    #[serde(default)]
    records: BTreeMap<String, ExamDateRecord>,
}

impl StoreDocument {
    fn empty() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            records: BTreeMap::new(),
        }
    }
}

/// Shapes accepted when reading the document
#[derive(Deserialize)]
#[serde(untagged)]
enum PersistedShape {
    /// Keyed document (schema 2)
    Keyed(StoreDocument),

    /// Schema 1: a bare array of records with no version field
    Legacy(Vec<ExamDateRecord>),
}

/// Parse a persisted document, migrating older schemas.
///
/// Returns `None` for anything that cannot be understood; callers treat
/// that as an absent document.
fn parse_document(content: &str) -> Option<StoreDocument> {
    match serde_json::from_str::<PersistedShape>(content) {
        Ok(PersistedShape::Keyed(doc)) if doc.schema_version == SCHEMA_VERSION => Some(doc),
        Ok(PersistedShape::Keyed(doc)) => {
            warn!(
                schema_version = doc.schema_version,
                "Unsupported exam date schema version"
            );
            None
        }
        Ok(PersistedShape::Legacy(legacy)) => {
            debug!(count = legacy.len(), "Migrating legacy exam date array");
            let mut records: BTreeMap<String, ExamDateRecord> = BTreeMap::new();
            for mut record in legacy {
                record.version = 0;
                // Duplicate course ids keep the most recently updated entry
                if let Some(kept) = records.get(&record.course_id) {
                    warn!(
                        course_id = %record.course_id,
                        "Duplicate course in legacy exam date array"
                    );
                    if kept.last_updated > record.last_updated {
                        continue;
                    }
                }
                records.insert(record.course_id.clone(), record);
            }
            Some(StoreDocument {
                schema_version: SCHEMA_VERSION,
                records,
            })
        }
        Err(e) => {
            warn!(error = %e, "Malformed exam date store, treating as empty");
            None
        }
    }
}

/// Exclusive advisory lock held for a read-check-write cycle
struct StoreLock {
    _file: std::fs::File,
}

impl StoreLock {
    async fn acquire(lock_path: PathBuf) -> Result<Self, StoreError> {
        tokio::task::spawn_blocking(move || -> Result<Self, StoreError> {
            let file = OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(false)
                .open(&lock_path)?;
            file.lock_exclusive()
                .map_err(|e| StoreError::Lock(e.to_string()))?;
            // Lock is released when file is dropped
            Ok(Self { _file: file })
        })
        .await
        .map_err(|e| StoreError::Lock(e.to_string()))?
    }
}

/// File-based exam date store
#[derive(Debug, Clone)]
pub struct ExamDateStore {
    /// Path to the JSON document
    path: PathBuf,

    /// Path to the sidecar lock file
    lock_path: PathBuf,
}

impl ExamDateStore {
    /// Create a store backed by the given document path
    pub fn new(path: PathBuf) -> Self {
        let mut lock_name = path.file_name().unwrap_or_default().to_os_string();
        lock_name.push(".lock");
        let lock_path = path.with_file_name(lock_name);

        Self { path, lock_path }
    }

    /// Get the path to the document
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn lock(&self) -> Result<StoreLock, StoreError> {
        if let Some(parent) = self.lock_path.parent() {
            fs::create_dir_all(parent).await?;
        }
        StoreLock::acquire(self.lock_path.clone()).await
    }

    async fn read_document(&self) -> Result<StoreDocument, StoreError> {
        if !self.path.exists() {
            return Ok(StoreDocument::empty());
        }

        let content = fs::read_to_string(&self.path).await?;
        Ok(parse_document(&content).unwrap_or_else(StoreDocument::empty))
    }

    async fn write_document(&self, doc: &StoreDocument) -> Result<(), StoreError> {
        let content = serde_json::to_string_pretty(doc)?;
        let path = self.path.clone();

        tokio::task::spawn_blocking(move || -> Result<(), StoreError> {
            let dir = path.parent().unwrap_or_else(|| Path::new("."));
            std::fs::create_dir_all(dir)?;

            let mut tmp = NamedTempFile::new_in(dir)?;
            tmp.write_all(content.as_bytes())?;
            tmp.flush()?;
            tmp.persist(&path).map_err(|e| e.error)?;
            Ok(())
        })
        .await
        .map_err(|e| StoreError::Io(std::io::Error::new(std::io::ErrorKind::Other, e)))?
    }

    /// Load every record, ordered by course id
    pub async fn load(&self) -> Result<Vec<ExamDateRecord>, StoreError> {
        let doc = self.read_document().await?;
        Ok(doc.records.into_values().collect())
    }

    /// Check if nothing is persisted
    pub async fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.read_document().await?.records.is_empty())
    }

    /// Persist `records` only if the store is empty.
    ///
    /// Returns whether the records were written.
    pub async fn seed_if_empty(&self, records: Vec<ExamDateRecord>) -> Result<bool, StoreError> {
        let _lock = self.lock().await?;

        let doc = self.read_document().await?;
        if !doc.records.is_empty() {
            return Ok(false);
        }

        let mut doc = StoreDocument::empty();
        for mut record in records {
            record.version = 1;
            doc.records.insert(record.course_id.clone(), record);
        }
        self.write_document(&doc).await?;

        debug!(count = doc.records.len(), "Seeded exam date store");
        Ok(true)
    }

    /// All records belonging to a faculty
    pub async fn get_all(&self, faculty_id: &str) -> Result<Vec<ExamDateRecord>, StoreError> {
        let records = self.load().await?;
        Ok(records
            .into_iter()
            .filter(|r| r.faculty_id == faculty_id)
            .collect())
    }

    /// A course's record within a faculty
    pub async fn get_by_course(
        &self,
        course_id: &str,
        faculty_id: &str,
    ) -> Result<Option<ExamDateRecord>, StoreError> {
        let records = self.get_all(faculty_id).await?;
        Ok(records.into_iter().find(|r| r.course_id == course_id))
    }

    /// A course's record regardless of faculty
    pub async fn get(&self, course_id: &str) -> Result<Option<ExamDateRecord>, StoreError> {
        let mut doc = self.read_document().await?;
        Ok(doc.records.remove(course_id))
    }

    /// The record whose current proposal has the given id
    pub async fn find_by_proposal(
        &self,
        proposal_id: &str,
    ) -> Result<Option<ExamDateRecord>, StoreError> {
        let records = self.load().await?;
        Ok(records
            .into_iter()
            .find(|r| r.has_current_proposal(proposal_id)))
    }

    /// Overwrite the whole collection.
    ///
    /// Every saved record gets a version above both its own and the one
    /// previously persisted.
    pub async fn save(&self, records: Vec<ExamDateRecord>) -> Result<(), StoreError> {
        let _lock = self.lock().await?;

        let previous = self.read_document().await?;
        let mut doc = StoreDocument::empty();

        for mut record in records {
            let persisted = previous
                .records
                .get(&record.course_id)
                .map(|r| r.version)
                .unwrap_or(0);
            record.version = record.version.max(persisted) + 1;
            doc.records.insert(record.course_id.clone(), record);
        }

        self.write_document(&doc).await
    }

    /// Add a record that does not exist yet
    pub async fn insert(&self, mut record: ExamDateRecord) -> Result<ExamDateRecord, StoreError> {
        let _lock = self.lock().await?;

        let mut doc = self.read_document().await?;
        if doc.records.contains_key(&record.course_id) {
            return Err(StoreError::AlreadyExists(record.course_id));
        }

        record.version = 1;
        record.last_updated = Utc::now();
        doc.records.insert(record.course_id.clone(), record.clone());
        self.write_document(&doc).await?;

        Ok(record)
    }

    /// Replace a record, provided nobody wrote it since it was read.
    ///
    /// `record.version` must equal the persisted version; the stored copy
    /// is returned with the bumped version.
    pub async fn update(&self, mut record: ExamDateRecord) -> Result<ExamDateRecord, StoreError> {
        let _lock = self.lock().await?;

        let mut doc = self.read_document().await?;
        let found = doc
            .records
            .get(&record.course_id)
            .map(|r| r.version)
            .ok_or_else(|| StoreError::NotFound(record.course_id.clone()))?;

        if found != record.version {
            return Err(StoreError::VersionConflict {
                course_id: record.course_id,
                expected: record.version,
                found,
            });
        }

        record.version += 1;
        record.last_updated = Utc::now();
        doc.records.insert(record.course_id.clone(), record.clone());
        self.write_document(&doc).await?;

        Ok(record)
    }

    /// Delete the persisted document.
    ///
    /// Returns whether anything was removed.
    pub async fn reset(&self) -> Result<bool, StoreError> {
        let _lock = self.lock().await?;

        if !self.path.exists() {
            return Ok(false);
        }

        fs::remove_file(&self.path).await?;
        Ok(true)
    }
}

//! Local transactional record store for TalentFlow, persisted as an atomically written
//! JSON snapshot.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sha2::{Digest, Sha256};
use tflow_core::{
    AssessmentDocument, AssessmentResponse, Candidate, Job, MetaEntry, TimelineEvent,
};
use thiserror::Error;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::{Mutex, RwLock};
use tracing::debug;
use uuid::Uuid;

pub const CRATE_NAME: &str = "tflow-storage";

/// Meta key set once the seed generator has populated the store.
pub const SEEDED_META_KEY: &str = "seeded";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{table} record {key} not found")]
    NotFound { table: &'static str, key: String },
    #[error("{table} record {key} already exists")]
    Constraint { table: &'static str, key: String },
    #[error("{table} has no index on {field}")]
    UnknownIndex { table: &'static str, field: String },
    #[error("io error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("snapshot serialization failed: {0}")]
    Serde(#[from] serde_json::Error),
}

impl StoreError {
    fn io(path: &Path) -> impl FnOnce(std::io::Error) -> StoreError + '_ {
        move |source| StoreError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Comparable value of an indexed field.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum IndexValue {
    Int(i64),
    Text(String),
}

impl From<&str> for IndexValue {
    fn from(value: &str) -> Self {
        IndexValue::Text(value.to_string())
    }
}

impl From<String> for IndexValue {
    fn from(value: String) -> Self {
        IndexValue::Text(value)
    }
}

impl From<i64> for IndexValue {
    fn from(value: i64) -> Self {
        IndexValue::Int(value)
    }
}

impl From<u32> for IndexValue {
    fn from(value: u32) -> Self {
        IndexValue::Int(i64::from(value))
    }
}

/// A record kept in a [`Table`], with its primary key and declared indexes.
pub trait Record: Clone + Serialize + DeserializeOwned {
    const TABLE: &'static str;
    const INDEXES: &'static [&'static str];

    fn key(&self) -> &str;

    /// Value of a declared index field; `None` when the field is absent on this record.
    fn index_value(&self, field: &str) -> Option<IndexValue>;
}

impl Record for Job {
    const TABLE: &'static str = "jobs";
    const INDEXES: &'static [&'static str] = &["slug", "status", "order", "createdAt"];

    fn key(&self) -> &str {
        &self.id
    }

    fn index_value(&self, field: &str) -> Option<IndexValue> {
        match field {
            "slug" => Some(self.slug.as_str().into()),
            "status" => Some(self.status.as_str().into()),
            "order" => Some(self.order.into()),
            "createdAt" => Some(self.created_at.timestamp_millis().into()),
            _ => None,
        }
    }
}

impl Record for Candidate {
    const TABLE: &'static str = "candidates";
    const INDEXES: &'static [&'static str] = &["jobId", "stage", "createdAt"];

    fn key(&self) -> &str {
        &self.id
    }

    fn index_value(&self, field: &str) -> Option<IndexValue> {
        match field {
            "jobId" => Some(self.job_id.as_str().into()),
            "stage" => Some(self.stage.as_str().into()),
            "createdAt" => Some(self.created_at.timestamp_millis().into()),
            _ => None,
        }
    }
}

impl Record for TimelineEvent {
    const TABLE: &'static str = "timelines";
    const INDEXES: &'static [&'static str] = &["candidateId", "at"];

    fn key(&self) -> &str {
        &self.id
    }

    fn index_value(&self, field: &str) -> Option<IndexValue> {
        match field {
            "candidateId" => Some(self.candidate_id.as_str().into()),
            "at" => Some(self.at.timestamp_millis().into()),
            _ => None,
        }
    }
}

impl Record for AssessmentDocument {
    const TABLE: &'static str = "assessments";
    const INDEXES: &'static [&'static str] = &["updatedAt"];

    fn key(&self) -> &str {
        &self.job_id
    }

    fn index_value(&self, field: &str) -> Option<IndexValue> {
        match field {
            "updatedAt" => Some(self.updated_at.timestamp_millis().into()),
            _ => None,
        }
    }
}

impl Record for AssessmentResponse {
    const TABLE: &'static str = "responses";
    const INDEXES: &'static [&'static str] = &["jobId", "candidateId", "at"];

    fn key(&self) -> &str {
        &self.id
    }

    fn index_value(&self, field: &str) -> Option<IndexValue> {
        match field {
            "jobId" => Some(self.job_id.as_str().into()),
            "candidateId" => Some(self.candidate_id.as_str().into()),
            "at" => Some(self.at.timestamp_millis().into()),
            _ => None,
        }
    }
}

impl Record for MetaEntry {
    const TABLE: &'static str = "meta";
    const INDEXES: &'static [&'static str] = &[];

    fn key(&self) -> &str {
        &self.key
    }

    fn index_value(&self, _field: &str) -> Option<IndexValue> {
        None
    }
}

/// Primary-key ordered collection of one record type.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent, bound = "T: Record")]
pub struct Table<T> {
    rows: BTreeMap<String, T>,
}

impl<T> Default for Table<T> {
    fn default() -> Self {
        Self {
            rows: BTreeMap::new(),
        }
    }
}

impl<T: Record> Table<T> {
    pub fn get(&self, key: &str) -> Option<&T> {
        self.rows.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.rows.contains_key(key)
    }

    pub fn count(&self) -> usize {
        self.rows.len()
    }

    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.rows.values()
    }

    /// Add a new record; an existing key is a constraint violation.
    pub fn insert(&mut self, record: T) -> Result<(), StoreError> {
        let key = record.key().to_string();
        if self.rows.contains_key(&key) {
            return Err(StoreError::Constraint {
                table: T::TABLE,
                key,
            });
        }
        self.rows.insert(key, record);
        Ok(())
    }

    pub fn bulk_insert(&mut self, records: impl IntoIterator<Item = T>) -> Result<(), StoreError> {
        for record in records {
            self.insert(record)?;
        }
        Ok(())
    }

    /// Insert or replace by primary key.
    pub fn put(&mut self, record: T) {
        self.rows.insert(record.key().to_string(), record);
    }

    /// Merge a patch onto an existing record. The patch must keep the primary key.
    pub fn update(&mut self, key: &str, patch: impl FnOnce(&mut T)) -> Result<&T, StoreError> {
        let row = self.rows.get_mut(key).ok_or_else(|| StoreError::NotFound {
            table: T::TABLE,
            key: key.to_string(),
        })?;
        patch(row);
        if row.key() != key {
            return Err(StoreError::Constraint {
                table: T::TABLE,
                key: row.key().to_string(),
            });
        }
        Ok(&*row)
    }

    pub fn filter(&self, mut predicate: impl FnMut(&T) -> bool) -> Vec<&T> {
        self.rows.values().filter(|row| predicate(row)).collect()
    }

    pub fn where_equals(
        &self,
        field: &str,
        value: impl Into<IndexValue>,
    ) -> Result<Vec<&T>, StoreError> {
        self.check_index(field)?;
        let value = value.into();
        Ok(self.filter(|row| row.index_value(field).as_ref() == Some(&value)))
    }

    /// Records whose index value falls in `[lower, upper)`.
    pub fn where_between(
        &self,
        field: &str,
        lower: impl Into<IndexValue>,
        upper: impl Into<IndexValue>,
    ) -> Result<Vec<&T>, StoreError> {
        self.check_index(field)?;
        let (lower, upper) = (lower.into(), upper.into());
        Ok(self.filter(|row| {
            row.index_value(field)
                .is_some_and(|v| v >= lower && v < upper)
        }))
    }

    /// All records sorted ascending by an index field, ties broken by primary key.
    pub fn order_by(&self, field: &str) -> Result<Vec<&T>, StoreError> {
        self.check_index(field)?;
        let mut rows = self.rows.values().collect::<Vec<_>>();
        rows.sort_by_cached_key(|row| row.index_value(field));
        Ok(rows)
    }

    pub fn clear(&mut self) {
        self.rows.clear();
    }

    fn check_index(&self, field: &str) -> Result<(), StoreError> {
        if T::INDEXES.contains(&field) {
            Ok(())
        } else {
            Err(StoreError::UnknownIndex {
                table: T::TABLE,
                field: field.to_string(),
            })
        }
    }
}

/// Every table of the store. Transactions operate on a staged copy of this value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Database {
    #[serde(default)]
    pub jobs: Table<Job>,
    #[serde(default)]
    pub candidates: Table<Candidate>,
    #[serde(default)]
    pub timelines: Table<TimelineEvent>,
    #[serde(default)]
    pub assessments: Table<AssessmentDocument>,
    #[serde(default)]
    pub responses: Table<AssessmentResponse>,
    #[serde(default)]
    pub meta: Table<MetaEntry>,
}

impl Database {
    pub fn meta_value(&self, key: &str) -> Option<&JsonValue> {
        self.meta.get(key).map(|entry| &entry.value)
    }

    pub fn is_seeded(&self) -> bool {
        self.meta_value(SEEDED_META_KEY)
            .and_then(JsonValue::as_bool)
            .unwrap_or(false)
    }

    pub fn set_meta(&mut self, key: &str, value: JsonValue) {
        self.meta.put(MetaEntry {
            key: key.to_string(),
            value,
        });
    }

    pub fn counts(&self) -> TableCounts {
        TableCounts {
            jobs: self.jobs.count(),
            candidates: self.candidates.count(),
            timelines: self.timelines.count(),
            assessments: self.assessments.count(),
            responses: self.responses.count(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TableCounts {
    pub jobs: usize,
    pub candidates: usize,
    pub timelines: usize,
    pub assessments: usize,
    pub responses: usize,
}

#[derive(Debug)]
struct SnapshotFile {
    path: PathBuf,
    last_hash: Mutex<Option<String>>,
}

impl SnapshotFile {
    fn sha256_hex(bytes: &[u8]) -> String {
        let mut hasher = Sha256::new();
        hasher.update(bytes);
        hex::encode(hasher.finalize())
    }

    /// Write the snapshot through a temp file and atomic rename; unchanged content is skipped.
    async fn persist(&self, db: &Database) -> Result<bool, StoreError> {
        let bytes = serde_json::to_vec(db)?;
        let hash = Self::sha256_hex(&bytes);
        let mut last_hash = self.last_hash.lock().await;
        if last_hash.as_deref() == Some(hash.as_str()) {
            return Ok(false);
        }

        let parent = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(parent)
            .await
            .map_err(StoreError::io(parent))?;

        let file_name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "store".to_string());
        let temp_path = parent.join(format!(".{file_name}.{}.tmp", Uuid::new_v4()));

        let mut file = fs::OpenOptions::new()
            .create_new(true)
            .write(true)
            .open(&temp_path)
            .await
            .map_err(StoreError::io(&temp_path))?;
        file.write_all(&bytes)
            .await
            .map_err(StoreError::io(&temp_path))?;
        file.flush().await.map_err(StoreError::io(&temp_path))?;
        drop(file);

        if let Err(err) = fs::rename(&temp_path, &self.path).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(StoreError::Io {
                path: self.path.clone(),
                source: err,
            });
        }

        debug!(path = %self.path.display(), bytes = bytes.len(), hash = %hash, "snapshot written");
        *last_hash = Some(hash);
        Ok(true)
    }
}

/// Shared handle to the database. Cloning shares the same underlying state.
#[derive(Debug, Clone)]
pub struct Store {
    db: Arc<RwLock<Database>>,
    snapshot: Option<Arc<SnapshotFile>>,
}

impl Store {
    /// A store that lives only as long as the process.
    pub fn in_memory() -> Self {
        Self {
            db: Arc::new(RwLock::new(Database::default())),
            snapshot: None,
        }
    }

    /// Open the store persisted at `path`, loading its snapshot when one exists.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let exists = fs::try_exists(&path)
            .await
            .map_err(StoreError::io(&path))?;
        let (db, last_hash) = if exists {
            let bytes = fs::read(&path).await.map_err(StoreError::io(&path))?;
            let db: Database = serde_json::from_slice(&bytes)?;
            (db, Some(SnapshotFile::sha256_hex(&bytes)))
        } else {
            (Database::default(), None)
        };
        debug!(path = %path.display(), loaded = exists, "store opened");

        Ok(Self {
            db: Arc::new(RwLock::new(db)),
            snapshot: Some(Arc::new(SnapshotFile {
                path,
                last_hash: Mutex::new(last_hash),
            })),
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.snapshot.as_deref().map(|s| s.path.as_path())
    }

    /// Run `f` against a consistent view of the database.
    pub async fn read<R>(&self, f: impl FnOnce(&Database) -> R) -> R {
        let guard = self.db.read().await;
        f(&guard)
    }

    /// Run `f` on a staged copy of the database and commit it only if `f` succeeds.
    ///
    /// Writers are serialized; readers never observe a partially applied transaction.
    pub async fn transaction<R, E>(
        &self,
        f: impl FnOnce(&mut Database) -> Result<R, E>,
    ) -> Result<R, E>
    where
        E: From<StoreError>,
    {
        let mut guard = self.db.write().await;
        let mut staged = guard.clone();
        let out = f(&mut staged)?;
        if let Some(snapshot) = &self.snapshot {
            snapshot.persist(&staged).await?;
        }
        *guard = staged;
        Ok(out)
    }

    /// Drop every record, including the seeding flag.
    pub async fn clear(&self) -> Result<(), StoreError> {
        self.transaction(|db| {
            *db = Database::default();
            Ok::<_, StoreError>(())
        })
        .await
    }

    /// Flush the current state to disk and release the handle.
    pub async fn close(self) -> Result<(), StoreError> {
        if let Some(snapshot) = &self.snapshot {
            let guard = self.db.read().await;
            snapshot.persist(&guard).await?;
        }
        Ok(())
    }
}

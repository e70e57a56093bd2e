//! JSON-file record store keyed by UID.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use alloy::primitives::B256;
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

/// Errors from reading or writing a store file.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Failed to access store {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Store {path} is not a valid JSON record list: {source}")]
    Format {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

pub type StorageResult<T> = Result<T, StorageError>;

/// A record that can live in a [`JsonStore`].
pub trait StoredRecord: Serialize + DeserializeOwned + Clone {
    fn uid(&self) -> B256;
}

/// Result of [`JsonStore::insert`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    /// A record with this UID was already stored; the file is unchanged.
    Duplicate,
}

/// Store of records in a single JSON file.
///
/// Every call re-reads the file, so separate invocations always see each
/// other's writes.
#[derive(Debug, Clone)]
pub struct JsonStore<T> {
    path: PathBuf,
    _record: PhantomData<T>,
}

impl<T: StoredRecord> JsonStore<T> {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            _record: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All records in insertion order. A missing file is an empty store.
    pub fn list(&self) -> StorageResult<Vec<T>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let file = File::open(&self.path).map_err(|source| self.io_error(source))?;
        let reader = BufReader::new(file);
        let records: Vec<T> =
            serde_json::from_reader(reader).map_err(|source| StorageError::Format {
                path: self.path.clone(),
                source,
            })?;
        tracing::debug!(path = %self.path.display(), count = records.len(), "Loaded store");
        Ok(records)
    }

    pub fn find(&self, uid: B256) -> StorageResult<Option<T>> {
        Ok(self.list()?.into_iter().find(|r| r.uid() == uid))
    }

    /// Append `record` unless its UID is already present.
    pub fn insert(&self, record: &T) -> StorageResult<InsertOutcome> {
        let mut records = self.list()?;
        let uid = record.uid();
        if records.iter().any(|r| r.uid() == uid) {
            tracing::warn!(uid = %uid, path = %self.path.display(), "Record already stored");
            return Ok(InsertOutcome::Duplicate);
        }
        records.push(record.clone());
        self.write(&records)?;
        tracing::info!(uid = %uid, path = %self.path.display(), total = records.len(), "Stored record");
        Ok(InsertOutcome::Inserted)
    }

    fn write(&self, records: &[T]) -> StorageResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| self.io_error(source))?;
        }

        let file_name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "store".to_string());
        let tmp_path = self
            .path
            .with_file_name(format!(".{}.{}.tmp", file_name, uuid::Uuid::new_v4()));

        let result = (|| -> std::io::Result<()> {
            let file = File::create(&tmp_path)?;
            let mut writer = BufWriter::new(file);
            serde_json::to_writer_pretty(&mut writer, records)?;
            writer.write_all(b"\n")?;
            writer.flush()?;
            fs::rename(&tmp_path, &self.path)
        })();

        result.map_err(|source| {
            let _ = fs::remove_file(&tmp_path);
            self.io_error(source)
        })
    }

    fn io_error(&self, source: std::io::Error) -> StorageError {
        StorageError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

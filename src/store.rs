//! Cache storage backends.
//!
//! The aggregator only sees [`CacheStore`]; the file backend keeps the whole
//! cache as one pretty-printed JSON document, the memory backend is used by
//! tests and ephemeral deployments.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::io::AsyncWriteExt;
use tokio::sync::{Mutex, RwLock};

use crate::error::{Result, WeatherError};
use crate::models::CacheRecord;

#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Returns the record for `key`, or `None` when nothing usable is cached
    async fn get(&self, key: &str) -> Result<Option<CacheRecord>>;

    /// Inserts or replaces the record for `key`
    async fn put(&self, key: &str, record: CacheRecord) -> Result<()>;
}

// ============================================================================
// File backend
// ============================================================================

/// Whole-document JSON store. Every `put` reads the document, replaces one
/// entry and rewrites the file.
#[derive(Debug)]
pub struct FileCacheStore {
    path: PathBuf,
    // Serializes read-modify-write cycles inside this process only
    write_lock: Mutex<()>,
}

impl FileCacheStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_document(&self) -> Result<Map<String, Value>> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Map::new()),
            Err(e) => return Err(e.into()),
        };

        serde_json::from_slice(&bytes).map_err(|e| {
            WeatherError::CacheIo(format!(
                "cache document {} is not a JSON object: {}",
                self.path.display(),
                e
            ))
        })
    }
}

#[async_trait]
impl CacheStore for FileCacheStore {
    async fn get(&self, key: &str) -> Result<Option<CacheRecord>> {
        let mut document = self.read_document().await?;
        let Some(entry) = document.remove(key) else {
            return Ok(None);
        };

        match serde_json::from_value(entry) {
            Ok(record) => Ok(Some(record)),
            Err(e) => {
                // An unreadable entry is refetched and overwritten on the next put
                tracing::warn!("Ignoring unreadable cache entry for {}: {}", key, e);
                Ok(None)
            }
        }
    }

    async fn put(&self, key: &str, record: CacheRecord) -> Result<()> {
        let _guard = self.write_lock.lock().await;

        let mut document = self.read_document().await?;
        let entry = serde_json::to_value(&record)
            .map_err(|e| WeatherError::CacheIo(format!("failed to encode cache record: {}", e)))?;
        document.insert(key.to_string(), entry);

        let bytes = to_pretty_json(&document)?;
        atomic_write(&self.path, &bytes).await?;

        tracing::debug!("Wrote cache entry for {} to {}", key, self.path.display());
        Ok(())
    }
}

fn to_pretty_json<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value
        .serialize(&mut serializer)
        .map_err(|e| WeatherError::CacheIo(format!("failed to encode cache document: {}", e)))?;
    Ok(buf)
}

/// Writes to a unique sibling temp file, syncs, then renames over `path`
async fn atomic_write(path: &Path, bytes: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }

    let tmp_path = unique_tmp_path(path);
    let result = write_and_rename(&tmp_path, path, bytes).await;
    if result.is_err() {
        let _ = tokio::fs::remove_file(&tmp_path).await;
    }
    result
}

fn unique_tmp_path(path: &Path) -> PathBuf {
    let pid = std::process::id();
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.subsec_nanos())
        .unwrap_or(0);
    let file_name = path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("cache");

    path.with_file_name(format!(".{}.tmp.{}.{}", file_name, pid, nanos))
}

async fn write_and_rename(tmp_path: &Path, target_path: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut file = tokio::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(tmp_path)
        .await?;
    file.write_all(bytes).await?;
    file.flush().await?;
    file.sync_all().await?;
    drop(file);

    tokio::fs::rename(tmp_path, target_path).await
}

// ============================================================================
// Memory backend
// ============================================================================

#[derive(Debug, Default)]
pub struct MemoryCacheStore {
    records: RwLock<HashMap<String, CacheRecord>>,
}

impl MemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl CacheStore for MemoryCacheStore {
    async fn get(&self, key: &str) -> Result<Option<CacheRecord>> {
        Ok(self.records.read().await.get(key).cloned())
    }

    async fn put(&self, key: &str, record: CacheRecord) -> Result<()> {
        self.records.write().await.insert(key.to_string(), record);
        Ok(())
    }
}

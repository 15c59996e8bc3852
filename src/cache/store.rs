//! On-disk scan cache.

use anyhow::Context;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::entry::CacheEntry;
use crate::error::{Result, UpkeepError};
use crate::package::PackageRecord;

/// Single-file cache of the last merged scan.
#[derive(Debug, Clone)]
pub struct ScanCache {
    path: PathBuf,
    ttl: Duration,
}

impl ScanCache {
    /// Create a cache backed by `path`, valid for `ttl` after each write.
    pub fn new(path: impl Into<PathBuf>, ttl: Duration) -> Self {
        Self {
            path: path.into(),
            ttl,
        }
    }

    /// Location of the cache file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Time-to-live of a written entry.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Rows of a non-empty entry still within its TTL.
    ///
    /// Missing, unreadable or corrupt files read as absent.
    pub fn read_fresh(&self) -> Option<Vec<PackageRecord>> {
        let entry = self.load().ok()??;
        if entry.rows.is_empty() || !entry.is_fresh(self.ttl) {
            return None;
        }
        Some(entry.rows)
    }

    /// The cached entry regardless of age.
    pub fn read_any(&self) -> Option<CacheEntry> {
        match self.load() {
            Ok(entry) => entry,
            Err(e) => {
                tracing::debug!("Ignoring unreadable cache: {}", e);
                None
            }
        }
    }

    /// Load the entry, distinguishing a missing file from a broken one.
    pub fn load(&self) -> Result<Option<CacheEntry>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let json = fs::read_to_string(&self.path)?;
        let entry = serde_json::from_str(&json).map_err(|e| UpkeepError::Cache {
            path: self.path.clone(),
            message: e.to_string(),
        })?;
        Ok(Some(entry))
    }

    /// Replace the cache with `rows`, stamped now.
    ///
    /// Written to a temp file and renamed so readers never see a partial file.
    pub fn write(&self, rows: &[PackageRecord]) -> Result<()> {
        self.write_entry(&CacheEntry::new(rows.to_vec()))
    }

    /// Replace the cache with an explicit entry.
    pub fn write_entry(&self, entry: &CacheEntry) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create cache directory {:?}", parent))?;
        }

        let json = serde_json::to_string_pretty(entry).map_err(|e| UpkeepError::Cache {
            path: self.path.clone(),
            message: e.to_string(),
        })?;

        let temp_path = self.path.with_extension("json.tmp");
        fs::write(&temp_path, json)
            .with_context(|| format!("Failed to write cache file {:?}", temp_path))?;
        fs::rename(&temp_path, &self.path)
            .with_context(|| format!("Failed to replace cache file {:?}", self.path))?;

        tracing::debug!(path = %self.path.display(), rows = entry.rows.len(), "Cache written");
        Ok(())
    }

    /// Delete the cache file. Returns whether one existed.
    pub fn clear(&self) -> Result<bool> {
        if !self.path.exists() {
            return Ok(false);
        }
        fs::remove_file(&self.path)?;
        Ok(true)
    }
}

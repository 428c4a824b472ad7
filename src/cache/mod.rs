// src/cache/mod.rs — Theme-partitioned, write-through result cache
//
// On disk: {"<theme>": {"<key>": <string | [string, ...]>}}.
// The whole file is loaded once and rewritten after every mutation, so a
// crash mid-tournament keeps every match decided so far.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::infra::errors::TourneyError;

/// A cached decision: a generated entity list or a single match winner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CacheValue {
    List(Vec<String>),
    Winner(String),
}

impl CacheValue {
    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            CacheValue::List(items) => Some(items),
            CacheValue::Winner(_) => None,
        }
    }
}

type Partitions = BTreeMap<String, BTreeMap<String, CacheValue>>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub themes: usize,
    pub entries: usize,
}

pub struct CacheStore {
    path: PathBuf,
    entries: Mutex<Partitions>,
}

impl CacheStore {
    /// Load the cache file. A missing file yields an empty store.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, TourneyError> {
        let path = path.into();
        let entries = if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            if content.trim().is_empty() {
                Partitions::new()
            } else {
                serde_json::from_str(&content).map_err(|e| TourneyError::Cache {
                    path: path.display().to_string(),
                    message: format!("not a valid cache file: {e}"),
                })?
            }
        } else {
            Partitions::new()
        };

        let store = Self {
            path,
            entries: Mutex::new(entries),
        };
        let stats = store.stats();
        tracing::debug!(
            path = %store.path.display(),
            themes = stats.themes,
            entries = stats.entries,
            "cache loaded"
        );
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self, theme: &str, key: &str) -> Option<CacheValue> {
        let entries = self.lock();
        entries.get(theme).and_then(|t| t.get(key)).cloned()
    }

    /// Insert a value and persist the whole cache before returning.
    pub fn set(&self, theme: &str, key: &str, value: CacheValue) -> Result<(), TourneyError> {
        let mut entries = self.lock();
        entries
            .entry(theme.to_string())
            .or_default()
            .insert(key.to_string(), value);
        self.flush(&entries)
    }

    pub fn themes(&self) -> Vec<String> {
        self.lock().keys().cloned().collect()
    }

    pub fn stats(&self) -> CacheStats {
        let entries = self.lock();
        CacheStats {
            themes: entries.len(),
            entries: entries.values().map(|t| t.len()).sum(),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Partitions> {
        // A panic mid-insert leaves the map itself consistent.
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Atomic rewrite: write to a temp file, then rename over the cache file.
    fn flush(&self, entries: &Partitions) -> Result<(), TourneyError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(entries)?;
        let tmp_path = self.path.with_extension("json.tmp");
        std::fs::write(&tmp_path, json)?;
        std::fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }
}

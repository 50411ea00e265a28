//! Key-value store port.
//!
//! Everything the app persists goes through [`KeyValueStore`]: a synchronous
//! string → string mapping. The engines never touch a store directly; callers
//! read snapshots and pass lookups in. [`MemoryStore`] keeps the map in a
//! `BTreeMap` for tests; [`FileStore`] persists it as `.routine/store.json`.

use crate::error::{Result, RoutineError};
use crate::{io, paths};
use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Port
// ---------------------------------------------------------------------------

pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
    fn remove(&mut self, key: &str) -> Result<()>;
}

/// Read and deserialize a JSON value. Missing keys yield `None`.
pub fn get_json<T, S>(store: &S, key: &str) -> Result<Option<T>>
where
    T: DeserializeOwned,
    S: KeyValueStore + ?Sized,
{
    match store.get(key) {
        Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
        None => Ok(None),
    }
}

pub fn set_json<T, S>(store: &mut S, key: &str, value: &T) -> Result<()>
where
    T: Serialize + ?Sized,
    S: KeyValueStore + ?Sized,
{
    let raw = serde_json::to_string(value)?;
    store.set(key, &raw)
}

// ---------------------------------------------------------------------------
// Key layout
// ---------------------------------------------------------------------------

pub mod keys {
    use super::*;

    pub const GOAL: &str = "userGoal";
    pub const ROUTINES: &str = "userRoutines";
    pub const API_KEY: &str = "gemini_api_key";
    pub const KEY_FAILURES: &str = "coach_key_failures";

    pub fn status(routine_id: u64, date: NaiveDate) -> String {
        format!("routine_{routine_id}_{}", paths::date_key(date))
    }

    pub fn reflection(routine_id: u64, date: NaiveDate) -> String {
        format!("routine_{routine_id}_reflection_{}", paths::date_key(date))
    }

    pub fn weekly_reflection(year: i32, week: u32) -> String {
        format!("reflection_{year}_{week}")
    }
}

// ---------------------------------------------------------------------------
// MemoryStore
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: BTreeMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.entries.remove(key);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// FileStore
// ---------------------------------------------------------------------------

/// Write-through store backed by `.routine/store.json`.
///
/// The whole map is loaded on open and rewritten atomically on every mutation.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl FileStore {
    /// Open the store under `root`. Requires `routine init` to have run.
    pub fn open(root: &Path) -> Result<Self> {
        if !paths::routine_dir(root).is_dir() {
            return Err(RoutineError::NotInitialized);
        }
        let path = paths::store_path(root);
        let entries = if path.exists() {
            let data = std::fs::read_to_string(&path)?;
            if data.trim().is_empty() {
                BTreeMap::new()
            } else {
                serde_json::from_str(&data)?
            }
        } else {
            BTreeMap::new()
        };
        Ok(Self { path, entries })
    }

    fn flush(&self) -> Result<()> {
        let data = serde_json::to_string_pretty(&self.entries)?;
        io::atomic_write(&self.path, data.as_bytes())?;
        tracing::debug!(path = %self.path.display(), entries = self.entries.len(), "store flushed");
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        self.flush()
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        if self.entries.remove(key).is_some() {
            self.flush()?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn init_dir() -> TempDir {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join(".routine")).unwrap();
        dir
    }

    #[test]
    fn memory_store_get_set_remove() {
        let mut store = MemoryStore::new();
        assert!(store.get("a").is_none());
        store.set("a", "1").unwrap();
        assert_eq!(store.get("a").as_deref(), Some("1"));
        store.set("a", "2").unwrap();
        assert_eq!(store.get("a").as_deref(), Some("2"));
        store.remove("a").unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn status_key_roundtrip() {
        let mut store = MemoryStore::new();
        let day = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        store.set(&keys::status(42, day), "completed").unwrap();
        assert_eq!(
            store.get(&keys::status(42, day)).as_deref(),
            Some("completed")
        );
        assert_eq!(keys::status(42, day), "routine_42_2024-05-01");
        assert_eq!(
            keys::reflection(42, day),
            "routine_42_reflection_2024-05-01"
        );
        assert_eq!(keys::weekly_reflection(2024, 18), "reflection_2024_18");
    }

    #[test]
    fn json_helpers_roundtrip() {
        let mut store = MemoryStore::new();
        set_json(&mut store, "list", &vec![1u32, 2, 3]).unwrap();
        let back: Vec<u32> = get_json(&store, "list").unwrap().unwrap();
        assert_eq!(back, vec![1, 2, 3]);
        let missing: Option<Vec<u32>> = get_json(&store, "nope").unwrap();
        assert!(missing.is_none());
    }

    #[test]
    fn file_store_requires_init() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            FileStore::open(dir.path()),
            Err(RoutineError::NotInitialized)
        ));
    }

    #[test]
    fn file_store_persists_across_opens() {
        let dir = init_dir();
        {
            let mut store = FileStore::open(dir.path()).unwrap();
            store.set("gemini_api_key", "abc").unwrap();
            store.set("routine_1_2024-01-01", "skipped").unwrap();
        }
        let mut store = FileStore::open(dir.path()).unwrap();
        assert_eq!(store.get("gemini_api_key").as_deref(), Some("abc"));
        store.remove("gemini_api_key").unwrap();

        let reopened = FileStore::open(dir.path()).unwrap();
        assert!(reopened.get("gemini_api_key").is_none());
        assert_eq!(
            reopened.get("routine_1_2024-01-01").as_deref(),
            Some("skipped")
        );
    }
}

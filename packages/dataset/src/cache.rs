//! Content-addressed cache of parsed datasets.
//!
//! Uploads are keyed by the SHA-256 of their bytes, so re-uploading the
//! same file reuses the parsed table while any change to the content
//! produces a fresh entry. The cache holds at most `capacity` datasets
//! and evicts the least recently used one when full.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError};

use sha2::{Digest, Sha256};

use crate::loader::{FileFormat, load_bytes};
use crate::{Dataset, DatasetError};

/// Default number of datasets kept in memory.
pub const DEFAULT_CAPACITY: usize = 8;

/// Returns the cache key for a file's content: lowercase hex SHA-256.
#[must_use]
pub fn content_key(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// A dataset handed out by the cache.
#[derive(Debug, Clone)]
pub struct CachedDataset {
    /// Content key identifying the dataset.
    pub id: String,
    /// The parsed table.
    pub dataset: Arc<Dataset>,
    /// Whether the dataset was already cached (no parse happened).
    pub cached: bool,
}

struct CacheEntry {
    dataset: Arc<Dataset>,
    last_used: u64,
}

#[derive(Default)]
struct CacheState {
    clock: u64,
    entries: BTreeMap<String, CacheEntry>,
}

impl CacheState {
    fn touch(&mut self, id: &str) -> Option<Arc<Dataset>> {
        self.clock += 1;
        let clock = self.clock;
        self.entries.get_mut(id).map(|entry| {
            entry.last_used = clock;
            Arc::clone(&entry.dataset)
        })
    }

    fn evict_lru(&mut self) {
        let oldest = self
            .entries
            .iter()
            .min_by_key(|(_, entry)| entry.last_used)
            .map(|(id, _)| id.clone());
        if let Some(id) = oldest {
            log::debug!("Evicting dataset {id} from cache");
            self.entries.remove(&id);
        }
    }
}

/// Thread-safe LRU cache of parsed datasets.
pub struct DatasetCache {
    capacity: usize,
    state: Mutex<CacheState>,
}

impl Default for DatasetCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl DatasetCache {
    /// Creates a cache holding at most `capacity` datasets (minimum 1).
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            state: Mutex::new(CacheState::default()),
        }
    }

    /// Returns the cached dataset for `bytes`, parsing and inserting it on
    /// a miss.
    ///
    /// Parsing happens outside the lock, so a slow upload does not block
    /// lookups of other datasets.
    ///
    /// # Errors
    ///
    /// Returns [`DatasetError`] if the content cannot be parsed. Failed
    /// parses are not cached.
    pub fn load(&self, bytes: &[u8], format: FileFormat) -> Result<CachedDataset, DatasetError> {
        let id = content_key(bytes);

        if let Some(dataset) = self.lock().touch(&id) {
            log::debug!("Dataset cache hit for {id}");
            return Ok(CachedDataset {
                id,
                dataset,
                cached: true,
            });
        }

        let dataset = Arc::new(load_bytes(bytes, format)?);

        let mut state = self.lock();
        if !state.entries.contains_key(&id) && state.entries.len() >= self.capacity {
            state.evict_lru();
        }
        state.clock += 1;
        let last_used = state.clock;
        state.entries.insert(
            id.clone(),
            CacheEntry {
                dataset: Arc::clone(&dataset),
                last_used,
            },
        );
        drop(state);

        log::info!("Cached dataset {id} ({} rows)", dataset.len());

        Ok(CachedDataset {
            id,
            dataset,
            cached: false,
        })
    }

    /// Looks up a previously loaded dataset by its content key.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<Arc<Dataset>> {
        self.lock().touch(id)
    }

    /// Drops a dataset from the cache. Returns `true` if it was present.
    pub fn remove(&self, id: &str) -> bool {
        self.lock().entries.remove(id).is_some()
    }

    /// Number of cached datasets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    /// Returns `true` if nothing is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, CacheState> {
        // Entries are only inserted whole, so a poisoned guard is still
        // consistent.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn csv(cases: u32) -> String {
        format!(
            "date,region,county,total_cases,severe_cases,deaths,mosquito_density\n\
             2024-01-07,Coast,Kilifi,{cases},1,0,2.5\n"
        )
    }

    #[test]
    fn content_key_is_sha256_hex() {
        assert_eq!(
            content_key(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn identical_bytes_hit_the_cache() {
        let cache = DatasetCache::new(4);
        let first = cache.load(csv(10).as_bytes(), FileFormat::Csv).unwrap();
        let second = cache.load(csv(10).as_bytes(), FileFormat::Csv).unwrap();
        assert!(!first.cached);
        assert!(second.cached);
        assert_eq!(first.id, second.id);
        assert!(Arc::ptr_eq(&first.dataset, &second.dataset));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn different_bytes_get_new_entries() {
        let cache = DatasetCache::new(4);
        let a = cache.load(csv(10).as_bytes(), FileFormat::Csv).unwrap();
        let b = cache.load(csv(11).as_bytes(), FileFormat::Csv).unwrap();
        assert_ne!(a.id, b.id);
        assert_eq!(cache.len(), 2);
        assert!(cache.get(&a.id).is_some());
        assert!(cache.get("unknown").is_none());
    }

    #[test]
    fn evicts_least_recently_used() {
        let cache = DatasetCache::new(2);
        let a = cache.load(csv(1).as_bytes(), FileFormat::Csv).unwrap();
        let b = cache.load(csv(2).as_bytes(), FileFormat::Csv).unwrap();
        // Touch `a` so `b` becomes the eviction candidate.
        assert!(cache.get(&a.id).is_some());
        let c = cache.load(csv(3).as_bytes(), FileFormat::Csv).unwrap();
        assert_eq!(cache.len(), 2);
        assert!(cache.get(&a.id).is_some());
        assert!(cache.get(&b.id).is_none());
        assert!(cache.get(&c.id).is_some());
    }

    #[test]
    fn failed_parses_are_not_cached() {
        let cache = DatasetCache::default();
        assert!(cache.load(b"date\n2024-01-07\n", FileFormat::Csv).is_err());
        assert!(cache.is_empty());
    }

    #[test]
    fn remove_invalidates_entry() {
        let cache = DatasetCache::default();
        let a = cache.load(csv(1).as_bytes(), FileFormat::Csv).unwrap();
        assert!(cache.remove(&a.id));
        assert!(!cache.remove(&a.id));
        assert!(cache.get(&a.id).is_none());
    }
}

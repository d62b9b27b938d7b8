//! Response caching: store and retrieve fetched page bodies on disk.
//!
//! ## Keys
//!
//! A cache key is the normalized URL (fragment dropped, host lowercased)
//! joined with the session identity, since page content is session-scoped.
//! The key is hashed with FNV into the file name so credentials never
//! reach the filesystem.
//!
//! ## LRU eviction
//!
//! When the cache exceeds `max_entries`, expired entries are dropped first,
//! then the least-recently-accessed one.

use crate::config::CacheMode;
use crate::error::ScrapeResult;
use fnv::FnvHasher;
use std::collections::HashMap;
use std::fs;
use std::hash::Hasher;
use std::path::PathBuf;
use std::time::{Instant, SystemTime};

/// Default maximum number of cached pages before LRU eviction.
const DEFAULT_MAX_ENTRIES: usize = 5000;

const EXTENSION: &str = "page";

struct CacheEntry {
    path: PathBuf,
    cached_at: SystemTime,
    last_accessed: Instant,
}

impl CacheEntry {
    fn is_expired(&self, mode: CacheMode) -> bool {
        SystemTime::now()
            .duration_since(self.cached_at)
            .map(|age| !mode.is_fresh(age))
            .unwrap_or(true)
    }

    fn touch(&mut self) {
        self.last_accessed = Instant::now();
    }
}

/// Page cache backed by the filesystem.
pub struct ResponseCache {
    cache_dir: PathBuf,
    /// Hashed key → entry.
    index: HashMap<String, CacheEntry>,
    mode: CacheMode,
    max_entries: usize,
}

impl ResponseCache {
    /// Open (or create) a cache in the given directory.
    ///
    /// Existing page files are indexed using their modification time, so
    /// a bounded cache keeps honoring its lifetime across runs. Pages that
    /// expired while no run was using them are deleted here.
    pub fn open(cache_dir: PathBuf, mode: CacheMode) -> ScrapeResult<Self> {
        let mut index = HashMap::new();

        if mode.is_enabled() {
            fs::create_dir_all(&cache_dir)?;

            if let Ok(entries) = fs::read_dir(&cache_dir) {
                for entry in entries.flatten() {
                    let path = entry.path();
                    if path.extension().and_then(|e| e.to_str()) != Some(EXTENSION) {
                        continue;
                    }
                    if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                        let cached_at = entry
                            .metadata()
                            .and_then(|m| m.modified())
                            .unwrap_or_else(|_| SystemTime::now());
                        index.insert(
                            stem.to_string(),
                            CacheEntry {
                                path,
                                cached_at,
                                last_accessed: Instant::now(),
                            },
                        );
                    }
                }
            }
        }

        let mut cache = Self {
            cache_dir,
            index,
            mode,
            max_entries: DEFAULT_MAX_ENTRIES,
        };
        let removed = cache.cleanup_expired();

        tracing::debug!(
            "ResponseCache opened: mode={mode}, {} entries in {} ({removed} expired removed)",
            cache.index.len(),
            cache.cache_dir.display()
        );
        Ok(cache)
    }

    /// A cache that never stores anything.
    pub fn disabled() -> Self {
        Self {
            cache_dir: PathBuf::new(),
            index: HashMap::new(),
            mode: CacheMode::Disabled,
            max_entries: 0,
        }
    }

    /// Fetch a fresh cached body for the URL within the given session.
    pub fn get(&mut self, url: &str, session: &str) -> Option<String> {
        if !self.mode.is_enabled() {
            return None;
        }
        let key = cache_key(url, session);
        let mode = self.mode;
        let entry = self.index.get_mut(&key)?;
        if entry.is_expired(mode) {
            return None;
        }
        entry.touch();
        match fs::read_to_string(&entry.path) {
            Ok(body) => Some(body),
            Err(e) => {
                tracing::warn!("dropping unreadable cache entry {}: {e}", entry.path.display());
                self.invalidate_key(&key);
                None
            }
        }
    }

    /// Store a body for the URL within the given session.
    pub fn put(&mut self, url: &str, session: &str, body: &str) -> ScrapeResult<()> {
        if !self.mode.is_enabled() {
            return Ok(());
        }
        let key = cache_key(url, session);

        if self.index.len() >= self.max_entries && !self.index.contains_key(&key) {
            self.evict_lru();
        }

        let path = self.cache_dir.join(format!("{key}.{EXTENSION}"));
        fs::write(&path, body)?;

        self.index.insert(
            key,
            CacheEntry {
                path,
                cached_at: SystemTime::now(),
                last_accessed: Instant::now(),
            },
        );
        Ok(())
    }

    fn invalidate_key(&mut self, key: &str) {
        if let Some(entry) = self.index.remove(key) {
            let _ = fs::remove_file(&entry.path);
        }
    }

    fn evict_lru(&mut self) {
        if self.cleanup_expired() > 0 {
            return;
        }

        if let Some(lru_key) = self
            .index
            .iter()
            .min_by_key(|(_, entry)| entry.last_accessed)
            .map(|(key, _)| key.clone())
        {
            tracing::debug!("evicting LRU cache entry: {lru_key}");
            self.invalidate_key(&lru_key);
        }
    }

    /// Remove all expired entries, returning how many were dropped.
    fn cleanup_expired(&mut self) -> usize {
        let mode = self.mode;
        let expired: Vec<String> = self
            .index
            .iter()
            .filter(|(_, entry)| entry.is_expired(mode))
            .map(|(key, _)| key.clone())
            .collect();
        let removed = expired.len();
        for key in expired {
            self.invalidate_key(&key);
        }
        removed
    }

    /// Number of cached pages (including expired).
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}

/// Normalize a URL for keying: fragment dropped, scheme/host lowercased.
pub fn normalize_url(raw: &str) -> String {
    match url::Url::parse(raw.trim()) {
        Ok(mut parsed) => {
            parsed.set_fragment(None);
            parsed.to_string()
        }
        Err(_) => raw.trim().to_string(),
    }
}

fn cache_key(url: &str, session: &str) -> String {
    let mut hasher = FnvHasher::default();
    hasher.write(normalize_url(url).as_bytes());
    hasher.write_u8(0);
    hasher.write(session.as_bytes());
    format!("{:016x}", hasher.finish())
}

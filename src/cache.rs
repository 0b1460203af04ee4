//! Generic TTL-bounded key/value cache.
//!
//! Two interchangeable stores behind one trait, chosen once at startup:
//! an in-memory map and a single-file JSON store at ~/.locus/cache.json.
//! Keys are SHA-256 of the normalized query; entries expire lazily — an
//! expired entry reads as absent and is purged on that read.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

/// Cache key: SHA-256 of `query_type ":" lowercased_trimmed_query`, hex.
pub fn cache_key(query_type: &str, query: &str) -> String {
    let normalized = format!("{}:{}", query_type, query.trim().to_lowercase());
    let digest = Sha256::digest(normalized.as_bytes());
    let mut out = String::with_capacity(64);
    for byte in digest {
        out.push_str(&format!("{:02x}", byte));
    }
    out
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CacheEntry {
    value: Value,
    /// Unix millis at write time.
    cached_at: i64,
    ttl_secs: u64,
}

impl CacheEntry {
    fn expired(&self, now_ms: i64) -> bool {
        now_ms - self.cached_at > self.ttl_secs as i64 * 1000
    }
}

/// The cache contract shared by both stores. Implementations must be safe
/// for concurrent get/set from parallel provider tasks.
pub trait CacheStore: Send + Sync {
    /// Returns the value if present and unexpired; purges it otherwise.
    fn get(&self, key: &str) -> Option<Value>;
    fn set(&self, key: &str, value: Value, ttl: Duration);
    fn remove(&self, key: &str);
    fn len(&self) -> usize;
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
    /// Drop every expired entry; returns how many were removed.
    fn purge_expired(&self) -> usize;
}

// ─── In-memory store ────────────────────────────────────────────

/// Volatile store used when persistence is not wanted (tests, one-shot runs).
#[derive(Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CacheStore for MemoryCache {
    fn get(&self, key: &str) -> Option<Value> {
        let mut entries = self.entries.lock().ok()?;
        let now = Utc::now().timestamp_millis();
        match entries.get(key) {
            Some(entry) if entry.expired(now) => {
                entries.remove(key);
                None
            }
            Some(entry) => Some(entry.value.clone()),
            None => None,
        }
    }

    fn set(&self, key: &str, value: Value, ttl: Duration) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(
                key.to_string(),
                CacheEntry {
                    value,
                    cached_at: Utc::now().timestamp_millis(),
                    ttl_secs: ttl.as_secs(),
                },
            );
        }
    }

    fn remove(&self, key: &str) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.remove(key);
        }
    }

    fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    fn purge_expired(&self) -> usize {
        let Ok(mut entries) = self.entries.lock() else {
            return 0;
        };
        let now = Utc::now().timestamp_millis();
        let before = entries.len();
        entries.retain(|_, e| !e.expired(now));
        before - entries.len()
    }
}

// ─── On-disk store ──────────────────────────────────────────────

/// Persistent store backed by one JSON file. The whole map is rewritten on
/// every mutation; write errors are swallowed so a read-only home directory
/// degrades to memory-only behavior.
pub struct DiskCache {
    path: PathBuf,
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl DiskCache {
    /// Open the cache at the default location (~/.locus/cache.json).
    pub fn open_default() -> Self {
        Self::open(Self::default_path())
    }

    /// Open the cache at a specific path (for testing).
    pub fn open(path: PathBuf) -> Self {
        let entries = Self::read_file(&path).unwrap_or_default();
        Self {
            path,
            entries: Mutex::new(entries),
        }
    }

    fn default_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".locus")
            .join("cache.json")
    }

    fn read_file(path: &PathBuf) -> Option<HashMap<String, CacheEntry>> {
        let data = fs::read_to_string(path).ok()?;
        serde_json::from_str(&data).ok()
    }

    fn persist(&self, entries: &HashMap<String, CacheEntry>) {
        if let Some(parent) = self.path.parent() {
            let _ = fs::create_dir_all(parent);
        }
        if let Ok(json) = serde_json::to_string_pretty(entries) {
            let _ = fs::write(&self.path, json);
        }
    }
}

impl CacheStore for DiskCache {
    fn get(&self, key: &str) -> Option<Value> {
        let mut entries = self.entries.lock().ok()?;
        let now = Utc::now().timestamp_millis();
        match entries.get(key) {
            Some(entry) if entry.expired(now) => {
                entries.remove(key);
                self.persist(&entries);
                None
            }
            Some(entry) => Some(entry.value.clone()),
            None => None,
        }
    }

    fn set(&self, key: &str, value: Value, ttl: Duration) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(
                key.to_string(),
                CacheEntry {
                    value,
                    cached_at: Utc::now().timestamp_millis(),
                    ttl_secs: ttl.as_secs(),
                },
            );
            self.persist(&entries);
        }
    }

    fn remove(&self, key: &str) {
        if let Ok(mut entries) = self.entries.lock() {
            if entries.remove(key).is_some() {
                self.persist(&entries);
            }
        }
    }

    fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    fn purge_expired(&self) -> usize {
        let Ok(mut entries) = self.entries.lock() else {
            return 0;
        };
        let now = Utc::now().timestamp_millis();
        let before = entries.len();
        entries.retain(|_, e| !e.expired(now));
        let purged = before - entries.len();
        if purged > 0 {
            self.persist(&entries);
        }
        purged
    }
}

//! Keyed cache whose entries expire a fixed time after they were stored.
//!
//! The backing store is a capability: [`MemoryStore`] for tests and
//! short-lived use, [`FileStore`] for the daemon so cached summaries survive
//! a restart the way the browser's local storage did.

use anyhow::Context;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::marker::PhantomData;
use std::path::PathBuf;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredEntry {
    pub stored_at_ms: i64,
    pub payload: serde_json::Value,
}

pub trait CacheStore {
    fn load(&self, key: &str) -> anyhow::Result<Option<StoredEntry>>;
    fn store(&mut self, key: &str, entry: StoredEntry) -> anyhow::Result<()>;
    fn remove(&mut self, key: &str) -> anyhow::Result<()>;
}

pub trait Clock {
    fn now_ms(&self) -> i64;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

/// Clock that only moves when told to. Clones share the same instant.
#[derive(Debug, Clone, Default)]
pub struct ManualClock(Arc<AtomicI64>);

impl ManualClock {
    pub fn starting_at(ms: i64) -> Self {
        Self(Arc::new(AtomicI64::new(ms)))
    }

    pub fn advance(&self, by: Duration) {
        self.0.fetch_add(by.as_millis() as i64, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> i64 {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: HashMap<String, StoredEntry>,
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

impl CacheStore for MemoryStore {
    fn load(&self, key: &str) -> anyhow::Result<Option<StoredEntry>> {
        Ok(self.entries.get(key).cloned())
    }

    fn store(&mut self, key: &str, entry: StoredEntry) -> anyhow::Result<()> {
        self.entries.insert(key.to_string(), entry);
        Ok(())
    }

    fn remove(&mut self, key: &str) -> anyhow::Result<()> {
        self.entries.remove(key);
        Ok(())
    }
}

/// One JSON file per key, named by the SHA-256 of the key so arbitrary user
/// ids are safe as file names.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let digest = Sha256::digest(key.as_bytes());
        self.dir.join(format!("{:x}.json", digest))
    }
}

impl CacheStore for FileStore {
    fn load(&self, key: &str) -> anyhow::Result<Option<StoredEntry>> {
        let path = self.path_for(key);
        let text = match std::fs::read_to_string(&path) {
            Ok(t) => t,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(e).with_context(|| format!("failed to read {}", path.to_string_lossy()))
            }
        };
        match serde_json::from_str(&text) {
            Ok(entry) => Ok(Some(entry)),
            Err(e) => {
                warn!(path = %path.to_string_lossy(), error = %e, "discarding unreadable cache file");
                Ok(None)
            }
        }
    }

    fn store(&mut self, key: &str, entry: StoredEntry) -> anyhow::Result<()> {
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("failed to create {}", self.dir.to_string_lossy()))?;
        let path = self.path_for(key);
        let text = serde_json::to_string(&entry)?;
        std::fs::write(&path, text)
            .with_context(|| format!("failed to write {}", path.to_string_lossy()))
    }

    fn remove(&mut self, key: &str) -> anyhow::Result<()> {
        let path = self.path_for(key);
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("failed to remove {}", path.to_string_lossy())),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Lookup<T> {
    /// Younger than the refresh age.
    Fresh(T),
    /// Still valid, but old enough that the caller should recompute it.
    Stale { value: T, age: Duration },
    Miss,
}

impl<T> Lookup<T> {
    pub fn into_value(self) -> Option<T> {
        match self {
            Lookup::Fresh(v) | Lookup::Stale { value: v, .. } => Some(v),
            Lookup::Miss => None,
        }
    }
}

pub struct TtlCache<T, S, C = SystemClock> {
    namespace: String,
    store: S,
    clock: C,
    ttl: Duration,
    refresh_after: Duration,
    _value: PhantomData<fn() -> T>,
}

impl<T, S, C> TtlCache<T, S, C>
where
    T: Serialize + DeserializeOwned,
    S: CacheStore,
    C: Clock,
{
    pub fn new(
        namespace: impl Into<String>,
        store: S,
        clock: C,
        ttl: Duration,
        refresh_after: Duration,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            store,
            clock,
            ttl,
            refresh_after: refresh_after.min(ttl),
            _value: PhantomData,
        }
    }

    fn full_key(&self, key: &str) -> String {
        format!("{}:{}", self.namespace, key)
    }

    pub fn get(&self, key: &str) -> anyhow::Result<Lookup<T>> {
        let Some(entry) = self.store.load(&self.full_key(key))? else {
            return Ok(Lookup::Miss);
        };
        // A timestamp from the future (clock moved back) counts as just stored.
        let age_ms = (self.clock.now_ms() - entry.stored_at_ms).max(0) as u64;
        let age = Duration::from_millis(age_ms);
        if age >= self.ttl {
            return Ok(Lookup::Miss);
        }
        let value: T = match serde_json::from_value(entry.payload) {
            Ok(v) => v,
            Err(e) => {
                warn!(namespace = %self.namespace, key, error = %e, "cached value no longer decodes");
                return Ok(Lookup::Miss);
            }
        };
        if age > self.refresh_after {
            Ok(Lookup::Stale { value, age })
        } else {
            Ok(Lookup::Fresh(value))
        }
    }

    pub fn put(&mut self, key: &str, value: &T) -> anyhow::Result<()> {
        let entry = StoredEntry {
            stored_at_ms: self.clock.now_ms(),
            payload: serde_json::to_value(value)?,
        };
        let full = self.full_key(key);
        self.store.store(&full, entry)
    }

    pub fn invalidate(&mut self, key: &str) -> anyhow::Result<()> {
        let full = self.full_key(key);
        self.store.remove(&full)
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

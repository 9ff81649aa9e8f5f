//! Time-based snapshot cache over a [`KeyValueStore`].
//!
//! Two entries are persisted: the full JSON [`CacheRecord`] under
//! [`SNAPSHOT_KEY`](config::SNAPSHOT_KEY), and the refresh time as epoch
//! milliseconds under [`LAST_REFRESH_KEY`](config::LAST_REFRESH_KEY), so
//! staleness can be checked without deserializing the snapshot.
//!
//! The record is only ever replaced whole. A failed scrape never reaches
//! this module, so the last good snapshot survives it.

use chrono::{DateTime, Utc};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;
use tracing::{debug, warn};

use crate::config;
use crate::error::{MetagameError, Result};
use crate::models::{CacheRecord, MetaSnapshot};
use crate::store::KeyValueStore;

pub struct SnapshotCache {
    store: Arc<dyn KeyValueStore>,
    current: RwLock<Option<Arc<CacheRecord>>>,
}

impl SnapshotCache {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            current: RwLock::new(None),
        }
    }

    /// The current record, loading it from the store on first access.
    ///
    /// An unreadable store is logged and treated as empty. A corrupt record
    /// is removed so the next refresh starts clean.
    pub fn get(&self) -> Option<Arc<CacheRecord>> {
        if let Some(record) = self.read_current() {
            return Some(record);
        }
        let record = Arc::new(self.load()?);
        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
        // A concurrent store() wins over what we just read.
        Some(current.get_or_insert(record).clone())
    }

    pub fn latest_snapshot(&self) -> Option<Arc<MetaSnapshot>> {
        self.get().map(|r| r.snapshot.clone())
    }

    pub fn last_refreshed_millis(&self) -> Option<i64> {
        if let Some(record) = self.read_current() {
            return Some(record.last_refreshed_at.timestamp_millis());
        }
        match self.store.get(config::LAST_REFRESH_KEY) {
            Ok(Some(raw)) => raw.trim().parse().ok(),
            Ok(None) => None,
            Err(e) => {
                warn!(error = %e, "cache unavailable; treating as empty");
                None
            }
        }
    }

    /// True when nothing has been stored yet or at least `ttl` has passed
    /// since the last refresh.
    pub fn is_stale(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        match self.last_refreshed_millis() {
            None => true,
            Some(last) => {
                let ttl_ms = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);
                now.timestamp_millis().saturating_sub(last) >= ttl_ms
            }
        }
    }

    /// Replace the record with `snapshot` taken at `now`.
    ///
    /// The in-memory record is replaced even if persisting fails; the error
    /// then only reports that the backing store is behind.
    pub fn store(&self, snapshot: Arc<MetaSnapshot>, now: DateTime<Utc>) -> Result<Arc<CacheRecord>> {
        let record = Arc::new(CacheRecord {
            snapshot,
            last_refreshed_at: now,
        });
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = Some(record.clone());

        // Record first: a crash between the writes leaves an older
        // timestamp, which only makes the cache look stale.
        let json = serde_json::to_string(record.as_ref())?;
        self.store
            .set(config::SNAPSHOT_KEY, &json)
            .and_then(|()| {
                self.store
                    .set(config::LAST_REFRESH_KEY, &now.timestamp_millis().to_string())
            })
            .map_err(|e| MetagameError::CacheUnavailable(e.to_string()))?;
        debug!(decks = record.snapshot.decks.len(), "snapshot cached");
        Ok(record)
    }

    /// Drop the record from memory and the store.
    pub fn clear(&self) -> Result<()> {
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = None;
        self.store.delete(config::SNAPSHOT_KEY)?;
        self.store.delete(config::LAST_REFRESH_KEY)?;
        Ok(())
    }

    fn read_current(&self) -> Option<Arc<CacheRecord>> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn load(&self) -> Option<CacheRecord> {
        let raw = match self.store.get(config::SNAPSHOT_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!(error = %e, "cache unavailable; serving from memory only");
                return None;
            }
        };
        match serde_json::from_str::<CacheRecord>(&raw) {
            Ok(record) => {
                debug!(decks = record.snapshot.decks.len(), "snapshot loaded from store");
                Some(record)
            }
            Err(e) => {
                warn!(error = %e, "corrupt cache record -- removing");
                for key in [config::SNAPSHOT_KEY, config::LAST_REFRESH_KEY] {
                    if let Err(e) = self.store.delete(key) {
                        warn!(key, error = %e, "could not remove corrupt cache entry");
                    }
                }
                None
            }
        }
    }
}

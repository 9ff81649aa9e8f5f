//! Metagame snapshots for Magic: The Gathering.
//!
//! Scrapes a metagame report site, reads each deck's list, infers rough card
//! attributes, classifies every deck as aggro, midrange or control, and
//! caches the result for a configurable time.
//!
//! # Quick start
//!
//! ```no_run
//! use chrono::Utc;
//! use mtg_metagame::Metagame;
//!
//! let meta = Metagame::builder().build().unwrap();
//!
//! // Serve the cached snapshot, scraping first if it is older than a day
//! let outcome = meta.ensure_fresh(Utc::now()).unwrap();
//! for deck in outcome.snapshot.top(5) {
//!     println!("{} {:.1}% {}", deck.name, deck.meta_share_percent, deck.archetype);
//! }
//! ```

#[cfg(feature = "async")]
pub mod async_client;
pub mod cache;
pub mod classify;
pub mod config;
pub mod error;
pub mod fallback;
pub mod fetch;
pub mod infer;
pub mod models;
pub mod parse;
pub mod scrape;
pub mod store;

#[cfg(feature = "async")]
pub use async_client::AsyncMetagame;
pub use cache::SnapshotCache;
pub use config::FetchOptions;
pub use error::{DataWarning, FetchError, MetagameError, Result};
pub use fetch::{FetchClient, IdentityResolver, RelayResolver};
pub use infer::{AttributeSource, HeuristicInferencer};
pub use models::{Archetype, CardEntry, ClassifiedDeck, DeckStub, MetaSnapshot};
pub use scrape::Scraper;
pub use store::{FileStore, KeyValueStore, MemoryStore};

use chrono::{DateTime, Utc};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::{info, warn};

use fetch::{EgressResolver, ReqwestTransport, Sleeper, ThreadSleeper, Transport};
use parse::{DeckDetailParser, OverviewParser};

// ---------------------------------------------------------------------------
// RefreshOutcome
// ---------------------------------------------------------------------------

/// Where the snapshot in a [`RefreshOutcome`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshStatus {
    /// The cached snapshot was still within its TTL.
    Cached,
    /// A scrape just completed and its snapshot was cached.
    Refreshed,
    /// The scrape failed; the last good (stale) snapshot is served.
    Stale,
    /// The scrape failed and nothing was cached; placeholder data is served.
    Fallback,
}

#[derive(Debug, Clone)]
pub struct RefreshOutcome {
    pub snapshot: Arc<MetaSnapshot>,
    pub status: RefreshStatus,
    pub warnings: Vec<DataWarning>,
    /// Why the refresh failed, when `status` is degraded.
    pub error: Option<String>,
}

impl RefreshOutcome {
    /// True when the served snapshot is not the product of a current scrape.
    pub fn is_degraded(&self) -> bool {
        matches!(self.status, RefreshStatus::Stale | RefreshStatus::Fallback)
    }

    fn cached(snapshot: Arc<MetaSnapshot>) -> Self {
        Self {
            snapshot,
            status: RefreshStatus::Cached,
            warnings: Vec::new(),
            error: None,
        }
    }
}

// ---------------------------------------------------------------------------
// MetagameBuilder
// ---------------------------------------------------------------------------

/// Builder for configuring and constructing a [`Metagame`] instance.
///
/// Every collaborator has a production default; tests swap in stubs for the
/// transport, store and sleeper.
pub struct MetagameBuilder {
    source_url: String,
    ttl: Duration,
    fetch_options: FetchOptions,
    rate_limit: Duration,
    cache_dir: Option<PathBuf>,
    store: Option<Arc<dyn KeyValueStore>>,
    transport: Option<Arc<dyn Transport>>,
    egress: Arc<dyn EgressResolver>,
    sleeper: Arc<dyn Sleeper>,
    inferencer: Arc<dyn AttributeSource>,
    overview_parser: OverviewParser,
    detail_parser: DeckDetailParser,
    fallback: bool,
}

impl Default for MetagameBuilder {
    fn default() -> Self {
        Self {
            source_url: config::DEFAULT_SOURCE_URL.to_string(),
            ttl: config::DEFAULT_TTL,
            fetch_options: FetchOptions::default(),
            rate_limit: config::DEFAULT_RATE_LIMIT,
            cache_dir: None,
            store: None,
            transport: None,
            egress: Arc::new(IdentityResolver),
            sleeper: Arc::new(ThreadSleeper),
            inferencer: Arc::new(HeuristicInferencer::new()),
            overview_parser: OverviewParser::new(),
            detail_parser: DeckDetailParser::new(),
            fallback: true,
        }
    }
}

impl MetagameBuilder {
    /// Overview page to scrape.
    pub fn source_url(mut self, url: impl Into<String>) -> Self {
        self.source_url = url.into();
        self
    }

    /// How long a snapshot stays fresh. Defaults to 24 hours.
    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn fetch_options(mut self, options: FetchOptions) -> Self {
        self.fetch_options = options;
        self
    }

    /// Pause before each deck detail request. Defaults to 1.2 seconds.
    pub fn rate_limit(mut self, delay: Duration) -> Self {
        self.rate_limit = delay;
        self
    }

    /// Directory for the default file-backed store.
    ///
    /// Ignored when [`store`](Self::store) is set. If not set, the
    /// platform cache directory is used (e.g. `~/.cache/mtg-metagame`).
    pub fn cache_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.cache_dir = Some(path.as_ref().to_path_buf());
        self
    }

    /// Persist snapshots in `store` instead of on disk.
    pub fn store(mut self, store: Arc<dyn KeyValueStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// URL rewriting applied before every request, e.g. a [`RelayResolver`].
    pub fn egress(mut self, egress: Arc<dyn EgressResolver>) -> Self {
        self.egress = egress;
        self
    }

    pub fn sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn inferencer(mut self, inferencer: Arc<dyn AttributeSource>) -> Self {
        self.inferencer = inferencer;
        self
    }

    pub fn parsers(mut self, overview: OverviewParser, detail: DeckDetailParser) -> Self {
        self.overview_parser = overview;
        self.detail_parser = detail;
        self
    }

    /// Serve built-in placeholder decks when nothing else is available.
    /// Defaults to `true`.
    pub fn fallback(mut self, enabled: bool) -> Self {
        self.fallback = enabled;
        self
    }

    /// Build the client. No network traffic happens here.
    ///
    /// If the default on-disk store cannot be created, the client runs with
    /// an in-memory store instead.
    pub fn build(self) -> Result<Metagame> {
        let store: Arc<dyn KeyValueStore> = match self.store {
            Some(store) => store,
            None => match FileStore::new(self.cache_dir) {
                Ok(store) => Arc::new(store),
                Err(e) => {
                    warn!(error = %e, "cache directory unavailable; using in-memory store");
                    Arc::new(MemoryStore::new())
                }
            },
        };
        let transport: Arc<dyn Transport> = match self.transport {
            Some(transport) => transport,
            None => Arc::new(ReqwestTransport::new()?),
        };

        let fetch = FetchClient::new(transport, self.egress, self.sleeper);
        let scraper = Scraper::new(
            fetch,
            self.fetch_options,
            self.rate_limit,
            self.inferencer.clone(),
        )
        .with_parsers(self.overview_parser, self.detail_parser);

        Ok(Metagame {
            source_url: self.source_url,
            ttl: self.ttl,
            fallback: self.fallback,
            scraper,
            cache: SnapshotCache::new(store),
            inferencer: self.inferencer,
            flight: Mutex::new(Flight::default()),
            landed: Condvar::new(),
        })
    }
}

// ---------------------------------------------------------------------------
// Metagame
// ---------------------------------------------------------------------------

/// Single-flight bookkeeping: at most one scrape runs at a time and callers
/// arriving during it wait for its result.
#[derive(Default)]
struct Flight {
    running: bool,
    generation: u64,
    last: Option<std::result::Result<RefreshOutcome, String>>,
}

/// Publishes the flight result and wakes waiters, even if the scrape panics.
struct FlightGuard<'a> {
    flight: &'a Mutex<Flight>,
    landed: &'a Condvar,
    result: Option<std::result::Result<RefreshOutcome, String>>,
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        let mut flight = self.flight.lock().unwrap_or_else(PoisonError::into_inner);
        flight.running = false;
        flight.generation = flight.generation.wrapping_add(1);
        flight.last = self.result.take();
        self.landed.notify_all();
    }
}

/// The main entry point: a cached, self-refreshing metagame snapshot.
///
/// `Metagame` is `Send + Sync`; share it behind an `Arc` and call
/// [`ensure_fresh`](Self::ensure_fresh) from as many threads as needed.
pub struct Metagame {
    source_url: String,
    ttl: Duration,
    fallback: bool,
    scraper: Scraper,
    cache: SnapshotCache,
    inferencer: Arc<dyn AttributeSource>,
    flight: Mutex<Flight>,
    landed: Condvar,
}

impl Metagame {
    /// Create a new builder for configuring the client.
    pub fn builder() -> MetagameBuilder {
        MetagameBuilder::default()
    }

    /// The most recent cached snapshot, if any. Never touches the network.
    pub fn latest_snapshot(&self) -> Option<Arc<MetaSnapshot>> {
        self.cache.latest_snapshot()
    }

    pub fn is_stale(&self, now: DateTime<Utc>) -> bool {
        self.cache.is_stale(now, self.ttl)
    }

    /// Return a snapshot, scraping first if the cache is stale or empty.
    ///
    /// Blocks until a snapshot is available. Concurrent callers share one
    /// scrape. If the scrape fails, the last cached snapshot is served
    /// (status [`RefreshStatus::Stale`]), then the placeholder dataset
    /// ([`RefreshStatus::Fallback`]). An error is returned only when none
    /// of those exist.
    pub fn ensure_fresh(&self, now: DateTime<Utc>) -> Result<RefreshOutcome> {
        if let Some(outcome) = self.fresh_from_cache(now) {
            return Ok(outcome);
        }
        self.refresh_single_flight(now, false)
    }

    /// Scrape regardless of cache age. Joins a scrape already in flight
    /// rather than starting a second one.
    pub fn force_refresh(&self, now: DateTime<Utc>) -> Result<RefreshOutcome> {
        self.refresh_single_flight(now, true)
    }

    /// Remove the cached snapshot from memory and the store.
    pub fn clear_cache(&self) -> Result<()> {
        self.cache.clear()
    }

    pub fn cache(&self) -> &SnapshotCache {
        &self.cache
    }

    pub fn source_url(&self) -> &str {
        &self.source_url
    }

    /// Consume the client and release all resources.
    pub fn close(self) {
        drop(self);
    }

    fn fresh_from_cache(&self, now: DateTime<Utc>) -> Option<RefreshOutcome> {
        if self.cache.is_stale(now, self.ttl) {
            return None;
        }
        self.cache.latest_snapshot().map(RefreshOutcome::cached)
    }

    fn lock_flight(&self) -> MutexGuard<'_, Flight> {
        self.flight.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn refresh_single_flight(&self, now: DateTime<Utc>, force: bool) -> Result<RefreshOutcome> {
        let mut flight = self.lock_flight();
        if flight.running {
            let joined = flight.generation;
            while flight.running && flight.generation == joined {
                flight = self
                    .landed
                    .wait(flight)
                    .unwrap_or_else(PoisonError::into_inner);
            }
            return match &flight.last {
                Some(Ok(outcome)) => Ok(outcome.clone()),
                Some(Err(message)) => Err(MetagameError::NoData(message.clone())),
                None => Err(MetagameError::NoData("refresh did not complete".into())),
            };
        }
        // Another caller may have finished a scrape while we waited for the lock.
        if !force {
            if let Some(outcome) = self.fresh_from_cache(now) {
                return Ok(outcome);
            }
        }
        flight.running = true;
        drop(flight);

        let mut guard = FlightGuard {
            flight: &self.flight,
            landed: &self.landed,
            result: None,
        };
        let outcome = self.refresh(now);
        guard.result = Some(match &outcome {
            Ok(o) => Ok(o.clone()),
            Err(e) => Err(e.to_string()),
        });
        drop(guard);
        outcome
    }

    fn refresh(&self, now: DateTime<Utc>) -> Result<RefreshOutcome> {
        match self.scraper.scrape(&self.source_url, now) {
            Ok(report) => {
                let snapshot = Arc::new(report.snapshot);
                let mut warnings = report.warnings;
                if let Err(e) = self.cache.store(snapshot.clone(), now) {
                    warn!(error = %e, "snapshot not persisted");
                    warnings.push(DataWarning::CacheWriteFailed {
                        message: e.to_string(),
                    });
                }
                info!(
                    decks = snapshot.decks.len(),
                    warnings = warnings.len(),
                    "metagame refreshed"
                );
                Ok(RefreshOutcome {
                    snapshot,
                    status: RefreshStatus::Refreshed,
                    warnings,
                    error: None,
                })
            }
            Err(e) => {
                if let Some(snapshot) = self.cache.latest_snapshot() {
                    warn!(error = %e, "refresh failed; serving stale snapshot");
                    return Ok(RefreshOutcome {
                        snapshot,
                        status: RefreshStatus::Stale,
                        warnings: Vec::new(),
                        error: Some(e.to_string()),
                    });
                }
                if self.fallback {
                    warn!(error = %e, "refresh failed with empty cache; serving placeholder decks");
                    let snapshot = fallback::placeholder_snapshot(now, self.inferencer.as_ref());
                    return Ok(RefreshOutcome {
                        snapshot: Arc::new(snapshot),
                        status: RefreshStatus::Fallback,
                        warnings: Vec::new(),
                        error: Some(e.to_string()),
                    });
                }
                Err(e)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Display
// ---------------------------------------------------------------------------

impl fmt::Display for Metagame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let decks = self.cache.latest_snapshot().map_or(0, |s| s.decks.len());
        write!(
            f,
            "Metagame(source={}, ttl={}s, cached_decks={})",
            self.source_url,
            self.ttl.as_secs(),
            decks
        )
    }
}

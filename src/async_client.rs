//! Async wrapper around [`Metagame`] for use in async runtimes (Tokio, etc.).
//!
//! Scrapes block on network I/O and on rate-limit pauses, so every call is
//! dispatched to the blocking thread pool via
//! [`tokio::task::spawn_blocking`], keeping the async event loop free.
//!
//! # Example
//!
//! ```no_run
//! use chrono::Utc;
//! use mtg_metagame::{AsyncMetagame, Metagame};
//!
//! #[tokio::main]
//! async fn main() {
//!     let meta = AsyncMetagame::new(Metagame::builder().build().unwrap());
//!     let outcome = meta.ensure_fresh(Utc::now()).await.unwrap();
//!     println!("{} decks", outcome.snapshot.decks.len());
//! }
//! ```

use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::error::{MetagameError, Result};
use crate::models::MetaSnapshot;
use crate::{Metagame, RefreshOutcome};

/// Async wrapper around [`Metagame`].
///
/// Cloning is cheap and every clone shares the same cache and single-flight
/// state, so a periodic refresh task and request handlers can hold their
/// own copies.
#[derive(Clone)]
pub struct AsyncMetagame {
    inner: Arc<Metagame>,
}

impl AsyncMetagame {
    pub fn new(metagame: Metagame) -> Self {
        Self {
            inner: Arc::new(metagame),
        }
    }

    /// Run a blocking operation against the client on the blocking pool.
    pub async fn run<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Metagame) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let inner = self.inner.clone();
        tokio::task::spawn_blocking(move || f(inner.as_ref()))
            .await
            .map_err(|e| MetagameError::InvalidArgument(format!("Task join error: {e}")))?
    }

    /// See [`Metagame::ensure_fresh`].
    pub async fn ensure_fresh(&self, now: DateTime<Utc>) -> Result<RefreshOutcome> {
        self.run(move |m| m.ensure_fresh(now)).await
    }

    /// See [`Metagame::force_refresh`].
    pub async fn force_refresh(&self, now: DateTime<Utc>) -> Result<RefreshOutcome> {
        self.run(move |m| m.force_refresh(now)).await
    }

    /// The cached snapshot, if any.
    pub async fn latest_snapshot(&self) -> Result<Option<Arc<MetaSnapshot>>> {
        self.run(|m| Ok(m.latest_snapshot())).await
    }

    /// Borrow the underlying blocking client.
    pub fn blocking(&self) -> &Metagame {
        &self.inner
    }
}

impl From<Metagame> for AsyncMetagame {
    fn from(metagame: Metagame) -> Self {
        Self::new(metagame)
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::deck::ClassifiedDeck;
use crate::error::Result;

/// A complete, immutable view of the metagame at one point in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetaSnapshot {
    pub generated_at: DateTime<Utc>,
    pub source: String,
    pub decks: Vec<ClassifiedDeck>,
}

impl MetaSnapshot {
    /// Look up a deck by its slug id. Returns the first match on collisions.
    pub fn deck(&self, id: &str) -> Option<&ClassifiedDeck> {
        self.decks.iter().find(|d| d.id == id)
    }

    /// The `n` highest-ranked decks.
    pub fn top(&self, n: usize) -> Vec<&ClassifiedDeck> {
        let mut decks: Vec<&ClassifiedDeck> = self.decks.iter().collect();
        decks.sort_by_key(|d| d.rank);
        decks.truncate(n);
        decks
    }

    /// Sum of meta shares across all decks.
    pub fn covered_share(&self) -> f64 {
        self.decks.iter().map(|d| d.meta_share_percent).sum()
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// What the snapshot cache persists: the snapshot and when it was taken.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheRecord {
    pub snapshot: Arc<MetaSnapshot>,
    pub last_refreshed_at: DateTime<Utc>,
}

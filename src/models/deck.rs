use serde::{Deserialize, Serialize};
use std::fmt;

use super::card::{CardEntry, ColorSet};

// ---------------------------------------------------------------------------
// DeckStub: one row of the metagame overview
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeckStub {
    pub name: String,
    pub meta_share_percent: f64,
    /// Link to the deck page as found in the overview (may be relative).
    pub detail_ref: String,
    /// 1-based position in the overview listing.
    pub rank: u32,
}

// ---------------------------------------------------------------------------
// ParsedDeck: raw mainboard/sideboard read off a detail page
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedDeck {
    pub mainboard: Vec<CardEntry>,
    pub sideboard: Vec<CardEntry>,
}

impl ParsedDeck {
    pub fn is_empty(&self) -> bool {
        self.mainboard.is_empty() && self.sideboard.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Archetype
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Archetype {
    Aggro,
    Midrange,
    Control,
}

impl fmt::Display for Archetype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Archetype::Aggro => "aggro",
            Archetype::Midrange => "midrange",
            Archetype::Control => "control",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------
// KeyCard
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyCardRole {
    Planeswalker,
    Legend,
    /// A full four-of that carries no other signal.
    Staple,
    Support,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyCard {
    pub name: String,
    pub weight: u32,
    pub role: KeyCardRole,
}

// ---------------------------------------------------------------------------
// ClassifiedDeck
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassifiedDeck {
    pub id: String,
    pub name: String,
    pub meta_share_percent: f64,
    pub rank: u32,
    #[serde(default)]
    pub colors: ColorSet,
    #[serde(default)]
    pub mainboard: Vec<CardEntry>,
    #[serde(default)]
    pub sideboard: Vec<CardEntry>,
    #[serde(default)]
    pub key_cards: Vec<KeyCard>,
    pub archetype: Archetype,
    pub total_cards: u32,
}

impl ClassifiedDeck {
    /// Whether the deck carries no card data (e.g. its page failed to load).
    pub fn is_empty(&self) -> bool {
        self.mainboard.is_empty() && self.sideboard.is_empty()
    }
}

//! Card attribute inference from a card name alone.
//!
//! The scraped decklists carry only names and counts. [`AttributeSource`] is
//! the seam where attributes are attached; [`HeuristicInferencer`] fills it
//! with name-pattern guesses until a real card database is plugged in. None
//! of its output is authoritative.

use std::collections::HashMap;

use crate::models::{CardAttributes, CardEntry, CardType, Color, ColorSet};

/// Basic land names. Exact (case-insensitive) matches are typed `Land`.
pub const BASIC_LANDS: &[&str] = &[
    "Plains",
    "Island",
    "Swamp",
    "Mountain",
    "Forest",
    "Wastes",
    "Snow-Covered Plains",
    "Snow-Covered Island",
    "Snow-Covered Swamp",
    "Snow-Covered Mountain",
    "Snow-Covered Forest",
    "Snow-Covered Wastes",
];

/// Planeswalker names, matched against the part of a card name before its
/// first comma (`"Teferi, Hero of Dominaria"` -> `"Teferi"`).
pub const KNOWN_PLANESWALKERS: &[&str] = &[
    "Ajani",
    "Chandra",
    "Elspeth",
    "Gideon",
    "Garruk",
    "Jace",
    "Kaito",
    "Karn",
    "Kaya",
    "Liliana",
    "Nahiri",
    "Narset",
    "Nicol Bolas",
    "Nissa",
    "Oko",
    "Ral",
    "Sorin",
    "Tamiyo",
    "Teferi",
    "Tezzeret",
    "Ugin",
    "Vivien",
    "Vraska",
    "Wrenn and Six",
    "Wrenn and Seven",
];

pub fn is_basic_land(name: &str) -> bool {
    BASIC_LANDS.iter().any(|b| b.eq_ignore_ascii_case(name))
}

// ---------------------------------------------------------------------------
// WeightHints
// ---------------------------------------------------------------------------

/// Signals used only to weight key cards; never surfaced as card data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WeightHints {
    pub legendary: bool,
    pub rare: bool,
}

// ---------------------------------------------------------------------------
// AttributeSource
// ---------------------------------------------------------------------------

/// Anything that can describe a card given its (normalized) name.
///
/// Implementations must be pure: the same name always yields the same
/// attributes.
pub trait AttributeSource: Send + Sync {
    fn infer(&self, name: &str) -> CardAttributes;

    /// Key-card weighting hints. Sources without such knowledge report none.
    fn hints(&self, _name: &str) -> WeightHints {
        WeightHints::default()
    }
}

// ---------------------------------------------------------------------------
// CostEstimator
// ---------------------------------------------------------------------------

/// Mana value policy used by [`HeuristicInferencer`] for non-land cards.
pub trait CostEstimator: Send + Sync {
    fn estimate(&self, name: &str) -> u32;
}

/// Estimates cost from name length in buckets of four characters, capped at 6.
#[derive(Debug, Clone, Copy, Default)]
pub struct NameLengthCost;

impl NameLengthCost {
    pub const MAX_COST: u32 = 6;
}

impl CostEstimator for NameLengthCost {
    fn estimate(&self, name: &str) -> u32 {
        let len = name.chars().count() as u32;
        if len <= 6 {
            1
        } else {
            // 7..=10 -> 2, 11..=14 -> 3, 15..=18 -> 4, ...
            (2 + (len - 7) / 4).min(Self::MAX_COST)
        }
    }
}

/// Known costs by name, falling back to another estimator for the rest.
pub struct CostTable<E = NameLengthCost> {
    costs: HashMap<String, u32>,
    fallback: E,
}

impl CostTable<NameLengthCost> {
    pub fn new() -> Self {
        Self::with_fallback(NameLengthCost)
    }
}

impl Default for CostTable<NameLengthCost> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: CostEstimator> CostTable<E> {
    pub fn with_fallback(fallback: E) -> Self {
        Self {
            costs: HashMap::new(),
            fallback,
        }
    }

    pub fn insert(mut self, name: &str, cost: u32) -> Self {
        self.costs.insert(name.to_lowercase(), cost);
        self
    }
}

impl<E: CostEstimator> CostEstimator for CostTable<E> {
    fn estimate(&self, name: &str) -> u32 {
        match self.costs.get(&name.to_lowercase()) {
            Some(cost) => *cost,
            None => self.fallback.estimate(name),
        }
    }
}

// ---------------------------------------------------------------------------
// HeuristicInferencer
// ---------------------------------------------------------------------------

/// Name-pattern attribute guesses.
///
/// - Type: basic land names are `Land`, known planeswalkers are
///   `Planeswalker`, everything else `Unknown`.
/// - Colors: a card gains a color for every basic land name or color word
///   appearing in it (`"Mountain"`, `"Red"` -> R). Matching is
///   case-sensitive so lowercase fragments such as the "red" in "Shredder" stay
///   colorless.
/// - Cost: basic lands are 0, everything else goes through the configured
///   [`CostEstimator`].
pub struct HeuristicInferencer {
    cost: Box<dyn CostEstimator>,
}

impl Default for HeuristicInferencer {
    fn default() -> Self {
        Self::new()
    }
}

impl HeuristicInferencer {
    pub fn new() -> Self {
        Self {
            cost: Box::new(NameLengthCost),
        }
    }

    /// Swap the cost policy, e.g. for a [`CostTable`] of real mana values.
    pub fn with_cost_estimator<E: CostEstimator + 'static>(estimator: E) -> Self {
        Self {
            cost: Box::new(estimator),
        }
    }

    fn card_type(name: &str) -> CardType {
        if is_basic_land(name) {
            CardType::Land
        } else if is_known_planeswalker(name) {
            CardType::Planeswalker
        } else {
            CardType::Unknown
        }
    }

    fn colors(name: &str) -> ColorSet {
        Color::ALL
            .into_iter()
            .filter(|c| name.contains(c.basic_land()) || name.contains(c.word()))
            .collect()
    }
}

impl AttributeSource for HeuristicInferencer {
    fn infer(&self, name: &str) -> CardAttributes {
        let card_type = Self::card_type(name);
        let estimated_cmc = if card_type == CardType::Land {
            0
        } else {
            self.cost.estimate(name)
        };
        CardAttributes {
            card_type,
            colors: Self::colors(name),
            estimated_cmc,
        }
    }

    fn hints(&self, name: &str) -> WeightHints {
        // Legendary permanents are conventionally named "Name, Epithet".
        let legendary = name.contains(", ");
        let words = name.split_whitespace().count();
        let rare = legendary || is_known_planeswalker(name) || words >= 3;
        WeightHints { legendary, rare }
    }
}

fn is_known_planeswalker(name: &str) -> bool {
    let head = name.split(',').next().unwrap_or(name).trim();
    KNOWN_PLANESWALKERS.iter().any(|pw| pw.eq_ignore_ascii_case(head))
}

/// Attach inferred attributes to each card.
///
/// Names the source could say nothing about are pushed onto `uninformed`
/// (once each) so the caller can report them.
pub fn annotate(
    cards: Vec<CardEntry>,
    source: &dyn AttributeSource,
    uninformed: &mut Vec<String>,
) -> Vec<CardEntry> {
    cards
        .into_iter()
        .map(|card| {
            let attrs = source.infer(&card.name);
            if attrs.is_uninformed() && !uninformed.contains(&card.name) {
                uninformed.push(card.name.clone());
            }
            card.with_attributes(attrs)
        })
        .collect()
}

//! Archetype classification and key-card ranking.
//!
//! The archetype is a pure function of the deck's color count and the
//! quantity-weighted average mana value of its mainboard. Decision order
//! matters and overlapping cases fall through to `Midrange`:
//!
//! 1. one color and average below 2.5 -> `Aggro`
//! 2. three or more colors -> `Midrange`
//! 3. average above 4 -> `Control`
//! 4. otherwise -> `Midrange`

use crate::config::KEY_CARD_LIMIT;
use crate::infer::{is_basic_land, AttributeSource};
use crate::models::{
    Archetype, CardEntry, CardType, ClassifiedDeck, ColorSet, DeckStub, KeyCard, KeyCardRole,
    ParsedDeck,
};
use crate::parse::slugify;

const AGGRO_MAX_AVG: f64 = 2.5;
const CONTROL_MIN_AVG: f64 = 4.0;

const KEY_CARD_MIN_QUANTITY: u32 = 3;
const LEGENDARY_BONUS: u32 = 20;
const PLANESWALKER_BONUS: u32 = 15;
const RARE_BONUS: u32 = 10;

/// Cards played across so many archetypes that they say nothing about a
/// deck's identity.
pub const COMMON_UTILITY: &[&str] = &[
    "Consider",
    "Cut Down",
    "Duress",
    "Evolving Wilds",
    "Fabled Passage",
    "Go for the Throat",
    "Negate",
    "Opt",
    "Spell Pierce",
    "Thoughtseize",
];

fn is_common_utility(name: &str) -> bool {
    COMMON_UTILITY.iter().any(|u| u.eq_ignore_ascii_case(name))
}

/// Quantity-weighted average estimated mana value; 0 for an empty list.
pub fn average_cmc(mainboard: &[CardEntry]) -> f64 {
    let (cost, count) = mainboard.iter().fold((0u64, 0u64), |(cost, count), c| {
        let q = u64::from(c.quantity);
        (cost + u64::from(c.estimated_cmc) * q, count + q)
    });
    if count == 0 {
        0.0
    } else {
        cost as f64 / count as f64
    }
}

pub fn classify(colors: &ColorSet, mainboard: &[CardEntry]) -> Archetype {
    let avg = average_cmc(mainboard);
    if colors.len() == 1 && avg < AGGRO_MAX_AVG {
        Archetype::Aggro
    } else if colors.len() >= 3 {
        Archetype::Midrange
    } else if avg > CONTROL_MIN_AVG {
        Archetype::Control
    } else {
        Archetype::Midrange
    }
}

/// Union of the inferred colors of every card in the list.
pub fn deck_colors(cards: &[CardEntry]) -> ColorSet {
    cards
        .iter()
        .flat_map(|c| c.inferred_colors.iter().copied())
        .collect()
}

/// Rank the mainboard's most representative cards.
///
/// Candidates are non-basic, non-utility cards run as three or more copies.
/// Ties keep mainboard order.
pub fn key_cards(mainboard: &[CardEntry], source: &dyn AttributeSource) -> Vec<KeyCard> {
    let mut ranked: Vec<KeyCard> = mainboard
        .iter()
        .filter(|c| c.quantity >= KEY_CARD_MIN_QUANTITY)
        .filter(|c| !is_basic_land(&c.name) && !is_common_utility(&c.name))
        .map(|c| {
            let hints = source.hints(&c.name);
            let planeswalker = c.inferred_type == CardType::Planeswalker;

            let mut weight = c.quantity.saturating_mul(10);
            if hints.legendary {
                weight = weight.saturating_add(LEGENDARY_BONUS);
            }
            if planeswalker {
                weight = weight.saturating_add(PLANESWALKER_BONUS);
            }
            if hints.rare {
                weight = weight.saturating_add(RARE_BONUS);
            }

            let role = if planeswalker {
                KeyCardRole::Planeswalker
            } else if hints.legendary {
                KeyCardRole::Legend
            } else if c.quantity >= 4 {
                KeyCardRole::Staple
            } else {
                KeyCardRole::Support
            };

            KeyCard {
                name: c.name.clone(),
                weight,
                role,
            }
        })
        .collect();

    // `sort_by` is stable, so equal weights stay in mainboard order.
    ranked.sort_by(|a, b| b.weight.cmp(&a.weight));
    ranked.truncate(KEY_CARD_LIMIT);
    ranked
}

// ---------------------------------------------------------------------------
// ArchetypeClassifier
// ---------------------------------------------------------------------------

/// Turns an overview stub plus its parsed, annotated decklist into a
/// [`ClassifiedDeck`].
pub struct ArchetypeClassifier<'a> {
    source: &'a dyn AttributeSource,
}

impl<'a> ArchetypeClassifier<'a> {
    pub fn new(source: &'a dyn AttributeSource) -> Self {
        Self { source }
    }

    pub fn classify_deck(&self, stub: &DeckStub, deck: ParsedDeck) -> ClassifiedDeck {
        let colors = deck_colors(&deck.mainboard);
        let archetype = classify(&colors, &deck.mainboard);
        let key_cards = key_cards(&deck.mainboard, self.source);
        let total_cards = deck
            .mainboard
            .iter()
            .fold(0u32, |total, c| total.saturating_add(c.quantity));

        ClassifiedDeck {
            id: slugify(&stub.name, stub.rank),
            name: stub.name.clone(),
            meta_share_percent: stub.meta_share_percent,
            rank: stub.rank,
            colors,
            mainboard: deck.mainboard,
            sideboard: deck.sideboard,
            key_cards,
            archetype,
            total_cards,
        }
    }
}

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

// ---------------------------------------------------------------------------
// Color
// ---------------------------------------------------------------------------

/// One of the five colors of mana, in WUBRG order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Color {
    W,
    U,
    B,
    R,
    G,
}

impl Color {
    pub const ALL: [Color; 5] = [Color::W, Color::U, Color::B, Color::R, Color::G];

    /// The basic land that produces this color.
    pub fn basic_land(self) -> &'static str {
        match self {
            Color::W => "Plains",
            Color::U => "Island",
            Color::B => "Swamp",
            Color::R => "Mountain",
            Color::G => "Forest",
        }
    }

    /// The English color word, as it appears in card names.
    pub fn word(self) -> &'static str {
        match self {
            Color::W => "White",
            Color::U => "Blue",
            Color::B => "Black",
            Color::R => "Red",
            Color::G => "Green",
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let c = match self {
            Color::W => 'W',
            Color::U => 'U',
            Color::B => 'B',
            Color::R => 'R',
            Color::G => 'G',
        };
        write!(f, "{}", c)
    }
}

/// Ordered set of colors; serializes as `["U", "R"]`.
pub type ColorSet = BTreeSet<Color>;

// ---------------------------------------------------------------------------
// CardType
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CardType {
    Land,
    Planeswalker,
    #[default]
    Unknown,
}

// ---------------------------------------------------------------------------
// CardAttributes: what an attribute source can say about a card name
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CardAttributes {
    pub card_type: CardType,
    pub colors: ColorSet,
    pub estimated_cmc: u32,
}

impl CardAttributes {
    /// True when nothing beyond the default guesses could be inferred.
    pub fn is_uninformed(&self) -> bool {
        self.card_type == CardType::Unknown && self.colors.is_empty()
    }
}

// ---------------------------------------------------------------------------
// CardEntry: one line of a decklist
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardEntry {
    pub name: String,
    pub quantity: u32,
    pub inferred_type: CardType,
    #[serde(default)]
    pub inferred_colors: ColorSet,
    pub estimated_cmc: u32,
}

impl CardEntry {
    /// A bare entry as read off a decklist, before attribute inference.
    pub fn new(name: impl Into<String>, quantity: u32) -> Self {
        Self {
            name: name.into(),
            quantity,
            inferred_type: CardType::Unknown,
            inferred_colors: ColorSet::new(),
            estimated_cmc: 0,
        }
    }

    pub fn with_attributes(mut self, attrs: CardAttributes) -> Self {
        self.inferred_type = attrs.card_type;
        self.inferred_colors = attrs.colors;
        self.estimated_cmc = attrs.estimated_cmc;
        self
    }
}

//! Built-in placeholder metagame, served only when there is neither a cached
//! snapshot nor a successful scrape.

use chrono::{DateTime, Utc};

use crate::classify::ArchetypeClassifier;
use crate::infer::{annotate, AttributeSource};
use crate::models::{CardEntry, DeckStub, MetaSnapshot, ParsedDeck};

pub const FALLBACK_SOURCE: &str = "builtin-fallback";

struct PlaceholderDeck {
    name: &'static str,
    share: f64,
    mainboard: &'static [(&'static str, u32)],
    sideboard: &'static [(&'static str, u32)],
}

const DECKS: &[PlaceholderDeck] = &[
    PlaceholderDeck {
        name: "Mono Red Aggro",
        share: 14.2,
        mainboard: &[
            ("Mountain", 20),
            ("Monastery Swiftspear", 4),
            ("Play with Fire", 4),
            ("Kumano Faces Kakkazan", 4),
            ("Lightning Strike", 4),
            ("Bloodthirsty Adversary", 4),
            ("Phoenix Chick", 4),
            ("Squee, Dubious Monarch", 4),
            ("Witchstalker Frenzy", 4),
            ("Urabrask's Forge", 4),
            ("Shock", 4),
        ],
        sideboard: &[("Roiling Vortex", 3), ("Abrade", 4)],
    },
    PlaceholderDeck {
        name: "Azorius Control",
        share: 9.6,
        mainboard: &[
            ("Plains", 7),
            ("Island", 7),
            ("Adarkar Wastes", 4),
            ("Restless Anchorage", 4),
            ("Memory Deluge", 4),
            ("Sunfall", 4),
            ("No More Lies", 4),
            ("Teferi, Hero of Dominaria", 3),
            ("The Wandering Emperor", 3),
            ("Depopulate", 3),
            ("Get Lost", 4),
            ("Three Steps Ahead", 4),
            ("March of Otherworldly Light", 4),
        ],
        sideboard: &[("Negate", 3), ("Farewell", 2)],
    },
    PlaceholderDeck {
        name: "Golgari Midrange",
        share: 8.1,
        mainboard: &[
            ("Swamp", 10),
            ("Forest", 8),
            ("Deathcap Glade", 4),
            ("Sheoldred, the Apocalypse", 4),
            ("Glissa Sunslayer", 4),
            ("Tranquil Frillback", 4),
            ("Preacher of the Schism", 4),
            ("Go for the Throat", 4),
            ("Liliana of the Veil", 3),
            ("Mosswood Dreadknight", 4),
            ("Tear Asunder", 3),
            ("Virtue of Persistence", 4),
        ],
        sideboard: &[("Duress", 3), ("Cut Down", 3)],
    },
];

fn entries(list: &[(&str, u32)]) -> Vec<CardEntry> {
    crate::parse::merge_entries(
        list.iter()
            .map(|(name, qty)| CardEntry::new(*name, *qty))
            .collect(),
    )
}

/// Classify the placeholder decks with `source` and stamp them `now`.
pub fn placeholder_snapshot(now: DateTime<Utc>, source: &dyn AttributeSource) -> MetaSnapshot {
    let classifier = ArchetypeClassifier::new(source);
    let mut ignored = Vec::new();
    let decks = DECKS
        .iter()
        .enumerate()
        .map(|(i, d)| {
            let stub = DeckStub {
                name: d.name.to_string(),
                meta_share_percent: d.share,
                detail_ref: String::new(),
                rank: i as u32 + 1,
            };
            let parsed = ParsedDeck {
                mainboard: annotate(entries(d.mainboard), source, &mut ignored),
                sideboard: annotate(entries(d.sideboard), source, &mut ignored),
            };
            classifier.classify_deck(&stub, parsed)
        })
        .collect();

    MetaSnapshot {
        generated_at: now,
        source: FALLBACK_SOURCE.to_string(),
        decks,
    }
}

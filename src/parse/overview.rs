//! Metagame overview page -> ordered [`DeckStub`]s.

use scraper::{ElementRef, Html, Selector};
use tracing::{debug, trace};

use super::{first, parse_percent, selector, text_of};
use crate::models::DeckStub;

// ---------------------------------------------------------------------------
// OverviewStrategy
// ---------------------------------------------------------------------------

/// One way of locating the deck listing on an overview page.
///
/// `container` picks the listing (first match only), `row` the candidate
/// rows inside it. Within a row, `deck_name` and `link` take the first match
/// and `share` the first match whose text parses as a percentage, preferring
/// matches that carry a `%` sign over bare numbers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverviewStrategy {
    pub name: &'static str,
    pub container: &'static str,
    pub row: &'static str,
    pub deck_name: &'static str,
    pub share: &'static str,
    pub link: &'static str,
}

impl OverviewStrategy {
    /// The strategies tried by [`OverviewParser::new`], in order.
    pub fn defaults() -> Vec<OverviewStrategy> {
        vec![
            OverviewStrategy {
                name: "metagame-table",
                container: "table.metagame-table",
                row: "tbody tr",
                deck_name: "td.deck-name a",
                share: "td.meta-share",
                link: "td.deck-name a[href]",
            },
            OverviewStrategy {
                name: "archetype-tiles",
                container: "div.archetype-tiles, div.metagame-decks",
                row: "div.archetype-tile",
                deck_name: ".archetype-tile-title a",
                share: ".metagame-percentage .archetype-tile-statistic-value, .metagame-percentage",
                link: ".archetype-tile-title a[href]",
            },
            OverviewStrategy {
                name: "generic-table",
                container: "table",
                row: "tr",
                deck_name: "a[href]",
                share: "td",
                link: "a[href]",
            },
        ]
    }

    /// Run this strategy alone. Rows missing a name, share or link are
    /// skipped. Ranks are left at zero for the parser to assign.
    fn extract(&self, doc: &Html) -> Vec<DeckStub> {
        let Some(compiled) = CompiledOverview::new(self) else {
            return Vec::new();
        };
        let Some(container) = doc.select(&compiled.container).next() else {
            trace!(strategy = self.name, "container not found");
            return Vec::new();
        };

        let mut stubs = Vec::new();
        for row in container.select(&compiled.row) {
            match compiled.row_to_stub(row) {
                Some(stub) => stubs.push(stub),
                None => trace!(strategy = self.name, "row skipped: missing field"),
            }
        }
        stubs
    }
}

struct CompiledOverview {
    container: Selector,
    row: Selector,
    deck_name: Selector,
    share: Selector,
    link: Selector,
}

impl CompiledOverview {
    fn new(strategy: &OverviewStrategy) -> Option<Self> {
        Some(Self {
            container: selector(strategy.container)?,
            row: selector(strategy.row)?,
            deck_name: selector(strategy.deck_name)?,
            share: selector(strategy.share)?,
            link: selector(strategy.link)?,
        })
    }

    fn row_to_stub(&self, row: ElementRef<'_>) -> Option<DeckStub> {
        let name = first(row, &self.deck_name).map(text_of)?;
        if name.is_empty() {
            return None;
        }
        // A cell with a percent sign beats a bare number such as a rank column.
        let cells: Vec<String> = row.select(&self.share).map(text_of).collect();
        let share = cells
            .iter()
            .filter(|text| text.contains('%'))
            .find_map(|text| parse_percent(text))
            .or_else(|| cells.iter().find_map(|text| parse_percent(text)))?;
        let link = first(row, &self.link)
            .and_then(|a| a.value().attr("href"))
            .map(str::trim)
            .filter(|href| !href.is_empty())?;

        Some(DeckStub {
            name,
            meta_share_percent: share,
            detail_ref: link.to_string(),
            rank: 0,
        })
    }
}

// ---------------------------------------------------------------------------
// OverviewParser
// ---------------------------------------------------------------------------

pub struct OverviewParser {
    strategies: Vec<OverviewStrategy>,
}

impl Default for OverviewParser {
    fn default() -> Self {
        Self::new()
    }
}

impl OverviewParser {
    pub fn new() -> Self {
        Self::with_strategies(OverviewStrategy::defaults())
    }

    pub fn with_strategies(strategies: Vec<OverviewStrategy>) -> Self {
        Self { strategies }
    }

    pub fn strategies(&self) -> &[OverviewStrategy] {
        &self.strategies
    }

    /// Extract the deck listing. Never fails; malformed or unrecognised
    /// markup yields an empty list. Ranks follow output order, from 1.
    pub fn parse(&self, html: &str) -> Vec<DeckStub> {
        let doc = Html::parse_document(html);
        for strategy in &self.strategies {
            let mut stubs = strategy.extract(&doc);
            if stubs.is_empty() {
                debug!(strategy = strategy.name, "overview strategy found no decks");
                continue;
            }
            for (i, stub) in stubs.iter_mut().enumerate() {
                stub.rank = i as u32 + 1;
            }
            debug!(strategy = strategy.name, decks = stubs.len(), "overview parsed");
            return stubs;
        }
        Vec::new()
    }
}

//! Deck detail page -> mainboard and sideboard [`CardEntry`]s.

use scraper::{ElementRef, Html, Selector};
use tracing::{debug, trace};

use super::{first, merge_entries, normalize_card_name, parse_quantity, selector, text_of};
use crate::models::{CardEntry, DeckStub, ParsedDeck};

// ---------------------------------------------------------------------------
// DetailStrategy
// ---------------------------------------------------------------------------

/// How a strategy finds the decklist on a detail page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetailLayout {
    /// One table; a header row mentioning "sideboard" moves the remaining
    /// rows to the sideboard.
    SingleTable {
        table: &'static str,
        row: &'static str,
        quantity: &'static str,
        card: &'static str,
        header: &'static str,
    },
    /// Separate containers for each section.
    SplitTables {
        mainboard: &'static str,
        sideboard: &'static str,
        row: &'static str,
        quantity: &'static str,
        card: &'static str,
    },
    /// A plain-text export, one `4 Card Name` per line. A `Sideboard` line,
    /// an `SB:` prefix, or the first blank line after mainboard cards starts
    /// the sideboard.
    TextExport { container: &'static str },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailStrategy {
    pub name: &'static str,
    pub layout: DetailLayout,
}

impl DetailStrategy {
    /// The strategies tried by [`DeckDetailParser::new`], in order.
    pub fn defaults() -> Vec<DetailStrategy> {
        vec![
            DetailStrategy {
                name: "deck-view-table",
                layout: DetailLayout::SingleTable {
                    table: "table.deck-view-deck-table",
                    row: "tr",
                    quantity: "td.deck-col-qty",
                    card: "td.deck-col-card",
                    header: "td.deck-header, th",
                },
            },
            DetailStrategy {
                name: "split-tables",
                layout: DetailLayout::SplitTables {
                    mainboard: "table.mainboard, div.mainboard table, #mainboard table",
                    sideboard: "table.sideboard, div.sideboard table, #sideboard table",
                    row: "tr",
                    quantity: "td:nth-child(1)",
                    card: "td:nth-child(2)",
                },
            },
            DetailStrategy {
                name: "text-export",
                layout: DetailLayout::TextExport {
                    container: "textarea.decklist, pre.decklist, div.deck-export",
                },
            },
        ]
    }

    fn extract(&self, doc: &Html) -> ParsedDeck {
        let deck = match &self.layout {
            DetailLayout::SingleTable {
                table,
                row,
                quantity,
                card,
                header,
            } => single_table(doc, table, row, quantity, card, header),
            DetailLayout::SplitTables {
                mainboard,
                sideboard,
                row,
                quantity,
                card,
            } => split_tables(doc, mainboard, sideboard, row, quantity, card),
            DetailLayout::TextExport { container } => text_export(doc, container),
        };
        deck.unwrap_or_default()
    }
}

/// Compiled per-row locators shared by the table layouts.
struct RowLocator {
    row: Selector,
    quantity: Selector,
    card: Selector,
    link: Selector,
}

impl RowLocator {
    fn new(row: &str, quantity: &str, card: &str) -> Option<Self> {
        Some(Self {
            row: selector(row)?,
            quantity: selector(quantity)?,
            card: selector(card)?,
            link: selector("a")?,
        })
    }

    /// A row counts only with a positive quantity and a non-empty name.
    fn entry(&self, row: ElementRef<'_>) -> Option<CardEntry> {
        let quantity = first(row, &self.quantity).and_then(|q| parse_quantity(&text_of(q)))?;
        let cell = first(row, &self.card)?;
        // Prefer the link text; card cells often carry mana symbols or prices.
        let raw = first(cell, &self.link).map_or_else(|| text_of(cell), text_of);
        let name = normalize_card_name(&raw);
        if name.is_empty() {
            return None;
        }
        Some(CardEntry::new(name, quantity))
    }

    fn entries(&self, table: ElementRef<'_>) -> Vec<CardEntry> {
        table
            .select(&self.row)
            .filter_map(|row| {
                let entry = self.entry(row);
                if entry.is_none() {
                    trace!("detail row dropped");
                }
                entry
            })
            .collect()
    }
}

fn single_table(
    doc: &Html,
    table: &str,
    row: &str,
    quantity: &str,
    card: &str,
    header: &str,
) -> Option<ParsedDeck> {
    let table_sel = selector(table)?;
    let header_sel = selector(header)?;
    let locator = RowLocator::new(row, quantity, card)?;
    let table = doc.select(&table_sel).next()?;

    let mut main = Vec::new();
    let mut side = Vec::new();
    let mut in_sideboard = false;
    for row in table.select(&locator.row) {
        if let Some(h) = first(row, &header_sel) {
            if text_of(h).to_lowercase().contains("sideboard") {
                in_sideboard = true;
            }
            continue;
        }
        if let Some(entry) = locator.entry(row) {
            if in_sideboard {
                side.push(entry);
            } else {
                main.push(entry);
            }
        }
    }
    Some(ParsedDeck {
        mainboard: merge_entries(main),
        sideboard: merge_entries(side),
    })
}

fn split_tables(
    doc: &Html,
    mainboard: &str,
    sideboard: &str,
    row: &str,
    quantity: &str,
    card: &str,
) -> Option<ParsedDeck> {
    let main_sel = selector(mainboard)?;
    let side_sel = selector(sideboard)?;
    let locator = RowLocator::new(row, quantity, card)?;

    let main_table = doc.select(&main_sel).next()?;
    let main = locator.entries(main_table);
    let side = doc
        .select(&side_sel)
        .next()
        .map(|t| locator.entries(t))
        .unwrap_or_default();
    Some(ParsedDeck {
        mainboard: merge_entries(main),
        sideboard: merge_entries(side),
    })
}

fn text_export(doc: &Html, container: &str) -> Option<ParsedDeck> {
    let sel = selector(container)?;
    let el = doc.select(&sel).next()?;
    let text: String = el.text().collect();
    Some(parse_text_list(&text))
}

/// Parse an MTGO/Arena style text decklist.
pub fn parse_text_list(text: &str) -> ParsedDeck {
    let mut main = Vec::new();
    let mut side = Vec::new();
    let mut in_sideboard = false;

    for line in text.lines() {
        let mut line = line.trim();
        if line.is_empty() {
            if !main.is_empty() {
                in_sideboard = true;
            }
            continue;
        }
        let lower = line.to_lowercase();
        if lower.starts_with("sideboard") {
            in_sideboard = true;
            continue;
        }
        if matches!(lower.as_str(), "deck" | "mainboard" | "main deck" | "companion") {
            continue;
        }
        let mut to_sideboard = in_sideboard;
        if let Some(rest) = line.strip_prefix("SB:").or_else(|| line.strip_prefix("sb:")) {
            line = rest.trim_start();
            to_sideboard = true;
        }

        let Some((count, rest)) = line.split_once(char::is_whitespace) else {
            continue;
        };
        let Some(quantity) = parse_quantity(count) else {
            continue;
        };
        let name = normalize_card_name(rest);
        if name.is_empty() {
            continue;
        }
        let entry = CardEntry::new(name, quantity);
        if to_sideboard {
            side.push(entry);
        } else {
            main.push(entry);
        }
    }

    ParsedDeck {
        mainboard: merge_entries(main),
        sideboard: merge_entries(side),
    }
}

// ---------------------------------------------------------------------------
// DeckDetailParser
// ---------------------------------------------------------------------------

pub struct DeckDetailParser {
    strategies: Vec<DetailStrategy>,
}

impl Default for DeckDetailParser {
    fn default() -> Self {
        Self::new()
    }
}

impl DeckDetailParser {
    pub fn new() -> Self {
        Self::with_strategies(DetailStrategy::defaults())
    }

    pub fn with_strategies(strategies: Vec<DetailStrategy>) -> Self {
        Self { strategies }
    }

    pub fn strategies(&self) -> &[DetailStrategy] {
        &self.strategies
    }

    /// Extract the decklist for `stub`. Card names are normalized and
    /// duplicate rows merged. Returns an empty deck when no strategy matches.
    pub fn parse(&self, html: &str, stub: &DeckStub) -> ParsedDeck {
        let doc = Html::parse_document(html);
        for strategy in &self.strategies {
            let deck = strategy.extract(&doc);
            if deck.is_empty() {
                debug!(deck = %stub.name, strategy = strategy.name, "detail strategy found no cards");
                continue;
            }
            debug!(
                deck = %stub.name,
                strategy = strategy.name,
                mainboard = deck.mainboard.len(),
                sideboard = deck.sideboard.len(),
                "deck parsed"
            );
            return deck;
        }
        ParsedDeck::default()
    }
}

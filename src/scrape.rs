//! One full scrape: overview -> per-deck detail pages -> classified snapshot.
//!
//! Detail pages are fetched one at a time with a fixed pause before each
//! request. A deck whose page fails is kept with an empty list so its rank
//! and meta share still appear; only an overview failure aborts the scrape.

use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use url::Url;

use crate::classify::ArchetypeClassifier;
use crate::config::FetchOptions;
use crate::error::{DataWarning, MetagameError, Result};
use crate::fetch::FetchClient;
use crate::infer::{annotate, AttributeSource};
use crate::models::{ClassifiedDeck, DeckStub, MetaSnapshot, ParsedDeck};
use crate::parse::{DeckDetailParser, OverviewParser};

/// A finished scrape plus everything worth reporting about it.
#[derive(Debug, Clone)]
pub struct ScrapeReport {
    pub snapshot: MetaSnapshot,
    pub warnings: Vec<DataWarning>,
}

pub struct Scraper {
    fetch: FetchClient,
    options: FetchOptions,
    rate_limit: Duration,
    inferencer: Arc<dyn AttributeSource>,
    overview: OverviewParser,
    detail: DeckDetailParser,
}

impl Scraper {
    pub fn new(
        fetch: FetchClient,
        options: FetchOptions,
        rate_limit: Duration,
        inferencer: Arc<dyn AttributeSource>,
    ) -> Self {
        Self {
            fetch,
            options,
            rate_limit,
            inferencer,
            overview: OverviewParser::new(),
            detail: DeckDetailParser::new(),
        }
    }

    pub fn with_parsers(mut self, overview: OverviewParser, detail: DeckDetailParser) -> Self {
        self.overview = overview;
        self.detail = detail;
        self
    }

    /// Scrape `source_url` into a snapshot stamped `now`.
    ///
    /// Fails only if the overview cannot be fetched or yields no decks.
    pub fn scrape(&self, source_url: &str, now: DateTime<Utc>) -> Result<ScrapeReport> {
        let html = self.fetch.fetch(source_url, &self.options)?;
        let stubs = self.overview.parse(&html);
        if stubs.is_empty() {
            return Err(MetagameError::NoData(format!(
                "no decks found on overview page {}",
                source_url
            )));
        }
        info!(source = source_url, decks = stubs.len(), "overview scraped");

        let base = Url::parse(source_url).ok();
        let classifier = ArchetypeClassifier::new(self.inferencer.as_ref());
        let mut warnings = Vec::new();
        let mut uninformed = Vec::new();
        let mut seen_ids = HashSet::new();
        let mut decks: Vec<ClassifiedDeck> = Vec::with_capacity(stubs.len());

        for stub in &stubs {
            self.fetch.sleeper().sleep(self.rate_limit);
            let parsed = self.scrape_deck(base.as_ref(), stub, &mut warnings);
            let parsed = ParsedDeck {
                mainboard: annotate(parsed.mainboard, self.inferencer.as_ref(), &mut uninformed),
                sideboard: annotate(parsed.sideboard, self.inferencer.as_ref(), &mut uninformed),
            };
            let deck = classifier.classify_deck(stub, parsed);
            if !seen_ids.insert(deck.id.clone()) {
                warn!(id = %deck.id, deck = %deck.name, "duplicate deck id");
                warnings.push(DataWarning::DuplicateDeckId {
                    id: deck.id.clone(),
                    name: deck.name.clone(),
                });
            }
            decks.push(deck);
        }

        warnings.extend(
            uninformed
                .into_iter()
                .map(|card| DataWarning::UninferredAttributes { card }),
        );

        Ok(ScrapeReport {
            snapshot: MetaSnapshot {
                generated_at: now,
                source: source_url.to_string(),
                decks,
            },
            warnings,
        })
    }

    fn scrape_deck(
        &self,
        base: Option<&Url>,
        stub: &DeckStub,
        warnings: &mut Vec<DataWarning>,
    ) -> ParsedDeck {
        let Some(url) = resolve_link(base, &stub.detail_ref) else {
            warn!(deck = %stub.name, link = %stub.detail_ref, "unresolvable deck link");
            warnings.push(DataWarning::BadDetailLink {
                deck: stub.name.clone(),
                link: stub.detail_ref.clone(),
            });
            return ParsedDeck::default();
        };

        match self.fetch.fetch(url.as_str(), &self.options) {
            Ok(html) => {
                let deck = self.detail.parse(&html, stub);
                if deck.is_empty() {
                    warn!(deck = %stub.name, "no cards found on detail page");
                    warnings.push(DataWarning::DetailUnparsed {
                        deck: stub.name.clone(),
                    });
                }
                deck
            }
            Err(error) => {
                warn!(deck = %stub.name, error = %error, "detail page unavailable; keeping empty deck");
                warnings.push(DataWarning::DetailFetchFailed {
                    deck: stub.name.clone(),
                    error,
                });
                ParsedDeck::default()
            }
        }
    }
}

/// Absolute links pass through; relative ones are joined onto `base`.
pub fn resolve_link(base: Option<&Url>, link: &str) -> Option<Url> {
    match Url::parse(link) {
        Ok(url) => Some(url),
        Err(url::ParseError::RelativeUrlWithoutBase) => base?.join(link).ok(),
        Err(_) => None,
    }
}

//! HTML extraction for metagame overview and deck detail pages.
//!
//! Both parsers hold an ordered list of strategies, each a structural
//! locator for the data plus per-row field locators. Strategies run in
//! order and the first one that yields anything wins; the rest are skipped.
//! A strategy that finds nothing is not an error, the chain just moves on.
//! When every strategy comes up empty the parser returns an empty result.

pub mod detail;
pub mod overview;

pub use detail::{DeckDetailParser, DetailLayout, DetailStrategy};
pub use overview::{OverviewParser, OverviewStrategy};

use scraper::{ElementRef, Selector};
use std::collections::HashMap;
use tracing::warn;

use crate::models::CardEntry;

// ---------------------------------------------------------------------------
// Normalization
// ---------------------------------------------------------------------------

/// Canonical form of a card name: trimmed, runs of whitespace collapsed to a
/// single space, curly/backtick apostrophes folded to `'` and curly double
/// quotes to `"`. Idempotent.
pub fn normalize_card_name(raw: &str) -> String {
    let folded: String = raw.chars().map(fold_quote).collect();
    collapse_whitespace(&folded)
}

fn fold_quote(c: char) -> char {
    match c {
        '\u{2018}' | '\u{2019}' | '\u{201A}' | '\u{201B}' | '\u{2032}' | '`' | '\u{00B4}' => '\'',
        '\u{201C}' | '\u{201D}' | '\u{201E}' | '\u{201F}' | '\u{2033}' => '"',
        _ => c,
    }
}

pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Deterministic deck id: lower-cased alphanumerics, words joined by single
/// hyphens, all other characters dropped. Names with no alphanumerics at all
/// fall back to `deck-<rank>`.
pub fn slugify(name: &str, rank: u32) -> String {
    let mut out = String::with_capacity(name.len());
    let mut pending_sep = false;
    for ch in name.chars() {
        if ch.is_alphanumeric() {
            if pending_sep && !out.is_empty() {
                out.push('-');
            }
            pending_sep = false;
            out.extend(ch.to_lowercase());
        } else if ch.is_whitespace() || ch == '-' || ch == '_' {
            pending_sep = true;
        }
    }
    if out.is_empty() {
        format!("deck-{}", rank)
    } else {
        out
    }
}

// ---------------------------------------------------------------------------
// Field parsing
// ---------------------------------------------------------------------------

/// Parse a meta share such as `"15.8%"`, `"15,8 %"` or `"12.3% (45)"`.
///
/// Without a `%` sign the whole text must be the number. Values outside
/// 0..=100 are rejected.
pub fn parse_percent(text: &str) -> Option<f64> {
    let text = text.trim();
    let (head, has_sign) = match text.find('%') {
        Some(i) => (text[..i].trim_end(), true),
        None => (text, false),
    };
    let is_num = |c: char| c.is_ascii_digit() || c == '.' || c == ',';
    let start = head
        .char_indices()
        .rev()
        .find(|(_, c)| !is_num(*c))
        .map_or(0, |(i, c)| i + c.len_utf8());
    if start != 0 && !has_sign {
        return None;
    }
    let value: f64 = head[start..].replace(',', ".").parse().ok()?;
    (value.is_finite() && (0.0..=100.0).contains(&value)).then_some(value)
}

/// Parse a card count such as `"4"`, `"4x"` or `"x4"`. Zero is rejected.
pub fn parse_quantity(text: &str) -> Option<u32> {
    let t = text
        .trim()
        .trim_matches(|c: char| c == 'x' || c == 'X' || c == '\u{00D7}')
        .trim();
    t.parse::<u32>().ok().filter(|q| *q > 0)
}

// ---------------------------------------------------------------------------
// DOM helpers
// ---------------------------------------------------------------------------

/// Compile a CSS selector, logging and skipping it if it is invalid.
pub(crate) fn selector(css: &str) -> Option<Selector> {
    match Selector::parse(css) {
        Ok(sel) => Some(sel),
        Err(e) => {
            warn!(selector = css, error = ?e, "invalid selector; strategy skipped");
            None
        }
    }
}

/// Whitespace-collapsed text content of an element.
pub(crate) fn text_of(el: ElementRef<'_>) -> String {
    collapse_whitespace(&el.text().collect::<String>())
}

/// First descendant of `el` matching `sel`.
pub(crate) fn first<'a>(el: ElementRef<'a>, sel: &Selector) -> Option<ElementRef<'a>> {
    el.select(sel).next()
}

// ---------------------------------------------------------------------------
// Aggregation
// ---------------------------------------------------------------------------

/// Merge entries that share a name, summing quantities and keeping the
/// position of the first occurrence.
pub fn merge_entries(entries: Vec<CardEntry>) -> Vec<CardEntry> {
    let mut merged: Vec<CardEntry> = Vec::with_capacity(entries.len());
    let mut index: HashMap<String, usize> = HashMap::new();
    for entry in entries {
        match index.get(&entry.name) {
            Some(&i) => merged[i].quantity = merged[i].quantity.saturating_add(entry.quantity),
            None => {
                index.insert(entry.name.clone(), merged.len());
                merged.push(entry);
            }
        }
    }
    merged
}

//! Shared test fixtures for the metagame integration tests.
//!
//! Provides a scripted [`Transport`] that serves canned responses per URL, a
//! [`Sleeper`] that records requested delays instead of sleeping, and
//! builders for overview and detail HTML in the markup the default parser
//! strategies recognise.

#![allow(dead_code)]

use chrono::{DateTime, Duration as ChronoDuration, TimeZone, Utc};
use mtg_metagame::fetch::{HttpResponse, Sleeper, Transport};
use mtg_metagame::{FetchOptions, KeyValueStore, MemoryStore, Metagame};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

pub const SOURCE: &str = "https://meta.test/metagame/standard";

pub fn detail_url(path: &str) -> String {
    format!("https://meta.test{}", path)
}

/// 2024-01-01T00:00:00Z.
pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
}

pub fn hours(h: i64) -> ChronoDuration {
    ChronoDuration::hours(h)
}

// ---------------------------------------------------------------------------
// ScriptedTransport
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub enum Reply {
    Ok(u16, String),
    Err(String),
}

impl Reply {
    pub fn html(body: impl Into<String>) -> Self {
        Reply::Ok(200, body.into())
    }
}

/// Serves replies per URL. A URL given a sequence replays it in order and
/// then keeps repeating the last reply. Unknown URLs fail like a dead host.
#[derive(Default)]
pub struct ScriptedTransport {
    routes: Mutex<HashMap<String, Vec<Reply>>>,
    delays: Mutex<HashMap<String, Duration>>,
    calls: Mutex<Vec<(String, Duration)>>,
}

impl ScriptedTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn respond(&self, url: &str, reply: Reply) {
        self.respond_seq(url, vec![reply]);
    }

    pub fn respond_seq(&self, url: &str, replies: Vec<Reply>) {
        self.routes.lock().unwrap().insert(url.to_string(), replies);
    }

    /// Make requests to `url` take `delay` of real time.
    pub fn delay(&self, url: &str, delay: Duration) {
        self.delays.lock().unwrap().insert(url.to_string(), delay);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().iter().map(|(u, _)| u.clone()).collect()
    }

    pub fn timeouts(&self) -> Vec<Duration> {
        self.calls.lock().unwrap().iter().map(|(_, t)| *t).collect()
    }

    pub fn call_count(&self, url: &str) -> usize {
        self.calls().iter().filter(|u| *u == url).count()
    }
}

impl Transport for ScriptedTransport {
    fn get(&self, url: &str, timeout: Duration) -> Result<HttpResponse, String> {
        self.calls.lock().unwrap().push((url.to_string(), timeout));
        let delay = self.delays.lock().unwrap().get(url).copied();
        if let Some(delay) = delay {
            thread::sleep(delay);
        }

        let reply = {
            let mut routes = self.routes.lock().unwrap();
            match routes.get_mut(url) {
                Some(queue) if queue.len() > 1 => queue.remove(0),
                Some(queue) => queue[0].clone(),
                None => Reply::Err(format!("connection refused: {}", url)),
            }
        };
        match reply {
            Reply::Ok(status, body) => Ok(HttpResponse { status, body }),
            Reply::Err(message) => Err(message),
        }
    }
}

// ---------------------------------------------------------------------------
// RecordingSleeper
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct RecordingSleeper {
    slept: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn slept(&self) -> Vec<Duration> {
        self.slept.lock().unwrap().clone()
    }
}

impl Sleeper for RecordingSleeper {
    fn sleep(&self, duration: Duration) {
        self.slept.lock().unwrap().push(duration);
    }
}

// ---------------------------------------------------------------------------
// HTML fixtures
// ---------------------------------------------------------------------------

/// Overview page in the `metagame-table` layout. Rows are (name, share, link).
pub fn overview_html(rows: &[(&str, &str, &str)]) -> String {
    let body: String = rows
        .iter()
        .map(|(name, share, link)| {
            format!(
                r#"<tr><td class="deck-name"><a href="{link}">{name}</a></td><td class="meta-share">{share}</td></tr>"#
            )
        })
        .collect();
    format!(
        r#"<html><body>
        <h1>Standard Metagame</h1>
        <table class="metagame-table">
          <thead><tr><th>Deck</th><th>Meta %</th></tr></thead>
          <tbody>{body}</tbody>
        </table>
        </body></html>"#
    )
}

/// Detail page in the `deck-view-table` layout.
pub fn detail_html(mainboard: &[(u32, &str)], sideboard: &[(u32, &str)]) -> String {
    let rows = |cards: &[(u32, &str)]| -> String {
        cards
            .iter()
            .map(|(qty, name)| {
                format!(
                    r#"<tr><td class="deck-col-qty">{qty}</td><td class="deck-col-card"><a href="/card/x">{name}</a></td><td class="deck-col-price">1.99</td></tr>"#
                )
            })
            .collect()
    };
    format!(
        r#"<html><body>
        <table class="deck-view-deck-table">
          <tr><td class="deck-header" colspan="3">Mainboard</td></tr>
          {main}
          <tr><td class="deck-header" colspan="3">Sideboard</td></tr>
          {side}
        </table>
        </body></html>"#,
        main = rows(mainboard),
        side = rows(sideboard),
    )
}

pub fn red_deck_html() -> String {
    detail_html(
        &[(20, "Mountain"), (4, "Lightning Bolt"), (4, "Monastery Swiftspear")],
        &[(2, "Abrade")],
    )
}

pub fn control_deck_html() -> String {
    detail_html(
        &[
            (8, "Plains"),
            (8, "Island"),
            (4, "Teferi, Hero of Dominaria"),
            (4, "Memory Deluge"),
        ],
        &[(3, "Negate")],
    )
}

// ---------------------------------------------------------------------------
// Metagame wiring
// ---------------------------------------------------------------------------

pub fn test_options(max_retries: u32) -> FetchOptions {
    FetchOptions {
        timeout: Duration::from_secs(5),
        max_retries,
        jitter: false,
    }
}

pub struct Harness {
    pub transport: Arc<ScriptedTransport>,
    pub sleeper: Arc<RecordingSleeper>,
    pub store: Arc<MemoryStore>,
}

impl Harness {
    pub fn new() -> Self {
        Self {
            transport: ScriptedTransport::new(),
            sleeper: RecordingSleeper::new(),
            store: Arc::new(MemoryStore::new()),
        }
    }

    /// A three-deck site where every page loads.
    pub fn with_site() -> Self {
        let h = Self::new();
        h.transport.respond(
            SOURCE,
            Reply::html(overview_html(&[
                ("Mono Red Aggro", "15.8%", "/archetype/mono-red"),
                ("Azorius Control", "9.1%", "/archetype/azorius"),
                ("Domain Ramp", "6.4%", "/archetype/domain"),
            ])),
        );
        h.transport
            .respond(&detail_url("/archetype/mono-red"), Reply::html(red_deck_html()));
        h.transport
            .respond(&detail_url("/archetype/azorius"), Reply::html(control_deck_html()));
        h.transport.respond(
            &detail_url("/archetype/domain"),
            Reply::html(detail_html(
                &[(4, "Plains"), (4, "Island"), (4, "Forest"), (4, "Atraxa, Grand Unifier")],
                &[],
            )),
        );
        h
    }

    pub fn build(&self) -> Metagame {
        self.builder().build().unwrap()
    }

    pub fn builder(&self) -> mtg_metagame::MetagameBuilder {
        let store: Arc<dyn KeyValueStore> = self.store.clone();
        Metagame::builder()
            .source_url(SOURCE)
            .fetch_options(test_options(2))
            .rate_limit(Duration::from_millis(1000))
            .store(store)
            .transport(self.transport.clone())
            .sleeper(self.sleeper.clone())
            .fallback(false)
    }
}

//! HTTP retrieval with bounded retry and exponential backoff.
//!
//! Three seams keep this testable without a network or a wall clock:
//!
//! - [`Transport`] performs one GET. [`ReqwestTransport`] is the real one.
//! - [`EgressResolver`] rewrites the target URL before each attempt, e.g.
//!   through a public relay ([`RelayResolver`]) or not at all
//!   ([`IdentityResolver`]).
//! - [`Sleeper`] waits between attempts. [`ThreadSleeper`] really sleeps.

use rand::Rng;
use reqwest::blocking::Client;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::{self, FetchOptions};
use crate::error::{FetchError, Result};

// ---------------------------------------------------------------------------
// Transport
// ---------------------------------------------------------------------------

/// A response as seen by the retry loop: status plus body text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Performs a single GET. Errors carry the transport's message; timeouts
/// are reported the same way as any other network failure.
pub trait Transport: Send + Sync {
    fn get(&self, url: &str, timeout: Duration) -> std::result::Result<HttpResponse, String>;
}

/// Blocking `reqwest` transport.
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .user_agent(config::USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(10))
            .gzip(true)
            .build()?;
        Ok(Self { client })
    }

    /// Wrap an already configured client.
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

impl Transport for ReqwestTransport {
    fn get(&self, url: &str, timeout: Duration) -> std::result::Result<HttpResponse, String> {
        let resp = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .map_err(|e| e.to_string())?;
        let status = resp.status().as_u16();
        let body = resp.text().map_err(|e| e.to_string())?;
        Ok(HttpResponse { status, body })
    }
}

// ---------------------------------------------------------------------------
// EgressResolver
// ---------------------------------------------------------------------------

/// Maps the URL we want to the URL we actually request.
///
/// `attempt` starts at 0 and lets resolvers rotate between routes on retry.
pub trait EgressResolver: Send + Sync {
    fn resolve(&self, target: &str, attempt: u32) -> String;
}

/// Requests the target directly.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityResolver;

impl EgressResolver for IdentityResolver {
    fn resolve(&self, target: &str, _attempt: u32) -> String {
        target.to_string()
    }
}

/// Routes requests through relay prefixes that take the target URL as a
/// percent-encoded query value, rotating to the next relay on each retry.
#[derive(Debug, Clone)]
pub struct RelayResolver {
    relays: Vec<String>,
}

impl RelayResolver {
    pub fn new(relays: Vec<String>) -> Self {
        Self { relays }
    }
}

impl Default for RelayResolver {
    fn default() -> Self {
        Self::new(config::default_relays())
    }
}

impl EgressResolver for RelayResolver {
    fn resolve(&self, target: &str, attempt: u32) -> String {
        if self.relays.is_empty() {
            return target.to_string();
        }
        let relay = &self.relays[attempt as usize % self.relays.len()];
        let encoded: String = url::form_urlencoded::byte_serialize(target.as_bytes()).collect();
        format!("{}{}", relay, encoded)
    }
}

// ---------------------------------------------------------------------------
// Sleeper
// ---------------------------------------------------------------------------

pub trait Sleeper: Send + Sync {
    fn sleep(&self, duration: Duration);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        thread::sleep(duration);
    }
}

// ---------------------------------------------------------------------------
// FetchClient
// ---------------------------------------------------------------------------

/// Base delay before retry number `attempt + 1`: `2^attempt` seconds, with
/// the exponent capped at [`config::MAX_BACKOFF_EXPONENT`].
pub fn backoff_delay(attempt: u32) -> Duration {
    Duration::from_secs(1u64 << attempt.min(config::MAX_BACKOFF_EXPONENT))
}

#[derive(Clone)]
pub struct FetchClient {
    transport: Arc<dyn Transport>,
    egress: Arc<dyn EgressResolver>,
    sleeper: Arc<dyn Sleeper>,
}

impl FetchClient {
    pub fn new(
        transport: Arc<dyn Transport>,
        egress: Arc<dyn EgressResolver>,
        sleeper: Arc<dyn Sleeper>,
    ) -> Self {
        Self {
            transport,
            egress,
            sleeper,
        }
    }

    pub fn sleeper(&self) -> &Arc<dyn Sleeper> {
        &self.sleeper
    }

    /// GET `url`, making at most `max_retries + 1` attempts.
    ///
    /// Non-2xx statuses are retried exactly like network errors and
    /// timeouts. After the last attempt fails the most recent status and
    /// message are returned in a [`FetchError`].
    pub fn fetch(&self, url: &str, opts: &FetchOptions) -> std::result::Result<String, FetchError> {
        let mut last_status = None;
        let mut last_message = String::new();

        for attempt in 0..=opts.max_retries {
            let effective = self.egress.resolve(url, attempt);
            debug!(url, effective = %effective, attempt, "fetching");

            match self.transport.get(&effective, opts.timeout) {
                Ok(resp) if resp.is_success() => return Ok(resp.body),
                Ok(resp) => {
                    last_status = Some(resp.status);
                    last_message = format!("HTTP status {}", resp.status);
                }
                Err(message) => {
                    last_message = message;
                }
            }

            if attempt < opts.max_retries {
                let delay = backoff_delay(attempt) + jitter(opts.jitter);
                warn!(
                    url,
                    attempt,
                    error = %last_message,
                    delay_ms = delay.as_millis() as u64,
                    "fetch failed; retrying"
                );
                self.sleeper.sleep(delay);
            }
        }

        warn!(url, attempts = opts.max_retries.saturating_add(1), error = %last_message, "fetch gave up");
        Err(FetchError {
            url: url.to_string(),
            last_status,
            last_message,
        })
    }
}

fn jitter(enabled: bool) -> Duration {
    if !enabled {
        return Duration::ZERO;
    }
    let max = config::MAX_JITTER.as_millis() as u64;
    Duration::from_millis(rand::thread_rng().gen_range(0..=max))
}

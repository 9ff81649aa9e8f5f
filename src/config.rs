use std::path::PathBuf;
use std::time::Duration;

/// Metagame listing scraped when no source URL is configured.
pub const DEFAULT_SOURCE_URL: &str = "https://www.mtggoldfish.com/metagame/standard/full";

/// Storage key holding the JSON-serialized cache record.
pub const SNAPSHOT_KEY: &str = "mtg_meta_snapshot";
/// Storage key holding the last refresh as epoch milliseconds.
pub const LAST_REFRESH_KEY: &str = "mtg_meta_last_refresh";

pub const DEFAULT_TTL: Duration = Duration::from_secs(24 * 60 * 60);
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);
/// Two retries, three attempts in total.
pub const DEFAULT_MAX_RETRIES: u32 = 2;
/// Pause between consecutive deck detail requests.
pub const DEFAULT_RATE_LIMIT: Duration = Duration::from_millis(1200);
/// Upper bound on random jitter added to each backoff delay.
pub const MAX_JITTER: Duration = Duration::from_millis(250);
/// Backoff exponent cap; `2^6` seconds is the longest single wait.
pub const MAX_BACKOFF_EXPONENT: u32 = 6;

pub const KEY_CARD_LIMIT: usize = 8;

pub const USER_AGENT: &str = concat!("mtg-metagame/", env!("CARGO_PKG_VERSION"));

/// Public relays that proxy a target URL passed as a query parameter.
pub fn default_relays() -> Vec<String> {
    vec![
        "https://api.allorigins.win/raw?url=".to_string(),
        "https://corsproxy.io/?url=".to_string(),
        "https://api.codetabs.com/v1/proxy?quest=".to_string(),
    ]
}

pub fn default_cache_dir() -> PathBuf {
    if let Some(cache) = dirs::cache_dir() {
        cache.join("mtg-metagame")
    } else {
        PathBuf::from(".mtg-metagame-cache")
    }
}

/// Per-request fetch settings.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchOptions {
    pub timeout: Duration,
    pub max_retries: u32,
    /// Add up to [`MAX_JITTER`] of random delay on top of each backoff.
    pub jitter: bool,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            max_retries: DEFAULT_MAX_RETRIES,
            jitter: true,
        }
    }
}

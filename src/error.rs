use std::fmt;

/// A request that exhausted its retry budget.
///
/// Carries the last HTTP status seen (if the server answered at all) and the
/// last transport or status message, so callers can tell a dead relay from a
/// site returning 5xx.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("fetch of {url} failed after retries (status: {status}): {last_message}", status = display_status(.last_status))]
pub struct FetchError {
    pub url: String,
    pub last_status: Option<u16>,
    pub last_message: String,
}

fn display_status(status: &Option<u16>) -> String {
    status.map_or_else(|| "none".to_string(), |s| s.to_string())
}

#[derive(Debug, thiserror::Error)]
pub enum MetagameError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Cache unavailable: {0}")]
    CacheUnavailable(String),

    #[error("No data: {0}")]
    NoData(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

pub type Result<T> = std::result::Result<T, MetagameError>;

/// Non-fatal data-quality findings collected during a refresh.
///
/// None of these stop a refresh; they ride along on the
/// [`RefreshOutcome`](crate::RefreshOutcome) and are logged as they occur.
#[derive(Debug, Clone, PartialEq)]
pub enum DataWarning {
    /// Two decks slugged to the same id. Both are kept.
    DuplicateDeckId { id: String, name: String },
    /// A deck's detail page could not be fetched; the deck is kept empty.
    DetailFetchFailed { deck: String, error: FetchError },
    /// A deck's detail page was fetched but no strategy found any cards.
    DetailUnparsed { deck: String },
    /// The deck link could not be resolved to an absolute URL.
    BadDetailLink { deck: String, link: String },
    /// The inferencer had nothing to go on for this card.
    UninferredAttributes { card: String },
    /// The snapshot could not be persisted; it is held in memory only.
    CacheWriteFailed { message: String },
}

impl fmt::Display for DataWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateDeckId { id, name } => {
                write!(f, "duplicate deck id '{}' (deck '{}')", id, name)
            }
            Self::DetailFetchFailed { deck, error } => {
                write!(f, "detail page for '{}' unavailable: {}", deck, error)
            }
            Self::DetailUnparsed { deck } => {
                write!(f, "no cards found on detail page for '{}'", deck)
            }
            Self::BadDetailLink { deck, link } => {
                write!(f, "cannot resolve link '{}' for '{}'", link, deck)
            }
            Self::UninferredAttributes { card } => {
                write!(f, "no attribute signal for card '{}'", card)
            }
            Self::CacheWriteFailed { message } => {
                write!(f, "snapshot kept in memory only: {}", message)
            }
        }
    }
}

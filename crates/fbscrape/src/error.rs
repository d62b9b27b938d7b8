//! Error taxonomy shared by every layer of the scraper.

use std::fmt;

/// Why an expected page container could not be located.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingCause {
    /// The server answered with a login form: the session cookies expired or are invalid.
    LoginRequired,
    /// The page loaded but its layout no longer matches the extractor.
    LayoutChanged,
}

impl fmt::Display for MissingCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MissingCause::LoginRequired => write!(f, "login requested, cookies expired or invalid"),
            MissingCause::LayoutChanged => write!(f, "layout changed or content inaccessible"),
        }
    }
}

/// Errors that can occur while fetching, extracting and assembling records.
#[derive(thiserror::Error, Debug)]
pub enum ScrapeError {
    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Structure not found on {page} page: {cause}")]
    StructureNotFound {
        page: &'static str,
        cause: MissingCause,
    },

    #[error("Fetch failed for {url}: {reason}")]
    FetchFailed { url: String, reason: String },

    #[error("Malformed id: {0}")]
    MalformedId(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ScrapeError {
    /// Whether the error concerns a single entity and may be absorbed by a batch.
    ///
    /// Malformed input and local IO/JSON errors abort the run.
    pub fn is_entity_scoped(&self) -> bool {
        matches!(
            self,
            ScrapeError::StructureNotFound { .. }
                | ScrapeError::MalformedId(_)
                | ScrapeError::FetchFailed { .. }
        )
    }
}

/// Convenience result type.
pub type ScrapeResult<T> = Result<T, ScrapeError>;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },

    #[error("Invalid response encoding: {0}")]
    InvalidEncoding(String),

    #[error("Not cached and network access is disabled: {0}")]
    OfflineMiss(String),
}

/// Errors surfaced by a suggestion request.
///
/// Everything else (provider outages, malformed model output, rejected
/// candidates, image lookups) degrades inside the orchestrator.
#[derive(Error, Debug)]
pub enum SuggestError {
    #[error("No valid recipe could be generated for this inventory after {attempts} attempts")]
    NoValidRecipe { attempts: u32 },

    #[error("Suggestion request was cancelled")]
    Cancelled,
}

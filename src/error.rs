use thiserror::Error;

/// Everything that can abort a single poll cycle.
///
/// Delivery failures are not here: the notifier logs and swallows them.
#[derive(Debug, Error)]
pub enum PollError {
    #[error("invalid poll window timestamp: {0}")]
    InvalidWindow(i64),

    #[error("request to {endpoint} failed: {source}")]
    Transport {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("endpoint {endpoint} is unavailable, API response code: {status}")]
    UnexpectedStatus {
        endpoint: String,
        status: reqwest::StatusCode,
    },

    #[error("response is not valid JSON: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("API response is not a JSON object")]
    NotAnObject,

    #[error("missing key '{0}'")]
    MissingKey(&'static str),

    #[error("'homeworks' is not a list")]
    NotAList,

    /// The status code has no entry in the verdict table.
    #[error("unknown homework status '{0}'")]
    UnknownStatus(String),
}

impl PollError {
    /// Missing record keys and verdict-table misses are the same class of failure.
    pub fn is_missing_key(&self) -> bool {
        matches!(self, PollError::MissingKey(_) | PollError::UnknownStatus(_))
    }
}

pub type PollResult<T> = std::result::Result<T, PollError>;

use thiserror::Error;

/// Why a remote fetch produced no value. Consumers only ever see the
/// resulting `Cancelled` state; the kind is kept for logs and tests.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("transport failure: {0}")]
    Transport(String),

    #[error("request failed with HTTP {0}")]
    Status(u16),

    #[error("decode failure: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("empty response body")]
    EmptyResponse,
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        FetchError::Transport(e.to_string())
    }
}

/// Why a cache read or write did not happen. `load`/`save` swallow these.
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("no cached entry for {0}")]
    Missing(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed cache entry: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("could not encode cache entry: {0}")]
    Encode(#[source] serde_json::Error),
}

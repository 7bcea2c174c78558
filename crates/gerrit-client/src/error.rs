//! Error type shared by every Gerrit call

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// The configured base URL or a derived endpoint could not be parsed
    #[error("invalid url {0}")]
    Url(String),

    /// Transport-level failure (connect, timeout, body read)
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Gerrit answered with a non-2xx status
    #[error("{method} {url}: status {status}")]
    Status {
        method: &'static str,
        url: String,
        status: u16,
    },

    /// The response did not start with the `)]}'` marker
    #[error("gerrit: prefix )]}}' not found, got {snippet}")]
    MissingXssiPrefix { snippet: String },

    /// The response body was not the JSON we expected
    #[error("gerrit: failed to decode {snippet}: {source}")]
    Decode {
        snippet: String,
        #[source]
        source: serde_json::Error,
    },

    /// A request body could not be serialized
    #[error("failed to encode request body: {0}")]
    Encode(#[source] serde_json::Error),
}

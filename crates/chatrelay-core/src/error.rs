//! Error types for the relay and its clients

use thiserror::Error;

/// Startup configuration error
///
/// Returned by service initialization; the service never becomes ready when
/// one of these occurs.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Neither credential variable is set
    #[error("Missing OPENAI_API_KEY or OPENAI_ACCESS_TOKEN environment variable")]
    MissingCredentials,

    /// A URL-valued variable could not be parsed
    #[error("invalid URL in {var}: {source}")]
    InvalidUrl {
        var: &'static str,
        #[source]
        source: url::ParseError,
    },

    /// SOCKS proxy host/port do not form a usable proxy address
    #[error("invalid SOCKS proxy {0}")]
    InvalidProxy(String),

    /// The HTTP client could not be constructed
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

/// Error raised by a provider client while handling a request
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The request did not complete within the configured timeout
    #[error("ChatGPT timed out waiting for response")]
    Timeout,

    /// The official API answered with a non-success status
    #[error("OpenAI error {status}: {body}")]
    Api { status: u16, body: String },

    /// The conversation backend answered with a non-success status
    #[error("ChatGPT error {status}: {body}")]
    Conversation { status: u16, body: String },

    /// Transport failure (connect, TLS, proxy, body read)
    #[error("{0}")]
    Http(#[from] reqwest::Error),

    /// Response payload was not valid JSON
    #[error("{0}")]
    Json(#[from] serde_json::Error),

    /// Response was well-formed JSON but missing what we need
    #[error("{0}")]
    InvalidResponse(String),

    /// The selected mode cannot serve this request
    #[error("{0}")]
    Unsupported(String),
}

/// Error surfaced by the relay entry points
///
/// Never crosses the module boundary as-is: the relay turns it into a
/// failure envelope carrying its display text.
#[derive(Debug, Error)]
pub enum RelayError {
    /// Rejected before any network call
    #[error("Message is empty")]
    EmptyMessage,

    #[error(transparent)]
    Provider(#[from] ProviderError),
}

pub type ProviderResult<T> = std::result::Result<T, ProviderError>;

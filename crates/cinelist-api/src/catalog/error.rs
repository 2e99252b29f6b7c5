//! Catalog error taxonomy.

use std::error::Error as StdError;
use std::io;

use thiserror::Error;

use super::client::redacted;

/// Classified failure of a single catalog request.
///
/// The `Display` output is the user-facing message for each kind.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    /// The request URL could not be built.
    #[error("Invalid URL")]
    InvalidUrl,

    /// The server answered without a body, or the resource does not exist.
    #[error("No data received from the server")]
    NoData,

    /// The body is well-formed JSON but does not match the expected shape.
    #[error("Failed to process the data")]
    DecodingError,

    /// Any other transport failure (connect refused, DNS, timeout).
    #[error("Connection error: {0}")]
    NetworkError(String),

    /// Upstream 5xx or any unclassified non-2xx status.
    #[error("Server error: {0}")]
    ServerError(u16),

    /// The stored credential was rejected (HTTP 401) or is missing.
    #[error("Invalid API key. Check your configuration.")]
    InvalidCredentials,

    /// The request was throttled (HTTP 429).
    #[error("Request limit exceeded. Try again later.")]
    RateLimited,

    /// The body was truncated or unparseable at the transport level.
    #[error("Failed to process the server response. Try again.")]
    ParseResponseError,

    /// The connection dropped while the response was in transit.
    #[error("The network connection was lost. Try again.")]
    ConnectionLost,
}

impl CatalogError {
    /// Maps a non-success HTTP status to its error kind.
    #[must_use]
    pub const fn from_status(code: u16) -> Self {
        match code {
            401 => Self::InvalidCredentials,
            404 => Self::NoData,
            429 => Self::RateLimited,
            _ => Self::ServerError(code),
        }
    }

    /// Classifies a `serde_json` failure on a 2xx body.
    ///
    /// Syntax errors and premature EOF mean the payload itself is broken;
    /// data errors mean valid JSON of the wrong shape.
    #[must_use]
    pub fn from_json(err: &serde_json::Error) -> Self {
        match err.classify() {
            serde_json::error::Category::Data => Self::DecodingError,
            serde_json::error::Category::Eof
            | serde_json::error::Category::Syntax
            | serde_json::error::Category::Io => Self::ParseResponseError,
        }
    }

    /// Classifies a `reqwest` transport failure.
    ///
    /// The `NetworkError` message never carries the API key.
    #[must_use]
    pub fn from_transport(err: &reqwest::Error) -> Self {
        if is_connection_drop(err) {
            Self::ConnectionLost
        } else if err.is_body() || err.is_decode() {
            Self::ParseResponseError
        } else if err.is_builder() {
            Self::InvalidUrl
        } else {
            Self::NetworkError(transport_message(err))
        }
    }
}

/// `Display` of a transport error with the credential masked in its URL.
fn transport_message(err: &reqwest::Error) -> String {
    let message = err.to_string();
    match err.url() {
        Some(url) => message.replace(url.as_str(), redacted(url).as_str()),
        None => message,
    }
}

/// Returns `true` if the source chain shows the connection went away after
/// it was established: an I/O reset/EOF, or hyper giving up on a message
/// the peer never finished (stale keep-alive, close mid-response).
pub(crate) fn is_connection_drop(err: &(dyn StdError + 'static)) -> bool {
    let mut current: Option<&(dyn StdError + 'static)> = Some(err);
    while let Some(e) = current {
        if let Some(hyper_err) = e.downcast_ref::<hyper::Error>()
            && hyper_err.is_incomplete_message()
        {
            return true;
        }
        if let Some(io_err) = e.downcast_ref::<io::Error>()
            && matches!(
                io_err.kind(),
                io::ErrorKind::ConnectionReset
                    | io::ErrorKind::ConnectionAborted
                    | io::ErrorKind::BrokenPipe
                    | io::ErrorKind::UnexpectedEof
            )
        {
            return true;
        }
        current = e.source();
    }
    false
}

/// Returned when a string names no known [`Category`](super::Category).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown category: {0}")]
pub struct ParseCategoryError(pub String);

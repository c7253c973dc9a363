//! Error types for the fetch module.
//!
//! A [`FetchError`] never escapes [`SourceFetcher::fetch`](super::SourceFetcher::fetch);
//! it is stored on the returned [`Resource`](super::Resource) so callers can
//! report why a location failed.

use std::path::PathBuf;

use thiserror::Error;

/// Why a location could not be retrieved or parsed.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network-level error (DNS resolution, connection refused, TLS errors, etc.)
    #[error("network error fetching {url}: {source}")]
    Network {
        /// The URL that failed.
        url: String,
        /// The underlying network error.
        #[source]
        source: reqwest::Error,
    },

    /// Request timed out before completion.
    #[error("timeout fetching {url}")]
    Timeout {
        /// The URL that timed out.
        url: String,
    },

    /// Any status other than 200.
    #[error("HTTP {status} fetching {url}")]
    HttpStatus {
        /// The URL that returned the status.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// A local file could not be read.
    #[error("IO error reading {path}: {source}")]
    Io {
        /// The file path.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The body is not valid text in its declared charset.
    #[error("{location} is not valid {charset}")]
    Decode {
        /// The location whose body failed to decode.
        location: String,
        /// Charset the body was decoded with.
        charset: &'static str,
    },

    /// The body could not be parsed as its declared format.
    #[error("could not parse {location} as {format}: {reason}")]
    Parse {
        /// The location that failed to parse.
        location: String,
        /// The format that was attempted.
        format: String,
        /// Parser error message.
        reason: String,
    },

    /// The location is neither a URL nor a usable path.
    #[error("invalid location: {location}")]
    InvalidLocation {
        /// The rejected location.
        location: String,
    },
}

impl FetchError {
    /// Creates a network error from a reqwest error, promoting timeouts.
    pub fn network(url: impl Into<String>, source: reqwest::Error) -> Self {
        let url = url.into();
        if source.is_timeout() {
            return Self::Timeout { url };
        }
        Self::Network { url, source }
    }

    /// Creates an HTTP status error.
    pub fn http_status(url: impl Into<String>, status: u16) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status,
        }
    }

    /// Creates an IO error for a local path.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Creates a parse error.
    pub fn parse(
        location: impl Into<String>,
        format: impl Into<String>,
        reason: impl ToString,
    ) -> Self {
        Self::Parse {
            location: location.into(),
            format: format.into(),
            reason: reason.to_string(),
        }
    }

    /// Whether the resource was retrieved but could not be understood.
    #[must_use]
    pub fn is_parse_failure(&self) -> bool {
        matches!(self, Self::Parse { .. } | Self::Decode { .. })
    }
}

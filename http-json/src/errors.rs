use std::time::Duration;
use thiserror::Error;

/// Result type alias for collector operations
pub type Result<T, E = CollectorError> = std::result::Result<T, E>;

/// The request never produced a complete response.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("request to {url} timed out after {timeout:?}")]
    Timeout { url: String, timeout: Duration },

    #[error("could not connect to {url}: {source}")]
    Connect {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

/// Errors produced by a single HTTP exchange.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("failed to read response body from {url}: {source}")]
    Io {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

/// The response body is not a JSON object.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("invalid JSON at line {line}, column {column}: {message}")]
    Syntax {
        line: usize,
        column: usize,
        message: String,
    },

    #[error("expected a JSON object at the top level, found {0}")]
    NotAnObject(&'static str),
}

impl From<serde_json::Error> for DecodeError {
    fn from(e: serde_json::Error) -> Self {
        let (line, column) = (e.line(), e.column());
        let full = e.to_string();
        // serde_json appends the position, which Display already shows
        let message = full
            .strip_suffix(&format!(" at line {line} column {column}"))
            .unwrap_or(&full)
            .to_string();

        DecodeError::Syntax {
            line,
            column,
            message,
        }
    }
}

/// Errors surfaced to the host for a failed poll cycle.
#[derive(Error, Debug)]
pub enum CollectorError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("could not decode response: {0}")]
    Decode(#[from] DecodeError),
}

impl CollectorError {
    /// Short label used in logs and metric tags.
    pub fn kind(&self) -> &'static str {
        match self {
            CollectorError::Fetch(FetchError::Transport(_)) => "transport",
            CollectorError::Fetch(FetchError::Io { .. }) => "io",
            CollectorError::Decode(_) => "decode",
        }
    }

    /// Whether polling the same endpoint again can produce a different result.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, CollectorError::Decode(_))
    }
}

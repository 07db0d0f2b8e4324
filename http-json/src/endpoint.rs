use thiserror::Error;
use url::Url;

/// Scheme used when a configured host has none.
pub const DEFAULT_SCHEME: &str = "http";

/// Path used when neither the host nor the config carries one.
pub const DEFAULT_PATH: &str = "";

#[derive(Error, Debug, PartialEq, Eq)]
pub enum EndpointError {
    #[error("empty host")]
    EmptyHost,

    #[error("invalid endpoint {host:?}: {source}")]
    InvalidUrl {
        host: String,
        #[source]
        source: url::ParseError,
    },

    #[error("endpoint {0:?} has no host")]
    MissingHost(String),
}

/// Resolves a configured host entry into the URL to poll.
///
/// `host` may be `localhost:8080`, `https://api.example.com` or a full URL with
/// path and query. A path on the host wins over the configured `path`.
pub fn resolve_endpoint(host: &str, path: Option<&str>) -> Result<Url, EndpointError> {
    let host = host.trim();
    if host.is_empty() {
        return Err(EndpointError::EmptyHost);
    }

    let raw = if host.contains("://") {
        host.to_string()
    } else {
        format!("{DEFAULT_SCHEME}://{host}")
    };

    let mut url = Url::parse(&raw).map_err(|source| EndpointError::InvalidUrl {
        host: host.to_string(),
        source,
    })?;

    if url.host_str().is_none_or(str::is_empty) {
        return Err(EndpointError::MissingHost(host.to_string()));
    }

    if matches!(url.path(), "" | "/") {
        let path = path.map(str::trim).unwrap_or(DEFAULT_PATH);
        if !path.is_empty() {
            if path.starts_with('/') {
                url.set_path(path);
            } else {
                url.set_path(&format!("/{path}"));
            }
        }
    }

    Ok(url)
}

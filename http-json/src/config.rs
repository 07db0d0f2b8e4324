use http::Method;
use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    #[error("namespace is required")]
    MissingNamespace,

    #[error("invalid HTTP method: {0:?}")]
    InvalidMethod(String),
}

/// How request and response metadata share the `_module` key.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MetadataMode {
    /// Request and response metadata are nested side by side.
    #[default]
    Combined,
    /// Response metadata replaces request metadata when both are enabled.
    LastWriteWins,
}

/// On/off switch written as `request: {enabled: true}` in config files.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
pub struct Toggle {
    #[serde(default)]
    pub enabled: bool,
}

impl Toggle {
    pub const ON: Toggle = Toggle { enabled: true };
}

/// Collector configuration as written by the user. Nothing is validated until
/// [`JsonConfig::validate`] is called.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct JsonConfig {
    /// Value stamped on every event under `_namespace`
    pub namespace: Option<String>,
    /// HTTP method, `GET` when empty
    #[serde(default)]
    pub method: String,
    /// Request body sent verbatim
    #[serde(default)]
    pub body: String,
    /// Attach request metadata to events
    #[serde(default)]
    pub request: Toggle,
    /// Attach response metadata to events
    #[serde(default)]
    pub response: Toggle,
    #[serde(default)]
    pub metadata_mode: MetadataMode,
}

impl JsonConfig {
    /// Validates the configuration and fills in defaults.
    pub fn validate(self) -> Result<FetchConfig, ValidationError> {
        let namespace = match self.namespace {
            Some(ns) if !ns.trim().is_empty() => ns,
            _ => return Err(ValidationError::MissingNamespace),
        };

        let method = parse_method(&self.method)?;

        Ok(FetchConfig {
            method,
            body: self.body,
            request_metadata: self.request.enabled,
            response_metadata: self.response.enabled,
            namespace,
            metadata_mode: self.metadata_mode,
        })
    }
}

fn parse_method(raw: &str) -> Result<Method, ValidationError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(Method::GET);
    }

    Method::from_bytes(raw.to_ascii_uppercase().as_bytes())
        .map_err(|_| ValidationError::InvalidMethod(raw.to_string()))
}

/// Validated, immutable fetch configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FetchConfig {
    method: Method,
    body: String,
    request_metadata: bool,
    response_metadata: bool,
    namespace: String,
    metadata_mode: MetadataMode,
}

impl FetchConfig {
    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn request_metadata_enabled(&self) -> bool {
        self.request_metadata
    }

    pub fn response_metadata_enabled(&self) -> bool {
        self.response_metadata
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn metadata_mode(&self) -> MetadataMode {
        self.metadata_mode
    }
}

impl TryFrom<JsonConfig> for FetchConfig {
    type Error = ValidationError;

    fn try_from(config: JsonConfig) -> Result<Self, Self::Error> {
        config.validate()
    }
}

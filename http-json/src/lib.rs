//! Polls HTTP endpoints that answer with a JSON object and turns every
//! response into an event.
//!
//! A poll cycle is [`Fetcher::execute`] followed by [`EventBuilder::build`];
//! [`JsonCollector`] ties the two to one endpoint. Scheduling, output and
//! retries belong to the host.
//!
//! ```no_run
//! # async fn poll() -> Result<(), Box<dyn std::error::Error>> {
//! use http_json::{JsonCollector, JsonConfig, resolve_endpoint};
//! use std::time::Duration;
//!
//! let config = JsonConfig {
//!     namespace: Some("app_stats".to_string()),
//!     ..Default::default()
//! }
//! .validate()?;
//!
//! let url = resolve_endpoint("localhost:8080", Some("/stats"))?;
//! let collector = JsonCollector::new(url, config, Duration::from_secs(5));
//! let event = collector.fetch().await?;
//! println!("{}", serde_json::Value::Object(event));
//! # Ok(())
//! # }
//! ```

pub mod collector;
pub mod config;
pub mod endpoint;
pub mod errors;
pub mod event;
pub mod fetcher;
pub mod headers;
pub mod metrics_defs;

#[cfg(test)]
mod testutils;

pub use collector::JsonCollector;
pub use config::{FetchConfig, JsonConfig, MetadataMode, Toggle, ValidationError};
pub use endpoint::{EndpointError, resolve_endpoint};
pub use errors::{CollectorError, DecodeError, FetchError, TransportError};
pub use event::{Event, EventBuilder, MODULE_KEY, NAMESPACE_KEY};
pub use fetcher::{Fetcher, RawResponse};
pub use headers::Headers;

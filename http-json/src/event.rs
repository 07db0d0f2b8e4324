//! Turns a raw HTTP response into an event.
//!
//! An event is the decoded JSON object from the response body with up to two
//! reserved keys added on top:
//!
//! - [`MODULE_KEY`] holds the request and/or response metadata, when enabled.
//! - [`NAMESPACE_KEY`] holds the configured namespace.
//!
//! Both keys are written last and replace whatever the body had under the
//! same name. The body's value for that key is lost; it is only reported in
//! the debug log.

use crate::config::{FetchConfig, MetadataMode};
use crate::errors::DecodeError;
use crate::fetcher::RawResponse;
use serde_json::{Map, Value, json};

/// Key under which request/response metadata is stored.
pub const MODULE_KEY: &str = "_module";

/// Key under which the configured namespace is stored.
pub const NAMESPACE_KEY: &str = "_namespace";

/// A decoded JSON object plus the reserved keys.
pub type Event = Map<String, Value>;

/// Builds events for one collector.
#[derive(Clone, Debug)]
pub struct EventBuilder {
    config: FetchConfig,
}

impl EventBuilder {
    pub fn new(config: FetchConfig) -> Self {
        EventBuilder { config }
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    pub fn build(&self, raw: RawResponse) -> Result<Event, DecodeError> {
        let mut event = decode_object(&raw.body)?;

        if let Some(module) = self.module_metadata(&raw) {
            replace_reserved(&mut event, MODULE_KEY, Value::Object(module));
        }

        replace_reserved(
            &mut event,
            NAMESPACE_KEY,
            Value::String(self.config.namespace().to_string()),
        );

        Ok(event)
    }

    fn module_metadata(&self, raw: &RawResponse) -> Option<Map<String, Value>> {
        let mut module = Map::new();

        if self.config.request_metadata_enabled() {
            module.insert(
                "request".to_string(),
                json!({
                    "headers": raw.request_headers.to_json(),
                    "method": raw.request_method.as_str(),
                    // As configured, the server never echoes it back
                    "body": self.config.body(),
                }),
            );
        }

        if self.config.response_metadata_enabled() {
            if self.config.metadata_mode() == MetadataMode::LastWriteWins {
                module.clear();
            }
            module.insert(
                "response".to_string(),
                json!({
                    "status_code": raw.status_code.as_u16(),
                    "headers": raw.headers.to_json(),
                }),
            );
        }

        (!module.is_empty()).then_some(module)
    }
}

/// Decodes `bytes` as JSON and requires the top-level value to be an object.
pub fn decode_object(bytes: &[u8]) -> Result<Event, DecodeError> {
    match serde_json::from_slice::<Value>(bytes)? {
        Value::Object(map) => Ok(map),
        other => Err(DecodeError::NotAnObject(json_type_name(&other))),
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn replace_reserved(event: &mut Event, key: &str, value: Value) {
    if let Some(previous) = event.insert(key.to_string(), value) {
        tracing::debug!(key, previous = %previous, "Reserved key overwritten in event");
    }
}

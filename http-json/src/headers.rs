// Header multi-maps as seen by the event builder.
//
// Names are kept in canonical MIME form ("content-type" -> "Content-Type") so
// events carry the same header keys regardless of how the transport spells
// them. Values keep their arrival order.

use http::header::HeaderMap;
use indexmap::IndexMap;
use serde_json::{Map, Value};

/// Separator placed between the values of a multi-valued header.
pub const VALUE_SEPARATOR: &str = " ,";

/// Ordered, multi-valued mapping from header name to header values.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Headers(IndexMap<String, Vec<String>>);

impl Headers {
    pub fn new() -> Self {
        Headers(IndexMap::new())
    }

    /// Appends a value for `name`, creating the entry if needed.
    pub fn append(&mut self, name: &str, value: impl Into<String>) {
        self.0
            .entry(canonical_header_key(name))
            .or_default()
            .push(value.into());
    }

    /// Registers `name` with no values. Flattens to an empty string.
    pub fn insert_empty(&mut self, name: &str) {
        self.0.entry(canonical_header_key(name)).or_default();
    }

    pub fn get(&self, name: &str) -> Option<&[String]> {
        self.0
            .get(&canonical_header_key(name))
            .map(|values| values.as_slice())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Collapses every header into a single string value.
    ///
    /// Values are joined with `" ,"` and any trailing spaces or commas are
    /// trimmed from the result. Output order follows insertion order.
    pub fn flatten(&self) -> IndexMap<String, String> {
        self.0
            .iter()
            .map(|(name, values)| (name.clone(), flatten_values(values)))
            .collect()
    }

    /// Flattened headers as a JSON object, ready to be placed in an event.
    pub fn to_json(&self) -> Value {
        let map: Map<String, Value> = self
            .flatten()
            .into_iter()
            .map(|(name, value)| (name, Value::String(value)))
            .collect();
        Value::Object(map)
    }
}

impl From<&HeaderMap> for Headers {
    fn from(map: &HeaderMap) -> Self {
        let mut headers = Headers::new();
        for name in map.keys() {
            for value in map.get_all(name) {
                headers.append(
                    name.as_str(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                );
            }
        }
        headers
    }
}

impl<const N: usize> From<[(&str, &[&str]); N]> for Headers {
    fn from(entries: [(&str, &[&str]); N]) -> Self {
        let mut headers = Headers::new();
        for (name, values) in entries {
            headers.insert_empty(name);
            for value in values {
                headers.append(name, *value);
            }
        }
        headers
    }
}

fn flatten_values(values: &[String]) -> String {
    values
        .join(VALUE_SEPARATOR)
        .trim_end_matches([' ', ','])
        .to_string()
}

/// Canonical MIME form of a header name: the first letter and every letter
/// following a hyphen are upper-cased, the rest lower-cased.
///
/// Names containing bytes that are not valid in a header token are returned
/// unchanged.
pub fn canonical_header_key(name: &str) -> String {
    if !name.bytes().all(is_token_byte) {
        return name.to_string();
    }

    let mut upper = true;
    name.chars()
        .map(|c| {
            let mapped = if upper {
                c.to_ascii_uppercase()
            } else {
                c.to_ascii_lowercase()
            };
            upper = c == '-';
            mapped
        })
        .collect()
}

fn is_token_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&b)
}

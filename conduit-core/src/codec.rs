//! URL-safe value codecs
//!
//! Every input kind persists its value as a flat string that can be embedded
//! in a single query-string field without further escaping. An absent value
//! is always the empty string, and decoding the empty string always yields an
//! absent value.
//!
//! Adding a kind means adding an [`InputKind`] implementation here plus one
//! variant in [`FormInput`](crate::domain::input::FormInput).

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Debug;

use crate::domain::input::InputType;

/// Everything except RFC 3986 unreserved characters is escaped
const URL_SAFE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Percent-escape a raw string
pub fn url_encode(raw: &str) -> String {
    utf8_percent_encode(raw, URL_SAFE).to_string()
}

/// Reverse [`url_encode`]
///
/// Fails when the escaped bytes are not valid UTF-8.
pub fn url_decode(encoded: &str) -> std::result::Result<String, std::str::Utf8Error> {
    percent_decode_str(encoded)
        .decode_utf8()
        .map(|decoded| decoded.into_owned())
}

/// Value kind of an input, carrying its codec and kind-specific constraints.
///
/// `decode(&encode(v))` must equal `Some(v)` for every legal non-empty `v`.
pub trait InputKind: Clone + Debug + PartialEq + Serialize + DeserializeOwned {
    type Value: Clone + Debug + PartialEq + Serialize + DeserializeOwned;

    /// Discriminator persisted in the `input.input_type` column
    const TYPE: InputType;

    /// Encode a present value. Empty values encode to `""`.
    fn encode(&self, value: &Self::Value) -> String;

    /// Decode an encoded string. `""` decodes to `None`.
    ///
    /// # Errors
    /// Returns the decoder message when the string is not a legal encoding for
    /// this kind.
    fn decode(&self, encoded: &str) -> std::result::Result<Option<Self::Value>, String>;

    /// Whether values of this input must be masked when displayed
    fn sensitive(&self) -> bool {
        false
    }

    /// Maximum accepted value length, in characters
    fn max_length(&self) -> Option<u16> {
        None
    }
}

// =============================================================================
// String
// =============================================================================

/// Scalar string kind
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StringKind {
    pub sensitive: bool,
    pub max_length: Option<u16>,
}

impl StringKind {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the value as sensitive (passwords, tokens)
    pub fn masked(mut self) -> Self {
        self.sensitive = true;
        self
    }

    pub fn with_max_length(mut self, max_length: u16) -> Self {
        self.max_length = Some(max_length);
        self
    }
}

impl InputKind for StringKind {
    type Value = String;

    const TYPE: InputType = InputType::String;

    fn encode(&self, value: &String) -> String {
        url_encode(value)
    }

    fn decode(&self, encoded: &str) -> std::result::Result<Option<String>, String> {
        if encoded.is_empty() {
            return Ok(None);
        }
        url_decode(encoded)
            .map(Some)
            .map_err(|e| format!("invalid escaped UTF-8: {}", e))
    }

    fn sensitive(&self) -> bool {
        self.sensitive
    }

    fn max_length(&self) -> Option<u16> {
        self.max_length
    }
}

// =============================================================================
// Map
// =============================================================================

/// Value of a map input. A key may carry no value.
pub type MapValue = BTreeMap<String, Option<String>>;

/// String-to-string mapping kind
///
/// Encoded as `&`-joined `key=value` pairs in lexicographic key order, with
/// keys and values escaped independently. A key without a value is written
/// without the `=`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapKind;

impl InputKind for MapKind {
    type Value = MapValue;

    const TYPE: InputType = InputType::Map;

    fn encode(&self, value: &MapValue) -> String {
        value
            .iter()
            .map(|(key, value)| match value {
                Some(value) => format!("{}={}", url_encode(key), url_encode(value)),
                None => url_encode(key),
            })
            .collect::<Vec<_>>()
            .join("&")
    }

    /// Malformed segments are skipped; the rest of the string still decodes.
    fn decode(&self, encoded: &str) -> std::result::Result<Option<MapValue>, String> {
        if encoded.trim().is_empty() {
            return Ok(None);
        }

        let mut map = MapValue::new();
        for segment in encoded.split('&').filter(|s| !s.is_empty()) {
            let (raw_key, raw_value) = match segment.split_once('=') {
                Some((key, value)) => (key, Some(value)),
                None => (segment, None),
            };

            let key = match url_decode(raw_key) {
                Ok(key) => key,
                Err(e) => {
                    tracing::warn!(segment, "Skipping map entry with undecodable key: {}", e);
                    continue;
                }
            };

            let value = match raw_value.map(url_decode).transpose() {
                Ok(value) => value,
                Err(e) => {
                    tracing::warn!(key = %key, "Skipping map entry with undecodable value: {}", e);
                    continue;
                }
            };

            map.insert(key, value);
        }

        Ok(if map.is_empty() { None } else { Some(map) })
    }
}

// =============================================================================
// Integer
// =============================================================================

/// Signed 64-bit integer kind, encoded in decimal
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntegerKind;

impl InputKind for IntegerKind {
    type Value = i64;

    const TYPE: InputType = InputType::Integer;

    fn encode(&self, value: &i64) -> String {
        value.to_string()
    }

    fn decode(&self, encoded: &str) -> std::result::Result<Option<i64>, String> {
        if encoded.is_empty() {
            return Ok(None);
        }
        encoded
            .parse::<i64>()
            .map(Some)
            .map_err(|e| format!("'{}' is not an integer: {}", encoded, e))
    }
}

// =============================================================================
// Boolean
// =============================================================================

/// Boolean kind, encoded as `true` / `false`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BooleanKind;

impl InputKind for BooleanKind {
    type Value = bool;

    const TYPE: InputType = InputType::Boolean;

    fn encode(&self, value: &bool) -> String {
        value.to_string()
    }

    fn decode(&self, encoded: &str) -> std::result::Result<Option<bool>, String> {
        match encoded {
            "" => Ok(None),
            "true" => Ok(Some(true)),
            "false" => Ok(Some(false)),
            other => Err(format!("'{}' is not a boolean", other)),
        }
    }
}

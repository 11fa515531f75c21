//! Wire types exchanged with the edge platform.
//!
//! The platform hands over `{"Records": [{"cf": {"request": {...}}}]}` and
//! expects back either the (possibly edited) request object or a response
//! envelope. Request fields this crate does not interpret are carried in
//! `extra` so a pass-through returns them verbatim.

use crate::error::EdgeError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// One record in a platform header list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderEntry {
    /// Original-case header name, when the platform supplies it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    pub value: String,
}

impl HeaderEntry {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: Some(key.into()),
            value: value.into(),
        }
    }
}

/// Lower-cased header name to its ordered list of records.
pub type HeaderMultimap = BTreeMap<String, Vec<HeaderEntry>>;

/// A viewer or origin request as delivered by the platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterceptedRequest {
    pub method: String,
    pub uri: String,
    #[serde(default)]
    pub querystring: String,
    #[serde(default)]
    pub headers: HeaderMultimap,
    /// Origin descriptor, kept raw so an unrecognised shape survives a pass-through
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub origin: Value,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl InterceptedRequest {
    /// Method comparison is case-insensitive.
    pub fn is_get(&self) -> bool {
        self.method.eq_ignore_ascii_case("GET")
    }

    /// Whether the URI ends with one of `extensions` (case-insensitive).
    pub fn has_extension(&self, extensions: &[String]) -> bool {
        let uri = self.uri.to_ascii_lowercase();
        extensions
            .iter()
            .any(|ext| uri.ends_with(&ext.to_ascii_lowercase()))
    }
}

/// How the response body is encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BodyEncoding {
    Base64,
    Text,
}

/// A generated response, in the platform's envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeResponse {
    pub body_encoding: BodyEncoding,
    pub body: String,
    #[serde(with = "numeric_string")]
    pub status: u16,
    pub status_description: String,
    #[serde(default)]
    pub headers: HeaderMultimap,
}

/// What a handled event produces.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum HandlerOutput {
    /// Let the platform continue with this request
    Request(InterceptedRequest),
    /// Answer the viewer directly
    Response(EdgeResponse),
}

impl HandlerOutput {
    pub fn as_request(&self) -> Option<&InterceptedRequest> {
        match self {
            Self::Request(request) => Some(request),
            Self::Response(_) => None,
        }
    }

    pub fn as_response(&self) -> Option<&EdgeResponse> {
        match self {
            Self::Response(response) => Some(response),
            Self::Request(_) => None,
        }
    }
}

/// Pull the request out of the first record of a platform event.
pub fn extract_request(event: &Value) -> Result<InterceptedRequest, EdgeError> {
    let records = event
        .get("Records")
        .and_then(Value::as_array)
        .ok_or_else(|| EdgeError::MalformedEvent("missing Records array".to_string()))?;

    let record = records
        .first()
        .ok_or_else(|| EdgeError::MalformedEvent("Records is empty".to_string()))?;

    let request = record
        .pointer("/cf/request")
        .filter(|value| !value.is_null())
        .ok_or_else(|| EdgeError::MalformedEvent("first record has no cf.request".to_string()))?;

    InterceptedRequest::deserialize(request).map_err(|e| EdgeError::MalformedEvent(e.to_string()))
}

/// Numbers the platform sends as strings: written as strings, read as either.
pub(crate) mod numeric_string {
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &u16, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u16, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Int(u16),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Int(n) => Ok(n),
            Raw::Text(s) => s.trim().parse().map_err(D::Error::custom),
        }
    }
}

//! Canonical message construction.
//!
//! The signed message is
//!
//! ```text
//! METHOD \n TIMESTAMP \n lowercased-decoded-path \n key=value&key=value
//! ```
//!
//! Parameters come from the query string, a form body, or a JSON body decoded
//! through a declared [`SignableBody`] schema. They are sorted by key so two
//! requests carrying the same parameters in a different order sign the same
//! message. Values are URL-encoded; keys are not.

use percent_encoding::percent_decode_str;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use url::form_urlencoded;

/// Form-style URL encoding of a parameter value (space becomes `+`).
pub fn url_encode(value: &str) -> String {
    form_urlencoded::byte_serialize(value.as_bytes()).collect()
}

/// Decode `a=1&b=x+y` pairs, as found in a query string or form body.
pub fn parse_pairs(raw: &str) -> Vec<(String, String)> {
    form_urlencoded::parse(raw.as_bytes())
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect()
}

/// Lowercase the raw request path, then URL-decode it.
pub fn canonical_path(path: &str) -> String {
    let lowered = path.to_lowercase().replace('+', " ");
    percent_decode_str(&lowered).decode_utf8_lossy().into_owned()
}

/// One `key=value` pair of the parameter message. The value is stored URL-encoded.
///
/// Several entries may share a key; entries are sorted, never deduplicated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterEntry {
    pub key: String,
    pub value: String,
}

impl ParameterEntry {
    /// Build an entry from a decoded value
    pub fn new(key: impl Into<String>, raw_value: &str) -> Self {
        Self {
            key: key.into(),
            value: url_encode(raw_value),
        }
    }
}

/// Parameters of one request, split by where they arrived.
#[derive(Debug, Clone, Default)]
pub struct RequestParameters {
    /// Decoded query-string pairs
    pub query: Vec<(String, String)>,
    /// Decoded `application/x-www-form-urlencoded` body pairs
    pub form: Vec<(String, String)>,
    /// Fields of a JSON body, produced by the endpoint's declared schema
    pub body: Vec<ParameterEntry>,
}

/// The parts of an inbound request the gate looks at.
#[derive(Debug, Clone, Default)]
pub struct IncomingRequest {
    pub method: String,
    /// Raw `Timestamp` header, `None` if absent or not a single value
    pub timestamp: Option<String>,
    /// Raw `Authentication` header, `None` if absent or not a single value
    pub authentication: Option<String>,
    /// Request path without the query string, as received
    pub path: String,
    pub parameters: RequestParameters,
}

/// The exact string a client signs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalMessage(String);

impl CanonicalMessage {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for CanonicalMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<[u8]> for CanonicalMessage {
    fn as_ref(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

/// A request body whose signed form is declared by its type.
///
/// The default [`signable_fields`](Self::signable_fields) serializes the value
/// and takes every top-level field that is not null and not listed in
/// [`IDENTITY_FIELDS`](Self::IDENTITY_FIELDS). Strings are used verbatim,
/// other values as their JSON text.
pub trait SignableBody: Serialize {
    /// Serialized field names excluded from signing
    const IDENTITY_FIELDS: &'static [&'static str] = &[];

    fn signable_fields(&self) -> Vec<ParameterEntry> {
        match serde_json::to_value(self) {
            Ok(Value::Object(fields)) => fields
                .into_iter()
                .filter(|(name, value)| {
                    !value.is_null() && !Self::IDENTITY_FIELDS.contains(&name.as_str())
                })
                .map(|(name, value)| {
                    let text = match value {
                        Value::String(s) => s,
                        other => other.to_string(),
                    };
                    ParameterEntry::new(name, &text)
                })
                .collect(),
            Ok(_) | Err(_) => Vec::new(),
        }
    }
}

/// Builds the canonical message of a request.
#[derive(Debug, Default, Clone, Copy)]
pub struct CanonicalMessageBuilder;

impl CanonicalMessageBuilder {
    pub fn new() -> Self {
        Self
    }

    pub fn build(&self, request: &IncomingRequest) -> CanonicalMessage {
        self.compose(
            &request.method,
            request.timestamp.as_deref().unwrap_or_default(),
            &request.path,
            &request.parameters,
        )
    }

    /// Same as [`build`](Self::build), from individual parts.
    pub fn compose(
        &self,
        method: &str,
        timestamp: &str,
        path: &str,
        parameters: &RequestParameters,
    ) -> CanonicalMessage {
        let path = canonical_path(path);
        let parameter_message = Self::parameter_message(&Self::collect_entries(parameters));
        CanonicalMessage(
            [method, timestamp, path.as_str(), parameter_message.as_str()].join("\n"),
        )
    }

    /// Gather and sort the entries that take part in signing.
    ///
    /// Query entries are always included. Body fields are used only when there
    /// is neither a query nor a form entry; otherwise form entries are appended.
    pub fn collect_entries(parameters: &RequestParameters) -> Vec<ParameterEntry> {
        let mut entries: Vec<ParameterEntry> = parameters
            .query
            .iter()
            .map(|(key, value)| ParameterEntry::new(key.as_str(), value))
            .collect();

        if entries.is_empty() && parameters.form.is_empty() {
            entries.extend(parameters.body.iter().cloned());
        } else {
            entries.extend(
                parameters
                    .form
                    .iter()
                    .map(|(key, value)| ParameterEntry::new(key.as_str(), value)),
            );
        }

        // stable: equal keys keep their arrival order
        entries.sort_by(|a, b| a.key.cmp(&b.key));
        entries
    }

    pub fn parameter_message(entries: &[ParameterEntry]) -> String {
        entries
            .iter()
            .map(|entry| format!("{}={}", entry.key, entry.value))
            .collect::<Vec<_>>()
            .join("&")
    }
}

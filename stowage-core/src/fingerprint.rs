//! Deterministic cache keys for requests.
//!
//! A fingerprint is the hex-encoded SHA-256 digest (truncated to 128 bits) of
//! a canonical JSON projection of the request. Object keys are sorted at
//! every depth before hashing, so the result depends neither on insertion
//! order nor on the process that computed it.

use std::fmt;

use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use smol_str::SmolStr;

use crate::request::CacheableRequest;

/// Fields projected into the fingerprint by default.
pub const DEFAULT_INCLUDED_FIELDS: [&str; 4] = ["uri", "qs", "method", "authenticatedUser"];

/// Headers never projected into the fingerprint by default.
pub const DEFAULT_EXCLUDED_HEADERS: [&str; 2] = ["cookie", "authorization"];

/// Digest bytes kept from the SHA-256 output.
const DIGEST_LEN: usize = 16;

/// Hex-encoded request fingerprint.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Fingerprint {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<String> for Fingerprint {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Computes [`Fingerprint`]s from [`CacheableRequest`]s.
///
/// The include-list names top-level fields of the request. Besides the
/// built-in fields (`uri`, `qs`, `method`, `authenticatedUser`) any name
/// attached with [`CacheableRequest::with_property`] may be listed. Fields
/// that are absent on a request are left out of the projection.
///
/// Header names on the exclude-list are matched case-insensitively.
///
/// # Examples
///
/// ```
/// use http::{HeaderValue, Method, header::COOKIE};
/// use stowage_core::{CacheableRequest, Fingerprinter};
///
/// let fingerprinter = Fingerprinter::default();
/// let plain = CacheableRequest::new(Method::GET, "/users");
/// let with_cookie = plain.clone().with_header(COOKIE, HeaderValue::from_static("sid=1"));
///
/// assert_eq!(fingerprinter.fingerprint(&plain), fingerprinter.fingerprint(&with_cookie));
/// assert_eq!(fingerprinter.fingerprint(&plain).as_str().len(), 32);
/// ```
#[derive(Debug, Clone)]
pub struct Fingerprinter {
    included_fields: Vec<SmolStr>,
    excluded_headers: Vec<SmolStr>,
}

impl Default for Fingerprinter {
    fn default() -> Self {
        Self {
            included_fields: DEFAULT_INCLUDED_FIELDS.into_iter().map(SmolStr::new).collect(),
            excluded_headers: DEFAULT_EXCLUDED_HEADERS.into_iter().map(SmolStr::new).collect(),
        }
    }
}

impl Fingerprinter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a field to the include-list.
    pub fn include_property(mut self, name: impl AsRef<str>) -> Self {
        let name = SmolStr::new(name.as_ref());
        if !self.included_fields.contains(&name) {
            self.included_fields.push(name);
        }
        self
    }

    /// Appends a header name to the exclude-list.
    pub fn exclude_header(mut self, name: impl AsRef<str>) -> Self {
        let name = SmolStr::new(name.as_ref().to_ascii_lowercase());
        if !self.excluded_headers.contains(&name) {
            self.excluded_headers.push(name);
        }
        self
    }

    pub fn included_fields(&self) -> &[SmolStr] {
        &self.included_fields
    }

    pub fn excluded_headers(&self) -> &[SmolStr] {
        &self.excluded_headers
    }

    /// Canonical JSON projection that gets hashed.
    pub fn projection(&self, request: &CacheableRequest) -> Value {
        let mut projection = Map::new();
        for field in &self.included_fields {
            if let Some(value) = field_value(request, field) {
                projection.insert(field.to_string(), value);
            }
        }
        projection.insert("headers".to_owned(), self.header_projection(request));
        canonicalize(Value::Object(projection))
    }

    pub fn fingerprint(&self, request: &CacheableRequest) -> Fingerprint {
        let canonical = self.projection(request).to_string();
        let digest = Sha256::digest(canonical.as_bytes());
        Fingerprint(hex::encode(&digest[..DIGEST_LEN]))
    }

    fn header_projection(&self, request: &CacheableRequest) -> Value {
        let mut headers = Map::new();
        for name in request.headers().keys() {
            if self.excluded_headers.iter().any(|excluded| excluded == name.as_str()) {
                continue;
            }
            let mut values: Vec<Value> = request
                .headers()
                .get_all(name)
                .iter()
                .map(|value| Value::String(String::from_utf8_lossy(value.as_bytes()).into_owned()))
                .collect();
            let value = if values.len() == 1 {
                values.remove(0)
            } else {
                Value::Array(values)
            };
            headers.insert(name.as_str().to_owned(), value);
        }
        Value::Object(headers)
    }
}

fn field_value(request: &CacheableRequest, field: &str) -> Option<Value> {
    match field {
        "uri" => Some(Value::String(request.uri().to_owned())),
        "qs" => Some(Value::Object(
            request
                .qs()
                .iter()
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect(),
        )),
        "method" => Some(Value::String(request.method().as_str().to_owned())),
        "authenticatedUser" => request.authenticated_user().cloned(),
        "headers" => None,
        other => request.property(other).cloned(),
    }
}

/// Rebuilds every object with its keys in sorted order.
fn canonicalize(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|(a, _), (b, _)| a.cmp(b));
            Value::Object(
                entries
                    .into_iter()
                    .map(|(key, value)| (key, canonicalize(value)))
                    .collect(),
            )
        }
        Value::Array(values) => Value::Array(values.into_iter().map(canonicalize).collect()),
        other => other,
    }
}

//! Cache-relevant view of an HTTP request.
//!
//! [`CacheableRequest`] carries exactly what the fingerprint generator and
//! the request validators look at: method, URI, query parameters, the
//! authenticated identity, headers, and the two per-request cache options
//! (`disable_cache` and `force_fresh`).
//!
//! Additional top-level properties can be attached with
//! [`CacheableRequest::with_property`]; they only participate in the
//! fingerprint when their name is on the fingerprinter's include-list.

use std::collections::BTreeMap;
use std::fmt::Write;

use http::request::Parts;
use http::{HeaderMap, HeaderName, HeaderValue, Method};
use serde_json::Value;
use tracing::debug;

/// Request descriptor consumed by fingerprinting and request validators.
///
/// # Examples
///
/// ```
/// use http::{HeaderValue, Method, header::CACHE_CONTROL};
/// use stowage_core::CacheableRequest;
///
/// let request = CacheableRequest::new(Method::GET, "https://api.example.com/users")
///     .with_query("page", "2")
///     .with_header(CACHE_CONTROL, HeaderValue::from_static("max-age=0"));
///
/// assert_eq!(request.method(), &Method::GET);
/// assert_eq!(request.qs()["page"], "2");
/// ```
#[derive(Debug, Clone)]
pub struct CacheableRequest {
    method: Method,
    uri: String,
    qs: BTreeMap<String, Value>,
    authenticated_user: Option<Value>,
    headers: HeaderMap,
    properties: BTreeMap<String, Value>,
    disable_cache: bool,
    force_fresh: bool,
}

impl CacheableRequest {
    /// Creates a request descriptor with no query, headers or identity.
    pub fn new(method: Method, uri: impl Into<String>) -> Self {
        Self {
            method,
            uri: uri.into(),
            qs: BTreeMap::new(),
            authenticated_user: None,
            headers: HeaderMap::new(),
            properties: BTreeMap::new(),
            disable_cache: false,
            force_fresh: false,
        }
    }

    /// Builds a descriptor from request parts.
    ///
    /// The query string is split off the URI and parsed into [`qs`](Self::qs);
    /// repeated keys are collected into a JSON array in order of appearance.
    pub fn from_parts(parts: &Parts) -> Self {
        let mut uri = String::new();
        if let (Some(scheme), Some(authority)) = (parts.uri.scheme_str(), parts.uri.authority()) {
            let _ = write!(uri, "{scheme}://{authority}");
        }
        uri.push_str(parts.uri.path());

        let mut request = Self::new(parts.method.clone(), uri);
        request.headers = parts.headers.clone();
        if let Some(query) = parts.uri.query() {
            request.qs = parse_query(query);
        }
        request
    }

    /// Appends a query parameter. A repeated key turns the value into an array.
    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        push_query_value(&mut self.qs, key.into(), value.into());
        self
    }

    /// Sets the authenticated identity the response is scoped to.
    pub fn with_authenticated_user(mut self, user: impl Into<Value>) -> Self {
        self.authenticated_user = Some(user.into());
        self
    }

    /// Appends a header value.
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    /// Attaches an additional named property.
    ///
    /// Reserved names (`uri`, `qs`, `method`, `authenticatedUser`, `headers`)
    /// are always resolved from the dedicated fields instead.
    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(name.into(), value.into());
        self
    }

    /// Opts this request out of caching entirely.
    pub fn disable_cache(mut self) -> Self {
        self.disable_cache = true;
        self
    }

    /// Bypasses the cache for the lookup while still allowing a store.
    pub fn force_fresh(mut self) -> Self {
        self.force_fresh = true;
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn qs(&self) -> &BTreeMap<String, Value> {
        &self.qs
    }

    pub fn authenticated_user(&self) -> Option<&Value> {
        self.authenticated_user.as_ref()
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// Returns an additional property previously attached by name.
    pub fn property(&self, name: &str) -> Option<&Value> {
        self.properties.get(name)
    }

    pub fn is_cache_disabled(&self) -> bool {
        self.disable_cache
    }

    pub fn is_force_fresh(&self) -> bool {
        self.force_fresh
    }
}

fn parse_query(query: &str) -> BTreeMap<String, Value> {
    let pairs: Vec<(String, String)> = match serde_urlencoded::from_str(query) {
        Ok(pairs) => pairs,
        Err(error) => {
            debug!(%error, query, "Ignoring malformed query string");
            return BTreeMap::new();
        }
    };
    let mut qs = BTreeMap::new();
    for (key, value) in pairs {
        push_query_value(&mut qs, key, Value::String(value));
    }
    qs
}

fn push_query_value(qs: &mut BTreeMap<String, Value>, key: String, value: Value) {
    match qs.remove(&key) {
        None => {
            qs.insert(key, value);
        }
        Some(Value::Array(mut values)) => {
            values.push(value);
            qs.insert(key, Value::Array(values));
        }
        Some(previous) => {
            qs.insert(key, Value::Array(vec![previous, value]));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::Request;
    use serde_json::json;

    #[test]
    fn test_from_parts_splits_query() {
        let (parts, _) = Request::get("https://example.com/search?q=rust&tag=a&tag=b")
            .header("accept", "text/html")
            .body(())
            .unwrap()
            .into_parts();

        let request = CacheableRequest::from_parts(&parts);

        assert_eq!(request.uri(), "https://example.com/search");
        assert_eq!(request.method(), &Method::GET);
        assert_eq!(request.qs()["q"], json!("rust"));
        assert_eq!(request.qs()["tag"], json!(["a", "b"]));
        assert_eq!(request.headers()["accept"], "text/html");
    }

    #[test]
    fn test_from_parts_relative_uri() {
        let (parts, _) = Request::post("/items").body(()).unwrap().into_parts();

        let request = CacheableRequest::from_parts(&parts);

        assert_eq!(request.uri(), "/items");
        assert!(request.qs().is_empty());
    }

    #[test]
    fn test_request_options_default_off() {
        let request = CacheableRequest::new(Method::GET, "/");
        assert!(!request.is_cache_disabled());
        assert!(!request.is_force_fresh());

        let request = request.disable_cache().force_fresh();
        assert!(request.is_cache_disabled());
        assert!(request.is_force_fresh());
    }
}

//! Response descriptor and its stored representation.
//!
//! [`CacheableResponse`] is what the response validators inspect.
//! [`CachedResponse`] is what ends up in the store: response metadata, the
//! headers minus the ones that must never be replayed from cache, and a
//! `fromCache` marker.

use http::header::{DATE, IF_MODIFIED_SINCE, IF_NONE_MATCH, SET_COOKIE, TRANSFER_ENCODING};
use http::response::Parts;
use http::{HeaderMap, HeaderName, HeaderValue, Response, StatusCode, Version};
use serde::{Deserialize, Serialize};

/// Headers dropped before a response is written to the store.
pub const EXCLUDED_RESPONSE_HEADERS: [HeaderName; 5] = [
    SET_COOKIE,
    DATE,
    TRANSFER_ENCODING,
    IF_NONE_MATCH,
    IF_MODIFIED_SINCE,
];

/// Response descriptor consumed by response validators and serialization.
#[derive(Debug, Clone)]
pub struct CacheableResponse {
    status: StatusCode,
    version: Version,
    headers: HeaderMap,
    trailers: HeaderMap,
}

impl CacheableResponse {
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            version: Version::HTTP_11,
            headers: HeaderMap::new(),
            trailers: HeaderMap::new(),
        }
    }

    pub fn from_parts(parts: &Parts) -> Self {
        Self {
            status: parts.status,
            version: parts.version,
            headers: parts.headers.clone(),
            trailers: HeaderMap::new(),
        }
    }

    pub fn with_version(mut self, version: Version) -> Self {
        self.version = version;
        self
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    pub fn with_trailers(mut self, trailers: HeaderMap) -> Self {
        self.trailers = trailers;
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn version(&self) -> Version {
        self.version
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    pub fn trailers(&self) -> &HeaderMap {
        &self.trailers
    }
}

/// Stored form of a response, serialized as camelCase JSON.
///
/// ```json
/// {"statusCode":200,"httpVersion":"1.1","httpVersionMajor":1,
///  "httpVersionMinor":1,"headers":{"etag":"\"abc\""},"fromCache":true}
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedResponse {
    #[serde(with = "http_serde::status_code")]
    status_code: StatusCode,
    http_version: String,
    http_version_major: u8,
    http_version_minor: u8,
    #[serde(
        with = "http_serde::header_map",
        default,
        skip_serializing_if = "HeaderMap::is_empty"
    )]
    trailers: HeaderMap,
    #[serde(with = "http_serde::header_map", default)]
    headers: HeaderMap,
    #[serde(default)]
    from_cache: bool,
}

impl CachedResponse {
    /// Projects `response` onto the stored representation, dropping
    /// [`EXCLUDED_RESPONSE_HEADERS`] and marking it as served from cache.
    pub fn from_response(response: &CacheableResponse) -> Self {
        let mut headers = response.headers.clone();
        for name in &EXCLUDED_RESPONSE_HEADERS {
            headers.remove(name);
        }
        let (major, minor) = version_numbers(response.version);
        Self {
            status_code: response.status,
            http_version: format!("{major}.{minor}"),
            http_version_major: major,
            http_version_minor: minor,
            trailers: response.trailers.clone(),
            headers,
            from_cache: true,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status_code
    }

    pub fn http_version(&self) -> &str {
        &self.http_version
    }

    pub fn version(&self) -> Version {
        version_from_numbers(self.http_version_major, self.http_version_minor)
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn trailers(&self) -> &HeaderMap {
        &self.trailers
    }

    pub fn is_from_cache(&self) -> bool {
        self.from_cache
    }

    /// Rebuilds an HTTP response around `body`.
    pub fn into_response<B>(self, body: B) -> Response<B> {
        let version = self.version();
        let mut response = Response::new(body);
        *response.status_mut() = self.status_code;
        *response.version_mut() = version;
        *response.headers_mut() = self.headers;
        response
    }
}

fn version_numbers(version: Version) -> (u8, u8) {
    if version == Version::HTTP_09 {
        (0, 9)
    } else if version == Version::HTTP_10 {
        (1, 0)
    } else if version == Version::HTTP_2 {
        (2, 0)
    } else if version == Version::HTTP_3 {
        (3, 0)
    } else {
        (1, 1)
    }
}

fn version_from_numbers(major: u8, minor: u8) -> Version {
    match (major, minor) {
        (0, 9) => Version::HTTP_09,
        (1, 0) => Version::HTTP_10,
        (2, _) => Version::HTTP_2,
        (3, _) => Version::HTTP_3,
        _ => Version::HTTP_11,
    }
}

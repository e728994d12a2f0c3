//! Built-in response validators (RFC 2616 sections 13.3, 13.4 and 14.9).
//!
//! Evaluated in the order returned by [`defaults`]. Unlike the request
//! chain there is no terminal default: a response none of them accepts
//! leaves `storable` undecided, which callers treat as not storable.

use http::StatusCode;
use http::header::{ETAG, LAST_MODIFIED};

use crate::cache_control::CacheControl;
use crate::decision::Verdict;
use crate::response::CacheableResponse;

use super::ResponseValidator;

/// Status codes cacheable by default.
pub const CACHEABLE_STATUS_CODES: [StatusCode; 5] = [
    StatusCode::OK,
    StatusCode::NON_AUTHORITATIVE_INFORMATION,
    StatusCode::MULTIPLE_CHOICES,
    StatusCode::MOVED_PERMANENTLY,
    StatusCode::UNAUTHORIZED,
];

/// Built-in response validators in evaluation order.
pub fn defaults() -> Vec<ResponseValidator> {
    vec![
        ResponseValidator::new("only_private", only_private),
        ResponseValidator::new("no_store", no_store),
        ResponseValidator::new("max_age_zero", max_age_zero),
        ResponseValidator::new("max_age_future", max_age_future),
        ResponseValidator::new("last_modified", last_modified),
        ResponseValidator::new("e_tag", e_tag),
        ResponseValidator::new("status_codes", status_codes),
    ]
}

/// `Cache-Control: private` marks the response private; it is only stored
/// when the policy allows private responses.
pub fn only_private(response: &CacheableResponse, verdict: &mut Verdict) -> bool {
    if CacheControl::from_headers(response.headers()).contains("private") {
        verdict.flag_private(true);
        if !verdict.store_private() {
            verdict.flag_storable(false);
            return true;
        }
    }
    false
}

/// Bare `Cache-Control: no-store`, unless the policy stores those anyway.
pub fn no_store(response: &CacheableResponse, verdict: &mut Verdict) -> bool {
    let no_store = CacheControl::from_headers(response.headers())
        .get("no-store")
        .is_some_and(|directive| directive.value().is_none());
    if no_store && !verdict.store_no_store() {
        verdict.flag_storable(false);
        return true;
    }
    false
}

/// `max-age=0` (or negative) responses are already stale.
pub fn max_age_zero(response: &CacheableResponse, verdict: &mut Verdict) -> bool {
    match CacheControl::from_headers(response.headers()).max_age() {
        Some(age) if age <= 0 => {
            verdict.flag_storable(false);
            true
        }
        _ => false,
    }
}

/// A positive `max-age` makes the response storable.
pub fn max_age_future(response: &CacheableResponse, verdict: &mut Verdict) -> bool {
    match CacheControl::from_headers(response.headers()).max_age() {
        Some(age) if age > 0 => {
            verdict.flag_storable(true);
            true
        }
        _ => false,
    }
}

/// Weak validator `Last-Modified` (RFC 2616 section 13.3.1).
pub fn last_modified(response: &CacheableResponse, verdict: &mut Verdict) -> bool {
    if response.headers().contains_key(LAST_MODIFIED) && !verdict.ignore_no_last_mod() {
        verdict.flag_storable(true);
        return true;
    }
    false
}

/// Strong validator `ETag` (RFC 2616 section 13.3.2).
pub fn e_tag(response: &CacheableResponse, verdict: &mut Verdict) -> bool {
    if response.headers().contains_key(ETAG) {
        verdict.flag_storable(true);
        return true;
    }
    false
}

/// See [`CACHEABLE_STATUS_CODES`].
pub fn status_codes(response: &CacheableResponse, verdict: &mut Verdict) -> bool {
    if CACHEABLE_STATUS_CODES.contains(&response.status()) {
        verdict.flag_storable(true);
        return true;
    }
    false
}

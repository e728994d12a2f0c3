//! Built-in request validators (RFC 2616 sections 13 and 14.9).
//!
//! Evaluated in the order returned by [`defaults`], after any host or
//! per-call validators. [`method_get_or_head`] always decides, so the
//! built-in chain never leaves `retrievable` undecided.

use http::Method;

use crate::cache_control::{CacheControl, pragma_no_cache};
use crate::decision::Verdict;
use crate::request::CacheableRequest;

use super::RequestValidator;

/// Built-in request validators in evaluation order.
pub fn defaults() -> Vec<RequestValidator> {
    vec![
        RequestValidator::new("disable_cache", disable_cache),
        RequestValidator::new("force_fresh", force_fresh),
        RequestValidator::new("max_age_zero", max_age_zero),
        RequestValidator::new("no_cache", no_cache),
        RequestValidator::new("no_store", no_store),
        RequestValidator::new("method_get_or_head", method_get_or_head),
    ]
}

/// Explicit opt-out: neither read from nor write to the cache.
pub fn disable_cache(request: &CacheableRequest, verdict: &mut Verdict) -> bool {
    if request.is_cache_disabled() {
        verdict.flag_storable(false);
        verdict.flag_retrievable(false);
        return true;
    }
    false
}

/// Explicit bypass of the cached copy; storing stays undecided.
pub fn force_fresh(request: &CacheableRequest, verdict: &mut Verdict) -> bool {
    if request.is_force_fresh() {
        verdict.flag_retrievable(false);
        return true;
    }
    false
}

/// `max-age=0` (or negative) asks for revalidation: fetch fresh, store the result.
///
/// RFC 2616 section 13.1.6.
pub fn max_age_zero(request: &CacheableRequest, verdict: &mut Verdict) -> bool {
    match CacheControl::from_headers(request.headers()).max_age() {
        Some(age) if age <= 0 => {
            verdict.flag_storable(true);
            verdict.flag_retrievable(false);
            true
        }
        _ => false,
    }
}

/// `Cache-Control: no-cache` or `Pragma: no-cache`.
///
/// RFC 2616 section 14.9.
pub fn no_cache(request: &CacheableRequest, verdict: &mut Verdict) -> bool {
    let headers = request.headers();
    if CacheControl::from_headers(headers).contains("no-cache") || pragma_no_cache(headers) {
        verdict.flag_storable(false);
        verdict.flag_retrievable(false);
        return true;
    }
    false
}

/// `Cache-Control: no-store`.
///
/// RFC 2616 section 14.9.
pub fn no_store(request: &CacheableRequest, verdict: &mut Verdict) -> bool {
    if CacheControl::from_headers(request.headers()).contains("no-store") {
        verdict.flag_storable(false);
        verdict.flag_retrievable(false);
        return true;
    }
    false
}

/// Terminal default: only `GET` and `HEAD` are served from cache.
///
/// RFC 2616 section 13.9.
pub fn method_get_or_head(request: &CacheableRequest, verdict: &mut Verdict) -> bool {
    let method = request.method();
    verdict.flag_retrievable(*method == Method::GET || *method == Method::HEAD);
    true
}

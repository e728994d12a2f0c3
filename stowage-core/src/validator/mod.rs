//! Ordered validator chains.
//!
//! A [`Validator`] looks at a subject (a request or a response) and the
//! current [`Verdict`], may flag decisions on it, and reports whether it
//! made a final decision. A chain runs validators in order and stops at the
//! first one that reports a decision.
//!
//! The built-in RFC 2616 validators live in [`request`] and [`response`];
//! [`request::defaults`] and [`response::defaults`] return them in their
//! fixed evaluation order.
//!
//! ## Custom validators
//!
//! Any `Fn(&S, &mut Verdict) -> bool` can be wrapped:
//!
//! ```
//! use stowage_core::{CacheableRequest, RequestValidator};
//!
//! let internal_only = RequestValidator::new("internal_only", |request: &CacheableRequest, verdict| {
//!     if request.uri().starts_with("/internal/") {
//!         verdict.flag_retrievable(false);
//!         verdict.flag_storable(false);
//!         return true;
//!     }
//!     false
//! });
//! assert_eq!(internal_only.name(), "internal_only");
//! ```

pub mod request;
pub mod response;

use std::fmt;
use std::sync::Arc;

use smol_str::SmolStr;

use crate::decision::Verdict;
use crate::request::CacheableRequest;
use crate::response::CacheableResponse;

type CheckFn<S> = dyn Fn(&S, &mut Verdict) -> bool + Send + Sync;

/// Named decision function over a subject `S`.
///
/// Cloning is cheap: the function is shared behind an [`Arc`].
pub struct Validator<S> {
    name: SmolStr,
    check: Arc<CheckFn<S>>,
}

/// Validator over requests, used by [`Evaluator::is_retrievable`](crate::Evaluator::is_retrievable).
pub type RequestValidator = Validator<CacheableRequest>;

/// Validator over responses, used by [`Evaluator::is_storable`](crate::Evaluator::is_storable).
pub type ResponseValidator = Validator<CacheableResponse>;

impl<S> Validator<S> {
    pub fn new<F>(name: impl Into<SmolStr>, check: F) -> Self
    where
        F: Fn(&S, &mut Verdict) -> bool + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            check: Arc::new(check),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Runs the check. Returns `true` when the validator decided.
    pub fn validate(&self, subject: &S, verdict: &mut Verdict) -> bool {
        (self.check)(subject, verdict)
    }
}

impl<S> Clone for Validator<S> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            check: Arc::clone(&self.check),
        }
    }
}

impl<S> fmt::Debug for Validator<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Validator").field(&self.name).finish()
    }
}

/// Runs `chain` in order, stopping at the first validator that decides.
///
/// Returns the name of the deciding validator, if any.
pub(crate) fn run_chain<'a, S>(
    chain: &'a [Validator<S>],
    subject: &S,
    verdict: &mut Verdict,
) -> Option<&'a str> {
    chain
        .iter()
        .find(|validator| validator.validate(subject, verdict))
        .map(Validator::name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::Method;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_chain_stops_at_first_decision() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let chain = vec![
            RequestValidator::new("pass", |_: &CacheableRequest, _: &mut Verdict| false),
            RequestValidator::new("decide", |_: &CacheableRequest, verdict: &mut Verdict| {
                verdict.flag_retrievable(false);
                true
            }),
            RequestValidator::new("unreached", move |_: &CacheableRequest, _: &mut Verdict| {
                counter.fetch_add(1, Ordering::SeqCst);
                true
            }),
        ];
        let request = CacheableRequest::new(Method::GET, "/");
        let mut verdict = Verdict::default();

        let decided_by = run_chain(&chain, &request, &mut verdict);

        assert_eq!(decided_by, Some("decide"));
        assert_eq!(verdict.retrievable().get(), Some(false));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_exhausted_chain_leaves_flags_unset() {
        let chain = vec![RequestValidator::new(
            "pass",
            |_: &CacheableRequest, _: &mut Verdict| false,
        )];
        let mut verdict = Verdict::default();

        let decided_by = run_chain(&chain, &CacheableRequest::new(Method::GET, "/"), &mut verdict);

        assert_eq!(decided_by, None);
        assert!(!verdict.retrievable().is_set());
    }
}

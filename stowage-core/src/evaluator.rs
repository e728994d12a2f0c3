//! Single-use cacheability evaluator.

use tracing::debug;

use crate::decision::Verdict;
use crate::policy::ResolvedPolicy;
use crate::request::CacheableRequest;
use crate::response::CacheableResponse;
use crate::validator::{RequestValidator, ResponseValidator, run_chain};

/// Decides whether one request may be served from cache and whether its
/// response may be stored.
///
/// Each decision is computed once: the first call runs the corresponding
/// validator chain, later calls return the memoized flag without running
/// validators again. An evaluator belongs to a single request/response
/// cycle; obtain a fresh one per request.
///
/// # Examples
///
/// ```
/// use http::{Method, StatusCode};
/// use stowage_core::{CacheableRequest, CacheableResponse, GlobalPolicy, ResolvedPolicy};
///
/// let mut evaluator = ResolvedPolicy::resolve(&GlobalPolicy::default(), None, None).into_evaluator();
///
/// assert!(evaluator.is_retrievable(&CacheableRequest::new(Method::GET, "/")));
/// assert!(evaluator.is_storable(&CacheableResponse::new(StatusCode::OK)));
/// ```
#[derive(Debug)]
pub struct Evaluator {
    request_validators: Vec<RequestValidator>,
    response_validators: Vec<ResponseValidator>,
    verdict: Verdict,
}

impl Evaluator {
    pub fn new(policy: ResolvedPolicy) -> Self {
        Self {
            verdict: Verdict::new(
                policy.store_private,
                policy.store_no_store,
                policy.ignore_no_last_mod,
            ),
            request_validators: policy.request_validators,
            response_validators: policy.response_validators,
        }
    }

    /// Whether a cached response may be served for `request`.
    ///
    /// Undecided counts as `false`.
    pub fn is_retrievable(&mut self, request: &CacheableRequest) -> bool {
        if !self.verdict.retrievable().is_set() {
            let decided_by = run_chain(&self.request_validators, request, &mut self.verdict);
            debug!(
                validator = decided_by,
                retrievable = ?self.verdict.retrievable().get(),
                "Evaluated request"
            );
        }
        self.verdict.retrievable().is_true()
    }

    /// Whether `response` may be written to the cache.
    ///
    /// Undecided counts as `false`.
    pub fn is_storable(&mut self, response: &CacheableResponse) -> bool {
        if !self.verdict.storable().is_set() {
            let decided_by = run_chain(&self.response_validators, response, &mut self.verdict);
            debug!(
                validator = decided_by,
                storable = ?self.verdict.storable().get(),
                "Evaluated response"
            );
        }
        self.verdict.storable().is_true()
    }

    /// Raw retrievable flag; `None` while undecided.
    pub fn retrievable(&self) -> Option<bool> {
        self.verdict.retrievable().get()
    }

    /// Raw storable flag; `None` while undecided.
    pub fn storable(&self) -> Option<bool> {
        self.verdict.storable().get()
    }

    /// Whether the response was marked `private`; `None` while undecided.
    pub fn private(&self) -> Option<bool> {
        self.verdict.private().get()
    }

    pub fn store_private(&self) -> bool {
        self.verdict.store_private()
    }

    pub fn store_no_store(&self) -> bool {
        self.verdict.store_no_store()
    }

    pub fn ignore_no_last_mod(&self) -> bool {
        self.verdict.ignore_no_last_mod()
    }

    pub fn request_validators(&self) -> &[RequestValidator] {
        &self.request_validators
    }

    pub fn response_validators(&self) -> &[ResponseValidator] {
        &self.response_validators
    }

    /// Current decision state as seen by validators.
    pub fn verdict(&self) -> &Verdict {
        &self.verdict
    }
}

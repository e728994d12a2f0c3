//! Cache policy scopes and their merge rules.
//!
//! Three scopes contribute to the policy of a single request:
//!
//! 1. [`GlobalPolicy`] - process-wide defaults,
//! 2. host [`PolicyOverrides`] - registered per hostname,
//! 3. per-call [`PolicyOverrides`] - passed with the request.
//!
//! Boolean switches are overlaid from broad to narrow: a defined value in a
//! narrower scope wins. Validator chains are concatenated from narrow to
//! broad, so the most specific scope gets the first chance to decide:
//!
//! ```text
//! per-call validators -> host validators -> global validators -> built-ins
//! ```

use serde::{Deserialize, Serialize};

use crate::evaluator::Evaluator;
use crate::validator::{self, RequestValidator, ResponseValidator};

/// Process-wide policy defaults.
#[derive(Debug, Clone, Default)]
pub struct GlobalPolicy {
    /// Store responses marked `Cache-Control: private`.
    pub store_private: bool,
    /// Store responses marked `Cache-Control: no-store`.
    pub store_no_store: bool,
    /// Do not treat a `Last-Modified` header as a reason to store.
    pub ignore_no_last_mod: bool,
    /// Validators run before the built-in request validators.
    pub request_validators: Vec<RequestValidator>,
    /// Validators run before the built-in response validators.
    pub response_validators: Vec<ResponseValidator>,
}

/// Partial policy for a host or a single call.
///
/// Undefined fields fall through to the broader scope. When deserialized,
/// only the three switches are read; unknown keys are ignored. Validators
/// can only be attached in code.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyOverrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store_private: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store_no_store: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ignore_no_last_mod: Option<bool>,
    #[serde(skip)]
    pub request_validators: Option<Vec<RequestValidator>>,
    #[serde(skip)]
    pub response_validators: Option<Vec<ResponseValidator>>,
}

impl PolicyOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn store_private(mut self, value: bool) -> Self {
        self.store_private = Some(value);
        self
    }

    pub fn store_no_store(mut self, value: bool) -> Self {
        self.store_no_store = Some(value);
        self
    }

    pub fn ignore_no_last_mod(mut self, value: bool) -> Self {
        self.ignore_no_last_mod = Some(value);
        self
    }

    /// Appends a request validator to this scope's chain.
    pub fn request_validator(mut self, validator: RequestValidator) -> Self {
        self.request_validators
            .get_or_insert_with(Vec::new)
            .push(validator);
        self
    }

    /// Appends a response validator to this scope's chain.
    pub fn response_validator(mut self, validator: ResponseValidator) -> Self {
        self.response_validators
            .get_or_insert_with(Vec::new)
            .push(validator);
        self
    }

    /// Field-wise merge: every field defined in `update` replaces the
    /// corresponding field here; undefined fields keep their current value.
    pub fn merge(&mut self, update: PolicyOverrides) {
        let PolicyOverrides {
            store_private,
            store_no_store,
            ignore_no_last_mod,
            request_validators,
            response_validators,
        } = update;
        if store_private.is_some() {
            self.store_private = store_private;
        }
        if store_no_store.is_some() {
            self.store_no_store = store_no_store;
        }
        if ignore_no_last_mod.is_some() {
            self.ignore_no_last_mod = ignore_no_last_mod;
        }
        if request_validators.is_some() {
            self.request_validators = request_validators;
        }
        if response_validators.is_some() {
            self.response_validators = response_validators;
        }
    }

    /// `true` when no field is defined.
    pub fn is_empty(&self) -> bool {
        self.store_private.is_none()
            && self.store_no_store.is_none()
            && self.ignore_no_last_mod.is_none()
            && self.request_validators.is_none()
            && self.response_validators.is_none()
    }
}

/// Effective policy for one request/response cycle.
#[derive(Debug, Clone)]
pub struct ResolvedPolicy {
    pub store_private: bool,
    pub store_no_store: bool,
    pub ignore_no_last_mod: bool,
    pub request_validators: Vec<RequestValidator>,
    pub response_validators: Vec<ResponseValidator>,
}

impl ResolvedPolicy {
    /// Merges the three scopes and appends the built-in validators.
    pub fn resolve(
        global: &GlobalPolicy,
        host: Option<&PolicyOverrides>,
        call: Option<&PolicyOverrides>,
    ) -> Self {
        let scopes = [call, host];
        let switch = |field: fn(&PolicyOverrides) -> Option<bool>, default: bool| {
            scopes.iter().flatten().find_map(|scope| field(scope)).unwrap_or(default)
        };

        let mut request_validators: Vec<RequestValidator> = scopes
            .iter()
            .flatten()
            .filter_map(|scope| scope.request_validators.as_deref())
            .flatten()
            .cloned()
            .collect();
        request_validators.extend(global.request_validators.iter().cloned());
        request_validators.extend(validator::request::defaults());

        let mut response_validators: Vec<ResponseValidator> = scopes
            .iter()
            .flatten()
            .filter_map(|scope| scope.response_validators.as_deref())
            .flatten()
            .cloned()
            .collect();
        response_validators.extend(global.response_validators.iter().cloned());
        response_validators.extend(validator::response::defaults());

        Self {
            store_private: switch(|scope| scope.store_private, global.store_private),
            store_no_store: switch(|scope| scope.store_no_store, global.store_no_store),
            ignore_no_last_mod: switch(|scope| scope.ignore_no_last_mod, global.ignore_no_last_mod),
            request_validators,
            response_validators,
        }
    }

    pub fn into_evaluator(self) -> Evaluator {
        Evaluator::new(self)
    }
}

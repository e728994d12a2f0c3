//! # stowage-core
//!
//! Cacheability decisions for HTTP request/response pairs.
//!
//! This crate holds everything that decides *whether* something is cached
//! and *under which key*, independent of where entries are stored:
//!
//! - [`Fingerprinter`] turns a [`CacheableRequest`] into a stable [`Fingerprint`],
//! - [`PolicyResolver`] merges the [`GlobalPolicy`], per-host and per-call
//!   [`PolicyOverrides`] into a [`ResolvedPolicy`],
//! - [`Evaluator`] runs the ordered [`Validator`] chains of that policy and
//!   memoizes the retrievable / storable / private decisions.
//!
//! Storage lives in `stowage-backend`.

pub mod cache_control;
pub mod decision;
pub mod evaluator;
pub mod fingerprint;
pub mod policy;
pub mod registry;
pub mod request;
pub mod resolver;
pub mod response;
pub mod validator;

pub use cache_control::CacheControl;
pub use decision::{Decision, Verdict};
pub use evaluator::Evaluator;
pub use fingerprint::{Fingerprint, Fingerprinter};
pub use policy::{GlobalPolicy, PolicyOverrides, ResolvedPolicy};
pub use registry::HostRegistry;
pub use request::CacheableRequest;
pub use resolver::PolicyResolver;
pub use response::{CacheableResponse, CachedResponse};
pub use validator::{RequestValidator, ResponseValidator, Validator};

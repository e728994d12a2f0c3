#![doc = include_str!("../README.md")]

pub mod backend;
pub mod error;

#[doc(inline)]
pub use crate::backend::{ConnectionMode, RedisBackend, RedisBackendBuilder};
#[doc(inline)]
pub use crate::error::Error;

// Copyright (c) 2024 The Hierarchical TEE Authors

//! Common types and methods shared by the attestation crates.

#![deny(missing_docs)]
#![warn(unused_extern_crates)]

// Lets `#[test_with_logger]` refer to this crate by name from its own tests.
extern crate self as ht_common;

pub mod logger;
pub mod time;

pub use crate::time::{MockTimeProvider, SystemTimeProvider, TimeProvider, TimeProviderError};

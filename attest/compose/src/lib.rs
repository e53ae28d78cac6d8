// Copyright (c) 2024 The Hierarchical TEE Authors

//! Composite attestation assembly.
//!
//! [`assemble`] binds existing inner evidence into a slot and asks for outer
//! evidence embedding it. [`Composer`] drives a pair of
//! [`EvidenceProvider`](ht_attest_core::EvidenceProvider)s end to end, with
//! per-layer timeouts and optional retries.

mod assemble;
mod composer;
mod config;
mod error;

pub use crate::{
    assemble::assemble,
    composer::{Composer, DEFAULT_MAX_OUTSTANDING_CALLS},
    config::{ComposeConfig, RetryConfig},
    error::Error,
};

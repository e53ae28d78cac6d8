// Copyright (c) 2024 The Hierarchical TEE Authors

//! The verifier service.
//!
//! Each TCP connection carries one request, a canonical CBOR composite
//! attestation, and gets one [`Response`] back. Requests are verified on a
//! fixed pool of worker threads.

mod client;
mod config;
mod error;
mod messages;
mod server;
mod stats;

pub use crate::{
    client::{submit, submit_bytes},
    config::ServerConfig,
    error::{ClientError, ServerError},
    messages::Response,
    server::VerifierServer,
    stats::{ServerStats, StatsSnapshot},
};

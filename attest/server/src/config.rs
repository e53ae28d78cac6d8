// Copyright (c) 2024 The Hierarchical TEE Authors
#![deny(missing_docs)]

//! Configuration parameters for the verifier service.

use clap::Parser;
use ht_attest_verifier_config::VerifierConfig;
use ht_util_parse::parse_duration_in_seconds;
use serde::Serialize;
use std::{net::SocketAddr, time::Duration};

/// Configuration parameters for the verifier service.
#[derive(Clone, Debug, Parser, Serialize)]
#[clap(
    name = "ht-verifier-server",
    about = "Verifies hierarchical composite attestations submitted over TCP"
)]
pub struct ServerConfig {
    /// Address to listen on.
    #[clap(long, default_value = "0.0.0.0:9999", env = "HT_LISTEN_ADDR")]
    pub listen_addr: SocketAddr,

    /// Path to the verifier trust configuration (JSON). Without one, no
    /// measurement allow-lists apply.
    #[clap(long, value_parser = parse_verifier_config, env = "HT_VERIFIER_CONFIG")]
    pub verifier_config: Option<VerifierConfig>,

    /// Number of worker threads verifying requests.
    #[clap(long, default_value = "4", env = "HT_NUM_WORKERS")]
    pub num_workers: usize,

    /// How long to wait for a client to finish sending, in seconds.
    #[clap(
        long,
        default_value = "10",
        value_parser = parse_duration_in_seconds,
        env = "HT_READ_TIMEOUT_SECS"
    )]
    pub read_timeout: Duration,

    /// Requests larger than this many bytes are rejected.
    #[clap(long, default_value = "50000", env = "HT_MAX_REQUEST_BYTES")]
    pub max_request_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 9999)),
            verifier_config: None,
            num_workers: 4,
            read_timeout: Duration::from_secs(10),
            max_request_bytes: 50_000,
        }
    }
}

fn parse_verifier_config(path: &str) -> Result<VerifierConfig, String> {
    VerifierConfig::load(path).map_err(|err| err.to_string())
}

// Copyright (c) 2024 The Hierarchical TEE Authors

//! Verifier service entry point

use clap::Parser;
use ht_attest_server::{ServerConfig, VerifierServer};
use ht_attest_verifier::{StructuralOracle, Verifier};
use ht_common::logger::{create_app_logger, log, o};
use std::{sync::Arc, thread::sleep, time::Duration};

/// How often to log request counters.
const STATS_INTERVAL: Duration = Duration::from_secs(60);

fn main() {
    let (logger, _global_logger_guard) = create_app_logger(o!());
    let config = ServerConfig::parse();

    log::warn!(
        logger,
        "Endorsements are only checked for well-formedness; vendor signatures are NOT verified"
    );

    let oracle = Arc::new(StructuralOracle);
    let mut verifier = Verifier::new(oracle.clone(), oracle, logger.clone());
    match &config.verifier_config {
        Some(verifier_config) => {
            verifier.configure(verifier_config);
            log::info!(
                logger,
                "Trusted measurements: {}",
                verifier_config.trusted_measurements
            );
        }
        None => log::warn!(logger, "No verifier config given, any measurement is trusted"),
    }

    let server = VerifierServer::start(&config, Arc::new(verifier), logger.clone())
        .expect("Failed to start verifier service");
    server
        .register_metrics()
        .expect("Failed to register verifier metrics");

    loop {
        sleep(STATS_INTERVAL);
        log::info!(logger, "Request counters: {:?}", server.stats());
    }
}

// Copyright (c) 2024 The Hierarchical TEE Authors

//! Request counters, as prometheus metrics.
//!
//! Every server owns its own set of metrics, so several servers can run in
//! one process. A binary exports them by registering them once with
//! [`ServerStats::register_default`].

use prometheus::{
    core::{Collector, Desc},
    exponential_buckets,
    proto::MetricFamily,
    Histogram, HistogramOpts, HistogramTimer, IntCounter, Opts,
};
use serde::{Deserialize, Serialize};

const NAMESPACE: &str = "ht_verifier";

/// Counters shared by the service's worker threads.
#[derive(Clone)]
pub struct ServerStats {
    /// Requests answered, whatever the outcome
    total: IntCounter,

    /// Verdicts which were trusted
    trusted: IntCounter,

    /// Verdicts which were untrusted
    untrusted: IntCounter,

    /// Requests rejected before a verdict was issued
    rejected: IntCounter,

    /// Time spent verifying decoded requests, in seconds
    verification_time: Histogram,
}

/// A copy of the counters at one moment.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct StatsSnapshot {
    pub total: u64,
    pub trusted: u64,
    pub untrusted: u64,
    pub rejected: u64,
}

impl ServerStats {
    /// Create an unregistered set of metrics.
    pub fn new() -> prometheus::Result<Self> {
        let counter = |name: &str, help: &str| {
            IntCounter::with_opts(Opts::new(name, help).namespace(NAMESPACE))
        };
        Ok(Self {
            total: counter("requests_total", "Requests answered")?,
            trusted: counter("trusted_total", "Trusted verdicts")?,
            untrusted: counter("untrusted_total", "Untrusted verdicts")?,
            rejected: counter("rejected_total", "Requests rejected without a verdict")?,
            verification_time: Histogram::with_opts(
                HistogramOpts::new(
                    "verification_time_seconds",
                    "Time spent verifying a composite attestation",
                )
                .namespace(NAMESPACE)
                .buckets(exponential_buckets(0.0001, 4.0, 10)?),
            )?,
        })
    }

    /// Register these metrics with the default prometheus registry.
    pub fn register_default(&self) -> prometheus::Result<()> {
        prometheus::register(Box::new(self.clone()))
    }

    /// Start timing a verification. Record the time with
    /// `stop_and_record`, or drop it with `stop_and_discard`.
    pub fn start_timer(&self) -> HistogramTimer {
        self.verification_time.start_timer()
    }

    pub fn record_verdict(&self, trusted: bool) {
        self.total.inc();
        if trusted {
            self.trusted.inc();
        } else {
            self.untrusted.inc();
        }
    }

    pub fn record_rejected(&self) {
        self.total.inc();
        self.rejected.inc();
    }

    /// How many verifications have been timed.
    pub fn timed_verifications(&self) -> u64 {
        self.verification_time.get_sample_count()
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            total: self.total.get(),
            trusted: self.trusted.get(),
            untrusted: self.untrusted.get(),
            rejected: self.rejected.get(),
        }
    }
}

impl Collector for ServerStats {
    fn desc(&self) -> Vec<&Desc> {
        [
            self.total.desc(),
            self.trusted.desc(),
            self.untrusted.desc(),
            self.rejected.desc(),
            self.verification_time.desc(),
        ]
        .into_iter()
        .flatten()
        .collect()
    }

    fn collect(&self) -> Vec<MetricFamily> {
        [
            self.total.collect(),
            self.trusted.collect(),
            self.untrusted.collect(),
            self.rejected.collect(),
            self.verification_time.collect(),
        ]
        .into_iter()
        .flatten()
        .collect()
    }
}

// Copyright (c) 2024 The Hierarchical TEE Authors

//! Timeout and retry settings for composite attestation.

use clap::Parser;
use ht_util_parse::parse_duration_in_millis;
use retry::delay;
use serde::Serialize;
use std::time::Duration;

/// How long each evidence provider may take.
#[derive(Clone, Copy, Debug, Eq, Parser, PartialEq, Serialize)]
pub struct ComposeConfig {
    /// Budget for producing inner evidence, in milliseconds.
    #[clap(
        long,
        default_value = "1000",
        value_parser = parse_duration_in_millis,
        env = "HT_INNER_EVIDENCE_TIMEOUT_MS"
    )]
    pub inner_timeout: Duration,

    /// Budget for producing outer evidence, in milliseconds. This usually
    /// includes a round trip to a remote attestation service.
    #[clap(
        long,
        default_value = "5000",
        value_parser = parse_duration_in_millis,
        env = "HT_OUTER_EVIDENCE_TIMEOUT_MS"
    )]
    pub outer_timeout: Duration,
}

impl Default for ComposeConfig {
    fn default() -> Self {
        Self {
            inner_timeout: Duration::from_secs(1),
            outer_timeout: Duration::from_secs(5),
        }
    }
}

/// A retry policy for transient evidence failures.
#[derive(Clone, Copy, Debug, Eq, Parser, PartialEq, Serialize)]
pub struct RetryConfig {
    /// How many times to retry after a transient failure
    #[clap(long, default_value = "3", env = "HT_ATTEST_RETRY_COUNT")]
    pub attest_retry_count: usize,

    /// How long to back off (milliseconds) between attempts
    #[clap(long, default_value = "100", env = "HT_ATTEST_RETRY_MILLIS")]
    pub attest_retry_millis: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            attest_retry_count: 3,
            attest_retry_millis: 100,
        }
    }
}

impl RetryConfig {
    /// Get a duration iterator for use with the retry crate based on this
    /// config
    pub fn get_retry_iterator(&self) -> impl Iterator<Item = Duration> {
        delay::Fixed::from_millis(self.attest_retry_millis)
            .take(self.attest_retry_count)
            .map(delay::jitter)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn defaults_match_parser_defaults() {
        let parsed = ComposeConfig::try_parse_from(["compose"]).unwrap();
        assert_eq!(parsed, ComposeConfig::default());
        let parsed = RetryConfig::try_parse_from(["retry"]).unwrap();
        assert_eq!(parsed, RetryConfig::default());
    }

    #[test]
    fn timeouts_parse_as_millis() {
        let parsed =
            ComposeConfig::try_parse_from(["compose", "--inner-timeout", "250"]).unwrap();
        assert_eq!(parsed.inner_timeout, Duration::from_millis(250));
        assert_eq!(parsed.outer_timeout, Duration::from_secs(5));
    }

    #[test]
    fn retry_iterator_is_bounded() {
        let config = RetryConfig {
            attest_retry_count: 2,
            attest_retry_millis: 10,
        };
        assert_eq!(config.get_retry_iterator().count(), 2);
    }
}

// Copyright (c) 2024 The Hierarchical TEE Authors

//! Composer timeouts and retries, against mock providers.

use ht_attest_compose::{ComposeConfig, Composer, Error, RetryConfig};
use ht_attest_core::{Layer, ProviderError, PurposeTag};
use ht_attest_test_utils::{MockEvidenceProvider, MockOracle};
use ht_attest_verifier::Verifier;
use ht_common::{
    logger::{test_with_logger, Logger},
    MockTimeProvider,
};
use ht_util_test_helper::get_seeded_rng;
use std::{collections::HashSet, sync::Arc, time::Duration};

fn tag() -> PurposeTag {
    PurposeTag::new("compose").unwrap()
}

fn fast_retries(count: usize) -> RetryConfig {
    RetryConfig {
        attest_retry_count: count,
        attest_retry_millis: 1,
    }
}

fn composer(
    inner: &MockEvidenceProvider,
    outer: &MockEvidenceProvider,
    config: ComposeConfig,
    logger: Logger,
) -> Composer {
    Composer::new(
        Arc::new(inner.clone()),
        Arc::new(outer.clone()),
        config,
        logger,
    )
}

#[test_with_logger]
fn inner_is_requested_first_with_an_empty_slot(logger: Logger) {
    let inner = MockEvidenceProvider::inner();
    let outer = MockEvidenceProvider::outer();
    let composer = composer(&inner, &outer, ComposeConfig::default(), logger.clone())
        .with_time_provider(Arc::new(MockTimeProvider::new(Duration::from_secs(1234))));

    let composite = composer.attest(&mut get_seeded_rng(), &tag()).unwrap();
    assert_eq!(composite.created_at(), 1234);
    assert_eq!(inner.calls(), 1);
    assert_eq!(outer.calls(), 1);
    assert!(inner.slots()[0].as_bytes().iter().all(|byte| *byte == 0));
    assert_eq!(&outer.slots()[0], composite.outer().embedded_slot());

    let verifier = Verifier::new(
        Arc::new(MockOracle::valid()),
        Arc::new(MockOracle::valid()),
        logger,
    );
    assert!(verifier.verify(&composite).is_trusted());
}

#[test_with_logger]
fn slow_outer_provider_times_out(logger: Logger) {
    let inner = MockEvidenceProvider::inner();
    let outer = MockEvidenceProvider::outer().with_latency(Duration::from_millis(500));
    let config = ComposeConfig {
        inner_timeout: Duration::from_secs(1),
        outer_timeout: Duration::from_millis(20),
    };
    let result = composer(&inner, &outer, config, logger).attest(&mut get_seeded_rng(), &tag());
    assert_eq!(
        result.unwrap_err(),
        Error::EvidenceUnavailable(Layer::Outer, ProviderError::Timeout(Duration::from_millis(20)))
    );
}

#[test_with_logger]
fn slow_inner_provider_times_out_before_outer_is_asked(logger: Logger) {
    let inner = MockEvidenceProvider::inner().with_latency(Duration::from_millis(500));
    let outer = MockEvidenceProvider::outer();
    let config = ComposeConfig {
        inner_timeout: Duration::from_millis(20),
        outer_timeout: Duration::from_secs(1),
    };
    let result = composer(&inner, &outer, config, logger).attest(&mut get_seeded_rng(), &tag());
    assert!(matches!(
        result,
        Err(Error::EvidenceUnavailable(Layer::Inner, ProviderError::Timeout(_)))
    ));
    assert_eq!(outer.calls(), 0);
}

#[test_with_logger]
fn transient_failures_are_retried_with_fresh_slots(logger: Logger) {
    let inner = MockEvidenceProvider::inner();
    let outer = MockEvidenceProvider::outer()
        .failing(2, ProviderError::DeviceUnavailable("busy".to_owned()));
    let composer = composer(&inner, &outer, ComposeConfig::default(), logger);

    let composite = composer
        .attest_with_retries(&mut get_seeded_rng(), &tag(), &fast_retries(3))
        .unwrap();
    assert_eq!(outer.calls(), 3);

    let slots: HashSet<Vec<u8>> = outer
        .slots()
        .iter()
        .map(|slot| slot.as_bytes().to_vec())
        .collect();
    assert_eq!(slots.len(), 3, "a slot was reused across attempts");
    assert_eq!(
        outer.slots().last(),
        Some(composite.outer().embedded_slot())
    );
}

#[test_with_logger]
fn retries_run_out(logger: Logger) {
    let inner = MockEvidenceProvider::inner();
    let outer = MockEvidenceProvider::outer()
        .failing(10, ProviderError::RemoteServiceError("503".to_owned()));
    let result = composer(&inner, &outer, ComposeConfig::default(), logger)
        .attest_with_retries(&mut get_seeded_rng(), &tag(), &fast_retries(2));
    assert_eq!(
        result.unwrap_err(),
        Error::EvidenceUnavailable(
            Layer::Outer,
            ProviderError::RemoteServiceError("503".to_owned())
        )
    );
    assert_eq!(outer.calls(), 3);
}

#[test_with_logger]
fn permission_denied_is_not_retried(logger: Logger) {
    let inner = MockEvidenceProvider::inner()
        .failing(1, ProviderError::PermissionDenied("no /dev/tdx_guest".to_owned()));
    let outer = MockEvidenceProvider::outer();
    let result = composer(&inner, &outer, ComposeConfig::default(), logger)
        .attest_with_retries(&mut get_seeded_rng(), &tag(), &fast_retries(3));
    assert!(matches!(
        result,
        Err(Error::EvidenceUnavailable(Layer::Inner, ProviderError::PermissionDenied(_)))
    ));
    assert_eq!(inner.calls(), 1);
    assert_eq!(outer.calls(), 0);
}

#[test_with_logger]
fn tampering_outer_is_binding_mismatch(logger: Logger) {
    let inner = MockEvidenceProvider::inner();
    let outer = MockEvidenceProvider::outer().tampering();
    let result = composer(&inner, &outer, ComposeConfig::default(), logger)
        .attest_with_retries(&mut get_seeded_rng(), &tag(), &fast_retries(3));
    assert_eq!(result.unwrap_err(), Error::BindingMismatch);
    assert_eq!(outer.calls(), 1);
}

#[test_with_logger]
fn hung_provider_threads_are_bounded(logger: Logger) {
    let inner = MockEvidenceProvider::inner().with_latency(Duration::from_millis(300));
    let outer = MockEvidenceProvider::outer();
    let config = ComposeConfig {
        inner_timeout: Duration::from_millis(20),
        outer_timeout: Duration::from_secs(1),
    };
    let composer = composer(&inner, &outer, config, logger).with_max_outstanding_calls(2);

    for _ in 0..2 {
        assert!(matches!(
            composer.attest(&mut get_seeded_rng(), &tag()),
            Err(Error::EvidenceUnavailable(Layer::Inner, ProviderError::Timeout(_)))
        ));
    }
    // Both earlier calls are still running, so the provider is not called.
    assert!(matches!(
        composer.attest(&mut get_seeded_rng(), &tag()),
        Err(Error::EvidenceUnavailable(Layer::Inner, ProviderError::DeviceUnavailable(_)))
    ));
    assert_eq!(inner.calls(), 2);

    // Once they finish, calls go through again.
    std::thread::sleep(Duration::from_millis(500));
    assert!(matches!(
        composer.attest(&mut get_seeded_rng(), &tag()),
        Err(Error::EvidenceUnavailable(Layer::Inner, ProviderError::Timeout(_)))
    ));
    assert_eq!(inner.calls(), 3);
}

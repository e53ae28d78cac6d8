// Copyright (c) 2024 The Hierarchical TEE Authors

//! Trust policy: TCB status, tokens, debug mode and measurement allow-lists.

use ht_attest_compose::assemble;
use ht_attest_core::{
    CompositeAttestation, EvidenceProvider, Layer, PurposeTag, ReportSlot, TcbStatus,
};
use ht_attest_test_utils::{
    sample_inner_measurements, sample_outer_measurements, sample_token, MockEvidenceProvider,
    MockOracle, SAMPLE_ISSUER,
};
use ht_attest_verifier::{Reason, TcbPolicy, TrustedMeasurements, Verifier};
use ht_attest_verifier_config::VerifierConfig;
use ht_common::{
    logger::{test_with_logger, Logger},
    MockTimeProvider,
};
use ht_util_test_helper::get_seeded_rng;
use std::{sync::Arc, thread, time::Duration};

const NOW: u64 = 1_700_000_000;

fn compose(inner: MockEvidenceProvider, outer: MockEvidenceProvider) -> CompositeAttestation {
    let inner = inner
        .get_evidence(&ReportSlot::default(), Duration::from_secs(1))
        .unwrap();
    assemble(
        &mut get_seeded_rng(),
        &PurposeTag::new("policy").unwrap(),
        inner,
        |slot| outer.get_evidence(&slot, Duration::from_secs(1)),
        NOW,
    )
    .unwrap()
}

fn with_outer_tcb(tcb_status: TcbStatus) -> CompositeAttestation {
    compose(
        MockEvidenceProvider::inner(),
        MockEvidenceProvider::new(sample_outer_measurements(), tcb_status),
    )
}

fn verifier(logger: Logger) -> Verifier {
    let mut verifier = Verifier::new(
        Arc::new(MockOracle::valid()),
        Arc::new(MockOracle::valid()),
        logger,
    );
    verifier.time_provider(Arc::new(MockTimeProvider::new(Duration::from_secs(NOW))));
    verifier
}

#[test_with_logger]
fn tcb_statuses(logger: Logger) {
    let mut verifier = verifier(logger);

    for status in [TcbStatus::UpToDate, TcbStatus::SwHardeningNeeded] {
        assert!(verifier.verify(&with_outer_tcb(status)).is_trusted());
    }
    for status in [TcbStatus::OutOfDate, TcbStatus::Revoked, TcbStatus::Unknown] {
        let verdict = verifier.verify(&with_outer_tcb(status));
        assert!(!verdict.tcb_acceptable());
        assert!(verdict.outer_ok());
        assert_eq!(verdict.reasons(), &[Reason::TcbUnacceptable(status)]);
    }

    verifier.tcb_policy(TcbPolicy::new(true));
    assert!(verifier.verify(&with_outer_tcb(TcbStatus::OutOfDate)).is_trusted());
    assert!(!verifier.verify(&with_outer_tcb(TcbStatus::Revoked)).is_trusted());
}

#[test_with_logger]
fn inner_tcb_status_is_not_policed(logger: Logger) {
    let composite = compose(
        MockEvidenceProvider::new(sample_inner_measurements(), TcbStatus::Unknown),
        MockEvidenceProvider::outer(),
    );
    assert!(verifier(logger).verify(&composite).is_trusted());
}

#[test_with_logger]
fn expired_token(logger: Logger) {
    let composite = compose(
        MockEvidenceProvider::inner(),
        MockEvidenceProvider::outer().with_endorsement(sample_token(NOW - 100, NOW)),
    );
    let verdict = verifier(logger).verify(&composite);
    assert!(!verdict.outer_ok());
    assert_eq!(verdict.reasons(), &[Reason::TokenExpired(Layer::Outer)]);
}

#[test_with_logger]
fn token_expiry_follows_clock(logger: Logger) {
    let clock = MockTimeProvider::new(Duration::from_secs(NOW));
    let mut verifier = verifier(logger);
    verifier.time_provider(Arc::new(clock.clone()));

    let composite = compose(
        MockEvidenceProvider::inner().with_endorsement(sample_token(NOW - 10, NOW + 10)),
        MockEvidenceProvider::outer(),
    );
    assert!(verifier.verify(&composite).is_trusted());

    clock.set_cur_since_epoch(Duration::from_secs(NOW + 10));
    let verdict = verifier.verify(&composite);
    assert!(!verdict.inner_ok());
    assert_eq!(verdict.reasons(), &[Reason::TokenExpired(Layer::Inner)]);
}

#[test_with_logger]
fn untrusted_issuer(logger: Logger) {
    let composite = compose(
        MockEvidenceProvider::inner(),
        MockEvidenceProvider::outer().with_endorsement(sample_token(NOW - 10, NOW + 3600)),
    );
    let mut verifier = verifier(logger);
    assert!(verifier.verify(&composite).is_trusted());

    verifier.trusted_issuers(["https://attestation.example.com"]);
    let verdict = verifier.verify(&composite);
    assert_eq!(verdict.reasons(), &[Reason::UntrustedIssuer(Layer::Outer)]);

    verifier.trusted_issuers([SAMPLE_ISSUER]);
    assert!(verifier.verify(&composite).is_trusted());
}

#[test_with_logger]
fn debuggable_evidence(logger: Logger) {
    let composite = compose(
        MockEvidenceProvider::inner().with_debuggable(true),
        MockEvidenceProvider::outer(),
    );
    let mut verifier = verifier(logger);
    let verdict = verifier.verify(&composite);
    assert!(!verdict.inner_ok());
    assert_eq!(verdict.reasons(), &[Reason::DebuggableEvidence(Layer::Inner)]);

    verifier.allow_debug(true);
    assert!(verifier.verify(&composite).is_trusted());
}

#[test_with_logger]
fn allow_list_hot_swap(logger: Logger) {
    let composite = compose(MockEvidenceProvider::inner(), MockEvidenceProvider::outer());
    let verifier = verifier(logger);

    verifier.replace_trusted_measurements(
        TrustedMeasurements::default().with_layer(Layer::Outer, &[sample_inner_measurements()]),
    );
    let verdict = verifier.verify(&composite);
    assert_eq!(verdict.reasons(), &[Reason::MeasurementNotTrusted(Layer::Outer)]);

    // Swap from another thread while the verifier is shared.
    thread::scope(|scope| {
        scope.spawn(|| {
            verifier.replace_trusted_measurements(
                TrustedMeasurements::default()
                    .with_layer(Layer::Inner, &[sample_inner_measurements()])
                    .with_layer(Layer::Outer, &[sample_outer_measurements()]),
            );
        });
    });
    assert!(verifier.verify(&composite).is_trusted());
    assert!(verifier.trusted_measurements().is_configured(Layer::Inner));
}

#[test_with_logger]
fn configure_from_json(logger: Logger) {
    let inner_hex = hex_register(&sample_inner_measurements(), "MRENCLAVE");
    let json = format!(
        r#"{{
            "trusted_measurements": {{
                "v1": {{
                    "inner": {{
                        "MRENCLAVE": "{inner_hex}",
                        "MRSIGNER": "{signer_hex}"
                    }}
                }}
            }},
            "trusted_issuers": ["{SAMPLE_ISSUER}"]
        }}"#,
        signer_hex = hex_register(&sample_inner_measurements(), "MRSIGNER"),
    );
    let config = VerifierConfig::from_json(&json).unwrap();

    let mut verifier = verifier(logger);
    verifier.configure(&config);
    let trusted = verifier.trusted_measurements();
    assert!(trusted.is_configured(Layer::Inner));
    assert!(!trusted.is_configured(Layer::Outer));

    let composite = compose(MockEvidenceProvider::inner(), MockEvidenceProvider::outer());
    assert!(verifier.verify(&composite).is_trusted());

    let stranger = compose(
        MockEvidenceProvider::new(sample_outer_measurements(), TcbStatus::UpToDate),
        MockEvidenceProvider::outer(),
    );
    assert_eq!(
        verifier.verify(&stranger).reasons(),
        &[Reason::MeasurementNotTrusted(Layer::Inner)]
    );
}

fn hex_register(measurements: &ht_attest_core::MeasurementSet, name: &str) -> String {
    hex::encode(measurements.get(name).unwrap().as_bytes())
}

// Copyright (c) 2024 The Hierarchical TEE Authors

//! The verification state machine.
//!
//! A composite attestation moves through
//! [`Received`] → [`InnerChecked`] → [`OuterChecked`] → [`BindingChecked`] →
//! [`Decided`]. Each predicate is a field of the state which follows the check
//! that computes it, so it is set exactly once. No transition short-circuits:
//! every check runs, and every failing predicate is recorded as a [`Reason`].

use crate::{
    mealy::{Input, Output, State, Transition},
    oracle::SignatureOracle,
    policy::TcbPolicy,
    trusted::TrustedMeasurements,
};
use ht_attest_core::{CompositeAttestation, Evidence, Layer, Reason, Verdict};
use ht_common::logger::{log, Logger};
use std::time::Duration;
use subtle::ConstantTimeEq;

/// Everything the checks need beyond the attestation itself.
pub struct CheckContext<'c> {
    pub inner_oracle: &'c dyn SignatureOracle,
    pub outer_oracle: &'c dyn SignatureOracle,
    pub trusted: &'c TrustedMeasurements,
    pub tcb_policy: TcbPolicy,
    pub allow_debug: bool,
    pub trusted_issuers: &'c [String],
    /// The current time, or `None` if the clock could not be read, in which
    /// case every token is treated as expired.
    pub now: Option<Duration>,
    pub logger: &'c Logger,
}

impl<'c> CheckContext<'c> {
    fn oracle(&self, layer: Layer) -> &'c dyn SignatureOracle {
        match layer {
            Layer::Inner => self.inner_oracle,
            Layer::Outer => self.outer_oracle,
        }
    }

    /// Run the per-layer checks on one piece of evidence, appending a reason
    /// for each failure.
    fn check_layer(&self, layer: Layer, evidence: &Evidence, reasons: &mut Vec<Reason>) -> bool {
        let before = reasons.len();

        match self.oracle(layer).verify(evidence) {
            Ok(true) => {}
            Ok(false) => reasons.push(Reason::SignatureInvalid(layer)),
            Err(err) => {
                log::warn!(self.logger, "Could not check {} evidence: {}", layer, err);
                reasons.push(Reason::OracleUnavailable(layer));
            }
        }

        if !self.trusted.is_trusted(layer, evidence.measurements()) {
            reasons.push(Reason::MeasurementNotTrusted(layer));
        }

        if let Some(token) = evidence.endorsement().token() {
            if self.now.map_or(true, |now| token.is_expired_at(now)) {
                reasons.push(Reason::TokenExpired(layer));
            }
            if !self.trusted_issuers.is_empty() && !self.trusted_issuers.contains(&token.issuer) {
                reasons.push(Reason::UntrustedIssuer(layer));
            }
        }

        if evidence.debuggable() && !self.allow_debug {
            reasons.push(Reason::DebuggableEvidence(layer));
        }

        reasons.len() == before
    }
}

/// Check the inner evidence.
pub struct CheckInner<'c>(pub &'c CheckContext<'c>);

/// Check the outer evidence and its TCB status.
pub struct CheckOuter<'c>(pub &'c CheckContext<'c>);

/// Recompute the binding and compare it with the outer evidence.
pub struct CheckBinding;

/// Combine the predicates.
pub struct Decide;

impl Input for CheckInner<'_> {}
impl Input for CheckOuter<'_> {}
impl Input for CheckBinding {}
impl Input for Decide {}

/// What a single transition found, for trace logging.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct CheckOutcome {
    pub check: &'static str,
    pub passed: bool,
}

impl Output for CheckOutcome {}

/// A composite attestation which has been decoded, but not checked.
pub struct Received<'a> {
    composite: &'a CompositeAttestation,
}

impl<'a> Received<'a> {
    pub fn new(composite: &'a CompositeAttestation) -> Self {
        Self { composite }
    }
}

/// The inner evidence has been checked.
pub struct InnerChecked<'a> {
    composite: &'a CompositeAttestation,
    reasons: Vec<Reason>,
    inner_ok: bool,
}

/// The outer evidence and TCB status have been checked.
pub struct OuterChecked<'a> {
    composite: &'a CompositeAttestation,
    reasons: Vec<Reason>,
    inner_ok: bool,
    outer_ok: bool,
    tcb_acceptable: bool,
}

/// The binding has been checked.
pub struct BindingChecked {
    reasons: Vec<Reason>,
    inner_ok: bool,
    outer_ok: bool,
    tcb_acceptable: bool,
    binding_ok: bool,
}

/// The final state.
pub struct Decided {
    verdict: Verdict,
}

impl Decided {
    pub fn into_verdict(self) -> Verdict {
        self.verdict
    }
}

impl State for Received<'_> {}
impl State for InnerChecked<'_> {}
impl State for OuterChecked<'_> {}
impl State for BindingChecked {}
impl State for Decided {}

impl<'a, 'c> Transition<InnerChecked<'a>, CheckInner<'c>, CheckOutcome> for Received<'a> {
    fn next(self, input: CheckInner<'c>) -> (InnerChecked<'a>, CheckOutcome) {
        let mut reasons = Vec::new();
        let inner_ok = input
            .0
            .check_layer(Layer::Inner, self.composite.inner(), &mut reasons);
        let state = InnerChecked {
            composite: self.composite,
            reasons,
            inner_ok,
        };
        let outcome = CheckOutcome {
            check: "inner",
            passed: inner_ok,
        };
        (state, outcome)
    }
}

impl<'a, 'c> Transition<OuterChecked<'a>, CheckOuter<'c>, CheckOutcome> for InnerChecked<'a> {
    fn next(mut self, input: CheckOuter<'c>) -> (OuterChecked<'a>, CheckOutcome) {
        let ctx = input.0;
        let outer = self.composite.outer();
        let outer_ok = ctx.check_layer(Layer::Outer, outer, &mut self.reasons);

        let tcb_acceptable = ctx.tcb_policy.is_acceptable(outer.tcb_status());
        if !tcb_acceptable {
            self.reasons.push(Reason::TcbUnacceptable(outer.tcb_status()));
        }

        let state = OuterChecked {
            composite: self.composite,
            reasons: self.reasons,
            inner_ok: self.inner_ok,
            outer_ok,
            tcb_acceptable,
        };
        let outcome = CheckOutcome {
            check: "outer",
            passed: outer_ok && tcb_acceptable,
        };
        (state, outcome)
    }
}

impl<'a> Transition<BindingChecked, CheckBinding, CheckOutcome> for OuterChecked<'a> {
    fn next(mut self, _input: CheckBinding) -> (BindingChecked, CheckOutcome) {
        let composite = self.composite;

        let omitted = composite.nonce().is_omitted() || composite.blinding_factor().is_omitted();
        if omitted {
            self.reasons.push(Reason::BlindingOmitted);
        }

        // The slot is always recomputed, so a missing disclosure costs the same
        // as a present one.
        let expected = ht_attest_binding::expected_slot(
            composite.purpose_tag(),
            &composite.inner().measurements().digest(),
            composite.nonce(),
            composite.blinding_factor(),
        );
        let matches: bool = expected.ct_eq(composite.outer().embedded_slot()).into();
        if !matches {
            self.reasons.push(Reason::BindingFailed);
        }

        let binding_ok = !omitted && matches;
        let state = BindingChecked {
            reasons: self.reasons,
            inner_ok: self.inner_ok,
            outer_ok: self.outer_ok,
            tcb_acceptable: self.tcb_acceptable,
            binding_ok,
        };
        let outcome = CheckOutcome {
            check: "binding",
            passed: binding_ok,
        };
        (state, outcome)
    }
}

impl Transition<Decided, Decide, CheckOutcome> for BindingChecked {
    fn next(self, _input: Decide) -> (Decided, CheckOutcome) {
        let verdict = Verdict::new(
            self.inner_ok,
            self.outer_ok,
            self.binding_ok,
            self.tcb_acceptable,
            self.reasons,
        );
        let outcome = CheckOutcome {
            check: "decide",
            passed: verdict.is_trusted(),
        };
        (Decided { verdict }, outcome)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::oracle::OracleError;
    use ht_attest_core::{
        BlindingFactor, Endorsement, MeasurementSet, Nonce, PurposeTag, ReportSlot, TcbStatus,
    };
    use ht_common::logger::create_null_logger;

    struct Fixed(Result<bool, OracleError>);

    impl SignatureOracle for Fixed {
        fn verify(&self, _evidence: &Evidence) -> Result<bool, OracleError> {
            self.0.clone()
        }
    }

    fn evidence(slot: ReportSlot, tcb_status: TcbStatus) -> Evidence {
        let measurements: MeasurementSet = [("MRTD", [3u8; 48])].into_iter().collect();
        Evidence::builder(
            measurements,
            slot,
            tcb_status,
            Endorsement::Quote { chain: vec![1] },
        )
        .build()
    }

    fn composite(tcb_status: TcbStatus) -> CompositeAttestation {
        let tag = PurposeTag::new("state-test").unwrap();
        let nonce = Nonce::from([1u8; 32]);
        let blinding_factor = BlindingFactor::from([2u8; 32]);
        let inner = evidence(ReportSlot::default(), TcbStatus::UpToDate);
        let slot = ht_attest_binding::expected_slot(
            &tag,
            &inner.measurements().digest(),
            &nonce,
            &blinding_factor,
        );
        let outer = evidence(slot, tcb_status);
        CompositeAttestation::new(tag, nonce, blinding_factor, inner, outer, 0)
    }

    fn run(composite: &CompositeAttestation, ctx: &CheckContext) -> (Verdict, Vec<CheckOutcome>) {
        let (state, first) = Received::new(composite).next(CheckInner(ctx));
        let (state, second) = state.next(CheckOuter(ctx));
        let (state, third) = state.next(CheckBinding);
        let (state, fourth) = state.next(Decide);
        (state.into_verdict(), vec![first, second, third, fourth])
    }

    #[test]
    fn all_checks_pass() {
        let logger = create_null_logger();
        let oracle = Fixed(Ok(true));
        let trusted = TrustedMeasurements::default();
        let ctx = CheckContext {
            inner_oracle: &oracle,
            outer_oracle: &oracle,
            trusted: &trusted,
            tcb_policy: TcbPolicy::default(),
            allow_debug: false,
            trusted_issuers: &[],
            now: Some(Duration::from_secs(1)),
            logger: &logger,
        };
        let (verdict, outcomes) = run(&composite(TcbStatus::UpToDate), &ctx);
        assert!(verdict.is_trusted());
        assert!(verdict.reasons().is_empty());
        assert!(outcomes.iter().all(|outcome| outcome.passed));
    }

    #[test]
    fn no_short_circuit() {
        let logger = create_null_logger();
        let inner_oracle = Fixed(Ok(false));
        let outer_oracle = Fixed(Err(OracleError::Unavailable("offline".to_owned())));
        let trusted = TrustedMeasurements::default();
        let ctx = CheckContext {
            inner_oracle: &inner_oracle,
            outer_oracle: &outer_oracle,
            trusted: &trusted,
            tcb_policy: TcbPolicy::default(),
            allow_debug: false,
            trusted_issuers: &[],
            now: Some(Duration::from_secs(1)),
            logger: &logger,
        };
        let (verdict, _) = run(&composite(TcbStatus::Revoked), &ctx);
        assert!(!verdict.is_trusted());
        assert!(!verdict.inner_ok());
        assert!(!verdict.outer_ok());
        assert!(!verdict.tcb_acceptable());
        assert!(verdict.binding_ok());
        assert_eq!(
            verdict.reasons(),
            &[
                Reason::SignatureInvalid(Layer::Inner),
                Reason::OracleUnavailable(Layer::Outer),
                Reason::TcbUnacceptable(TcbStatus::Revoked),
            ]
        );
    }
}

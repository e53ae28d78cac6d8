// Copyright (c) 2024 The Hierarchical TEE Authors

//! Hierarchical attestation verifier
//!
//! This crate checks a [`CompositeAttestation`] against a pre-configured set
//! of criteria: each layer's evidence must be endorsed and trusted, the outer
//! TCB status must be acceptable, and the outer evidence must embed the slot
//! recomputed from the disclosed binding values.
//!
//! Verification never fails once an attestation has been decoded. A failed
//! check is recorded as a [`Reason`] in the returned [`Verdict`].

mod mealy;
mod oracle;
mod policy;
mod state;
mod trusted;

pub use crate::{
    oracle::{OracleError, SignatureOracle, StructuralOracle},
    policy::TcbPolicy,
    trusted::TrustedMeasurements,
};
pub use ht_attest_core::{Reason, Trust, Verdict};

use crate::{
    mealy::Transition,
    state::{CheckBinding, CheckContext, CheckInner, CheckOutcome, CheckOuter, Decide, Received},
};
use displaydoc::Display;
use ht_attest_core::{CompositeAttestation, Error as CoreError};
use ht_attest_verifier_config::VerifierConfig;
use ht_common::{
    logger::{log, Logger},
    SystemTimeProvider, TimeProvider,
};
use ht_util_parse::SeqDisplay;
use std::sync::{Arc, RwLock};

/// An error which prevents a verdict from being issued at all.
#[derive(Clone, Debug, Display, Eq, PartialEq)]
pub enum Error {
    /// Invalid input: {0}
    InvalidInput(String),
}

impl From<CoreError> for Error {
    fn from(src: CoreError) -> Self {
        match src {
            CoreError::InvalidInput(msg) | CoreError::Encode(msg) => Error::InvalidInput(msg),
        }
    }
}

/// The hierarchical verifier.
///
/// A verifier is shared between threads by reference. The trusted measurement
/// snapshot can be replaced while verifications are in progress; each
/// verification uses the snapshot current when it started.
pub struct Verifier {
    inner_oracle: Arc<dyn SignatureOracle>,
    outer_oracle: Arc<dyn SignatureOracle>,
    trusted: RwLock<Arc<TrustedMeasurements>>,
    tcb_policy: TcbPolicy,
    allow_debug: bool,
    trusted_issuers: Vec<String>,
    time_provider: Arc<dyn TimeProvider>,
    logger: Logger,
}

impl Verifier {
    /// Create a verifier with no allow-lists, the default TCB policy, and
    /// debuggable evidence rejected.
    pub fn new(
        inner_oracle: Arc<dyn SignatureOracle>,
        outer_oracle: Arc<dyn SignatureOracle>,
        logger: Logger,
    ) -> Self {
        Self {
            inner_oracle,
            outer_oracle,
            trusted: RwLock::new(Arc::new(TrustedMeasurements::default())),
            tcb_policy: TcbPolicy::default(),
            allow_debug: false,
            trusted_issuers: Vec::new(),
            time_provider: Arc::new(SystemTimeProvider),
            logger,
        }
    }

    /// Apply a loaded trust configuration.
    pub fn configure(&mut self, config: &VerifierConfig) -> &mut Self {
        self.replace_trusted_measurements(TrustedMeasurements::from(
            &config.trusted_measurements,
        ));
        self.tcb_policy(TcbPolicy::new(config.accept_out_of_date))
            .allow_debug(config.allow_debug)
            .trusted_issuers(config.trusted_issuers.iter().cloned())
    }

    pub fn tcb_policy(&mut self, tcb_policy: TcbPolicy) -> &mut Self {
        self.tcb_policy = tcb_policy;
        self
    }

    pub fn allow_debug(&mut self, allow_debug: bool) -> &mut Self {
        self.allow_debug = allow_debug;
        self
    }

    /// Restrict token endorsements to these issuers. An empty list accepts
    /// any issuer.
    pub fn trusted_issuers<I, S>(&mut self, issuers: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.trusted_issuers = issuers.into_iter().map(Into::into).collect();
        self
    }

    /// Use a different clock for token expiry checks.
    pub fn time_provider(&mut self, time_provider: Arc<dyn TimeProvider>) -> &mut Self {
        self.time_provider = time_provider;
        self
    }

    /// Atomically replace the trusted measurement snapshot.
    pub fn replace_trusted_measurements(&self, trusted: TrustedMeasurements) {
        let trusted = Arc::new(trusted);
        match self.trusted.write() {
            Ok(mut guard) => *guard = trusted,
            Err(poisoned) => *poisoned.into_inner() = trusted,
        }
        log::info!(self.logger, "Trusted measurements replaced");
    }

    /// The current trusted measurement snapshot.
    pub fn trusted_measurements(&self) -> Arc<TrustedMeasurements> {
        match self.trusted.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Verify a decoded composite attestation.
    pub fn verify(&self, composite: &CompositeAttestation) -> Verdict {
        let trusted = self.trusted_measurements();
        let now = match self.time_provider.since_epoch() {
            Ok(now) => Some(now),
            Err(err) => {
                log::warn!(self.logger, "Could not read clock, tokens count as expired: {}", err);
                None
            }
        };
        let ctx = CheckContext {
            inner_oracle: self.inner_oracle.as_ref(),
            outer_oracle: self.outer_oracle.as_ref(),
            trusted: &trusted,
            tcb_policy: self.tcb_policy,
            allow_debug: self.allow_debug,
            trusted_issuers: &self.trusted_issuers,
            now,
            logger: &self.logger,
        };

        let (state, outcome) = Received::new(composite).next(CheckInner(&ctx));
        self.trace(outcome);
        let (state, outcome) = state.next(CheckOuter(&ctx));
        self.trace(outcome);
        let (state, outcome) = state.next(CheckBinding);
        self.trace(outcome);
        let (state, outcome) = state.next(Decide);
        self.trace(outcome);
        let verdict = state.into_verdict();

        log::info!(
            self.logger,
            "Verdict: {}", verdict.overall();
            "purpose" => composite.purpose_tag().as_str(),
            "reasons" => SeqDisplay(verdict.reasons().iter()).to_string()
        );
        verdict
    }

    /// Decode and verify a composite attestation.
    ///
    /// Bytes which do not decode as a canonical composite attestation are
    /// rejected with [`Error::InvalidInput`] before any check runs.
    pub fn verify_bytes(&self, bytes: &[u8]) -> Result<Verdict, Error> {
        let composite = CompositeAttestation::from_bytes(bytes).map_err(|err| {
            log::debug!(self.logger, "Rejected malformed attestation: {}", err);
            Error::from(err)
        })?;
        Ok(self.verify(&composite))
    }

    fn trace(&self, outcome: CheckOutcome) {
        log::trace!(
            self.logger,
            "Check {}: {}",
            outcome.check,
            if outcome.passed { "passed" } else { "failed" }
        );
    }
}

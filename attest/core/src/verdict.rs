// Copyright (c) 2024 The Hierarchical TEE Authors

//! The outcome of verifying a composite attestation.

use crate::TcbStatus;
use displaydoc::Display;
use serde::{Deserialize, Serialize};

/// Which TEE layer a reason refers to.
#[derive(
    Clone, Copy, Debug, Deserialize, Display, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize,
)]
pub enum Layer {
    /// inner
    Inner,
    /// outer
    Outer,
}

/// The overall decision.
#[derive(Clone, Copy, Debug, Deserialize, Display, Eq, Hash, PartialEq, Serialize)]
pub enum Trust {
    /// TRUSTED
    Trusted,
    /// UNTRUSTED
    Untrusted,
}

/// A failing predicate, recorded in a [`Verdict`].
#[derive(Clone, Debug, Deserialize, Display, Eq, Hash, PartialEq, Serialize)]
pub enum Reason {
    /// {0} evidence signature is invalid
    SignatureInvalid(Layer),
    /// {0} signature oracle unavailable
    OracleUnavailable(Layer),
    /// {0} measurements are not in the trusted set
    MeasurementNotTrusted(Layer),
    /// TCB status {0} is not acceptable
    TcbUnacceptable(TcbStatus),
    /// binding between inner and outer evidence failed
    BindingFailed,
    /// nonce or blinding factor omitted
    BlindingOmitted,
    /// {0} attestation token expired
    TokenExpired(Layer),
    /// {0} attestation token issuer is not trusted
    UntrustedIssuer(Layer),
    /// {0} evidence comes from a debuggable environment
    DebuggableEvidence(Layer),
}

/// The result of a hierarchical verification.
///
/// `reasons` lists every failing predicate, in check order. It is empty
/// exactly when the verdict is trusted.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Verdict {
    inner_ok: bool,
    outer_ok: bool,
    binding_ok: bool,
    tcb_acceptable: bool,
    overall: Trust,
    reasons: Vec<Reason>,
}

impl Verdict {
    /// Combine the four predicates and the collected reasons.
    pub fn new(
        inner_ok: bool,
        outer_ok: bool,
        binding_ok: bool,
        tcb_acceptable: bool,
        reasons: Vec<Reason>,
    ) -> Self {
        let overall = if inner_ok && outer_ok && binding_ok && tcb_acceptable {
            Trust::Trusted
        } else {
            Trust::Untrusted
        };
        Self {
            inner_ok,
            outer_ok,
            binding_ok,
            tcb_acceptable,
            overall,
            reasons,
        }
    }

    pub fn inner_ok(&self) -> bool {
        self.inner_ok
    }

    pub fn outer_ok(&self) -> bool {
        self.outer_ok
    }

    pub fn binding_ok(&self) -> bool {
        self.binding_ok
    }

    pub fn tcb_acceptable(&self) -> bool {
        self.tcb_acceptable
    }

    pub fn overall(&self) -> Trust {
        self.overall
    }

    pub fn reasons(&self) -> &[Reason] {
        &self.reasons
    }

    /// Shorthand for `overall() == Trust::Trusted`.
    pub fn is_trusted(&self) -> bool {
        self.overall == Trust::Trusted
    }
}

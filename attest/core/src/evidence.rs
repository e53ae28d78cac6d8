// Copyright (c) 2024 The Hierarchical TEE Authors

//! Attestation evidence produced by one TEE layer.

use crate::{MeasurementSet, ReportSlot, TcbStatus};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A signed token issued by a remote attestation service.
#[derive(Clone, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct AttestationToken {
    /// The service which issued the token.
    pub issuer: String,
    /// Issue time, in seconds since the unix epoch.
    pub issued_at: u64,
    /// Expiry time, in seconds since the unix epoch.
    pub expires_at: u64,
    /// The token in its transmitted form.
    pub encoded: String,
}

impl AttestationToken {
    /// Whether the token has expired at the given time since the unix epoch.
    pub fn is_expired_at(&self, now: Duration) -> bool {
        self.expires_at <= now.as_secs()
    }
}

/// The reference a verifier uses to check who signed a piece of evidence.
#[derive(Clone, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum Endorsement {
    /// A raw hardware quote signature chain, checked locally.
    Quote {
        /// The encoded certificate and signature chain.
        chain: Vec<u8>,
    },
    /// A token from a remote attestation service.
    Token(AttestationToken),
}

impl Endorsement {
    /// The token, if this endorsement is a remote-service token.
    pub fn token(&self) -> Option<&AttestationToken> {
        match self {
            Endorsement::Quote { .. } => None,
            Endorsement::Token(token) => Some(token),
        }
    }
}

/// Evidence from a single TEE layer.
///
/// Fields are only readable once constructed. A tampered copy must be built
/// anew with [`Evidence::builder`].
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Evidence {
    measurements: MeasurementSet,
    embedded_slot: ReportSlot,
    tcb_status: TcbStatus,
    endorsement: Endorsement,
    debuggable: bool,
    blob: Vec<u8>,
}

impl Evidence {
    /// Start building evidence with the fields every layer must supply.
    pub fn builder(
        measurements: MeasurementSet,
        embedded_slot: ReportSlot,
        tcb_status: TcbStatus,
        endorsement: Endorsement,
    ) -> EvidenceBuilder {
        EvidenceBuilder {
            evidence: Evidence {
                measurements,
                embedded_slot,
                tcb_status,
                endorsement,
                debuggable: false,
                blob: Vec::new(),
            },
        }
    }

    /// The measured identity of the environment.
    pub fn measurements(&self) -> &MeasurementSet {
        &self.measurements
    }

    /// The 64-byte value the caller asked the TEE to embed.
    pub fn embedded_slot(&self) -> &ReportSlot {
        &self.embedded_slot
    }

    /// The reported platform patch status.
    pub fn tcb_status(&self) -> TcbStatus {
        self.tcb_status
    }

    /// The signature reference for this evidence.
    pub fn endorsement(&self) -> &Endorsement {
        &self.endorsement
    }

    /// Whether the environment runs with debugging enabled.
    pub fn debuggable(&self) -> bool {
        self.debuggable
    }

    /// The vendor evidence, opaque to this crate.
    pub fn blob(&self) -> &[u8] {
        &self.blob
    }

    /// Copy this evidence into a new builder, e.g. to substitute one field.
    pub fn to_builder(&self) -> EvidenceBuilder {
        EvidenceBuilder {
            evidence: self.clone(),
        }
    }
}

/// A builder for [`Evidence`].
#[derive(Clone, Debug)]
pub struct EvidenceBuilder {
    evidence: Evidence,
}

impl EvidenceBuilder {
    /// Mark the environment as debuggable.
    pub fn debuggable(mut self, debuggable: bool) -> Self {
        self.evidence.debuggable = debuggable;
        self
    }

    /// Attach the vendor evidence.
    pub fn blob(mut self, blob: Vec<u8>) -> Self {
        self.evidence.blob = blob;
        self
    }

    /// Replace the embedded slot.
    pub fn embedded_slot(mut self, slot: ReportSlot) -> Self {
        self.evidence.embedded_slot = slot;
        self
    }

    /// Replace the measurement set.
    pub fn measurements(mut self, measurements: MeasurementSet) -> Self {
        self.evidence.measurements = measurements;
        self
    }

    /// Replace the TCB status.
    pub fn tcb_status(mut self, tcb_status: TcbStatus) -> Self {
        self.evidence.tcb_status = tcb_status;
        self
    }

    /// Replace the endorsement.
    pub fn endorsement(mut self, endorsement: Endorsement) -> Self {
        self.evidence.endorsement = endorsement;
        self
    }

    /// Finish building.
    pub fn build(self) -> Evidence {
        self.evidence
    }
}

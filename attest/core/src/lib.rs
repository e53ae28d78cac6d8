// Copyright (c) 2024 The Hierarchical TEE Authors

//! Data structures shared by the composite attestation assembler and the
//! hierarchical verifier.

mod composite;
mod error;
mod evidence;
mod provider;
mod types;
mod verdict;

pub use crate::{
    composite::CompositeAttestation,
    error::Error,
    evidence::{AttestationToken, Endorsement, Evidence, EvidenceBuilder},
    provider::{EvidenceProvider, ProviderError},
    types::{
        measurement::{MeasurementDigest, MeasurementSet, RegisterValue, MEASUREMENT_DIGEST_LEN},
        nonce::{BlindingFactor, Nonce, SESSION_VALUE_LEN},
        purpose::{PurposeTag, MAX_PURPOSE_TAG_LEN},
        report_slot::{ReportSlot, REPORT_SLOT_LEN},
        tcb::TcbStatus,
    },
    verdict::{Layer, Reason, Trust, Verdict},
};

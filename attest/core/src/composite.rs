// Copyright (c) 2024 The Hierarchical TEE Authors

//! The composite attestation sent to a verifier.

use crate::{BlindingFactor, Error, Evidence, Nonce, PurposeTag};
use ht_util_serial::{deserialize_canonical, serialize};
use serde::{Deserialize, Serialize};

/// Inner and outer evidence, plus the values a verifier needs to recompute
/// the binding between them.
///
/// A composite attestation is transmitted once and consumed once. The
/// blinding factor is disclosed only inside this one-shot exchange.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct CompositeAttestation {
    purpose_tag: PurposeTag,
    nonce: Nonce,
    blinding_factor: BlindingFactor,
    inner: Evidence,
    outer: Evidence,
    created_at: u64,
}

impl CompositeAttestation {
    /// Package the parts of a composite attestation.
    ///
    /// `created_at` is in seconds since the unix epoch.
    pub fn new(
        purpose_tag: PurposeTag,
        nonce: Nonce,
        blinding_factor: BlindingFactor,
        inner: Evidence,
        outer: Evidence,
        created_at: u64,
    ) -> Self {
        Self {
            purpose_tag,
            nonce,
            blinding_factor,
            inner,
            outer,
            created_at,
        }
    }

    pub fn purpose_tag(&self) -> &PurposeTag {
        &self.purpose_tag
    }

    pub fn nonce(&self) -> &Nonce {
        &self.nonce
    }

    pub fn blinding_factor(&self) -> &BlindingFactor {
        &self.blinding_factor
    }

    pub fn inner(&self) -> &Evidence {
        &self.inner
    }

    pub fn outer(&self) -> &Evidence {
        &self.outer
    }

    pub fn created_at(&self) -> u64 {
        self.created_at
    }

    /// Encode as canonical CBOR.
    pub fn to_bytes(&self) -> Result<Vec<u8>, Error> {
        Ok(serialize(self)?)
    }

    /// Decode canonical CBOR.
    ///
    /// Anything malformed, or well-formed but not canonically encoded, is
    /// rejected with [`Error::InvalidInput`].
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
        Ok(deserialize_canonical(bytes)?)
    }
}

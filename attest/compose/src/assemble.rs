// Copyright (c) 2024 The Hierarchical TEE Authors

//! Assembly of a composite attestation from already-produced inner evidence.

use crate::Error;
use ht_attest_binding::{blind, construct, Disclosure};
use ht_attest_core::{CompositeAttestation, Evidence, Layer, ProviderError, PurposeTag, ReportSlot};
use rand_core::{CryptoRng, RngCore};
use subtle::ConstantTimeEq;

/// Bind `inner` into a slot, ask `outer_producer` for outer evidence which
/// embeds that slot, and package both.
///
/// The order is fixed: the slot depends on the inner measurements, so the
/// outer evidence can only be requested after the inner evidence exists.
/// Provider failures are returned as [`Error::EvidenceUnavailable`] and are
/// never retried here. `created_at` is in seconds since the unix epoch.
pub fn assemble<R, F>(
    csprng: &mut R,
    purpose_tag: &PurposeTag,
    inner: Evidence,
    outer_producer: F,
    created_at: u64,
) -> Result<CompositeAttestation, Error>
where
    R: CryptoRng + RngCore,
    F: FnOnce(ReportSlot) -> Result<Evidence, ProviderError>,
{
    let inner_digest = inner.measurements().digest();
    let commitment = construct(csprng, purpose_tag, inner_digest.as_ref())?;
    let (slot, disclosure) = blind(commitment);

    let outer =
        outer_producer(slot).map_err(|err| Error::EvidenceUnavailable(Layer::Outer, err))?;
    if !bool::from(outer.embedded_slot().ct_eq(&slot)) {
        return Err(Error::BindingMismatch);
    }

    let Disclosure {
        purpose_tag,
        nonce,
        blinding_factor,
    } = disclosure;
    Ok(CompositeAttestation::new(
        purpose_tag,
        nonce,
        blinding_factor,
        inner,
        outer,
        created_at,
    ))
}

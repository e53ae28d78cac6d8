// Copyright (c) 2024 The Hierarchical TEE Authors

//! Binding commitments between inner and outer evidence.
//!
//! A commitment is `H(purpose_tag || inner_measurement_digest || nonce ||
//! blinding_factor)`. Everything after the purpose tag has a fixed length, so
//! the concatenation is unambiguous. Its digest, zero padded or truncated to
//! 64 bytes, is the slot the outer layer embeds in its evidence.
//!
//! The nonce and blinding factor are fresh for every commitment, so two slots
//! made for the same inner measurement cannot be linked by anyone who does
//! not also learn the blinding factors.

use digest::Digest;
use ht_attest_core::{BlindingFactor, Error, MeasurementDigest, Nonce, PurposeTag, ReportSlot};
use ht_util_from_random::FromRandom;
use rand_core::{CryptoRng, RngCore};
use sha2::Sha256;

/// A commitment to an inner measurement digest, before blinding.
#[derive(Clone, Debug)]
pub struct BindingCommitment {
    purpose_tag: PurposeTag,
    inner_measurement_digest: MeasurementDigest,
    nonce: Nonce,
    blinding_factor: BlindingFactor,
    commitment_digest: Vec<u8>,
}

impl BindingCommitment {
    pub fn purpose_tag(&self) -> &PurposeTag {
        &self.purpose_tag
    }

    pub fn inner_measurement_digest(&self) -> &MeasurementDigest {
        &self.inner_measurement_digest
    }

    pub fn nonce(&self) -> &Nonce {
        &self.nonce
    }

    pub fn blinding_factor(&self) -> &BlindingFactor {
        &self.blinding_factor
    }

    pub fn commitment_digest(&self) -> &[u8] {
        &self.commitment_digest
    }
}

/// The values a verifier needs to recompute a slot.
#[derive(Clone, Debug)]
pub struct Disclosure {
    pub purpose_tag: PurposeTag,
    pub nonce: Nonce,
    pub blinding_factor: BlindingFactor,
}

/// Commit to an inner measurement digest with SHA-256.
///
/// Fails with [`Error::InvalidInput`] unless `inner_measurement_digest` is
/// exactly 32 bytes.
pub fn construct<R: CryptoRng + RngCore>(
    csprng: &mut R,
    purpose_tag: &PurposeTag,
    inner_measurement_digest: &[u8],
) -> Result<BindingCommitment, Error> {
    construct_with_digest::<Sha256, R>(csprng, purpose_tag, inner_measurement_digest)
}

/// Commit to an inner measurement digest using the hash function `D`.
pub fn construct_with_digest<D: Digest, R: CryptoRng + RngCore>(
    csprng: &mut R,
    purpose_tag: &PurposeTag,
    inner_measurement_digest: &[u8],
) -> Result<BindingCommitment, Error> {
    let inner_measurement_digest = MeasurementDigest::try_from(inner_measurement_digest)?;
    let nonce = Nonce::from_random(csprng);
    let blinding_factor = BlindingFactor::from_random(csprng);
    if nonce.is_omitted() || blinding_factor.is_omitted() {
        return Err(Error::InvalidInput(
            "random source produced an all-zero nonce or blinding factor".to_owned(),
        ));
    }

    let commitment_digest = recompute_with_digest::<D>(
        purpose_tag,
        &inner_measurement_digest,
        &nonce,
        &blinding_factor,
    );
    Ok(BindingCommitment {
        purpose_tag: purpose_tag.clone(),
        inner_measurement_digest,
        nonce,
        blinding_factor,
        commitment_digest,
    })
}

/// Recompute a SHA-256 commitment digest from disclosed values.
pub fn recompute(
    purpose_tag: &PurposeTag,
    inner_measurement_digest: &MeasurementDigest,
    nonce: &Nonce,
    blinding_factor: &BlindingFactor,
) -> Vec<u8> {
    recompute_with_digest::<Sha256>(purpose_tag, inner_measurement_digest, nonce, blinding_factor)
}

/// Recompute a commitment digest from disclosed values using `D`.
pub fn recompute_with_digest<D: Digest>(
    purpose_tag: &PurposeTag,
    inner_measurement_digest: &MeasurementDigest,
    nonce: &Nonce,
    blinding_factor: &BlindingFactor,
) -> Vec<u8> {
    let mut hasher = D::new();
    hasher.update(purpose_tag.as_bytes());
    hasher.update(inner_measurement_digest.as_ref());
    hasher.update(nonce.as_ref());
    hasher.update(blinding_factor.as_ref());
    hasher.finalize().to_vec()
}

/// The slot a verifier expects the outer evidence to embed.
pub fn expected_slot(
    purpose_tag: &PurposeTag,
    inner_measurement_digest: &MeasurementDigest,
    nonce: &Nonce,
    blinding_factor: &BlindingFactor,
) -> ReportSlot {
    slot_from_digest(&recompute(
        purpose_tag,
        inner_measurement_digest,
        nonce,
        blinding_factor,
    ))
}

/// Map a commitment digest of any length onto a 64-byte slot.
pub fn slot_from_digest(commitment_digest: &[u8]) -> ReportSlot {
    ReportSlot::from_digest(commitment_digest)
}

/// Turn a commitment into the slot to embed, and the disclosure which lets a
/// verifier recompute it.
pub fn blind(commitment: BindingCommitment) -> (ReportSlot, Disclosure) {
    let slot = slot_from_digest(&commitment.commitment_digest);
    let disclosure = Disclosure {
        purpose_tag: commitment.purpose_tag,
        nonce: commitment.nonce,
        blinding_factor: commitment.blinding_factor,
    };
    (slot, disclosure)
}

#[cfg(test)]
mod test {
    use super::*;
    use ht_util_test_helper::{get_seeded_rng, run_with_several_seeds};
    use sha2::{Sha384, Sha512};

    fn tag() -> PurposeTag {
        PurposeTag::new("test").unwrap()
    }

    #[test]
    fn rejects_wrong_digest_length() {
        let mut rng = get_seeded_rng();
        for len in [0usize, 31, 33, 48, 64] {
            let digest = vec![0u8; len];
            assert!(
                matches!(construct(&mut rng, &tag(), &digest), Err(Error::InvalidInput(_))),
                "length {len} was accepted"
            );
        }
    }

    #[test]
    fn recompute_matches_construct() {
        run_with_several_seeds(|mut rng| {
            let commitment = construct(&mut rng, &tag(), &[0u8; 32]).unwrap();
            let digest = MeasurementDigest::from([0u8; 32]);
            let recomputed = recompute(
                &tag(),
                &digest,
                commitment.nonce(),
                commitment.blinding_factor(),
            );
            assert_eq!(recomputed, commitment.commitment_digest());

            let expected = expected_slot(
                &tag(),
                &digest,
                commitment.nonce(),
                commitment.blinding_factor(),
            );
            let (slot, disclosure) = blind(commitment);
            assert_eq!(slot, expected);
            assert_eq!(disclosure.purpose_tag, tag());
        });
    }

    #[test]
    fn commitment_depends_on_every_input() {
        let digest = MeasurementDigest::from([4u8; 32]);
        let nonce = Nonce::from([5u8; 32]);
        let blinding = BlindingFactor::from([6u8; 32]);
        let base = recompute(&tag(), &digest, &nonce, &blinding);

        let other_tag = PurposeTag::new("other").unwrap();
        assert_ne!(base, recompute(&other_tag, &digest, &nonce, &blinding));
        let other_digest = MeasurementDigest::from([7u8; 32]);
        assert_ne!(base, recompute(&tag(), &other_digest, &nonce, &blinding));
        let other_nonce = Nonce::from([8u8; 32]);
        assert_ne!(base, recompute(&tag(), &digest, &other_nonce, &blinding));
        let other_blinding = BlindingFactor::from([9u8; 32]);
        assert_ne!(base, recompute(&tag(), &digest, &nonce, &other_blinding));
    }

    #[test]
    fn sha256_slot_is_zero_padded() {
        let commitment = construct(&mut get_seeded_rng(), &tag(), &[1u8; 32]).unwrap();
        assert_eq!(commitment.commitment_digest().len(), 32);
        let digest = commitment.commitment_digest().to_vec();
        let (slot, _) = blind(commitment);
        assert_eq!(&slot.as_bytes()[..32], &digest[..]);
        assert_eq!(&slot.as_bytes()[32..], &[0u8; 32][..]);
    }

    #[test]
    fn sha384_slot_is_zero_padded() {
        let commitment =
            construct_with_digest::<Sha384, _>(&mut get_seeded_rng(), &tag(), &[1u8; 32])
                .unwrap();
        let digest = commitment.commitment_digest().to_vec();
        assert_eq!(digest.len(), 48);
        let (slot, _) = blind(commitment);
        assert_eq!(&slot.as_bytes()[..48], &digest[..]);
        assert_eq!(&slot.as_bytes()[48..], &[0u8; 16][..]);
    }

    #[test]
    fn sha512_slot_is_the_digest() {
        let commitment =
            construct_with_digest::<Sha512, _>(&mut get_seeded_rng(), &tag(), &[1u8; 32])
                .unwrap();
        let digest = commitment.commitment_digest().to_vec();
        assert_eq!(digest.len(), 64);
        let (slot, _) = blind(commitment);
        assert_eq!(&slot.as_bytes()[..], &digest[..]);
    }

    #[test]
    fn oversized_digest_keeps_prefix() {
        let digest: Vec<u8> = (0u8..80).collect();
        let slot = slot_from_digest(&digest);
        assert_eq!(&slot.as_bytes()[..], &digest[..64]);
    }
}

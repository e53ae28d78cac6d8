// Copyright (c) 2024 The Hierarchical TEE Authors

//! Measurement registers and their digest.
//!
//! A [`MeasurementSet`] maps register names (e.g. `MRTD`, `RTMR0`,
//! `MRENCLAVE`) to their raw values. Registers are kept ordered by name, so
//! the set has exactly one canonical encoding and one digest.

use crate::Error;
use core::{
    fmt::{Display, Formatter, Result as FmtResult},
    iter::FromIterator,
};
use hex_fmt::HexFmt;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::{btree_map, BTreeMap};

/// The length of a [`MeasurementDigest`], in bytes.
pub const MEASUREMENT_DIGEST_LEN: usize = 32;

/// The domain separator mixed into every measurement-set digest.
const MEASUREMENT_SET_DOMAIN: &[u8] = b"ht-measurement-set-v1";

/// The raw contents of one measurement register.
#[derive(Clone, Debug, Default, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct RegisterValue(Vec<u8>);

impl RegisterValue {
    /// Borrow the raw register bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl From<Vec<u8>> for RegisterValue {
    fn from(src: Vec<u8>) -> Self {
        Self(src)
    }
}

impl From<&[u8]> for RegisterValue {
    fn from(src: &[u8]) -> Self {
        Self(src.to_vec())
    }
}

impl<const N: usize> From<[u8; N]> for RegisterValue {
    fn from(src: [u8; N]) -> Self {
        Self(src.to_vec())
    }
}

impl AsRef<[u8]> for RegisterValue {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl Display for RegisterValue {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        write!(f, "{}", HexFmt(&self.0))
    }
}

/// The SHA-256 digest of a [`MeasurementSet`].
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct MeasurementDigest(
    #[serde(with = "ht_util_serial::fixed_bytes")] [u8; MEASUREMENT_DIGEST_LEN],
);

impl MeasurementDigest {
    /// Borrow the digest bytes.
    pub fn as_bytes(&self) -> &[u8; MEASUREMENT_DIGEST_LEN] {
        &self.0
    }
}

impl From<[u8; MEASUREMENT_DIGEST_LEN]> for MeasurementDigest {
    fn from(src: [u8; MEASUREMENT_DIGEST_LEN]) -> Self {
        Self(src)
    }
}

impl TryFrom<&[u8]> for MeasurementDigest {
    type Error = Error;

    fn try_from(src: &[u8]) -> Result<Self, Error> {
        <[u8; MEASUREMENT_DIGEST_LEN]>::try_from(src)
            .map(Self)
            .map_err(|_| {
                Error::InvalidInput(format!(
                    "measurement digest must be {} bytes, got {}",
                    MEASUREMENT_DIGEST_LEN,
                    src.len()
                ))
            })
    }
}

impl AsRef<[u8]> for MeasurementDigest {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl Display for MeasurementDigest {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        write!(f, "{}", HexFmt(&self.0))
    }
}

/// An ordered map of register name to register value.
#[derive(Clone, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(transparent)]
pub struct MeasurementSet(BTreeMap<String, RegisterValue>);

impl MeasurementSet {
    /// Create an empty measurement set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a register, returning its previous value if there was one.
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        value: impl Into<RegisterValue>,
    ) -> Option<RegisterValue> {
        self.0.insert(name.into(), value.into())
    }

    /// Look up a register by name.
    pub fn get(&self, name: &str) -> Option<&RegisterValue> {
        self.0.get(name)
    }

    /// Iterate over the registers in name order.
    pub fn iter(&self) -> btree_map::Iter<'_, String, RegisterValue> {
        self.0.iter()
    }

    /// The number of registers in the set.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the set contains no registers.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Compute the digest of this measurement set.
    ///
    /// The digest covers a domain separator, the register count, and each
    /// (name, value) pair in name order, each prefixed with its length as a
    /// little-endian u64.
    pub fn digest(&self) -> MeasurementDigest {
        let mut hasher = Sha256::new();
        hasher.update(MEASUREMENT_SET_DOMAIN);
        hasher.update((self.0.len() as u64).to_le_bytes());
        for (name, value) in &self.0 {
            hasher.update((name.len() as u64).to_le_bytes());
            hasher.update(name.as_bytes());
            hasher.update((value.0.len() as u64).to_le_bytes());
            hasher.update(&value.0);
        }
        let mut digest = [0u8; MEASUREMENT_DIGEST_LEN];
        digest.copy_from_slice(&hasher.finalize());
        MeasurementDigest(digest)
    }
}

impl<K: Into<String>, V: Into<RegisterValue>> FromIterator<(K, V)> for MeasurementSet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(name, value)| (name.into(), value.into()))
                .collect(),
        )
    }
}

impl<'a> IntoIterator for &'a MeasurementSet {
    type Item = (&'a String, &'a RegisterValue);
    type IntoIter = btree_map::Iter<'a, String, RegisterValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn sample() -> MeasurementSet {
        [("MRTD", [1u8; 48]), ("RTMR0", [2u8; 48])]
            .into_iter()
            .collect()
    }

    #[test]
    fn digest_ignores_insertion_order() {
        let mut forward = MeasurementSet::new();
        forward.insert("MRTD", [1u8; 48]);
        forward.insert("RTMR0", [2u8; 48]);

        let mut backward = MeasurementSet::new();
        backward.insert("RTMR0", [2u8; 48]);
        backward.insert("MRTD", [1u8; 48]);

        assert_eq!(forward.digest(), backward.digest());
        assert_eq!(forward.digest(), sample().digest());
    }

    #[test]
    fn digest_changes_with_any_register() {
        let base = sample().digest();

        let mut changed_value = sample();
        changed_value.insert("RTMR0", [3u8; 48]);
        assert_ne!(base, changed_value.digest());

        let mut extra_register = sample();
        extra_register.insert("RTMR1", [0u8; 48]);
        assert_ne!(base, extra_register.digest());
    }

    #[test]
    fn length_prefix_prevents_boundary_shifts() {
        let a: MeasurementSet = [("AB", vec![1u8]), ("C", vec![2u8])].into_iter().collect();
        let b: MeasurementSet = [("A", vec![1u8]), ("BC", vec![2u8])].into_iter().collect();
        assert_ne!(a.digest(), b.digest());
    }

    #[test]
    fn empty_set_has_stable_digest() {
        assert_eq!(MeasurementSet::new().digest(), MeasurementSet::default().digest());
        assert_ne!(MeasurementSet::new().digest(), MeasurementDigest::default());
    }

    #[test]
    fn digest_from_slice_checks_length() {
        assert!(MeasurementDigest::try_from(&[0u8; 32][..]).is_ok());
        assert!(matches!(
            MeasurementDigest::try_from(&[0u8; 31][..]),
            Err(Error::InvalidInput(_))
        ));
    }
}

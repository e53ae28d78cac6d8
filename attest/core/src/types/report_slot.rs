// Copyright (c) 2024 The Hierarchical TEE Authors

//! The 64-byte user-data slot embedded in a hardware report.

use crate::Error;
use core::fmt::{Debug, Display, Formatter, Result as FmtResult};
use hex_fmt::HexFmt;
use serde::{Deserialize, Serialize};
use subtle::{Choice, ConstantTimeEq};

/// The size of a report slot, in bytes.
pub const REPORT_SLOT_LEN: usize = 64;

/// The opaque 64-byte value a caller asks a TEE to embed in its report.
///
/// Equality is always evaluated in constant time.
#[derive(Clone, Copy, Deserialize, Eq, Serialize)]
#[serde(transparent)]
pub struct ReportSlot(#[serde(with = "ht_util_serial::fixed_bytes")] [u8; REPORT_SLOT_LEN]);

impl ReportSlot {
    /// Derive a slot from a digest of any length.
    ///
    /// Shorter digests are zero-padded on the right. Longer digests are
    /// truncated to their first 64 bytes.
    pub fn from_digest(digest: &[u8]) -> Self {
        let mut slot = [0u8; REPORT_SLOT_LEN];
        let len = digest.len().min(REPORT_SLOT_LEN);
        slot[..len].copy_from_slice(&digest[..len]);
        Self(slot)
    }

    /// Borrow the slot bytes.
    pub fn as_bytes(&self) -> &[u8; REPORT_SLOT_LEN] {
        &self.0
    }

    /// Copy out the slot bytes.
    pub fn to_bytes(&self) -> [u8; REPORT_SLOT_LEN] {
        self.0
    }
}

impl Default for ReportSlot {
    fn default() -> Self {
        Self([0u8; REPORT_SLOT_LEN])
    }
}

impl From<[u8; REPORT_SLOT_LEN]> for ReportSlot {
    fn from(src: [u8; REPORT_SLOT_LEN]) -> Self {
        Self(src)
    }
}

impl TryFrom<&[u8]> for ReportSlot {
    type Error = Error;

    fn try_from(src: &[u8]) -> Result<Self, Error> {
        <[u8; REPORT_SLOT_LEN]>::try_from(src)
            .map(Self)
            .map_err(|_| {
                Error::InvalidInput(format!(
                    "report slot must be {} bytes, got {}",
                    REPORT_SLOT_LEN,
                    src.len()
                ))
            })
    }
}

impl AsRef<[u8]> for ReportSlot {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl ConstantTimeEq for ReportSlot {
    fn ct_eq(&self, other: &Self) -> Choice {
        self.0[..].ct_eq(&other.0[..])
    }
}

impl PartialEq for ReportSlot {
    fn eq(&self, other: &Self) -> bool {
        self.ct_eq(other).into()
    }
}

impl Debug for ReportSlot {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        write!(f, "ReportSlot({})", HexFmt(&self.0))
    }
}

impl Display for ReportSlot {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        write!(f, "{}", HexFmt(&self.0))
    }
}

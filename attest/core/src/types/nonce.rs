// Copyright (c) 2024 The Hierarchical TEE Authors

//! Per-session random values disclosed to the verifier.
//!
//! Neither type prints its contents through `Debug`, so they cannot leak into
//! logs by accident.

use crate::Error;
use core::fmt::{Debug, Formatter, Result as FmtResult};
use ht_util_from_random::FromRandom;
use rand_core::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use subtle::{Choice, ConstantTimeEq};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// The length of a [`Nonce`] or [`BlindingFactor`], in bytes.
pub const SESSION_VALUE_LEN: usize = 32;

macro_rules! impl_session_value {
    ($($name:ident;)*) => {$(
        impl $name {
            /// Borrow the raw bytes.
            pub fn as_bytes(&self) -> &[u8; SESSION_VALUE_LEN] {
                &self.0
            }

            /// Whether every byte is zero, which marks the value as omitted.
            pub fn is_omitted(&self) -> bool {
                self.0[..].ct_eq(&[0u8; SESSION_VALUE_LEN][..]).into()
            }
        }

        impl FromRandom for $name {
            fn from_random<R: CryptoRng + RngCore>(csprng: &mut R) -> Self {
                Self(<[u8; SESSION_VALUE_LEN]>::from_random(csprng))
            }
        }

        impl From<[u8; SESSION_VALUE_LEN]> for $name {
            fn from(src: [u8; SESSION_VALUE_LEN]) -> Self {
                Self(src)
            }
        }

        impl TryFrom<&[u8]> for $name {
            type Error = Error;

            fn try_from(src: &[u8]) -> Result<Self, Error> {
                <[u8; SESSION_VALUE_LEN]>::try_from(src)
                    .map(Self)
                    .map_err(|_| {
                        Error::InvalidInput(format!(
                            "{} must be {} bytes, got {}",
                            stringify!($name),
                            SESSION_VALUE_LEN,
                            src.len()
                        ))
                    })
            }
        }

        impl AsRef<[u8]> for $name {
            fn as_ref(&self) -> &[u8] {
                &self.0
            }
        }

        impl ConstantTimeEq for $name {
            fn ct_eq(&self, other: &Self) -> Choice {
                self.0[..].ct_eq(&other.0[..])
            }
        }

        impl PartialEq for $name {
            fn eq(&self, other: &Self) -> bool {
                self.ct_eq(other).into()
            }
        }

        impl Eq for $name {}

        impl Debug for $name {
            fn fmt(&self, f: &mut Formatter) -> FmtResult {
                write!(f, "{}(..)", stringify!($name))
            }
        }
    )*}
}

/// A fresh random value which makes each composite attestation unique.
#[derive(Clone, Copy, Deserialize, Serialize)]
#[serde(transparent)]
pub struct Nonce(#[serde(with = "ht_util_serial::fixed_bytes")] [u8; SESSION_VALUE_LEN]);

/// A fresh random value which hides the inner measurement digest inside the
/// binding commitment.
#[derive(Clone, Deserialize, Serialize, Zeroize, ZeroizeOnDrop)]
#[serde(transparent)]
pub struct BlindingFactor(
    #[serde(with = "ht_util_serial::fixed_bytes")] [u8; SESSION_VALUE_LEN],
);

impl_session_value! {
    Nonce;
    BlindingFactor;
}

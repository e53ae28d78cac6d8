// Copyright (c) 2024 The Hierarchical TEE Authors

//! Serde `with` helpers for fixed-size byte arrays.
//!
//! serde only derives impls for arrays up to 32 elements, and encodes those as
//! sequences of integers. This module encodes `[u8; N]` as a single CBOR byte
//! string of exactly `N` bytes instead:
//!
//! ```ignore
//! #[derive(Serialize, Deserialize)]
//! struct Slot {
//!     #[serde(with = "ht_util_serial::fixed_bytes")]
//!     bytes: [u8; 64],
//! }
//! ```

use core::{fmt, marker::PhantomData};
use serde::{
    de::{Error, SeqAccess, Visitor},
    Deserializer, Serializer,
};

/// Serialize a fixed-size byte array as a byte string.
pub fn serialize<S, const N: usize>(bytes: &[u8; N], serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_bytes(&bytes[..])
}

/// Deserialize a byte string of exactly `N` bytes.
pub fn deserialize<'de, D, const N: usize>(deserializer: D) -> Result<[u8; N], D::Error>
where
    D: Deserializer<'de>,
{
    deserializer.deserialize_bytes(FixedBytesVisitor::<N>(PhantomData))
}

struct FixedBytesVisitor<const N: usize>(PhantomData<[u8; N]>);

impl<'de, const N: usize> Visitor<'de> for FixedBytesVisitor<N> {
    type Value = [u8; N];

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        write!(formatter, "a byte string of length {N}")
    }

    fn visit_bytes<E: Error>(self, value: &[u8]) -> Result<Self::Value, E> {
        <[u8; N]>::try_from(value).map_err(|_| E::invalid_length(value.len(), &self))
    }

    fn visit_borrowed_bytes<E: Error>(self, value: &'de [u8]) -> Result<Self::Value, E> {
        self.visit_bytes(value)
    }

    fn visit_byte_buf<E: Error>(self, value: Vec<u8>) -> Result<Self::Value, E> {
        self.visit_bytes(&value)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
        let mut result = [0u8; N];
        for (idx, byte) in result.iter_mut().enumerate() {
            *byte = seq
                .next_element()?
                .ok_or_else(|| A::Error::invalid_length(idx, &self))?;
        }
        if seq.next_element::<u8>()?.is_some() {
            return Err(A::Error::invalid_length(N + 1, &self));
        }
        Ok(result)
    }
}

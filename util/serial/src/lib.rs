// Copyright (c) 2024 The Hierarchical TEE Authors

#![doc = include_str!("../README.md")]

pub mod fixed_bytes;

use displaydoc::Display;
use serde::{de::DeserializeOwned, Serialize};

// We put a new-type around serde_cbor::Error in `mod decode` and `mod encode`,
// so callers never need to depend on serde_cbor directly.
pub mod decode {
    use displaydoc::Display;

    /// Cbor Decode Error: {0}
    #[derive(Debug, Display)]
    pub struct Error(serde_cbor::Error);

    impl From<serde_cbor::Error> for Error {
        fn from(src: serde_cbor::Error) -> Self {
            Self(src)
        }
    }
}

pub mod encode {
    use displaydoc::Display;

    /// Cbor Encode Error: {0}
    #[derive(Debug, Display)]
    pub struct Error(serde_cbor::Error);

    impl From<serde_cbor::Error> for Error {
        fn from(src: serde_cbor::Error) -> Self {
            Self(src)
        }
    }
}

/// An error from [`deserialize_canonical`].
#[derive(Debug, Display)]
pub enum CanonicalError {
    /// {0}
    Decode(decode::Error),
    /// {0}
    Encode(encode::Error),
    /// The input is well-formed but not in canonical encoding
    NotCanonical,
}

impl From<decode::Error> for CanonicalError {
    fn from(src: decode::Error) -> Self {
        Self::Decode(src)
    }
}

impl From<encode::Error> for CanonicalError {
    fn from(src: encode::Error) -> Self {
        Self::Encode(src)
    }
}

/// Serialize the given data structure.
///
/// Serialization can fail if `T`'s implementation of `Serialize` decides to
/// fail.
pub fn serialize<T: ?Sized>(value: &T) -> Result<Vec<u8>, encode::Error>
where
    T: Serialize,
{
    Ok(serde_cbor::to_vec(&value)?)
}

/// Deserialize the given bytes to a data structure.
pub fn deserialize<'a, T>(bytes: &'a [u8]) -> Result<T, decode::Error>
where
    T: serde::de::Deserialize<'a>,
{
    Ok(serde_cbor::from_slice(bytes)?)
}

/// Deserialize the given bytes, and fail unless re-serializing the result
/// reproduces the input exactly.
pub fn deserialize_canonical<T>(bytes: &[u8]) -> Result<T, CanonicalError>
where
    T: DeserializeOwned + Serialize,
{
    let value: T = deserialize(bytes)?;
    if serialize(&value)? != bytes {
        return Err(CanonicalError::NotCanonical);
    }
    Ok(value)
}

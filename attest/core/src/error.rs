// Copyright (c) 2024 The Hierarchical TEE Authors

//! Errors raised while constructing or decoding attestation data.

use displaydoc::Display;
use ht_util_serial::{encode, CanonicalError};
use serde::{Deserialize, Serialize};

/// An enumeration of errors which can occur while building, encoding or
/// decoding attestation structures.
#[derive(Clone, Debug, Deserialize, Display, Eq, PartialEq, Serialize)]
pub enum Error {
    /// Invalid input: {0}
    InvalidInput(String),
    /// Could not encode structure: {0}
    Encode(String),
}

impl From<CanonicalError> for Error {
    fn from(src: CanonicalError) -> Self {
        Error::InvalidInput(src.to_string())
    }
}

impl From<encode::Error> for Error {
    fn from(src: encode::Error) -> Self {
        Error::Encode(src.to_string())
    }
}

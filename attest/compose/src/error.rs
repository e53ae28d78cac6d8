// Copyright (c) 2024 The Hierarchical TEE Authors

//! Errors which abort the assembly of a composite attestation.

use displaydoc::Display;
use ht_attest_core::{Error as CoreError, Layer, ProviderError};
use ht_common::TimeProviderError;

/// An enumeration of errors which can occur while assembling a composite
/// attestation.
#[derive(Clone, Debug, Display, Eq, PartialEq)]
pub enum Error {
    /// Invalid input: {0}
    InvalidInput(String),
    /// The {0} evidence is unavailable: {1}
    EvidenceUnavailable(Layer, ProviderError),
    /// The outer evidence does not embed the requested slot
    BindingMismatch,
    /// Could not read the current time: {0}
    Time(TimeProviderError),
}

impl Error {
    /// Whether assembling again, with fresh randomness, might succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Error::EvidenceUnavailable(_, err) => err.is_transient(),
            Error::InvalidInput(_) | Error::BindingMismatch | Error::Time(_) => false,
        }
    }
}

impl From<CoreError> for Error {
    fn from(src: CoreError) -> Self {
        match src {
            CoreError::InvalidInput(msg) | CoreError::Encode(msg) => Error::InvalidInput(msg),
        }
    }
}

impl From<TimeProviderError> for Error {
    fn from(src: TimeProviderError) -> Self {
        Error::Time(src)
    }
}

// Copyright (c) 2024 The Hierarchical TEE Authors

//! Errors from the verifier service and its client.

use displaydoc::Display;
use ht_attest_core::Error as CoreError;
use ht_util_serial::decode;
use std::io;

/// An error which stops the service from starting.
#[derive(Debug, Display)]
pub enum ServerError {
    /// Invalid server configuration: {0}
    Config(String),
    /// I/O error: {0}
    Io(io::Error),
    /// Could not spawn thread: {0}
    ThreadSpawn(io::Error),
    /// A service thread panicked: {0}
    JoinFailed(String),
    /// Metrics: {0}
    Metrics(prometheus::Error),
}

impl From<io::Error> for ServerError {
    fn from(src: io::Error) -> Self {
        ServerError::Io(src)
    }
}

impl From<prometheus::Error> for ServerError {
    fn from(src: prometheus::Error) -> Self {
        ServerError::Metrics(src)
    }
}

/// An error a client can see while submitting an attestation.
#[derive(Debug, Display)]
pub enum ClientError {
    /// I/O error: {0}
    Io(io::Error),
    /// Could not encode the attestation: {0}
    Encode(CoreError),
    /// Could not decode the response: {0}
    Decode(decode::Error),
}

impl From<io::Error> for ClientError {
    fn from(src: io::Error) -> Self {
        ClientError::Io(src)
    }
}

impl From<CoreError> for ClientError {
    fn from(src: CoreError) -> Self {
        ClientError::Encode(src)
    }
}

impl From<decode::Error> for ClientError {
    fn from(src: decode::Error) -> Self {
        ClientError::Decode(src)
    }
}

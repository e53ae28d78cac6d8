// Copyright (c) 2024 The Hierarchical TEE Authors

//! The service response.
//!
//! A request is the canonical CBOR encoding of one composite attestation. The
//! client half-closes the connection after sending it, and the service answers
//! with one CBOR-encoded [`Response`] before closing.

use ht_attest_verifier::Verdict;
use serde::{Deserialize, Serialize};

/// The answer to one request.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum Response {
    /// The attestation was decoded and checked.
    Verdict {
        verdict: Verdict,
        verification_time_ms: u64,
    },
    /// The request could not be checked at all.
    Rejected { reason: String },
}

impl Response {
    /// The verdict, if the request was checked.
    pub fn verdict(&self) -> Option<&Verdict> {
        match self {
            Response::Verdict { verdict, .. } => Some(verdict),
            Response::Rejected { .. } => None,
        }
    }
}

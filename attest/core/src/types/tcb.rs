// Copyright (c) 2024 The Hierarchical TEE Authors

//! The platform's trusted computing base patch status.

use core::str::FromStr;
use displaydoc::Display;
use serde::{Deserialize, Serialize};

/// The TCB status an attestation service reports for a platform.
#[derive(
    Clone, Copy, Debug, Deserialize, Display, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize,
)]
pub enum TcbStatus {
    /// UpToDate
    UpToDate,
    /// SWHardeningNeeded
    #[serde(rename = "SWHardeningNeeded")]
    SwHardeningNeeded,
    /// OutOfDate
    OutOfDate,
    /// Revoked
    Revoked,
    /// Unknown
    Unknown,
}

impl FromStr for TcbStatus {
    type Err = String;

    fn from_str(src: &str) -> Result<Self, String> {
        match src {
            "UpToDate" => Ok(TcbStatus::UpToDate),
            "SWHardeningNeeded" => Ok(TcbStatus::SwHardeningNeeded),
            "OutOfDate" => Ok(TcbStatus::OutOfDate),
            "Revoked" => Ok(TcbStatus::Revoked),
            "Unknown" => Ok(TcbStatus::Unknown),
            other => Err(format!("unknown TCB status: {other}")),
        }
    }
}

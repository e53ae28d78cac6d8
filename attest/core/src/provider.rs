// Copyright (c) 2024 The Hierarchical TEE Authors

//! The interface to a TEE layer which can produce evidence.

use crate::{Evidence, ReportSlot};
use displaydoc::Display;
use serde::{Deserialize, Serialize};
use std::{sync::Arc, time::Duration};

/// An error an [`EvidenceProvider`] can report.
#[derive(Clone, Debug, Deserialize, Display, Eq, PartialEq, Serialize)]
pub enum ProviderError {
    /// The attestation device is unavailable: {0}
    DeviceUnavailable(String),
    /// Permission to use the attestation device was denied: {0}
    PermissionDenied(String),
    /// The remote attestation service returned an error: {0}
    RemoteServiceError(String),
    /// No evidence was produced within {0:?}
    Timeout(Duration),
}

impl ProviderError {
    /// Whether a fresh attempt might succeed.
    ///
    /// A permission failure will not go away on its own.
    pub fn is_transient(&self) -> bool {
        !matches!(self, ProviderError::PermissionDenied(_))
    }
}

/// Something which can produce evidence embedding a caller-chosen slot.
pub trait EvidenceProvider: Send + Sync {
    /// Produce evidence whose embedded slot is `slot`.
    ///
    /// Implementations should give up after `timeout`; callers enforce the
    /// bound regardless.
    fn get_evidence(&self, slot: &ReportSlot, timeout: Duration)
        -> Result<Evidence, ProviderError>;
}

impl<T: EvidenceProvider + ?Sized> EvidenceProvider for Arc<T> {
    fn get_evidence(
        &self,
        slot: &ReportSlot,
        timeout: Duration,
    ) -> Result<Evidence, ProviderError> {
        (**self).get_evidence(slot, timeout)
    }
}

impl<T: EvidenceProvider + ?Sized> EvidenceProvider for Box<T> {
    fn get_evidence(
        &self,
        slot: &ReportSlot,
        timeout: Duration,
    ) -> Result<Evidence, ProviderError> {
        (**self).get_evidence(slot, timeout)
    }
}

// Copyright (c) 2024 The Hierarchical TEE Authors

//! Which TCB statuses the verifier accepts.

use ht_attest_core::TcbStatus;
use serde::{Deserialize, Serialize};

/// The TCB acceptance policy.
///
/// `UpToDate` and `SWHardeningNeeded` are always acceptable. `OutOfDate` is
/// acceptable only when configured. `Revoked` and `Unknown` never are.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct TcbPolicy {
    accept_out_of_date: bool,
}

impl TcbPolicy {
    /// Create a policy.
    pub fn new(accept_out_of_date: bool) -> Self {
        Self { accept_out_of_date }
    }

    /// Whether `status` passes this policy.
    pub fn is_acceptable(&self, status: TcbStatus) -> bool {
        match status {
            TcbStatus::UpToDate | TcbStatus::SwHardeningNeeded => true,
            TcbStatus::OutOfDate => self.accept_out_of_date,
            TcbStatus::Revoked | TcbStatus::Unknown => false,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const ALL: [TcbStatus; 5] = [
        TcbStatus::UpToDate,
        TcbStatus::SwHardeningNeeded,
        TcbStatus::OutOfDate,
        TcbStatus::Revoked,
        TcbStatus::Unknown,
    ];

    #[test]
    fn default_policy() {
        let policy = TcbPolicy::default();
        let accepted: Vec<TcbStatus> = ALL
            .into_iter()
            .filter(|status| policy.is_acceptable(*status))
            .collect();
        assert_eq!(
            accepted,
            vec![TcbStatus::UpToDate, TcbStatus::SwHardeningNeeded]
        );
    }

    #[test]
    fn revoked_never_and_up_to_date_always() {
        for accept_out_of_date in [false, true] {
            let policy = TcbPolicy::new(accept_out_of_date);
            assert!(!policy.is_acceptable(TcbStatus::Revoked));
            assert!(!policy.is_acceptable(TcbStatus::Unknown));
            assert!(policy.is_acceptable(TcbStatus::UpToDate));
            assert_eq!(
                policy.is_acceptable(TcbStatus::OutOfDate),
                accept_out_of_date
            );
        }
    }
}

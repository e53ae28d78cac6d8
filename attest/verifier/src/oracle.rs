// Copyright (c) 2024 The Hierarchical TEE Authors

//! Signature verification for a single layer's evidence.

use displaydoc::Display;
use ht_attest_core::{Endorsement, Evidence};
use std::sync::Arc;

/// An error from a [`SignatureOracle`] which says nothing about the evidence
/// itself.
#[derive(Clone, Debug, Display, Eq, PartialEq)]
pub enum OracleError {
    /// Signature oracle unavailable: {0}
    Unavailable(String),
}

/// A trusted party which can tell whether a piece of evidence carries a
/// valid signature chain.
pub trait SignatureOracle: Send + Sync {
    /// `Ok(true)` when the endorsement is valid for this evidence, `Ok(false)`
    /// when it is not, and `Err` when the oracle could not decide.
    fn verify(&self, evidence: &Evidence) -> Result<bool, OracleError>;
}

impl<T: SignatureOracle + ?Sized> SignatureOracle for Arc<T> {
    fn verify(&self, evidence: &Evidence) -> Result<bool, OracleError> {
        (**self).verify(evidence)
    }
}

/// An oracle which only checks that an endorsement is well formed.
///
/// A quote must carry a non-empty chain. A token must name an issuer, must
/// not expire before it was issued, and must have three non-empty
/// dot-separated parts. No signature is checked.
#[derive(Clone, Copy, Debug, Default)]
pub struct StructuralOracle;

impl SignatureOracle for StructuralOracle {
    fn verify(&self, evidence: &Evidence) -> Result<bool, OracleError> {
        Ok(match evidence.endorsement() {
            Endorsement::Quote { chain } => !chain.is_empty(),
            Endorsement::Token(token) => {
                let parts: Vec<&str> = token.encoded.split('.').collect();
                !token.issuer.is_empty()
                    && token.issued_at <= token.expires_at
                    && parts.len() == 3
                    && parts.iter().all(|part| !part.is_empty())
            }
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use ht_attest_core::{AttestationToken, MeasurementSet, ReportSlot, TcbStatus};

    fn evidence(endorsement: Endorsement) -> Evidence {
        Evidence::builder(
            MeasurementSet::new(),
            ReportSlot::default(),
            TcbStatus::UpToDate,
            endorsement,
        )
        .build()
    }

    fn token(encoded: &str) -> Endorsement {
        Endorsement::Token(AttestationToken {
            issuer: "https://portal.trustauthority.intel.com".to_owned(),
            issued_at: 10,
            expires_at: 20,
            encoded: encoded.to_owned(),
        })
    }

    #[test]
    fn quotes_need_a_chain() {
        let oracle = StructuralOracle;
        assert!(oracle
            .verify(&evidence(Endorsement::Quote { chain: vec![1] }))
            .unwrap());
        assert!(!oracle
            .verify(&evidence(Endorsement::Quote { chain: vec![] }))
            .unwrap());
    }

    #[test]
    fn tokens_need_three_parts() {
        let oracle = StructuralOracle;
        assert!(oracle.verify(&evidence(token("a.b.c"))).unwrap());
        assert!(!oracle.verify(&evidence(token("a.b"))).unwrap());
        assert!(!oracle.verify(&evidence(token("a..c"))).unwrap());
        assert!(!oracle.verify(&evidence(token("a.b.c.d"))).unwrap());
    }

    #[test]
    fn tokens_need_sane_times() {
        let mut endorsement = token("a.b.c");
        if let Endorsement::Token(ref mut token) = endorsement {
            token.expires_at = 5;
        }
        assert!(!StructuralOracle.verify(&evidence(endorsement)).unwrap());
    }
}

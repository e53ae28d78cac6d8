// Copyright (c) 2024 The Hierarchical TEE Authors

//! Cross-session linkability analysis.
//!
//! Given several composite attestations produced by one platform, find the
//! fields which are identical in all of them (and so link them together) and
//! the fields which vary. Stable code-identity measurements are expected. A
//! repeated slot, nonce or blinding factor is a privacy failure.

use displaydoc::Display;
use ht_attest_core::{CompositeAttestation, Endorsement, Evidence, Layer};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// How much a stable field reveals.
#[derive(
    Clone, Copy, Debug, Deserialize, Display, Eq, Ord, PartialEq, PartialOrd, Serialize,
)]
pub enum Risk {
    /// expected
    Expected,
    /// low
    Low,
    /// medium
    Medium,
    /// high
    High,
    /// critical
    Critical,
}

/// One field, and how many distinct values it took.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct FieldObservation {
    pub field: String,
    pub distinct_values: usize,
    pub risk: Risk,
}

/// A property of the series which defeats unlinkability.
#[derive(Clone, Debug, Deserialize, Display, Eq, PartialEq, Serialize)]
pub enum PrivacyConcern {
    /// The same report slot appears in {0} attestations
    ReusedSlot(usize),
    /// The same nonce appears in {0} attestations
    ReusedNonce(usize),
    /// The same blinding factor appears in {0} attestations
    ReusedBlindingFactor(usize),
}

/// The outcome of [`analyze`].
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct LinkabilityReport {
    pub total_attestations: usize,
    /// Fields with one value across the whole series, most revealing first.
    pub linkable_fields: Vec<FieldObservation>,
    /// Fields with more than one value.
    pub variable_fields: Vec<FieldObservation>,
    pub privacy_concerns: Vec<PrivacyConcern>,
}

impl LinkabilityReport {
    /// Whether `field` was identical across the series.
    pub fn is_linkable(&self, field: &str) -> bool {
        self.linkable_fields.iter().any(|obs| obs.field == field)
    }

    /// Whether any stable field is more revealing than code identity.
    pub fn has_unexpected_links(&self) -> bool {
        self.linkable_fields
            .iter()
            .any(|obs| obs.risk > Risk::Expected)
    }
}

/// An error from [`analyze`].
#[derive(Clone, Debug, Display, Eq, PartialEq)]
pub enum Error {
    /// At least two attestations are needed, got {0}
    NotEnoughSamples(usize),
}

/// Compare the fields of a series of attestations from one platform.
pub fn analyze(attestations: &[CompositeAttestation]) -> Result<LinkabilityReport, Error> {
    if attestations.len() < 2 {
        return Err(Error::NotEnoughSamples(attestations.len()));
    }

    let mut fields = FieldTable::default();
    for composite in attestations {
        fields.record("purpose_tag", Risk::Low, Some(composite.purpose_tag().as_bytes()));
        fields.record("nonce", Risk::Critical, Some(composite.nonce().as_ref()));
        fields.record(
            "blinding_factor",
            Risk::Critical,
            Some(composite.blinding_factor().as_ref()),
        );
        fields.record_evidence(Layer::Inner, composite.inner(), attestations);
        fields.record_evidence(Layer::Outer, composite.outer(), attestations);
    }

    let mut report = LinkabilityReport {
        total_attestations: attestations.len(),
        ..Default::default()
    };
    for (field, (risk, values)) in fields.0 {
        let observation = FieldObservation {
            field,
            distinct_values: values.len(),
            risk,
        };
        if values.len() == 1 {
            report.linkable_fields.push(observation);
        } else {
            report.variable_fields.push(observation);
        }
    }
    report
        .linkable_fields
        .sort_by(|a, b| b.risk.cmp(&a.risk).then_with(|| a.field.cmp(&b.field)));

    let slots: Vec<&[u8]> = attestations
        .iter()
        .map(|composite| &composite.outer().embedded_slot().as_bytes()[..])
        .collect();
    if let Some(count) = largest_repeat(&slots) {
        report.privacy_concerns.push(PrivacyConcern::ReusedSlot(count));
    }
    let nonces: Vec<&[u8]> = attestations
        .iter()
        .map(|composite| composite.nonce().as_ref())
        .collect();
    if let Some(count) = largest_repeat(&nonces) {
        report.privacy_concerns.push(PrivacyConcern::ReusedNonce(count));
    }
    let blinding_factors: Vec<&[u8]> = attestations
        .iter()
        .map(|composite| composite.blinding_factor().as_ref())
        .collect();
    if let Some(count) = largest_repeat(&blinding_factors) {
        report
            .privacy_concerns
            .push(PrivacyConcern::ReusedBlindingFactor(count));
    }

    Ok(report)
}

/// The size of the largest group of equal values, if any value repeats.
fn largest_repeat(values: &[&[u8]]) -> Option<usize> {
    let mut counts: BTreeMap<&[u8], usize> = BTreeMap::new();
    for value in values {
        *counts.entry(*value).or_default() += 1;
    }
    counts.into_values().max().filter(|count| *count > 1)
}

/// Field name to (risk if stable, distinct values seen).
#[derive(Default)]
struct FieldTable(BTreeMap<String, (Risk, BTreeSet<Option<Vec<u8>>>)>);

impl FieldTable {
    fn record(&mut self, field: impl Into<String>, risk: Risk, value: Option<&[u8]>) {
        self.0
            .entry(field.into())
            .or_insert_with(|| (risk, BTreeSet::new()))
            .1
            .insert(value.map(<[u8]>::to_vec));
    }

    fn record_evidence(
        &mut self,
        layer: Layer,
        evidence: &Evidence,
        series: &[CompositeAttestation],
    ) {
        // A register missing from some attestations counts as its own value.
        let names: BTreeSet<&str> = series
            .iter()
            .flat_map(|composite| {
                let evidence = match layer {
                    Layer::Inner => composite.inner(),
                    Layer::Outer => composite.outer(),
                };
                evidence.measurements().iter().map(|(name, _)| name.as_str())
            })
            .collect();
        for name in names {
            self.record(
                format!("{layer}.{name}"),
                Risk::Expected,
                evidence.measurements().get(name).map(|value| value.as_bytes()),
            );
        }

        let tcb_status = evidence.tcb_status().to_string();
        self.record(
            format!("{layer}.tcb_status"),
            Risk::High,
            Some(tcb_status.as_bytes()),
        );
        let debuggable = [evidence.debuggable() as u8];
        self.record(format!("{layer}.debuggable"), Risk::Low, Some(&debuggable[..]));

        // A certificate chain names the platform; an issuer only names the
        // attestation service.
        match evidence.endorsement() {
            Endorsement::Quote { chain } => {
                self.record(format!("{layer}.quote_chain"), Risk::Critical, Some(&chain[..]))
            }
            Endorsement::Token(token) => self.record(
                format!("{layer}.token_issuer"),
                Risk::Low,
                Some(token.issuer.as_bytes()),
            ),
        }
        if layer == Layer::Outer {
            self.record(
                "outer.embedded_slot",
                Risk::Critical,
                Some(&evidence.embedded_slot().as_bytes()[..]),
            );
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn needs_two_samples() {
        assert_eq!(analyze(&[]), Err(Error::NotEnoughSamples(0)));
    }

    #[test]
    fn largest_repeat_counts_groups() {
        let a: &[u8] = b"a";
        let b: &[u8] = b"b";
        assert_eq!(largest_repeat(&[a, b]), None);
        assert_eq!(largest_repeat(&[a, b, a, a]), Some(3));
    }

    #[test]
    fn risks_are_ordered() {
        assert!(Risk::Critical > Risk::High);
        assert!(Risk::Low > Risk::Expected);
        assert_eq!(Risk::Critical.to_string(), "critical");
    }
}

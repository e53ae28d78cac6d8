// Copyright (c) 2024 The Hierarchical TEE Authors

//! The allow-list of trusted measurement digests.

use ht_attest_core::{Layer, MeasurementDigest, MeasurementSet};
use ht_attest_verifier_config::TrustedMeasurementSet;
use std::collections::BTreeSet;

/// An immutable snapshot of the measurement digests trusted for each layer.
///
/// A layer with no allow-list accepts any measurement set.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct TrustedMeasurements {
    inner: Option<BTreeSet<MeasurementDigest>>,
    outer: Option<BTreeSet<MeasurementDigest>>,
}

impl TrustedMeasurements {
    /// Trust exactly the given measurement sets for `layer`.
    pub fn with_layer<'a, I>(mut self, layer: Layer, sets: I) -> Self
    where
        I: IntoIterator<Item = &'a MeasurementSet>,
    {
        let digests = sets.into_iter().map(MeasurementSet::digest).collect();
        match layer {
            Layer::Inner => self.inner = Some(digests),
            Layer::Outer => self.outer = Some(digests),
        }
        self
    }

    /// Whether an allow-list applies to `layer`.
    pub fn is_configured(&self, layer: Layer) -> bool {
        self.allow_list(layer).is_some()
    }

    /// Whether `measurements` may be trusted for `layer`.
    pub fn is_trusted(&self, layer: Layer, measurements: &MeasurementSet) -> bool {
        self.allow_list(layer)
            .map_or(true, |digests| digests.contains(&measurements.digest()))
    }

    fn allow_list(&self, layer: Layer) -> Option<&BTreeSet<MeasurementDigest>> {
        match layer {
            Layer::Inner => self.inner.as_ref(),
            Layer::Outer => self.outer.as_ref(),
        }
    }
}

impl From<&TrustedMeasurementSet> for TrustedMeasurements {
    fn from(src: &TrustedMeasurementSet) -> Self {
        [Layer::Inner, Layer::Outer]
            .into_iter()
            .fold(Self::default(), |trusted, layer| {
                match src.measurements(layer) {
                    Ok(sets) => trusted.with_layer(layer, &sets),
                    Err(_) => trusted,
                }
            })
    }
}

// Copyright (c) 2024 The Hierarchical TEE Authors

#![doc = include_str!("../README.md")]
#![deny(missing_docs)]

use displaydoc::Display;
use ht_attest_core::{Layer, MeasurementSet};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fs, path::Path};

/// One hex-encoded register value.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct HexRegister(#[serde(with = "hex")] Vec<u8>);

/// The full register map trusted for one layer at one release.
///
/// For JSON the values are hex-encoded bytes.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct TrustedLayerMeasurement {
    registers: BTreeMap<String, HexRegister>,
}

impl TrustedLayerMeasurement {
    /// Create a new instance from (register name, value) pairs.
    pub fn new<'a, I>(registers: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a [u8])>,
    {
        Self {
            registers: registers
                .into_iter()
                .map(|(name, value)| (name.to_owned(), HexRegister(value.to_vec())))
                .collect(),
        }
    }

    /// The measurement set this entry describes.
    pub fn to_measurement_set(&self) -> MeasurementSet {
        self.registers
            .iter()
            .map(|(name, value)| (name.as_str(), value.0.clone()))
            .collect()
    }
}

/// Defines a json schema for the `trusted_measurements` table.
///
/// The outermost string key of this is the release name. This is not
/// interpreted by the software, but helps with maintenance of the file.
///
/// The second string key, within a release, is the layer (`inner` or
/// `outer`) that this is a measurement for.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct TrustedMeasurementSet {
    table: BTreeMap<String, BTreeMap<String, TrustedLayerMeasurement>>,
}

// Allow TrustedMeasurementSet to be logged nicely in json format
impl core::fmt::Display for TrustedMeasurementSet {
    fn fmt(&self, fmt: &mut core::fmt::Formatter) -> core::fmt::Result {
        let json = serde_json::to_string_pretty(&self.table).map_err(|_| core::fmt::Error)?;
        write!(fmt, "{json}")
    }
}

impl TrustedMeasurementSet {
    /// Add (or replace) the trusted measurement for a layer at a release.
    pub fn insert(
        &mut self,
        release: impl Into<String>,
        layer: Layer,
        measurement: TrustedLayerMeasurement,
    ) {
        self.table
            .entry(release.into())
            .or_default()
            .insert(layer.to_string(), measurement);
    }

    /// Get the measurement sets trusted for a layer, across all releases.
    pub fn measurements(&self, layer: Layer) -> Result<Vec<MeasurementSet>, Error> {
        let layer_name = layer.to_string();
        let measurements: Vec<MeasurementSet> = self
            .table
            .values()
            .filter_map(|row| row.get(&layer_name))
            .map(TrustedLayerMeasurement::to_measurement_set)
            .collect();

        match measurements.len() {
            0 => Err(Error::NoMeasurementsFound(layer_name)),
            _ => Ok(measurements),
        }
    }

    /// Reject layer names other than `inner` and `outer`, and entries with no
    /// registers.
    pub fn validate(&self) -> Result<(), Error> {
        let known = [Layer::Inner.to_string(), Layer::Outer.to_string()];
        for (release, row) in &self.table {
            for (layer_name, measurement) in row {
                if !known.contains(layer_name) {
                    return Err(Error::UnknownLayer(release.clone(), layer_name.clone()));
                }
                if measurement.registers.is_empty() {
                    return Err(Error::EmptyMeasurement(release.clone(), layer_name.clone()));
                }
            }
        }
        Ok(())
    }
}

/// The verifier's trust configuration, as read from a JSON file.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq, Serialize)]
#[serde(deny_unknown_fields)]
pub struct VerifierConfig {
    /// Trusted measurements, by release and layer.
    #[serde(default)]
    pub trusted_measurements: TrustedMeasurementSet,
    /// Whether an `OutOfDate` TCB status is acceptable.
    #[serde(default)]
    pub accept_out_of_date: bool,
    /// Whether debuggable evidence is acceptable.
    #[serde(default)]
    pub allow_debug: bool,
    /// Attestation token issuers to accept. Empty accepts any issuer.
    #[serde(default)]
    pub trusted_issuers: Vec<String>,
}

impl VerifierConfig {
    /// Parse and validate a JSON configuration.
    pub fn from_json(json: &str) -> Result<Self, Error> {
        let config: Self =
            serde_json::from_str(json).map_err(|err| Error::Parse(err.to_string()))?;
        config.trusted_measurements.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)
            .map_err(|err| Error::Io(path.display().to_string(), err.to_string()))?;
        Self::from_json(&json)
    }
}

/// An error which can occur when loading a verifier configuration
#[derive(Clone, Debug, Display, Eq, PartialEq)]
pub enum Error {
    /// No measurements found for layer "{0}"
    NoMeasurementsFound(String),
    /// Release "{0}" names unknown layer "{1}"
    UnknownLayer(String, String),
    /// Release "{0}" lists no registers for layer "{1}"
    EmptyMeasurement(String, String),
    /// Could not read {0}: {1}
    Io(String, String),
    /// Could not parse verifier config: {0}
    Parse(String),
}

// Copyright (c) 2024 The Hierarchical TEE Authors

//! The domain-separation label mixed into every binding commitment.

use crate::Error;
use core::fmt::{Display, Formatter, Result as FmtResult};
use serde::{Deserialize, Serialize};

/// The longest purpose tag we accept, in bytes.
pub const MAX_PURPOSE_TAG_LEN: usize = 255;

/// A non-empty label, at most 255 bytes of UTF-8, naming what a composite
/// attestation is for.
///
/// Commitments made for one purpose never verify for another.
#[derive(Clone, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(try_from = "String", into = "String")]
pub struct PurposeTag(String);

impl PurposeTag {
    /// Validate and wrap a purpose tag.
    pub fn new(tag: impl Into<String>) -> Result<Self, Error> {
        let tag = tag.into();
        if tag.is_empty() {
            return Err(Error::InvalidInput("purpose tag is empty".to_owned()));
        }
        if tag.len() > MAX_PURPOSE_TAG_LEN {
            return Err(Error::InvalidInput(format!(
                "purpose tag is {} bytes, the limit is {}",
                tag.len(),
                MAX_PURPOSE_TAG_LEN
            )));
        }
        Ok(Self(tag))
    }

    /// The tag as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The tag's UTF-8 bytes.
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl TryFrom<String> for PurposeTag {
    type Error = Error;

    fn try_from(src: String) -> Result<Self, Error> {
        Self::new(src)
    }
}

impl TryFrom<&str> for PurposeTag {
    type Error = Error;

    fn try_from(src: &str) -> Result<Self, Error> {
        Self::new(src)
    }
}

impl From<PurposeTag> for String {
    fn from(src: PurposeTag) -> String {
        src.0
    }
}

impl Display for PurposeTag {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        f.write_str(&self.0)
    }
}

// Copyright (c) 2024 The Hierarchical TEE Authors

//! Miscellaneous parsing and formatting utilities

#![deny(missing_docs)]

use core::fmt::Display;
use itertools::Itertools;
use std::{str::FromStr, time::Duration};

pub use hex::FromHexError;

/// Parse a number of seconds into a duration
///
/// This can be used with Clap
pub fn parse_duration_in_seconds(src: &str) -> Result<Duration, std::num::ParseIntError> {
    Ok(Duration::from_secs(u64::from_str(src)?))
}

/// Parse a number of milliseconds into a duration
///
/// This can be used with Clap
pub fn parse_duration_in_millis(src: &str) -> Result<Duration, std::num::ParseIntError> {
    Ok(Duration::from_millis(u64::from_str(src)?))
}

/// Parse a hex string of arbitrary (even) length into bytes.
///
/// Surrounding whitespace and an optional `0x` prefix are ignored.
pub fn parse_hex_bytes(src: &str) -> Result<Vec<u8>, FromHexError> {
    let trimmed = src.trim();
    hex::decode(trimmed.strip_prefix("0x").unwrap_or(trimmed))
}

/// Helper to format a sequence as a comma-separated list
/// (This is used with lists of verdict reasons in logs,
/// because the debug logging of those is harder to read)
///
/// To use this, wrap the value in SeqDisplay( ) then format it
pub struct SeqDisplay<T: Display, I: Iterator<Item = T> + Clone>(pub I);

impl<T: Display, I: Iterator<Item = T> + Clone> Display for SeqDisplay<T, I> {
    fn fmt(&self, fmt: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(fmt, "[{}]", self.0.clone().format(", "))
    }
}

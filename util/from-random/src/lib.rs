// Copyright (c) 2024 The Hierarchical TEE Authors

//! A trait which provides a common API for types which can be initialized
//! from data provided by random number generators.

#![no_std]

use rand_core::{CryptoRng, RngCore};

/// A trait which can construct an object from a cryptographically secure
/// pseudo-random number generator.
pub trait FromRandom: Sized {
    /// Using a mutable RNG, take its output to securely initialize the object
    fn from_random<R: CryptoRng + RngCore>(csprng: &mut R) -> Self;
}

impl<const N: usize> FromRandom for [u8; N] {
    fn from_random<R: CryptoRng + RngCore>(csprng: &mut R) -> Self {
        let mut bytes = [0u8; N];
        csprng.fill_bytes(&mut bytes);
        bytes
    }
}

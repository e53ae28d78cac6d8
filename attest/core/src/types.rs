// Copyright (c) 2024 The Hierarchical TEE Authors

//! Fixed-size value types which appear in evidence and on the wire.

pub mod measurement;
pub mod nonce;
pub mod purpose;
pub mod report_slot;
pub mod tcb;

// Copyright (c) 2024 The Hierarchical TEE Authors

//! A blocking client for the verifier service.

use crate::{ClientError, Response};
use ht_attest_core::CompositeAttestation;
use std::{
    io::{Read, Write},
    net::{Shutdown, SocketAddr, TcpStream},
    time::Duration,
};

/// Submit one composite attestation and wait for the verdict.
///
/// `timeout` bounds connecting, and separately each read and write.
pub fn submit(
    addr: &SocketAddr,
    composite: &CompositeAttestation,
    timeout: Duration,
) -> Result<Response, ClientError> {
    submit_bytes(addr, &composite.to_bytes()?, timeout)
}

/// Submit an already encoded request.
pub fn submit_bytes(
    addr: &SocketAddr,
    request: &[u8],
    timeout: Duration,
) -> Result<Response, ClientError> {
    let mut stream = TcpStream::connect_timeout(addr, timeout)?;
    stream.set_read_timeout(Some(timeout))?;
    stream.set_write_timeout(Some(timeout))?;

    stream.write_all(request)?;
    stream.shutdown(Shutdown::Write)?;

    let mut response = Vec::new();
    stream.read_to_end(&mut response)?;
    Ok(ht_util_serial::deserialize(&response)?)
}

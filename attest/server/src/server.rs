// Copyright (c) 2024 The Hierarchical TEE Authors

//! The TCP listener and its worker pool.

use crate::{Response, ServerConfig, ServerError, ServerStats, StatsSnapshot};
use crossbeam_channel::{Receiver, Sender};
use ht_attest_verifier::Verifier;
use ht_common::logger::{log, o, Logger};
use std::{
    io::{self, Read, Write},
    net::{Shutdown, SocketAddr, TcpListener, TcpStream},
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};

/// How long the accept loop sleeps when no connection is waiting.
const ACCEPT_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// An oversized request is drained up to this multiple of the size cap, until
/// the read deadline.
const DRAIN_FACTOR: usize = 16;

const READ_CHUNK: usize = 4096;

enum QueueMsg {
    Handle(TcpStream, SocketAddr),
    StopRequested,
}

/// A running verifier service.
///
/// Dropping the service stops it.
pub struct VerifierServer {
    local_addr: SocketAddr,
    stats: Arc<ServerStats>,
    stop_requested: Arc<AtomicBool>,
    join_handles: Vec<JoinHandle<()>>,
    logger: Logger,
}

impl VerifierServer {
    /// Bind to `config.listen_addr` and start serving.
    pub fn start(
        config: &ServerConfig,
        verifier: Arc<Verifier>,
        logger: Logger,
    ) -> Result<Self, ServerError> {
        if config.num_workers == 0 {
            return Err(ServerError::Config("num_workers must be at least 1".to_owned()));
        }
        if config.max_request_bytes == 0 {
            return Err(ServerError::Config(
                "max_request_bytes must be at least 1".to_owned(),
            ));
        }

        let listener = TcpListener::bind(config.listen_addr)?;
        listener.set_nonblocking(true)?;
        let local_addr = listener.local_addr()?;
        let logger = logger.new(o!("ht.listen_addr" => local_addr.to_string()));

        let stats = Arc::new(ServerStats::new()?);
        let stop_requested = Arc::new(AtomicBool::new(false));

        let mut server = Self {
            local_addr,
            stats: stats.clone(),
            stop_requested: stop_requested.clone(),
            join_handles: Vec::with_capacity(config.num_workers + 1),
            logger: logger.clone(),
        };

        // Must drop before `server` on early return; workers only exit once
        // every sender is gone.
        let (sender, receiver) = crossbeam_channel::bounded(config.num_workers * 4);

        for idx in 0..config.num_workers {
            let worker = Worker {
                receiver: receiver.clone(),
                verifier: verifier.clone(),
                stats: stats.clone(),
                read_timeout: config.read_timeout,
                max_request_bytes: config.max_request_bytes,
                logger: logger.new(o!("ht.worker" => idx)),
            };
            let handle = thread::Builder::new()
                .name(format!("verifier-worker-{idx}"))
                .spawn(move || worker.run())
                .map_err(ServerError::ThreadSpawn)?;
            server.join_handles.push(handle);
        }

        let num_workers = config.num_workers;
        let accept_logger = logger.clone();
        let handle = thread::Builder::new()
            .name("verifier-accept".to_owned())
            .spawn(move || {
                accept_loop(listener, sender, num_workers, stop_requested, accept_logger)
            })
            .map_err(ServerError::ThreadSpawn)?;
        server.join_handles.push(handle);

        log::info!(
            logger,
            "Verifier service listening on {} with {} workers",
            local_addr,
            num_workers
        );
        Ok(server)
    }

    /// The address actually bound, which differs from the configured one when
    /// the configured port is 0.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Export this server's metrics through the default prometheus registry.
    /// Only one server per process can do this.
    pub fn register_metrics(&self) -> Result<(), ServerError> {
        Ok(self.stats.register_default()?)
    }

    /// Stop accepting connections, finish the queued ones, and join every
    /// thread.
    pub fn stop(&mut self) -> Result<(), ServerError> {
        self.stop_requested.store(true, Ordering::SeqCst);
        let mut result = Ok(());
        for handle in self.join_handles.drain(..) {
            if let Err(err) = handle.join() {
                result = Err(ServerError::JoinFailed(format!("{err:?}")));
            }
        }
        if result.is_ok() {
            log::info!(self.logger, "Verifier service stopped: {:?}", self.stats());
        }
        result
    }
}

impl Drop for VerifierServer {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}

fn accept_loop(
    listener: TcpListener,
    sender: Sender<QueueMsg>,
    num_workers: usize,
    stop_requested: Arc<AtomicBool>,
    logger: Logger,
) {
    while !stop_requested.load(Ordering::SeqCst) {
        match listener.accept() {
            Ok((stream, peer)) => {
                if sender.send(QueueMsg::Handle(stream, peer)).is_err() {
                    log::error!(logger, "All workers have exited");
                    return;
                }
            }
            Err(err) if err.kind() == io::ErrorKind::WouldBlock => {
                thread::sleep(ACCEPT_POLL_INTERVAL);
            }
            Err(err) => log::warn!(logger, "Failed to accept connection: {}", err),
        }
    }

    // Workers stop once they reach these, after everything queued before them.
    for _ in 0..num_workers {
        let _ = sender.send(QueueMsg::StopRequested);
    }
}

struct Worker {
    receiver: Receiver<QueueMsg>,
    verifier: Arc<Verifier>,
    stats: Arc<ServerStats>,
    read_timeout: Duration,
    max_request_bytes: usize,
    logger: Logger,
}

impl Worker {
    fn run(self) {
        loop {
            match self.receiver.recv() {
                Ok(QueueMsg::Handle(stream, peer)) => {
                    if let Err(err) = self.handle(stream) {
                        log::debug!(self.logger, "Connection from {} failed: {}", peer, err);
                    }
                }
                Ok(QueueMsg::StopRequested) | Err(_) => return,
            }
        }
    }

    fn handle(&self, mut stream: TcpStream) -> io::Result<()> {
        // Accepted sockets may inherit the listener's non-blocking mode.
        stream.set_nonblocking(false)?;
        stream.set_write_timeout(Some(self.read_timeout))?;

        let response = match self.read_request(&mut stream) {
            Ok(request) => self.verify(&request),
            Err(err) => {
                self.stats.record_rejected();
                Response::Rejected {
                    reason: err.to_string(),
                }
            }
        };

        let bytes = ht_util_serial::serialize(&response)
            .map_err(|err| io::Error::new(io::ErrorKind::Other, err.to_string()))?;
        stream.write_all(&bytes)?;
        stream.shutdown(Shutdown::Write)
    }

    /// Read until the client half-closes, refusing to buffer more than
    /// `max_request_bytes` or to wait longer than `read_timeout` in total.
    fn read_request(&self, stream: &mut TcpStream) -> io::Result<Vec<u8>> {
        let deadline = Instant::now() + self.read_timeout;
        let mut request = Vec::new();
        let mut buf = [0u8; READ_CHUNK];
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(self.timed_out());
            }
            stream.set_read_timeout(Some(remaining))?;
            let len = match stream.read(&mut buf) {
                Ok(0) => return Ok(request),
                Ok(len) => len,
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err)
                    if matches!(
                        err.kind(),
                        io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
                    ) =>
                {
                    return Err(self.timed_out())
                }
                Err(err) => return Err(err),
            };
            request.extend_from_slice(&buf[..len]);

            if request.len() > self.max_request_bytes {
                // Unread input would make closing the socket reset the
                // connection before the client sees the rejection.
                let mut drained = 0;
                while drained < self.max_request_bytes * DRAIN_FACTOR {
                    let remaining = deadline.saturating_duration_since(Instant::now());
                    if remaining.is_zero() || stream.set_read_timeout(Some(remaining)).is_err() {
                        break;
                    }
                    match stream.read(&mut buf) {
                        Ok(0) | Err(_) => break,
                        Ok(len) => drained += len,
                    }
                }
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("request exceeds {} bytes", self.max_request_bytes),
                ));
            }
        }
    }

    fn timed_out(&self) -> io::Error {
        io::Error::new(
            io::ErrorKind::TimedOut,
            format!("request not received within {:?}", self.read_timeout),
        )
    }

    fn verify(&self, request: &[u8]) -> Response {
        let timer = self.stats.start_timer();
        match self.verifier.verify_bytes(request) {
            Ok(verdict) => {
                let seconds = timer.stop_and_record();
                self.stats.record_verdict(verdict.is_trusted());
                Response::Verdict {
                    verdict,
                    verification_time_ms: (seconds * 1000.0) as u64,
                }
            }
            Err(err) => {
                timer.stop_and_discard();
                self.stats.record_rejected();
                Response::Rejected {
                    reason: err.to_string(),
                }
            }
        }
    }
}

// Copyright (c) 2024 The Hierarchical TEE Authors

//! Drives both evidence providers, with timeouts and retries, to produce
//! composite attestations.

use crate::{assemble, ComposeConfig, Error, RetryConfig};
use crossbeam_channel::RecvTimeoutError;
use ht_attest_core::{
    CompositeAttestation, Evidence, EvidenceProvider, Layer, ProviderError, PurposeTag, ReportSlot,
};
use ht_common::{
    logger::{log, Logger},
    SystemTimeProvider, TimeProvider,
};
use rand_core::{CryptoRng, RngCore};
use retry::OperationResult;
use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    thread,
    time::Duration,
};

/// How many provider calls may still be running after their caller gave up.
pub const DEFAULT_MAX_OUTSTANDING_CALLS: usize = 8;

/// Produces composite attestations from an inner and an outer provider.
///
/// Each provider call runs on its own thread. A call that overruns its
/// timeout cannot be cancelled, so its thread keeps running until the
/// provider returns. At most `max_outstanding_calls` such threads exist per
/// composer; beyond that, provider calls fail with
/// [`ProviderError::DeviceUnavailable`] without being made.
pub struct Composer {
    inner: Arc<dyn EvidenceProvider>,
    outer: Arc<dyn EvidenceProvider>,
    config: ComposeConfig,
    time_provider: Arc<dyn TimeProvider>,
    outstanding: Arc<AtomicUsize>,
    max_outstanding_calls: usize,
    logger: Logger,
}

impl Composer {
    pub fn new(
        inner: Arc<dyn EvidenceProvider>,
        outer: Arc<dyn EvidenceProvider>,
        config: ComposeConfig,
        logger: Logger,
    ) -> Self {
        Self {
            inner,
            outer,
            config,
            time_provider: Arc::new(SystemTimeProvider),
            outstanding: Arc::new(AtomicUsize::new(0)),
            max_outstanding_calls: DEFAULT_MAX_OUTSTANDING_CALLS,
            logger,
        }
    }

    /// Change how many provider calls may run at once, counting calls which
    /// already timed out.
    pub fn with_max_outstanding_calls(mut self, max_outstanding_calls: usize) -> Self {
        self.max_outstanding_calls = max_outstanding_calls;
        self
    }

    /// Use a different clock for `created_at` timestamps.
    pub fn with_time_provider(mut self, time_provider: Arc<dyn TimeProvider>) -> Self {
        self.time_provider = time_provider;
        self
    }

    /// Make a single attempt at a composite attestation.
    ///
    /// The inner evidence is requested first, with an empty slot. Each
    /// provider call is bounded by its configured timeout, and a timeout
    /// aborts the attempt with [`Error::EvidenceUnavailable`].
    pub fn attest<R: CryptoRng + RngCore>(
        &self,
        csprng: &mut R,
        purpose_tag: &PurposeTag,
    ) -> Result<CompositeAttestation, Error> {
        let inner = self
            .get_evidence_with_timeout(
                self.inner.clone(),
                ReportSlot::default(),
                self.config.inner_timeout,
            )
            .map_err(|err| Error::EvidenceUnavailable(Layer::Inner, err))?;
        let created_at = self.time_provider.since_epoch()?.as_secs();

        let outer = self.outer.clone();
        let outer_timeout = self.config.outer_timeout;
        let composite = assemble(
            csprng,
            purpose_tag,
            inner,
            |slot| self.get_evidence_with_timeout(outer, slot, outer_timeout),
            created_at,
        )?;

        log::debug!(
            self.logger,
            "Assembled composite attestation";
            "purpose" => composite.purpose_tag().as_str(),
            "created_at" => created_at
        );
        Ok(composite)
    }

    /// Attest, retrying transient failures according to `retry_config`.
    ///
    /// Every attempt draws a new nonce and blinding factor; values from a
    /// failed attempt are never reused.
    pub fn attest_with_retries<R: CryptoRng + RngCore>(
        &self,
        csprng: &mut R,
        purpose_tag: &PurposeTag,
        retry_config: &RetryConfig,
    ) -> Result<CompositeAttestation, Error> {
        retry::retry(retry_config.get_retry_iterator(), || {
            match self.attest(csprng, purpose_tag) {
                Ok(composite) => OperationResult::Ok(composite),
                Err(err) if err.is_transient() => {
                    log::warn!(self.logger, "Composite attestation failed, retrying: {}", err);
                    OperationResult::Retry(err)
                }
                Err(err) => OperationResult::Err(err),
            }
        })
        .map_err(|err| {
            log::error!(
                self.logger,
                "Composite attestation failed after {} tries: {}",
                err.tries,
                err.error
            );
            err.error
        })
    }

    /// Run one provider call on its own thread, and give up waiting after
    /// `timeout`.
    ///
    /// A provider that overruns is left to finish in the background. Its
    /// result is discarded.
    fn get_evidence_with_timeout(
        &self,
        provider: Arc<dyn EvidenceProvider>,
        slot: ReportSlot,
        timeout: Duration,
    ) -> Result<Evidence, ProviderError> {
        let running = self.outstanding.fetch_add(1, Ordering::SeqCst);
        let guard = OutstandingCall(self.outstanding.clone());
        if running >= self.max_outstanding_calls {
            log::warn!(
                self.logger,
                "Not calling evidence provider, {} calls still running",
                running
            );
            return Err(ProviderError::DeviceUnavailable(format!(
                "{running} evidence provider calls still running"
            )));
        }

        let (sender, receiver) = crossbeam_channel::bounded(1);
        thread::Builder::new()
            .name("evidence-provider".to_owned())
            .spawn(move || {
                let _guard = guard;
                // The receiver is gone if we already timed out.
                let _ = sender.send(provider.get_evidence(&slot, timeout));
            })
            .map_err(|err| ProviderError::DeviceUnavailable(err.to_string()))?;

        match receiver.recv_timeout(timeout) {
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => Err(ProviderError::Timeout(timeout)),
            Err(RecvTimeoutError::Disconnected) => Err(ProviderError::DeviceUnavailable(
                "evidence provider exited without a result".to_owned(),
            )),
        }
    }
}

/// Counts a provider thread as running until dropped.
struct OutstandingCall(Arc<AtomicUsize>);

impl Drop for OutstandingCall {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

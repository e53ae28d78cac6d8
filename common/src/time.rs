// Copyright (c) 2024 The Hierarchical TEE Authors

//! A time provider abstraction, so that code which checks timestamps can be
//! tested against a fixed clock.

use displaydoc::Display;
use std::{
    sync::{Arc, Mutex},
    time::{Duration, SystemTime, UNIX_EPOCH},
};

/// An error which can occur while reading the current time.
#[derive(Clone, Debug, Display, Eq, PartialEq)]
pub enum TimeProviderError {
    /// The system clock is set before the unix epoch
    BeforeEpoch,
    /// The mock clock lock was poisoned
    Poisoned,
}

/// Something that can report the current time as a duration since the unix
/// epoch.
pub trait TimeProvider: Send + Sync {
    /// Get the current time, as a duration since the unix epoch.
    fn since_epoch(&self) -> Result<Duration, TimeProviderError>;
}

/// A [`TimeProvider`] backed by the system clock.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemTimeProvider;

impl TimeProvider for SystemTimeProvider {
    fn since_epoch(&self) -> Result<Duration, TimeProviderError> {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|_| TimeProviderError::BeforeEpoch)
    }
}

/// A [`TimeProvider`] whose current time is set explicitly.
///
/// Clones share the same underlying clock.
#[derive(Clone, Debug, Default)]
pub struct MockTimeProvider {
    cur_since_epoch: Arc<Mutex<Duration>>,
}

impl MockTimeProvider {
    /// Create a mock clock set to the given time.
    pub fn new(cur_since_epoch: Duration) -> Self {
        Self {
            cur_since_epoch: Arc::new(Mutex::new(cur_since_epoch)),
        }
    }

    /// Move the mock clock to the given time.
    pub fn set_cur_since_epoch(&self, cur_since_epoch: Duration) {
        if let Ok(mut cur) = self.cur_since_epoch.lock() {
            *cur = cur_since_epoch;
        }
    }
}

impl TimeProvider for MockTimeProvider {
    fn since_epoch(&self) -> Result<Duration, TimeProviderError> {
        self.cur_since_epoch
            .lock()
            .map(|cur| *cur)
            .map_err(|_| TimeProviderError::Poisoned)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn system_time_is_after_2020() {
        let now = SystemTimeProvider.since_epoch().unwrap();
        assert!(now > Duration::from_secs(1_577_836_800));
    }

    #[test]
    fn mock_time_is_shared_between_clones() {
        let clock = MockTimeProvider::new(Duration::from_secs(10));
        let other = clock.clone();
        other.set_cur_since_epoch(Duration::from_secs(42));
        assert_eq!(clock.since_epoch().unwrap(), Duration::from_secs(42));
    }
}

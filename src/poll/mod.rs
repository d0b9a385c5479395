//! Condition polling for eventually-consistent reads
//!
//! After a mutation (booking update, branding update) the service may take
//! a while before a subsequent read reflects it. [`poll_until`] turns that
//! into a bounded wait: probe, check, sleep, repeat until the predicate
//! holds or the deadline passes.
//!
//! A timeout is a [`PollResult::Timeout`] value, not an error. Callers that
//! want a hard failure use [`PollResult::into_result`].

mod poller;

pub use poller::{poll_until, try_poll_until};

use std::fmt::Debug;
use std::time::Duration;

use crate::common::{describe, Error, Result};

/// Timing for a single poll operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    max_wait: Duration,
    interval: Duration,
}

impl PollConfig {
    /// Create a poll configuration
    ///
    /// `interval` must be non-zero. A `max_wait` shorter than `interval` is
    /// accepted; the poller then probes once and does not wait.
    pub fn new(max_wait: Duration, interval: Duration) -> Result<Self> {
        if interval.is_zero() {
            return Err(Error::Config(
                "poll interval must be greater than zero".to_string(),
            ));
        }
        Ok(Self { max_wait, interval })
    }

    /// Shorthand for whole-second configurations
    pub fn from_secs(max_wait_secs: u64, interval_secs: u64) -> Result<Self> {
        Self::new(
            Duration::from_secs(max_wait_secs),
            Duration::from_secs(interval_secs),
        )
    }

    pub fn max_wait(&self) -> Duration {
        self.max_wait
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Whether the deadline is too short for a second probe
    pub(crate) fn single_attempt(&self) -> bool {
        self.max_wait < self.interval
    }
}

impl Default for PollConfig {
    /// 60 seconds, probing every 5
    fn default() -> Self {
        Self {
            max_wait: Duration::from_secs(60),
            interval: Duration::from_secs(5),
        }
    }
}

/// Outcome of a poll operation
#[derive(Debug, Clone, PartialEq)]
pub enum PollResult<T> {
    /// The predicate held for this value
    Success(T),
    /// The deadline passed first
    Timeout {
        /// What the last successful probe returned; `None` if it returned
        /// nothing or every probe failed
        last_observed: Option<T>,
        /// The configured deadline
        max_wait: Duration,
    },
}

impl<T> PollResult<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, PollResult::Success(_))
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, PollResult::Timeout { .. })
    }

    /// The satisfying value, if any
    pub fn success(self) -> Option<T> {
        match self {
            PollResult::Success(value) => Some(value),
            PollResult::Timeout { .. } => None,
        }
    }

    /// The last value seen, whether or not it satisfied the predicate
    pub fn last_observed(&self) -> Option<&T> {
        match self {
            PollResult::Success(value) => Some(value),
            PollResult::Timeout { last_observed, .. } => last_observed.as_ref(),
        }
    }

    /// Escalate a timeout into [`Error::ConditionTimeout`]
    pub fn into_result(self) -> Result<T>
    where
        T: Debug,
    {
        match self {
            PollResult::Success(value) => Ok(value),
            PollResult::Timeout {
                last_observed,
                max_wait,
            } => Err(Error::condition_timeout(
                max_wait,
                describe(last_observed.as_ref()),
            )),
        }
    }
}

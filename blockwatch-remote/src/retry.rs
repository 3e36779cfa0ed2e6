//! Bounded retry with exponential back-off, applied at the fetcher boundary.
//!
//! Only `RateLimited` and `Network` failures are retried, each against its own
//! attempt budget. Everything else surfaces on the first occurrence.
//! Sleeping goes through [`Sleeper`] so the schedule can be asserted without
//! waiting on a real clock.

use std::time::Duration;

use blockwatch_core::{Repository, RetrySettings, Revision};

use crate::error::FetchError;
use crate::fetcher::RemoteFetcher;

/// Blocks the current thread for a back-off delay.
pub trait Sleeper {
    fn sleep(&self, duration: Duration);
}

/// Production sleeper backed by `std::thread::sleep`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// How many times to try, and how long to wait in between.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts allowed while the remote keeps reporting quota exhaustion.
    pub rate_limit_attempts: u32,
    /// Total attempts allowed while connectivity keeps failing.
    pub network_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&RetrySettings::default())
    }
}

impl From<&RetrySettings> for RetryPolicy {
    fn from(settings: &RetrySettings) -> Self {
        Self {
            rate_limit_attempts: settings.rate_limit_attempts.max(1),
            network_attempts: settings.network_attempts.max(1),
            base_delay: Duration::from_millis(settings.base_delay_ms),
            max_delay: Duration::from_secs(settings.max_delay_secs),
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `attempt` (1-based).
    ///
    /// A remote-supplied hint replaces the exponential schedule; both are
    /// capped at `max_delay`.
    pub fn delay_for(&self, attempt: u32, hint: Option<Duration>) -> Duration {
        let delay = hint.unwrap_or_else(|| {
            let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
            self.base_delay.saturating_mul(factor)
        });
        delay.min(self.max_delay)
    }

    /// Run `op` until it succeeds, fails permanently, or exhausts its budget.
    pub fn run<T>(
        &self,
        sleeper: &dyn Sleeper,
        label: &str,
        mut op: impl FnMut() -> Result<T, FetchError>,
    ) -> Result<T, FetchError> {
        let mut rate_limited = 0u32;
        let mut network = 0u32;
        loop {
            let err = match op() {
                Ok(value) => return Ok(value),
                Err(err) => err,
            };
            let (failures, budget, hint) = match &err {
                FetchError::RateLimited { retry_after, .. } => {
                    rate_limited += 1;
                    (rate_limited, self.rate_limit_attempts, *retry_after)
                }
                FetchError::Network { .. } => {
                    network += 1;
                    (network, self.network_attempts, None)
                }
                FetchError::NotFound { .. }
                | FetchError::Rejected { .. }
                | FetchError::Decode { .. } => return Err(err),
            };
            if failures >= budget {
                tracing::warn!("{label}: giving up after {failures} attempt(s): {err}");
                return Err(err);
            }
            let delay = self.delay_for(failures, hint);
            tracing::warn!(
                "{label}: attempt {failures}/{budget} failed ({err}); retrying in {}ms",
                delay.as_millis()
            );
            sleeper.sleep(delay);
        }
    }
}

/// A [`RemoteFetcher`] that applies a [`RetryPolicy`] to every call of `inner`.
#[derive(Debug)]
pub struct RetryingFetcher<F, S = ThreadSleeper> {
    inner: F,
    policy: RetryPolicy,
    sleeper: S,
}

impl<F: RemoteFetcher> RetryingFetcher<F> {
    pub fn new(inner: F, policy: RetryPolicy) -> Self {
        Self::with_sleeper(inner, policy, ThreadSleeper)
    }
}

impl<F: RemoteFetcher, S: Sleeper> RetryingFetcher<F, S> {
    pub fn with_sleeper(inner: F, policy: RetryPolicy, sleeper: S) -> Self {
        Self {
            inner,
            policy,
            sleeper,
        }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }
}

impl<F: RemoteFetcher, S: Sleeper> RemoteFetcher for RetryingFetcher<F, S> {
    fn head_revision(&self, repository: &Repository) -> Result<Revision, FetchError> {
        let label = format!("head of {repository}");
        self.policy
            .run(&self.sleeper, &label, || self.inner.head_revision(repository))
    }

    fn verify_revision(
        &self,
        repository: &Repository,
        revision: &Revision,
    ) -> Result<(), FetchError> {
        let label = format!("revision {}", revision.short());
        self.policy.run(&self.sleeper, &label, || {
            self.inner.verify_revision(repository, revision)
        })
    }

    fn file_content_at(
        &self,
        repository: &Repository,
        path: &str,
        revision: &Revision,
    ) -> Result<Option<String>, FetchError> {
        let label = format!("{path}@{}", revision.short());
        self.policy.run(&self.sleeper, &label, || {
            self.inner.file_content_at(repository, path, revision)
        })
    }
}

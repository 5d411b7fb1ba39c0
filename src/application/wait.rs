//! Bounded polling for state that becomes visible asynchronously, such as a
//! search index finishing its build or a fresh write reaching the index.

use crate::domain::error::DomainError;
use std::future::Future;
use std::time::Duration;
use tokio::time::{sleep, Instant};

/// How long to keep polling and how long to sleep between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSchedule {
    pub timeout: Duration,
    pub interval: Duration,
}

impl PollSchedule {
    pub fn new(timeout: Duration, interval: Duration) -> Self {
        Self { timeout, interval }
    }
}

impl Default for PollSchedule {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(20),
            interval: Duration::from_secs(2),
        }
    }
}

/// Calls `probe` until it yields `Some`, sleeping `interval` between calls.
///
/// The probe always runs at least once. Probe errors are returned as-is;
/// running out of time is a [`DomainError::Timeout`] carrying `err`.
pub async fn poll_until<T, F, Fut>(schedule: PollSchedule, err: &str, mut probe: F) -> Result<T, DomainError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Option<T>, DomainError>>,
{
    let start = Instant::now();
    loop {
        if let Some(value) = probe().await? {
            return Ok(value);
        }
        if start.elapsed() >= schedule.timeout {
            return Err(DomainError::Timeout(err.to_string()));
        }
        sleep(schedule.interval).await;
    }
}

/// [`poll_until`] for a boolean predicate.
pub async fn wait_for<F, Fut>(schedule: PollSchedule, err: &str, mut predicate: F) -> Result<(), DomainError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<bool, DomainError>>,
{
    poll_until(schedule, err, || {
        let fut = predicate();
        async move { Ok(fut.await?.then_some(())) }
    })
    .await
}

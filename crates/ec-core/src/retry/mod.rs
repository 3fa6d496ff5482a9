//! Bounded retry driver
//!
//! Owns the deadline and interval policy for polling loops. The unit of work
//! only classifies each attempt as [`Attempt::Continue`], [`Attempt::Fatal`]
//! or [`Attempt::Done`]; it never sleeps and never looks at the clock.
//!
//! ## Schedule
//!
//! ```text
//! attempt ─▶ Done(v)      ─▶ Ok(v)
//!         ─▶ Fatal(e)     ─▶ Err(Fatal(e))
//!         ─▶ Continue(r)  ─▶ deadline passed? ─▶ Err(Timeout { last_reason: r })
//!                            └─ sleep min(delay, remaining), delay *= multiplier
//! ```
//!
//! The first attempt always runs. Cancellation is checked before every
//! attempt and while sleeping, never in the middle of an attempt.

use std::future::Future;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::debug;

/// Outcome of a single attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Attempt<T, E> {
    /// Not ready yet; try again. Carries the condition for diagnostics.
    Continue(String),
    /// Stop immediately with an error
    Fatal(E),
    /// Stop with a value
    Done(T),
}

/// Why the driver gave up
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryError<E> {
    /// An attempt returned [`Attempt::Fatal`]
    Fatal(E),
    /// The deadline elapsed while attempts kept returning [`Attempt::Continue`]
    Timeout {
        /// Configured timeout
        timeout: Duration,
        /// Attempts made
        attempts: u32,
        /// Reason carried by the last `Continue`
        last_reason: String,
    },
    /// The cancel signal fired
    Cancelled {
        /// Attempts made
        attempts: u32,
        /// Reason carried by the last `Continue`, if any
        last_reason: String,
    },
}

/// Deadline and interval policy
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Total time allowed, measured from the first attempt
    pub timeout: Duration,
    /// Delay before the second attempt
    pub initial_delay: Duration,
    /// Upper bound on any single delay
    pub max_delay: Duration,
    /// Growth factor applied to the delay after each attempt
    pub multiplier: u32,
}

impl RetryPolicy {
    /// Create a policy with the default interval schedule
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(10),
            multiplier: 2,
        }
    }

    /// Set the delay before the second attempt
    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Set the upper bound on any single delay
    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Set the growth factor (1 gives a fixed interval)
    pub fn with_multiplier(mut self, multiplier: u32) -> Self {
        self.multiplier = multiplier.max(1);
        self
    }

    /// Delay to wait after the given attempt (0-indexed)
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = self.multiplier.saturating_pow(attempt.min(30));
        self.initial_delay
            .saturating_mul(factor)
            .min(self.max_delay)
    }
}

/// Cooperative cancellation signal from the host
///
/// Cloning shares the same underlying signal.
#[derive(Debug, Clone)]
pub struct CancelSignal {
    rx: Option<watch::Receiver<bool>>,
}

impl CancelSignal {
    /// Create a signal together with the handle that fires it
    pub fn new() -> (CancelHandle, Self) {
        let (tx, rx) = watch::channel(false);
        (CancelHandle { tx }, Self { rx: Some(rx) })
    }

    /// A signal that never fires
    pub fn never() -> Self {
        Self { rx: None }
    }

    /// Whether the signal has fired
    pub fn is_cancelled(&self) -> bool {
        self.rx.as_ref().is_some_and(|rx| *rx.borrow())
    }

    /// Resolve once the signal fires
    ///
    /// Pends forever if the handle was dropped without firing.
    pub async fn cancelled(&mut self) {
        let Some(rx) = self.rx.as_mut() else {
            return std::future::pending().await;
        };
        if rx.wait_for(|fired| *fired).await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

/// Fires a [`CancelSignal`]
#[derive(Debug)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

impl CancelHandle {
    /// Fire the signal
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }
}

/// Run `op` until it is done, fails fatally, times out or is cancelled
pub async fn retry_until<T, E, F, Fut>(
    policy: &RetryPolicy,
    mut cancel: CancelSignal,
    mut op: F,
) -> Result<T, RetryError<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Attempt<T, E>>,
{
    let deadline = Instant::now() + policy.timeout;
    let mut attempts: u32 = 0;
    let mut last_reason = String::new();

    loop {
        if cancel.is_cancelled() {
            return Err(RetryError::Cancelled {
                attempts,
                last_reason,
            });
        }

        let outcome = op().await;
        attempts += 1;

        let reason = match outcome {
            Attempt::Done(value) => return Ok(value),
            Attempt::Fatal(err) => return Err(RetryError::Fatal(err)),
            Attempt::Continue(reason) => reason,
        };
        last_reason = reason;

        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return Err(RetryError::Timeout {
                timeout: policy.timeout,
                attempts,
                last_reason,
            });
        }

        let delay = policy.delay_for(attempts - 1).min(remaining);
        debug!(
            "Attempt {} not ready ({}), retrying in {:?}",
            attempts, last_reason, delay
        );

        tokio::select! {
            _ = tokio::time::sleep(delay) => {}
            _ = cancel.cancelled() => {
                return Err(RetryError::Cancelled {
                    attempts,
                    last_reason,
                });
            }
        }
    }
}

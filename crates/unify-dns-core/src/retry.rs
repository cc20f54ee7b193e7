//! Bounded retry with exponential backoff and jitter
//!
//! Only `Error::Transient` is retried; every other error surfaces
//! immediately. Jitter spreads retries out when many resources fail together
//! against the same controller.
//!
//! Cancellation semantics: an in-flight API call is allowed to complete (an
//! interrupted mutation would leave ambiguous partial state), but no further
//! attempt starts once the caller's cancellation or deadline fires, and the
//! operation reports `Error::Cancelled` rather than success.

use crate::error::{Error, Result};
use rand::Rng;
use std::future::Future;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Retry policy for transient failures
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total number of attempts, including the first (minimum 1)
    pub max_attempts: u32,
    /// Delay before the first retry
    pub base_delay: Duration,
    /// Cap applied to the exponentially growing delay
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    /// Policy that never retries (single attempt)
    pub fn no_retries() -> Self {
        Self {
            max_attempts: 1,
            ..Default::default()
        }
    }
}

/// Handle used by the caller to cancel in-progress operations
#[derive(Debug)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

impl CancelHandle {
    /// Signal cancellation to every linked [`Cancellation`]
    pub fn cancel(&self) {
        let _ = self.tx.send(true);
    }
}

/// Caller-supplied cancellation signal with an optional deadline
///
/// Provider operations check this between attempts and while backing off.
/// `Cancellation::none()` is the uncancellable default for callers that do
/// not need a deadline.
#[derive(Debug, Clone)]
pub struct Cancellation {
    rx: Option<watch::Receiver<bool>>,
    deadline: Option<Instant>,
}

impl Cancellation {
    /// A signal that never fires
    pub fn none() -> Self {
        Self {
            rx: None,
            deadline: None,
        }
    }

    /// Create a linked handle/signal pair
    pub fn pair() -> (CancelHandle, Self) {
        let (tx, rx) = watch::channel(false);
        (
            CancelHandle { tx },
            Self {
                rx: Some(rx),
                deadline: None,
            },
        )
    }

    /// Attach an absolute deadline
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Convenience: a deadline-only signal
    pub fn deadline_in(timeout: Duration) -> Self {
        Self::none().with_deadline(Instant::now() + timeout)
    }

    /// Whether cancellation has already fired
    pub fn is_cancelled(&self) -> bool {
        if let Some(deadline) = self.deadline
            && Instant::now() >= deadline
        {
            return true;
        }
        self.rx.as_ref().is_some_and(|rx| *rx.borrow())
    }

    /// Resolve once cancellation fires; pends forever for `none()`
    pub async fn cancelled(&mut self) {
        loop {
            let deadline = self.deadline;
            let deadline_wait = async move {
                match deadline {
                    Some(d) => tokio::time::sleep_until(d).await,
                    None => std::future::pending().await,
                }
            };

            // wait_for checks the current value before sleeping, so a cancel
            // sent before this call is seen immediately
            match self.rx.clone() {
                Some(mut rx) => {
                    tokio::select! {
                        _ = deadline_wait => return,
                        result = rx.wait_for(|cancelled| *cancelled) => {
                            match result {
                                Ok(_) => return,
                                // Handle dropped without cancelling; only the
                                // deadline can fire now
                                Err(_) => self.rx = None,
                            }
                        }
                    }
                }
                None => {
                    deadline_wait.await;
                    return;
                }
            }
        }
    }
}

/// Execute an operation, retrying transient failures per `policy`
///
/// The delay doubles on each retry, is capped at `policy.max_delay`, and is
/// multiplied by a random factor in 0.5..1.5.
pub(crate) async fn retry_transient<F, Fut, T>(
    policy: &RetryPolicy,
    cancel: &Cancellation,
    operation_name: &str,
    mut operation: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut delay = policy.base_delay;

    for attempt in 1..=max_attempts {
        if cancel.is_cancelled() {
            return Err(Error::cancelled(format!(
                "{operation_name} cancelled before attempt {attempt}"
            )));
        }

        match operation().await {
            Ok(value) => {
                // The in-flight call was allowed to finish, but a cancelled
                // operation reports cancellation, not success; re-runs
                // converge because every operation is idempotent
                if cancel.is_cancelled() {
                    return Err(Error::cancelled(format!(
                        "{operation_name} cancelled while attempt {attempt} was in flight"
                    )));
                }
                if attempt > 1 {
                    debug!(
                        operation = %operation_name,
                        attempt,
                        "operation succeeded after retry"
                    );
                }
                return Ok(value);
            }
            Err(e) if e.is_transient() && attempt < max_attempts => {
                let jitter = rand::thread_rng().gen_range(0.5..1.5);
                let jittered = delay.mul_f64(jitter);

                warn!(
                    operation = %operation_name,
                    attempt,
                    error = %e,
                    delay_ms = jittered.as_millis() as u64,
                    "transient failure, retrying"
                );

                let mut cancel_wait = cancel.clone();
                tokio::select! {
                    _ = tokio::time::sleep(jittered) => {}
                    _ = cancel_wait.cancelled() => {
                        return Err(Error::cancelled(format!(
                            "{operation_name} cancelled during retry backoff"
                        )));
                    }
                }

                delay = (delay * 2).min(policy.max_delay);
            }
            Err(e) => return Err(e),
        }
    }

    // max_attempts >= 1, so the loop always returns
    unreachable!("retry loop exited without a result")
}

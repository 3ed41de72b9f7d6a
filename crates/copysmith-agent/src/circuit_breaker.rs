//! Circuit breaker for completion-service protection
//!
//! Implements the circuit breaker pattern to prevent cascading failures
//! when the completion service degrades or repeatedly errors.

use copysmith_core::{CopysmithError, Result};
use std::future::Future;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Circuit breaker states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    /// Normal operation - requests allowed
    Closed,
    /// Too many failures - reject requests immediately
    Open,
    /// Testing recovery - allow a trial request
    HalfOpen,
}

impl std::fmt::Display for CircuitState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CircuitState::Closed => write!(f, "closed"),
            CircuitState::Open => write!(f, "open"),
            CircuitState::HalfOpen => write!(f, "half-open"),
        }
    }
}

/// Read-only view of a breaker's state, for observability
#[derive(Debug, Clone, Copy)]
pub struct BreakerSnapshot {
    pub state: CircuitState,
    pub failure_count: u32,
    pub failure_threshold: u32,
    pub recovery_timeout: Duration,
    /// Time since the last recorded failure, if any
    pub last_failure_age: Option<Duration>,
}

#[derive(Debug)]
struct BreakerInner {
    state: CircuitState,
    failure_count: u32,
    last_failure: Option<Instant>,
}

/// Circuit breaker guarding one named integration point
///
/// # States
///
/// - **Closed**: normal operation, all calls allowed; a success resets the
///   failure count, a failure increments it.
/// - **Open**: threshold reached, calls rejected without invoking the
///   wrapped operation until `recovery_timeout` elapses.
/// - **HalfOpen**: one trial call allowed; success closes the circuit,
///   failure re-opens it with a refreshed timestamp.
///
/// Open can only transition to Closed via HalfOpen, never directly. All
/// reads and transitions happen under a single mutex, so the allow/reject
/// decision and the subsequent state mutation are atomic with respect to
/// concurrent callers sharing the breaker.
///
/// One instance is created per integration point (e.g. one per platform
/// workflow) and lives for the process lifetime.
#[derive(Debug)]
pub struct CircuitBreaker {
    name: String,
    threshold: u32,
    recovery_timeout: Duration,
    inner: Mutex<BreakerInner>,
}

impl CircuitBreaker {
    /// Create a new circuit breaker
    ///
    /// # Arguments
    ///
    /// * `name` - Integration point this breaker guards
    /// * `threshold` - Consecutive failures before opening the circuit (> 0)
    /// * `recovery_timeout` - Wait before allowing a trial call
    pub fn new(name: impl Into<String>, threshold: u32, recovery_timeout: Duration) -> Self {
        debug_assert!(threshold > 0);
        Self {
            name: name.into(),
            threshold,
            recovery_timeout,
            inner: Mutex::new(BreakerInner {
                state: CircuitState::Closed,
                failure_count: 0,
                last_failure: None,
            }),
        }
    }

    /// Name of the integration point this breaker guards
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Run a synchronous operation through the breaker
    pub fn call<T>(&self, operation: impl FnOnce() -> Result<T>) -> Result<T> {
        self.acquire()?;
        match operation() {
            Ok(value) => {
                self.on_success();
                Ok(value)
            }
            Err(e) => {
                self.on_failure();
                Err(e)
            }
        }
    }

    /// Run an async operation through the breaker
    ///
    /// Shares transition logic with [`call`](Self::call); the future is
    /// never constructed when the circuit rejects.
    pub async fn call_async<T, F, Fut>(&self, operation: F) -> Result<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        self.acquire()?;
        match operation().await {
            Ok(value) => {
                self.on_success();
                Ok(value)
            }
            Err(e) => {
                self.on_failure();
                Err(e)
            }
        }
    }

    /// Manually force the breaker closed with a zero count
    ///
    /// Operational escape hatch; not part of the normal transition graph.
    pub fn reset(&self) {
        let mut inner = self.inner.lock().expect("breaker mutex poisoned");
        inner.state = CircuitState::Closed;
        inner.failure_count = 0;
        inner.last_failure = None;
        tracing::info!(breaker = %self.name, "Circuit breaker manually reset");
    }

    /// Read-only snapshot for observability
    pub fn snapshot(&self) -> BreakerSnapshot {
        let inner = self.inner.lock().expect("breaker mutex poisoned");
        BreakerSnapshot {
            state: inner.state,
            failure_count: inner.failure_count,
            failure_threshold: self.threshold,
            recovery_timeout: self.recovery_timeout,
            last_failure_age: inner.last_failure.map(|t| t.elapsed()),
        }
    }

    /// Current state (recomputing Open -> HalfOpen eligibility)
    pub fn state(&self) -> CircuitState {
        let inner = self.inner.lock().expect("breaker mutex poisoned");
        match inner.state {
            CircuitState::Open if self.recovery_elapsed(&inner) => CircuitState::HalfOpen,
            other => other,
        }
    }

    /// Time until an open circuit allows a trial call; zero otherwise
    pub fn time_until_retry(&self) -> Duration {
        let inner = self.inner.lock().expect("breaker mutex poisoned");
        match (inner.state, inner.last_failure) {
            (CircuitState::Open, Some(at)) => {
                self.recovery_timeout.saturating_sub(at.elapsed())
            }
            _ => Duration::ZERO,
        }
    }

    /// Decide whether a call may proceed, transitioning Open -> HalfOpen
    /// when the recovery timeout has elapsed.
    fn acquire(&self) -> Result<()> {
        let mut inner = self.inner.lock().expect("breaker mutex poisoned");
        match inner.state {
            CircuitState::Closed | CircuitState::HalfOpen => Ok(()),
            CircuitState::Open => {
                if self.recovery_elapsed(&inner) {
                    inner.state = CircuitState::HalfOpen;
                    tracing::info!(breaker = %self.name, "Circuit half-open, allowing trial call");
                    Ok(())
                } else {
                    let remaining = inner
                        .last_failure
                        .map(|at| self.recovery_timeout.saturating_sub(at.elapsed()))
                        .unwrap_or(self.recovery_timeout);
                    Err(CopysmithError::CircuitOpen {
                        name: self.name.clone(),
                        retry_after_secs: remaining.as_secs().max(1),
                    })
                }
            }
        }
    }

    fn on_success(&self) {
        let mut inner = self.inner.lock().expect("breaker mutex poisoned");
        if inner.state == CircuitState::HalfOpen {
            tracing::info!(breaker = %self.name, "Trial call succeeded, circuit closed");
        }
        inner.state = CircuitState::Closed;
        inner.failure_count = 0;
    }

    fn on_failure(&self) {
        let mut inner = self.inner.lock().expect("breaker mutex poisoned");
        inner.last_failure = Some(Instant::now());
        match inner.state {
            CircuitState::HalfOpen => {
                inner.state = CircuitState::Open;
                tracing::warn!(breaker = %self.name, "Trial call failed, circuit re-opened");
            }
            CircuitState::Closed => {
                inner.failure_count += 1;
                if inner.failure_count >= self.threshold {
                    inner.state = CircuitState::Open;
                    tracing::warn!(
                        breaker = %self.name,
                        failures = inner.failure_count,
                        "Failure threshold reached, circuit opened"
                    );
                }
            }
            // A failure reported while already open leaves the state as is;
            // the refreshed timestamp extends the cooldown.
            CircuitState::Open => {}
        }
    }

    fn recovery_elapsed(&self, inner: &BreakerInner) -> bool {
        inner
            .last_failure
            .map(|at| at.elapsed() >= self.recovery_timeout)
            .unwrap_or(true)
    }
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        // Conservative defaults: 3 failures, 120 second recovery
        Self::new("default", 3, Duration::from_secs(120))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;

    fn fail() -> Result<()> {
        Err(CopysmithError::Api("simulated failure".to_string()))
    }

    #[test]
    fn test_state_display_names() {
        assert_eq!(CircuitState::Closed.to_string(), "closed");
        assert_eq!(CircuitState::Open.to_string(), "open");
        assert_eq!(CircuitState::HalfOpen.to_string(), "half-open");
    }

    #[test]
    fn test_initial_state_closed() {
        let cb = CircuitBreaker::default();
        assert_eq!(cb.state(), CircuitState::Closed);
        assert_eq!(cb.snapshot().failure_count, 0);
    }

    #[test]
    fn test_opens_after_threshold() {
        let cb = CircuitBreaker::new("test", 3, Duration::from_secs(60));

        assert!(cb.call(fail).is_err());
        assert_eq!(cb.state(), CircuitState::Closed);
        assert!(cb.call(fail).is_err());
        assert_eq!(cb.state(), CircuitState::Closed);
        assert!(cb.call(fail).is_err());
        assert_eq!(cb.state(), CircuitState::Open);
    }

    #[test]
    fn test_open_rejects_without_invoking() {
        let cb = CircuitBreaker::new("test", 2, Duration::from_secs(60));
        let _ = cb.call(fail);
        let _ = cb.call(fail);

        let mut invoked = false;
        let result = cb.call(|| {
            invoked = true;
            Ok(())
        });

        assert!(!invoked);
        match result {
            Err(CopysmithError::CircuitOpen {
                name,
                retry_after_secs,
            }) => {
                assert_eq!(name, "test");
                assert!(retry_after_secs > 0 && retry_after_secs <= 60);
            }
            other => panic!("expected CircuitOpen, got {:?}", other),
        }
    }

    #[test]
    fn test_success_resets_failures() {
        let cb = CircuitBreaker::new("test", 3, Duration::from_secs(60));
        let _ = cb.call(fail);
        let _ = cb.call(fail);
        assert_eq!(cb.snapshot().failure_count, 2);

        cb.call(|| Ok(())).unwrap();
        assert_eq!(cb.snapshot().failure_count, 0);
        assert_eq!(cb.state(), CircuitState::Closed);
    }

    #[test]
    fn test_half_open_recovery_closes_circuit() {
        let cb = CircuitBreaker::new("test", 2, Duration::from_millis(50));
        let _ = cb.call(fail);
        let _ = cb.call(fail);
        assert_eq!(cb.state(), CircuitState::Open);

        sleep(Duration::from_millis(60));
        assert_eq!(cb.state(), CircuitState::HalfOpen);

        cb.call(|| Ok(())).unwrap();
        assert_eq!(cb.state(), CircuitState::Closed);
        assert_eq!(cb.snapshot().failure_count, 0);
    }

    #[test]
    fn test_half_open_trial_failure_reopens() {
        let cb = CircuitBreaker::new("test", 2, Duration::from_millis(50));
        let _ = cb.call(fail);
        let _ = cb.call(fail);

        sleep(Duration::from_millis(60));
        assert!(cb.call(fail).is_err());
        assert_eq!(cb.state(), CircuitState::Open);
        // Timestamp was refreshed by the trial failure
        assert!(cb.time_until_retry() > Duration::ZERO);
    }

    #[test]
    fn test_reset_forces_closed() {
        let cb = CircuitBreaker::new("test", 1, Duration::from_secs(60));
        let _ = cb.call(fail);
        assert_eq!(cb.state(), CircuitState::Open);

        cb.reset();
        assert_eq!(cb.state(), CircuitState::Closed);
        assert_eq!(cb.snapshot().failure_count, 0);
        cb.call(|| Ok(())).unwrap();
    }

    #[tokio::test]
    async fn test_async_call_shares_transitions() {
        let cb = CircuitBreaker::new("test", 2, Duration::from_secs(60));

        let err = cb
            .call_async(|| async { fail() })
            .await
            .unwrap_err();
        assert!(matches!(err, CopysmithError::Api(_)));
        let _ = cb.call_async(|| async { fail() }).await;
        assert_eq!(cb.state(), CircuitState::Open);

        // Rejected before the future is built
        let rejected = cb.call_async(|| async { Ok(()) }).await;
        assert!(matches!(
            rejected,
            Err(CopysmithError::CircuitOpen { .. })
        ));
    }
}

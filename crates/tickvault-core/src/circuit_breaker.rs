//! Circuit breaker guarding upstream provider calls.
//!
//! Repeated transport failures open the circuit; while open, the adapter
//! fails fast and the resolver falls back to cached snapshots. After the
//! open timeout a single probe request is allowed through.

use std::sync::Mutex;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CircuitBreakerConfig {
    pub failure_threshold: u32,
    pub open_timeout: Duration,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 3,
            open_timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Default)]
struct CircuitInner {
    consecutive_failures: u32,
    opened_at: Option<Instant>,
    probing: bool,
}

#[derive(Debug, Default)]
pub struct CircuitBreaker {
    config: CircuitBreakerConfig,
    inner: Mutex<CircuitInner>,
}

impl CircuitBreaker {
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self {
            config,
            inner: Mutex::new(CircuitInner::default()),
        }
    }

    pub fn state(&self) -> CircuitState {
        let inner = self.inner.lock().expect("breaker lock poisoned");
        self.state_of(&inner)
    }

    fn state_of(&self, inner: &CircuitInner) -> CircuitState {
        match inner.opened_at {
            None => CircuitState::Closed,
            Some(opened_at) if opened_at.elapsed() >= self.config.open_timeout => {
                CircuitState::HalfOpen
            }
            Some(_) => CircuitState::Open,
        }
    }

    /// Whether a request may be attempted right now. In the half-open state
    /// only one probe passes until its outcome is recorded.
    pub fn allow_request(&self) -> bool {
        let mut inner = self.inner.lock().expect("breaker lock poisoned");
        match self.state_of(&inner) {
            CircuitState::Closed => true,
            CircuitState::Open => false,
            CircuitState::HalfOpen => {
                if inner.probing {
                    false
                } else {
                    inner.probing = true;
                    true
                }
            }
        }
    }

    pub fn record_success(&self) {
        let mut inner = self.inner.lock().expect("breaker lock poisoned");
        inner.consecutive_failures = 0;
        inner.opened_at = None;
        inner.probing = false;
    }

    pub fn record_failure(&self) {
        let mut inner = self.inner.lock().expect("breaker lock poisoned");
        inner.consecutive_failures += 1;
        inner.probing = false;
        if inner.consecutive_failures >= self.config.failure_threshold {
            inner.opened_at = Some(Instant::now());
        }
    }
}

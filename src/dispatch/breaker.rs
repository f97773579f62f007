//! Per-channel circuit breaker
//!
//! After `failure_threshold` consecutive failures the breaker opens and
//! every send is refused without I/O. While open, one probe is let through
//! each time the probe delay elapses; the delay for probe `n` is
//! `probe_first × probe_factor^n`, capped at `probe_max`. Any success closes
//! the breaker and resets the counters.

use embassy_time::{Duration, Instant};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BreakerPolicy {
    pub failure_threshold: u32,
    pub probe_first: Duration,
    pub probe_max: Duration,
    pub probe_factor: f32,
}

impl Default for BreakerPolicy {
    fn default() -> Self {
        Self {
            failure_threshold: 10,
            probe_first: Duration::from_secs(1),
            probe_max: Duration::from_secs(30),
            probe_factor: 2.0,
        }
    }
}

impl BreakerPolicy {
    /// Delay before probe number `attempt` (0-indexed)
    pub fn probe_delay(&self, attempt: u32) -> Duration {
        let max = self.probe_max.as_micros() as f64;
        let exponent = attempt.min(i32::MAX as u32) as i32;
        let micros = self.probe_first.as_micros() as f64 * f64::from(self.probe_factor).powi(exponent);
        if !micros.is_finite() || micros < 0.0 || micros > max {
            self.probe_max
        } else {
            Duration::from_micros(micros as u64)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BreakerState {
    Closed,
    Open,
}

#[derive(Debug, Clone)]
pub struct CircuitBreaker {
    policy: BreakerPolicy,
    state: BreakerState,
    consecutive_failures: u32,
    probes: u32,
    next_probe: Option<Instant>,
    total_requests: u64,
    total_failures: u64,
    last_success: Option<Instant>,
    last_failure: Option<Instant>,
    last_error: Option<String>,
}

impl CircuitBreaker {
    pub fn new(policy: BreakerPolicy) -> Self {
        Self {
            policy,
            state: BreakerState::Closed,
            consecutive_failures: 0,
            probes: 0,
            next_probe: None,
            total_requests: 0,
            total_failures: 0,
            last_success: None,
            last_failure: None,
            last_error: None,
        }
    }

    /// Whether a send may go out at `now`
    pub fn allow(&self, now: Instant) -> bool {
        match self.state {
            BreakerState::Closed => true,
            BreakerState::Open => self.next_probe.is_some_and(|probe| now >= probe),
        }
    }

    pub fn record_success(&mut self, now: Instant) {
        self.total_requests += 1;
        self.consecutive_failures = 0;
        self.probes = 0;
        self.next_probe = None;
        self.state = BreakerState::Closed;
        self.last_success = Some(now);
    }

    /// Record a failure; returns `true` when this failure opened the breaker
    pub fn record_failure(&mut self, now: Instant, error: impl Into<String>) -> bool {
        self.total_requests += 1;
        self.total_failures += 1;
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        self.last_failure = Some(now);
        self.last_error = Some(error.into());

        match self.state {
            BreakerState::Closed => {
                if self.consecutive_failures >= self.policy.failure_threshold {
                    self.state = BreakerState::Open;
                    self.probes = 0;
                    self.next_probe = Some(now + self.policy.probe_delay(0));
                    true
                } else {
                    false
                }
            }
            BreakerState::Open => {
                self.probes = self.probes.saturating_add(1);
                self.next_probe = Some(now + self.policy.probe_delay(self.probes));
                false
            }
        }
    }

    pub fn state(&self) -> BreakerState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.state == BreakerState::Open
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    pub fn next_probe(&self) -> Option<Instant> {
        self.next_probe
    }

    pub fn total_requests(&self) -> u64 {
        self.total_requests
    }

    pub fn total_failures(&self) -> u64 {
        self.total_failures
    }

    pub fn last_success(&self) -> Option<Instant> {
        self.last_success
    }

    pub fn last_failure(&self) -> Option<Instant> {
        self.last_failure
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }
}

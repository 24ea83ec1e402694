//! The breaker's state machine, kept free of locking and I/O.
//!
//! `BreakerState` is only ever touched while the owning breaker holds its
//! lock. Each method is one complete transition on the snapshot, so the gate
//! check and the admission of a half-open trial happen together.

use super::CircuitBreakerSettings;
use crate::utils::Timestamp;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Instant;

/// Circuit breaker states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CircuitState {
    /// Calls pass through.
    #[default]
    Closed,
    /// Calls are rejected without running.
    Open,
    /// A limited number of trial calls are let through.
    HalfOpen,
}

impl fmt::Display for CircuitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Closed => write!(f, "closed"),
            Self::Open => write!(f, "open"),
            Self::HalfOpen => write!(f, "half_open"),
        }
    }
}

/// How a call got past the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Admission {
    /// Admitted while closed.
    Normal,
    /// Admitted as a half-open trial; `epoch` identifies the probation period.
    Trial { epoch: u64 },
}

/// A state change produced by a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Transition {
    pub from: CircuitState,
    pub to: CircuitState,
}

/// Mutable breaker state.
#[derive(Debug, Clone)]
pub(crate) struct BreakerState {
    pub state: CircuitState,
    pub failure_count: u32,
    pub half_open_success_count: u32,
    /// Monotonic time of the last failure, used for the reset timeout.
    pub last_failure_at: Option<Instant>,
    /// Wall-clock time of the last failure, reported to callers.
    pub last_failure_time: Option<Timestamp>,
    /// Trials admitted in the current probation period whose result is pending.
    pub trials_in_flight: u32,
    /// Incremented on every entry into `HalfOpen`.
    pub epoch: u64,
}

impl Default for BreakerState {
    fn default() -> Self {
        Self::new()
    }
}

impl BreakerState {
    pub const fn new() -> Self {
        Self {
            state: CircuitState::Closed,
            failure_count: 0,
            half_open_success_count: 0,
            last_failure_at: None,
            last_failure_time: None,
            trials_in_flight: 0,
            epoch: 0,
        }
    }

    /// Decides whether a call may run.
    ///
    /// Returns the admission and the transition it caused, or `Err` with the
    /// transition (if any) when the call is rejected.
    pub fn admit(
        &mut self,
        now: Instant,
        settings: &CircuitBreakerSettings,
    ) -> Result<(Admission, Option<Transition>), Option<Transition>> {
        let mut transition = None;

        if self.state == CircuitState::Open {
            let elapsed = match self.last_failure_at {
                Some(at) => now.saturating_duration_since(at) >= settings.reset_timeout,
                None => true,
            };
            if !elapsed {
                return Err(None);
            }
            transition = Some(self.move_to(CircuitState::HalfOpen));
        }

        match self.state {
            CircuitState::Closed => Ok((Admission::Normal, transition)),
            CircuitState::HalfOpen => {
                let permits = settings
                    .half_open_success_threshold
                    .saturating_sub(self.half_open_success_count)
                    .max(1);
                if self.trials_in_flight < permits {
                    self.trials_in_flight += 1;
                    Ok((Admission::Trial { epoch: self.epoch }, transition))
                } else {
                    Err(transition)
                }
            }
            CircuitState::Open => Err(transition),
        }
    }

    /// Records a successful call.
    pub fn record_success(
        &mut self,
        admission: Admission,
        settings: &CircuitBreakerSettings,
    ) -> Option<Transition> {
        self.release(admission);

        if self.state != CircuitState::HalfOpen {
            return None;
        }
        self.half_open_success_count += 1;
        if self.half_open_success_count >= settings.half_open_success_threshold {
            return Some(self.move_to(CircuitState::Closed));
        }
        None
    }

    /// Records a failed call, in any state.
    pub fn record_failure(
        &mut self,
        admission: Admission,
        now: Instant,
        wall: Timestamp,
        settings: &CircuitBreakerSettings,
    ) -> Option<Transition> {
        self.release(admission);

        self.failure_count = self.failure_count.saturating_add(1);
        self.last_failure_at = Some(now);
        self.last_failure_time = Some(wall);

        if self.failure_count >= settings.failure_threshold && self.state != CircuitState::Open {
            return Some(self.move_to(CircuitState::Open));
        }
        None
    }

    /// Forces the breaker closed with zeroed counters.
    pub fn reset(&mut self) -> Option<Transition> {
        let from = self.state;
        self.move_to(CircuitState::Closed);
        self.last_failure_at = None;
        self.last_failure_time = None;
        (from != CircuitState::Closed).then_some(Transition {
            from,
            to: CircuitState::Closed,
        })
    }

    /// Returns a trial permit whose result will never be recorded.
    pub fn release(&mut self, admission: Admission) {
        if let Admission::Trial { epoch } = admission {
            if epoch == self.epoch && self.state == CircuitState::HalfOpen {
                self.trials_in_flight = self.trials_in_flight.saturating_sub(1);
            }
        }
    }

    fn move_to(&mut self, to: CircuitState) -> Transition {
        let from = self.state;
        self.state = to;
        self.trials_in_flight = 0;
        match to {
            CircuitState::Closed => {
                self.failure_count = 0;
                self.half_open_success_count = 0;
            }
            CircuitState::HalfOpen => {
                self.half_open_success_count = 0;
                self.epoch += 1;
            }
            CircuitState::Open => {}
        }
        Transition { from, to }
    }
}

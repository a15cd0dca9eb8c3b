//! Refresh cycle bookkeeping.
//!
//! Every cycle is stamped with a [`Generation`]. Completions carry the stamp
//! they were started with and are applied only while the scheduler is
//! running and the stamp is still the newest one. Generations never reset,
//! so a completion that outlives a stop/start pair can never match again.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::capabilities::TimerId;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Generation(pub u64);

impl Generation {
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

impl std::fmt::Display for Generation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SchedulerState {
    #[default]
    Idle,
    Running,
    Stopped,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RefreshScheduler {
    state: SchedulerState,
    generation: Generation,
    in_flight: Option<Generation>,
    timer: Option<TimerId>,
    timers_issued: u64,
}

impl RefreshScheduler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn state(&self) -> SchedulerState {
        self.state
    }

    #[must_use]
    pub const fn is_running(&self) -> bool {
        matches!(self.state, SchedulerState::Running)
    }

    #[must_use]
    pub const fn latest(&self) -> Generation {
        self.generation
    }

    #[must_use]
    pub const fn timer(&self) -> Option<TimerId> {
        self.timer
    }

    /// True while the newest cycle has not finished.
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Moves to `Running` and hands out a fresh timer id to arm. Returns
    /// `None` if already running.
    pub fn start(&mut self) -> Option<TimerId> {
        if self.is_running() {
            debug!("Refresh scheduler already running");
            return None;
        }
        self.state = SchedulerState::Running;
        self.timers_issued += 1;
        let id = TimerId(self.timers_issued);
        self.timer = Some(id);
        Some(id)
    }

    /// Moves to `Stopped`. Returns the timer that needs cancelling, if any.
    pub fn stop(&mut self) -> Option<TimerId> {
        self.state = SchedulerState::Stopped;
        self.in_flight = None;
        self.timer.take()
    }

    /// Stamps a new cycle. Returns `None` unless running.
    pub fn begin_cycle(&mut self) -> Option<Generation> {
        if !self.is_running() {
            return None;
        }
        self.generation = self.generation.next();
        self.in_flight = Some(self.generation);
        Some(self.generation)
    }

    #[must_use]
    pub fn accepts(&self, generation: Generation) -> bool {
        self.is_running() && generation == self.generation
    }

    /// Marks `generation` as done. Returns whether its result may be applied.
    pub fn finish_cycle(&mut self, generation: Generation) -> bool {
        if !self.accepts(generation) {
            debug!(
                generation = generation.0,
                latest = self.generation.0,
                state = ?self.state,
                "Discarding stale refresh completion"
            );
            return false;
        }
        self.in_flight = None;
        true
    }

    /// Whether a tick from `id` belongs to the armed timer.
    #[must_use]
    pub fn owns_timer(&self, id: TimerId) -> bool {
        self.is_running() && self.timer == Some(id)
    }
}

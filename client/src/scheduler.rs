//! Fixed-delay tick scheduling for the simulation
//!
//! The frame loop polls the scheduler with the current time. When the
//! deadline has passed exactly one tick is applied and the next deadline is
//! armed from that moment using the session's (possibly shorter) interval.
//! Stalled frames never produce a burst of catch-up ticks.

use crate::game::{GameSession, TickOutcome};
use std::time::{Duration, Instant};

#[derive(Debug, Default)]
pub struct TickScheduler {
    deadline: Option<Instant>,
}

impl TickScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arm(&mut self, now: Instant, interval: Duration) {
        self.deadline = Some(now + interval);
    }

    /// Stops rescheduling. A tick never runs half-applied, so this is all
    /// cancellation needs to do.
    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Returns true once per deadline, disarming the scheduler.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }

    /// Runs the session forward if a tick is due.
    ///
    /// Arms on the first poll after the session starts running and cancels
    /// as soon as it stops (pause, game over).
    pub fn drive(&mut self, session: &mut GameSession, now: Instant) -> Option<TickOutcome> {
        if !session.is_running() {
            self.cancel();
            return None;
        }
        if !self.is_armed() {
            self.arm(now, session.tick_duration());
            return None;
        }
        if !self.poll(now) {
            return None;
        }

        let outcome = session.tick();
        if session.is_running() {
            self.arm(now, session.tick_duration());
        }
        Some(outcome)
    }
}

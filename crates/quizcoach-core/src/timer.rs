//! Per-question countdown.
//!
//! [`Countdown`] is the pure second counter the controller owns.
//! [`QuestionTimer`] is the tokio task that wakes the controller once per
//! second; dropping it aborts the task. Every tick carries the ticket of the
//! question it was started for, so a tick that slips through after the
//! question changed is recognized as stale by the controller.

use std::time::Duration;

use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use crate::model::Difficulty;
use crate::session::{SessionEvent, Ticket};

const TICK: Duration = Duration::from_secs(1);

/// Remaining seconds for the current question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Countdown {
    remaining: u32,
}

/// What a single tick did to the countdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Running(u32),
    /// This tick brought the countdown to zero.
    Expired,
    /// The countdown was already at zero.
    AlreadyExpired,
}

impl Countdown {
    pub fn for_difficulty(difficulty: Difficulty) -> Self {
        Self::from_secs(difficulty.timer_secs())
    }

    pub fn from_secs(secs: u32) -> Self {
        Self { remaining: secs }
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn is_expired(&self) -> bool {
        self.remaining == 0
    }

    pub fn tick(&mut self) -> TickOutcome {
        match self.remaining {
            0 => TickOutcome::AlreadyExpired,
            1 => {
                self.remaining = 0;
                TickOutcome::Expired
            }
            n => {
                self.remaining = n - 1;
                TickOutcome::Running(self.remaining)
            }
        }
    }
}

/// Background task emitting one [`SessionEvent::TimerTick`] per second.
///
/// Owned by the controller for exactly one question. Dropping it stops the
/// ticks.
#[derive(Debug)]
pub struct QuestionTimer {
    ticket: Ticket,
    handle: JoinHandle<()>,
}

impl QuestionTimer {
    /// Spawn the ticking task. Must be called from within a tokio runtime.
    pub fn start(ticket: Ticket, secs: u32, events: UnboundedSender<SessionEvent>) -> Self {
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval_at(Instant::now() + TICK, TICK);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            for _ in 0..secs {
                interval.tick().await;
                if events.send(SessionEvent::TimerTick { ticket }).is_err() {
                    break;
                }
            }
        });
        tracing::debug!(ticket = %ticket, secs, "question timer started");
        Self { ticket, handle }
    }
}

impl Drop for QuestionTimer {
    fn drop(&mut self) {
        self.handle.abort();
        tracing::debug!(ticket = %self.ticket, "question timer stopped");
    }
}

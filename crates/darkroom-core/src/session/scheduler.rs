//! Debounced render scheduling.
//!
//! Every mutation arms the scheduler and pushes its deadline out by the
//! quiescence window. [`RenderScheduler::poll`] reports `true` exactly once
//! after the window passes with no further mutations. While a stroke is
//! being painted the scheduler is held; releasing the hold arms it once.
//!
//! Time is passed in explicitly so the event loop owns the clock.

use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct RenderScheduler {
    window: Duration,
    deadline: Option<Instant>,
    held: bool,
}

impl RenderScheduler {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            deadline: None,
            held: false,
        }
    }

    /// Request a render, resetting the deadline.
    pub fn arm(&mut self, now: Instant) {
        self.deadline = Some(now + self.window);
    }

    /// Suppress firing until [`release`](Self::release), e.g. during a stroke.
    pub fn hold(&mut self) {
        self.held = true;
    }

    /// End a hold and arm once.
    pub fn release(&mut self, now: Instant) {
        self.held = false;
        self.arm(now);
    }

    /// `true` if the deadline has passed; the request is consumed.
    pub fn poll(&mut self, now: Instant) -> bool {
        if self.held {
            return false;
        }
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }

    /// Time left until the pending render fires, if one is armed and not held.
    pub fn time_until_due(&self, now: Instant) -> Option<Duration> {
        if self.held {
            return None;
        }
        self.deadline.map(|d| d.saturating_duration_since(now))
    }
}

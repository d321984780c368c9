//! Timers and cancellation for the processor loop.
//!
//! The loop asks `Cadence::poll` once per iteration with the current
//! monotonic time. Each timer fires independently of the others and of
//! input availability; nothing here reads a clock, so tests drive time by
//! hand.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Default snapshot publish period.
pub const PUBLISH_PERIOD: Duration = Duration::from_secs(2);
/// Default classifier window length.
pub const RESET_PERIOD: Duration = Duration::from_secs(60);
/// Default diagnostics log period.
pub const DIAGNOSTICS_PERIOD: Duration = Duration::from_secs(30);

// ---------------------------------------------------------------------------
// Interval
// ---------------------------------------------------------------------------

/// A repeating timer. Fires once `period` has elapsed since it last fired,
/// then restarts from the time it fired.
#[derive(Debug, Clone, Copy)]
pub struct Interval {
    period: Duration,
    last: Instant,
}

impl Interval {
    pub fn new(period: Duration, start: Instant) -> Self {
        Interval {
            period,
            last: start,
        }
    }

    /// True (and restarted) if the period has elapsed at `now`.
    pub fn fire(&mut self, now: Instant) -> bool {
        if now.saturating_duration_since(self.last) >= self.period {
            self.last = now;
            true
        } else {
            false
        }
    }
}

// ---------------------------------------------------------------------------
// Cadence
// ---------------------------------------------------------------------------

/// Which timers fired on one poll.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Due {
    pub publish: bool,
    pub reset_window: bool,
    pub diagnostics: bool,
}

/// The processor's three independent timers.
#[derive(Debug, Clone)]
pub struct Cadence {
    publish: Interval,
    reset_window: Interval,
    diagnostics: Option<Interval>,
}

impl Cadence {
    /// Build the timers, all starting at `start`. A `None` diagnostics
    /// period disables the diagnostics timer.
    pub fn new(
        publish: Duration,
        reset_window: Duration,
        diagnostics: Option<Duration>,
        start: Instant,
    ) -> Self {
        Cadence {
            publish: Interval::new(publish, start),
            reset_window: Interval::new(reset_window, start),
            diagnostics: diagnostics.map(|period| Interval::new(period, start)),
        }
    }

    pub fn poll(&mut self, now: Instant) -> Due {
        Due {
            publish: self.publish.fire(now),
            reset_window: self.reset_window.fire(now),
            diagnostics: self
                .diagnostics
                .as_mut()
                .is_some_and(|interval| interval.fire(now)),
        }
    }
}

// ---------------------------------------------------------------------------
// Shutdown
// ---------------------------------------------------------------------------

/// Cooperative cancellation flag shared between the signal handler and the
/// loop. The loop checks it once per iteration.
#[derive(Debug, Clone, Default)]
pub struct ShutdownToken {
    cancelled: Arc<AtomicBool>,
}

impl ShutdownToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

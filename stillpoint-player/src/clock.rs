//! Session countdown clock
//!
//! Pure tick-counting state: the engine's drive task calls [`SessionClock::tick`]
//! once per wall-clock second while the session is playing, so pausing the
//! session simply stops the ticks (elapsed time is net of paused intervals).
//! A periodic 1 Hz timer accumulates some drift over long sessions; that is
//! accepted behavior.

/// Result of advancing the clock by one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockTick {
    /// Elapsed seconds after the tick
    pub elapsed: u64,
    /// True exactly once, on the tick that reaches the session duration
    pub completed: bool,
}

/// One-hertz countable session timer
///
/// `elapsed` never exceeds `duration` and the completion signal latches:
/// re-entering `tick()` after completion can never fire it again.
#[derive(Debug, Clone)]
pub struct SessionClock {
    elapsed: u64,
    duration: u64,
    finished: bool,
}

impl SessionClock {
    /// Create a clock for a session of `duration_seconds`
    pub fn new(duration_seconds: u64) -> Self {
        Self {
            elapsed: 0,
            duration: duration_seconds,
            finished: false,
        }
    }

    /// Elapsed seconds since the session began playing
    pub fn elapsed(&self) -> u64 {
        self.elapsed
    }

    /// Configured session duration in seconds
    pub fn duration(&self) -> u64 {
        self.duration
    }

    /// Whether the completion signal has fired
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Advance by one second.
    ///
    /// Returns the new elapsed value and whether this tick completed the
    /// session. The completion flag is true at most once per clock instance.
    pub fn tick(&mut self) -> ClockTick {
        if self.finished {
            return ClockTick {
                elapsed: self.elapsed,
                completed: false,
            };
        }

        if self.elapsed < self.duration {
            self.elapsed += 1;
        }

        let completed = self.elapsed >= self.duration;
        if completed {
            self.finished = true;
        }

        ClockTick {
            elapsed: self.elapsed,
            completed,
        }
    }

    /// Jump to an absolute position, clamped to `[0, duration]`.
    ///
    /// Seeking never un-latches a fired completion signal. Returns the
    /// clamped position.
    pub fn seek_to(&mut self, seconds: u64) -> u64 {
        self.elapsed = seconds.min(self.duration);
        self.elapsed
    }
}

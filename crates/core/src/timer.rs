use std::time::Duration;

use thiserror::Error;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum TimerError {
    #[error("a timer is already running")]
    AlreadyRunning,
    #[error("no timer is running")]
    NotRunning,
}

//
// ─── PHASE ─────────────────────────────────────────────────────────────────────
//

/// Lifecycle of one countdown run.
///
/// `Completed` and `Cancelled` are terminal for that run; starting again
/// begins a fresh run from `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerPhase {
    Idle,
    Running,
    Completed,
    Cancelled,
}

//
// ─── COUNTDOWN ─────────────────────────────────────────────────────────────────
//

/// Pure countdown state. The caller feeds it elapsed time from whatever
/// monotonic clock drives it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Countdown {
    total_minutes: u32,
    remaining_secs: u64,
    phase: TimerPhase,
}

impl Countdown {
    #[must_use]
    pub fn new(total_minutes: u32) -> Self {
        Self {
            total_minutes,
            remaining_secs: u64::from(total_minutes) * 60,
            phase: TimerPhase::Idle,
        }
    }

    /// A countdown that is already running from its full length.
    #[must_use]
    pub fn running(total_minutes: u32) -> Self {
        Self {
            phase: TimerPhase::Running,
            ..Self::new(total_minutes)
        }
    }

    #[must_use]
    pub fn total_minutes(&self) -> u32 {
        self.total_minutes
    }

    #[must_use]
    pub fn total(&self) -> Duration {
        Duration::from_secs(u64::from(self.total_minutes) * 60)
    }

    #[must_use]
    pub fn remaining_secs(&self) -> u64 {
        self.remaining_secs
    }

    #[must_use]
    pub fn phase(&self) -> TimerPhase {
        self.phase
    }

    /// Idle -> Running. A finished countdown restarts from its full length.
    ///
    /// # Errors
    ///
    /// Returns `TimerError::AlreadyRunning` when called on a running countdown.
    pub fn start(&mut self) -> Result<(), TimerError> {
        if self.phase == TimerPhase::Running {
            return Err(TimerError::AlreadyRunning);
        }
        self.remaining_secs = u64::from(self.total_minutes) * 60;
        self.phase = TimerPhase::Running;
        Ok(())
    }

    /// Recompute remaining time from the elapsed duration since start.
    ///
    /// Partial seconds round up, so `00:00` only shows once the full
    /// duration has passed. Reaching zero completes the run.
    pub fn sync(&mut self, elapsed: Duration) -> TimerPhase {
        if self.phase != TimerPhase::Running {
            return self.phase;
        }
        let left = self.total().saturating_sub(elapsed);
        let mut secs = left.as_secs();
        if left.subsec_nanos() > 0 {
            secs += 1;
        }
        self.remaining_secs = secs;
        if secs == 0 {
            self.phase = TimerPhase::Completed;
        }
        self.phase
    }

    /// Running -> Cancelled. No effect once finished.
    ///
    /// # Errors
    ///
    /// Returns `TimerError::NotRunning` if the countdown was never started.
    pub fn cancel(&mut self) -> Result<TimerPhase, TimerError> {
        match self.phase {
            TimerPhase::Idle => Err(TimerError::NotRunning),
            TimerPhase::Running => {
                self.phase = TimerPhase::Cancelled;
                Ok(self.phase)
            }
            finished => Ok(finished),
        }
    }

    #[must_use]
    pub fn display(&self) -> String {
        format_remaining(self.remaining_secs)
    }
}

/// Formats seconds as `MM:SS`. Minutes are not wrapped into hours.
#[must_use]
pub fn format_remaining(secs: u64) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_minutes_and_seconds() {
        assert_eq!(format_remaining(0), "00:00");
        assert_eq!(format_remaining(59), "00:59");
        assert_eq!(format_remaining(25 * 60), "25:00");
        assert_eq!(format_remaining(125 * 60 + 7), "125:07");
    }

    #[test]
    fn runs_to_completion() {
        let mut c = Countdown::new(1);
        assert_eq!(c.phase(), TimerPhase::Idle);
        c.start().unwrap();
        assert_eq!(c.sync(Duration::from_secs(1)), TimerPhase::Running);
        assert_eq!(c.display(), "00:59");
        assert_eq!(c.sync(Duration::from_millis(59_500)), TimerPhase::Running);
        assert_eq!(c.remaining_secs(), 1);
        assert_eq!(c.sync(Duration::from_secs(60)), TimerPhase::Completed);
        assert_eq!(c.display(), "00:00");
    }

    #[test]
    fn cancel_is_terminal_and_restart_allowed() {
        let mut c = Countdown::new(2);
        assert_eq!(c.cancel(), Err(TimerError::NotRunning));
        c.start().unwrap();
        assert_eq!(c.start(), Err(TimerError::AlreadyRunning));
        c.sync(Duration::from_secs(30));
        assert_eq!(c.cancel(), Ok(TimerPhase::Cancelled));
        assert_eq!(c.sync(Duration::from_secs(500)), TimerPhase::Cancelled);

        c.start().unwrap();
        assert_eq!(c.remaining_secs(), 120);
        assert_eq!(c.phase(), TimerPhase::Running);
    }

    #[test]
    fn zero_minutes_completes_on_first_sync() {
        let mut c = Countdown::new(0);
        c.start().unwrap();
        assert_eq!(c.sync(Duration::ZERO), TimerPhase::Completed);
    }

    #[test]
    fn running_countdown_needs_no_start() {
        let mut c = Countdown::running(1);
        assert_eq!(c.phase(), TimerPhase::Running);
        assert_eq!(c.remaining_secs(), 60);
        assert_eq!(c.start(), Err(TimerError::AlreadyRunning));
        assert_eq!(c.cancel(), Ok(TimerPhase::Cancelled));
    }
}

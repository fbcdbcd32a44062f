//! Countdown timer running as a background task.
//!
//! The countdown is driven by `tokio::time` and ends either when its
//! deadline passes or when its cancellation token fires. Remaining time is
//! published on a watch channel for the presentation layer to render.

use std::sync::Arc;
use std::time::Duration;

use study_core::model::StudyTarget;
use study_core::timer::{Countdown, TimerError, TimerPhase, format_remaining};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::error::TimerServiceError;
use crate::notify::{Notice, Notifier};
use crate::session::StudySession;
use crate::study_cycle_service::StudyCycleService;

//
// ─── UPDATES & OUTCOMES ────────────────────────────────────────────────────────
//

/// Snapshot published after every tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerUpdate {
    pub phase: TimerPhase,
    pub remaining_secs: u64,
}

impl TimerUpdate {
    fn of(countdown: &Countdown) -> Self {
        Self {
            phase: countdown.phase(),
            remaining_secs: countdown.remaining_secs(),
        }
    }

    /// Remaining time as `MM:SS`.
    #[must_use]
    pub fn display(&self) -> String {
        format_remaining(self.remaining_secs)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerStatus {
    Completed,
    Cancelled { remaining_secs: u64 },
}

/// How a timer run ended and what it was attributed to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimerOutcome {
    pub status: TimerStatus,
    pub target: StudyTarget,
    pub minutes: u32,
}

impl TimerOutcome {
    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.status == TimerStatus::Completed
    }
}

//
// ─── ENGINE ────────────────────────────────────────────────────────────────────
//

/// Spawns countdown tasks. The tick is how often remaining time is
/// published and how often cancellation can be observed at worst.
#[derive(Debug, Clone, Copy)]
pub struct TimerEngine {
    tick: Duration,
}

impl Default for TimerEngine {
    fn default() -> Self {
        Self {
            tick: Duration::from_secs(1),
        }
    }
}

impl TimerEngine {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawn a countdown of `minutes` on the current tokio runtime.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    #[must_use]
    pub fn spawn(
        &self,
        minutes: u32,
        target: StudyTarget,
        cancel: CancellationToken,
    ) -> TimerHandle {
        let countdown = Countdown::running(minutes);
        let (tx, rx) = watch::channel(TimerUpdate::of(&countdown));
        let task = tokio::spawn(run_countdown(countdown, self.tick, cancel.clone(), tx));
        TimerHandle {
            updates: rx,
            cancel,
            task,
            target,
            minutes,
        }
    }
}

async fn run_countdown(
    mut countdown: Countdown,
    tick: Duration,
    cancel: CancellationToken,
    updates: watch::Sender<TimerUpdate>,
) -> TimerStatus {
    let started = Instant::now();
    let mut ticker = tokio::time::interval_at(started + tick, tick);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        let done = countdown.sync(started.elapsed()) == TimerPhase::Completed;
        if done {
            // Expiry releases the session's active flag even if nobody settles.
            cancel.cancel();
        }
        updates.send_replace(TimerUpdate::of(&countdown));
        if done {
            return TimerStatus::Completed;
        }

        tokio::select! {
            biased;
            () = cancel.cancelled() => {
                // A stop that races the deadline still counts as a stop.
                let elapsed = started.elapsed();
                if elapsed < countdown.total() {
                    countdown.sync(elapsed);
                }
                if let Err(err) = countdown.cancel() {
                    debug!(error = %err, "countdown was not running");
                }
                updates.send_replace(TimerUpdate::of(&countdown));
                return TimerStatus::Cancelled {
                    remaining_secs: countdown.remaining_secs(),
                };
            }
            _ = ticker.tick() => {}
        }
    }
}

/// A running countdown.
#[derive(Debug)]
pub struct TimerHandle {
    updates: watch::Receiver<TimerUpdate>,
    cancel: CancellationToken,
    task: JoinHandle<TimerStatus>,
    target: StudyTarget,
    minutes: u32,
}

impl TimerHandle {
    /// Receiver of remaining-time updates.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<TimerUpdate> {
        self.updates.clone()
    }

    /// Token that stops this run when cancelled; may be handed to other tasks.
    #[must_use]
    pub fn canceller(&self) -> CancellationToken {
        self.cancel.clone()
    }

    #[must_use]
    pub fn target(&self) -> &StudyTarget {
        &self.target
    }

    /// Wait for the run to end.
    ///
    /// # Errors
    ///
    /// Returns `TimerServiceError::Join` if the task panicked or was aborted.
    pub async fn join(self) -> Result<TimerOutcome, TimerServiceError> {
        let status = self
            .task
            .await
            .map_err(|e| TimerServiceError::Join(e.to_string()))?;
        Ok(TimerOutcome {
            status,
            target: self.target,
            minutes: self.minutes,
        })
    }
}

//
// ─── SERVICE ───────────────────────────────────────────────────────────────────
//

/// Starts, stops and settles timer runs against a session.
#[derive(Clone)]
pub struct TimerService {
    engine: TimerEngine,
    study_cycle: StudyCycleService,
    notifier: Arc<dyn Notifier>,
}

impl TimerService {
    #[must_use]
    pub fn new(
        engine: TimerEngine,
        study_cycle: StudyCycleService,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            engine,
            study_cycle,
            notifier,
        }
    }

    /// Start a countdown and mark the session's timer active.
    ///
    /// # Errors
    ///
    /// Returns `TimerError::AlreadyRunning` (wrapped) while another run is active.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    pub fn start(
        &self,
        session: &mut StudySession,
        minutes: u32,
        target: StudyTarget,
    ) -> Result<TimerHandle, TimerServiceError> {
        if session.is_timer_active() {
            return Err(TimerError::AlreadyRunning.into());
        }
        let token = CancellationToken::new();
        session.arm_timer(token.clone());
        info!(minutes, subject = target.label(), "timer started");
        Ok(self.engine.spawn(minutes, target, token))
    }

    /// Clear the session's active flag; the run ends as cancelled.
    ///
    /// # Errors
    ///
    /// Returns `TimerError::NotRunning` (wrapped) when no timer is active.
    pub fn stop(&self, session: &mut StudySession) -> Result<(), TimerServiceError> {
        if session.stop_timer() {
            debug!("timer stop requested");
            Ok(())
        } else {
            Err(TimerError::NotRunning.into())
        }
    }

    /// Record the end of a run on the session.
    ///
    /// A completed run on a real subject accrues `minutes / 60` hours; the
    /// "General" placeholder and cancelled runs accrue nothing. Returns the
    /// hours added.
    ///
    /// # Errors
    ///
    /// Returns `TimerServiceError::StudyCycle` if the subject cannot be updated.
    pub fn settle(
        &self,
        session: &mut StudySession,
        outcome: &TimerOutcome,
    ) -> Result<Option<f64>, TimerServiceError> {
        session.disarm_timer();

        match outcome.status {
            TimerStatus::Cancelled { remaining_secs } => {
                info!(remaining = %format_remaining(remaining_secs), "timer cancelled");
                Ok(None)
            }
            TimerStatus::Completed => {
                self.notifier.notify(Notice::success("Time's up!"));
                let Some(id) = outcome.target.subject_id() else {
                    return Ok(None);
                };
                let hours = self.study_cycle.accrue_to(session, id, outcome.minutes)?;
                self.notifier
                    .notify(Notice::info("Study time logged. Save to keep it."));
                Ok(Some(hours))
            }
        }
    }

    /// Wait for `handle` to finish, then settle it.
    ///
    /// # Errors
    ///
    /// See [`TimerHandle::join`] and [`TimerService::settle`].
    pub async fn finish(
        &self,
        session: &mut StudySession,
        handle: TimerHandle,
    ) -> Result<(TimerOutcome, Option<f64>), TimerServiceError> {
        let outcome = handle.join().await?;
        let hours = self.settle(session, &outcome)?;
        Ok((outcome, hours))
    }
}

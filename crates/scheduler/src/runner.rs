use crate::schedule::WeeklySchedule;
use chrono::{DateTime, Local};
use core_types::Scope;
use mailer::{DispatchOutcome, Dispatcher};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use uuid::Uuid;

/// Source of wall-clock time for the recurring loop.
pub type Clock = Arc<dyn Fn() -> DateTime<Local> + Send + Sync>;

struct Running {
    handle: JoinHandle<()>,
    shutdown: watch::Sender<bool>,
}

/// Owns the weekly all-users trigger and the on-demand entry points.
///
/// Every trigger goes through `Dispatcher::run_contained`, so a failing or
/// panicking run never takes the loop down. Dropping the scheduler closes
/// the shutdown channel, which also ends the loop.
pub struct ReportScheduler {
    dispatcher: Arc<Dispatcher>,
    schedule: WeeklySchedule,
    clock: Clock,
    state: Mutex<Option<Running>>,
}

impl ReportScheduler {
    pub fn new(dispatcher: Arc<Dispatcher>, schedule: WeeklySchedule) -> Self {
        Self::with_clock(dispatcher, schedule, Arc::new(Local::now))
    }

    /// Like `new`, reading wall-clock time from `clock` instead of the system.
    pub fn with_clock(dispatcher: Arc<Dispatcher>, schedule: WeeklySchedule, clock: Clock) -> Self {
        Self {
            dispatcher,
            schedule,
            clock,
            state: Mutex::new(None),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Option<Running>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Starts the recurring loop. Returns `false` if it was already running.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&self) -> bool {
        let mut state = self.lock();
        if state.as_ref().is_some_and(|running| !running.handle.is_finished()) {
            tracing::debug!("Report scheduler already running.");
            return false;
        }

        let (shutdown, shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(run_weekly(
            self.dispatcher.clone(),
            self.schedule,
            self.clock.clone(),
            shutdown_rx,
        ));
        *state = Some(Running { handle, shutdown });

        tracing::info!(
            weekday = %self.schedule.weekday(),
            time = %self.schedule.time(),
            "Report scheduler started."
        );
        true
    }

    /// Signals the loop to stop and waits for it. A run already in progress
    /// is allowed to finish.
    pub async fn stop(&self) {
        let running = self.lock().take();
        let Some(running) = running else {
            return;
        };
        let _ = running.shutdown.send(true);
        if let Err(e) = running.handle.await {
            tracing::error!(error = %e, "Report scheduler task ended abnormally.");
        }
    }

    pub fn is_running(&self) -> bool {
        self.lock()
            .as_ref()
            .is_some_and(|running| !running.handle.is_finished())
    }

    /// On-demand report for one user.
    pub async fn run_for_user(&self, user_id: Uuid) -> DispatchOutcome {
        tracing::info!(%user_id, "On-demand report requested.");
        self.dispatcher.clone().run_contained(Scope::Single(user_id)).await
    }

    /// On-demand report for every user, same as the weekly trigger.
    pub async fn run_for_everyone(&self) -> DispatchOutcome {
        tracing::info!("On-demand consolidated report requested.");
        self.dispatcher.clone().run_contained(Scope::All).await
    }
}

async fn run_weekly(
    dispatcher: Arc<Dispatcher>,
    schedule: WeeklySchedule,
    clock: Clock,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut last_fired: Option<DateTime<Local>> = None;
    loop {
        let now = clock();
        // Anchoring on the last trigger keeps a backwards clock step from
        // firing the same trigger twice.
        let from = match last_fired {
            Some(fired) if fired > now => fired,
            _ => now,
        };
        let Some(next) = schedule.next_after(&from) else {
            tracing::error!("No valid trigger time found; report scheduler stopping.");
            break;
        };
        let wait = next.signed_duration_since(now).to_std().unwrap_or_default();
        tracing::info!(next = %next, "Next consolidated report scheduled.");

        tokio::select! {
            _ = tokio::time::sleep(wait) => {
                last_fired = Some(next);
                let outcome = dispatcher.clone().run_contained(Scope::All).await;
                if outcome.is_success() {
                    tracing::info!(outcome = %outcome.message(), "Weekly report run finished.");
                } else {
                    tracing::warn!(outcome = %outcome.message(), "Weekly report run failed; waiting for the next trigger.");
                }
            }
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
            }
        }
    }
    tracing::info!("Report scheduler stopped.");
}

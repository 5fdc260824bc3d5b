use crate::services::pipeline::{PipelineContext, RunReport};
use crate::services::restaker_sync::sync_restakers;
use crate::services::reward_aggregator::sync_rewards;
use crate::services::validator_sync::sync_validators;
use log::info;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, sleep, Instant, MissedTickBehavior};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Running,
}

/// At most one pipeline run at a time. The transition Idle -> Running is a
/// single compare-and-swap, so a scheduled and a manual trigger racing each
/// other cannot both win.
#[derive(Debug, Default)]
pub struct RunGuard {
    running: AtomicBool,
}

/// Returns the guard to Idle when dropped, on every exit path.
#[derive(Debug)]
pub struct RunPermit<'a> {
    guard: &'a RunGuard,
}

impl RunGuard {
    pub fn try_acquire(&self) -> Option<RunPermit<'_>> {
        self.running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| RunPermit { guard: self })
    }

    pub fn state(&self) -> RunState {
        if self.running.load(Ordering::Acquire) {
            RunState::Running
        } else {
            RunState::Idle
        }
    }
}

impl Drop for RunPermit<'_> {
    fn drop(&mut self) {
        self.guard.running.store(false, Ordering::Release);
    }
}

#[derive(Debug)]
pub enum RunOutcome {
    /// Another run held the guard.
    Skipped,
    Completed(RunReport),
}

#[derive(Debug, Clone, Copy)]
pub struct ScheduleSettings {
    pub startup_delay: Duration,
    pub interval: Duration,
}

pub struct Scheduler {
    ctx: PipelineContext,
    guard: RunGuard,
    schedule: ScheduleSettings,
}

impl Scheduler {
    pub fn new(ctx: PipelineContext, schedule: ScheduleSettings) -> Self {
        Self {
            ctx,
            guard: RunGuard::default(),
            schedule,
        }
    }

    /// Runs the three syncs concurrently and waits for all of them to settle.
    /// One sync failing neither cancels the others nor the run.
    pub async fn fetch_all(&self) -> RunOutcome {
        let Some(_permit) = self.guard.try_acquire() else {
            info!("Data fetching already in progress, skipping");
            return RunOutcome::Skipped;
        };

        info!("Starting data fetch run");
        let started = std::time::Instant::now();
        let (restakers, validators, rewards) = tokio::join!(
            sync_restakers(&self.ctx),
            sync_validators(&self.ctx),
            sync_rewards(&self.ctx),
        );

        let report = RunReport {
            restakers,
            validators,
            rewards,
            elapsed: started.elapsed(),
        };
        report.log();
        RunOutcome::Completed(report)
    }

    pub async fn trigger_now(&self) -> RunOutcome {
        info!("Manual data fetch triggered");
        self.fetch_all().await
    }

    pub fn is_running(&self) -> bool {
        self.state() == RunState::Running
    }

    pub fn state(&self) -> RunState {
        self.guard.state()
    }

    /// Schedules a run shortly after start-up and one every interval. Each
    /// trigger runs on its own task so a slow run turns later ticks into
    /// no-ops instead of delaying the cadence.
    pub fn start(self: Arc<Self>) -> JoinHandle<()> {
        info!(
            "Scheduling data fetching: first run in {:?}, then every {:?}",
            self.schedule.startup_delay, self.schedule.interval
        );

        let startup = Arc::clone(&self);
        tokio::spawn(async move {
            sleep(startup.schedule.startup_delay).await;
            startup.fetch_all().await;
        });

        tokio::spawn(async move {
            let period = self.schedule.interval;
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                info!("Scheduled data fetch triggered");
                let scheduler = Arc::clone(&self);
                tokio::spawn(async move {
                    scheduler.fetch_all().await;
                });
            }
        })
    }
}

//! Fixed-period driver for the watch pipeline
//!
//! The [`Scheduler`] waits for the notification channel to become ready,
//! then runs one pipeline cycle per tick. Cycles never overlap: the loop
//! awaits each one before waiting for the next tick, and a cycle that runs
//! past its period is followed immediately by the next one.
//!
//! # Lifecycle
//!
//! ```text
//!  start ──▶ wait_until_ready ──▶ Idle ──tick──▶ Running ──▶ Idle ──▶ ...
//!                 │ (unauthorized)                                  │
//!                 ▼                                           shutdown
//!               fatal                                               ▼
//!                                                                stopped
//! ```
//!
//! Shutdown is observed between cycles only; a running cycle always
//! finishes.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{watch, RwLock};
use tokio::time::MissedTickBehavior;

use crate::crawler::{CycleReport, Pipeline};
use crate::error::{PostwatchErrorTrait, Result};

/// What the scheduler is doing right now
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Between cycles, or waiting for the channel to become ready
    Idle,
    /// A cycle is in progress
    Running,
}

/// Point-in-time view of the scheduler, served by the health endpoint
#[derive(Debug, Clone, Serialize)]
pub struct SchedulerSnapshot {
    pub phase: Phase,
    pub ready: bool,
    pub cycles_started: u64,
    pub cycles_completed: u64,
    pub cycles_failed: u64,
    pub last_cycle_at: Option<DateTime<Utc>>,
    pub last_report: Option<CycleReport>,
    pub last_error: Option<String>,
}

impl Default for SchedulerSnapshot {
    fn default() -> Self {
        Self {
            phase: Phase::Idle,
            ready: false,
            cycles_started: 0,
            cycles_completed: 0,
            cycles_failed: 0,
            last_cycle_at: None,
            last_report: None,
            last_error: None,
        }
    }
}

/// Scheduler state shared with observers
#[derive(Debug, Default)]
pub struct SchedulerState {
    inner: RwLock<SchedulerSnapshot>,
}

impl SchedulerState {
    /// Create an idle, not yet ready state
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the current state
    pub async fn snapshot(&self) -> SchedulerSnapshot {
        self.inner.read().await.clone()
    }

    async fn mark_ready(&self) {
        self.inner.write().await.ready = true;
    }

    async fn begin_cycle(&self) {
        let mut state = self.inner.write().await;
        state.phase = Phase::Running;
        state.cycles_started += 1;
        state.last_cycle_at = Some(Utc::now());
    }

    async fn finish_cycle(&self, result: &Result<CycleReport>) {
        let mut state = self.inner.write().await;
        state.phase = Phase::Idle;
        match result {
            Ok(report) => {
                state.cycles_completed += 1;
                state.last_report = Some(report.clone());
                state.last_error = None;
            }
            Err(e) => {
                state.cycles_failed += 1;
                state.last_error = Some(e.to_string());
            }
        }
    }
}

/// Signals a running scheduler to stop after its current cycle
#[derive(Debug, Clone)]
pub struct ShutdownHandle {
    sender: Arc<watch::Sender<bool>>,
}

impl ShutdownHandle {
    /// Request shutdown
    pub fn shutdown(&self) {
        let _ = self.sender.send(true);
    }
}

/// Runs the pipeline on a fixed period
pub struct Scheduler {
    pipeline: Pipeline,
    period: Duration,
    state: Arc<SchedulerState>,
    shutdown: Arc<watch::Sender<bool>>,
    shutdown_rx: watch::Receiver<bool>,
}

impl Scheduler {
    /// Create a scheduler for `pipeline`, starting a cycle every `period`
    pub fn new(pipeline: Pipeline, period: Duration) -> Self {
        let (shutdown, shutdown_rx) = watch::channel(false);

        Self {
            pipeline,
            period,
            state: Arc::new(SchedulerState::new()),
            shutdown: Arc::new(shutdown),
            shutdown_rx,
        }
    }

    /// Shared state for health reporting
    pub fn state(&self) -> Arc<SchedulerState> {
        Arc::clone(&self.state)
    }

    /// Handle that stops the loop between cycles
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            sender: Arc::clone(&self.shutdown),
        }
    }

    /// The driven pipeline
    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    fn shutdown_requested(&self) -> bool {
        *self.shutdown_rx.borrow()
    }

    /// Wait for the notification channel
    ///
    /// Returns `Ok(false)` if shutdown was requested first. A channel error
    /// here (bad credentials) is fatal.
    async fn await_ready(&mut self) -> Result<bool> {
        if self.shutdown_requested() {
            return Ok(false);
        }

        let mut shutdown_rx = self.shutdown_rx.clone();
        tokio::select! {
            result = self.pipeline.wait_until_ready() => {
                result?;
                self.state.mark_ready().await;
                Ok(true)
            }
            _ = shutdown_rx.changed() => Ok(false),
        }
    }

    /// Run one cycle and record it in the shared state
    ///
    /// Errors are logged and recorded, never propagated.
    pub async fn tick(&mut self) -> Option<CycleReport> {
        self.state.begin_cycle().await;
        let result = self.pipeline.run_cycle().await;
        self.state.finish_cycle(&result).await;

        match result {
            Ok(report) => Some(report),
            Err(e) => {
                if !e.is_recoverable() {
                    tracing::error!(
                        category = %e.category(),
                        error = %e,
                        "Cycle failed with a non-recoverable error, continuing"
                    );
                }
                None
            }
        }
    }

    /// Wait for readiness and run a single cycle
    pub async fn run_once(&mut self) -> Result<Option<CycleReport>> {
        if !self.await_ready().await? {
            return Ok(None);
        }
        Ok(self.tick().await)
    }

    /// Run until shutdown is requested
    ///
    /// Only a readiness failure ends the loop with an error.
    pub async fn run(mut self) -> Result<()> {
        tracing::info!(
            url = %self.pipeline.target_url(),
            period_secs = self.period.as_secs(),
            "Starting scheduler"
        );

        if !self.await_ready().await? {
            tracing::info!("Shutdown requested before first cycle");
            return Ok(());
        }

        let mut shutdown_rx = self.shutdown_rx.clone();
        let mut interval = tokio::time::interval(self.period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    let started = Instant::now();
                    self.tick().await;

                    let elapsed = started.elapsed();
                    if elapsed > self.period {
                        tracing::warn!(
                            elapsed_secs = elapsed.as_secs(),
                            period_secs = self.period.as_secs(),
                            "Cycle overran its period, starting next cycle immediately"
                        );
                    }
                }
                _ = shutdown_rx.changed() => {
                    tracing::info!("Scheduler shutting down");
                    break;
                }
            }

            if self.shutdown_requested() {
                tracing::info!("Scheduler shutting down");
                break;
            }
        }

        Ok(())
    }
}

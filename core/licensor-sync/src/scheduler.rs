//! Background sync loop.

use crate::engine::{SyncEngine, SyncReport};
use crate::error::{SyncError, SyncResult};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, RwLock};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// Command sent to the sync loop.
enum SchedulerCommand {
    /// Run a sync now and report the result.
    SyncNow {
        reply: oneshot::Sender<SyncResult<SyncReport>>,
    },
    /// Stop the loop.
    Shutdown,
}

/// Observed state of the background loop.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncStatus {
    /// Rounds run so far, successful or not.
    pub rounds: u64,
    pub last_success: Option<DateTime<Utc>>,
    /// Error of the most recent round, cleared by the next success.
    pub last_error: Option<String>,
}

/// Runs [`SyncEngine::sync_once`] on an interval in a background task.
///
/// Failures are logged and the loop keeps going.
pub struct SyncScheduler {
    command_tx: mpsc::Sender<SchedulerCommand>,
    status: Arc<RwLock<SyncStatus>>,
    handle: JoinHandle<()>,
}

impl SyncScheduler {
    /// Spawns the loop. The first round runs immediately.
    pub fn spawn(engine: SyncEngine, interval: Duration) -> Self {
        let (command_tx, command_rx) = mpsc::channel(8);
        let status = Arc::new(RwLock::new(SyncStatus::default()));
        let status_clone = Arc::clone(&status);

        let handle = tokio::spawn(async move {
            Self::run_loop(engine, interval, command_rx, status_clone).await;
        });

        info!("Background sync started (every {:?})", interval);
        Self {
            command_tx,
            status,
            handle,
        }
    }

    async fn run_loop(
        engine: SyncEngine,
        interval: Duration,
        mut command_rx: mpsc::Receiver<SchedulerCommand>,
        status: Arc<RwLock<SyncStatus>>,
    ) {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let _ = Self::run_round(&engine, &status).await;
                }
                command = command_rx.recv() => match command {
                    Some(SchedulerCommand::SyncNow { reply }) => {
                        let result = Self::run_round(&engine, &status).await;
                        ticker.reset();
                        let _ = reply.send(result);
                    }
                    Some(SchedulerCommand::Shutdown) | None => break,
                },
            }
        }
        debug!("Background sync loop exited");
    }

    async fn run_round(
        engine: &SyncEngine,
        status: &RwLock<SyncStatus>,
    ) -> SyncResult<SyncReport> {
        let result = engine.sync_once().await;
        let mut status = status.write().await;
        status.rounds += 1;
        match &result {
            Ok(report) => {
                status.last_success = Some(report.finished_at);
                status.last_error = None;
            }
            Err(e) => {
                warn!("Background sync failed: {}", e);
                status.last_error = Some(e.to_string());
            }
        }
        result
    }

    /// Runs a sync round now, outside the regular interval.
    pub async fn sync_now(&self) -> SyncResult<SyncReport> {
        let (reply, rx) = oneshot::channel();
        self.command_tx
            .send(SchedulerCommand::SyncNow { reply })
            .await
            .map_err(|_| SyncError::ChannelClosed)?;
        rx.await.map_err(|_| SyncError::ChannelClosed)?
    }

    /// Returns a copy of the loop's state.
    pub async fn status(&self) -> SyncStatus {
        self.status.read().await.clone()
    }

    /// Stops the loop and waits for the task to finish.
    pub async fn shutdown(self) -> SyncResult<()> {
        self.command_tx
            .send(SchedulerCommand::Shutdown)
            .await
            .map_err(|_| SyncError::ChannelClosed)?;
        self.handle.await.map_err(|_| SyncError::ChannelClosed)?;
        info!("Background sync stopped");
        Ok(())
    }
}

//! Janitor Task
//!
//! Background task that periodically removes expired cache entries.
//!
//! The task alternates between waiting for the next tick and sweeping. It
//! stops when asked to, or when the swept target has been dropped.

use std::sync::Weak;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::error::{CacheError, Result};

/// Something the janitor can sweep.
pub trait Sweep {
    /// Removes every expired entry, returning how many were removed.
    fn sweep(&self) -> usize;
}

// == Janitor State ==
/// Where the janitor task is in its loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JanitorState {
    /// Blocked until the next tick
    Waiting,
    /// Running a sweep
    Sweeping,
    /// Exited, either on request or because the target was dropped
    Stopped,
}

// == Janitor ==
/// Handle to a running janitor task.
///
/// The task publishes its state on a watch channel; that channel is the only
/// record of whether it is still running. Dropping the handle closes the
/// shutdown channel, which also stops the task.
#[derive(Debug)]
pub struct Janitor {
    interval: Duration,
    shutdown_tx: watch::Sender<bool>,
    state_rx: watch::Receiver<JanitorState>,
}

impl Janitor {
    /// Spawns a janitor that sweeps `target` every `interval`.
    ///
    /// The first sweep happens one full interval after spawning. The task only
    /// holds a weak reference, so it never keeps the target alive.
    ///
    /// # Arguments
    /// * `target` - Weak reference to what gets swept
    /// * `interval` - Time between two sweeps
    ///
    /// # Returns
    /// A handle used to observe and stop the task.
    ///
    /// # Errors
    /// - `InvalidCleanupInterval` if `interval` is zero
    /// - `RuntimeUnavailable` if called outside a tokio runtime
    pub fn spawn<S>(target: Weak<S>, interval: Duration) -> Result<Self>
    where
        S: Sweep + Send + Sync + 'static,
    {
        if interval.is_zero() {
            return Err(CacheError::InvalidCleanupInterval(interval));
        }
        let runtime =
            tokio::runtime::Handle::try_current().map_err(|_| CacheError::RuntimeUnavailable)?;

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let (state_tx, state_rx) = watch::channel(JanitorState::Waiting);
        runtime.spawn(run(target, interval, shutdown_rx, state_tx));

        Ok(Self {
            interval,
            shutdown_tx,
            state_rx,
        })
    }

    /// The fixed sweep interval.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Current state of the task.
    ///
    /// A task that vanished without reporting (runtime shut down, panic in a
    /// sweep) is reported as `Stopped`.
    pub fn state(&self) -> JanitorState {
        if self.state_rx.has_changed().is_err() {
            return JanitorState::Stopped;
        }
        *self.state_rx.borrow()
    }

    /// Signals the task to stop without waiting for it. Idempotent.
    ///
    /// A sweep already in progress runs to completion.
    pub fn close(&self) {
        self.shutdown_tx.send_replace(true);
    }

    /// Signals the task to stop and waits until it has exited.
    ///
    /// Any number of callers may wait at once; all of them return only after
    /// an in-progress sweep has finished and the task reported `Stopped`.
    pub async fn shutdown(&self) {
        self.close();
        let mut state_rx = self.state_rx.clone();
        if state_rx
            .wait_for(|state| *state == JanitorState::Stopped)
            .await
            .is_err()
        {
            warn!("Janitor task ended without reporting its stop");
        }
    }
}

async fn run<S: Sweep>(
    target: Weak<S>,
    interval: Duration,
    mut shutdown_rx: watch::Receiver<bool>,
    state_tx: watch::Sender<JanitorState>,
) {
    info!("Starting janitor with interval of {:?}", interval);

    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately; sweeps start one interval in.
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let Some(swept) = target.upgrade() else {
                    debug!("Janitor target dropped");
                    break;
                };

                state_tx.send_replace(JanitorState::Sweeping);
                let removed = swept.sweep();
                drop(swept);
                state_tx.send_replace(JanitorState::Waiting);

                if removed > 0 {
                    info!("Janitor sweep: removed {} expired entries", removed);
                } else {
                    debug!("Janitor sweep: no expired entries found");
                }
            }
            changed = shutdown_rx.changed() => {
                // An error means every sender is gone.
                if changed.is_err() || *shutdown_rx.borrow() {
                    break;
                }
            }
        }
    }

    state_tx.send_replace(JanitorState::Stopped);
    info!("Janitor stopped");
}

//! Background flushing of the registry to durable storage.
//!
//! Every `interval` the loop checks the dirty flag and, if set, writes a
//! snapshot. Failed writes are logged and retried on the next tick. On
//! shutdown one final flush is attempted.

use crate::registry::Registry;
use crate::storage::Storage;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};

/// Default flush cadence.
pub const DEFAULT_FLUSH_INTERVAL: Duration = Duration::from_secs(10);

/// Outcome of a single persistence tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushOutcome {
    /// Nothing to write
    Clean,
    /// Snapshot of this many records written
    Flushed(usize),
    /// Write failed; the registry stays dirty
    Failed,
}

/// Periodic registry flusher.
pub struct PersistenceLoop {
    registry: Arc<Registry>,
    store: Arc<dyn Storage>,
    interval: Duration,
}

impl PersistenceLoop {
    pub fn new(registry: Arc<Registry>, store: Arc<dyn Storage>, interval: Duration) -> Self {
        Self {
            registry,
            store,
            interval,
        }
    }

    /// Flush if dirty. Never returns an error; failures are logged.
    pub async fn tick(&self) -> FlushOutcome {
        if !self.registry.is_dirty() {
            return FlushOutcome::Clean;
        }

        match self.registry.flush_to(self.store.as_ref()).await {
            Ok(count) => {
                info!("Saved the registry ({} records)", count);
                FlushOutcome::Flushed(count)
            }
            Err(e) => {
                error!("Failed to save the registry: {}", e);
                FlushOutcome::Failed
            }
        }
    }

    /// Run until `shutdown` flips to true (or its sender is dropped), then
    /// make one final flush attempt.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) -> FlushOutcome {
        debug!("Persistence loop starting, interval: {:?}", self.interval);

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick of a tokio interval completes immediately
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.tick().await;
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        let outcome = self.tick().await;
        debug!("Persistence loop stopped, final flush: {:?}", outcome);
        outcome
    }
}

/// Handle to a spawned persistence loop.
pub struct PersistenceHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<FlushOutcome>,
}

impl PersistenceHandle {
    /// Stop the loop and wait for its final flush.
    pub async fn shutdown(self) -> FlushOutcome {
        let _ = self.shutdown.send(true);
        match self.task.await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!("Persistence task failed: {}", e);
                FlushOutcome::Failed
            }
        }
    }
}

/// Spawn the persistence loop as a background task.
pub fn spawn_persistence(
    registry: Arc<Registry>,
    store: Arc<dyn Storage>,
    interval: Duration,
) -> PersistenceHandle {
    let (shutdown, shutdown_rx) = watch::channel(false);
    let persistence = PersistenceLoop::new(registry, store, interval);

    let task = tokio::spawn(async move { persistence.run(shutdown_rx).await });

    PersistenceHandle { shutdown, task }
}

//! Progress publication
//!
//! The engine owns a [`ProgressReporter`] and publishes a fresh
//! [`ProgressSnapshot`] after every status change and every remote call.
//! Observers hold a `watch::Receiver` and only ever read copies.

use crate::accounting::RunAccounting;
use serde::Serialize;
use tokio::sync::watch;
use tracing::{info, warn};

/// Read-only view of a run in progress
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProgressSnapshot {
    /// Last human-readable status message
    pub status: String,
    /// Data rows in the source, once known
    pub total: Option<u64>,
    pub counts: RunAccounting,
    pub finished: bool,
}

#[derive(Debug)]
pub struct ProgressReporter {
    tx: watch::Sender<ProgressSnapshot>,
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressReporter {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(ProgressSnapshot::default());
        Self { tx }
    }

    pub fn subscribe(&self) -> watch::Receiver<ProgressSnapshot> {
        self.tx.subscribe()
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        self.tx.borrow().clone()
    }

    /// Start a new run: counters back to zero
    pub fn reset(&self) {
        self.tx.send_replace(ProgressSnapshot::default());
    }

    pub fn set_total(&self, total: u64) {
        self.tx.send_modify(|s| s.total = Some(total));
    }

    pub fn status(&self, message: impl Into<String>) {
        let message = message.into();
        info!("{}", message);
        self.tx.send_modify(|s| s.status = message);
    }

    /// Publish a per-unit failure or notice
    pub fn warn(&self, message: impl Into<String>) {
        let message = message.into();
        warn!("{}", message);
        self.tx.send_modify(|s| s.status = message);
    }

    pub fn update_counts(&self, counts: RunAccounting) {
        self.tx.send_modify(|s| s.counts = counts);
    }

    pub fn finish(&self, counts: RunAccounting, message: impl Into<String>) {
        let message = message.into();
        info!("{}", message);
        self.tx.send_modify(|s| {
            s.counts = counts;
            s.status = message;
            s.finished = true;
        });
    }
}

//! # Gateway State
//!
//! The external collaborators plus the token of the publish-all batch that
//! is currently running, so a separate command can cancel it.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::info;

use nhatro_gateway::Gateway;

/// A registered publish batch.
#[derive(Debug, Clone)]
pub struct Batch {
    id: u64,
    pub token: CancellationToken,
}

#[derive(Debug)]
pub struct GatewayState {
    gateway: Gateway,
    next_batch: AtomicU64,
    batch: Mutex<Option<Batch>>,
}

impl GatewayState {
    pub fn new(gateway: Gateway) -> Self {
        GatewayState {
            gateway,
            next_batch: AtomicU64::new(1),
            batch: Mutex::new(None),
        }
    }

    pub fn inner(&self) -> &Gateway {
        &self.gateway
    }

    /// Registers a new batch. A batch still running is cancelled.
    pub fn begin_batch(&self) -> Batch {
        let batch = Batch {
            id: self.next_batch.fetch_add(1, Ordering::Relaxed),
            token: CancellationToken::new(),
        };
        let mut current = self.batch.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(previous) = current.replace(batch.clone()) {
            previous.token.cancel();
        }
        batch
    }

    /// Drops the registration if `batch` is still the current one.
    pub fn end_batch(&self, batch: &Batch) {
        let mut current = self.batch.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if current.as_ref().map(|b| b.id) == Some(batch.id) {
            *current = None;
        }
    }

    /// Cancels the running batch. Returns false when none is running.
    pub fn cancel_batch(&self) -> bool {
        let current = self.batch.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        match current.as_ref() {
            Some(batch) => {
                info!(batch = batch.id, "Publish batch cancellation requested");
                batch.token.cancel();
                true
            }
            None => false,
        }
    }
}

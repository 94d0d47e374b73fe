//! # Failure Injection
//!
//! Shared by the simulated collaborators: every call waits a random latency
//! from the configured range, then fails transiently with probability
//! `failure_rate`. Tests can also force the next N calls to fail.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tracing::debug;

use crate::config::GatewayConfig;
use crate::error::{GatewayError, GatewayResult};

#[derive(Debug)]
pub struct Simulator {
    service: &'static str,
    min_latency_ms: u64,
    max_latency_ms: u64,
    failure_rate: f64,
    rng: Mutex<StdRng>,
    forced_failures: AtomicU32,
    calls: AtomicU32,
}

impl Simulator {
    pub fn new(service: &'static str, config: &GatewayConfig, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Simulator {
            service,
            min_latency_ms: config.min_latency_ms,
            max_latency_ms: config.max_latency_ms,
            failure_rate: config.failure_rate,
            rng: Mutex::new(rng),
            forced_failures: AtomicU32::new(0),
            calls: AtomicU32::new(0),
        }
    }

    /// Makes the next `n` calls fail with `Unavailable`.
    pub fn fail_next(&self, n: u32) {
        self.forced_failures.store(n, Ordering::SeqCst);
    }

    /// Calls made so far, failed ones included.
    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    /// Simulates one round trip.
    pub async fn round_trip(&self) -> GatewayResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        // Lock is released before the await
        let (latency, roll) = {
            let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            let latency = if self.max_latency_ms > self.min_latency_ms {
                rng.gen_range(self.min_latency_ms..=self.max_latency_ms)
            } else {
                self.min_latency_ms
            };
            (latency, rng.gen::<f64>())
        };

        if latency > 0 {
            tokio::time::sleep(Duration::from_millis(latency)).await;
        }

        let forced = self
            .forced_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if forced || roll < self.failure_rate {
            debug!(service = self.service, latency, forced, "Injected failure");
            return Err(GatewayError::unavailable(self.service, "simulated outage"));
        }
        Ok(())
    }
}

//! Backend connection monitoring.
//!
//! Memoizes the last probe result with a TTL so periodic status polling
//! does not turn into a probe per poll. Pure query logic; the only side
//! effect is the lightweight probe call itself.

use knowhow_llm::{ConnectionStatus, Generator};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

struct CachedStatus {
    status: ConnectionStatus,
    probed_at: Instant,
}

/// TTL-cached view of a generation backend's health.
pub struct ConnectionMonitor {
    generator: Arc<dyn Generator>,
    ttl: Duration,
    cached: Mutex<Option<CachedStatus>>,
}

impl ConnectionMonitor {
    /// Create a monitor with the given memoization TTL.
    pub fn new(generator: Arc<dyn Generator>, ttl: Duration) -> Self {
        Self {
            generator,
            ttl,
            cached: Mutex::new(None),
        }
    }

    /// Get the backend's connection status.
    ///
    /// Returns the memoized status while it is younger than the TTL;
    /// `force_refresh` bypasses the cache. The async mutex also collapses
    /// concurrent refreshes into one probe.
    pub async fn status(&self, force_refresh: bool) -> ConnectionStatus {
        let mut cached = self.cached.lock().await;

        if !force_refresh {
            if let Some(entry) = cached.as_ref() {
                if entry.probed_at.elapsed() < self.ttl {
                    tracing::debug!("Returning memoized connection status");
                    return entry.status.clone();
                }
            }
        }

        let status = self.generator.probe().await;
        tracing::info!(
            provider = %status.provider,
            state = status.state.as_str(),
            latency_ms = status.latency_ms,
            "Probed generation backend"
        );

        *cached = Some(CachedStatus {
            status: status.clone(),
            probed_at: Instant::now(),
        });

        status
    }
}

//! Bounded outbound calls to the record and object stores.
//!
//! Every adapter call goes through an [`OutboundGuard`], which applies a
//! fixed timeout, logs the call, and records it in a shared
//! [`OutboundMetrics`] handle. The handle is created once at startup and
//! passed to each adapter.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use dashmap::DashMap;
use serde::Serialize;
use tracing::{debug, warn};

/// Default ceiling for a single outbound call.
pub const DEFAULT_OUTBOUND_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Default)]
struct CallStats {
    calls: AtomicU64,
    failures: AtomicU64,
    timeouts: AtomicU64,
    total_micros: AtomicU64,
}

/// Point-in-time counters for one `(service, operation)` pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CallStatsSnapshot {
    /// Backing service, e.g. `record_store`.
    pub service: String,
    /// Operation name, e.g. `put`.
    pub operation: String,
    /// Calls started.
    pub calls: u64,
    /// Calls that returned an error.
    pub failures: u64,
    /// Calls abandoned after the timeout.
    pub timeouts: u64,
    /// Cumulative latency in microseconds.
    pub total_micros: u64,
}

/// Process-wide outbound call counters.
#[derive(Debug, Default)]
pub struct OutboundMetrics {
    stats: DashMap<(&'static str, &'static str), CallStats>,
}

impl OutboundMetrics {
    /// Create an empty metrics handle.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn record(&self, service: &'static str, operation: &'static str, outcome: Outcome, elapsed: Duration) {
        let entry = self.stats.entry((service, operation)).or_default();
        entry.calls.fetch_add(1, Ordering::Relaxed);
        let micros = u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX);
        entry.total_micros.fetch_add(micros, Ordering::Relaxed);
        match outcome {
            Outcome::Ok => {}
            Outcome::Failed => {
                entry.failures.fetch_add(1, Ordering::Relaxed);
            }
            Outcome::TimedOut => {
                entry.timeouts.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    /// Snapshot of all counters, sorted by service then operation.
    #[must_use]
    pub fn snapshot(&self) -> Vec<CallStatsSnapshot> {
        let mut out: Vec<CallStatsSnapshot> = self
            .stats
            .iter()
            .map(|entry| {
                let (service, operation) = *entry.key();
                let stats = entry.value();
                CallStatsSnapshot {
                    service: service.to_string(),
                    operation: operation.to_string(),
                    calls: stats.calls.load(Ordering::Relaxed),
                    failures: stats.failures.load(Ordering::Relaxed),
                    timeouts: stats.timeouts.load(Ordering::Relaxed),
                    total_micros: stats.total_micros.load(Ordering::Relaxed),
                }
            })
            .collect();
        out.sort_by(|a, b| (&a.service, &a.operation).cmp(&(&b.service, &b.operation)));
        out
    }
}

#[derive(Debug, Clone, Copy)]
enum Outcome {
    Ok,
    Failed,
    TimedOut,
}

/// Failure of a guarded call.
#[derive(Debug)]
pub enum OutboundFailure<E> {
    /// The call did not finish within the ceiling.
    Timeout(Duration),
    /// The call finished with an error.
    Failed(E),
}

/// Wraps outbound calls of one backing service.
#[derive(Debug, Clone)]
pub struct OutboundGuard {
    service: &'static str,
    timeout: Duration,
    metrics: Arc<OutboundMetrics>,
}

impl OutboundGuard {
    /// Create a guard for `service` with the given timeout.
    #[must_use]
    pub fn new(service: &'static str, timeout: Duration, metrics: Arc<OutboundMetrics>) -> Self {
        Self {
            service,
            timeout,
            metrics,
        }
    }

    /// Configured timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Run `fut` under the timeout, logging and counting the outcome.
    ///
    /// Dropping the returned future abandons the call; side effects the
    /// backend already applied are not undone.
    pub async fn call<T, E, F>(
        &self,
        operation: &'static str,
        target: &str,
        fut: F,
    ) -> Result<T, OutboundFailure<E>>
    where
        F: Future<Output = Result<T, E>>,
        E: std::fmt::Display,
    {
        let started = Instant::now();
        let result = tokio::time::timeout(self.timeout, fut).await;
        let elapsed = started.elapsed();
        let elapsed_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);

        match result {
            Ok(Ok(value)) => {
                self.metrics
                    .record(self.service, operation, Outcome::Ok, elapsed);
                debug!(
                    service = self.service,
                    operation,
                    target,
                    elapsed_ms,
                    "outbound call completed"
                );
                Ok(value)
            }
            Ok(Err(err)) => {
                self.metrics
                    .record(self.service, operation, Outcome::Failed, elapsed);
                warn!(
                    service = self.service,
                    operation,
                    target,
                    elapsed_ms,
                    error = %err,
                    "outbound call failed"
                );
                Err(OutboundFailure::Failed(err))
            }
            Err(_) => {
                self.metrics
                    .record(self.service, operation, Outcome::TimedOut, elapsed);
                warn!(
                    service = self.service,
                    operation,
                    target,
                    timeout_ms = u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX),
                    "outbound call timed out"
                );
                Err(OutboundFailure::Timeout(self.timeout))
            }
        }
    }
}

//! Basic metrics instrumentation for dispatch runs.
//!
//! Provides counters for navigation and send-strategy activity. Counters are
//! shared handles, so a clone given to the binary observes the engine live.

use crate::transport::StrategyId;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Metrics collector for dispatch activity.
#[derive(Debug, Clone)]
pub struct DispatchMetrics {
    /// Navigation attempts, retries included
    navigations_total: Arc<AtomicU64>,

    /// Navigation attempts beyond the first for a target
    navigation_retries_total: Arc<AtomicU64>,

    /// Strategy invocations
    strategy_attempts_total: Arc<AtomicU64>,

    /// Strategy invocations that failed and handed over to the next strategy
    strategy_fallbacks_total: Arc<AtomicU64>,

    /// Targets reported as sent
    sends_total: Arc<AtomicU64>,

    /// Time spent inside strategies in milliseconds
    strategy_duration_total_ms: Arc<AtomicU64>,
}

impl Default for DispatchMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl DispatchMetrics {
    /// Create a new metrics collector.
    pub fn new() -> Self {
        Self {
            navigations_total: Arc::new(AtomicU64::new(0)),
            navigation_retries_total: Arc::new(AtomicU64::new(0)),
            strategy_attempts_total: Arc::new(AtomicU64::new(0)),
            strategy_fallbacks_total: Arc::new(AtomicU64::new(0)),
            sends_total: Arc::new(AtomicU64::new(0)),
            strategy_duration_total_ms: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Record one navigation attempt; `attempt` is 1-based.
    pub fn record_navigation(&self, attempt: u32) {
        self.navigations_total.fetch_add(1, Ordering::Relaxed);
        if attempt > 1 {
            self.navigation_retries_total.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Record one strategy invocation and its duration.
    pub fn record_strategy_attempt(&self, strategy: &StrategyId, duration: Duration, ok: bool) {
        self.strategy_attempts_total.fetch_add(1, Ordering::Relaxed);
        self.strategy_duration_total_ms
            .fetch_add(duration.as_millis() as u64, Ordering::Relaxed);
        if !ok {
            self.strategy_fallbacks_total.fetch_add(1, Ordering::Relaxed);
        }

        tracing::trace!(
            strategy = %strategy,
            duration_ms = duration.as_millis() as u64,
            ok = ok,
            "Strategy attempt recorded"
        );
    }

    /// Record a delivered target.
    pub fn record_send(&self) {
        self.sends_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn navigations_total(&self) -> u64 {
        self.navigations_total.load(Ordering::Relaxed)
    }

    pub fn navigation_retries_total(&self) -> u64 {
        self.navigation_retries_total.load(Ordering::Relaxed)
    }

    pub fn strategy_attempts_total(&self) -> u64 {
        self.strategy_attempts_total.load(Ordering::Relaxed)
    }

    pub fn strategy_fallbacks_total(&self) -> u64 {
        self.strategy_fallbacks_total.load(Ordering::Relaxed)
    }

    pub fn sends_total(&self) -> u64 {
        self.sends_total.load(Ordering::Relaxed)
    }

    /// Get average strategy duration in milliseconds.
    pub fn strategy_duration_avg_ms(&self) -> f64 {
        let total = self.strategy_duration_total_ms.load(Ordering::Relaxed);
        let count = self.strategy_attempts_total.load(Ordering::Relaxed);
        if count == 0 {
            0.0
        } else {
            total as f64 / count as f64
        }
    }

    /// Reset all metrics to zero.
    pub fn reset(&self) {
        self.navigations_total.store(0, Ordering::Relaxed);
        self.navigation_retries_total.store(0, Ordering::Relaxed);
        self.strategy_attempts_total.store(0, Ordering::Relaxed);
        self.strategy_fallbacks_total.store(0, Ordering::Relaxed);
        self.sends_total.store(0, Ordering::Relaxed);
        self.strategy_duration_total_ms.store(0, Ordering::Relaxed);
    }

    /// Get a summary of all metrics.
    pub fn summary(&self) -> MetricsSummary {
        MetricsSummary {
            navigations_total: self.navigations_total(),
            navigation_retries_total: self.navigation_retries_total(),
            strategy_attempts_total: self.strategy_attempts_total(),
            strategy_fallbacks_total: self.strategy_fallbacks_total(),
            sends_total: self.sends_total(),
            strategy_duration_avg_ms: self.strategy_duration_avg_ms(),
        }
    }
}

/// A snapshot of metrics values.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct MetricsSummary {
    pub navigations_total: u64,
    pub navigation_retries_total: u64,
    pub strategy_attempts_total: u64,
    pub strategy_fallbacks_total: u64,
    pub sends_total: u64,
    pub strategy_duration_avg_ms: f64,
}

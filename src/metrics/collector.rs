//! Metrics collection and registry.

use crate::coordinator::BoothStats;
use prometheus::{Encoder, IntCounter, IntGauge, Registry, TextEncoder};
use thiserror::Error;

/// Errors that can occur during metrics operations.
#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("prometheus error: {0}")]
    Prometheus(#[from] prometheus::Error),
}

/// A snapshot of booth state for metrics update.
#[derive(Debug, Clone, Default)]
pub struct MetricsSnapshot {
    /// Photos captured successfully.
    pub captures: u64,
    /// Captures that produced no image.
    pub capture_failures: u64,
    /// Camera sessions opened.
    pub sessions_opened: u64,
    /// Camera sessions closed.
    pub sessions_closed: u64,
    /// Whether a camera session is live.
    pub session_live: bool,
    /// Countdowns restarted while running.
    pub countdown_restarts: u64,
    /// Seconds left on the countdown.
    pub countdown_remaining: u32,
}

impl From<BoothStats> for MetricsSnapshot {
    fn from(stats: BoothStats) -> Self {
        Self {
            captures: stats.captures,
            capture_failures: stats.capture_failures,
            sessions_opened: stats.sessions_opened,
            sessions_closed: stats.sessions_closed,
            session_live: stats.session_live,
            countdown_restarts: stats.countdown_restarts,
            countdown_remaining: stats.countdown_remaining,
        }
    }
}

/// Prometheus metrics registry for the booth.
pub struct MetricsRegistry {
    registry: Registry,

    // Capture metrics
    captures_total: IntCounter,
    capture_failures_total: IntCounter,

    // Session metrics
    sessions_opened_total: IntCounter,
    sessions_closed_total: IntCounter,
    session_live: IntGauge,

    // Countdown metrics
    countdown_restarts_total: IntCounter,
    countdown_remaining: IntGauge,
}

impl MetricsRegistry {
    /// Creates a new metrics registry with all booth metrics registered.
    pub fn new() -> Result<Self, MetricsError> {
        let registry = Registry::new();

        let captures_total =
            IntCounter::new("photo_booth_captures_total", "Photos captured successfully")?;
        let capture_failures_total = IntCounter::new(
            "photo_booth_capture_failures_total",
            "Captures that did not produce an image",
        )?;

        let sessions_opened_total =
            IntCounter::new("photo_booth_sessions_opened_total", "Camera sessions opened")?;
        let sessions_closed_total =
            IntCounter::new("photo_booth_sessions_closed_total", "Camera sessions closed")?;
        let session_live = IntGauge::new(
            "photo_booth_session_live",
            "Whether a camera session is live (1=live, 0=none)",
        )?;

        let countdown_restarts_total = IntCounter::new(
            "photo_booth_countdown_restarts_total",
            "Countdowns restarted before expiry",
        )?;
        let countdown_remaining = IntGauge::new(
            "photo_booth_countdown_remaining_seconds",
            "Seconds left on the running countdown",
        )?;

        registry.register(Box::new(captures_total.clone()))?;
        registry.register(Box::new(capture_failures_total.clone()))?;
        registry.register(Box::new(sessions_opened_total.clone()))?;
        registry.register(Box::new(sessions_closed_total.clone()))?;
        registry.register(Box::new(session_live.clone()))?;
        registry.register(Box::new(countdown_restarts_total.clone()))?;
        registry.register(Box::new(countdown_remaining.clone()))?;

        Ok(Self {
            registry,
            captures_total,
            capture_failures_total,
            sessions_opened_total,
            sessions_closed_total,
            session_live,
            countdown_restarts_total,
            countdown_remaining,
        })
    }

    /// Updates all metrics from a snapshot.
    pub fn update(&self, snapshot: &MetricsSnapshot) {
        // Counters only move forward by the difference.
        advance(&self.captures_total, snapshot.captures);
        advance(&self.capture_failures_total, snapshot.capture_failures);
        advance(&self.sessions_opened_total, snapshot.sessions_opened);
        advance(&self.sessions_closed_total, snapshot.sessions_closed);
        advance(&self.countdown_restarts_total, snapshot.countdown_restarts);

        self.session_live.set(i64::from(snapshot.session_live));
        self.countdown_remaining
            .set(i64::from(snapshot.countdown_remaining));
    }

    /// Returns the underlying Prometheus registry.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Encodes all metrics in Prometheus text format.
    pub fn encode(&self) -> Result<String, MetricsError> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}

fn advance(counter: &IntCounter, total: u64) {
    let current = counter.get();
    if total > current {
        counter.inc_by(total - current);
    }
}

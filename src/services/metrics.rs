//! Prometheus metrics for the authentication gate.

use crate::models::{AuthError, GateOutcome};
use prometheus::{CounterVec, Gauge, Histogram, HistogramOpts, Opts, Registry, TextEncoder};
use std::time::{Duration, Instant};

/// Gate metrics collector
#[derive(Clone)]
pub struct AuthMetrics {
    pub registry: Registry,
    pub auth_decisions_total: CounterVec,
    pub auth_gate_duration_seconds: Histogram,
    pub replay_cache_entries: Gauge,
    pub app_uptime_seconds: Gauge,
    pub start_time: Instant,
}

impl AuthMetrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let auth_decisions_total = CounterVec::new(
            Opts::new("auth_decisions_total", "Authentication gate decisions"),
            &["outcome", "reason"],
        )?;

        let auth_gate_duration_seconds = Histogram::with_opts(
            HistogramOpts::new(
                "auth_gate_duration_seconds",
                "Time spent deciding whether to admit a request",
            )
            .buckets(vec![0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 2.5]),
        )?;

        let replay_cache_entries =
            Gauge::new("replay_cache_entries", "Signatures held in the replay cache")?;

        let app_uptime_seconds = Gauge::new("app_uptime_seconds", "Application uptime in seconds")?;

        registry.register(Box::new(auth_decisions_total.clone()))?;
        registry.register(Box::new(auth_gate_duration_seconds.clone()))?;
        registry.register(Box::new(replay_cache_entries.clone()))?;
        registry.register(Box::new(app_uptime_seconds.clone()))?;

        Ok(Self {
            registry,
            auth_decisions_total,
            auth_gate_duration_seconds,
            replay_cache_entries,
            app_uptime_seconds,
            start_time: Instant::now(),
        })
    }

    /// Record one gate decision
    pub fn record_decision(&self, result: Result<(), AuthError>, duration: Duration) {
        let (outcome, reason) = match result {
            Ok(()) => (GateOutcome::Admitted, "none"),
            Err(e) => (GateOutcome::Denied, e.kind()),
        };
        self.auth_decisions_total
            .with_label_values(&[outcome.as_str(), reason])
            .inc();
        self.auth_gate_duration_seconds
            .observe(duration.as_secs_f64());
    }

    pub fn set_replay_cache_entries(&self, entries: usize) {
        self.replay_cache_entries.set(entries as f64);
    }

    pub fn update_uptime(&self) {
        self.app_uptime_seconds
            .set(self.start_time.elapsed().as_secs_f64());
    }

    /// Render metrics in Prometheus text format
    pub fn render(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        encoder.encode_to_string(&metric_families)
    }
}

use prometheus::{Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts, Registry};
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::info;

// Declare the static OnceCell to hold the Metrics.
static METRICS_INSTANCE: OnceCell<Arc<Metrics>> = OnceCell::const_new();

/// Asynchronously initializes and gets a reference to the static `Metrics`.
pub async fn get_metrics() -> &'static Arc<Metrics> {
    METRICS_INSTANCE
        .get_or_init(|| async {
            info!("Initializing Metrics ...");
            Metrics::new()
        })
        .await
}

#[derive(Clone)]
pub struct Metrics {
    pub registry: Registry,

    // Refresh loop metrics
    pub refresh_checks: IntCounterVec,
    pub refresh_failures: IntCounterVec,
    pub refresh_duration: Histogram,
    pub token_expiry_unix: IntGauge,

    // Log sink metrics
    pub log_posts: IntCounterVec,
    pub log_post_duration: Histogram,

    // Config/runtime
    pub config_parse_failures: IntCounter,
    pub config_validation_errors: IntCounter,
    pub up: IntGauge,
}

impl Metrics {
    fn new() -> Arc<Self> {
        let registry = Registry::new_custom(Some("logtokenagent".into()), None).unwrap();

        let metrics: Arc<Metrics> = Arc::new(Self {
            // Refresh
            refresh_checks: IntCounterVec::new(Opts::new("refresh_checks_total", "Refresh loop iterations by outcome"), &["outcome"]).unwrap(),
            refresh_failures: IntCounterVec::new(Opts::new("refresh_failures_total", "Refresh failures by reason"), &["reason"]).unwrap(),
            refresh_duration: Histogram::with_opts(HistogramOpts::new("refresh_duration_seconds", "Sign and exchange duration seconds").buckets(vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0])).unwrap(),
            token_expiry_unix: IntGauge::new("token_expiry_unix_seconds", "Expiry of the cached access token").unwrap(),

            // Log sink
            log_posts: IntCounterVec::new(Opts::new("log_posts_total", "Log records posted by result"), &["result"]).unwrap(),
            log_post_duration: Histogram::with_opts(HistogramOpts::new("log_post_duration_seconds", "Log post round trip seconds").buckets(vec![0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0])).unwrap(),

            // Config/runtime
            config_parse_failures: IntCounter::new("config_parse_failures_total", "Config files that failed to parse").unwrap(),
            config_validation_errors: IntCounter::new("config_validation_errors_total", "Validation errors during startup").unwrap(),
            up: IntGauge::new("up", "1 if service is healthy").unwrap(),

            registry,
        });

        // Register all metrics in the registry
        let reg = &metrics.registry;
        reg.register(Box::new(metrics.refresh_checks.clone())).unwrap();
        reg.register(Box::new(metrics.refresh_failures.clone())).unwrap();
        reg.register(Box::new(metrics.refresh_duration.clone())).unwrap();
        reg.register(Box::new(metrics.token_expiry_unix.clone())).unwrap();
        reg.register(Box::new(metrics.log_posts.clone())).unwrap();
        reg.register(Box::new(metrics.log_post_duration.clone())).unwrap();
        reg.register(Box::new(metrics.config_parse_failures.clone())).unwrap();
        reg.register(Box::new(metrics.config_validation_errors.clone())).unwrap();
        reg.register(Box::new(metrics.up.clone())).unwrap();

        metrics
    }
}

use metrics::{counter, describe_counter, describe_histogram, histogram, Unit};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;
use std::time::Instant;

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Global metrics instance.
pub static METRICS: OnceLock<Metrics> = OnceLock::new();

/// Metrics collector for the ledger engine and its surrounding flows.
#[derive(Debug, Clone)]
pub struct Metrics {
    initialized: bool,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub fn new() -> Self {
        Self { initialized: true }
    }

    pub fn record_entry_posted(&self, entry_type: &str, currency: &str) {
        counter!("ledger_entries_posted_total", "type" => entry_type.to_string(), "currency" => currency.to_string()).increment(1);
    }

    pub fn record_entry_replayed(&self, entry_type: &str) {
        counter!("ledger_entries_replayed_total", "type" => entry_type.to_string()).increment(1);
    }

    pub fn record_entry_rejected(&self, entry_type: &str, error_code: &str) {
        counter!("ledger_entries_rejected_total", "type" => entry_type.to_string(), "error_code" => error_code.to_string()).increment(1);
    }

    pub fn record_posting_latency(&self, duration_ms: f64) {
        histogram!("ledger_posting_duration_ms").record(duration_ms);
    }

    pub fn record_balance_derivation_latency(&self, duration_ms: f64) {
        histogram!("ledger_balance_derivation_duration_ms").record(duration_ms);
    }

    pub fn record_hold_created(&self, currency: &str) {
        counter!("holds_created_total", "currency" => currency.to_string()).increment(1);
    }

    pub fn record_hold_captured(&self, full: bool) {
        counter!("holds_captured_total", "full" => full.to_string()).increment(1);
    }

    pub fn record_hold_released(&self, full: bool) {
        counter!("holds_released_total", "full" => full.to_string()).increment(1);
    }

    pub fn record_hold_expired(&self) {
        counter!("holds_expired_total").increment(1);
    }

    pub fn record_payment_intent_created(&self, currency: &str) {
        counter!("payment_intents_created_total", "currency" => currency.to_string()).increment(1);
    }

    pub fn record_payment_intent_paid(&self) {
        counter!("payment_intents_paid_total").increment(1);
    }

    pub fn record_refund_issued(&self, currency: &str) {
        counter!("refunds_issued_total", "currency" => currency.to_string()).increment(1);
    }

    pub fn record_rate_limit_rejected(&self) {
        counter!("rate_limit_rejections_total").increment(1);
    }

    pub fn record_http_request(&self, method: &str, path: &str, status: u16, duration_ms: f64) {
        counter!("http_requests_total", "method" => method.to_string(), "path" => path.to_string(), "status" => status.to_string()).increment(1);
        histogram!("http_request_duration_ms", "method" => method.to_string(), "path" => path.to_string()).record(duration_ms);
    }

    pub fn record_db_query(&self, query_type: &str, duration_ms: f64, success: bool) {
        counter!("db_queries_total", "type" => query_type.to_string(), "success" => success.to_string()).increment(1);
        histogram!("db_query_duration_ms", "type" => query_type.to_string()).record(duration_ms);
    }
}

/// Timer for measuring operation latency.
pub struct LatencyTimer {
    start: Instant,
}

impl LatencyTimer {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }
}

impl Default for LatencyTimer {
    fn default() -> Self {
        Self::new()
    }
}

/// Initializes the metrics system and returns the Prometheus handle.
pub fn init_metrics() -> PrometheusHandle {
    let handle = METRICS_HANDLE.get_or_init(|| {
        let builder = PrometheusBuilder::new();
        let handle = builder
            .install_recorder()
            .expect("Failed to install Prometheus recorder");

        describe_metrics();
        handle
    });

    METRICS.get_or_init(Metrics::new);

    handle.clone()
}

fn describe_metrics() {
    describe_counter!("ledger_entries_posted_total", Unit::Count, "Total number of journal entries posted");
    describe_counter!("ledger_entries_replayed_total", Unit::Count, "Total number of idempotent replays");
    describe_counter!("ledger_entries_rejected_total", Unit::Count, "Total number of rejected postings by error code");

    describe_histogram!("ledger_posting_duration_ms", Unit::Milliseconds, "Posting transaction latency in milliseconds");
    describe_histogram!("ledger_balance_derivation_duration_ms", Unit::Milliseconds, "Balance derivation latency in milliseconds");

    describe_counter!("holds_created_total", Unit::Count, "Total number of holds created");
    describe_counter!("holds_captured_total", Unit::Count, "Total number of hold captures");
    describe_counter!("holds_released_total", Unit::Count, "Total number of hold releases");
    describe_counter!("holds_expired_total", Unit::Count, "Total number of holds observed expired at touch time");

    describe_counter!("payment_intents_created_total", Unit::Count, "Total number of payment intents created");
    describe_counter!("payment_intents_paid_total", Unit::Count, "Total number of payment intents paid");

    describe_counter!("refunds_issued_total", Unit::Count, "Total number of refunds issued");

    describe_counter!("rate_limit_rejections_total", Unit::Count, "Total number of requests rejected by the rate limiter");

    describe_counter!("http_requests_total", Unit::Count, "Total HTTP requests");
    describe_histogram!("http_request_duration_ms", Unit::Milliseconds, "HTTP request latency in milliseconds");

    describe_counter!("db_queries_total", Unit::Count, "Total database queries");
    describe_histogram!("db_query_duration_ms", Unit::Milliseconds, "Database query latency in milliseconds");
}

/// Returns the global metrics instance.
pub fn get_metrics() -> &'static Metrics {
    METRICS.get_or_init(Metrics::new)
}

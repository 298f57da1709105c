use crate::error::AppError;
use lazy_static::lazy_static;
use prometheus::{Gauge, Histogram, HistogramOpts, IntCounter, IntGauge, Registry};

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();

    pub static ref BLOCKS_PROCESSED: IntCounter = IntCounter::new(
        "explorer_blocks_processed_total",
        "Blocks fetched and normalized",
    )
    .expect("valid metric definition");

    pub static ref TRANSACTIONS_NORMALIZED: IntCounter = IntCounter::new(
        "explorer_transactions_normalized_total",
        "Raw transactions mapped into display records",
    )
    .expect("valid metric definition");

    pub static ref TRANSACTIONS_SKIPPED: IntCounter = IntCounter::new(
        "explorer_transactions_skipped_total",
        "Transactions dropped for an unrecognized txType",
    )
    .expect("valid metric definition");

    pub static ref TOKEN_LOOKUP_MISSES: IntCounter = IntCounter::new(
        "explorer_token_lookup_misses_total",
        "Token ids referenced by transactions but absent from the catalog",
    )
    .expect("valid metric definition");

    pub static ref API_FAILURES: IntCounter = IntCounter::new(
        "explorer_api_failures_total",
        "Failed REST API round trips, including catalog fetches",
    )
    .expect("valid metric definition");

    pub static ref NORMALIZE_DURATION: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            "explorer_block_normalize_seconds",
            "Time to fetch and normalize one block",
        )
        .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]),
    )
    .expect("valid metric definition");

    pub static ref CATALOG_TOKENS: IntGauge = IntGauge::new(
        "explorer_catalog_tokens",
        "Token count of the most recently fetched catalog",
    )
    .expect("valid metric definition");

    pub static ref LAST_BLOCK_NORMALIZED: IntGauge = IntGauge::new(
        "explorer_last_block_normalized",
        "Id of the last block normalized",
    )
    .expect("valid metric definition");

    pub static ref APP_UPTIME: Gauge = Gauge::new(
        "explorer_uptime_seconds",
        "Application uptime in seconds",
    )
    .expect("valid metric definition");
}

/// Register every metric with the process registry.
///
/// Failing registration (a duplicate name, for instance) is a startup
/// error; the application fails fast rather than running blind.
pub fn init_metrics() -> Result<(), AppError> {
    let collectors: [Box<dyn prometheus::core::Collector>; 9] = [
        Box::new(BLOCKS_PROCESSED.clone()),
        Box::new(TRANSACTIONS_NORMALIZED.clone()),
        Box::new(TRANSACTIONS_SKIPPED.clone()),
        Box::new(TOKEN_LOOKUP_MISSES.clone()),
        Box::new(API_FAILURES.clone()),
        Box::new(NORMALIZE_DURATION.clone()),
        Box::new(CATALOG_TOKENS.clone()),
        Box::new(LAST_BLOCK_NORMALIZED.clone()),
        Box::new(APP_UPTIME.clone()),
    ];

    for collector in collectors {
        REGISTRY
            .register(collector)
            .map_err(|e| AppError::Config(format!("Failed to register metric: {}", e)))?;
    }

    Ok(())
}

/// Render the registry in Prometheus exposition format.
pub fn gather_metrics() -> Result<String, AppError> {
    use prometheus::Encoder;

    let encoder = prometheus::TextEncoder::new();
    let mut buffer = vec![];
    encoder
        .encode(&REGISTRY.gather(), &mut buffer)
        .map_err(|e| AppError::Config(format!("Failed to encode metrics: {}", e)))?;

    String::from_utf8(buffer)
        .map_err(|e| AppError::Config(format!("Failed to convert metrics to UTF-8: {}", e)))
}

use rollup_tx_normalizer::api::ApiClient;
use rollup_tx_normalizer::catalog::TokenCatalog;
use rollup_tx_normalizer::config::AppConfig;
use rollup_tx_normalizer::error::AppError;
use rollup_tx_normalizer::rollup::normalized::NormalizedTransaction;
use rollup_tx_normalizer::rollup::normalizer;
use rollup_tx_normalizer::{metrics, metrics_server, telemetry};
use std::time::Instant;
use tokio::time::{sleep, Duration};
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // Load environment variables from .env file if present
    dotenvy::dotenv().ok();

    let config = AppConfig::from_env()?;
    telemetry::init(&config.log_level);
    metrics::init_metrics()?;

    info!("Starting rollup explorer transaction normalizer");
    info!(
        network = ?config.network,
        api_url = %config.api_url,
        "Configuration loaded"
    );

    let api = ApiClient::new(config.api_url.clone())?;

    // One-shot mode: normalize a single block, print it, exit.
    if let Some(block_id) = config.block_id {
        let records = normalize_block(&api, &config, block_id).await?;
        let json = serde_json::to_string_pretty(&records)
            .map_err(|e| AppError::Decode(format!("Failed to serialize output: {}", e)))?;
        println!("{}", json);
        return Ok(());
    }

    // Start metrics server in background
    let metrics_port = config.metrics_port;
    tokio::spawn(async move {
        if let Err(e) = metrics_server::serve(metrics_port).await {
            error!("Metrics server error: {}", e);
        }
    });

    // Start uptime tracking
    let started = Instant::now();
    tokio::spawn(async move {
        loop {
            metrics::APP_UPTIME.set(started.elapsed().as_secs_f64());
            sleep(Duration::from_secs(1)).await;
        }
    });

    info!("All systems initialized, following the chain head");
    follow_chain_head(&api, &config).await
}

/// Poll the chain head forever, normalizing every new block.
///
/// A failed iteration backs off exponentially (capped at 5 minutes) and
/// retries the whole batch; there are no partial results.
async fn follow_chain_head(api: &ApiClient, config: &AppConfig) -> Result<(), AppError> {
    let max_backoff = Duration::from_secs(300);
    let mut last_seen: Option<u64> = None;
    let mut failures = 0u32;

    loop {
        match process_new_blocks(api, config, &mut last_seen).await {
            Ok(()) => {
                failures = 0;
                sleep(config.poll_interval).await;
            }
            Err(e) => {
                failures += 1;
                metrics::API_FAILURES.inc();
                let delay = backoff_delay(failures, max_backoff);
                error!(
                    error = %e,
                    attempt = failures,
                    delay_seconds = delay.as_secs(),
                    "Chain head processing failed, will retry after backoff"
                );
                sleep(delay).await;
            }
        }
    }
}

/// Fetch and normalize every block after `last_seen`, emitting NDJSON.
async fn process_new_blocks(
    api: &ApiClient,
    config: &AppConfig,
    last_seen: &mut Option<u64>,
) -> Result<(), AppError> {
    let head = api.latest_block().await?;
    let first_unseen = match *last_seen {
        Some(seen) => seen + 1,
        None => head.block_id,
    };

    for block_id in first_unseen..=head.block_id {
        let timer = metrics::NORMALIZE_DURATION.start_timer();
        let records = normalize_block(api, config, block_id).await?;
        emit_records(&records)?;
        timer.observe_duration();

        metrics::BLOCKS_PROCESSED.inc();
        metrics::LAST_BLOCK_NORMALIZED.set(block_id as i64);

        let emitted = records.iter().flatten().count();
        info!(
            block_id,
            transactions = records.len(),
            emitted,
            "Normalized block"
        );
        *last_seen = Some(block_id);
    }

    Ok(())
}

/// Fetch one block and the token catalogs, then normalize the batch.
///
/// The catalog is fetched fresh per batch; both catalog requests complete
/// before any record is mapped.
async fn normalize_block(
    api: &ApiClient,
    config: &AppConfig,
    block_id: u64,
) -> Result<Vec<Option<NormalizedTransaction>>, AppError> {
    let (block, catalog) = tokio::try_join!(
        api.block(block_id),
        TokenCatalog::fetch(api, config.include_vault_tokens)
    )?;
    metrics::CATALOG_TOKENS.set(catalog.len() as i64);

    normalizer::normalize_transactions(&block.transactions, &catalog, config.unknown_tx_policy)
}

/// Write one JSON line per normalized record to stdout.
fn emit_records(records: &[Option<NormalizedTransaction>]) -> Result<(), AppError> {
    for record in records.iter().flatten() {
        let line = serde_json::to_string(record)
            .map_err(|e| AppError::Decode(format!("Failed to serialize record: {}", e)))?;
        println!("{}", line);
    }
    Ok(())
}

/// Calculate exponential backoff delay for retry attempts.
fn backoff_delay(attempt: u32, max_delay: Duration) -> Duration {
    let base_delay = Duration::from_secs(1);
    let exponential_delay = base_delay * 2u32.saturating_pow(attempt.min(10));
    exponential_delay.min(max_delay)
}

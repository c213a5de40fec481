// Copyright (c) 2025 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Posture Worker Binary
 * Consumes scan jobs from Redis and persists results
 *
 * © 2025 Bountyy Oy
 */

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

use posture_scanner::config::AppConfig;
use posture_scanner::engine::ScanOrchestrator;
use posture_scanner::logging::init_tracing;
use posture_scanner::metrics::MetricsCollector;
use posture_scanner::queue::RedisQueue;
use posture_scanner::store::{FindingsStore, MemoryStore, PostgresStore};
use posture_scanner::worker::{JobRunner, ScannerWorker};

#[tokio::main]
async fn main() -> Result<()> {
    let config_path = std::env::var("POSTURE_CONFIG").ok().map(PathBuf::from);
    let config = AppConfig::load(config_path.as_deref())?;

    init_tracing(&config.observability);
    info!(version = env!("CARGO_PKG_VERSION"), "Starting posture worker");

    let orchestrator = Arc::new(
        ScanOrchestrator::from_config(&config.engine).context("Failed to build scanners")?,
    );

    let store: Arc<dyn FindingsStore> = if config.database.enabled {
        Arc::new(
            PostgresStore::connect(&config.database)
                .await
                .context("Failed to connect to PostgreSQL")?,
        )
    } else {
        warn!("PostgreSQL disabled - results are kept in memory only");
        Arc::new(MemoryStore::new())
    };

    let queue = RedisQueue::new(&config.queue)
        .await
        .context("Failed to connect to Redis")?;

    let runner = JobRunner::new(orchestrator, store)
        .with_metrics(MetricsCollector::new(true))
        .with_default_language(config.engine.language)
        .with_max_backoff(std::time::Duration::from_secs(config.retry.max_backoff_secs));

    let worker = ScannerWorker::new(config.queue.clone(), queue, Arc::new(runner));
    worker.start().await?;

    Ok(())
}

// Copyright (c) 2025 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Scan Queue Worker
 * Pulls scan jobs from Redis, runs them through the job runner
 * and serves a health endpoint
 *
 * © 2025 Bountyy Oy
 */

use anyhow::{Context, Result};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{error, info, warn};

use super::job_runner::{JobOutcome, JobRunner};
use crate::config::QueueConfig;
use crate::errors::{ScannerError, ScannerResult};
use crate::metrics::{MetricsCollector, MetricsSummary};
use crate::queue::RedisQueue;

/// Snapshot served on `/metrics`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkerMetrics {
    pub active_scans: usize,
    pub queue_length: Option<usize>,
    #[serde(flatten)]
    pub counters: MetricsSummary,
}

/// Shared state between consumer loops and the health server
#[derive(Clone)]
struct WorkerState {
    queue: RedisQueue,
    runner: Arc<JobRunner>,
    metrics: MetricsCollector,
    active_jobs: Arc<RwLock<HashSet<String>>>,
    shutdown: Arc<RwLock<bool>>,
}

pub struct ScannerWorker {
    config: QueueConfig,
    state: WorkerState,
}

impl ScannerWorker {
    pub fn new(config: QueueConfig, queue: RedisQueue, runner: Arc<JobRunner>) -> Self {
        let metrics = runner.metrics().clone();
        Self {
            config,
            state: WorkerState {
                queue,
                runner,
                metrics,
                active_jobs: Arc::new(RwLock::new(HashSet::new())),
                shutdown: Arc::new(RwLock::new(false)),
            },
        }
    }

    /// Run consumer loops until Ctrl-C, then drain in-flight jobs
    pub async fn start(&self) -> Result<()> {
        info!(
            concurrency = self.config.worker_concurrency,
            health_port = self.config.health_port,
            "Starting scanner worker"
        );

        let health_state = self.state.clone();
        let health_port = self.config.health_port;
        tokio::spawn(async move {
            if let Err(e) = start_health_check_server(health_port, health_state).await {
                error!("Health check server error: {}", e);
            }
        });

        self.state
            .queue
            .recover_in_flight()
            .await
            .context("Failed to requeue jobs left in flight")?;

        let mut handles = Vec::with_capacity(self.config.worker_concurrency);
        for worker_id in 0..self.config.worker_concurrency {
            let state = self.state.clone();
            let pop_timeout = self.config.pop_timeout_secs;
            handles.push(tokio::spawn(consumer_loop(state, worker_id, pop_timeout)));
        }

        tokio::signal::ctrl_c()
            .await
            .context("Failed to listen for shutdown signal")?;
        info!("Shutdown signal received, finishing in-flight jobs");
        self.shutdown().await;

        for handle in handles {
            if let Err(e) = handle.await {
                error!("Consumer loop ended abnormally: {}", e);
            }
        }

        info!("Scanner worker stopped");
        Ok(())
    }

    pub async fn shutdown(&self) {
        *self.state.shutdown.write().await = true;
    }

    pub async fn active_jobs(&self) -> usize {
        self.state.active_jobs.read().await.len()
    }
}

/// What happens to a claimed job once the runner returns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Disposition {
    /// The execution reached a terminal state or was already terminal
    Ack,
    /// The execution could not be registered; the job goes back on the queue
    Requeue,
}

fn disposition(result: &ScannerResult<JobOutcome>) -> Disposition {
    match result {
        Ok(_) => Disposition::Ack,
        Err(_) => Disposition::Requeue,
    }
}

/// One consumer: claim, run, settle, repeat until shutdown.
/// A loop checks the shutdown flag between jobs, so it stops within one
/// pop timeout once the flag is set.
async fn consumer_loop(state: WorkerState, worker_id: usize, pop_timeout_secs: u64) {
    info!(worker_id, "Consumer started");

    loop {
        if *state.shutdown.read().await {
            break;
        }

        let delivery = match state.queue.pop_scan_job(pop_timeout_secs).await {
            Ok(Some(delivery)) => delivery,
            Ok(None) => continue,
            Err(ScannerError::Validation(reason)) => {
                error!(worker_id, %reason, "Dropping malformed scan job");
                continue;
            }
            Err(e) => {
                state.metrics.track_error(&e);
                warn!(worker_id, error = %e, "Queue unavailable, backing off");
                tokio::time::sleep(Duration::from_secs(1)).await;
                continue;
            }
        };

        let job = &delivery.job;
        let scan_id = job.request.scan_id.clone();
        state.active_jobs.write().await.insert(scan_id.clone());

        let result = state.runner.run(job).await;
        match &result {
            Ok(JobOutcome::Completed(execution)) => {
                info!(
                    worker_id,
                    scan_id = %scan_id,
                    health_score = execution.health_score,
                    "Job completed"
                );
            }
            Ok(JobOutcome::Failed { error, .. }) => {
                warn!(worker_id, scan_id = %scan_id, %error, "Job failed");
            }
            Ok(JobOutcome::Duplicate(execution)) => {
                info!(
                    worker_id,
                    scan_id = %scan_id,
                    status = %execution.status,
                    "Duplicate job skipped"
                );
            }
            Err(e) => {
                state.metrics.track_error(e);
                error!(
                    worker_id,
                    scan_id = %scan_id,
                    error = %e,
                    "Could not register scan execution, requeueing"
                );
            }
        }

        let settled = match disposition(&result) {
            Disposition::Ack => state.queue.ack(&delivery).await,
            Disposition::Requeue => {
                tokio::time::sleep(Duration::from_millis(job.options.backoff.delay_ms)).await;
                state.queue.requeue(&delivery).await
            }
        };
        if let Err(e) = settled {
            // the job stays on the in-flight list and is recovered on restart
            state.metrics.track_error(&e);
            warn!(worker_id, scan_id = %scan_id, error = %e, "Could not settle job on the queue");
        }

        state.active_jobs.write().await.remove(&scan_id);
    }

    info!(worker_id, "Consumer stopped");
}

async fn worker_metrics(state: &WorkerState) -> WorkerMetrics {
    WorkerMetrics {
        active_scans: state.active_jobs.read().await.len(),
        queue_length: state.queue.queue_length().await.ok(),
        counters: state.metrics.get_metrics_summary(),
    }
}

/// Start health check HTTP server
async fn start_health_check_server(port: u16, state: WorkerState) -> Result<()> {
    use axum::{routing::get, Json, Router};
    use std::net::SocketAddr;
    use tokio::net::TcpListener;

    let ready_state = state.clone();
    let metrics_state = state;

    let app = Router::new()
        .route("/health", get(|| async { "OK" }))
        .route(
            "/health/ready",
            get(move || {
                let state = ready_state.clone();
                async move {
                    let is_ready = !*state.shutdown.read().await;
                    if is_ready {
                        Json(serde_json::json!({ "status": "ready" }))
                    } else {
                        Json(serde_json::json!({ "status": "shutting_down" }))
                    }
                }
            }),
        )
        .route(
            "/metrics",
            get(move || {
                let state = metrics_state.clone();
                async move { Json(worker_metrics(&state).await) }
            }),
        );

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("Health check server listening on {}", addr);

    let listener = TcpListener::bind(addr)
        .await
        .context("Failed to bind health check server")?;

    axum::serve(listener, app.into_make_service())
        .await
        .context("Health check server error")?;

    Ok(())
}

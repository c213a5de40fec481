// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

use deadpool_redis::{Config, Pool, PoolConfig, Runtime};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

use crate::config::{JobRetryConfig, QueueConfig};
use crate::errors::{ScannerError, ScannerResult};
use crate::retry::RetryConfig;
use crate::types::ScanRequest;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum BackoffKind {
    #[default]
    Exponential,
    Fixed,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BackoffOptions {
    #[serde(rename = "type", default)]
    pub kind: BackoffKind,
    pub delay_ms: u64,
}

/// Per-job retry policy carried in the envelope
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JobOptions {
    pub attempts: u32,
    pub backoff: BackoffOptions,
}

impl JobOptions {
    pub fn from_config(config: &JobRetryConfig) -> Self {
        Self {
            attempts: config.attempts,
            backoff: BackoffOptions {
                kind: BackoffKind::Exponential,
                delay_ms: config.backoff_delay_ms,
            },
        }
    }

    pub fn retry_config(&self, max_backoff: Duration) -> RetryConfig {
        let config = RetryConfig::for_job(self.attempts, self.backoff.delay_ms)
            .with_max_backoff(max_backoff);
        match self.backoff.kind {
            BackoffKind::Exponential => config,
            BackoffKind::Fixed => RetryConfig {
                backoff_multiplier: 1.0,
                ..config
            },
        }
    }
}

impl Default for JobOptions {
    fn default() -> Self {
        Self::from_config(&JobRetryConfig::default())
    }
}

/// Queue envelope: the request plus how hard to try
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScanJob {
    pub request: ScanRequest,
    #[serde(default)]
    pub options: JobOptions,
}

impl ScanJob {
    pub fn new(request: ScanRequest, options: JobOptions) -> Self {
        Self { request, options }
    }
}

/// A job claimed from the queue. It stays on this worker's in-flight list
/// until it is acked or requeued.
#[derive(Debug, Clone)]
pub struct Delivery {
    pub job: ScanJob,
    payload: String,
}

#[derive(Clone)]
pub struct RedisQueue {
    pool: Pool,
    queue_key: String,
    processing_key: String,
}

/// In-flight list for one worker process
pub fn processing_key(queue_key: &str, worker_name: &str) -> String {
    format!("{}:processing:{}", queue_key, worker_name)
}

impl RedisQueue {
    pub async fn new(config: &QueueConfig) -> ScannerResult<Self> {
        let mut cfg = Config::from_url(config.redis_url.as_str());
        cfg.pool = Some(PoolConfig::new(config.pool_size));
        let pool = cfg
            .create_pool(Some(Runtime::Tokio1))
            .map_err(|e| ScannerError::Queue(format!("Failed to create Redis pool: {}", e)))?;

        let mut conn = pool.get().await?;
        let _: String = deadpool_redis::redis::cmd("PING")
            .query_async(&mut conn)
            .await?;

        let processing_key = processing_key(&config.queue_key, &config.worker_name);
        info!(queue = %config.queue_key, in_flight = %processing_key, "Connected to Redis queue");

        Ok(Self {
            pool,
            queue_key: config.queue_key.clone(),
            processing_key,
        })
    }

    pub async fn push_scan_job(&self, job: &ScanJob) -> ScannerResult<()> {
        let mut conn = self.pool.get().await?;
        let payload = serde_json::to_string(job)?;

        deadpool_redis::redis::cmd("LPUSH")
            .arg(&self.queue_key)
            .arg(payload)
            .query_async::<()>(&mut conn)
            .await?;

        debug!(scan_id = %job.request.scan_id, "Pushed scan job");
        Ok(())
    }

    /// Claim the oldest job, moving it onto the in-flight list (blocking with timeout).
    ///
    /// A malformed payload is removed from the in-flight list and reported as
    /// a `Validation` error.
    pub async fn pop_scan_job(&self, timeout_secs: u64) -> ScannerResult<Option<Delivery>> {
        let mut conn = self.pool.get().await?;

        let payload: Option<String> = deadpool_redis::redis::cmd("BLMOVE")
            .arg(&self.queue_key)
            .arg(&self.processing_key)
            .arg("RIGHT")
            .arg("LEFT")
            .arg(timeout_secs)
            .query_async(&mut conn)
            .await?;

        let Some(payload) = payload else {
            return Ok(None);
        };

        match decode_job(&payload) {
            Ok(job) => {
                debug!(scan_id = %job.request.scan_id, "Claimed scan job");
                Ok(Some(Delivery { job, payload }))
            }
            Err(e) => {
                deadpool_redis::redis::cmd("LREM")
                    .arg(&self.processing_key)
                    .arg(1)
                    .arg(&payload)
                    .query_async::<()>(&mut conn)
                    .await?;
                Err(e)
            }
        }
    }

    /// Drop a finished job from the in-flight list
    pub async fn ack(&self, delivery: &Delivery) -> ScannerResult<()> {
        let mut conn = self.pool.get().await?;
        deadpool_redis::redis::cmd("LREM")
            .arg(&self.processing_key)
            .arg(1)
            .arg(&delivery.payload)
            .query_async::<()>(&mut conn)
            .await?;
        Ok(())
    }

    /// Put an unfinished job back at the tail of the queue
    pub async fn requeue(&self, delivery: &Delivery) -> ScannerResult<()> {
        let mut conn = self.pool.get().await?;
        deadpool_redis::redis::pipe()
            .atomic()
            .cmd("LREM")
            .arg(&self.processing_key)
            .arg(1)
            .arg(&delivery.payload)
            .ignore()
            .cmd("LPUSH")
            .arg(&self.queue_key)
            .arg(&delivery.payload)
            .ignore()
            .query_async::<()>(&mut conn)
            .await?;

        debug!(scan_id = %delivery.job.request.scan_id, "Requeued scan job");
        Ok(())
    }

    /// Return jobs left in flight by a previous run of this worker to the queue.
    /// Called once at startup, before any consumer claims new work.
    pub async fn recover_in_flight(&self) -> ScannerResult<usize> {
        let mut conn = self.pool.get().await?;
        let mut recovered = 0;

        loop {
            let moved: Option<String> = deadpool_redis::redis::cmd("LMOVE")
                .arg(&self.processing_key)
                .arg(&self.queue_key)
                .arg("RIGHT")
                .arg("RIGHT")
                .query_async(&mut conn)
                .await?;
            if moved.is_none() {
                break;
            }
            recovered += 1;
        }

        if recovered > 0 {
            info!(recovered, in_flight = %self.processing_key, "Requeued jobs left in flight");
        }
        Ok(recovered)
    }

    pub async fn queue_length(&self) -> ScannerResult<usize> {
        let mut conn = self.pool.get().await?;
        let len: usize = deadpool_redis::redis::cmd("LLEN")
            .arg(&self.queue_key)
            .query_async(&mut conn)
            .await?;
        Ok(len)
    }
}

fn decode_job(payload: &str) -> ScannerResult<ScanJob> {
    serde_json::from_str(payload)
        .map_err(|e| ScannerError::Validation(format!("Malformed scan job: {}", e)))
}

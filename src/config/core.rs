// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use validator::Validate;

use crate::i18n::Language;

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct AppConfig {
    #[serde(default)]
    #[validate(nested)]
    pub engine: EngineConfig,

    #[serde(default)]
    #[validate(nested)]
    pub queue: QueueConfig,

    #[serde(default)]
    #[validate(nested)]
    pub database: DatabaseConfig,

    #[serde(default)]
    #[validate(nested)]
    pub retry: JobRetryConfig,

    #[serde(default)]
    pub observability: ObservabilityConfig,
}

/// Probe timeouts and scanner tuning
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct EngineConfig {
    #[validate(range(min = 1, max = 120))]
    #[serde(default = "default_probe_timeout")]
    pub dns_timeout_secs: u64,

    #[validate(range(min = 1, max = 120))]
    #[serde(default = "default_probe_timeout")]
    pub tls_timeout_secs: u64,

    #[validate(range(min = 1, max = 120))]
    #[serde(default = "default_probe_timeout")]
    pub http_timeout_secs: u64,

    #[validate(range(min = 1, max = 60))]
    #[serde(default = "default_tcp_timeout")]
    pub tcp_connect_timeout_secs: u64,

    #[validate(range(min = 1, max = 100))]
    #[serde(default = "default_port_batch_size")]
    pub port_batch_size: usize,

    #[validate(range(max = 10000))]
    #[serde(default = "default_port_batch_pause")]
    pub port_batch_pause_ms: u64,

    #[validate(range(min = 5, max = 3600))]
    #[serde(default = "default_scanner_timeout")]
    pub scanner_timeout_secs: u64,

    #[validate(length(min = 1))]
    #[serde(default = "default_dkim_selectors")]
    pub dkim_selectors: Vec<String>,

    /// Upstream resolver (`ip` or `ip:port`); system configuration when unset
    #[serde(default)]
    pub dns_server: Option<String>,

    #[serde(default)]
    pub language: Language,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct QueueConfig {
    #[validate(url)]
    #[serde(default = "default_redis_url")]
    pub redis_url: String,

    #[validate(length(min = 1))]
    #[serde(default = "default_queue_key")]
    pub queue_key: String,

    #[validate(range(min = 1, max = 256))]
    #[serde(default = "default_redis_pool_size")]
    pub pool_size: usize,

    #[validate(range(min = 1, max = 300))]
    #[serde(default = "default_pop_timeout")]
    pub pop_timeout_secs: u64,

    #[validate(range(min = 1, max = 256))]
    #[serde(default = "default_worker_concurrency")]
    pub worker_concurrency: usize,

    #[serde(default = "default_health_port")]
    pub health_port: u16,

    /// Names this process's in-flight list; unique per worker process
    #[validate(length(min = 1))]
    #[serde(default = "default_worker_name")]
    pub worker_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "default_database_url")]
    pub url: String,

    #[validate(range(min = 1, max = 1000))]
    #[serde(default = "default_db_pool_size")]
    pub pool_size: usize,

    #[serde(default = "default_true")]
    pub auto_migrate: bool,
}

/// Defaults applied to jobs that do not carry their own options
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct JobRetryConfig {
    #[validate(range(min = 1, max = 20))]
    #[serde(default = "default_attempts")]
    pub attempts: u32,

    #[validate(range(min = 0, max = 600000))]
    #[serde(default = "default_backoff_delay")]
    pub backoff_delay_ms: u64,

    #[validate(range(min = 1, max = 86400))]
    #[serde(default = "default_max_backoff")]
    pub max_backoff_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub json_logs: bool,
}

impl EngineConfig {
    pub fn dns_timeout(&self) -> Duration {
        Duration::from_secs(self.dns_timeout_secs)
    }

    pub fn tls_timeout(&self) -> Duration {
        Duration::from_secs(self.tls_timeout_secs)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    pub fn tcp_connect_timeout(&self) -> Duration {
        Duration::from_secs(self.tcp_connect_timeout_secs)
    }

    pub fn port_batch_pause(&self) -> Duration {
        Duration::from_millis(self.port_batch_pause_ms)
    }

    pub fn scanner_timeout(&self) -> Duration {
        Duration::from_secs(self.scanner_timeout_secs)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            dns_timeout_secs: default_probe_timeout(),
            tls_timeout_secs: default_probe_timeout(),
            http_timeout_secs: default_probe_timeout(),
            tcp_connect_timeout_secs: default_tcp_timeout(),
            port_batch_size: default_port_batch_size(),
            port_batch_pause_ms: default_port_batch_pause(),
            scanner_timeout_secs: default_scanner_timeout(),
            dkim_selectors: default_dkim_selectors(),
            dns_server: None,
            language: Language::default(),
        }
    }
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            redis_url: default_redis_url(),
            queue_key: default_queue_key(),
            pool_size: default_redis_pool_size(),
            pop_timeout_secs: default_pop_timeout(),
            worker_concurrency: default_worker_concurrency(),
            health_port: default_health_port(),
            worker_name: default_worker_name(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            url: default_database_url(),
            pool_size: default_db_pool_size(),
            auto_migrate: true,
        }
    }
}

impl Default for JobRetryConfig {
    fn default() -> Self {
        Self {
            attempts: default_attempts(),
            backoff_delay_ms: default_backoff_delay(),
            max_backoff_secs: default_max_backoff(),
        }
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json_logs: false,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_probe_timeout() -> u64 {
    10
}

fn default_tcp_timeout() -> u64 {
    3
}

fn default_port_batch_size() -> usize {
    10
}

fn default_port_batch_pause() -> u64 {
    100
}

fn default_scanner_timeout() -> u64 {
    120
}

pub fn default_dkim_selectors() -> Vec<String> {
    [
        "default", "google", "selector1", "selector2", "k1", "s1", "s2", "dkim", "mail", "smtp",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_redis_url() -> String {
    "redis://127.0.0.1:6379".to_string()
}

fn default_queue_key() -> String {
    "posture:scan:queue".to_string()
}

fn default_redis_pool_size() -> usize {
    16
}

fn default_pop_timeout() -> u64 {
    5
}

fn default_worker_concurrency() -> usize {
    4
}

fn default_health_port() -> u16 {
    8080
}

fn default_worker_name() -> String {
    "posture-worker".to_string()
}

fn default_database_url() -> String {
    "postgresql://postgres@localhost:5432/posture".to_string()
}

fn default_db_pool_size() -> usize {
    16
}

fn default_attempts() -> u32 {
    3
}

fn default_backoff_delay() -> u64 {
    5000
}

fn default_max_backoff() -> u64 {
    300
}

fn default_log_level() -> String {
    "info".to_string()
}

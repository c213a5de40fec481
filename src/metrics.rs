// Copyright (c) 2025 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Metrics Collection
 * Process-wide scan and job counters with tracing integration
 *
 * @copyright 2025 Bountyy Oy
 * @license Proprietary
 */

use parking_lot::Mutex;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::errors::{NetworkError, ScannerError, StoreError};

/// Metrics collector for scan jobs and scanner outcomes
#[derive(Debug, Clone)]
pub struct MetricsCollector {
    enabled: bool,
    jobs_started: Arc<AtomicU64>,
    jobs_completed: Arc<AtomicU64>,
    jobs_failed: Arc<AtomicU64>,
    jobs_duplicate: Arc<AtomicU64>,
    job_retries: Arc<AtomicU64>,
    scanner_failures: Arc<AtomicU64>,
    findings_recorded: Arc<AtomicU64>,
    scan_duration_ms_total: Arc<AtomicU64>,
    error_counts: Arc<Mutex<HashMap<String, u64>>>,
}

impl MetricsCollector {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            jobs_started: Arc::new(AtomicU64::new(0)),
            jobs_completed: Arc::new(AtomicU64::new(0)),
            jobs_failed: Arc::new(AtomicU64::new(0)),
            jobs_duplicate: Arc::new(AtomicU64::new(0)),
            job_retries: Arc::new(AtomicU64::new(0)),
            scanner_failures: Arc::new(AtomicU64::new(0)),
            findings_recorded: Arc::new(AtomicU64::new(0)),
            scan_duration_ms_total: Arc::new(AtomicU64::new(0)),
            error_counts: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn record_job_started(&self, scan_id: &str) {
        if !self.enabled {
            return;
        }
        self.jobs_started.fetch_add(1, Ordering::Relaxed);
        debug!(scan_id = scan_id, "Job started");
    }

    /// Record a completed job and the findings it stored
    pub fn record_job_completed(&self, findings: usize, duration: Duration) {
        if !self.enabled {
            return;
        }
        self.jobs_completed.fetch_add(1, Ordering::Relaxed);
        self.findings_recorded.fetch_add(findings as u64, Ordering::Relaxed);
        self.scan_duration_ms_total
            .fetch_add(duration.as_millis() as u64, Ordering::Relaxed);
    }

    pub fn record_job_failed(&self, error: &ScannerError) {
        if !self.enabled {
            return;
        }
        self.jobs_failed.fetch_add(1, Ordering::Relaxed);
        self.track_error(error);
    }

    /// Job skipped because its scan id already reached a terminal state
    pub fn record_duplicate(&self) {
        if !self.enabled {
            return;
        }
        self.jobs_duplicate.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_retry(&self, attempt: u32, backoff: Duration) {
        if !self.enabled {
            return;
        }
        self.job_retries.fetch_add(1, Ordering::Relaxed);
        debug!(attempt = attempt, backoff_ms = backoff.as_millis(), "Job retried");
    }

    pub fn record_scanner_failures(&self, count: usize) {
        if !self.enabled || count == 0 {
            return;
        }
        self.scanner_failures.fetch_add(count as u64, Ordering::Relaxed);
    }

    /// Count an error under a stable error-type label
    pub fn track_error(&self, error: &ScannerError) {
        if !self.enabled {
            return;
        }
        let error_type = error_type(error);
        *self.error_counts.lock().entry(error_type.to_string()).or_insert(0) += 1;
        debug!(error_type = error_type, "Error tracked");
    }

    pub fn error_count(&self, error_type: &str) -> u64 {
        self.error_counts.lock().get(error_type).copied().unwrap_or(0)
    }

    pub fn get_metrics_summary(&self) -> MetricsSummary {
        let completed = self.jobs_completed.load(Ordering::Relaxed);
        let total_ms = self.scan_duration_ms_total.load(Ordering::Relaxed);

        MetricsSummary {
            jobs_started: self.jobs_started.load(Ordering::Relaxed),
            jobs_completed: completed,
            jobs_failed: self.jobs_failed.load(Ordering::Relaxed),
            jobs_duplicate: self.jobs_duplicate.load(Ordering::Relaxed),
            job_retries: self.job_retries.load(Ordering::Relaxed),
            scanner_failures: self.scanner_failures.load(Ordering::Relaxed),
            findings_recorded: self.findings_recorded.load(Ordering::Relaxed),
            avg_scan_duration_ms: if completed == 0 { 0 } else { total_ms / completed },
            errors: self.error_counts.lock().clone(),
        }
    }
}

fn error_type(error: &ScannerError) -> &'static str {
    match error {
        ScannerError::Network(e) => match e {
            NetworkError::ConnectionTimeout { .. } => "connection_timeout",
            NetworkError::DnsResolutionFailed { .. } => "dns_resolution_failed",
            NetworkError::TlsHandshakeFailed { .. } => "tls_handshake_failed",
            NetworkError::LegacyTlsOnly { .. } => "tls_legacy_only",
            NetworkError::ConnectionRefused { .. } => "connection_refused",
            NetworkError::InvalidUrl { .. } => "invalid_url",
            NetworkError::Other(_) => "network_other",
        },
        ScannerError::Http(_) => "http",
        ScannerError::Store(e) => match e {
            StoreError::ConnectionFailed { .. } => "store_connection_failed",
            StoreError::ExecutionNotFound { .. } => "execution_not_found",
            StoreError::InvalidTransition { .. } => "invalid_transition",
            StoreError::Query(_) => "store_query",
        },
        ScannerError::Queue(_) => "queue",
        ScannerError::Configuration(_) => "configuration",
        ScannerError::Validation(_) => "validation",
        ScannerError::Timeout { .. } => "timeout",
        ScannerError::ScannerFailed { .. } => "scanner_failed",
        ScannerError::General(_) => "general",
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new(true)
    }
}

/// Snapshot served by the worker's `/metrics` endpoint
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSummary {
    pub jobs_started: u64,
    pub jobs_completed: u64,
    pub jobs_failed: u64,
    pub jobs_duplicate: u64,
    pub job_retries: u64,
    pub scanner_failures: u64,
    pub findings_recorded: u64,
    pub avg_scan_duration_ms: u64,
    pub errors: HashMap<String, u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_collector_creation() {
        let metrics = MetricsCollector::new(true);
        assert!(metrics.enabled);

        let metrics_disabled = MetricsCollector::new(false);
        assert!(!metrics_disabled.enabled);
    }

    #[test]
    fn test_job_counters() {
        let metrics = MetricsCollector::new(true);

        metrics.record_job_started("scan-1");
        metrics.record_job_completed(4, Duration::from_millis(300));
        metrics.record_job_started("scan-2");
        metrics.record_job_completed(2, Duration::from_millis(100));
        metrics.record_retry(1, Duration::from_secs(5));
        metrics.record_duplicate();

        let summary = metrics.get_metrics_summary();
        assert_eq!(summary.jobs_started, 2);
        assert_eq!(summary.jobs_completed, 2);
        assert_eq!(summary.findings_recorded, 6);
        assert_eq!(summary.avg_scan_duration_ms, 200);
        assert_eq!(summary.job_retries, 1);
        assert_eq!(summary.jobs_duplicate, 1);
    }

    #[test]
    fn test_error_tracking() {
        let metrics = MetricsCollector::new(true);

        metrics.record_job_failed(&ScannerError::Validation("bad domain".to_string()));
        metrics.track_error(&ScannerError::Network(NetworkError::DnsResolutionFailed {
            host: "example.com".to_string(),
            reason: "NXDOMAIN".to_string(),
        }));

        assert_eq!(metrics.error_count("validation"), 1);
        assert_eq!(metrics.error_count("dns_resolution_failed"), 1);
        assert_eq!(metrics.get_metrics_summary().jobs_failed, 1);
    }

    #[test]
    fn test_disabled_collector_ignores_everything() {
        let metrics = MetricsCollector::new(false);
        metrics.record_job_started("scan-1");
        metrics.record_scanner_failures(2);
        let summary = metrics.get_metrics_summary();
        assert_eq!(summary.jobs_started, 0);
        assert_eq!(summary.scanner_failures, 0);
    }
}

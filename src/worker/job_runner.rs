// Copyright (c) 2025 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Scan Job Runner
 * Drives one scan execution from Pending to a terminal state
 *
 * @copyright 2025 Bountyy Oy
 * @license Proprietary
 */

use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

use crate::engine::{normalize_domain, ScanOrchestrator};
use crate::errors::{ScannerError, ScannerResult};
use crate::i18n::Language;
use crate::metrics::MetricsCollector;
use crate::queue::ScanJob;
use crate::retry::retry_with_predicate;
use crate::store::FindingsStore;
use crate::types::{ScanExecution, ScanRequest, ScanStatus};

/// How a job ended
#[derive(Debug, Clone, PartialEq)]
pub enum JobOutcome {
    Completed(ScanExecution),
    Failed { execution: ScanExecution, error: String },
    /// The scan id had already reached a terminal state; nothing was rerun
    Duplicate(ScanExecution),
}

impl JobOutcome {
    pub fn execution(&self) -> &ScanExecution {
        match self {
            JobOutcome::Completed(execution)
            | JobOutcome::Failed { execution, .. }
            | JobOutcome::Duplicate(execution) => execution,
        }
    }
}

pub struct JobRunner {
    orchestrator: Arc<ScanOrchestrator>,
    store: Arc<dyn FindingsStore>,
    metrics: MetricsCollector,
    default_language: Language,
    max_backoff: Duration,
}

impl JobRunner {
    pub fn new(orchestrator: Arc<ScanOrchestrator>, store: Arc<dyn FindingsStore>) -> Self {
        Self {
            orchestrator,
            store,
            metrics: MetricsCollector::default(),
            default_language: Language::default(),
            max_backoff: Duration::from_secs(300),
        }
    }

    pub fn with_metrics(mut self, metrics: MetricsCollector) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn with_default_language(mut self, language: Language) -> Self {
        self.default_language = language;
        self
    }

    pub fn with_max_backoff(mut self, max_backoff: Duration) -> Self {
        self.max_backoff = max_backoff;
        self
    }

    pub fn metrics(&self) -> &MetricsCollector {
        &self.metrics
    }

    /// Run one job to completion.
    ///
    /// Registering the execution is retried under the job's policy. If the
    /// store is still unavailable after that, the error is returned and the
    /// caller must keep the job queued. Everything after registration ends
    /// in a `JobOutcome`.
    pub async fn run(&self, job: &ScanJob) -> ScannerResult<JobOutcome> {
        let request = &job.request;
        let scan_id = request.scan_id.as_str();
        let retry = job.options.retry_config(self.max_backoff);

        let existing = retry_with_predicate(
            &retry,
            "register_scan",
            |_| self.store.create_execution(request),
            ScannerError::is_retryable,
        )
        .await?;
        if existing.status.is_terminal() {
            info!(
                scan_id,
                status = %existing.status,
                "Scan already finished, skipping duplicate delivery"
            );
            self.metrics.record_duplicate();
            return Ok(JobOutcome::Duplicate(existing));
        }

        self.metrics.record_job_started(scan_id);
        let clock = Instant::now();

        if let Err(e) = normalize_domain(&request.domain) {
            return self.fail(scan_id, e).await;
        }

        let mut failures = 0u32;
        let result = retry_with_predicate(
            &retry,
            "scan_job",
            |attempt| self.attempt(request, attempt),
            |err: &ScannerError| {
                failures += 1;
                let retryable = err.is_retryable();
                if retryable && failures < retry.max_attempts {
                    self.metrics.record_retry(failures, retry.calculate_backoff(failures));
                }
                retryable
            },
        )
        .await;

        match result {
            Ok((execution, findings)) => {
                self.metrics.record_job_completed(findings, clock.elapsed());
                info!(
                    scan_id,
                    health_score = execution.health_score,
                    findings,
                    duration_ms = clock.elapsed().as_millis() as u64,
                    "Scan job completed"
                );
                Ok(JobOutcome::Completed(execution))
            }
            Err(e) => self.fail(scan_id, e).await,
        }
    }

    /// One attempt: Running, clear earlier partial results, scan, persist
    /// findings, Completed
    async fn attempt(
        &self,
        request: &ScanRequest,
        attempt: u32,
    ) -> ScannerResult<(ScanExecution, usize)> {
        let scan_id = request.scan_id.as_str();
        self.store
            .upsert_scan_status(scan_id, ScanStatus::Running, None)
            .await?;

        let stale = self.store.discard_findings(scan_id).await?;
        if stale > 0 {
            warn!(scan_id, attempt, stale, "Discarded findings of an earlier attempt");
        }

        info!(scan_id, domain = %request.domain, attempt, "Running scan");

        let language = request.language.unwrap_or(self.default_language);
        let outcome = self.orchestrator.run(&request.domain, language).await?;
        self.metrics
            .record_scanner_failures(outcome.failed_scanners().count());

        let findings: Vec<_> = outcome
            .findings
            .into_iter()
            .map(|finding| finding.bind_to_scan(scan_id))
            .collect();
        let count = findings.len();

        self.store.append_findings(scan_id, &findings).await?;
        let execution = self
            .store
            .upsert_scan_status(scan_id, ScanStatus::Completed, Some(outcome.health_score))
            .await?;

        Ok((execution, count))
    }

    async fn fail(&self, scan_id: &str, err: ScannerError) -> ScannerResult<JobOutcome> {
        error!(scan_id, error = %err, retryable = err.is_retryable(), "Scan job failed");
        self.metrics.record_job_failed(&err);

        let execution = match self
            .store
            .upsert_scan_status(scan_id, ScanStatus::Failed, None)
            .await
        {
            Ok(execution) => execution,
            Err(store_err) => {
                warn!(scan_id, error = %store_err, "Could not record failed status");
                self.store
                    .execution(scan_id)
                    .await?
                    .ok_or_else(|| crate::errors::StoreError::ExecutionNotFound {
                        scan_id: scan_id.to_string(),
                    })?
            }
        };

        match self.store.discard_findings(scan_id).await {
            Ok(0) => {}
            Ok(removed) => info!(scan_id, removed, "Discarded findings of failed scan"),
            Err(e) => warn!(scan_id, error = %e, "Could not discard findings of failed scan"),
        }

        Ok(JobOutcome::Failed {
            execution,
            error: err.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::{BackoffKind, BackoffOptions, JobOptions};
    use crate::scanners::{ReportBuilder, SecurityScanner};
    use crate::store::MemoryStore;
    use crate::types::{Category, FindingKind, ScanContext, ScannerReport, Severity};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct Headers;

    #[async_trait]
    impl SecurityScanner for Headers {
        fn name(&self) -> &'static str {
            "security_headers"
        }

        fn category(&self) -> Category {
            Category::WebSecurity
        }

        async fn scan(&self, ctx: &ScanContext) -> ScannerResult<ScannerReport> {
            let mut report = ReportBuilder::new(ctx, Category::WebSecurity);
            report.push(FindingKind::CspMissing, Severity::High, 25, &[]);
            report.push(FindingKind::ReferrerPolicyMissing, Severity::Low, 5, &[]);
            Ok(report.finish())
        }
    }

    /// Ports scanner whose first scan sees telnet open and later scans see nothing
    struct ChangingPorts {
        calls: AtomicU32,
    }

    #[async_trait]
    impl SecurityScanner for ChangingPorts {
        fn name(&self) -> &'static str {
            "ports"
        }

        fn category(&self) -> Category {
            Category::NetworkSecurity
        }

        async fn scan(&self, ctx: &ScanContext) -> ScannerResult<ScannerReport> {
            let mut report = ReportBuilder::new(ctx, Category::NetworkSecurity);
            if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
                report.push(FindingKind::TelnetExposed, Severity::Critical, 40, &[]);
            } else {
                report.push(FindingKind::NoOpenPorts, Severity::Low, 0, &[]);
            }
            Ok(report.finish())
        }
    }

    fn connection_reset() -> ScannerError {
        ScannerError::Store(crate::errors::StoreError::Query(
            "connection reset".to_string(),
        ))
    }

    /// Store whose first `fail_first` Completed updates and first
    /// `fail_registrations` registrations error out
    struct FlakyStore {
        inner: MemoryStore,
        fail_first: u32,
        fail_registrations: u32,
        completed_calls: AtomicU32,
        registration_calls: AtomicU32,
    }

    impl FlakyStore {
        fn new(fail_first: u32, fail_registrations: u32) -> Self {
            Self {
                inner: MemoryStore::new(),
                fail_first,
                fail_registrations,
                completed_calls: AtomicU32::new(0),
                registration_calls: AtomicU32::new(0),
            }
        }
    }

    #[async_trait]
    impl FindingsStore for FlakyStore {
        async fn create_execution(&self, request: &ScanRequest) -> ScannerResult<ScanExecution> {
            if self.registration_calls.fetch_add(1, Ordering::SeqCst) < self.fail_registrations {
                return Err(connection_reset());
            }
            self.inner.create_execution(request).await
        }

        async fn upsert_scan_status(
            &self,
            scan_id: &str,
            status: ScanStatus,
            health_score: Option<u8>,
        ) -> ScannerResult<ScanExecution> {
            if status == ScanStatus::Completed
                && self.completed_calls.fetch_add(1, Ordering::SeqCst) < self.fail_first
            {
                return Err(connection_reset());
            }
            self.inner.upsert_scan_status(scan_id, status, health_score).await
        }

        async fn append_findings(
            &self,
            scan_id: &str,
            findings: &[crate::types::Finding],
        ) -> ScannerResult<usize> {
            self.inner.append_findings(scan_id, findings).await
        }

        async fn discard_findings(&self, scan_id: &str) -> ScannerResult<usize> {
            self.inner.discard_findings(scan_id).await
        }

        async fn execution(&self, scan_id: &str) -> ScannerResult<Option<ScanExecution>> {
            self.inner.execution(scan_id).await
        }

        async fn findings(&self, scan_id: &str) -> ScannerResult<Vec<crate::types::Finding>> {
            self.inner.findings(scan_id).await
        }
    }

    fn orchestrator() -> Arc<ScanOrchestrator> {
        Arc::new(ScanOrchestrator::new(vec![Arc::new(Headers)], Duration::from_secs(5)))
    }

    fn fast_job(scan_id: &str, domain: &str, attempts: u32) -> ScanJob {
        ScanJob::new(
            ScanRequest::new(scan_id, domain),
            JobOptions {
                attempts,
                backoff: BackoffOptions {
                    kind: BackoffKind::Exponential,
                    delay_ms: 1,
                },
            },
        )
    }

    #[tokio::test]
    async fn test_successful_job() {
        let store = Arc::new(MemoryStore::new());
        let runner = JobRunner::new(orchestrator(), store.clone());

        let outcome = runner.run(&fast_job("s-1", "example.com", 3)).await.unwrap();
        let JobOutcome::Completed(execution) = outcome else {
            panic!("expected completion, got {:?}", outcome);
        };

        assert_eq!(execution.status, ScanStatus::Completed);
        // one High (8) and one Low (1.5)
        assert_eq!(execution.health_score, Some(91));
        assert!(execution.started_at.is_some());
        assert!(execution.completed_at.is_some());
        assert_eq!(store.findings("s-1").await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_duplicate_delivery_is_not_rescanned() {
        let store = Arc::new(MemoryStore::new());
        let runner = JobRunner::new(orchestrator(), store.clone());
        let job = fast_job("s-1", "example.com", 3);

        runner.run(&job).await.unwrap();
        let second = runner.run(&job).await.unwrap();

        assert!(matches!(second, JobOutcome::Duplicate(_)));
        assert_eq!(store.findings("s-1").await.unwrap().len(), 2);
        assert_eq!(runner.metrics().get_metrics_summary().jobs_duplicate, 1);
    }

    #[tokio::test]
    async fn test_transient_store_failure_is_retried_without_duplicates() {
        let store = Arc::new(FlakyStore::new(1, 0));
        let runner = JobRunner::new(orchestrator(), store.clone());

        let outcome = runner.run(&fast_job("s-2", "example.com", 3)).await.unwrap();

        assert!(matches!(outcome, JobOutcome::Completed(_)));
        assert_eq!(store.findings("s-2").await.unwrap().len(), 2);
        assert_eq!(runner.metrics().get_metrics_summary().job_retries, 1);
    }

    #[tokio::test]
    async fn test_exhausted_retries_end_failed() {
        let store = Arc::new(FlakyStore::new(u32::MAX, 0));
        let runner = JobRunner::new(orchestrator(), store.clone());

        let outcome = runner.run(&fast_job("s-3", "example.com", 2)).await.unwrap();

        let JobOutcome::Failed { execution, error } = outcome else {
            panic!("expected failure");
        };
        assert_eq!(execution.status, ScanStatus::Failed);
        assert_eq!(execution.health_score, None);
        assert!(error.contains("connection reset"));
        assert!(store.findings("s-3").await.unwrap().is_empty());
        assert_eq!(store.completed_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_invalid_domain_fails_without_retry() {
        let store = Arc::new(MemoryStore::new());
        let runner = JobRunner::new(orchestrator(), store.clone());

        let outcome = runner.run(&fast_job("s-4", "not a domain", 3)).await.unwrap();

        let JobOutcome::Failed { execution, .. } = outcome else {
            panic!("expected failure");
        };
        assert_eq!(execution.status, ScanStatus::Failed);
        assert!(execution.started_at.is_none());
        assert!(store.findings("s-4").await.unwrap().is_empty());
        assert_eq!(runner.metrics().get_metrics_summary().job_retries, 0);
    }

    #[tokio::test]
    async fn test_retried_attempt_replaces_earlier_findings() {
        let store = Arc::new(FlakyStore::new(1, 0));
        let orchestrator = Arc::new(ScanOrchestrator::new(
            vec![Arc::new(ChangingPorts {
                calls: AtomicU32::new(0),
            })],
            Duration::from_secs(5),
        ));
        let runner = JobRunner::new(orchestrator, store.clone());

        let outcome = runner.run(&fast_job("s-5", "example.com", 3)).await.unwrap();
        let JobOutcome::Completed(execution) = outcome else {
            panic!("expected completion, got {:?}", outcome);
        };

        let stored = store.findings("s-5").await.unwrap();
        let kinds: Vec<_> = stored.iter().map(|f| f.kind).collect();
        assert_eq!(kinds, vec![FindingKind::NoOpenPorts]);

        // score agrees with what is stored: one Low (1.5)
        assert_eq!(execution.health_score, Some(99));
        assert_eq!(
            execution.health_score,
            Some(crate::health_score::calculate_health_score(&stored))
        );
    }

    #[tokio::test]
    async fn test_registration_is_retried_while_store_recovers() {
        let store = Arc::new(FlakyStore::new(0, 2));
        let runner = JobRunner::new(orchestrator(), store.clone());

        let outcome = runner.run(&fast_job("s-6", "example.com", 3)).await.unwrap();

        assert!(matches!(outcome, JobOutcome::Completed(_)));
        assert_eq!(store.registration_calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_registration_failure_is_returned_to_caller() {
        let store = Arc::new(FlakyStore::new(0, u32::MAX));
        let runner = JobRunner::new(orchestrator(), store.clone());

        let result = runner.run(&fast_job("s-7", "example.com", 2)).await;

        assert!(result.is_err());
        assert_eq!(store.registration_calls.load(Ordering::SeqCst), 2);
        assert!(store.inner.is_empty());
    }
}

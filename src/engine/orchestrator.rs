// Copyright (c) 2025 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Scan Orchestrator
 * Runs the scanner battery in parallel and merges the results
 *
 * @copyright 2025 Bountyy Oy
 * @license Proprietary
 */

use chrono::Utc;
use futures::future::join_all;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::timeout;
use tracing::{debug, info, warn};

use super::domain::normalize_domain;
use crate::config::{parse_dns_server, AppConfig, EngineConfig};
use crate::dns_cache::DnsCache;
use crate::errors::{ScannerError, ScannerResult};
use crate::health_score::calculate_health_score;
use crate::i18n::{localize, Language};
use crate::probes::{
    DnsProbe, HickoryDnsProbe, HttpProbe, ReqwestHttpProbe, RustlsTlsProbe, TcpProbe, TlsProbe,
    TokioTcpProbe,
};
use crate::scanners::ports::PortScanSettings;
use crate::scanners::{
    CertificateScanner, EmailAuthScanner, PortScanner, SecurityHeadersScanner, SecurityScanner,
};
use crate::types::{
    Category, Finding, FindingKind, ScanContext, ScanOutcome, ScannerSummary, Severity,
};

/// Result of one scanner task before it is merged
struct ScannerRun {
    name: &'static str,
    category: Category,
    result: Result<crate::types::ScannerReport, String>,
    duration_ms: u64,
}

pub struct ScanOrchestrator {
    scanners: Vec<Arc<dyn SecurityScanner>>,
    scanner_timeout: Duration,
}

impl ScanOrchestrator {
    pub fn new(scanners: Vec<Arc<dyn SecurityScanner>>, scanner_timeout: Duration) -> Self {
        Self {
            scanners,
            scanner_timeout,
        }
    }

    /// The four production scanners wired to real network probes
    pub fn from_config(config: &EngineConfig) -> ScannerResult<Self> {
        let dns_server = config
            .dns_server
            .as_deref()
            .map(parse_dns_server)
            .transpose()
            .map_err(|e| ScannerError::Configuration(e.to_string()))?;

        let dns: Arc<dyn DnsProbe> = Arc::new(
            HickoryDnsProbe::new(dns_server, config.dns_timeout())?
                .with_cache(Arc::new(DnsCache::new())),
        );
        let http: Arc<dyn HttpProbe> = Arc::new(ReqwestHttpProbe::new(config.http_timeout())?);
        let tls: Arc<dyn TlsProbe> = Arc::new(RustlsTlsProbe::new(config.tls_timeout())?);
        let tcp: Arc<dyn TcpProbe> = Arc::new(TokioTcpProbe::new(config.tcp_connect_timeout()));

        let port_settings = PortScanSettings {
            batch_size: config.port_batch_size,
            batch_pause: config.port_batch_pause(),
        };

        let scanners: Vec<Arc<dyn SecurityScanner>> = vec![
            Arc::new(EmailAuthScanner::new(Arc::clone(&dns), config.dkim_selectors.clone())),
            Arc::new(CertificateScanner::new(tls, Arc::clone(&http))),
            Arc::new(SecurityHeadersScanner::new(http)),
            Arc::new(PortScanner::new(dns, tcp, port_settings)),
        ];

        Ok(Self::new(scanners, config.scanner_timeout()))
    }

    pub fn scanner_names(&self) -> Vec<&'static str> {
        self.scanners.iter().map(|s| s.name()).collect()
    }

    /// Scan one domain with every scanner.
    ///
    /// Fails only when the domain itself is invalid. A scanner that errors,
    /// panics or overruns its deadline contributes one synthetic finding
    /// instead of its results; the others are unaffected.
    pub async fn run(&self, domain: &str, language: Language) -> ScannerResult<ScanOutcome> {
        let domain = normalize_domain(domain)?;
        let started_at = Utc::now();
        let clock = Instant::now();

        info!(domain = %domain, scanners = self.scanners.len(), "Starting scan");

        let ctx = Arc::new(ScanContext::new(domain.clone(), language));
        let tasks = self.scanners.iter().map(|scanner| {
            let scanner = Arc::clone(scanner);
            let ctx = Arc::clone(&ctx);
            let deadline = self.scanner_timeout;
            let name = scanner.name();
            let category = scanner.category();

            async move {
                let scanner_clock = Instant::now();
                let handle =
                    tokio::spawn(async move { timeout(deadline, scanner.scan(&ctx)).await });

                let result = match handle.await {
                    Ok(Ok(Ok(report))) => Ok(report),
                    Ok(Ok(Err(e))) => Err(e.to_string()),
                    Ok(Err(_)) => Err(ScannerError::Timeout { duration: deadline }.to_string()),
                    Err(join_error) if join_error.is_panic() => Err("scanner panicked".to_string()),
                    Err(join_error) => Err(join_error.to_string()),
                };

                ScannerRun {
                    name,
                    category,
                    result,
                    duration_ms: scanner_clock.elapsed().as_millis() as u64,
                }
            }
        });

        let runs = join_all(tasks).await;

        let mut findings: Vec<Finding> = Vec::new();
        let mut summaries = Vec::with_capacity(runs.len());

        for run in runs {
            match run.result {
                Ok(report) => {
                    debug!(
                        scanner = run.name,
                        findings = report.findings.len(),
                        score = report.score,
                        duration_ms = run.duration_ms,
                        "Scanner finished"
                    );
                    summaries.push(ScannerSummary {
                        scanner: run.name.to_string(),
                        category: run.category,
                        score: Some(report.score),
                        findings: report.findings.len(),
                        error: None,
                        duration_ms: run.duration_ms,
                    });
                    findings.extend(report.findings);
                }
                Err(reason) => {
                    warn!(domain = %domain, scanner = run.name, error = %reason, "Scanner failed");
                    findings.push(scanner_failure(run.name, run.category, &reason, language));
                    summaries.push(ScannerSummary {
                        scanner: run.name.to_string(),
                        category: run.category,
                        score: None,
                        findings: 1,
                        error: Some(reason),
                        duration_ms: run.duration_ms,
                    });
                }
            }
        }

        let health_score = calculate_health_score(&findings);
        let duration_ms = clock.elapsed().as_millis() as u64;

        info!(
            domain = %domain,
            health_score,
            findings = findings.len(),
            failed_scanners = summaries.iter().filter(|s| s.error.is_some()).count(),
            duration_ms,
            "Scan completed"
        );

        Ok(ScanOutcome {
            domain,
            health_score,
            findings,
            scanners: summaries,
            started_at,
            completed_at: Utc::now(),
            duration_ms,
        })
    }
}

/// The one finding recorded in place of a failed scanner's results
fn scanner_failure(scanner: &str, category: Category, reason: &str, language: Language) -> Finding {
    let text = localize(
        language,
        FindingKind::ScannerFailed,
        &[("scanner", scanner), ("reason", reason)],
    );
    Finding::new(FindingKind::ScannerFailed, category, Severity::Medium, text)
}

/// Synchronous variant for on-demand callers: scan now, return the score
/// and findings without touching the queue or the store.
pub async fn execute_scan(
    domain: &str,
    config: &AppConfig,
    language: Option<Language>,
) -> ScannerResult<(u8, Vec<Finding>)> {
    let orchestrator = ScanOrchestrator::from_config(&config.engine)?;
    let outcome = orchestrator
        .run(domain, language.unwrap_or(config.engine.language))
        .await?;
    Ok((outcome.health_score, outcome.findings))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanners::ReportBuilder;
    use crate::types::ScannerReport;
    use async_trait::async_trait;

    struct Fixed {
        name: &'static str,
        category: Category,
        severities: Vec<Severity>,
    }

    #[async_trait]
    impl SecurityScanner for Fixed {
        fn name(&self) -> &'static str {
            self.name
        }

        fn category(&self) -> Category {
            self.category
        }

        async fn scan(&self, ctx: &ScanContext) -> ScannerResult<ScannerReport> {
            let mut report = ReportBuilder::new(ctx, self.category);
            for severity in &self.severities {
                report.push(FindingKind::HstsMissing, *severity, 10, &[]);
            }
            Ok(report.finish())
        }
    }

    struct Failing;

    #[async_trait]
    impl SecurityScanner for Failing {
        fn name(&self) -> &'static str {
            "email_auth"
        }

        fn category(&self) -> Category {
            Category::EmailSecurity
        }

        async fn scan(&self, _ctx: &ScanContext) -> ScannerResult<ScannerReport> {
            Err(ScannerError::General("resolver exploded".to_string()))
        }
    }

    struct Panicking;

    #[async_trait]
    impl SecurityScanner for Panicking {
        fn name(&self) -> &'static str {
            "certificate"
        }

        fn category(&self) -> Category {
            Category::Certificate
        }

        async fn scan(&self, _ctx: &ScanContext) -> ScannerResult<ScannerReport> {
            panic!("unexpected certificate layout");
        }
    }

    struct Slow;

    #[async_trait]
    impl SecurityScanner for Slow {
        fn name(&self) -> &'static str {
            "ports"
        }

        fn category(&self) -> Category {
            Category::NetworkSecurity
        }

        async fn scan(&self, ctx: &ScanContext) -> ScannerResult<ScannerReport> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(ReportBuilder::new(ctx, Category::NetworkSecurity).finish())
        }
    }

    fn headers(severities: Vec<Severity>) -> Arc<dyn SecurityScanner> {
        Arc::new(Fixed {
            name: "security_headers",
            category: Category::WebSecurity,
            severities,
        })
    }

    #[tokio::test]
    async fn test_clean_scan_scores_100() {
        let orchestrator = ScanOrchestrator::new(vec![headers(vec![])], Duration::from_secs(5));
        let outcome = orchestrator.run("Example.com", Language::En).await.unwrap();

        assert_eq!(outcome.domain, "example.com");
        assert_eq!(outcome.health_score, 100);
        assert!(outcome.findings.is_empty());
        assert_eq!(outcome.failed_scanners().count(), 0);
    }

    #[tokio::test]
    async fn test_failures_are_isolated() {
        let orchestrator = ScanOrchestrator::new(
            vec![
                Arc::new(Failing),
                Arc::new(Panicking),
                headers(vec![Severity::High, Severity::Low]),
                Arc::new(Slow),
            ],
            Duration::from_millis(200),
        );
        let outcome = orchestrator.run("example.com", Language::En).await.unwrap();

        let synthetic: Vec<&Finding> = outcome
            .findings
            .iter()
            .filter(|f| f.kind == FindingKind::ScannerFailed)
            .collect();
        assert_eq!(synthetic.len(), 3);
        assert!(synthetic.iter().all(|f| f.severity == Severity::Medium));

        let categories: Vec<Category> = synthetic.iter().map(|f| f.category).collect();
        assert!(categories.contains(&Category::EmailSecurity));
        assert!(categories.contains(&Category::Certificate));
        assert!(categories.contains(&Category::NetworkSecurity));

        let headers_findings = outcome
            .findings
            .iter()
            .filter(|f| f.category == Category::WebSecurity)
            .count();
        assert_eq!(headers_findings, 2);
        assert_eq!(outcome.failed_scanners().count(), 3);
    }

    #[tokio::test]
    async fn test_score_recomputed_from_merged_findings() {
        let orchestrator = ScanOrchestrator::new(
            vec![headers(vec![
                Severity::Critical,
                Severity::High,
                Severity::Medium,
                Severity::Low,
            ])],
            Duration::from_secs(5),
        );
        let outcome = orchestrator.run("example.com", Language::En).await.unwrap();

        // sub-score would be 60; the health score uses the tier-capped model
        assert_eq!(outcome.health_score, 75);
    }

    #[tokio::test]
    async fn test_failure_text_is_localized() {
        let orchestrator = ScanOrchestrator::new(vec![Arc::new(Failing)], Duration::from_secs(5));
        let outcome = orchestrator.run("example.com", Language::Es).await.unwrap();

        let finding = &outcome.findings[0];
        assert!(finding.title.contains("email_auth"));
        assert!(finding.description.contains("resolver exploded"));
    }

    #[tokio::test]
    async fn test_invalid_domain_is_rejected() {
        let orchestrator = ScanOrchestrator::new(vec![headers(vec![])], Duration::from_secs(5));
        let err = orchestrator.run("not a domain", Language::En).await.unwrap_err();
        assert!(matches!(err, ScannerError::Validation(_)));
    }
}

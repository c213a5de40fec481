// Copyright (c) 2025 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Exposed Service Port Scanner
 * TCP connects against a fixed table of well-known service ports
 *
 * @copyright 2025 Bountyy Oy
 * @license Proprietary
 */

use async_trait::async_trait;
use futures::future::join_all;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use super::{ReportBuilder, SecurityScanner};
use crate::errors::ScannerResult;
use crate::probes::{DnsProbe, PortState, TcpProbe};
use crate::types::{Category, FindingKind, ScanContext, ScannerReport, Severity};

/// A probed port, its service and how risky public exposure is.
/// `Low` risk ports never produce a per-port finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServicePort {
    pub port: u16,
    pub service: &'static str,
    pub risk: Severity,
    pub kind: Option<FindingKind>,
    pub alt_web: bool,
}

const fn exposed(
    port: u16,
    service: &'static str,
    risk: Severity,
    kind: FindingKind,
) -> ServicePort {
    ServicePort {
        port,
        service,
        risk,
        kind: Some(kind),
        alt_web: false,
    }
}

const fn expected(port: u16, service: &'static str) -> ServicePort {
    ServicePort {
        port,
        service,
        risk: Severity::Low,
        kind: None,
        alt_web: false,
    }
}

const fn alt_web(port: u16, service: &'static str) -> ServicePort {
    ServicePort {
        port,
        service,
        risk: Severity::Low,
        kind: None,
        alt_web: true,
    }
}

pub const PORT_TABLE: &[ServicePort] = &[
    exposed(21, "FTP", Severity::High, FindingKind::FtpExposed),
    exposed(22, "SSH", Severity::Medium, FindingKind::SshExposed),
    exposed(23, "Telnet", Severity::Critical, FindingKind::TelnetExposed),
    expected(25, "SMTP"),
    exposed(53, "DNS", Severity::Medium, FindingKind::DnsServiceExposed),
    expected(80, "HTTP"),
    exposed(110, "POP3", Severity::Medium, FindingKind::MailServiceExposed),
    exposed(143, "IMAP", Severity::Medium, FindingKind::MailServiceExposed),
    expected(443, "HTTPS"),
    exposed(445, "SMB", Severity::Critical, FindingKind::FileShareExposed),
    exposed(1433, "MSSQL", Severity::High, FindingKind::DatabaseExposed),
    alt_web(3000, "Development server"),
    exposed(3306, "MySQL", Severity::High, FindingKind::DatabaseExposed),
    exposed(3389, "RDP", Severity::High, FindingKind::RemoteDesktopExposed),
    exposed(5432, "PostgreSQL", Severity::High, FindingKind::DatabaseExposed),
    exposed(5900, "VNC", Severity::High, FindingKind::RemoteDesktopExposed),
    exposed(5984, "CouchDB", Severity::High, FindingKind::DatabaseExposed),
    exposed(6379, "Redis", Severity::High, FindingKind::DatabaseExposed),
    alt_web(8000, "HTTP-alt"),
    alt_web(8080, "HTTP-proxy"),
    alt_web(8443, "HTTPS-alt"),
    alt_web(8888, "HTTP-alt"),
    exposed(9200, "Elasticsearch", Severity::High, FindingKind::DatabaseExposed),
    exposed(11211, "Memcached", Severity::High, FindingKind::DatabaseExposed),
    exposed(27017, "MongoDB", Severity::High, FindingKind::DatabaseExposed),
];

/// Per-tier penalty and the most a tier can take off the sub-score
fn tier_penalty(risk: Severity) -> (u32, u32) {
    match risk {
        Severity::Critical => (40, 60),
        Severity::High => (25, 50),
        Severity::Medium => (15, 30),
        Severity::Low => (0, 0),
    }
}

#[derive(Debug, Clone)]
pub struct PortScanSettings {
    pub batch_size: usize,
    pub batch_pause: Duration,
}

impl Default for PortScanSettings {
    fn default() -> Self {
        Self {
            batch_size: 10,
            batch_pause: Duration::from_millis(100),
        }
    }
}

pub struct PortScanner {
    dns: Arc<dyn DnsProbe>,
    tcp: Arc<dyn TcpProbe>,
    settings: PortScanSettings,
    ports: Vec<ServicePort>,
}

impl PortScanner {
    pub fn new(dns: Arc<dyn DnsProbe>, tcp: Arc<dyn TcpProbe>, settings: PortScanSettings) -> Self {
        Self {
            dns,
            tcp,
            settings,
            ports: PORT_TABLE.to_vec(),
        }
    }

    /// Probe every port, at most `batch_size` at a time
    async fn probe_ports(&self, target: std::net::IpAddr) -> Vec<(ServicePort, PortState)> {
        let batch_size = self.settings.batch_size.max(1);
        let batches: Vec<&[ServicePort]> = self.ports.chunks(batch_size).collect();
        let mut results = Vec::with_capacity(self.ports.len());

        for (index, batch) in batches.iter().enumerate() {
            let probes = batch.iter().map(|service| async move {
                let state = self.tcp.connect(SocketAddr::new(target, service.port)).await;
                (*service, state)
            });
            results.extend(join_all(probes).await);

            if index + 1 < batches.len() && !self.settings.batch_pause.is_zero() {
                tokio::time::sleep(self.settings.batch_pause).await;
            }
        }

        results
    }
}

/// Findings and sub-score for the set of open ports
pub(crate) fn evaluate_ports(report: &mut ReportBuilder<'_>, open: &[ServicePort]) {
    if open.is_empty() {
        report.push(FindingKind::NoOpenPorts, Severity::Low, 0, &[]);
        return;
    }

    for risk in [Severity::Critical, Severity::High, Severity::Medium] {
        let (each, cap) = tier_penalty(risk);
        let mut tier_total = 0;

        for service in open.iter().filter(|s| s.risk == risk) {
            let Some(kind) = service.kind else { continue };
            let port = service.port.to_string();
            report.push(kind, risk, 0, &[("port", &port), ("service", service.service)]);
            tier_total += each;
        }

        report.penalize(tier_total.min(cap));
    }

    if open.len() > 5 {
        let count = open.len().to_string();
        let listed = open
            .iter()
            .map(|s| format!("{}/{}", s.port, s.service))
            .collect::<Vec<_>>()
            .join(", ");
        report.push(
            FindingKind::LargeAttackSurface,
            Severity::Medium,
            10,
            &[("count", &count), ("ports", &listed)],
        );
    }
    if open.len() > 10 {
        report.penalize(10);
    }

    let is_open = |port: u16| open.iter().any(|s| s.port == port);
    if is_open(80) && !is_open(443) {
        report.push(FindingKind::HttpWithoutHttps, Severity::Medium, 10, &[]);
    }

    if let Some(first) = open.iter().find(|s| s.alt_web) {
        let ports = open
            .iter()
            .filter(|s| s.alt_web)
            .map(|s| s.port.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        report.push(
            FindingKind::AlternativeWebPort,
            Severity::Low,
            5,
            &[("port", &ports), ("service", first.service)],
        );
    }
}

#[async_trait]
impl SecurityScanner for PortScanner {
    fn name(&self) -> &'static str {
        "ports"
    }

    fn category(&self) -> Category {
        Category::NetworkSecurity
    }

    async fn scan(&self, ctx: &ScanContext) -> ScannerResult<ScannerReport> {
        let target = self.dns.resolve_ip(&ctx.domain).await?;

        info!(domain = %ctx.domain, %target, ports = self.ports.len(), "Starting port scan");

        let results = self.probe_ports(target).await;
        let filtered = results
            .iter()
            .filter(|(_, state)| *state == PortState::Filtered)
            .count();
        let open: Vec<ServicePort> = results
            .into_iter()
            .filter(|(_, state)| *state == PortState::Open)
            .map(|(service, _)| service)
            .collect();

        debug!(domain = %ctx.domain, open = open.len(), filtered, "Port probes finished");

        let mut report = ReportBuilder::new(ctx, Category::NetworkSecurity);
        evaluate_ports(&mut report, &open);

        let report = report.finish();
        info!(
            domain = %ctx.domain,
            open = open.len(),
            findings = report.findings.len(),
            score = report.score,
            "Port scan completed"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::i18n::Language;
    use crate::probes::TxtLookup;
    use std::collections::HashSet;
    use std::net::IpAddr;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedDns;

    #[async_trait]
    impl DnsProbe for FixedDns {
        async fn txt_records(&self, _name: &str) -> TxtLookup {
            TxtLookup::Absent
        }

        async fn resolve_ip(&self, _host: &str) -> ScannerResult<IpAddr> {
            Ok(IpAddr::from([192, 0, 2, 10]))
        }
    }

    /// Open for the listed ports, tracking peak concurrency
    struct FakeTcp {
        open: HashSet<u16>,
        in_flight: AtomicUsize,
        peak: AtomicUsize,
    }

    impl FakeTcp {
        fn open(ports: &[u16]) -> Self {
            Self {
                open: ports.iter().copied().collect(),
                in_flight: AtomicUsize::new(0),
                peak: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl TcpProbe for FakeTcp {
        async fn connect(&self, addr: SocketAddr) -> PortState {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(5)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            if self.open.contains(&addr.port()) {
                PortState::Open
            } else if addr.port() % 2 == 0 {
                PortState::Closed
            } else {
                PortState::Filtered
            }
        }
    }

    async fn scan_with(tcp: Arc<FakeTcp>) -> ScannerReport {
        let settings = PortScanSettings {
            batch_size: 10,
            batch_pause: Duration::from_millis(1),
        };
        let scanner = PortScanner::new(Arc::new(FixedDns), tcp, settings);
        scanner
            .scan(&ScanContext::new("example.com", Language::En))
            .await
            .unwrap()
    }

    fn kinds(report: &ScannerReport) -> Vec<FindingKind> {
        report.findings.iter().map(|f| f.kind).collect()
    }

    #[tokio::test]
    async fn test_telnet_is_one_critical_finding() {
        let report = scan_with(Arc::new(FakeTcp::open(&[23]))).await;

        assert_eq!(kinds(&report), vec![FindingKind::TelnetExposed]);
        assert_eq!(report.findings[0].severity, Severity::Critical);
        assert_eq!(report.score, 60);
    }

    #[tokio::test]
    async fn test_redis_is_one_high_finding() {
        let report = scan_with(Arc::new(FakeTcp::open(&[6379]))).await;

        assert_eq!(kinds(&report), vec![FindingKind::DatabaseExposed]);
        assert_eq!(report.findings[0].severity, Severity::High);
        assert!(report.findings[0].title.contains("Redis"));
    }

    #[tokio::test]
    async fn test_no_open_ports_is_informational() {
        let report = scan_with(Arc::new(FakeTcp::open(&[]))).await;

        assert_eq!(kinds(&report), vec![FindingKind::NoOpenPorts]);
        assert_eq!(report.findings[0].severity, Severity::Low);
        assert_eq!(report.score, 100);
    }

    #[tokio::test]
    async fn test_web_ports() {
        let report = scan_with(Arc::new(FakeTcp::open(&[80, 8080]))).await;
        assert_eq!(
            kinds(&report),
            vec![FindingKind::HttpWithoutHttps, FindingKind::AlternativeWebPort]
        );

        let report = scan_with(Arc::new(FakeTcp::open(&[80, 443]))).await;
        assert!(report.findings.is_empty());
        assert_eq!(report.score, 100);
    }

    #[tokio::test]
    async fn test_large_attack_surface_and_caps() {
        let open = [21, 22, 23, 25, 80, 443, 445, 3306, 5432, 6379, 27017];
        let report = scan_with(Arc::new(FakeTcp::open(&open))).await;

        assert!(kinds(&report).contains(&FindingKind::LargeAttackSurface));
        let criticals = report
            .findings
            .iter()
            .filter(|f| f.severity == Severity::Critical)
            .count();
        assert_eq!(criticals, 2);
        // critical 60 (cap) + high 50 (cap) + medium 15 + 10 + 10
        assert_eq!(report.score, 0);
    }

    #[tokio::test]
    async fn test_probes_are_batched() {
        let tcp = Arc::new(FakeTcp::open(&[]));
        scan_with(Arc::clone(&tcp)).await;

        let peak = tcp.peak.load(Ordering::SeqCst);
        assert!(peak <= 10, "peak concurrency {}", peak);
        assert!(peak > 1);
    }

    #[test]
    fn test_table_has_no_duplicate_ports() {
        let unique: HashSet<u16> = PORT_TABLE.iter().map(|s| s.port).collect();
        assert_eq!(unique.len(), PORT_TABLE.len());
    }
}

// Copyright (c) 2025 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Email Authentication Scanner
 * SPF, DKIM and DMARC posture from public DNS
 *
 * @copyright 2025 Bountyy Oy
 * @license Proprietary
 */

use async_trait::async_trait;
use futures::future::join_all;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

use super::{ReportBuilder, SecurityScanner};
use crate::errors::ScannerResult;
use crate::probes::{DnsProbe, TxtLookup};
use crate::types::{Category, FindingKind, ScanContext, ScannerReport, Severity};

/// Receivers stop evaluating SPF after this many DNS-querying terms
const SPF_LOOKUP_LIMIT: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AllQualifier {
    Fail,
    SoftFail,
    Neutral,
    Pass,
}

/// Parsed `v=spf1` record
#[derive(Debug, Clone)]
pub struct SpfRecord {
    pub record: String,
    pub includes: Vec<String>,
    pub all: Option<AllQualifier>,
    pub redirect: Option<String>,
}

impl SpfRecord {
    /// Pick the SPF record out of a domain's TXT strings
    pub fn find(records: &[String]) -> Option<Self> {
        records
            .iter()
            .map(|r| r.trim())
            .find(|r| {
                let lower = r.to_ascii_lowercase();
                lower == "v=spf1" || lower.starts_with("v=spf1 ")
            })
            .map(Self::parse)
    }

    pub fn parse(record: &str) -> Self {
        let mut includes = Vec::new();
        let mut all = None;
        let mut redirect = None;

        for term in record.split_whitespace().skip(1) {
            let lower = term.to_ascii_lowercase();
            if let Some(target) = lower.strip_prefix("include:") {
                includes.push(target.to_string());
            } else if let Some(target) = lower.strip_prefix("redirect=") {
                redirect = Some(target.to_string());
            } else {
                all = match lower.as_str() {
                    "-all" => Some(AllQualifier::Fail),
                    "~all" => Some(AllQualifier::SoftFail),
                    "?all" => Some(AllQualifier::Neutral),
                    "+all" | "all" => Some(AllQualifier::Pass),
                    _ => all,
                };
            }
        }

        Self {
            record: record.to_string(),
            includes,
            all,
            redirect,
        }
    }
}

/// Parsed `v=DMARC1` record
#[derive(Debug, Clone)]
pub struct DmarcRecord {
    pub record: String,
    pub policy: String,
    pub percentage: u32,
    pub aggregate_reports: Vec<String>,
    pub forensic_reports: Vec<String>,
}

impl DmarcRecord {
    pub fn find(records: &[String]) -> Option<Self> {
        records
            .iter()
            .map(|r| r.trim())
            .find(|r| r.to_ascii_uppercase().starts_with("V=DMARC1"))
            .map(Self::parse)
    }

    pub fn parse(record: &str) -> Self {
        let tags: HashMap<String, String> = record
            .split(';')
            .filter_map(|part| {
                let (key, value) = part.split_once('=')?;
                Some((key.trim().to_ascii_lowercase(), value.trim().to_string()))
            })
            .collect();

        let list = |key: &str| -> Vec<String> {
            tags.get(key)
                .map(|v| {
                    v.split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect()
                })
                .unwrap_or_default()
        };

        Self {
            record: record.to_string(),
            policy: tags
                .get("p")
                .map(|p| p.to_ascii_lowercase())
                .unwrap_or_else(|| "none".to_string()),
            percentage: tags
                .get("pct")
                .and_then(|p| p.parse().ok())
                .unwrap_or(100),
            aggregate_reports: list("rua"),
            forensic_reports: list("ruf"),
        }
    }

    pub fn has_reporting(&self) -> bool {
        !self.aggregate_reports.is_empty() || !self.forensic_reports.is_empty()
    }
}

/// A DKIM key record, by the usual markers
pub fn is_dkim_record(record: &str) -> bool {
    let lower = record.to_ascii_lowercase();
    lower.contains("v=dkim1") || lower.contains("k=rsa") || lower.contains("p=")
}

pub struct EmailAuthScanner {
    dns: Arc<dyn DnsProbe>,
    dkim_selectors: Vec<String>,
}

impl EmailAuthScanner {
    pub fn new(dns: Arc<dyn DnsProbe>, dkim_selectors: Vec<String>) -> Self {
        Self {
            dns,
            dkim_selectors,
        }
    }

    /// First selector publishing a DKIM key, if any
    async fn find_dkim_selector(&self, domain: &str) -> Option<String> {
        let lookups = self.dkim_selectors.iter().map(|selector| {
            let name = format!("{}._domainkey.{}", selector, domain);
            async move { (selector.clone(), self.dns.txt_records(&name).await) }
        });

        join_all(lookups)
            .await
            .into_iter()
            .find(|(_, lookup)| lookup.records().iter().any(|r| is_dkim_record(r)))
            .map(|(selector, _)| selector)
    }
}

fn check_spf(report: &mut ReportBuilder<'_>, domain: &str, lookup: &TxtLookup) {
    let Some(spf) = SpfRecord::find(lookup.records()) else {
        report.push(FindingKind::SpfMissing, Severity::High, 40, &[("domain", domain)]);
        return;
    };

    match (&spf.all, &spf.redirect) {
        (Some(AllQualifier::Pass), _) => {
            report.push(
                FindingKind::SpfPermissive,
                Severity::High,
                40,
                &[("record", &spf.record)],
            );
        }
        (Some(AllQualifier::Fail | AllQualifier::SoftFail), _) | (None, Some(_)) => {}
        (Some(AllQualifier::Neutral) | None, _) => {
            report.push(
                FindingKind::SpfNoAllMechanism,
                Severity::Medium,
                20,
                &[("record", &spf.record)],
            );
        }
    }

    if spf.includes.len() > SPF_LOOKUP_LIMIT {
        let count = spf.includes.len().to_string();
        report.push(
            FindingKind::SpfTooManyLookups,
            Severity::Medium,
            10,
            &[("count", &count)],
        );
    }
}

fn check_dmarc(report: &mut ReportBuilder<'_>, domain: &str, lookup: &TxtLookup) {
    let Some(dmarc) = DmarcRecord::find(lookup.records()) else {
        report.push(FindingKind::DmarcMissing, Severity::High, 30, &[("domain", domain)]);
        return;
    };

    if dmarc.policy == "none" {
        report.push(
            FindingKind::DmarcPolicyNone,
            Severity::Medium,
            15,
            &[("record", &dmarc.record)],
        );
    }

    if !dmarc.has_reporting() {
        report.push(FindingKind::DmarcNoReporting, Severity::Low, 10, &[]);
    }

    if dmarc.percentage < 100 {
        let pct = dmarc.percentage.to_string();
        report.push(FindingKind::DmarcPartialCoverage, Severity::Low, 5, &[("pct", &pct)]);
    }
}

#[async_trait]
impl SecurityScanner for EmailAuthScanner {
    fn name(&self) -> &'static str {
        "email_auth"
    }

    fn category(&self) -> Category {
        Category::EmailSecurity
    }

    async fn scan(&self, ctx: &ScanContext) -> ScannerResult<ScannerReport> {
        let domain = ctx.domain.as_str();
        let dmarc_name = format!("_dmarc.{}", domain);

        let (spf_lookup, dmarc_lookup, dkim_selector) = tokio::join!(
            self.dns.txt_records(domain),
            self.dns.txt_records(&dmarc_name),
            self.find_dkim_selector(domain),
        );

        let mut report = ReportBuilder::new(ctx, Category::EmailSecurity);

        check_spf(&mut report, domain, &spf_lookup);

        match dkim_selector {
            Some(selector) => debug!(domain, selector = %selector, "DKIM key found"),
            None => {
                let selectors = self.dkim_selectors.join(", ");
                report.push(
                    FindingKind::DkimMissing,
                    Severity::Medium,
                    20,
                    &[("selectors", &selectors)],
                );
            }
        }

        check_dmarc(&mut report, domain, &dmarc_lookup);

        let report = report.finish();
        info!(
            domain,
            findings = report.findings.len(),
            score = report.score,
            "Email authentication scan completed"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_dkim_selectors;
    use crate::errors::{NetworkError, ScannerError};
    use crate::i18n::Language;
    use std::net::IpAddr;

    #[derive(Default)]
    struct FakeDns {
        records: HashMap<String, TxtLookup>,
    }

    impl FakeDns {
        fn with(mut self, name: &str, records: &[&str]) -> Self {
            self.records.insert(
                name.to_string(),
                TxtLookup::Found(records.iter().map(|r| r.to_string()).collect()),
            );
            self
        }

        fn timing_out(mut self, name: &str) -> Self {
            self.records.insert(name.to_string(), TxtLookup::TimedOut);
            self
        }
    }

    #[async_trait]
    impl DnsProbe for FakeDns {
        async fn txt_records(&self, name: &str) -> TxtLookup {
            self.records.get(name).cloned().unwrap_or(TxtLookup::Absent)
        }

        async fn resolve_ip(&self, host: &str) -> ScannerResult<IpAddr> {
            Err(ScannerError::Network(NetworkError::DnsResolutionFailed {
                host: host.to_string(),
                reason: "fake".to_string(),
            }))
        }
    }

    async fn scan(dns: FakeDns) -> ScannerReport {
        let scanner = EmailAuthScanner::new(Arc::new(dns), default_dkim_selectors());
        let ctx = ScanContext::new("example.com", Language::En);
        scanner.scan(&ctx).await.unwrap()
    }

    fn kinds(report: &ScannerReport) -> Vec<FindingKind> {
        report.findings.iter().map(|f| f.kind).collect()
    }

    #[test]
    fn test_spf_parsing() {
        let spf = SpfRecord::parse("v=spf1 include:_spf.google.com include:mailgun.org ~all");
        assert_eq!(spf.includes, vec!["_spf.google.com", "mailgun.org"]);
        assert_eq!(spf.all, Some(AllQualifier::SoftFail));

        let spf = SpfRecord::parse("v=spf1 mx +all");
        assert_eq!(spf.all, Some(AllQualifier::Pass));
    }

    #[test]
    fn test_spf_selection_ignores_other_txt() {
        let records = vec![
            "google-site-verification=abc".to_string(),
            "v=spf1 -all".to_string(),
        ];
        assert_eq!(SpfRecord::find(&records).unwrap().record, "v=spf1 -all");
        assert!(SpfRecord::find(&["v=spf10 -all".to_string()]).is_none());
    }

    #[test]
    fn test_dmarc_parsing() {
        let dmarc = DmarcRecord::parse(
            "v=DMARC1; p=quarantine; pct=50; rua=mailto:a@example.com,mailto:b@example.com",
        );
        assert_eq!(dmarc.policy, "quarantine");
        assert_eq!(dmarc.percentage, 50);
        assert_eq!(dmarc.aggregate_reports.len(), 2);
        assert!(dmarc.has_reporting());
    }

    #[tokio::test]
    async fn test_well_configured_domain_has_no_findings() {
        let dns = FakeDns::default()
            .with("example.com", &["v=spf1 include:_spf.google.com -all"])
            .with("google._domainkey.example.com", &["v=DKIM1; k=rsa; p=MIGfMA0"])
            .with("_dmarc.example.com", &["v=DMARC1; p=reject; rua=mailto:d@example.com"]);

        let report = scan(dns).await;
        assert!(report.findings.is_empty());
        assert_eq!(report.score, 100);
    }

    #[tokio::test]
    async fn test_nothing_published() {
        let report = scan(FakeDns::default()).await;

        assert_eq!(
            kinds(&report),
            vec![FindingKind::SpfMissing, FindingKind::DkimMissing, FindingKind::DmarcMissing]
        );
        assert_eq!(report.score, 10);
        assert!(report.findings.iter().all(|f| f.category == Category::EmailSecurity));
    }

    #[tokio::test]
    async fn test_plus_all_is_flagged_as_permissive() {
        let dns = FakeDns::default()
            .with("example.com", &["v=spf1 ip4:192.0.2.0/24 +all"])
            .with("selector1._domainkey.example.com", &["v=DKIM1; p=MIGf"])
            .with("_dmarc.example.com", &["v=DMARC1; p=reject; rua=mailto:d@example.com"]);

        let report = scan(dns).await;
        assert_eq!(kinds(&report), vec![FindingKind::SpfPermissive]);
        assert_eq!(report.findings[0].severity, Severity::High);
    }

    #[tokio::test]
    async fn test_missing_all_and_neutral_all() {
        for record in ["v=spf1 mx", "v=spf1 mx ?all"] {
            let dns = FakeDns::default()
                .with("example.com", &[record])
                .with("k1._domainkey.example.com", &["k=rsa; p=MIGf"])
                .with("_dmarc.example.com", &["v=DMARC1; p=reject; ruf=mailto:f@example.com"]);

            let report = scan(dns).await;
            assert_eq!(kinds(&report), vec![FindingKind::SpfNoAllMechanism]);
            assert_eq!(report.findings[0].severity, Severity::Medium);
        }
    }

    #[tokio::test]
    async fn test_dmarc_none_without_reporting_yields_two_findings() {
        let dns = FakeDns::default()
            .with("example.com", &["v=spf1 -all"])
            .with("default._domainkey.example.com", &["v=DKIM1; p=MIGf"])
            .with("_dmarc.example.com", &["v=DMARC1; p=none"]);

        let report = scan(dns).await;
        assert_eq!(
            kinds(&report),
            vec![FindingKind::DmarcPolicyNone, FindingKind::DmarcNoReporting]
        );
        assert_eq!(report.findings[0].severity, Severity::Medium);
        assert_eq!(report.findings[1].severity, Severity::Low);
        assert_eq!(report.score, 75);
    }

    #[tokio::test]
    async fn test_too_many_includes() {
        let includes: Vec<String> = (0..11)
            .map(|i| format!("include:s{}.example.net", i))
            .collect();
        let record = format!("v=spf1 {} -all", includes.join(" "));
        let dns = FakeDns::default()
            .with("example.com", &[record.as_str()])
            .with("s1._domainkey.example.com", &["v=DKIM1; p=MIGf"])
            .with("_dmarc.example.com", &["v=DMARC1; p=reject; rua=mailto:d@example.com"]);

        let report = scan(dns).await;
        assert_eq!(kinds(&report), vec![FindingKind::SpfTooManyLookups]);
        assert!(report.findings[0].title.contains("lookup"));
    }

    #[tokio::test]
    async fn test_timeouts_are_treated_as_absent() {
        let dns = FakeDns::default()
            .timing_out("example.com")
            .timing_out("_dmarc.example.com");

        let report = scan(dns).await;
        assert!(kinds(&report).contains(&FindingKind::SpfMissing));
        assert!(kinds(&report).contains(&FindingKind::DmarcMissing));
    }

    #[tokio::test]
    async fn test_spanish_text() {
        let scanner = EmailAuthScanner::new(Arc::new(FakeDns::default()), default_dkim_selectors());
        let ctx = ScanContext::new("example.com", Language::Es);
        let report = scanner.scan(&ctx).await.unwrap();

        assert_eq!(report.findings[0].title, "Registro SPF ausente");
        assert_eq!(report.findings[0].kind, FindingKind::SpfMissing);
    }
}

// Copyright (c) 2025 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Certificate Scanner
 * Inspects the certificate served on 443 and how plain HTTP is handled
 *
 * @copyright 2025 Bountyy Oy
 * @license Proprietary
 */

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, info};

use super::{ReportBuilder, SecurityScanner};
use crate::errors::{NetworkError, ScannerError, ScannerResult};
use crate::probes::{HttpProbe, PlaintextProbe, TlsInspection, TlsProbe};
use crate::types::{Category, FindingKind, ScanContext, ScannerReport, Severity};

const HTTPS_PORT: u16 = 443;

const MIN_RSA_BITS: usize = 2048;

const WEAK_PROTOCOLS: &[&str] = &["SSLV2", "SSLV3", "TLSV1_0", "TLSV1.0", "TLSV1"];

const WEAK_CIPHER_MARKERS: &[&str] = &["RC4", "DES"];

const LEGACY_PROTOCOL: &str = "a protocol older than TLS 1.2";

pub struct CertificateScanner {
    tls: Arc<dyn TlsProbe>,
    http: Arc<dyn HttpProbe>,
}

impl CertificateScanner {
    pub fn new(tls: Arc<dyn TlsProbe>, http: Arc<dyn HttpProbe>) -> Self {
        Self { tls, http }
    }
}

/// `*.example.com` covers `www.example.com` but neither `example.com`
/// nor `a.b.example.com`.
pub fn hostname_matches(domain: &str, pattern: &str) -> bool {
    let domain = domain.trim_end_matches('.').to_ascii_lowercase();
    let pattern = pattern.trim_end_matches('.').to_ascii_lowercase();

    if domain == pattern {
        return true;
    }

    match pattern.strip_prefix("*.") {
        Some(suffix) => domain
            .strip_suffix(suffix)
            .and_then(|rest| rest.strip_suffix('.'))
            .map(|label| !label.is_empty() && !label.contains('.'))
            .unwrap_or(false),
        None => false,
    }
}

pub fn is_weak_tls(protocol: &str, cipher: &str) -> bool {
    let protocol = protocol.to_ascii_uppercase();
    let cipher = cipher.to_ascii_uppercase();

    WEAK_PROTOCOLS.contains(&protocol.as_str())
        || WEAK_CIPHER_MARKERS.iter().any(|marker| cipher.contains(marker))
}

/// Certificate checks over an inspection result, evaluated at `now`
pub(crate) fn evaluate_certificate(
    report: &mut ReportBuilder<'_>,
    domain: &str,
    inspection: &TlsInspection,
    now: DateTime<Utc>,
) {
    let cert = &inspection.certificate;

    if now > cert.not_after {
        let days = (now - cert.not_after).num_days().to_string();
        let date = cert.not_after.format("%Y-%m-%d").to_string();
        report.push(
            FindingKind::CertificateExpired,
            Severity::Critical,
            60,
            &[("date", &date), ("days", &days)],
        );
    } else if now < cert.not_before {
        let date = cert.not_before.format("%Y-%m-%d").to_string();
        report.push(
            FindingKind::CertificateNotYetValid,
            Severity::High,
            30,
            &[("date", &date)],
        );
    } else {
        let days_left = (cert.not_after - now).num_days();
        let days = days_left.to_string();
        let date = cert.not_after.format("%Y-%m-%d").to_string();
        if days_left <= 7 {
            report.push(
                FindingKind::CertificateExpiringSoon,
                Severity::High,
                30,
                &[("days", &days), ("date", &date)],
            );
        } else if days_left <= 30 {
            report.push(
                FindingKind::CertificateExpiring,
                Severity::Medium,
                10,
                &[("days", &days), ("date", &date)],
            );
        }
    }

    let names: Vec<&str> = if cert.san_dns_names.is_empty() {
        cert.common_name.iter().map(String::as_str).collect()
    } else {
        cert.san_dns_names.iter().map(String::as_str).collect()
    };
    if !names.iter().any(|name| hostname_matches(domain, name)) {
        let listed = if names.is_empty() {
            "(no names)".to_string()
        } else {
            names.join(", ")
        };
        report.push(
            FindingKind::CertificateHostnameMismatch,
            Severity::High,
            40,
            &[("domain", domain), ("names", &listed)],
        );
    }

    if is_weak_tls(&inspection.protocol, &inspection.cipher) {
        report.push(
            FindingKind::WeakTlsConfiguration,
            Severity::High,
            25,
            &[("protocol", &inspection.protocol), ("cipher", &inspection.cipher)],
        );
    }

    if cert.self_signed {
        report.push(
            FindingKind::CertificateSelfSigned,
            Severity::High,
            30,
            &[("issuer", &cert.issuer)],
        );
    }

    let mut weaknesses = Vec::new();
    if let Some(bits) = cert.rsa_key_bits.filter(|bits| *bits < MIN_RSA_BITS) {
        weaknesses.push(format!("{}-bit RSA key", bits));
    }
    if let Some(algorithm) = &cert.weak_signature {
        weaknesses.push(format!("{} signature", algorithm));
    }
    if !weaknesses.is_empty() {
        let detail = weaknesses.join(", ");
        report.push(
            FindingKind::CertificateWeakKey,
            Severity::High,
            25,
            &[("detail", &detail)],
        );
    }
}

pub(crate) fn evaluate_plaintext(
    report: &mut ReportBuilder<'_>,
    domain: &str,
    probe: &PlaintextProbe,
) {
    match probe {
        PlaintextProbe::Refused | PlaintextProbe::TimedOut => {
            debug!(domain, "Port 80 not serving, HTTPS only");
        }
        PlaintextProbe::Response {
            status: 200,
            body_len,
            ..
        } if *body_len > 0 => {
            report.push(
                FindingKind::PlaintextHttpServed,
                Severity::High,
                25,
                &[("domain", domain)],
            );
        }
        PlaintextProbe::Response {
            status: 301 | 302 | 307 | 308,
            location,
            ..
        } => {
            let target = location.as_deref().unwrap_or("");
            if !target.to_ascii_lowercase().starts_with("https://") {
                let shown = if target.is_empty() { "(none)" } else { target };
                report.push(
                    FindingKind::InsecureRedirect,
                    Severity::Medium,
                    15,
                    &[("location", shown)],
                );
            }
        }
        PlaintextProbe::Response { .. } => {}
    }
}

#[async_trait]
impl SecurityScanner for CertificateScanner {
    fn name(&self) -> &'static str {
        "certificate"
    }

    fn category(&self) -> Category {
        Category::Certificate
    }

    async fn scan(&self, ctx: &ScanContext) -> ScannerResult<ScannerReport> {
        let domain = ctx.domain.as_str();

        let (inspection, plaintext) = tokio::join!(
            self.tls.inspect(domain, HTTPS_PORT),
            self.http.fetch_plaintext(domain),
        );

        let mut report = ReportBuilder::new(ctx, Category::Certificate);

        match inspection {
            Ok(inspection) => {
                debug!(
                    domain,
                    protocol = %inspection.protocol,
                    cipher = %inspection.cipher,
                    not_after = %inspection.certificate.not_after,
                    "TLS handshake completed"
                );
                evaluate_certificate(&mut report, domain, &inspection, Utc::now());
            }
            Err(ScannerError::Network(NetworkError::LegacyTlsOnly { reason, .. })) => {
                debug!(domain, %reason, "Server rejected TLS 1.2 and 1.3");
                report.push(
                    FindingKind::WeakTlsConfiguration,
                    Severity::High,
                    25,
                    &[("protocol", LEGACY_PROTOCOL), ("cipher", "unknown")],
                );
            }
            Err(e) => {
                let reason = e.to_string();
                report.push(
                    FindingKind::HttpsUnavailable,
                    Severity::High,
                    50,
                    &[("domain", domain), ("reason", &reason)],
                );
            }
        }

        evaluate_plaintext(&mut report, domain, &plaintext);

        let report = report.finish();
        info!(
            domain,
            findings = report.findings.len(),
            score = report.score,
            "Certificate scan completed"
        );
        Ok(report)
    }
}

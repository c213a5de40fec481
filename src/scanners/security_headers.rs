// Copyright (c) 2025 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Security Headers Scanner
 * Evaluates HTTP response headers of the site root
 *
 * @copyright 2025 Bountyy Oy
 * @license Proprietary
 */

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;
use tracing::info;

use super::{ReportBuilder, SecurityScanner};
use crate::errors::ScannerResult;
use crate::probes::{HttpProbe, HttpResponse};
use crate::types::{Category, FindingKind, ScanContext, ScannerReport, Severity};

/// One year, the minimum max-age browsers' preload lists accept
const HSTS_MIN_MAX_AGE: u64 = 31_536_000;

/// `nginx/1.18.0`, `Apache/2.4.41 (Ubuntu)`, `Microsoft-IIS/10.0`
static SERVER_VERSION: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"[A-Za-z][A-Za-z0-9_.-]*/\d").ok());

pub struct SecurityHeadersScanner {
    http: Arc<dyn HttpProbe>,
}

impl SecurityHeadersScanner {
    pub fn new(http: Arc<dyn HttpProbe>) -> Self {
        Self { http }
    }
}

/// `max-age` from an HSTS value, `None` when absent or unparsable
pub fn parse_hsts_max_age(value: &str) -> Option<u64> {
    value.split(';').find_map(|directive| {
        let (name, age) = directive.trim().split_once('=')?;
        if name.trim().eq_ignore_ascii_case("max-age") {
            age.trim().trim_matches('"').parse().ok()
        } else {
            None
        }
    })
}

/// Unsafe script sources a CSP allows
pub fn unsafe_csp_sources(csp: &str) -> Vec<&'static str> {
    let lower = csp.to_ascii_lowercase();
    let mut unsafe_sources = Vec::new();

    if lower.contains("unsafe-eval") {
        unsafe_sources.push("'unsafe-eval'");
    }

    let has_nonce_or_hash = ["'nonce-", "'sha256-", "'sha384-", "'sha512-"]
        .iter()
        .any(|marker| lower.contains(marker));
    if lower.contains("unsafe-inline") && !has_nonce_or_hash {
        unsafe_sources.push("'unsafe-inline'");
    }

    unsafe_sources
}

fn check_hsts(report: &mut ReportBuilder<'_>, response: &HttpResponse) {
    match response.header("strict-transport-security") {
        None => report.push(FindingKind::HstsMissing, Severity::Medium, 20, &[]),
        Some(value) => {
            let weak = parse_hsts_max_age(value)
                .map(|age| age < HSTS_MIN_MAX_AGE)
                .unwrap_or(true);
            if weak {
                report.push(FindingKind::HstsWeak, Severity::Low, 10, &[("value", value)]);
            }
        }
    }
}

fn check_csp(report: &mut ReportBuilder<'_>, response: &HttpResponse) {
    match response.header("content-security-policy") {
        None => report.push(FindingKind::CspMissing, Severity::High, 25, &[]),
        Some(value) => {
            let unsafe_sources = unsafe_csp_sources(value);
            if !unsafe_sources.is_empty() {
                let directives = unsafe_sources.join(" and ");
                report.push(
                    FindingKind::CspUnsafe,
                    Severity::Medium,
                    10,
                    &[("directives", &directives)],
                );
            }
        }
    }
}

fn check_x_content_type_options(report: &mut ReportBuilder<'_>, response: &HttpResponse) {
    let nosniff = response
        .header("x-content-type-options")
        .map(|v| v.trim().eq_ignore_ascii_case("nosniff"))
        .unwrap_or(false);
    if !nosniff {
        report.push(FindingKind::ContentTypeOptionsMissing, Severity::Low, 10, &[]);
    }
}

fn check_x_xss_protection(report: &mut ReportBuilder<'_>, response: &HttpResponse) {
    match response.header("x-xss-protection") {
        None => report.push(FindingKind::XssProtectionMissing, Severity::Low, 5, &[]),
        Some(value) if value.trim().starts_with('0') => {
            report.push(FindingKind::XssProtectionDisabled, Severity::Low, 5, &[])
        }
        Some(_) => {}
    }
}

fn check_disclosure(report: &mut ReportBuilder<'_>, response: &HttpResponse) {
    if let Some(server) = response.header("server") {
        if SERVER_VERSION.as_ref().is_some_and(|re| re.is_match(server)) {
            report.push(
                FindingKind::ServerVersionDisclosed,
                Severity::Low,
                5,
                &[("value", server)],
            );
        }
    }

    if let Some(powered_by) = response.header("x-powered-by").filter(|v| !v.trim().is_empty()) {
        report.push(
            FindingKind::PoweredByDisclosed,
            Severity::Low,
            5,
            &[("value", powered_by)],
        );
    }
}

/// All header checks against one response
pub(crate) fn evaluate_headers(report: &mut ReportBuilder<'_>, response: &HttpResponse) {
    check_hsts(report, response);
    check_csp(report, response);

    if response.header("x-frame-options").is_none() {
        report.push(FindingKind::FrameOptionsMissing, Severity::Medium, 15, &[]);
    }

    check_x_content_type_options(report, response);
    check_x_xss_protection(report, response);

    if response.header("referrer-policy").is_none() {
        report.push(FindingKind::ReferrerPolicyMissing, Severity::Low, 5, &[]);
    }

    if response.header("permissions-policy").is_none()
        && response.header("feature-policy").is_none()
    {
        report.push(FindingKind::PermissionsPolicyMissing, Severity::Low, 5, &[]);
    }

    check_disclosure(report, response);
}

#[async_trait]
impl SecurityScanner for SecurityHeadersScanner {
    fn name(&self) -> &'static str {
        "security_headers"
    }

    fn category(&self) -> Category {
        Category::WebSecurity
    }

    async fn scan(&self, ctx: &ScanContext) -> ScannerResult<ScannerReport> {
        let response = self.http.fetch_headers(&ctx.domain).await?;

        let mut report = ReportBuilder::new(ctx, Category::WebSecurity);
        evaluate_headers(&mut report, &response);

        let report = report.finish();
        info!(
            domain = %ctx.domain,
            url = %response.url,
            status = response.status_code,
            findings = report.findings.len(),
            score = report.score,
            "Security headers scan completed"
        );
        Ok(report)
    }
}

// Copyright (c) 2025 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Security scanners. Each one owns a single category, turns probe results
//! into findings, and never talks to the store or the queue.

pub mod certificate;
pub mod email_auth;
pub mod ports;
pub mod security_headers;

use async_trait::async_trait;

use crate::errors::ScannerResult;
use crate::i18n::localize;
use crate::types::{Category, Finding, FindingKind, ScanContext, ScannerReport, Severity};

pub use certificate::CertificateScanner;
pub use email_auth::EmailAuthScanner;
pub use ports::PortScanner;
pub use security_headers::SecurityHeadersScanner;

#[async_trait]
pub trait SecurityScanner: Send + Sync {
    /// Stable identifier used in logs and summaries
    fn name(&self) -> &'static str;

    fn category(&self) -> Category;

    async fn scan(&self, ctx: &ScanContext) -> ScannerResult<ScannerReport>;
}

/// Findings plus the running penalty for a scanner's sub-score
pub(crate) struct ReportBuilder<'a> {
    ctx: &'a ScanContext,
    category: Category,
    findings: Vec<Finding>,
    penalty: u32,
}

impl<'a> ReportBuilder<'a> {
    pub(crate) fn new(ctx: &'a ScanContext, category: Category) -> Self {
        Self {
            ctx,
            category,
            findings: Vec::new(),
            penalty: 0,
        }
    }

    pub(crate) fn push(
        &mut self,
        kind: FindingKind,
        severity: Severity,
        penalty: u32,
        params: &[(&str, &str)],
    ) {
        let text = localize(self.ctx.language, kind, params);
        self.findings
            .push(Finding::new(kind, self.category, severity, text));
        self.penalty += penalty;
    }

    pub(crate) fn penalize(&mut self, penalty: u32) {
        self.penalty += penalty;
    }

    pub(crate) fn finish(self) -> ScannerReport {
        ScannerReport::new(self.category, self.findings, self.penalty)
    }
}

// Copyright (c) 2025 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::i18n::{Language, LocalizedText};

/// Namespace for deterministic finding ids (UUID v5)
const FINDING_NAMESPACE: Uuid = Uuid::from_u128(0x6f1c_2a4e_93d7_4b0a_8c55_d1e2_7a90_3b64);

/// Finding category, one per scanner
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Category {
    EmailSecurity,
    Certificate,
    WebSecurity,
    NetworkSecurity,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::EmailSecurity => "EMAIL_SECURITY",
            Category::Certificate => "CERTIFICATE",
            Category::WebSecurity => "WEB_SECURITY",
            Category::NetworkSecurity => "NETWORK_SECURITY",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "EMAIL_SECURITY" => Some(Category::EmailSecurity),
            "CERTIFICATE" => Some(Category::Certificate),
            "WEB_SECURITY" => Some(Category::WebSecurity),
            "NETWORK_SECURITY" => Some(Category::NetworkSecurity),
            _ => None,
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "CRITICAL",
            Severity::High => "HIGH",
            Severity::Medium => "MEDIUM",
            Severity::Low => "LOW",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "CRITICAL" => Some(Severity::Critical),
            "HIGH" => Some(Severity::High),
            "MEDIUM" => Some(Severity::Medium),
            "LOW" => Some(Severity::Low),
            _ => None,
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle of a finding. The engine only ever creates `Open` findings;
/// the other states are set by whoever triages them.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FindingStatus {
    #[default]
    Open,
    Resolved,
    Ignored,
}

impl FindingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FindingStatus::Open => "OPEN",
            FindingStatus::Resolved => "RESOLVED",
            FindingStatus::Ignored => "IGNORED",
        }
    }
}

/// Machine-readable identity of a finding, independent of language
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum FindingKind {
    // Email authentication
    SpfMissing,
    SpfPermissive,
    SpfNoAllMechanism,
    SpfTooManyLookups,
    DkimMissing,
    DmarcMissing,
    DmarcPolicyNone,
    DmarcNoReporting,
    DmarcPartialCoverage,

    // Certificate
    HttpsUnavailable,
    CertificateExpired,
    CertificateNotYetValid,
    CertificateExpiringSoon,
    CertificateExpiring,
    CertificateHostnameMismatch,
    CertificateSelfSigned,
    CertificateWeakKey,
    WeakTlsConfiguration,
    PlaintextHttpServed,
    InsecureRedirect,

    // HTTP headers
    HstsMissing,
    HstsWeak,
    CspMissing,
    CspUnsafe,
    FrameOptionsMissing,
    ContentTypeOptionsMissing,
    XssProtectionMissing,
    XssProtectionDisabled,
    ReferrerPolicyMissing,
    PermissionsPolicyMissing,
    ServerVersionDisclosed,
    PoweredByDisclosed,

    // Ports
    TelnetExposed,
    FileShareExposed,
    DatabaseExposed,
    RemoteDesktopExposed,
    FtpExposed,
    SshExposed,
    MailServiceExposed,
    DnsServiceExposed,
    NoOpenPorts,
    LargeAttackSurface,
    HttpWithoutHttps,
    AlternativeWebPort,

    // Engine
    ScannerFailed,
}

impl FindingKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FindingKind::SpfMissing => "spf_missing",
            FindingKind::SpfPermissive => "spf_permissive",
            FindingKind::SpfNoAllMechanism => "spf_no_all_mechanism",
            FindingKind::SpfTooManyLookups => "spf_too_many_lookups",
            FindingKind::DkimMissing => "dkim_missing",
            FindingKind::DmarcMissing => "dmarc_missing",
            FindingKind::DmarcPolicyNone => "dmarc_policy_none",
            FindingKind::DmarcNoReporting => "dmarc_no_reporting",
            FindingKind::DmarcPartialCoverage => "dmarc_partial_coverage",
            FindingKind::HttpsUnavailable => "https_unavailable",
            FindingKind::CertificateExpired => "certificate_expired",
            FindingKind::CertificateNotYetValid => "certificate_not_yet_valid",
            FindingKind::CertificateExpiringSoon => "certificate_expiring_soon",
            FindingKind::CertificateExpiring => "certificate_expiring",
            FindingKind::CertificateHostnameMismatch => "certificate_hostname_mismatch",
            FindingKind::CertificateSelfSigned => "certificate_self_signed",
            FindingKind::CertificateWeakKey => "certificate_weak_key",
            FindingKind::WeakTlsConfiguration => "weak_tls_configuration",
            FindingKind::PlaintextHttpServed => "plaintext_http_served",
            FindingKind::InsecureRedirect => "insecure_redirect",
            FindingKind::HstsMissing => "hsts_missing",
            FindingKind::HstsWeak => "hsts_weak",
            FindingKind::CspMissing => "csp_missing",
            FindingKind::CspUnsafe => "csp_unsafe",
            FindingKind::FrameOptionsMissing => "frame_options_missing",
            FindingKind::ContentTypeOptionsMissing => "content_type_options_missing",
            FindingKind::XssProtectionMissing => "xss_protection_missing",
            FindingKind::XssProtectionDisabled => "xss_protection_disabled",
            FindingKind::ReferrerPolicyMissing => "referrer_policy_missing",
            FindingKind::PermissionsPolicyMissing => "permissions_policy_missing",
            FindingKind::ServerVersionDisclosed => "server_version_disclosed",
            FindingKind::PoweredByDisclosed => "powered_by_disclosed",
            FindingKind::TelnetExposed => "telnet_exposed",
            FindingKind::FileShareExposed => "file_share_exposed",
            FindingKind::DatabaseExposed => "database_exposed",
            FindingKind::RemoteDesktopExposed => "remote_desktop_exposed",
            FindingKind::FtpExposed => "ftp_exposed",
            FindingKind::SshExposed => "ssh_exposed",
            FindingKind::MailServiceExposed => "mail_service_exposed",
            FindingKind::DnsServiceExposed => "dns_service_exposed",
            FindingKind::NoOpenPorts => "no_open_ports",
            FindingKind::LargeAttackSurface => "large_attack_surface",
            FindingKind::HttpWithoutHttps => "http_without_https",
            FindingKind::AlternativeWebPort => "alternative_web_port",
            FindingKind::ScannerFailed => "scanner_failed",
        }
    }
}

/// A single normalized security observation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Finding {
    pub id: Uuid,
    pub kind: FindingKind,
    pub category: Category,
    pub severity: Severity,
    pub title: String,
    pub description: String,
    pub recommendation: String,
    pub status: FindingStatus,
    pub created_at: DateTime<Utc>,
}

impl Finding {
    /// Build a finding from localized text. The id is provisional until
    /// [`Finding::bind_to_scan`] derives the deterministic one.
    pub fn new(
        kind: FindingKind,
        category: Category,
        severity: Severity,
        text: LocalizedText,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            category,
            severity,
            title: text.title,
            description: text.description,
            recommendation: text.recommendation,
            status: FindingStatus::Open,
            created_at: Utc::now(),
        }
    }

    /// Derive a stable id from the owning scan so that a retried attempt
    /// reproduces the same ids and the store can drop duplicates.
    pub fn bind_to_scan(mut self, scan_id: &str) -> Self {
        let name = format!("{}|{}|{}|{}", scan_id, self.category, self.kind.as_str(), self.title);
        self.id = Uuid::new_v5(&FINDING_NAMESPACE, name.as_bytes());
        self
    }
}

/// Correlation ids carried from the submitting layer, opaque to the engine
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CorrelationIds {
    #[serde(default)]
    pub asset_id: Option<String>,
    #[serde(default)]
    pub company_id: Option<String>,
    #[serde(default)]
    pub requester_id: Option<String>,
}

/// Immutable request to scan one domain. `scan_id` is the idempotency key.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ScanRequest {
    pub scan_id: String,
    pub domain: String,
    #[serde(default)]
    pub correlation_ids: CorrelationIds,
    #[serde(default)]
    pub language: Option<Language>,
}

impl ScanRequest {
    pub fn new(scan_id: impl Into<String>, domain: impl Into<String>) -> Self {
        Self {
            scan_id: scan_id.into(),
            domain: domain.into(),
            correlation_ids: CorrelationIds::default(),
            language: None,
        }
    }

    pub fn with_correlation_ids(mut self, correlation_ids: CorrelationIds) -> Self {
        self.correlation_ids = correlation_ids;
        self
    }

    pub fn with_language(mut self, language: Language) -> Self {
        self.language = Some(language);
        self
    }
}

/// What every scanner receives: the normalized domain and the language
/// findings must be written in.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanContext {
    pub domain: String,
    pub language: Language,
}

impl ScanContext {
    pub fn new(domain: impl Into<String>, language: Language) -> Self {
        Self {
            domain: domain.into(),
            language,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScanStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl ScanStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScanStatus::Pending => "PENDING",
            ScanStatus::Running => "RUNNING",
            ScanStatus::Completed => "COMPLETED",
            ScanStatus::Failed => "FAILED",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "PENDING" => Some(ScanStatus::Pending),
            "RUNNING" => Some(ScanStatus::Running),
            "COMPLETED" => Some(ScanStatus::Completed),
            "FAILED" => Some(ScanStatus::Failed),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ScanStatus::Completed | ScanStatus::Failed)
    }

    /// Allowed transitions: Pending -> Running -> {Completed, Failed}.
    /// Running -> Running is allowed so a retried attempt can re-enter.
    pub fn can_transition_to(&self, next: ScanStatus) -> bool {
        match (self, next) {
            (ScanStatus::Pending, ScanStatus::Running) => true,
            (ScanStatus::Pending, ScanStatus::Failed) => true,
            (ScanStatus::Running, ScanStatus::Running) => true,
            (ScanStatus::Running, ScanStatus::Completed) => true,
            (ScanStatus::Running, ScanStatus::Failed) => true,
            _ => false,
        }
    }
}

impl std::fmt::Display for ScanStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Mutable lifecycle record of one scan, keyed by scan id
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ScanExecution {
    pub scan_id: String,
    pub domain: String,
    pub correlation_ids: CorrelationIds,
    pub status: ScanStatus,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub health_score: Option<u8>,
}

impl ScanExecution {
    pub fn pending(request: &ScanRequest) -> Self {
        Self {
            scan_id: request.scan_id.clone(),
            domain: request.domain.clone(),
            correlation_ids: request.correlation_ids.clone(),
            status: ScanStatus::Pending,
            started_at: None,
            completed_at: None,
            health_score: None,
        }
    }
}

/// Output of one scanner run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScannerReport {
    pub category: Category,
    pub findings: Vec<Finding>,
    /// Informational 0-100 sub-score; the health score is recomputed from findings
    pub score: u8,
}

impl ScannerReport {
    pub fn new(category: Category, findings: Vec<Finding>, penalty: u32) -> Self {
        Self {
            category,
            findings,
            score: 100u32.saturating_sub(penalty) as u8,
        }
    }
}

/// Per-scanner summary in an aggregate result
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScannerSummary {
    pub scanner: String,
    pub category: Category,
    pub score: Option<u8>,
    pub findings: usize,
    pub error: Option<String>,
    pub duration_ms: u64,
}

/// Aggregate result of the full scanner battery against one domain
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanOutcome {
    pub domain: String,
    pub health_score: u8,
    pub findings: Vec<Finding>,
    pub scanners: Vec<ScannerSummary>,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub duration_ms: u64,
}

impl ScanOutcome {
    pub fn failed_scanners(&self) -> impl Iterator<Item = &ScannerSummary> {
        self.scanners.iter().filter(|s| s.error.is_some())
    }
}

// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Posture Scanner Library
 * External security posture scanning: email authentication, certificates,
 * HTTP security headers and exposed ports
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

pub mod config;
pub mod dns_cache;
pub mod i18n;
pub mod logging;
pub mod queue;
pub mod types;

// Network probes and the scanners built on them
pub mod probes;
pub mod scanners;

// Production error handling and resilience modules
pub mod errors;
pub mod retry;
pub mod metrics;

// Scoring and orchestration
pub mod health_score;
pub mod engine;

// Persistence and background processing
pub mod store;
pub mod worker;

pub use engine::{execute_scan, ScanOrchestrator};
pub use errors::{ScannerError, ScannerResult};
pub use health_score::{calculate_health_score, ScoringModel};
pub use types::{Finding, ScanOutcome, ScanRequest, ScanStatus, Severity};

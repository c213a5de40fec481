// Copyright (c) 2025 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Health Score
 * Severity-weighted 0-100 score over the merged findings of one scan
 *
 * @copyright 2025 Bountyy Oy
 * @license Proprietary
 */
use serde::{Deserialize, Serialize};

use crate::types::{Finding, Severity};

/// Scoring formula. `TierCapped` is authoritative; `Simple` is kept to
/// compare against historical scores.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ScoringModel {
    /// Per-severity weights with a cap per tier and a floor of 15
    #[default]
    TierCapped,
    /// Flat per-finding deductions, floored at 0
    Simple,
}

/// Penalty per finding and the most one tier may contribute
struct TierWeight {
    per_finding: f64,
    cap: f64,
}

const TIER_CAPPED_FLOOR: f64 = 15.0;

fn tier_weight(severity: Severity) -> TierWeight {
    match severity {
        Severity::Critical => TierWeight { per_finding: 12.0, cap: 40.0 },
        Severity::High => TierWeight { per_finding: 8.0, cap: 30.0 },
        Severity::Medium => TierWeight { per_finding: 4.0, cap: 20.0 },
        Severity::Low => TierWeight { per_finding: 1.5, cap: 10.0 },
    }
}

fn simple_weight(severity: Severity) -> u32 {
    match severity {
        Severity::Critical => 25,
        Severity::High => 15,
        Severity::Medium => 8,
        Severity::Low => 3,
    }
}

/// Finding counts per severity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeverityCounts {
    pub critical: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

impl SeverityCounts {
    pub fn from_findings(findings: &[Finding]) -> Self {
        let mut counts = Self::default();
        for finding in findings {
            match finding.severity {
                Severity::Critical => counts.critical += 1,
                Severity::High => counts.high += 1,
                Severity::Medium => counts.medium += 1,
                Severity::Low => counts.low += 1,
            }
        }
        counts
    }

    pub fn get(&self, severity: Severity) -> usize {
        match severity {
            Severity::Critical => self.critical,
            Severity::High => self.high,
            Severity::Medium => self.medium,
            Severity::Low => self.low,
        }
    }

    pub fn total(&self) -> usize {
        self.critical + self.high + self.medium + self.low
    }
}

const SEVERITIES: [Severity; 4] = [
    Severity::Critical,
    Severity::High,
    Severity::Medium,
    Severity::Low,
];

impl ScoringModel {
    /// Score from counts. No findings always scores 100.
    pub fn score_counts(&self, counts: &SeverityCounts) -> u8 {
        if counts.total() == 0 {
            return 100;
        }

        match self {
            ScoringModel::TierCapped => {
                let penalty: f64 = SEVERITIES
                    .iter()
                    .map(|&severity| {
                        let weight = tier_weight(severity);
                        (counts.get(severity) as f64 * weight.per_finding).min(weight.cap)
                    })
                    .sum();
                (100.0 - penalty).max(TIER_CAPPED_FLOOR).round() as u8
            }
            ScoringModel::Simple => {
                let penalty: usize = SEVERITIES
                    .iter()
                    .map(|&severity| counts.get(severity) * simple_weight(severity) as usize)
                    .sum();
                100usize.saturating_sub(penalty) as u8
            }
        }
    }

    pub fn score(&self, findings: &[Finding]) -> u8 {
        self.score_counts(&SeverityCounts::from_findings(findings))
    }
}

/// Authoritative health score for a merged finding list
pub fn calculate_health_score(findings: &[Finding]) -> u8 {
    ScoringModel::TierCapped.score(findings)
}

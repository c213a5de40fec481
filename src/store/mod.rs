// Copyright (c) 2025 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Findings store: where scan executions and their findings are persisted.
//! The engine only needs the contract below; `MemoryStore` backs tests and
//! the CLI, `PostgresStore` backs the worker.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::Utc;

use crate::errors::{ScannerResult, StoreError};
use crate::types::{Finding, ScanExecution, ScanRequest, ScanStatus};

pub use memory::MemoryStore;
pub use postgres::PostgresStore;

#[async_trait]
pub trait FindingsStore: Send + Sync {
    /// Insert a Pending execution unless one already exists for the scan id.
    /// Returns whatever is stored after the call.
    async fn create_execution(&self, request: &ScanRequest) -> ScannerResult<ScanExecution>;

    /// Move an execution to `status`, recording the health score when given.
    /// Transitions the lifecycle does not allow are rejected.
    async fn upsert_scan_status(
        &self,
        scan_id: &str,
        status: ScanStatus,
        health_score: Option<u8>,
    ) -> ScannerResult<ScanExecution>;

    /// Append findings; ids already stored are skipped. Returns how many were new.
    async fn append_findings(&self, scan_id: &str, findings: &[Finding]) -> ScannerResult<usize>;

    /// Drop every finding of an execution. Used when a job ends Failed after
    /// an attempt had already appended findings.
    async fn discard_findings(&self, scan_id: &str) -> ScannerResult<usize>;

    async fn execution(&self, scan_id: &str) -> ScannerResult<Option<ScanExecution>>;

    async fn findings(&self, scan_id: &str) -> ScannerResult<Vec<Finding>>;
}

/// Apply a status change to an execution record in place
pub(crate) fn apply_transition(
    execution: &mut ScanExecution,
    status: ScanStatus,
    health_score: Option<u8>,
) -> Result<(), StoreError> {
    if !execution.status.can_transition_to(status) {
        return Err(StoreError::InvalidTransition {
            scan_id: execution.scan_id.clone(),
            from: execution.status.to_string(),
            to: status.to_string(),
        });
    }

    let now = Utc::now();
    if status == ScanStatus::Running && execution.started_at.is_none() {
        execution.started_at = Some(now);
    }
    if status.is_terminal() {
        execution.completed_at = Some(now);
    }
    if health_score.is_some() {
        execution.health_score = health_score;
    }
    execution.status = status;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transition_timestamps() {
        let mut execution = ScanExecution::pending(&ScanRequest::new("s-1", "example.com"));

        apply_transition(&mut execution, ScanStatus::Running, None).unwrap();
        let started = execution.started_at;
        assert!(started.is_some());

        apply_transition(&mut execution, ScanStatus::Running, None).unwrap();
        assert_eq!(execution.started_at, started);

        apply_transition(&mut execution, ScanStatus::Completed, Some(82)).unwrap();
        assert!(execution.completed_at.is_some());
        assert_eq!(execution.health_score, Some(82));
    }

    #[test]
    fn test_terminal_states_are_final() {
        let mut execution = ScanExecution::pending(&ScanRequest::new("s-1", "example.com"));
        apply_transition(&mut execution, ScanStatus::Running, None).unwrap();
        apply_transition(&mut execution, ScanStatus::Failed, None).unwrap();

        let err = apply_transition(&mut execution, ScanStatus::Completed, Some(90)).unwrap_err();
        assert!(matches!(err, StoreError::InvalidTransition { .. }));
        assert_eq!(execution.status, ScanStatus::Failed);
        assert_eq!(execution.health_score, None);
    }
}

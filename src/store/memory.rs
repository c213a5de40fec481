// Copyright (c) 2025 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

use super::{apply_transition, FindingsStore};
use crate::errors::{ScannerResult, StoreError};
use crate::types::{Finding, ScanExecution, ScanRequest, ScanStatus};

#[derive(Debug)]
struct Entry {
    execution: ScanExecution,
    findings: Vec<Finding>,
    finding_ids: HashSet<Uuid>,
}

/// In-process store
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, Entry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

#[async_trait]
impl FindingsStore for MemoryStore {
    async fn create_execution(&self, request: &ScanRequest) -> ScannerResult<ScanExecution> {
        let mut entries = self.entries.write();
        let entry = entries.entry(request.scan_id.clone()).or_insert_with(|| Entry {
            execution: ScanExecution::pending(request),
            findings: Vec::new(),
            finding_ids: HashSet::new(),
        });
        Ok(entry.execution.clone())
    }

    async fn upsert_scan_status(
        &self,
        scan_id: &str,
        status: ScanStatus,
        health_score: Option<u8>,
    ) -> ScannerResult<ScanExecution> {
        let mut entries = self.entries.write();
        let entry = entries
            .get_mut(scan_id)
            .ok_or_else(|| StoreError::ExecutionNotFound {
                scan_id: scan_id.to_string(),
            })?;

        apply_transition(&mut entry.execution, status, health_score)?;
        Ok(entry.execution.clone())
    }

    async fn append_findings(&self, scan_id: &str, findings: &[Finding]) -> ScannerResult<usize> {
        let mut entries = self.entries.write();
        let entry = entries
            .get_mut(scan_id)
            .ok_or_else(|| StoreError::ExecutionNotFound {
                scan_id: scan_id.to_string(),
            })?;

        let mut inserted = 0;
        for finding in findings {
            if entry.finding_ids.insert(finding.id) {
                entry.findings.push(finding.clone());
                inserted += 1;
            }
        }
        Ok(inserted)
    }

    async fn discard_findings(&self, scan_id: &str) -> ScannerResult<usize> {
        let mut entries = self.entries.write();
        Ok(entries
            .get_mut(scan_id)
            .map(|entry| {
                entry.finding_ids.clear();
                std::mem::take(&mut entry.findings).len()
            })
            .unwrap_or(0))
    }

    async fn execution(&self, scan_id: &str) -> ScannerResult<Option<ScanExecution>> {
        Ok(self.entries.read().get(scan_id).map(|e| e.execution.clone()))
    }

    async fn findings(&self, scan_id: &str) -> ScannerResult<Vec<Finding>> {
        Ok(self
            .entries
            .read()
            .get(scan_id)
            .map(|e| e.findings.clone())
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ScannerError;
    use crate::i18n::LocalizedText;
    use crate::types::{Category, FindingKind, Severity};

    fn finding(title: &str) -> Finding {
        Finding::new(
            FindingKind::HstsMissing,
            Category::WebSecurity,
            Severity::Medium,
            LocalizedText {
                title: title.to_string(),
                description: String::new(),
                recommendation: String::new(),
            },
        )
        .bind_to_scan("s-1")
    }

    #[tokio::test]
    async fn test_create_is_insert_if_absent() {
        let store = MemoryStore::new();
        let request = ScanRequest::new("s-1", "example.com");

        store.create_execution(&request).await.unwrap();
        store.upsert_scan_status("s-1", ScanStatus::Running, None).await.unwrap();

        let again = store.create_execution(&request).await.unwrap();
        assert_eq!(again.status, ScanStatus::Running);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_findings_are_ignored() {
        let store = MemoryStore::new();
        store.create_execution(&ScanRequest::new("s-1", "example.com")).await.unwrap();

        let batch = vec![finding("a"), finding("b")];
        assert_eq!(store.append_findings("s-1", &batch).await.unwrap(), 2);
        assert_eq!(store.append_findings("s-1", &batch).await.unwrap(), 0);
        assert_eq!(store.findings("s-1").await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_unknown_scan_id() {
        let store = MemoryStore::new();
        let err = store
            .upsert_scan_status("missing", ScanStatus::Running, None)
            .await
            .unwrap_err();
        assert!(matches!(err, ScannerError::Store(StoreError::ExecutionNotFound { .. })));
        assert!(store.execution("missing").await.unwrap().is_none());
        assert!(store.findings("missing").await.unwrap().is_empty());
    }
}

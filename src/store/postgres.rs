// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - PostgreSQL Findings Store
 * Scan executions and findings with connection pooling
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use deadpool_postgres::{Config, ManagerConfig, Pool, RecyclingMethod, Runtime};
use std::time::Instant;
use tokio_postgres::{NoTls, Row};
use tracing::{debug, info};
use uuid::Uuid;

use super::{apply_transition, FindingsStore};
use crate::config::DatabaseConfig;
use crate::errors::{ScannerResult, StoreError};
use crate::types::{
    Category, CorrelationIds, Finding, FindingKind, FindingStatus, ScanExecution, ScanRequest,
    ScanStatus, Severity,
};

const EXECUTION_COLUMNS: &str = "scan_id, domain, asset_id, company_id, requester_id, status, \
                                 started_at, completed_at, health_score";

const FINDING_COLUMNS: &str =
    "id, kind, category, severity, title, description, recommendation, status, created_at";

/// Findings store backed by PostgreSQL
pub struct PostgresStore {
    pool: Pool,
}

impl PostgresStore {
    /// Create the pool and check connectivity
    pub async fn connect(config: &DatabaseConfig) -> ScannerResult<Self> {
        let mut pg_config = Config::new();
        pg_config.url = Some(config.url.clone());
        pg_config.manager = Some(ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        });
        pg_config.pool = Some(deadpool_postgres::PoolConfig::new(config.pool_size));

        let pool = pg_config
            .create_pool(Some(Runtime::Tokio1), NoTls)
            .map_err(|e| StoreError::ConnectionFailed {
                reason: format!("Failed to create PostgreSQL pool: {}", e),
            })?;

        let client = pool.get().await?;
        client.query("SELECT 1", &[]).await?;

        info!(pool_size = config.pool_size, "PostgreSQL findings store connected");

        let store = Self { pool };
        if config.auto_migrate {
            store.init_schema().await?;
        }
        Ok(store)
    }

    pub async fn init_schema(&self) -> ScannerResult<()> {
        let client = self.pool.get().await?;

        client
            .batch_execute(
                r#"
                CREATE TABLE IF NOT EXISTS scan_executions (
                    scan_id TEXT PRIMARY KEY,
                    domain TEXT NOT NULL,
                    asset_id TEXT,
                    company_id TEXT,
                    requester_id TEXT,
                    status VARCHAR(16) NOT NULL DEFAULT 'PENDING',
                    started_at TIMESTAMP WITH TIME ZONE,
                    completed_at TIMESTAMP WITH TIME ZONE,
                    health_score SMALLINT,
                    created_at TIMESTAMP WITH TIME ZONE DEFAULT NOW(),
                    updated_at TIMESTAMP WITH TIME ZONE DEFAULT NOW()
                );

                CREATE TABLE IF NOT EXISTS scan_findings (
                    id UUID PRIMARY KEY,
                    scan_id TEXT NOT NULL REFERENCES scan_executions(scan_id) ON DELETE CASCADE,
                    kind VARCHAR(64) NOT NULL,
                    category VARCHAR(32) NOT NULL,
                    severity VARCHAR(16) NOT NULL,
                    title TEXT NOT NULL,
                    description TEXT NOT NULL,
                    recommendation TEXT NOT NULL,
                    status VARCHAR(16) NOT NULL DEFAULT 'OPEN',
                    created_at TIMESTAMP WITH TIME ZONE NOT NULL
                );

                CREATE INDEX IF NOT EXISTS idx_scan_findings_scan_id ON scan_findings(scan_id);
                CREATE INDEX IF NOT EXISTS idx_scan_findings_severity ON scan_findings(severity);
                CREATE INDEX IF NOT EXISTS idx_scan_executions_status ON scan_executions(status);
                "#,
            )
            .await?;

        info!("Findings store schema initialized");
        Ok(())
    }
}

fn execution_from_row(row: &Row) -> ScannerResult<ScanExecution> {
    let status: String = row.try_get("status")?;
    let status = ScanStatus::parse(&status)
        .ok_or_else(|| StoreError::Query(format!("Unknown scan status: {}", status)))?;
    let health_score: Option<i16> = row.try_get("health_score")?;

    Ok(ScanExecution {
        scan_id: row.try_get("scan_id")?,
        domain: row.try_get("domain")?,
        correlation_ids: CorrelationIds {
            asset_id: row.try_get("asset_id")?,
            company_id: row.try_get("company_id")?,
            requester_id: row.try_get("requester_id")?,
        },
        status,
        started_at: row.try_get::<_, Option<DateTime<Utc>>>("started_at")?,
        completed_at: row.try_get::<_, Option<DateTime<Utc>>>("completed_at")?,
        health_score: health_score.map(|s| s.clamp(0, 100) as u8),
    })
}

fn finding_from_row(row: &Row) -> ScannerResult<Finding> {
    let kind: String = row.try_get("kind")?;
    let category: String = row.try_get("category")?;
    let severity: String = row.try_get("severity")?;
    let status: String = row.try_get("status")?;

    let unknown =
        |what: &str, value: &str| StoreError::Query(format!("Unknown {}: {}", what, value));

    Ok(Finding {
        id: row.try_get::<_, Uuid>("id")?,
        kind: serde_json::from_value::<FindingKind>(serde_json::Value::String(kind.clone()))
            .map_err(|_| unknown("finding kind", &kind))?,
        category: Category::parse(&category).ok_or_else(|| unknown("category", &category))?,
        severity: Severity::parse(&severity).ok_or_else(|| unknown("severity", &severity))?,
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        recommendation: row.try_get("recommendation")?,
        status: match status.as_str() {
            "RESOLVED" => FindingStatus::Resolved,
            "IGNORED" => FindingStatus::Ignored,
            _ => FindingStatus::Open,
        },
        created_at: row.try_get("created_at")?,
    })
}

#[async_trait]
impl FindingsStore for PostgresStore {
    async fn create_execution(&self, request: &ScanRequest) -> ScannerResult<ScanExecution> {
        let client = self.pool.get().await?;
        let ids = &request.correlation_ids;

        client
            .execute(
                r#"
                INSERT INTO scan_executions (scan_id, domain, asset_id, company_id, requester_id, status)
                VALUES ($1, $2, $3, $4, $5, 'PENDING')
                ON CONFLICT (scan_id) DO NOTHING
                "#,
                &[
                    &request.scan_id,
                    &request.domain,
                    &ids.asset_id,
                    &ids.company_id,
                    &ids.requester_id,
                ],
            )
            .await?;

        let row = client
            .query_one(
                &format!("SELECT {} FROM scan_executions WHERE scan_id = $1", EXECUTION_COLUMNS),
                &[&request.scan_id],
            )
            .await?;
        execution_from_row(&row)
    }

    async fn upsert_scan_status(
        &self,
        scan_id: &str,
        status: ScanStatus,
        health_score: Option<u8>,
    ) -> ScannerResult<ScanExecution> {
        let mut client = self.pool.get().await?;
        let transaction = client.transaction().await?;

        let row = transaction
            .query_opt(
                &format!(
                    "SELECT {} FROM scan_executions WHERE scan_id = $1 FOR UPDATE",
                    EXECUTION_COLUMNS
                ),
                &[&scan_id],
            )
            .await?
            .ok_or_else(|| StoreError::ExecutionNotFound {
                scan_id: scan_id.to_string(),
            })?;

        let mut execution = execution_from_row(&row)?;
        apply_transition(&mut execution, status, health_score)?;

        transaction
            .execute(
                r#"
                UPDATE scan_executions
                SET status = $2, started_at = $3, completed_at = $4, health_score = $5, updated_at = NOW()
                WHERE scan_id = $1
                "#,
                &[
                    &scan_id,
                    &execution.status.as_str(),
                    &execution.started_at,
                    &execution.completed_at,
                    &execution.health_score.map(i16::from),
                ],
            )
            .await?;
        transaction.commit().await?;

        debug!(scan_id, status = %execution.status, "Scan status updated");
        Ok(execution)
    }

    async fn append_findings(&self, scan_id: &str, findings: &[Finding]) -> ScannerResult<usize> {
        if findings.is_empty() {
            return Ok(0);
        }

        let start = Instant::now();
        let mut client = self.pool.get().await?;
        let transaction = client.transaction().await?;

        let statement = transaction
            .prepare(
                r#"
                INSERT INTO scan_findings (
                    id, scan_id, kind, category, severity, title, description,
                    recommendation, status, created_at
                ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
                ON CONFLICT (id) DO NOTHING
                "#,
            )
            .await?;

        let mut inserted = 0;
        for finding in findings {
            inserted += transaction
                .execute(
                    &statement,
                    &[
                        &finding.id,
                        &scan_id,
                        &finding.kind.as_str(),
                        &finding.category.as_str(),
                        &finding.severity.as_str(),
                        &finding.title,
                        &finding.description,
                        &finding.recommendation,
                        &finding.status.as_str(),
                        &finding.created_at,
                    ],
                )
                .await?;
        }
        transaction.commit().await?;

        debug!(
            scan_id,
            inserted,
            skipped = findings.len() as u64 - inserted,
            duration_ms = start.elapsed().as_millis() as u64,
            "Findings appended"
        );
        Ok(inserted as usize)
    }

    async fn discard_findings(&self, scan_id: &str) -> ScannerResult<usize> {
        let client = self.pool.get().await?;
        let removed = client
            .execute("DELETE FROM scan_findings WHERE scan_id = $1", &[&scan_id])
            .await?;
        Ok(removed as usize)
    }

    async fn execution(&self, scan_id: &str) -> ScannerResult<Option<ScanExecution>> {
        let client = self.pool.get().await?;
        let row = client
            .query_opt(
                &format!("SELECT {} FROM scan_executions WHERE scan_id = $1", EXECUTION_COLUMNS),
                &[&scan_id],
            )
            .await?;
        row.as_ref().map(execution_from_row).transpose()
    }

    async fn findings(&self, scan_id: &str) -> ScannerResult<Vec<Finding>> {
        let client = self.pool.get().await?;
        let rows = client
            .query(
                &format!(
                    "SELECT {} FROM scan_findings WHERE scan_id = $1 ORDER BY created_at, id",
                    FINDING_COLUMNS
                ),
                &[&scan_id],
            )
            .await?;
        rows.iter().map(finding_from_row).collect()
    }
}

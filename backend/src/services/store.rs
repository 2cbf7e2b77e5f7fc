//! Persistence interfaces and the Postgres implementation
//!
//! The reconciliation engine talks to storage through three narrow traits
//! so the pipeline can run against an in-memory store in tests. `PgStore`
//! implements all of them over sqlx.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use shared::models::{
    AdjustmentReason, GrainBatchRiskState, GrainType, RiskAdjustmentAuditEntry, SensorSample,
    SpoilageLabel,
};

use crate::error::{AppError, AppResult};

/// Fields written by a risk score commit
#[derive(Debug, Clone)]
pub struct RiskUpdate {
    pub risk_score: f64,
    pub confidence: f64,
    pub spoilage_label: SpoilageLabel,
    pub assessed_at: DateTime<Utc>,
}

/// A storage silo and its location
#[derive(Debug, Clone, Serialize)]
pub struct SiloRecord {
    pub silo_id: Uuid,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

/// Read and commit access to grain batch risk state
#[async_trait]
pub trait BatchStore: Send + Sync {
    async fn find_batch(&self, batch_id: Uuid) -> AppResult<Option<GrainBatchRiskState>>;

    async fn batches_in_silo(&self, silo_id: Uuid) -> AppResult<Vec<GrainBatchRiskState>>;

    async fn find_silo(&self, silo_id: Uuid) -> AppResult<Option<SiloRecord>>;

    /// Commit a risk update together with its audit entry, atomically.
    ///
    /// With `expect_score: Some(old)` the update is conditional on the stored
    /// score still being `old`; a concurrent change yields
    /// `ConflictOnCommit`. `None` commits unconditionally (manual override).
    async fn commit(
        &self,
        batch_id: Uuid,
        update: &RiskUpdate,
        expect_score: Option<f64>,
        audit: &RiskAdjustmentAuditEntry,
    ) -> AppResult<()>;
}

/// Latest internal sensor readings per silo
#[async_trait]
pub trait SensorSource: Send + Sync {
    async fn latest_reading(&self, silo_id: Uuid) -> AppResult<Option<SensorSample>>;
}

/// Read side of the risk adjustment audit log; writes ride the commit
/// transaction.
#[async_trait]
pub trait AuditLog: Send + Sync {
    async fn entries_for_batch(&self, batch_id: Uuid)
        -> AppResult<Vec<RiskAdjustmentAuditEntry>>;
}

/// Postgres-backed store
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct BatchRow {
    batch_id: Uuid,
    silo_id: Uuid,
    grain_type: String,
    risk_score: f64,
    confidence: Option<f64>,
    spoilage_label: String,
    last_risk_assessment: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl BatchRow {
    fn into_state(self) -> AppResult<GrainBatchRiskState> {
        let grain_type = GrainType::parse(&self.grain_type).ok_or_else(|| {
            AppError::Internal(format!("unknown grain type in store: {}", self.grain_type))
        })?;
        let spoilage_label = SpoilageLabel::parse(&self.spoilage_label).ok_or_else(|| {
            AppError::Internal(format!(
                "unknown spoilage label in store: {}",
                self.spoilage_label
            ))
        })?;
        Ok(GrainBatchRiskState {
            batch_id: self.batch_id,
            silo_id: self.silo_id,
            grain_type,
            risk_score: self.risk_score,
            confidence: self.confidence,
            spoilage_label,
            last_risk_assessment: self.last_risk_assessment,
            created_at: self.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct AuditRow {
    batch_id: Uuid,
    old_risk_score: f64,
    new_risk_score: f64,
    adjustment_reason: String,
    confidence: f64,
    applied_at: DateTime<Utc>,
}

impl AuditRow {
    fn into_entry(self) -> AppResult<RiskAdjustmentAuditEntry> {
        let adjustment_reason = AdjustmentReason::parse(&self.adjustment_reason).ok_or_else(|| {
            AppError::Internal(format!(
                "unknown adjustment reason in store: {}",
                self.adjustment_reason
            ))
        })?;
        Ok(RiskAdjustmentAuditEntry {
            batch_id: self.batch_id,
            old_risk_score: self.old_risk_score,
            new_risk_score: self.new_risk_score,
            adjustment_reason,
            confidence: self.confidence,
            applied_at: self.applied_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct SiloRow {
    silo_id: Uuid,
    name: String,
    latitude: f64,
    longitude: f64,
}

#[async_trait]
impl BatchStore for PgStore {
    async fn find_batch(&self, batch_id: Uuid) -> AppResult<Option<GrainBatchRiskState>> {
        let row = sqlx::query_as::<_, BatchRow>(
            r#"
            SELECT batch_id, silo_id, grain_type, risk_score, confidence,
                   spoilage_label, last_risk_assessment, created_at
            FROM grain_batches
            WHERE batch_id = $1
            "#,
        )
        .bind(batch_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(BatchRow::into_state).transpose()
    }

    async fn batches_in_silo(&self, silo_id: Uuid) -> AppResult<Vec<GrainBatchRiskState>> {
        let rows = sqlx::query_as::<_, BatchRow>(
            r#"
            SELECT batch_id, silo_id, grain_type, risk_score, confidence,
                   spoilage_label, last_risk_assessment, created_at
            FROM grain_batches
            WHERE silo_id = $1
            ORDER BY created_at
            "#,
        )
        .bind(silo_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(BatchRow::into_state).collect()
    }

    async fn find_silo(&self, silo_id: Uuid) -> AppResult<Option<SiloRecord>> {
        let row = sqlx::query_as::<_, SiloRow>(
            r#"
            SELECT silo_id, name, latitude, longitude
            FROM silos
            WHERE silo_id = $1
            "#,
        )
        .bind(silo_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| SiloRecord {
            silo_id: r.silo_id,
            name: r.name,
            latitude: r.latitude,
            longitude: r.longitude,
        }))
    }

    async fn commit(
        &self,
        batch_id: Uuid,
        update: &RiskUpdate,
        expect_score: Option<f64>,
        audit: &RiskAdjustmentAuditEntry,
    ) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;

        let result = match expect_score {
            Some(old_score) => {
                sqlx::query(
                    r#"
                    UPDATE grain_batches
                    SET risk_score = $1, confidence = $2, spoilage_label = $3,
                        last_risk_assessment = $4
                    WHERE batch_id = $5 AND risk_score = $6
                    "#,
                )
                .bind(update.risk_score)
                .bind(update.confidence)
                .bind(update.spoilage_label.as_str())
                .bind(update.assessed_at)
                .bind(batch_id)
                .bind(old_score)
                .execute(&mut *tx)
                .await?
            }
            None => {
                sqlx::query(
                    r#"
                    UPDATE grain_batches
                    SET risk_score = $1, confidence = $2, spoilage_label = $3,
                        last_risk_assessment = $4
                    WHERE batch_id = $5
                    "#,
                )
                .bind(update.risk_score)
                .bind(update.confidence)
                .bind(update.spoilage_label.as_str())
                .bind(update.assessed_at)
                .bind(batch_id)
                .execute(&mut *tx)
                .await?
            }
        };

        if result.rows_affected() == 0 {
            // Distinguish a missing batch from a concurrent score change
            let exists: bool = sqlx::query_scalar(
                "SELECT EXISTS(SELECT 1 FROM grain_batches WHERE batch_id = $1)",
            )
            .bind(batch_id)
            .fetch_one(&mut *tx)
            .await?;

            return if exists {
                Err(AppError::ConflictOnCommit(batch_id))
            } else {
                Err(AppError::NotFound(format!("Batch {}", batch_id)))
            };
        }

        sqlx::query(
            r#"
            INSERT INTO risk_audit_log
                (batch_id, old_risk_score, new_risk_score, adjustment_reason,
                 confidence, applied_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(audit.batch_id)
        .bind(audit.old_risk_score)
        .bind(audit.new_risk_score)
        .bind(audit.adjustment_reason.as_str())
        .bind(audit.confidence)
        .bind(audit.applied_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }
}

#[async_trait]
impl SensorSource for PgStore {
    async fn latest_reading(&self, silo_id: Uuid) -> AppResult<Option<SensorSample>> {
        let row = sqlx::query_as::<_, (f64, f64, DateTime<Utc>)>(
            r#"
            SELECT temperature, humidity, recorded_at
            FROM sensor_readings
            WHERE silo_id = $1
            ORDER BY recorded_at DESC
            LIMIT 1
            "#,
        )
        .bind(silo_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(temperature, humidity, recorded_at)| SensorSample {
            temperature,
            humidity,
            recorded_at,
        }))
    }
}

#[async_trait]
impl AuditLog for PgStore {
    async fn entries_for_batch(
        &self,
        batch_id: Uuid,
    ) -> AppResult<Vec<RiskAdjustmentAuditEntry>> {
        let rows = sqlx::query_as::<_, AuditRow>(
            r#"
            SELECT batch_id, old_risk_score, new_risk_score, adjustment_reason,
                   confidence, applied_at
            FROM risk_audit_log
            WHERE batch_id = $1
            ORDER BY applied_at DESC
            "#,
        )
        .bind(batch_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(AuditRow::into_entry).collect()
    }
}

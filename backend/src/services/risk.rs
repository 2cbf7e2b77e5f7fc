//! Batch risk reconciliation engine
//!
//! Applies the environmental risk multiplier to stored batch risk scores
//! under the minimum-change policy, serializing automated adjustments per
//! batch and writing every committed change to the audit log.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::Mutex;
use uuid::Uuid;

use shared::models::{
    AdjustmentReason, EnvironmentalReading, GrainBatchRiskState, GrainType, PrimaryFactor,
    RiskAdjustmentAuditEntry, RiskMultiplierResult, SpoilageLabel,
};
use shared::validation::validate_risk_score;

use crate::config::RiskPolicyConfig;
use crate::error::{AppError, AppResult};
use crate::services::multiplier::compute_multiplier;
use crate::services::store::{AuditLog, BatchStore, RiskUpdate, SensorSource};

/// Outcome of running one batch through the pipeline
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BatchOutcome {
    /// The delta cleared the policy threshold and the new score was committed
    Adjusted {
        old_score: f64,
        new_score: f64,
        reason: AdjustmentReason,
        spoilage_label: SpoilageLabel,
    },
    /// The computed change was within the policy threshold; nothing written
    Unchanged { score: f64 },
    /// The batch could not be assessed (no recent sensor reading)
    Skipped { reason: String },
    /// The batch errored without aborting the sweep
    Failed { error: String },
}

/// Per-batch result row in a sweep response
#[derive(Debug, Clone, Serialize)]
pub struct BatchResult {
    pub batch_id: Uuid,
    #[serde(flatten)]
    pub outcome: BatchOutcome,
}

/// Counters for a completed silo sweep
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct SweepSummary {
    pub adjusted: usize,
    pub unchanged: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Full report for a silo sweep
#[derive(Debug, Clone, Serialize)]
pub struct SweepReport {
    pub silo_id: Uuid,
    pub results: Vec<BatchResult>,
    pub summary: SweepSummary,
}

/// Reconciles environmental conditions against stored batch risk scores
pub struct RiskEngine<D> {
    store: Arc<D>,
    policy: RiskPolicyConfig,
    // Per-batch locks serialize automated adjustments; stale entries are
    // swept on the next acquisition
    locks: Mutex<HashMap<Uuid, Arc<Mutex<()>>>>,
}

impl<D> RiskEngine<D> {
    pub fn new(store: Arc<D>, policy: RiskPolicyConfig) -> Self {
        Self {
            store,
            policy,
            locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn store(&self) -> &D {
        &self.store
    }

    async fn batch_lock(&self, batch_id: Uuid) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        // Drop locks nobody holds anymore; the map entry keeps one reference
        locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        locks
            .entry(batch_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}

impl<D> RiskEngine<D>
where
    D: BatchStore + SensorSource + AuditLog,
{
    /// Run one batch through the automated adjustment pipeline.
    ///
    /// Serialized per batch; a commit conflict gets one retry against a
    /// fresh read before surfacing.
    pub async fn reconcile_batch(
        &self,
        batch_id: Uuid,
        environment: &EnvironmentalReading,
        now: DateTime<Utc>,
    ) -> AppResult<BatchOutcome> {
        let lock = self.batch_lock(batch_id).await;
        let _guard = lock.lock().await;

        let result = match self.try_adjust(batch_id, environment, now).await {
            Err(AppError::ConflictOnCommit(_)) => {
                tracing::debug!("Commit conflict for batch {}, retrying once", batch_id);
                self.try_adjust(batch_id, environment, now).await
            }
            other => other,
        };

        // A batch without a current internal reading is a skip, not a failure
        match result {
            Err(err @ AppError::MissingSensorData(_)) => Ok(BatchOutcome::Skipped {
                reason: err.to_string(),
            }),
            other => other,
        }
    }

    /// Apply a manual risk score override.
    ///
    /// Bypasses the multiplier pipeline and the delta gate; commits
    /// unconditionally with the override confidence.
    pub async fn override_risk(
        &self,
        batch_id: Uuid,
        target_score: f64,
        now: DateTime<Utc>,
    ) -> AppResult<BatchOutcome> {
        validate_risk_score(target_score)
            .map_err(|msg| AppError::InvalidOverrideValue(msg.to_string()))?;

        let batch = self
            .store
            .find_batch(batch_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Batch {}", batch_id)))?;

        let spoilage_label = SpoilageLabel::from_score(target_score);
        let update = RiskUpdate {
            risk_score: target_score,
            confidence: self.policy.override_confidence,
            spoilage_label,
            assessed_at: now,
        };
        let audit = RiskAdjustmentAuditEntry {
            batch_id,
            old_risk_score: batch.risk_score,
            new_risk_score: target_score,
            adjustment_reason: AdjustmentReason::ManualOverride,
            confidence: self.policy.override_confidence,
            applied_at: now,
        };

        self.store.commit(batch_id, &update, None, &audit).await?;

        tracing::info!(
            "Manual override committed for batch {}: {} -> {}",
            batch_id,
            batch.risk_score,
            target_score
        );

        Ok(BatchOutcome::Adjusted {
            old_score: batch.risk_score,
            new_score: target_score,
            reason: AdjustmentReason::ManualOverride,
            spoilage_label,
        })
    }

    /// Run every batch in a silo through the pipeline.
    ///
    /// Per-batch failures are recorded in the report and never abort the
    /// sweep.
    pub async fn sweep_silo(
        &self,
        silo_id: Uuid,
        environment: &EnvironmentalReading,
        now: DateTime<Utc>,
    ) -> AppResult<SweepReport> {
        let batches = self.store.batches_in_silo(silo_id).await?;

        let mut results = Vec::with_capacity(batches.len());
        let mut summary = SweepSummary::default();

        for batch in &batches {
            let outcome = match self.reconcile_batch(batch.batch_id, environment, now).await {
                Ok(outcome) => outcome,
                Err(err) => {
                    tracing::warn!(
                        "Batch {} failed during sweep of silo {}: {}",
                        batch.batch_id,
                        silo_id,
                        err
                    );
                    BatchOutcome::Failed {
                        error: err.to_string(),
                    }
                }
            };

            match &outcome {
                BatchOutcome::Adjusted { .. } => summary.adjusted += 1,
                BatchOutcome::Unchanged { .. } => summary.unchanged += 1,
                BatchOutcome::Skipped { .. } => summary.skipped += 1,
                BatchOutcome::Failed { .. } => summary.failed += 1,
            }
            results.push(BatchResult {
                batch_id: batch.batch_id,
                outcome,
            });
        }

        tracing::info!(
            "Sweep of silo {} complete: {} adjusted, {} unchanged, {} skipped, {} failed",
            silo_id,
            summary.adjusted,
            summary.unchanged,
            summary.skipped,
            summary.failed
        );

        Ok(SweepReport {
            silo_id,
            results,
            summary,
        })
    }

    async fn try_adjust(
        &self,
        batch_id: Uuid,
        environment: &EnvironmentalReading,
        now: DateTime<Utc>,
    ) -> AppResult<BatchOutcome> {
        let batch = self
            .store
            .find_batch(batch_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Batch {}", batch_id)))?;

        let Some(sensor) = self.store.latest_reading(batch.silo_id).await? else {
            return Err(AppError::MissingSensorData(batch.silo_id));
        };

        let multiplier = compute_multiplier(
            &sensor,
            environment,
            environment.precipitation_probability,
        );
        let new_score = adjusted_score(&batch, &multiplier);

        if (new_score - batch.risk_score).abs() <= self.policy.min_change_delta {
            return Ok(BatchOutcome::Unchanged {
                score: batch.risk_score,
            });
        }

        let reason = AdjustmentReason::from(multiplier.primary_factor);
        let spoilage_label = SpoilageLabel::from_score(new_score);
        let update = RiskUpdate {
            risk_score: new_score,
            confidence: self.policy.automated_confidence,
            spoilage_label,
            assessed_at: now,
        };
        let audit = RiskAdjustmentAuditEntry {
            batch_id,
            old_risk_score: batch.risk_score,
            new_risk_score: new_score,
            adjustment_reason: reason,
            confidence: self.policy.automated_confidence,
            applied_at: now,
        };

        self.store
            .commit(batch_id, &update, Some(batch.risk_score), &audit)
            .await?;

        tracing::info!(
            "Risk adjustment committed for batch {}: {} -> {} ({})",
            batch_id,
            batch.risk_score,
            new_score,
            reason.as_str()
        );

        Ok(BatchOutcome::Adjusted {
            old_score: batch.risk_score,
            new_score,
            reason,
            spoilage_label,
        })
    }

}

/// Apply the multiplier and grain-specific amplification to a batch's
/// score, clamped to [0, 100] and rounded to the nearest integer.
pub fn adjusted_score(batch: &GrainBatchRiskState, multiplier: &RiskMultiplierResult) -> f64 {
    let amplification = match (batch.grain_type, multiplier.primary_factor) {
        (GrainType::Rice, PrimaryFactor::HighExternalHumidity) => 1.2,
        (GrainType::Wheat, PrimaryFactor::MonsoonConditions) => 1.15,
        _ => 1.0,
    };

    (batch.risk_score * multiplier.multiplier * amplification).clamp(0.0, 100.0).round()
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::models::StabilityLabel;

    fn batch(grain_type: GrainType, risk_score: f64) -> GrainBatchRiskState {
        GrainBatchRiskState {
            batch_id: Uuid::new_v4(),
            silo_id: Uuid::new_v4(),
            grain_type,
            risk_score,
            confidence: None,
            spoilage_label: SpoilageLabel::from_score(risk_score),
            last_risk_assessment: None,
            created_at: Utc::now(),
        }
    }

    fn multiplier(value: f64, factor: PrimaryFactor) -> RiskMultiplierResult {
        RiskMultiplierResult {
            multiplier: value,
            primary_factor: factor,
            stability: if value < 1.2 {
                StabilityLabel::Stable
            } else {
                StabilityLabel::Unstable
            },
        }
    }

    #[test]
    fn test_adjusted_score_plain() {
        let score = adjusted_score(
            &batch(GrainType::Corn, 50.0),
            &multiplier(1.3, PrimaryFactor::HighExternalHumidity),
        );
        assert_eq!(score, 65.0);
    }

    #[test]
    fn test_rice_humidity_amplification() {
        let score = adjusted_score(
            &batch(GrainType::Rice, 50.0),
            &multiplier(1.3, PrimaryFactor::HighExternalHumidity),
        );
        // 50 * 1.3 * 1.2 = 78
        assert_eq!(score, 78.0);
    }

    #[test]
    fn test_wheat_monsoon_amplification() {
        let score = adjusted_score(
            &batch(GrainType::Wheat, 40.0),
            &multiplier(1.3 * 1.4, PrimaryFactor::MonsoonConditions),
        );
        // 40 * 1.82 * 1.15 = 83.72 -> 84
        assert_eq!(score, 84.0);
    }

    #[test]
    fn test_amplification_requires_matching_factor() {
        let score = adjusted_score(
            &batch(GrainType::Rice, 50.0),
            &multiplier(1.4, PrimaryFactor::MonsoonConditions),
        );
        assert_eq!(score, 70.0);
    }

    #[test]
    fn test_score_clamps_at_one_hundred() {
        let score = adjusted_score(
            &batch(GrainType::Rice, 95.0),
            &multiplier(1.3 * 1.2 * 1.4, PrimaryFactor::HighExternalHumidity),
        );
        assert_eq!(score, 100.0);
    }

    #[test]
    fn test_stable_conditions_round_trip() {
        let score = adjusted_score(&batch(GrainType::Corn, 42.0), &multiplier(1.0, PrimaryFactor::Stable));
        assert_eq!(score, 42.0);
    }

    #[test]
    fn test_released_batch_locks_are_swept() {
        let engine: RiskEngine<()> = RiskEngine::new(Arc::new(()), RiskPolicyConfig::default());

        tokio_test::block_on(async {
            for _ in 0..32 {
                let lock = engine.batch_lock(Uuid::new_v4()).await;
                let _guard = lock.lock().await;
            }

            // Every earlier lock has been released; acquiring a new one
            // sweeps them out of the map
            let held = engine.batch_lock(Uuid::new_v4()).await;
            let _guard = held.lock().await;

            let locks = engine.locks.lock().await;
            assert!(locks.len() <= 2, "lock map grew to {} entries", locks.len());
        });
    }

    #[test]
    fn test_held_batch_lock_survives_the_sweep() {
        let engine: RiskEngine<()> = RiskEngine::new(Arc::new(()), RiskPolicyConfig::default());

        tokio_test::block_on(async {
            let batch_id = Uuid::new_v4();
            let held = engine.batch_lock(batch_id).await;
            let _guard = held.lock().await;

            let _other = engine.batch_lock(Uuid::new_v4()).await;

            let locks = engine.locks.lock().await;
            assert!(locks.contains_key(&batch_id));
        });
    }
}

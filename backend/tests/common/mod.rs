//! Shared test support: an in-memory store backing the reconciliation
//! engine, with conflict injection for concurrency tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use grainhero_backend::error::{AppError, AppResult};
use grainhero_backend::services::store::{
    AuditLog, BatchStore, RiskUpdate, SensorSource, SiloRecord,
};
use shared::models::{
    EnvironmentalReading, GrainBatchRiskState, GrainType, RiskAdjustmentAuditEntry, SensorSample,
    SpoilageLabel, WeatherCondition,
};

#[derive(Default)]
pub struct MemoryStore {
    batches: Mutex<HashMap<Uuid, GrainBatchRiskState>>,
    silos: Mutex<HashMap<Uuid, SiloRecord>>,
    sensors: Mutex<HashMap<Uuid, SensorSample>>,
    audit: Mutex<Vec<RiskAdjustmentAuditEntry>>,
    // batch_id -> queue of scores a "concurrent writer" sets while failing
    // the conditional commit
    conflicts: Mutex<HashMap<Uuid, Vec<f64>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_silo(&self, name: &str, latitude: f64, longitude: f64) -> Uuid {
        let silo_id = Uuid::new_v4();
        self.silos.lock().unwrap().insert(
            silo_id,
            SiloRecord {
                silo_id,
                name: name.to_string(),
                latitude,
                longitude,
            },
        );
        silo_id
    }

    pub fn add_batch(&self, silo_id: Uuid, grain_type: GrainType, risk_score: f64) -> Uuid {
        let batch_id = Uuid::new_v4();
        self.batches.lock().unwrap().insert(
            batch_id,
            GrainBatchRiskState {
                batch_id,
                silo_id,
                grain_type,
                risk_score,
                confidence: None,
                spoilage_label: SpoilageLabel::from_score(risk_score),
                last_risk_assessment: None,
                created_at: Utc::now(),
            },
        );
        batch_id
    }

    pub fn set_sensor(&self, silo_id: Uuid, temperature: f64, humidity: f64) {
        self.sensors.lock().unwrap().insert(
            silo_id,
            SensorSample {
                temperature,
                humidity,
                recorded_at: Utc::now(),
            },
        );
    }

    /// Queue concurrent-writer interference: each queued score fails one
    /// conditional commit and replaces the stored score, as a real
    /// concurrent writer would.
    pub fn inject_conflict(&self, batch_id: Uuid, concurrent_score: f64) {
        self.conflicts
            .lock()
            .unwrap()
            .entry(batch_id)
            .or_default()
            .push(concurrent_score);
    }

    pub fn batch(&self, batch_id: Uuid) -> GrainBatchRiskState {
        self.batches.lock().unwrap()[&batch_id].clone()
    }

    pub fn audit_entries(&self, batch_id: Uuid) -> Vec<RiskAdjustmentAuditEntry> {
        self.audit
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.batch_id == batch_id)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl BatchStore for MemoryStore {
    async fn find_batch(&self, batch_id: Uuid) -> AppResult<Option<GrainBatchRiskState>> {
        Ok(self.batches.lock().unwrap().get(&batch_id).cloned())
    }

    async fn batches_in_silo(&self, silo_id: Uuid) -> AppResult<Vec<GrainBatchRiskState>> {
        let mut batches: Vec<_> = self
            .batches
            .lock()
            .unwrap()
            .values()
            .filter(|b| b.silo_id == silo_id)
            .cloned()
            .collect();
        batches.sort_by_key(|b| b.created_at);
        Ok(batches)
    }

    async fn find_silo(&self, silo_id: Uuid) -> AppResult<Option<SiloRecord>> {
        Ok(self.silos.lock().unwrap().get(&silo_id).cloned())
    }

    async fn commit(
        &self,
        batch_id: Uuid,
        update: &RiskUpdate,
        expect_score: Option<f64>,
        audit: &RiskAdjustmentAuditEntry,
    ) -> AppResult<()> {
        let mut batches = self.batches.lock().unwrap();
        let Some(batch) = batches.get_mut(&batch_id) else {
            return Err(AppError::NotFound(format!("Batch {}", batch_id)));
        };

        if let Some(old_score) = expect_score {
            let mut conflicts = self.conflicts.lock().unwrap();
            if let Some(queue) = conflicts.get_mut(&batch_id) {
                if let Some(concurrent_score) = queue.pop() {
                    batch.risk_score = concurrent_score;
                    batch.spoilage_label = SpoilageLabel::from_score(concurrent_score);
                    return Err(AppError::ConflictOnCommit(batch_id));
                }
            }
            if batch.risk_score != old_score {
                return Err(AppError::ConflictOnCommit(batch_id));
            }
        }

        batch.risk_score = update.risk_score;
        batch.confidence = Some(update.confidence);
        batch.spoilage_label = update.spoilage_label;
        batch.last_risk_assessment = Some(update.assessed_at);

        self.audit.lock().unwrap().push(audit.clone());
        Ok(())
    }
}

#[async_trait]
impl SensorSource for MemoryStore {
    async fn latest_reading(&self, silo_id: Uuid) -> AppResult<Option<SensorSample>> {
        Ok(self.sensors.lock().unwrap().get(&silo_id).cloned())
    }
}

#[async_trait]
impl AuditLog for MemoryStore {
    async fn entries_for_batch(
        &self,
        batch_id: Uuid,
    ) -> AppResult<Vec<RiskAdjustmentAuditEntry>> {
        Ok(self.audit_entries(batch_id))
    }
}

/// Fixed external conditions for tests
pub fn environment(
    temperature: f64,
    humidity: f64,
    pressure: f64,
    precipitation_probability: f64,
) -> EnvironmentalReading {
    EnvironmentalReading {
        timestamp: Utc::now(),
        temperature,
        humidity,
        pressure,
        wind_speed: 2.0,
        precipitation_probability,
        weather_condition: WeatherCondition::Clear,
    }
}

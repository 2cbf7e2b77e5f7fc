//! Business logic services

pub mod multiplier;
pub mod recommendation;
pub mod risk;
pub mod seasonal;
pub mod store;

pub use risk::{BatchOutcome, RiskEngine, SweepReport};
pub use store::{AuditLog, BatchStore, PgStore, SensorSource};

//! Shared types and models for the GrainHero storage risk platform
//!
//! This crate contains types shared between the backend service and other
//! components of the system (reporting jobs, future clients).

pub mod models;
pub mod types;
pub mod validation;

pub use models::*;
pub use types::*;
pub use validation::*;

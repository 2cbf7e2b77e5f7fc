//! Domain models for the GrainHero storage risk platform

pub mod batch;
pub mod environment;
pub mod region;
pub mod risk;

pub use batch::*;
pub use environment::*;
pub use region::*;
pub use risk::*;

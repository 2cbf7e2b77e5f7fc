//! HTTP request handlers

pub mod health;
pub mod risk;
pub mod weather;

pub use health::*;
pub use risk::*;
pub use weather::*;

//! External API integrations

pub mod weather;

pub use weather::{WeatherProvider, WeatherSource};

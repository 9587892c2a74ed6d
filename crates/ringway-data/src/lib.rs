//! Scenario loading for the Ringway engine.
//!
//! Reads scenario, tuning and demand files in RON, TOML or JSON, resolves
//! city names to ids and returns validated `ringway-core` configuration.

pub mod loader;
pub mod schema;

pub use loader::{DataLoadError, LoadedScenario, load_scenario};

//! Serde data types for on-disk scenario files.
//!
//! These types mirror the file layout and carry cross-references as city
//! names. The loader resolves names to ids and produces `ringway-core`
//! configuration.

use ringway_core::config::FleetConfig;
use serde::Deserialize;

fn default_gate_distance() -> f64 {
    60.0
}

// ===========================================================================
// Scenario
// ===========================================================================

/// Top-level contents of `scenario.{ron,toml,json}`.
#[derive(Debug, Clone, Deserialize)]
pub struct ScenarioData {
    pub name: String,
    pub cities: Vec<CityData>,
    #[serde(default)]
    pub pipelines: Vec<PipelineData>,
    #[serde(default)]
    pub fleet: FleetConfig,
}

/// A city and its gate layout.
#[derive(Debug, Clone, Deserialize)]
pub struct CityData {
    pub name: String,
    pub gates: u32,
    #[serde(default = "default_gate_distance")]
    pub gate_distance: f64,
    #[serde(default)]
    pub gate_offset: f64,
}

/// A corridor between two named cities.
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineData {
    pub from: String,
    pub to: String,
    pub capacity: u32,
    #[serde(default)]
    pub transit_time: f64,
}

// ===========================================================================
// Demand
// ===========================================================================

/// Contents of `demand.{ron,toml,json}`: a table-driven forecast.
#[derive(Debug, Clone, Deserialize)]
pub struct DemandData {
    /// 24 multipliers, hour 0 first.
    pub hourly: Vec<f64>,
    /// 7 multipliers, Monday first.
    pub daily: Vec<f64>,
    #[serde(default)]
    pub routes: Vec<RouteData>,
}

/// Forecast flights on one origin-destination pair.
#[derive(Debug, Clone, Deserialize)]
pub struct RouteData {
    pub from: String,
    pub to: String,
    pub flights: u32,
}

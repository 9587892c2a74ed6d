//! Engine tuning and scenario definitions.
//!
//! All types are plain serde data so that `ringway-data` (or any caller) can
//! deserialize them. Nothing here is trusted until [`SimConfig::validate`]
//! and [`ScenarioConfig::validate`] have passed; [`Engine::new`] calls both.
//!
//! [`Engine::new`]: crate::engine::Engine::new

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, require_positive};
use crate::id::CityId;

// ---------------------------------------------------------------------------
// Engine tuning
// ---------------------------------------------------------------------------

/// Top-level engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Seed for the default random source. Reset reseeds with it.
    pub seed: u64,
    /// Maximum number of retained event-log entries.
    pub log_capacity: usize,
    /// Append a warning entry to the event log for every referential fault.
    pub report_faults: bool,
    /// Simulated hour-of-day at clock zero. Clock zero is a Monday.
    pub start_hour: u8,
    pub rates: TransitionRates,
    pub geometry: RingGeometry,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed: 0x5EED,
            log_capacity: 100,
            report_faults: false,
            start_hour: 6,
            rates: TransitionRates::default(),
            geometry: RingGeometry::default(),
        }
    }
}

impl SimConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.log_capacity == 0 {
            return Err(ConfigError::ZeroLogCapacity);
        }
        if self.start_hour >= 24 {
            return Err(ConfigError::InvalidStartHour(self.start_hour));
        }
        self.rates.validate()?;
        self.geometry.validate()
    }
}

/// Per-unit-of-scaled-time rates driving the aircraft state machine.
///
/// Probabilities are multiplied by the scaled delta of the tick; kinematic
/// rates are multiplied by it as well (and by aircraft speed where noted).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransitionRates {
    /// Probability weight of an in-ring aircraft requesting a gate.
    pub descent_request: f64,
    /// Probability weight of an in-ring aircraft requesting a corridor.
    pub pipeline_request: f64,
    /// Probability weight of a landed aircraft departing.
    pub departure: f64,
    /// Degrees per unit time while circling, times aircraft speed.
    pub ring_angular_speed: f64,
    /// Max degrees per unit time a descending aircraft turns toward its gate.
    pub descent_turn: f64,
    /// Max distance per unit time a descending aircraft closes toward its gate.
    pub descent_closure: f64,
    /// Feet lost per unit time while descending.
    pub descent_rate: f64,
    /// Feet gained per unit time while ascending.
    pub climb_rate: f64,
    /// Distance per unit time an ascending aircraft widens toward the ring.
    pub climb_closure: f64,
    /// Corridor fraction per unit time, times aircraft speed.
    pub pipeline_progress: f64,
}

impl Default for TransitionRates {
    fn default() -> Self {
        Self {
            descent_request: 0.015,
            pipeline_request: 0.005,
            departure: 0.03,
            ring_angular_speed: 25.0,
            descent_turn: 15.0,
            descent_closure: 2.0,
            descent_rate: 200.0,
            climb_rate: 150.0,
            climb_closure: 1.0,
            pipeline_progress: 0.08,
        }
    }
}

impl TransitionRates {
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_positive("descent_request", self.descent_request)?;
        require_positive("pipeline_request", self.pipeline_request)?;
        require_positive("departure", self.departure)?;
        require_positive("ring_angular_speed", self.ring_angular_speed)?;
        require_positive("descent_turn", self.descent_turn)?;
        require_positive("descent_closure", self.descent_closure)?;
        require_positive("descent_rate", self.descent_rate)?;
        require_positive("climb_rate", self.climb_rate)?;
        require_positive("climb_closure", self.climb_closure)?;
        require_positive("pipeline_progress", self.pipeline_progress)
    }
}

/// Fixed geometry shared by every city's ring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RingGeometry {
    /// Radius of the holding ring.
    pub ring_radius: f64,
    /// Altitude floor in feet (on the ground).
    pub ground_altitude: f64,
    /// Altitude ceiling in feet (holding altitude).
    pub max_altitude: f64,
    /// A descending aircraft snaps to the gate angle once this close (degrees).
    pub angle_snap: f64,
    /// A descending aircraft snaps to the gate distance once this close.
    pub distance_snap: f64,
    /// Half-width of the angular window used for gate congestion (degrees).
    pub congestion_window: f64,
    /// More circling aircraft than this inside the window turns a gate yellow.
    pub congestion_threshold: u32,
}

impl Default for RingGeometry {
    fn default() -> Self {
        Self {
            ring_radius: 100.0,
            ground_altitude: 0.0,
            max_altitude: 3000.0,
            angle_snap: 1.0,
            distance_snap: 0.1,
            congestion_window: 15.0,
            congestion_threshold: 2,
        }
    }
}

impl RingGeometry {
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_positive("ring_radius", self.ring_radius)?;
        require_positive("angle_snap", self.angle_snap)?;
        require_positive("distance_snap", self.distance_snap)?;
        require_positive("congestion_window", self.congestion_window)?;
        if !(self.ground_altitude.is_finite()
            && self.max_altitude.is_finite()
            && self.max_altitude > self.ground_altitude)
        {
            return Err(ConfigError::InvertedAltitudes {
                ground: self.ground_altitude,
                ceiling: self.max_altitude,
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Scenario
// ---------------------------------------------------------------------------

/// One city: its name and the gates laid out around its ring center.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CityConfig {
    pub name: String,
    /// Number of gates, spaced evenly around the center.
    pub gates: u32,
    /// Radial distance of every gate from the ring center.
    pub gate_distance: f64,
    /// Angle of the first gate in degrees.
    #[serde(default)]
    pub gate_offset: f64,
}

/// A directional corridor between two cities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub from: CityId,
    pub to: CityId,
    pub capacity: u32,
    /// Nominal traversal time. Informational only.
    #[serde(default)]
    pub transit_time: f64,
}

/// Initial aircraft population.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FleetConfig {
    pub aircraft_per_city: u32,
    pub speed_min: f64,
    pub speed_max: f64,
}

impl Default for FleetConfig {
    fn default() -> Self {
        Self {
            aircraft_per_city: 12,
            speed_min: 0.8,
            speed_max: 1.2,
        }
    }
}

/// Complete description of a world at simulation start.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioConfig {
    pub name: String,
    pub cities: Vec<CityConfig>,
    #[serde(default)]
    pub pipelines: Vec<PipelineConfig>,
    #[serde(default)]
    pub fleet: FleetConfig,
}

impl ScenarioConfig {
    /// Two cities joined by a corridor in each direction.
    pub fn reference() -> Self {
        Self {
            name: "reference".to_string(),
            cities: vec![
                CityConfig {
                    name: "Harbor".to_string(),
                    gates: 8,
                    gate_distance: 60.0,
                    gate_offset: 0.0,
                },
                CityConfig {
                    name: "Summit".to_string(),
                    gates: 6,
                    gate_distance: 60.0,
                    gate_offset: 30.0,
                },
            ],
            pipelines: vec![
                PipelineConfig {
                    from: CityId(0),
                    to: CityId(1),
                    capacity: 4,
                    transit_time: 30.0,
                },
                PipelineConfig {
                    from: CityId(1),
                    to: CityId(0),
                    capacity: 4,
                    transit_time: 30.0,
                },
            ],
            fleet: FleetConfig::default(),
        }
    }

    /// Check the scenario against the ring geometry it will run in.
    pub fn validate(&self, geometry: &RingGeometry) -> Result<(), ConfigError> {
        if self.cities.is_empty() {
            return Err(ConfigError::NoCities);
        }
        for city in &self.cities {
            if city.gates == 0 {
                return Err(ConfigError::NoGates {
                    city: city.name.clone(),
                });
            }
            if !(city.gate_distance > 0.0 && city.gate_distance <= geometry.ring_radius) {
                return Err(ConfigError::GateOutsideRing {
                    city: city.name.clone(),
                    distance: city.gate_distance,
                    ring_radius: geometry.ring_radius,
                });
            }
        }

        let city_count = self.cities.len();
        for (index, pipeline) in self.pipelines.iter().enumerate() {
            for city in [pipeline.from, pipeline.to] {
                if city.index() >= city_count {
                    return Err(ConfigError::UnknownCity { index, city });
                }
            }
            if pipeline.from == pipeline.to {
                return Err(ConfigError::LoopPipeline {
                    index,
                    city: pipeline.from,
                });
            }
            if pipeline.capacity == 0 {
                return Err(ConfigError::ZeroCapacity { index });
            }
        }

        let fleet = &self.fleet;
        if !(fleet.speed_min > 0.0
            && fleet.speed_min <= fleet.speed_max
            && fleet.speed_max.is_finite())
        {
            return Err(ConfigError::InvalidSpeedRange {
                min: fleet.speed_min,
                max: fleet.speed_max,
            });
        }
        Ok(())
    }
}

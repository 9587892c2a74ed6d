//! Shared test helpers for integration tests and benchmarks.
//!
//! Gated behind `#[cfg(any(test, feature = "test-utils"))]` so these helpers
//! are available in unit tests, integration tests, and benchmarks (via the
//! `test-utils` feature).

use crate::aircraft::{Aircraft, FlightState};
use crate::config::{CityConfig, FleetConfig, PipelineConfig, ScenarioConfig, SimConfig};
use crate::engine::Engine;
use crate::id::{AircraftId, CityId, GateId, PipelineId};
use crate::rng::RandomSource;

// ===========================================================================
// Scripted randomness
// ===========================================================================

/// A random source that replays fixed `f64` draws in order, repeating the
/// last one once exhausted.
#[derive(Debug, Clone)]
pub struct ScriptedRng {
    draws: Vec<u64>,
    cursor: usize,
}

impl ScriptedRng {
    pub fn new(draws: &[f64]) -> Self {
        assert!(!draws.is_empty(), "ScriptedRng needs at least one draw");
        Self {
            draws: draws.iter().map(|&d| encode_draw(d)).collect(),
            cursor: 0,
        }
    }

    /// Every `chance(p)` with `p > 0` succeeds; every pick takes the first
    /// option.
    pub fn always() -> Self {
        Self::new(&[0.0])
    }

    /// Every `chance(p)` with `p < 1` fails.
    pub fn never() -> Self {
        Self::new(&[0.999_999])
    }

    /// Number of draws consumed so far.
    pub fn consumed(&self) -> usize {
        self.cursor
    }
}

/// Map a draw in `[0, 1)` onto the raw value `next_f64` turns back into it.
fn encode_draw(draw: f64) -> u64 {
    let clamped = draw.clamp(0.0, 1.0 - f64::EPSILON);
    ((clamped * (1u64 << 53) as f64) as u64) << 11
}

impl RandomSource for ScriptedRng {
    fn next_u64(&mut self) -> u64 {
        let index = self.cursor.min(self.draws.len() - 1);
        self.cursor += 1;
        self.draws[index]
    }

    fn reseed(&mut self, _seed: u64) {
        self.cursor = 0;
    }

    fn fingerprint(&self) -> u64 {
        self.cursor as u64
    }
}

// ===========================================================================
// Scenario builders
// ===========================================================================

pub fn city(name: &str, gates: u32) -> CityConfig {
    CityConfig {
        name: name.to_string(),
        gates,
        gate_distance: 60.0,
        gate_offset: 0.0,
    }
}

pub fn corridor(from: u32, to: u32, capacity: u32) -> PipelineConfig {
    PipelineConfig {
        from: CityId(from),
        to: CityId(to),
        capacity,
        transit_time: 30.0,
    }
}

/// A scenario with no initial fleet.
pub fn empty_scenario(cities: Vec<CityConfig>, pipelines: Vec<PipelineConfig>) -> ScenarioConfig {
    ScenarioConfig {
        name: "test".to_string(),
        cities,
        pipelines,
        fleet: FleetConfig {
            aircraft_per_city: 0,
            speed_min: 1.0,
            speed_max: 1.0,
        },
    }
}

/// Two cities ("Alpha" with `gates` gates, "Beta" with 4) and one corridor
/// each way with the given capacity. No aircraft.
pub fn two_city_scenario(gates: u32, capacity: u32) -> ScenarioConfig {
    empty_scenario(
        vec![city("Alpha", gates), city("Beta", 4)],
        vec![corridor(0, 1, capacity), corridor(1, 0, capacity)],
    )
}

/// An engine over `scenario` with default tuning and a scripted source.
pub fn scripted_engine(scenario: ScenarioConfig, rng: ScriptedRng) -> Engine {
    match Engine::with_rng(SimConfig::default(), scenario, Box::new(rng)) {
        Ok(engine) => engine,
        Err(e) => panic!("test scenario should be valid: {e}"),
    }
}

/// An engine over `scenario` with a seeded [`SimRng`](crate::rng::SimRng).
pub fn seeded_engine(scenario: ScenarioConfig, seed: u64) -> Engine {
    let config = SimConfig {
        seed,
        ..SimConfig::default()
    };
    match Engine::new(config, scenario) {
        Ok(engine) => engine,
        Err(e) => panic!("test scenario should be valid: {e}"),
    }
}

// ===========================================================================
// Aircraft builders
// ===========================================================================

/// A speed-1 aircraft circling `city` at `angle`, at the default ring.
pub fn ring_aircraft(city: u32, angle: f64) -> Aircraft {
    Aircraft::circling(format!("T{city}"), CityId(city), angle, 100.0, 3000.0, 1.0)
}

pub fn add_circling(engine: &mut Engine, city: u32, angle: f64) -> AircraftId {
    engine.insert_aircraft(ring_aircraft(city, angle))
}

/// Insert an aircraft already descending toward `gate` at `altitude`.
pub fn add_descending(engine: &mut Engine, city: u32, gate: u32, altitude: f64) -> AircraftId {
    let aircraft = Aircraft {
        altitude,
        state: FlightState::Descending {
            city: CityId(city),
            gate: GateId(gate),
            since: 0.0,
        },
        ..ring_aircraft(city, 0.0)
    };
    engine.insert_aircraft(aircraft)
}

/// Insert an aircraft parked at `gate`.
pub fn add_landed(engine: &mut Engine, city: u32, gate: u32) -> AircraftId {
    let (angle, distance) = engine
        .world()
        .gate(GateId(gate))
        .map(|g| (g.angle, g.distance))
        .unwrap_or((0.0, 60.0));
    let aircraft = Aircraft {
        angle,
        distance,
        altitude: 0.0,
        state: FlightState::Landed {
            city: CityId(city),
            gate: GateId(gate),
        },
        ..ring_aircraft(city, angle)
    };
    engine.insert_aircraft(aircraft)
}

/// Insert an aircraft in `pipeline` at `progress`.
pub fn add_in_pipeline(engine: &mut Engine, pipeline: u32, progress: f64) -> AircraftId {
    let aircraft = Aircraft {
        state: FlightState::InPipeline {
            pipeline: PipelineId(pipeline),
            progress,
        },
        ..ring_aircraft(0, 0.0)
    };
    engine.insert_aircraft(aircraft)
}

// ===========================================================================
// Invariant checks
// ===========================================================================

/// Panics if two aircraft hold the same gate, a corridor is over capacity,
/// or an altitude leaves the configured band.
pub fn assert_world_invariants(engine: &Engine) {
    let world = engine.world();
    let geometry = &engine.config().geometry;
    let mut held = std::collections::HashSet::new();
    for (id, aircraft) in world.iter_aircraft() {
        if let Some(gate) = aircraft.target_gate() {
            assert!(held.insert(gate), "gate {gate} held twice (second holder {id:?})");
        }
        assert!(
            aircraft.altitude >= geometry.ground_altitude
                && aircraft.altitude <= geometry.max_altitude,
            "altitude {} out of band for {id:?}",
            aircraft.altitude
        );
        if let Some(progress) = aircraft.pipeline_progress() {
            assert!((0.0..1.0).contains(&progress), "progress {progress} out of range");
        }
    }
    for pipeline in world.pipelines() {
        let count = world.pipeline_count(pipeline.id).unwrap_or(0);
        assert!(
            count <= pipeline.capacity,
            "pipeline {} holds {count} > capacity {}",
            pipeline.id,
            pipeline.capacity
        );
    }
}

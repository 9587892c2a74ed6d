//! Adversarial input tests for the Ringway engine.
//!
//! Tests edge cases that should either return errors at construction or be
//! handled gracefully at run time without panics.

use ringway_core::aircraft::{FlightState, FlightStatus};
use ringway_core::config::{CityConfig, FleetConfig, ScenarioConfig, SimConfig};
use ringway_core::engine::Engine;
use ringway_core::error::{ConfigError, ControlError};
use ringway_core::id::{CityId, GateId, PipelineId};
use ringway_core::test_utils::*;

fn rejects(config: SimConfig, scenario: ScenarioConfig) -> ConfigError {
    match Engine::new(config, scenario) {
        Ok(_) => panic!("configuration should have been rejected"),
        Err(e) => e,
    }
}

// ===========================================================================
// Construction
// ===========================================================================

#[test]
fn city_without_gates_is_rejected() {
    let err = rejects(
        SimConfig::default(),
        empty_scenario(vec![city("Alpha", 2), city("Empty", 0)], vec![]),
    );
    assert_eq!(
        err,
        ConfigError::NoGates {
            city: "Empty".into()
        }
    );
}

#[test]
fn corridor_to_unknown_city_is_rejected() {
    let err = rejects(
        SimConfig::default(),
        empty_scenario(vec![city("Alpha", 2)], vec![corridor(0, 3, 1)]),
    );
    assert_eq!(
        err,
        ConfigError::UnknownCity {
            index: 0,
            city: CityId(3)
        }
    );
}

#[test]
fn loop_and_zero_capacity_corridors_are_rejected() {
    let cities = vec![city("Alpha", 1), city("Beta", 1)];
    assert!(matches!(
        rejects(
            SimConfig::default(),
            empty_scenario(cities.clone(), vec![corridor(1, 1, 2)])
        ),
        ConfigError::LoopPipeline { index: 0, .. }
    ));
    assert!(matches!(
        rejects(
            SimConfig::default(),
            empty_scenario(cities, vec![corridor(0, 1, 2), corridor(1, 0, 0)])
        ),
        ConfigError::ZeroCapacity { index: 1 }
    ));
}

#[test]
fn negative_and_nan_rates_are_rejected() {
    for value in [-0.5, f64::NAN, f64::INFINITY] {
        let mut config = SimConfig::default();
        config.rates.climb_rate = value;
        assert!(matches!(
            rejects(config, ScenarioConfig::reference()),
            ConfigError::NonPositiveRate {
                name: "climb_rate",
                ..
            }
        ));
    }
}

#[test]
fn inverted_altitudes_are_rejected() {
    let mut config = SimConfig::default();
    config.geometry.ground_altitude = 3000.0;
    config.geometry.max_altitude = 100.0;
    assert!(matches!(
        rejects(config, ScenarioConfig::reference()),
        ConfigError::InvertedAltitudes { .. }
    ));
}

#[test]
fn infinite_ceiling_is_rejected() {
    let mut config = SimConfig::default();
    config.geometry.max_altitude = f64::INFINITY;
    assert!(matches!(
        rejects(config, ScenarioConfig::reference()),
        ConfigError::InvertedAltitudes { .. }
    ));
}

#[test]
fn gate_beyond_ring_is_rejected() {
    let scenario = empty_scenario(
        vec![CityConfig {
            gate_distance: 150.0,
            ..city("Alpha", 2)
        }],
        vec![],
    );
    assert!(matches!(
        rejects(SimConfig::default(), scenario),
        ConfigError::GateOutsideRing { .. }
    ));
}

#[test]
fn inverted_speed_range_is_rejected() {
    let mut scenario = ScenarioConfig::reference();
    scenario.fleet = FleetConfig {
        aircraft_per_city: 3,
        speed_min: 2.0,
        speed_max: 1.0,
    };
    assert!(matches!(
        rejects(SimConfig::default(), scenario),
        ConfigError::InvalidSpeedRange { .. }
    ));
}

#[test]
fn zero_log_capacity_is_rejected() {
    let config = SimConfig {
        log_capacity: 0,
        ..SimConfig::default()
    };
    assert_eq!(
        rejects(config, ScenarioConfig::reference()),
        ConfigError::ZeroLogCapacity
    );
}

// ===========================================================================
// Run time
// ===========================================================================

#[test]
fn non_finite_speed_is_refused() {
    let mut engine = seeded_engine(ScenarioConfig::reference(), 1);
    assert_eq!(
        engine.set_speed(f64::INFINITY),
        Err(ControlError::InvalidSpeed(f64::INFINITY))
    );
    assert_eq!(engine.speed(), 1.0);
}

#[test]
fn overflowing_speed_times_delta_is_a_no_op() {
    let mut engine = seeded_engine(ScenarioConfig::reference(), 77);
    engine.set_speed(1e200).unwrap();
    let before = engine.state_hash();

    let report = engine.tick(1e200);

    assert!(!report.ran);
    assert_eq!(engine.state_hash(), before);
    assert!(engine.clock_ms().is_finite());
    assert_world_invariants(&engine);
}

#[test]
fn huge_delta_does_not_break_invariants() {
    let mut engine = seeded_engine(ScenarioConfig::reference(), 77);
    for _ in 0..20 {
        engine.tick(500.0);
        assert_world_invariants(&engine);
    }
}

#[test]
fn tiny_deltas_still_advance_the_clock() {
    let mut engine = seeded_engine(ScenarioConfig::reference(), 77);
    for _ in 0..1000 {
        engine.tick(1e-6);
    }
    assert!(engine.clock_ms() > 0.0);
    assert_world_invariants(&engine);
}

#[test]
fn removing_aircraft_between_ticks_is_safe() {
    let mut engine = seeded_engine(ScenarioConfig::reference(), 5);
    engine.set_speed(4.0).unwrap();
    let mut step = 0;
    while engine.world().aircraft_count() > 0 {
        engine.tick(1.0);
        if step % 3 == 0 {
            let id = engine.world().aircraft_ids()[0];
            assert!(engine.remove_aircraft(id).is_some());
        }
        assert_world_invariants(&engine);
        step += 1;
    }
    assert!(engine.snapshot().aircraft.is_empty());
}

#[test]
fn stale_id_is_ignored() {
    let mut engine = seeded_engine(ScenarioConfig::reference(), 5);
    let id = engine.world().aircraft_ids()[0];
    let removed = engine.remove_aircraft(id).unwrap();
    assert!(engine.remove_aircraft(id).is_none());
    assert!(engine.update_aircraft(id, removed).is_none());
    assert!(engine.world().aircraft(id).is_none());
}

#[test]
fn dangling_references_are_carried_over() {
    let scenario = empty_scenario(vec![city("Alpha", 1)], vec![]);
    let mut engine = scripted_engine(scenario, ScriptedRng::always());
    let lost_gate = add_descending(&mut engine, 0, 40, 800.0);
    let lost_pipeline = add_in_pipeline(&mut engine, 3, 0.99);

    for _ in 0..10 {
        let report = engine.tick(1.0);
        assert_eq!(report.faults, 2);
    }

    let world = engine.world();
    assert_eq!(
        world.aircraft(lost_gate).unwrap().state,
        FlightState::Descending {
            city: CityId(0),
            gate: GateId(40),
            since: 0.0
        }
    );
    assert_eq!(world.aircraft(lost_gate).unwrap().altitude, 800.0);
    assert_eq!(
        world.aircraft(lost_pipeline).unwrap().pipeline(),
        Some(PipelineId(3))
    );
}

#[test]
fn preloaded_double_booking_does_not_spread() {
    // Two aircraft forced onto the same gate from outside. The engine must
    // not hand the gate to anyone else while either holds it.
    let scenario = empty_scenario(vec![city("Alpha", 1)], vec![]);
    let mut engine = scripted_engine(scenario, ScriptedRng::always());
    add_descending(&mut engine, 0, 0, 3000.0);
    add_descending(&mut engine, 0, 0, 3000.0);
    let circler = add_circling(&mut engine, 0, 0.0);

    engine.tick(1.0);

    assert_eq!(
        engine.world().aircraft(circler).unwrap().status(),
        FlightStatus::InRing
    );
}

#[test]
fn reset_after_external_edits_restores_fleet() {
    let mut engine = seeded_engine(ScenarioConfig::reference(), 8);
    let initial = engine.state_hash();
    add_circling(&mut engine, 1, 10.0);
    let first = engine.world().aircraft_ids()[0];
    engine.remove_aircraft(first);

    engine.reset();

    assert_eq!(engine.world().aircraft_count(), 24);
    assert_eq!(engine.state_hash(), initial);
}

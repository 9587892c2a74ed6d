//! Gate and pipeline status derivation.
//!
//! Runs after every aircraft has advanced and rebuilds the cached views on
//! [`World`] from the post-tick population. Nothing else writes them.
//!
//! Congestion counts only in-ring aircraft whose current ring city is the
//! gate's city; corridor traffic never counts toward any gate.

use crate::aircraft::FlightState;
use crate::config::RingGeometry;
use crate::geometry::angular_distance;
use crate::id::AircraftId;
use crate::world::{GateSignal, GateView, World};

/// Recompute every gate view and every pipeline count.
pub fn derive(world: &mut World, geometry: &RingGeometry) {
    let gate_views = derive_gates(world, geometry);
    let pipeline_counts = derive_pipeline_counts(world);
    world.gate_views = gate_views;
    world.pipeline_counts = pipeline_counts;
}

fn derive_gates(world: &World, geometry: &RingGeometry) -> Vec<GateView> {
    let mut holders: Vec<Option<AircraftId>> = vec![None; world.gates().len()];
    let mut circling = Vec::new();

    for (id, aircraft) in world.iter_aircraft() {
        match aircraft.state {
            FlightState::Descending { gate, .. } | FlightState::Landed { gate, .. } => {
                if let Some(slot) = holders.get_mut(gate.index()) {
                    // First holder in processing order wins the view.
                    if slot.is_none() {
                        *slot = Some(id);
                    }
                }
            }
            FlightState::InRing { city } => circling.push((city, aircraft.angle)),
            _ => {}
        }
    }

    world
        .gates()
        .iter()
        .zip(holders)
        .map(|(gate, holder)| {
            let queue_count = circling
                .iter()
                .filter(|(city, angle)| {
                    *city == gate.city
                        && angular_distance(*angle, gate.angle) < geometry.congestion_window
                })
                .count() as u32;
            let signal = if holder.is_some() {
                GateSignal::Red
            } else if queue_count > geometry.congestion_threshold {
                GateSignal::Yellow
            } else {
                GateSignal::Green
            };
            GateView {
                signal,
                assigned: holder,
                queue_count,
            }
        })
        .collect()
}

fn derive_pipeline_counts(world: &World) -> Vec<u32> {
    let mut counts = vec![0u32; world.pipelines().len()];
    for (_, aircraft) in world.iter_aircraft() {
        if let Some(pipeline) = aircraft.pipeline() {
            if let Some(count) = counts.get_mut(pipeline.index()) {
                *count += 1;
            }
        }
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aircraft::Aircraft;
    use crate::id::{CityId, GateId, PipelineId};
    use crate::test_utils::*;

    fn world() -> World {
        // Alpha gates at 0, 90, 180, 270.
        World::from_scenario(&two_city_scenario(4, 3))
    }

    #[test]
    fn quiet_gate_is_green() {
        let mut w = world();
        w.insert_aircraft(ring_aircraft(0, 45.0));
        derive(&mut w, &RingGeometry::default());
        let view = w.gate_view(GateId(0)).unwrap();
        assert_eq!(view.signal, GateSignal::Green);
        assert_eq!(view.queue_count, 0);
        assert_eq!(view.assigned, None);
    }

    #[test]
    fn three_nearby_circlers_turn_gate_yellow() {
        let mut w = world();
        for angle in [355.0, 5.0, 10.0] {
            w.insert_aircraft(ring_aircraft(0, angle));
        }
        derive(&mut w, &RingGeometry::default());
        let view = w.gate_view(GateId(0)).unwrap();
        assert_eq!(view.queue_count, 3);
        assert_eq!(view.signal, GateSignal::Yellow);
    }

    #[test]
    fn two_nearby_circlers_stay_green() {
        let mut w = world();
        for angle in [355.0, 14.9] {
            w.insert_aircraft(ring_aircraft(0, angle));
        }
        // Exactly on the window edge does not count.
        w.insert_aircraft(ring_aircraft(0, 15.0));
        derive(&mut w, &RingGeometry::default());
        let view = w.gate_view(GateId(0)).unwrap();
        assert_eq!(view.queue_count, 2);
        assert_eq!(view.signal, GateSignal::Green);
    }

    #[test]
    fn other_city_traffic_does_not_count() {
        let mut w = world();
        for angle in [0.0, 1.0, 2.0] {
            w.insert_aircraft(ring_aircraft(1, angle));
        }
        derive(&mut w, &RingGeometry::default());
        assert_eq!(w.gate_view(GateId(0)).unwrap().queue_count, 0);
    }

    #[test]
    fn held_gate_is_red_and_still_reports_queue() {
        let mut w = world();
        let holder = w.insert_aircraft(
            ring_aircraft(0, 0.0).cleared_to(CityId(0), GateId(1), 0.0, 0.0),
        );
        for angle in [85.0, 90.0, 95.0] {
            w.insert_aircraft(ring_aircraft(0, angle));
        }
        derive(&mut w, &RingGeometry::default());
        let view = w.gate_view(GateId(1)).unwrap();
        assert_eq!(view.signal, GateSignal::Red);
        assert_eq!(view.assigned, Some(holder));
        assert_eq!(view.queue_count, 3);
    }

    #[test]
    fn released_gate_is_not_red() {
        let mut w = world();
        let a = ring_aircraft(0, 0.0).cleared_to(CityId(0), GateId(2), 0.0, 0.0);
        let id = w.insert_aircraft(a.clone());
        derive(&mut w, &RingGeometry::default());
        assert_eq!(w.gate_view(GateId(2)).unwrap().signal, GateSignal::Red);

        w.update_aircraft(id, a.lifted_off(CityId(0)));
        derive(&mut w, &RingGeometry::default());
        assert_ne!(w.gate_view(GateId(2)).unwrap().signal, GateSignal::Red);
    }

    #[test]
    fn pipeline_counts_are_exact() {
        let mut w = world();
        let base: Aircraft = ring_aircraft(0, 0.0);
        w.insert_aircraft(base.entered(PipelineId(0), 0.0));
        w.insert_aircraft(base.entered(PipelineId(0), 0.0));
        w.insert_aircraft(base.entered(PipelineId(1), 0.0));
        w.insert_aircraft(base.entered(PipelineId(5), 0.0));
        derive(&mut w, &RingGeometry::default());
        assert_eq!(w.pipeline_count(PipelineId(0)), Some(2));
        assert_eq!(w.pipeline_count(PipelineId(1)), Some(1));
        assert_eq!(w.pipeline_count(PipelineId(5)), None);
    }
}

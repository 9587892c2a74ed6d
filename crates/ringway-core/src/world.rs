//! The entity registry: canonical collections of cities, gates, pipelines
//! and aircraft.
//!
//! Cities, gates and pipelines are catalogs created once from a
//! [`ScenarioConfig`] and never change. Aircraft live in a generational
//! [`SlotMap`] and are iterated in stable insertion order, which is the
//! order the tick pass processes them in.
//!
//! Gate signals and pipeline occupancy are cached projections. Only the
//! status deriver writes them.

use serde::{Deserialize, Serialize};
use slotmap::SlotMap;

use crate::aircraft::Aircraft;
use crate::config::{FleetConfig, RingGeometry, ScenarioConfig};
use crate::id::{AircraftId, CityId, GateId, PipelineId};
use crate::rng::RandomSource;

// ---------------------------------------------------------------------------
// Catalog entries
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct City {
    pub id: CityId,
    pub name: String,
}

/// A single-occupancy landing position, fixed relative to its city center.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gate {
    pub id: GateId,
    pub city: CityId,
    /// Angular sector index within the city, 0-based.
    pub sector: u32,
    pub angle: f64,
    pub distance: f64,
}

/// A directional, capacity-bounded corridor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pipeline {
    pub id: PipelineId,
    pub from: CityId,
    pub to: CityId,
    pub capacity: u32,
    pub transit_time: f64,
}

// ---------------------------------------------------------------------------
// Derived views
// ---------------------------------------------------------------------------

/// Traffic-light status of a gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GateSignal {
    /// Free with little nearby traffic.
    #[default]
    Green,
    /// Free but locally congested.
    Yellow,
    /// Held by a descending or landed aircraft.
    Red,
}

/// Derived per-gate state, recomputed after every tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GateView {
    pub signal: GateSignal,
    pub assigned: Option<AircraftId>,
    /// Circling aircraft near the gate. Observability only.
    pub queue_count: u32,
}

// ---------------------------------------------------------------------------
// World
// ---------------------------------------------------------------------------

/// Owns every entity in the simulation.
#[derive(Debug, Clone)]
pub struct World {
    cities: Vec<City>,
    gates: Vec<Gate>,
    pipelines: Vec<Pipeline>,
    aircraft: SlotMap<AircraftId, Aircraft>,
    /// Insertion order of live aircraft.
    order: Vec<AircraftId>,
    pub(crate) gate_views: Vec<GateView>,
    pub(crate) pipeline_counts: Vec<u32>,
}

impl World {
    /// Build the city, gate and pipeline catalogs. No aircraft yet.
    ///
    /// Gates are spaced evenly around each city starting at its offset.
    /// The scenario is assumed to be validated.
    pub fn from_scenario(scenario: &ScenarioConfig) -> Self {
        let mut cities = Vec::with_capacity(scenario.cities.len());
        let mut gates = Vec::new();

        for (index, city) in scenario.cities.iter().enumerate() {
            let city_id = CityId(index as u32);
            cities.push(City {
                id: city_id,
                name: city.name.clone(),
            });
            let spacing = 360.0 / city.gates as f64;
            for sector in 0..city.gates {
                gates.push(Gate {
                    id: GateId(gates.len() as u32),
                    city: city_id,
                    sector,
                    angle: crate::geometry::wrap_degrees(
                        city.gate_offset + spacing * sector as f64,
                    ),
                    distance: city.gate_distance,
                });
            }
        }

        let pipelines: Vec<Pipeline> = scenario
            .pipelines
            .iter()
            .enumerate()
            .map(|(index, p)| Pipeline {
                id: PipelineId(index as u32),
                from: p.from,
                to: p.to,
                capacity: p.capacity,
                transit_time: p.transit_time,
            })
            .collect();

        Self {
            gate_views: vec![GateView::default(); gates.len()],
            pipeline_counts: vec![0; pipelines.len()],
            cities,
            gates,
            pipelines,
            aircraft: SlotMap::with_key(),
            order: Vec::new(),
        }
    }

    /// Add the initial circling population: `aircraft_per_city` aircraft at
    /// every city, with random ring angles and speeds.
    pub fn spawn_fleet(
        &mut self,
        fleet: &FleetConfig,
        geometry: &RingGeometry,
        rng: &mut dyn RandomSource,
    ) {
        for city_index in 0..self.cities.len() {
            let city = self.cities[city_index].id;
            let prefix = callsign_prefix(&self.cities[city_index].name);
            for n in 1..=fleet.aircraft_per_city {
                let angle = rng.range(0.0, 360.0);
                let speed = if fleet.speed_max > fleet.speed_min {
                    rng.range(fleet.speed_min, fleet.speed_max)
                } else {
                    fleet.speed_min
                };
                self.insert_aircraft(Aircraft::circling(
                    format!("{prefix}{n:03}"),
                    city,
                    angle,
                    geometry.ring_radius,
                    geometry.max_altitude,
                    speed,
                ));
            }
        }
    }

    // -----------------------------------------------------------------------
    // Aircraft
    // -----------------------------------------------------------------------

    pub fn insert_aircraft(&mut self, aircraft: Aircraft) -> AircraftId {
        let id = self.aircraft.insert(aircraft);
        self.order.push(id);
        id
    }

    pub fn aircraft(&self, id: AircraftId) -> Option<&Aircraft> {
        self.aircraft.get(id)
    }

    pub fn aircraft_mut(&mut self, id: AircraftId) -> Option<&mut Aircraft> {
        self.aircraft.get_mut(id)
    }

    /// Replace an aircraft's value, returning the previous one.
    pub fn update_aircraft(&mut self, id: AircraftId, value: Aircraft) -> Option<Aircraft> {
        self.aircraft
            .get_mut(id)
            .map(|slot| std::mem::replace(slot, value))
    }

    pub fn remove_aircraft(&mut self, id: AircraftId) -> Option<Aircraft> {
        let removed = self.aircraft.remove(id)?;
        self.order.retain(|&other| other != id);
        Some(removed)
    }

    /// Live aircraft ids in processing order.
    pub fn aircraft_ids(&self) -> &[AircraftId] {
        &self.order
    }

    /// Live aircraft in processing order.
    pub fn iter_aircraft(&self) -> impl Iterator<Item = (AircraftId, &Aircraft)> + '_ {
        self.order
            .iter()
            .filter_map(move |&id| self.aircraft.get(id).map(|a| (id, a)))
    }

    pub fn aircraft_count(&self) -> usize {
        self.aircraft.len()
    }

    // -----------------------------------------------------------------------
    // Catalogs
    // -----------------------------------------------------------------------

    pub fn city(&self, id: CityId) -> Option<&City> {
        self.cities.get(id.index())
    }

    pub fn city_by_name(&self, name: &str) -> Option<&City> {
        self.cities.iter().find(|c| c.name == name)
    }

    pub fn cities(&self) -> &[City] {
        &self.cities
    }

    pub fn gate(&self, id: GateId) -> Option<&Gate> {
        self.gates.get(id.index())
    }

    pub fn gates(&self) -> &[Gate] {
        &self.gates
    }

    pub fn gates_at(&self, city: CityId) -> impl Iterator<Item = &Gate> + '_ {
        self.gates.iter().filter(move |g| g.city == city)
    }

    pub fn pipeline(&self, id: PipelineId) -> Option<&Pipeline> {
        self.pipelines.get(id.index())
    }

    pub fn pipelines(&self) -> &[Pipeline] {
        &self.pipelines
    }

    /// Corridors leaving `city`, in id order.
    pub fn pipelines_from(&self, city: CityId) -> impl Iterator<Item = &Pipeline> + '_ {
        self.pipelines.iter().filter(move |p| p.from == city)
    }

    // -----------------------------------------------------------------------
    // Derived views
    // -----------------------------------------------------------------------

    pub fn gate_view(&self, id: GateId) -> Option<&GateView> {
        self.gate_views.get(id.index())
    }

    /// Authoritative occupancy as of the last completed derivation.
    pub fn pipeline_count(&self, id: PipelineId) -> Option<u32> {
        self.pipeline_counts.get(id.index()).copied()
    }
}

/// Up to three uppercase alphanumerics from a city name, "RW" if none.
fn callsign_prefix(name: &str) -> String {
    let prefix: String = name
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .take(3)
        .collect::<String>()
        .to_ascii_uppercase();
    if prefix.is_empty() {
        "RW".to_string()
    } else {
        prefix
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::SimRng;

    fn reference_world() -> World {
        World::from_scenario(&ScenarioConfig::reference())
    }

    #[test]
    fn catalogs_follow_scenario() {
        let world = reference_world();
        assert_eq!(world.cities().len(), 2);
        assert_eq!(world.gates().len(), 14);
        assert_eq!(world.pipelines().len(), 2);
        assert_eq!(world.gates_at(CityId(1)).count(), 6);
        assert_eq!(world.city_by_name("Summit").map(|c| c.id), Some(CityId(1)));
    }

    #[test]
    fn gates_spaced_evenly_from_offset() {
        let world = reference_world();
        let summit: Vec<f64> = world.gates_at(CityId(1)).map(|g| g.angle).collect();
        assert_eq!(summit, vec![30.0, 90.0, 150.0, 210.0, 270.0, 330.0]);
        let sectors: Vec<u32> = world.gates_at(CityId(1)).map(|g| g.sector).collect();
        assert_eq!(sectors, vec![0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn pipelines_from_filters_by_origin() {
        let world = reference_world();
        let from_harbor: Vec<PipelineId> = world.pipelines_from(CityId(0)).map(|p| p.id).collect();
        assert_eq!(from_harbor, vec![PipelineId(0)]);
    }

    #[test]
    fn fleet_spawns_circling_at_ceiling() {
        let mut world = reference_world();
        let geometry = RingGeometry::default();
        let mut rng = SimRng::new(1);
        world.spawn_fleet(&FleetConfig::default(), &geometry, &mut rng);
        assert_eq!(world.aircraft_count(), 24);
        for (_, a) in world.iter_aircraft() {
            assert_eq!(a.altitude, geometry.max_altitude);
            assert_eq!(a.distance, geometry.ring_radius);
            assert!((0.0..360.0).contains(&a.angle));
            assert!((0.8..1.2).contains(&a.speed));
        }
        let first = world.iter_aircraft().next().map(|(_, a)| a.callsign.clone());
        assert_eq!(first.as_deref(), Some("HAR001"));
    }

    #[test]
    fn insert_update_remove() {
        let mut world = reference_world();
        let a = Aircraft::circling("X1", CityId(0), 0.0, 100.0, 3000.0, 1.0);
        let id = world.insert_aircraft(a.clone());
        assert_eq!(world.aircraft(id), Some(&a));

        let moved = Aircraft { angle: 90.0, ..a.clone() };
        let previous = world.update_aircraft(id, moved);
        assert_eq!(previous, Some(a));
        assert_eq!(world.aircraft(id).map(|a| a.angle), Some(90.0));

        if let Some(a) = world.aircraft_mut(id) {
            a.speed = 2.0;
        }
        assert_eq!(world.aircraft(id).map(|a| a.speed), Some(2.0));

        assert!(world.remove_aircraft(id).is_some());
        assert!(world.aircraft(id).is_none());
        assert!(world.aircraft_ids().is_empty());
        assert!(world.remove_aircraft(id).is_none());
    }

    #[test]
    fn iteration_follows_insertion_order() {
        let mut world = reference_world();
        let ids: Vec<AircraftId> = (0..5)
            .map(|n| {
                world.insert_aircraft(Aircraft::circling(
                    format!("A{n}"),
                    CityId(0),
                    0.0,
                    100.0,
                    3000.0,
                    1.0,
                ))
            })
            .collect();
        world.remove_aircraft(ids[1]);
        let reused =
            world.insert_aircraft(Aircraft::circling("B", CityId(0), 0.0, 100.0, 3000.0, 1.0));
        let order: Vec<AircraftId> = world.iter_aircraft().map(|(id, _)| id).collect();
        assert_eq!(order, vec![ids[0], ids[2], ids[3], ids[4], reused]);
    }

    #[test]
    fn callsign_prefix_handles_short_names() {
        assert_eq!(callsign_prefix("Harbor"), "HAR");
        assert_eq!(callsign_prefix("x"), "X");
        assert_eq!(callsign_prefix("--"), "RW");
    }
}

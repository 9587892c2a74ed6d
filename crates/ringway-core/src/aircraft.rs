//! Aircraft entities and their flight states.
//!
//! A [`FlightState`] variant carries exactly the fields meaningful in that
//! state: only descending and landed aircraft hold a gate, only in-pipeline
//! aircraft hold a corridor and progress, and every other state names the
//! city whose ring the aircraft belongs to. Transitions go through the
//! constructors on [`Aircraft`], each of which produces a fully specified
//! next value.

use serde::{Deserialize, Serialize};

use crate::id::{CityId, GateId, PipelineId};
use crate::world::Gate;

/// Discriminant tag for flight states, used by snapshots and filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlightStatus {
    InRing,
    Descending,
    Landed,
    Ascending,
    InPipeline,
}

impl FlightStatus {
    pub const ALL: [FlightStatus; 5] = [
        FlightStatus::InRing,
        FlightStatus::Descending,
        FlightStatus::Landed,
        FlightStatus::Ascending,
        FlightStatus::InPipeline,
    ];
}

/// Where an aircraft is in its cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FlightState {
    /// Circling the city's holding ring.
    InRing { city: CityId },
    /// Converging on a held gate. `since` is the clock at descent start.
    Descending {
        city: CityId,
        gate: GateId,
        since: f64,
    },
    /// On the ground, holding the gate.
    Landed { city: CityId, gate: GateId },
    /// Climbing back out to the ring.
    Ascending { city: CityId },
    /// Travelling a corridor. `progress` is in `[0, 1)`.
    InPipeline { pipeline: PipelineId, progress: f64 },
}

impl FlightState {
    pub fn status(&self) -> FlightStatus {
        match self {
            FlightState::InRing { .. } => FlightStatus::InRing,
            FlightState::Descending { .. } => FlightStatus::Descending,
            FlightState::Landed { .. } => FlightStatus::Landed,
            FlightState::Ascending { .. } => FlightStatus::Ascending,
            FlightState::InPipeline { .. } => FlightStatus::InPipeline,
        }
    }
}

/// A unit of air traffic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Aircraft {
    pub callsign: String,
    /// The city this aircraft was created at.
    pub home_city: CityId,
    /// The last city this aircraft was associated with. Survives corridor
    /// transits, so an in-pipeline aircraft still knows where it came from.
    pub origin_city: CityId,
    /// Degrees in `[0, 360)` around the city center.
    pub angle: f64,
    pub distance: f64,
    /// Feet, within `[ground, ceiling]` of the ring geometry.
    pub altitude: f64,
    /// Multiplier on ring and corridor rates.
    pub speed: f64,
    pub state: FlightState,
}

impl Aircraft {
    /// A new aircraft circling `city` at the given ring position.
    pub fn circling(
        callsign: impl Into<String>,
        city: CityId,
        angle: f64,
        ring_radius: f64,
        ceiling: f64,
        speed: f64,
    ) -> Self {
        Self {
            callsign: callsign.into(),
            home_city: city,
            origin_city: city,
            angle,
            distance: ring_radius,
            altitude: ceiling,
            speed,
            state: FlightState::InRing { city },
        }
    }

    pub fn status(&self) -> FlightStatus {
        self.state.status()
    }

    /// The city whose airspace this aircraft is in, if any.
    pub fn city(&self) -> Option<CityId> {
        match self.state {
            FlightState::InRing { city }
            | FlightState::Descending { city, .. }
            | FlightState::Landed { city, .. }
            | FlightState::Ascending { city } => Some(city),
            FlightState::InPipeline { .. } => None,
        }
    }

    /// The gate held by a descending or landed aircraft.
    pub fn target_gate(&self) -> Option<GateId> {
        match self.state {
            FlightState::Descending { gate, .. } | FlightState::Landed { gate, .. } => Some(gate),
            _ => None,
        }
    }

    pub fn pipeline(&self) -> Option<PipelineId> {
        match self.state {
            FlightState::InPipeline { pipeline, .. } => Some(pipeline),
            _ => None,
        }
    }

    pub fn pipeline_progress(&self) -> Option<f64> {
        match self.state {
            FlightState::InPipeline { progress, .. } => Some(progress),
            _ => None,
        }
    }

    // -----------------------------------------------------------------------
    // Transition constructors
    // -----------------------------------------------------------------------

    /// Still circling, at a new angle.
    pub(crate) fn orbit_to(&self, angle: f64) -> Self {
        Self {
            angle,
            ..self.clone()
        }
    }

    /// Cleared to descend toward `gate`, starting from `angle`.
    pub(crate) fn cleared_to(&self, city: CityId, gate: GateId, since: f64, angle: f64) -> Self {
        Self {
            angle,
            state: FlightState::Descending { city, gate, since },
            ..self.clone()
        }
    }

    /// Part way down toward the held gate.
    pub(crate) fn descending_at(&self, angle: f64, distance: f64, altitude: f64) -> Self {
        Self {
            angle,
            distance,
            altitude,
            ..self.clone()
        }
    }

    /// On the ground, parked exactly at the gate.
    pub(crate) fn touched_down(&self, city: CityId, gate: &Gate, ground: f64) -> Self {
        Self {
            angle: gate.angle,
            distance: gate.distance,
            altitude: ground,
            state: FlightState::Landed { city, gate: gate.id },
            ..self.clone()
        }
    }

    /// Released the gate and started climbing.
    pub(crate) fn lifted_off(&self, city: CityId) -> Self {
        Self {
            state: FlightState::Ascending { city },
            ..self.clone()
        }
    }

    /// Part way up toward the ring.
    pub(crate) fn climbing_at(&self, distance: f64, altitude: f64) -> Self {
        Self {
            distance,
            altitude,
            ..self.clone()
        }
    }

    /// Back on the ring at the ceiling.
    pub(crate) fn rejoined(&self, city: CityId, ring_radius: f64, ceiling: f64) -> Self {
        Self {
            distance: ring_radius,
            altitude: ceiling,
            state: FlightState::InRing { city },
            ..self.clone()
        }
    }

    /// Admitted to a corridor; no longer associated with a city.
    pub(crate) fn entered(&self, pipeline: PipelineId, angle: f64) -> Self {
        Self {
            angle,
            state: FlightState::InPipeline {
                pipeline,
                progress: 0.0,
            },
            ..self.clone()
        }
    }

    /// Further along the corridor.
    pub(crate) fn progressed(&self, pipeline: PipelineId, progress: f64) -> Self {
        Self {
            state: FlightState::InPipeline { pipeline, progress },
            ..self.clone()
        }
    }

    /// Out of the corridor and circling the destination.
    pub(crate) fn arrived(&self, city: CityId, angle: f64, ring_radius: f64, ceiling: f64) -> Self {
        Self {
            origin_city: city,
            angle,
            distance: ring_radius,
            altitude: ceiling,
            state: FlightState::InRing { city },
            ..self.clone()
        }
    }
}

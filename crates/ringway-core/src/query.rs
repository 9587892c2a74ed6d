//! Read-only query API for inspecting simulation state.
//!
//! Provides snapshot types that aggregate engine state into convenient views
//! for rendering and UI consumers. All types are owned copies -- no
//! references into internal engine storage -- and serialize with serde.

use serde::Serialize;

use crate::aircraft::FlightStatus;
use crate::event::LogEntry;
use crate::id::{AircraftId, CityId, GateId, PipelineId};
use crate::world::{GateSignal, World};

// ---------------------------------------------------------------------------
// Entity snapshots
// ---------------------------------------------------------------------------

/// One aircraft: identity, state tag and position.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AircraftSnapshot {
    pub id: AircraftId,
    pub callsign: String,
    pub status: FlightStatus,
    /// None while in a corridor.
    pub city: Option<CityId>,
    pub origin_city: CityId,
    pub angle: f64,
    pub distance: f64,
    pub altitude: f64,
    pub speed: f64,
    pub target_gate: Option<GateId>,
    pub pipeline: Option<PipelineId>,
    pub pipeline_progress: Option<f64>,
}

/// One gate with its derived signal.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GateSnapshot {
    pub id: GateId,
    pub city: CityId,
    pub sector: u32,
    pub angle: f64,
    pub distance: f64,
    pub signal: GateSignal,
    pub assigned: Option<AircraftId>,
    pub queue_count: u32,
}

/// One corridor with its authoritative occupancy.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineSnapshot {
    pub id: PipelineId,
    pub from: CityId,
    pub to: CityId,
    pub capacity: u32,
    pub current_count: u32,
    pub transit_time: f64,
}

// ---------------------------------------------------------------------------
// World snapshot
// ---------------------------------------------------------------------------

/// Everything a renderer or HUD needs for one frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorldSnapshot {
    pub clock_ms: f64,
    pub ticks: u64,
    pub paused: bool,
    pub speed: f64,
    pub scenario: String,
    pub aircraft: Vec<AircraftSnapshot>,
    pub gates: Vec<GateSnapshot>,
    pub pipelines: Vec<PipelineSnapshot>,
    /// Most recent log entries, newest first.
    pub events: Vec<LogEntry>,
}

impl WorldSnapshot {
    pub fn aircraft_with_status(
        &self,
        status: FlightStatus,
    ) -> impl Iterator<Item = &AircraftSnapshot> + '_ {
        self.aircraft.iter().filter(move |a| a.status == status)
    }

    pub fn gate(&self, id: GateId) -> Option<&GateSnapshot> {
        self.gates.iter().find(|g| g.id == id)
    }

    pub fn pipeline(&self, id: PipelineId) -> Option<&PipelineSnapshot> {
        self.pipelines.iter().find(|p| p.id == id)
    }
}

pub(crate) fn snapshot_aircraft(world: &World) -> Vec<AircraftSnapshot> {
    world
        .iter_aircraft()
        .map(|(id, a)| AircraftSnapshot {
            id,
            callsign: a.callsign.clone(),
            status: a.status(),
            city: a.city(),
            origin_city: a.origin_city,
            angle: a.angle,
            distance: a.distance,
            altitude: a.altitude,
            speed: a.speed,
            target_gate: a.target_gate(),
            pipeline: a.pipeline(),
            pipeline_progress: a.pipeline_progress(),
        })
        .collect()
}

pub(crate) fn snapshot_gates(world: &World) -> Vec<GateSnapshot> {
    world
        .gates()
        .iter()
        .map(|g| {
            let view = world.gate_view(g.id).copied().unwrap_or_default();
            GateSnapshot {
                id: g.id,
                city: g.city,
                sector: g.sector,
                angle: g.angle,
                distance: g.distance,
                signal: view.signal,
                assigned: view.assigned,
                queue_count: view.queue_count,
            }
        })
        .collect()
}

pub(crate) fn snapshot_pipelines(world: &World) -> Vec<PipelineSnapshot> {
    world
        .pipelines()
        .iter()
        .map(|p| PipelineSnapshot {
            id: p.id,
            from: p.from,
            to: p.to,
            capacity: p.capacity,
            current_count: world.pipeline_count(p.id).unwrap_or(0),
            transit_time: p.transit_time,
        })
        .collect()
}

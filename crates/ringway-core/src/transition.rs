//! The aircraft state machine.
//!
//! [`advance`] takes one aircraft, the catalogs, the within-tick
//! [`Reservations`] and the random source, and returns the aircraft's next
//! value plus at most one log entry. It never fails: a reference to a gate
//! or corridor that does not exist yields the aircraft unchanged with a
//! [`Outcome::Fault`].
//!
//! Transition table (`dt` is the scaled delta of the tick):
//!
//! | from        | to          | condition                                        |
//! |-------------|-------------|--------------------------------------------------|
//! | in_ring     | descending  | `chance(descent_request * dt)` and a free gate   |
//! | in_ring     | in_pipeline | otherwise `chance(pipeline_request * dt)` and a slot |
//! | descending  | landed      | altitude reaches the ground floor                |
//! | landed      | ascending   | `chance(departure * dt)`                         |
//! | ascending   | in_ring     | altitude reaches the ceiling                     |
//! | in_pipeline | in_ring     | progress reaches 1 (at the destination city)     |

use log::{debug, warn};

use crate::aircraft::{Aircraft, FlightState, FlightStatus};
use crate::allocator::Reservations;
use crate::config::{RingGeometry, TransitionRates};
use crate::demand::DemandSample;
use crate::event::{FaultKind, FlightEvent, LogEntry};
use crate::geometry::{approach, turn_toward, wrap_degrees};
use crate::id::{AircraftId, CityId, GateId, PipelineId};
use crate::rng::RandomSource;
use crate::world::{Pipeline, World};

/// Read-only inputs shared by every aircraft in one tick.
#[derive(Debug, Clone, Copy)]
pub struct TickContext<'a> {
    pub world: &'a World,
    pub rates: &'a TransitionRates,
    pub geometry: &'a RingGeometry,
    /// Scaled elapsed time.
    pub dt: f64,
    /// Simulated clock at the start of the tick, in milliseconds.
    pub clock: f64,
    pub demand: Option<&'a DemandSample>,
}

/// What happened to one aircraft this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Same state, updated kinematics.
    Continued,
    Transitioned { from: FlightStatus, to: FlightStatus },
    /// Carried over unchanged because a reference did not resolve.
    Fault(FaultKind),
}

/// Result of advancing one aircraft.
#[derive(Debug, Clone, PartialEq)]
pub struct Advance {
    pub next: Aircraft,
    pub outcome: Outcome,
    pub entry: Option<LogEntry>,
}

impl Advance {
    fn continued(next: Aircraft) -> Self {
        Self {
            next,
            outcome: Outcome::Continued,
            entry: None,
        }
    }

    fn transitioned(current: &Aircraft, next: Aircraft, entry: LogEntry) -> Self {
        let from = current.status();
        let to = next.status();
        debug!("{}: {:?} -> {:?}", current.callsign, from, to);
        Self {
            next,
            outcome: Outcome::Transitioned { from, to },
            entry: Some(entry),
        }
    }

    fn fault(current: &Aircraft, id: AircraftId, fault: FaultKind, clock: f64) -> Self {
        warn!("{} ({id:?}) carried over: {fault:?}", current.callsign);
        let message = match fault {
            FaultKind::MissingGate(gate) => {
                format!("{} references unknown gate {gate}", current.callsign)
            }
            FaultKind::MissingPipeline(pipeline) => {
                format!("{} references unknown pipeline {pipeline}", current.callsign)
            }
        };
        Self {
            next: current.clone(),
            outcome: Outcome::Fault(fault),
            entry: Some(LogEntry::new(
                clock,
                FlightEvent::ConsistencyFault {
                    aircraft: id,
                    fault,
                },
                message,
            )),
        }
    }
}

/// Advance one aircraft by one tick.
pub fn advance(
    ctx: &TickContext<'_>,
    id: AircraftId,
    aircraft: &Aircraft,
    reservations: &mut Reservations,
    rng: &mut dyn RandomSource,
) -> Advance {
    match aircraft.state {
        FlightState::InRing { city } => circle(ctx, id, aircraft, city, reservations, rng),
        FlightState::Descending { city, gate, .. } => descend(ctx, id, aircraft, city, gate),
        FlightState::Landed { city, gate } => {
            hold_at_gate(ctx, id, aircraft, city, gate, reservations, rng)
        }
        FlightState::Ascending { city } => climb(ctx, id, aircraft, city),
        FlightState::InPipeline { pipeline, progress } => {
            transit(ctx, id, aircraft, pipeline, progress, reservations, rng)
        }
    }
}

fn city_name<'w>(world: &'w World, city: CityId) -> &'w str {
    world.city(city).map(|c| c.name.as_str()).unwrap_or("?")
}

fn demand_multiplier(ctx: &TickContext<'_>) -> f64 {
    ctx.demand.map(DemandSample::multiplier).unwrap_or(1.0)
}

// ---------------------------------------------------------------------------
// in_ring
// ---------------------------------------------------------------------------

fn circle(
    ctx: &TickContext<'_>,
    id: AircraftId,
    aircraft: &Aircraft,
    city: CityId,
    reservations: &mut Reservations,
    rng: &mut dyn RandomSource,
) -> Advance {
    let angle =
        wrap_degrees(aircraft.angle + aircraft.speed * ctx.dt * ctx.rates.ring_angular_speed);
    let multiplier = demand_multiplier(ctx);

    // Gate request first; the corridor is only considered if it fails.
    if rng.chance(ctx.rates.descent_request * ctx.dt * multiplier) {
        let free = reservations.free_gates(ctx.world, city);
        if !free.is_empty() {
            let gate = free[rng.index(free.len())];
            reservations.reserve_gate(gate.id);
            let next = aircraft.cleared_to(city, gate.id, ctx.clock, angle);
            let message = format!(
                "{} cleared to descend to gate {} at {}",
                aircraft.callsign,
                gate.id,
                city_name(ctx.world, city)
            );
            let entry = LogEntry::new(
                ctx.clock,
                FlightEvent::DescentCleared {
                    aircraft: id,
                    gate: gate.id,
                    city,
                },
                message,
            );
            return Advance::transitioned(aircraft, next, entry);
        }
    }

    if rng.chance(ctx.rates.pipeline_request * ctx.dt * multiplier) {
        if let Some(pipeline) = choose_pipeline(ctx, city, reservations, rng) {
            let admitted = reservations.admit(pipeline.id);
            debug_assert!(admitted, "chosen pipeline had no capacity");
            let next = aircraft.entered(pipeline.id, angle);
            let message = format!(
                "{} entered pipeline {} from {} to {}",
                aircraft.callsign,
                pipeline.id,
                city_name(ctx.world, pipeline.from),
                city_name(ctx.world, pipeline.to)
            );
            let entry = LogEntry::new(
                ctx.clock,
                FlightEvent::EnteredPipeline {
                    aircraft: id,
                    pipeline: pipeline.id,
                },
                message,
            );
            return Advance::transitioned(aircraft, next, entry);
        }
    }

    Advance::continued(aircraft.orbit_to(angle))
}

/// Pick a corridor out of `city` with spare provisional capacity.
///
/// Without a forecast (or when every candidate route has zero forecast
/// flights) this is the first admissible corridor in id order. With one,
/// candidates are weighted by forecast flights on their route.
fn choose_pipeline<'w>(
    ctx: &TickContext<'w>,
    city: CityId,
    reservations: &Reservations,
    rng: &mut dyn RandomSource,
) -> Option<&'w Pipeline> {
    let candidates: Vec<&Pipeline> = ctx
        .world
        .pipelines_from(city)
        .filter(|p| reservations.has_capacity(p.id))
        .collect();
    let first = *candidates.first()?;

    let Some(demand) = ctx.demand else {
        return Some(first);
    };
    let weights: Vec<u64> = candidates
        .iter()
        .map(|p| demand.flights(p.from, p.to) as u64)
        .collect();
    let total: u64 = weights.iter().sum();
    if total == 0 {
        return Some(first);
    }

    let mut roll = (rng.next_f64() * total as f64) as u64;
    for (pipeline, weight) in candidates.iter().zip(&weights) {
        if roll < *weight {
            return Some(*pipeline);
        }
        roll -= weight;
    }
    candidates.last().copied()
}

// ---------------------------------------------------------------------------
// descending
// ---------------------------------------------------------------------------

fn descend(
    ctx: &TickContext<'_>,
    id: AircraftId,
    aircraft: &Aircraft,
    city: CityId,
    gate_id: GateId,
) -> Advance {
    let Some(gate) = ctx.world.gate(gate_id) else {
        return Advance::fault(aircraft, id, FaultKind::MissingGate(gate_id), ctx.clock);
    };
    let geometry = ctx.geometry;
    let altitude = aircraft.altitude - ctx.rates.descent_rate * ctx.dt;

    if altitude <= geometry.ground_altitude {
        let next = aircraft.touched_down(city, gate, geometry.ground_altitude);
        let message = format!(
            "{} landed at gate {} in {}",
            aircraft.callsign,
            gate.id,
            city_name(ctx.world, city)
        );
        let entry = LogEntry::new(
            ctx.clock,
            FlightEvent::TouchedDown {
                aircraft: id,
                gate: gate.id,
            },
            message,
        );
        return Advance::transitioned(aircraft, next, entry);
    }

    let angle = turn_toward(
        aircraft.angle,
        gate.angle,
        ctx.rates.descent_turn * ctx.dt,
        geometry.angle_snap,
    );
    let distance = approach(
        aircraft.distance,
        gate.distance,
        ctx.rates.descent_closure * ctx.dt,
        geometry.distance_snap,
    );
    Advance::continued(aircraft.descending_at(angle, distance, altitude))
}

// ---------------------------------------------------------------------------
// landed
// ---------------------------------------------------------------------------

fn hold_at_gate(
    ctx: &TickContext<'_>,
    id: AircraftId,
    aircraft: &Aircraft,
    city: CityId,
    gate: GateId,
    reservations: &mut Reservations,
    rng: &mut dyn RandomSource,
) -> Advance {
    if !rng.chance(ctx.rates.departure * ctx.dt) {
        return Advance::continued(aircraft.clone());
    }
    reservations.release_gate(gate);
    let next = aircraft.lifted_off(city);
    let message = format!(
        "{} departed gate {} at {}",
        aircraft.callsign,
        gate,
        city_name(ctx.world, city)
    );
    let entry = LogEntry::new(
        ctx.clock,
        FlightEvent::Departed { aircraft: id, gate },
        message,
    );
    Advance::transitioned(aircraft, next, entry)
}

// ---------------------------------------------------------------------------
// ascending
// ---------------------------------------------------------------------------

fn climb(ctx: &TickContext<'_>, id: AircraftId, aircraft: &Aircraft, city: CityId) -> Advance {
    let geometry = ctx.geometry;
    let altitude = aircraft.altitude + ctx.rates.climb_rate * ctx.dt;

    if altitude >= geometry.max_altitude {
        let next = aircraft.rejoined(city, geometry.ring_radius, geometry.max_altitude);
        let message = format!(
            "{} rejoined the {} ring",
            aircraft.callsign,
            city_name(ctx.world, city)
        );
        let entry = LogEntry::new(
            ctx.clock,
            FlightEvent::RejoinedRing { aircraft: id, city },
            message,
        );
        return Advance::transitioned(aircraft, next, entry);
    }

    let distance = approach(
        aircraft.distance,
        geometry.ring_radius,
        ctx.rates.climb_closure * ctx.dt,
        0.0,
    );
    Advance::continued(aircraft.climbing_at(distance, altitude))
}

// ---------------------------------------------------------------------------
// in_pipeline
// ---------------------------------------------------------------------------

fn transit(
    ctx: &TickContext<'_>,
    id: AircraftId,
    aircraft: &Aircraft,
    pipeline_id: PipelineId,
    progress: f64,
    reservations: &mut Reservations,
    rng: &mut dyn RandomSource,
) -> Advance {
    let Some(pipeline) = ctx.world.pipeline(pipeline_id) else {
        return Advance::fault(
            aircraft,
            id,
            FaultKind::MissingPipeline(pipeline_id),
            ctx.clock,
        );
    };
    let progress = progress + aircraft.speed * ctx.dt * ctx.rates.pipeline_progress;

    if progress < 1.0 {
        return Advance::continued(aircraft.progressed(pipeline.id, progress));
    }

    reservations.vacate(pipeline.id);
    let geometry = ctx.geometry;
    let angle = rng.range(0.0, 360.0);
    let next = aircraft.arrived(pipeline.to, angle, geometry.ring_radius, geometry.max_altitude);
    let message = format!(
        "{} arrived at {} via pipeline {}",
        aircraft.callsign,
        city_name(ctx.world, pipeline.to),
        pipeline.id
    );
    let entry = LogEntry::new(
        ctx.clock,
        FlightEvent::ArrivedFromPipeline {
            aircraft: id,
            pipeline: pipeline.id,
            city: pipeline.to,
        },
        message,
    );
    Advance::transitioned(aircraft, next, entry)
}

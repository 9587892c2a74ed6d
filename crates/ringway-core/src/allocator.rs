//! Gate and corridor admission for one tick.
//!
//! [`Reservations::snapshot`] is taken from the population before any
//! aircraft advances. The state machine then mutates it in place as it
//! walks the population, so an aircraft processed later in the pass sees
//! every gate and corridor slot claimed earlier in the same pass. The
//! corridor counters here are provisional: the authoritative occupancy is
//! recomputed by the status deriver once the pass is complete.

use std::collections::HashSet;

use crate::id::{CityId, GateId, PipelineId};
use crate::world::{Gate, World};

/// Within-tick reservation state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reservations {
    held: HashSet<GateId>,
    /// Provisional occupants per pipeline, indexed by pipeline id.
    occupancy: Vec<u32>,
    capacity: Vec<u32>,
}

impl Reservations {
    /// Gates held by descending or landed aircraft and occupants per
    /// corridor, as of now.
    pub fn snapshot(world: &World) -> Self {
        let mut held = HashSet::new();
        let mut occupancy = vec![0u32; world.pipelines().len()];

        for (_, aircraft) in world.iter_aircraft() {
            if let Some(gate) = aircraft.target_gate() {
                held.insert(gate);
            }
            if let Some(pipeline) = aircraft.pipeline() {
                if let Some(count) = occupancy.get_mut(pipeline.index()) {
                    *count += 1;
                }
            }
        }

        Self {
            held,
            occupancy,
            capacity: world.pipelines().iter().map(|p| p.capacity).collect(),
        }
    }

    // -----------------------------------------------------------------------
    // Gates
    // -----------------------------------------------------------------------

    pub fn is_gate_free(&self, gate: GateId) -> bool {
        !self.held.contains(&gate)
    }

    /// Unreserved gates at `city`, in id order.
    pub fn free_gates<'w>(&self, world: &'w World, city: CityId) -> Vec<&'w Gate> {
        world
            .gates_at(city)
            .filter(|g| self.is_gate_free(g.id))
            .collect()
    }

    /// Claim a gate. Returns false if it is already held.
    pub fn reserve_gate(&mut self, gate: GateId) -> bool {
        self.held.insert(gate)
    }

    /// Release a gate. Returns false if it was not held.
    pub fn release_gate(&mut self, gate: GateId) -> bool {
        self.held.remove(&gate)
    }

    pub fn held_count(&self) -> usize {
        self.held.len()
    }

    // -----------------------------------------------------------------------
    // Pipelines
    // -----------------------------------------------------------------------

    /// Provisional occupants of a corridor. 0 for an unknown corridor.
    pub fn occupancy(&self, pipeline: PipelineId) -> u32 {
        self.occupancy.get(pipeline.index()).copied().unwrap_or(0)
    }

    /// Whether a corridor can take one more aircraft. False for an unknown
    /// corridor.
    pub fn has_capacity(&self, pipeline: PipelineId) -> bool {
        match self.capacity.get(pipeline.index()) {
            Some(&cap) => self.occupancy(pipeline) < cap,
            None => false,
        }
    }

    /// Admit one aircraft into a corridor. Returns false (and changes
    /// nothing) if the corridor is full or unknown.
    pub fn admit(&mut self, pipeline: PipelineId) -> bool {
        if !self.has_capacity(pipeline) {
            return false;
        }
        self.occupancy[pipeline.index()] += 1;
        true
    }

    /// An occupant left the corridor.
    pub fn vacate(&mut self, pipeline: PipelineId) {
        if let Some(count) = self.occupancy.get_mut(pipeline.index()) {
            *count = count.saturating_sub(1);
        }
    }
}

//! The simulation engine: owns the world and drives the tick.
//!
//! # Architecture
//!
//! The `Engine` owns:
//! - A [`World`] (catalogs, aircraft, derived gate/pipeline views)
//! - The single injected [`RandomSource`]
//! - A [`SimState`] (simulated clock, tick counter)
//! - The bounded [`EventLog`] and its passive listeners
//! - Run controls: paused flag, speed multiplier, scenario label
//! - An optional [`DemandForecast`]
//!
//! # Tick phases
//!
//! Each running `tick()` does:
//! 1. **Snapshot** -- build [`Reservations`] from the pre-tick population
//! 2. **Advance** -- run every aircraft through the state machine in
//!    insertion order, sharing the reservations
//! 3. **Commit** -- write every next value back at once
//! 4. **Derive** -- recompute gate signals and pipeline counts
//! 5. **Bookkeeping** -- advance the clock, prepend entries to the log,
//!    notify listeners
//!
//! Until step 3 nothing in the world has changed, so observers never see a
//! half-advanced tick.

use std::fmt;

use log::{info, trace, warn};
use slotmap::Key;

use crate::aircraft::{Aircraft, FlightState};
use crate::allocator::Reservations;
use crate::command_queue::{Command, CommandQueue};
use crate::config::{ScenarioConfig, SimConfig};
use crate::demand::{DemandForecast, calendar_at};
use crate::error::{ConfigError, ControlError};
use crate::event::{EventLog, FlightEvent, LogEntry, LogListener, Severity};
use crate::id::AircraftId;
use crate::query::{self, WorldSnapshot};
use crate::rng::{RandomSource, SimRng};
use crate::sim::{CLOCK_MS_PER_UNIT, SimState, StateHash};
use crate::status;
use crate::transition::{self, Outcome, TickContext};
use crate::world::{GateSignal, World};

// ---------------------------------------------------------------------------
// TickReport
// ---------------------------------------------------------------------------

/// What one call to [`Engine::tick`] did.
#[derive(Debug, Clone, PartialEq)]
pub struct TickReport {
    /// False for paused and non-positive-delta ticks.
    pub ran: bool,
    /// Delta after the speed multiplier.
    pub scaled_delta: f64,
    pub transitions: usize,
    pub faults: usize,
    /// Entries committed to the log this tick, in emission order.
    pub entries: Vec<LogEntry>,
}

impl TickReport {
    fn idle() -> Self {
        Self {
            ran: false,
            scaled_delta: 0.0,
            transitions: 0,
            faults: 0,
            entries: Vec::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// The core simulation engine.
pub struct Engine {
    config: SimConfig,
    /// Kept so `reset` can rebuild the initial population.
    scenario: ScenarioConfig,
    world: World,
    rng: Box<dyn RandomSource>,
    sim_state: SimState,
    paused: bool,
    speed: f64,
    scenario_label: String,
    log: EventLog,
    listeners: Vec<LogListener>,
    demand: Option<Box<dyn DemandForecast>>,
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("scenario", &self.scenario.name)
            .field("aircraft", &self.world.aircraft_count())
            .field("sim_state", &self.sim_state)
            .field("paused", &self.paused)
            .field("speed", &self.speed)
            .field("scenario_label", &self.scenario_label)
            .field("log_len", &self.log.len())
            .field("listeners", &self.listeners.len())
            .field("demand", &self.demand.is_some())
            .finish()
    }
}

impl Engine {
    /// Validate `config` and `scenario`, then build the initial population
    /// with a [`SimRng`] seeded from `config.seed`.
    pub fn new(config: SimConfig, scenario: ScenarioConfig) -> Result<Self, ConfigError> {
        let rng = Box::new(SimRng::new(config.seed));
        Self::with_rng(config, scenario, rng)
    }

    /// Like [`Engine::new`] with an injected random source. The source is
    /// reseeded with `config.seed` before the fleet is spawned.
    pub fn with_rng(
        config: SimConfig,
        scenario: ScenarioConfig,
        rng: Box<dyn RandomSource>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        scenario.validate(&config.geometry)?;

        let log = EventLog::new(config.log_capacity);
        let mut engine = Self {
            world: World::from_scenario(&scenario),
            scenario_label: scenario.name.clone(),
            config,
            scenario,
            rng,
            sim_state: SimState::new(),
            paused: false,
            speed: 1.0,
            log,
            listeners: Vec::new(),
            demand: None,
        };
        engine.populate();
        info!(
            "engine ready: scenario '{}', {} aircraft",
            engine.scenario.name,
            engine.world.aircraft_count()
        );
        Ok(engine)
    }

    fn populate(&mut self) {
        self.rng.reseed(self.config.seed);
        self.world = World::from_scenario(&self.scenario);
        self.world
            .spawn_fleet(&self.scenario.fleet, &self.config.geometry, self.rng.as_mut());
        status::derive(&mut self.world, &self.config.geometry);
    }

    // -----------------------------------------------------------------------
    // Tick
    // -----------------------------------------------------------------------

    /// Advance the simulation by `delta` units of unscaled time.
    ///
    /// Paused engines, and deltas that are zero, negative or not finite,
    /// leave every piece of state untouched and emit nothing. So does a
    /// delta whose scaled value or resulting clock would overflow.
    pub fn tick(&mut self, delta: f64) -> TickReport {
        if self.paused || !delta.is_finite() || delta <= 0.0 {
            return TickReport::idle();
        }

        let dt = delta * self.speed;
        let clock = self.sim_state.clock_ms;
        if !dt.is_finite() || !(clock + dt * CLOCK_MS_PER_UNIT).is_finite() {
            warn!("dropping tick: scaled delta {delta} x {} overflows", self.speed);
            return TickReport::idle();
        }
        let demand = self.demand.as_ref().map(|forecast| {
            let (hour, weekday) = calendar_at(clock, self.config.start_hour);
            forecast.sample(hour, weekday)
        });

        // Phase 1-2: snapshot, then advance in insertion order.
        let mut reservations = Reservations::snapshot(&self.world);
        let ctx = TickContext {
            world: &self.world,
            rates: &self.config.rates,
            geometry: &self.config.geometry,
            dt,
            clock,
            demand: demand.as_ref(),
        };
        let mut next: Vec<(AircraftId, Aircraft)> =
            Vec::with_capacity(self.world.aircraft_count());
        let mut entries = Vec::new();
        let mut transitions = 0;
        let mut faults = 0;

        for (id, aircraft) in self.world.iter_aircraft() {
            let advance =
                transition::advance(&ctx, id, aircraft, &mut reservations, self.rng.as_mut());
            let keep_entry = match advance.outcome {
                Outcome::Continued => true,
                Outcome::Transitioned { .. } => {
                    transitions += 1;
                    true
                }
                Outcome::Fault(_) => {
                    faults += 1;
                    self.config.report_faults
                }
            };
            if keep_entry {
                entries.extend(advance.entry);
            }
            next.push((id, advance.next));
        }

        // Phase 3: commit.
        for (id, aircraft) in next {
            self.world.update_aircraft(id, aircraft);
        }

        // Phase 4: derive.
        status::derive(&mut self.world, &self.config.geometry);

        // Phase 5: bookkeeping.
        self.sim_state.advance(dt);
        for entry in &entries {
            for listener in &mut self.listeners {
                listener(entry);
            }
        }
        self.log.prepend(entries.clone());

        trace!(
            "tick {}: dt={dt:.3} transitions={transitions} faults={faults} clock={:.0}ms",
            self.sim_state.ticks,
            self.sim_state.clock_ms
        );

        TickReport {
            ran: true,
            scaled_delta: dt,
            transitions,
            faults,
            entries,
        }
    }

    // -----------------------------------------------------------------------
    // Controls
    // -----------------------------------------------------------------------

    pub fn start(&mut self) {
        info!("simulation started");
        self.paused = false;
    }

    pub fn pause(&mut self) {
        info!("simulation paused");
        self.paused = true;
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Rebuild the initial population, zero the clock and clear the log.
    ///
    /// The random source is reseeded, so the reset world is identical to
    /// the one `new` built. Paused flag, speed and scenario label persist.
    pub fn reset(&mut self) {
        info!("simulation reset");
        self.populate();
        self.sim_state = SimState::new();
        self.log.clear();
    }

    /// Set the global speed multiplier. Rejected values leave the engine
    /// unchanged.
    pub fn set_speed(&mut self, speed: f64) -> Result<(), ControlError> {
        if !(speed.is_finite() && speed > 0.0) {
            warn!("rejected speed multiplier {speed}");
            return Err(ControlError::InvalidSpeed(speed));
        }
        info!("speed multiplier set to {speed}");
        self.speed = speed;
        Ok(())
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    /// Set the advisory scenario label. Tick logic does not read it.
    pub fn set_scenario(&mut self, label: impl Into<String>) {
        self.scenario_label = label.into();
        info!("scenario label set to '{}'", self.scenario_label);
    }

    pub fn scenario_label(&self) -> &str {
        &self.scenario_label
    }

    /// Apply one control command.
    pub fn apply(&mut self, command: Command) -> Result<(), ControlError> {
        match command {
            Command::Start => self.start(),
            Command::Pause => self.pause(),
            Command::Reset => self.reset(),
            Command::SetSpeed(speed) => self.set_speed(speed)?,
            Command::SetScenario(label) => self.set_scenario(label),
        }
        Ok(())
    }

    /// Drain `queue` and apply every command in submission order. A rejected
    /// command does not stop the ones after it.
    pub fn apply_commands(&mut self, queue: &mut CommandQueue) -> Vec<Result<(), ControlError>> {
        queue
            .drain(self.sim_state.ticks)
            .into_iter()
            .map(|command| self.apply(command))
            .collect()
    }

    // -----------------------------------------------------------------------
    // Registry
    // -----------------------------------------------------------------------

    /// Insert an aircraft (appended to the processing order) and refresh
    /// the derived views.
    pub fn insert_aircraft(&mut self, aircraft: Aircraft) -> AircraftId {
        let id = self.world.insert_aircraft(aircraft);
        status::derive(&mut self.world, &self.config.geometry);
        id
    }

    /// Replace an aircraft's value and refresh the derived views.
    pub fn update_aircraft(&mut self, id: AircraftId, aircraft: Aircraft) -> Option<Aircraft> {
        let previous = self.world.update_aircraft(id, aircraft)?;
        status::derive(&mut self.world, &self.config.geometry);
        Some(previous)
    }

    /// Remove an aircraft and refresh the derived views.
    pub fn remove_aircraft(&mut self, id: AircraftId) -> Option<Aircraft> {
        let removed = self.world.remove_aircraft(id)?;
        status::derive(&mut self.world, &self.config.geometry);
        Some(removed)
    }

    // -----------------------------------------------------------------------
    // Events
    // -----------------------------------------------------------------------

    /// Register a passive listener. It sees every entry committed from now
    /// on, in emission order.
    pub fn on_entry(&mut self, listener: LogListener) {
        self.listeners.push(listener);
    }

    /// Post an external notice to the log at the current clock.
    pub fn notify(&mut self, severity: Severity, message: impl Into<String>) {
        let entry = LogEntry::new(
            self.sim_state.clock_ms,
            FlightEvent::Notice { severity },
            message,
        );
        for listener in &mut self.listeners {
            listener(&entry);
        }
        self.log.prepend(vec![entry]);
    }

    // -----------------------------------------------------------------------
    // Demand
    // -----------------------------------------------------------------------

    /// Install a forecast. It is sampled once per running tick.
    pub fn set_demand(&mut self, forecast: Box<dyn DemandForecast>) {
        info!("demand forecast installed");
        self.demand = Some(forecast);
    }

    pub fn clear_demand(&mut self) {
        self.demand = None;
    }

    pub fn has_demand(&self) -> bool {
        self.demand.is_some()
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn scenario(&self) -> &ScenarioConfig {
        &self.scenario
    }

    pub fn log(&self) -> &EventLog {
        &self.log
    }

    pub fn sim_state(&self) -> &SimState {
        &self.sim_state
    }

    /// Simulated milliseconds since start (or the last reset).
    pub fn clock_ms(&self) -> f64 {
        self.sim_state.clock_ms
    }

    /// Owned snapshot of everything observers may read.
    pub fn snapshot(&self) -> WorldSnapshot {
        WorldSnapshot {
            clock_ms: self.sim_state.clock_ms,
            ticks: self.sim_state.ticks,
            paused: self.paused,
            speed: self.speed,
            scenario: self.scenario_label.clone(),
            aircraft: query::snapshot_aircraft(&self.world),
            gates: query::snapshot_gates(&self.world),
            pipelines: query::snapshot_pipelines(&self.world),
            events: self.log.iter().cloned().collect(),
        }
    }

    /// Hash of the aircraft population, derived views, clock and random
    /// source. Equal seeds and inputs give equal hashes.
    pub fn state_hash(&self) -> u64 {
        let mut hasher = StateHash::new();

        for (id, aircraft) in self.world.iter_aircraft() {
            hasher.write_u64(id.data().as_ffi());
            hash_aircraft(&mut hasher, aircraft);
        }
        for view in self.world.gate_views.iter() {
            hasher.write_u32(match view.signal {
                GateSignal::Green => 0,
                GateSignal::Yellow => 1,
                GateSignal::Red => 2,
            });
            hasher.write_u64(view.assigned.map_or(u64::MAX, |id| id.data().as_ffi()));
            hasher.write_u32(view.queue_count);
        }
        for &count in &self.world.pipeline_counts {
            hasher.write_u32(count);
        }
        hasher.write_f64(self.sim_state.clock_ms);
        hasher.write_u64(self.rng.fingerprint());

        hasher.finish()
    }
}

fn hash_aircraft(hasher: &mut StateHash, aircraft: &Aircraft) {
    match aircraft.state {
        FlightState::InRing { city } => {
            hasher.write_u32(0);
            hasher.write_u32(city.0);
        }
        FlightState::Descending { city, gate, since } => {
            hasher.write_u32(1);
            hasher.write_u32(city.0);
            hasher.write_u32(gate.0);
            hasher.write_f64(since);
        }
        FlightState::Landed { city, gate } => {
            hasher.write_u32(2);
            hasher.write_u32(city.0);
            hasher.write_u32(gate.0);
        }
        FlightState::Ascending { city } => {
            hasher.write_u32(3);
            hasher.write_u32(city.0);
        }
        FlightState::InPipeline { pipeline, progress } => {
            hasher.write_u32(4);
            hasher.write_u32(pipeline.0);
            hasher.write_f64(progress);
        }
    }
    hasher.write_u32(aircraft.home_city.0);
    hasher.write_u32(aircraft.origin_city.0);
    hasher.write_f64(aircraft.angle);
    hasher.write_f64(aircraft.distance);
    hasher.write_f64(aircraft.altitude);
    hasher.write_f64(aircraft.speed);
}

// ===========================================================================
// Tests
// ===========================================================================

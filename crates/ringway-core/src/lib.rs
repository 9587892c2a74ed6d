//! Ringway Core -- a discrete-time air traffic engine.
//!
//! Aircraft circle city rings, descend to gates, wait on the ground, climb
//! back out and cross capacity-bounded corridors (pipelines) between
//! cities. The engine allocates gates and corridor slots under contention
//! and keeps every invariant tick by tick: a gate has at most one holder, a
//! corridor never exceeds its capacity, and every aircraft is always in
//! exactly one of five states.
//!
//! # Tick Pipeline
//!
//! Each call to [`engine::Engine::tick`] advances the simulation through:
//!
//! 1. **Snapshot** -- Build gate and corridor reservations from the
//!    pre-tick population.
//! 2. **Advance** -- Run every aircraft through the state machine in
//!    insertion order; earlier aircraft claim contested resources first.
//! 3. **Commit** -- Write all next values back at once.
//! 4. **Derive** -- Recompute gate signals and corridor counts.
//! 5. **Bookkeeping** -- Advance the clock and commit log entries.
//!
//! Paused ticks and non-positive deltas are no-ops.
//!
//! ```rust
//! use ringway_core::config::{ScenarioConfig, SimConfig};
//! use ringway_core::engine::Engine;
//!
//! let mut engine = Engine::new(SimConfig::default(), ScenarioConfig::reference())?;
//! for _ in 0..60 {
//!     engine.tick(1.0);
//! }
//! let snapshot = engine.snapshot();
//! assert_eq!(snapshot.ticks, 60);
//! # Ok::<(), ringway_core::error::ConfigError>(())
//! ```
//!
//! # Key Types
//!
//! - [`engine::Engine`] -- Owns the world and drives the tick.
//! - [`world::World`] -- Entity registry: aircraft plus the city, gate and
//!   corridor catalogs.
//! - [`aircraft::FlightState`] -- One variant per flight status, carrying
//!   only the fields meaningful to it.
//! - [`allocator::Reservations`] -- Within-tick gate reservations and
//!   provisional corridor counters.
//! - [`event::EventLog`] -- Bounded newest-first log of typed events.
//! - [`rng::RandomSource`] -- The single injected source of randomness.
//! - [`demand::DemandForecast`] -- Optional hour/weekday demand input.

pub mod aircraft;
pub mod allocator;
pub mod command_queue;
pub mod config;
pub mod demand;
pub mod engine;
pub mod error;
pub mod event;
pub mod geometry;
pub mod id;
pub mod query;
pub mod rng;
pub mod sim;
pub mod status;
pub mod transition;
pub mod world;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

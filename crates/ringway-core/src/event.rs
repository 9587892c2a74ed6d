//! Typed flight events and the bounded, time-ordered event log.
//!
//! The state machine emits [`LogEntry`] values while it walks the
//! population. The tick driver commits them as one batch at the end of the
//! tick: the batch goes to the front of the [`EventLog`] (newest first) and
//! the log is truncated to its capacity, evicting the oldest entries.
//!
//! Timestamps are simulated clock milliseconds, never wall-clock time.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::id::{AircraftId, CityId, GateId, PipelineId};

// ---------------------------------------------------------------------------
// Event types
// ---------------------------------------------------------------------------

/// Severity class of a log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Warning,
    Success,
    Error,
}

/// What went wrong in a referential fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FaultKind {
    MissingGate(GateId),
    MissingPipeline(PipelineId),
}

/// Something that happened to an aircraft (or was posted from outside).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FlightEvent {
    DescentCleared {
        aircraft: AircraftId,
        gate: GateId,
        city: CityId,
    },
    TouchedDown {
        aircraft: AircraftId,
        gate: GateId,
    },
    Departed {
        aircraft: AircraftId,
        gate: GateId,
    },
    RejoinedRing {
        aircraft: AircraftId,
        city: CityId,
    },
    EnteredPipeline {
        aircraft: AircraftId,
        pipeline: PipelineId,
    },
    ArrivedFromPipeline {
        aircraft: AircraftId,
        pipeline: PipelineId,
        city: CityId,
    },
    /// An aircraft referenced a gate or corridor that does not exist and
    /// was carried over unchanged.
    ConsistencyFault {
        aircraft: AircraftId,
        fault: FaultKind,
    },
    /// Posted by an external collaborator.
    Notice { severity: Severity },
}

impl FlightEvent {
    pub fn severity(&self) -> Severity {
        match self {
            FlightEvent::DescentCleared { .. }
            | FlightEvent::Departed { .. }
            | FlightEvent::EnteredPipeline { .. } => Severity::Info,
            FlightEvent::TouchedDown { .. }
            | FlightEvent::RejoinedRing { .. }
            | FlightEvent::ArrivedFromPipeline { .. } => Severity::Success,
            FlightEvent::ConsistencyFault { .. } => Severity::Warning,
            FlightEvent::Notice { severity } => *severity,
        }
    }

    /// The aircraft this event is about, if any.
    pub fn aircraft(&self) -> Option<AircraftId> {
        match self {
            FlightEvent::DescentCleared { aircraft, .. }
            | FlightEvent::TouchedDown { aircraft, .. }
            | FlightEvent::Departed { aircraft, .. }
            | FlightEvent::RejoinedRing { aircraft, .. }
            | FlightEvent::EnteredPipeline { aircraft, .. }
            | FlightEvent::ArrivedFromPipeline { aircraft, .. }
            | FlightEvent::ConsistencyFault { aircraft, .. } => Some(*aircraft),
            FlightEvent::Notice { .. } => None,
        }
    }
}

/// One human-readable notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Simulated clock, in milliseconds.
    pub timestamp: f64,
    pub severity: Severity,
    pub message: String,
    pub event: FlightEvent,
}

impl LogEntry {
    pub fn new(timestamp: f64, event: FlightEvent, message: impl Into<String>) -> Self {
        Self {
            timestamp,
            severity: event.severity(),
            message: message.into(),
            event,
        }
    }
}

/// A passive listener receives every committed entry, read-only.
pub type LogListener = Box<dyn FnMut(&LogEntry)>;

// ---------------------------------------------------------------------------
// EventLog
// ---------------------------------------------------------------------------

/// Bounded newest-first log. When full, the oldest entries are dropped.
#[derive(Debug, Clone)]
pub struct EventLog {
    entries: VecDeque<LogEntry>,
    capacity: usize,
    /// Total entries ever committed (including dropped).
    total_written: u64,
}

impl EventLog {
    /// Create an empty log. A capacity of 0 is clamped to 1.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
            total_written: 0,
        }
    }

    /// Put a batch in front of the existing entries, keeping the batch's own
    /// order, then evict down to capacity.
    pub fn prepend(&mut self, batch: Vec<LogEntry>) {
        self.total_written += batch.len() as u64;
        for entry in batch.into_iter().rev() {
            self.entries.push_front(entry);
        }
        self.entries.truncate(self.capacity);
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn total_written(&self) -> u64 {
        self.total_written
    }

    /// Number of entries evicted because the log was full.
    pub fn dropped_count(&self) -> u64 {
        self.total_written - self.entries.len() as u64
    }

    /// Newest first.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = &LogEntry> + '_ {
        self.entries.iter()
    }

    /// Up to `n` newest entries, newest first.
    pub fn recent(&self, n: usize) -> impl Iterator<Item = &LogEntry> + '_ {
        self.entries.iter().take(n)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.total_written = 0;
    }
}

impl Default for EventLog {
    fn default() -> Self {
        Self::new(100)
    }
}

//! Input command queue for control commands.
//!
//! The UI queues commands at any time and the engine applies them at a tick
//! boundary via [`Engine::apply_commands`](crate::engine::Engine::apply_commands),
//! so a command never lands in the middle of a tick. Commands only touch
//! the run controls; nothing here mutates aircraft directly.

// ---------------------------------------------------------------------------
// Command enum
// ---------------------------------------------------------------------------

/// A single control command.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum Command {
    /// Resume ticking.
    Start,
    /// Stop ticking; ticks become no-ops until `Start`.
    Pause,
    /// Rebuild the initial population and zero the clock.
    Reset,
    /// Set the global speed multiplier. Must be positive and finite.
    SetSpeed(f64),
    /// Set the advisory scenario label.
    SetScenario(String),
}

// ---------------------------------------------------------------------------
// CommandQueue
// ---------------------------------------------------------------------------

/// A queue of commands waiting to be applied at the next tick boundary.
///
/// Supports optional history tracking for debugging.
#[derive(Debug, Clone)]
pub struct CommandQueue {
    /// Commands waiting to be applied.
    pending: Vec<Command>,
    /// History of applied commands: (tick, command).
    history: Vec<(u64, Command)>,
    /// Maximum history entries to retain. 0 = no history.
    max_history: usize,
}

impl Default for CommandQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandQueue {
    /// Create a new empty command queue with no history tracking.
    pub fn new() -> Self {
        Self {
            pending: Vec::new(),
            history: Vec::new(),
            max_history: 0,
        }
    }

    /// Create a new command queue that retains up to `max_history` entries.
    pub fn with_max_history(max_history: usize) -> Self {
        Self {
            pending: Vec::new(),
            history: Vec::new(),
            max_history,
        }
    }

    /// Push a single command onto the queue.
    pub fn push(&mut self, command: Command) {
        self.pending.push(command);
    }

    /// Push multiple commands onto the queue at once.
    pub fn push_batch(&mut self, commands: impl IntoIterator<Item = Command>) {
        self.pending.extend(commands);
    }

    /// Drain all pending commands, moving them to history with the given tick.
    /// Returns the drained commands in submission order.
    pub fn drain(&mut self, tick: u64) -> Vec<Command> {
        let commands: Vec<Command> = self.pending.drain(..).collect();

        if self.max_history > 0 {
            for cmd in &commands {
                self.history.push((tick, cmd.clone()));
            }
            // Trim history if over limit
            let excess = self.history.len().saturating_sub(self.max_history);
            if excess > 0 {
                self.history.drain(..excess);
            }
        }

        commands
    }

    /// Number of commands waiting to be applied.
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Whether the queue has no pending commands.
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Get the command history (tick, command) pairs.
    pub fn history(&self) -> &[(u64, Command)] {
        &self.history
    }

    /// Clear all history entries.
    pub fn clear_history(&mut self) {
        self.history.clear();
    }
}

// ===========================================================================
// Tests
// ===========================================================================

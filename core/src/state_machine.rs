//! Worker Lifecycle State Machine
//!
//! Tracks the command execution thread through
//! `Stopped -> Starting -> Running -> Stopping -> Stopped`.

use std::fmt;

/// Lifecycle state of the command execution thread
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WorkerState {
    /// No worker thread exists
    #[default]
    Stopped,
    /// Start requested, thread spawned but not yet running its loop
    Starting,
    /// Thread is executing passes
    Running,
    /// Stop requested, waiting for the thread to leave its loop
    Stopping,
}

impl fmt::Display for WorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkerState::Stopped => write!(f, "stopped"),
            WorkerState::Starting => write!(f, "starting"),
            WorkerState::Running => write!(f, "running"),
            WorkerState::Stopping => write!(f, "stopping"),
        }
    }
}

/// Events that drive lifecycle transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerEvent {
    /// `start()` was called on a stopped processor
    StartRequested,
    /// The worker thread entered its body
    ThreadStarted,
    /// `stop()` was called
    StopRequested,
    /// The worker thread left its loop
    ThreadExited,
}

/// Result of a transition attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionResult {
    /// Transition was valid and state changed (or stayed the same)
    Success(WorkerState),
    /// Transition is not allowed from the current state
    Invalid { from: WorkerState, event: WorkerEvent },
}

/// The lifecycle state machine for the command execution thread
#[derive(Debug, Default)]
pub struct WorkerLifecycle {
    current_state: WorkerState,
}

impl WorkerLifecycle {
    /// Create a new state machine in the Stopped state
    pub fn new() -> Self {
        Self::default()
    }

    /// Get current state
    pub fn state(&self) -> WorkerState {
        self.current_state
    }

    /// Process an event and return the transition result
    pub fn process_event(&mut self, event: WorkerEvent) -> TransitionResult {
        match self.next_state(event) {
            Some(state) => {
                self.current_state = state;
                TransitionResult::Success(state)
            }
            None => TransitionResult::Invalid {
                from: self.current_state,
                event,
            },
        }
    }

    fn next_state(&self, event: WorkerEvent) -> Option<WorkerState> {
        use WorkerEvent::*;
        use WorkerState::*;

        match (self.current_state, event) {
            (Stopped, StartRequested) => Some(Starting),

            (Starting, ThreadStarted) => Some(Running),
            (Starting, StopRequested) => Some(Stopping),

            (Running, StopRequested) => Some(Stopping),

            // Thread came up after stop was already requested; it will exit at once
            (Stopping, ThreadStarted) => Some(Stopping),
            (Stopping, StopRequested) => Some(Stopping),

            (Starting | Running | Stopping, ThreadExited) => Some(Stopped),

            _ => None,
        }
    }
}

/// Check if a transition from one state to another is generally valid
pub fn is_valid_transition(from: WorkerState, to: WorkerState) -> bool {
    use WorkerState::*;

    match (from, to) {
        (a, b) if a == b => true,
        (Stopped, Starting) => true,
        (Starting, Running) => true,
        (Starting, Stopping) => true,
        (Running, Stopping) => true,
        (Starting | Running | Stopping, Stopped) => true,
        _ => false,
    }
}

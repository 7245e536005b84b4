//! cmdproc core
//!
//! Queued command processing: command text is parsed into an element tree,
//! resolved against a registry of prototype commands and queued. A dedicated
//! thread steps queued commands until they complete, and commands hand their
//! results back through a reply queue.

pub mod command;
pub mod commands;
pub mod element;
pub mod error;
pub mod factory;
pub mod processor;
pub mod queue;
pub mod registry;
pub mod state_machine;

pub use command::{Command, CommandContext, CommandReply, CommandStatus, ReplyStatus};
pub use element::{Element, ElementParser, XmlElementParser};
pub use error::{ConfigError, ParseError, ProcessorError};
pub use processor::{CommandProcessor, ProcessorConfig, ProcessorHandle};
pub use queue::PendingCommand;
pub use registry::CommandRegistry;
pub use state_machine::WorkerState;

/// Timing parameters for the execution thread
pub mod timing {
    /// How long the worker waits after a pass that found nothing to execute
    pub const IDLE_POLL_INTERVAL_MS: u64 = 10;

    /// Upper bound between liveness checks while `stop()` waits for the worker
    pub const STOP_POLL_INTERVAL_MS: u64 = 200;

    /// Name of the command execution thread
    pub const WORKER_THREAD_NAME: &str = "command-execution";
}

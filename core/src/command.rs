//! Command trait, execution context and reply records

use std::fmt;

use crate::element::Element;
use crate::error::ConfigError;
use crate::processor::ProcessorHandle;

/// Execution status reported by a command instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CommandStatus {
    /// Queued, no step has run yet
    #[default]
    Pending,
    /// At least one step ran, more are needed
    InProgress,
    /// Finished successfully
    Completed,
    /// Finished with an error (reported to the client through a reply)
    Failed,
}

impl CommandStatus {
    /// Whether the status is terminal
    pub fn is_finished(self) -> bool {
        matches!(self, CommandStatus::Completed | CommandStatus::Failed)
    }
}

impl fmt::Display for CommandStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandStatus::Pending => write!(f, "pending"),
            CommandStatus::InProgress => write!(f, "in-progress"),
            CommandStatus::Completed => write!(f, "completed"),
            CommandStatus::Failed => write!(f, "failed"),
        }
    }
}

/// Trait for implementing commands.
///
/// A registered value acts as a prototype: it is never executed itself.
/// Every submission clones it with [`Command::clone_command`], configures the
/// clone from the submitted element and queues the clone for execution.
pub trait Command: Send + Sync {
    /// Names this command is registered under. The first is the primary name.
    fn names(&self) -> &[&'static str];

    /// Short description
    fn description(&self) -> &'static str {
        ""
    }

    /// Create a fresh, unconfigured instance of this command
    fn clone_command(&self) -> Box<dyn Command>;

    /// Read command-specific attributes and children from the submitted element
    fn read_configuration(&mut self, element: &Element) -> Result<(), ConfigError>;

    /// Run one execution step. Called repeatedly until [`Command::is_completed`]
    /// returns true.
    fn execute(&mut self, ctx: &CommandContext);

    /// Whether the command has finished and can be retired
    fn is_completed(&self) -> bool;

    /// Current execution status
    fn status(&self) -> CommandStatus {
        if self.is_completed() {
            CommandStatus::Completed
        } else {
            CommandStatus::InProgress
        }
    }
}

/// Context passed to every execution step
///
/// Carries the submitting client's identity and a non-owning handle back to
/// the processor.
#[derive(Debug, Clone)]
pub struct CommandContext {
    client_id: u32,
    processor: ProcessorHandle,
}

impl CommandContext {
    pub(crate) fn new(client_id: u32, processor: ProcessorHandle) -> Self {
        Self {
            client_id,
            processor,
        }
    }

    /// Client that submitted the command
    pub fn client_id(&self) -> u32 {
        self.client_id
    }

    /// Handle to the owning processor
    pub fn processor(&self) -> &ProcessorHandle {
        &self.processor
    }

    /// Post a reply addressed to the submitting client.
    ///
    /// Returns false if the processor no longer exists.
    pub fn reply(&self, status: ReplyStatus, payload: impl Into<String>) -> bool {
        self.processor.post_reply(self.client_id, status, payload)
    }
}

/// Outcome carried by a reply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyStatus {
    Success,
    Fail,
}

impl fmt::Display for ReplyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReplyStatus::Success => write!(f, "SUCCESS"),
            ReplyStatus::Fail => write!(f, "FAIL"),
        }
    }
}

/// A reply waiting to be delivered to a client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandReply {
    pub client_id: u32,
    pub status: ReplyStatus,
    pub payload: String,
}

impl CommandReply {
    pub fn new(client_id: u32, status: ReplyStatus, payload: impl Into<String>) -> Self {
        Self {
            client_id,
            status,
            payload: payload.into(),
        }
    }

    /// Create a successful reply
    pub fn success(client_id: u32, payload: impl Into<String>) -> Self {
        Self::new(client_id, ReplyStatus::Success, payload)
    }

    /// Create a failed reply
    pub fn fail(client_id: u32, payload: impl Into<String>) -> Self {
        Self::new(client_id, ReplyStatus::Fail, payload)
    }
}

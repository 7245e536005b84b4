//! Execution queue for active commands and reply queue for outbound results
//!
//! Neither type locks on its own; the processor keeps both behind its shared
//! reentrant lock.

use std::any::Any;
use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};

use tracing::{debug, error};

use crate::command::{Command, CommandContext, CommandReply, CommandStatus, ReplyStatus};
use crate::factory::PreparedCommand;

/// A queued command instance together with its client context
pub struct ActiveCommand {
    name: String,
    command: Box<dyn Command>,
    context: CommandContext,
    steps: u64,
}

impl ActiveCommand {
    pub fn new(prepared: PreparedCommand, context: CommandContext) -> Self {
        Self {
            name: prepared.name,
            command: prepared.command,
            context,
            steps: 0,
        }
    }

    /// Run one step and report whether the command is now completed
    pub fn step(&mut self) -> bool {
        self.command.execute(&self.context);
        self.steps += 1;
        self.command.is_completed()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn client_id(&self) -> u32 {
        self.context.client_id()
    }

    /// Current state as a plain value
    pub fn snapshot(&self) -> PendingCommand {
        let status = if self.steps == 0 {
            CommandStatus::Pending
        } else {
            self.command.status()
        };
        PendingCommand {
            client_id: self.client_id(),
            name: self.name.clone(),
            status,
            steps: self.steps,
        }
    }
}

/// Snapshot of a command still waiting in the execution queue
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingCommand {
    pub client_id: u32,
    pub name: String,
    pub status: CommandStatus,
    pub steps: u64,
}

/// FIFO of active commands
#[derive(Default)]
pub struct ExecutionQueue {
    commands: VecDeque<ActiveCommand>,
}

impl ExecutionQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a command at the tail
    pub fn push(&mut self, command: ActiveCommand) {
        self.commands.push_back(command);
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn snapshot(&self) -> Vec<PendingCommand> {
        self.commands.iter().map(ActiveCommand::snapshot).collect()
    }

    /// Detach every queued command so a pass can step them without holding
    /// a borrow of the queue
    pub fn take_batch(&mut self) -> VecDeque<ActiveCommand> {
        std::mem::take(&mut self.commands)
    }

    /// Put the survivors of a pass back in front of anything queued meanwhile
    pub fn restore(&mut self, mut batch: VecDeque<ActiveCommand>) {
        batch.append(&mut self.commands);
        self.commands = batch;
    }
}

/// Step every command in `batch` once, in order, and drop the completed ones
///
/// A step that panics retires its command with a `Fail` reply to the
/// submitting client; the rest of the batch is still stepped.
///
/// Returns the number of commands stepped.
pub fn run_batch(batch: &mut VecDeque<ActiveCommand>) -> usize {
    let mut executed = 0;
    batch.retain_mut(|active| {
        executed += 1;
        match panic::catch_unwind(AssertUnwindSafe(|| active.step())) {
            Ok(false) => true,
            Ok(true) => {
                debug!(
                    name = active.name(),
                    client_id = active.client_id(),
                    steps = active.steps,
                    status = %active.command.status(),
                    "Command retired"
                );
                false
            }
            Err(payload) => {
                let reason = panic_message(payload.as_ref());
                error!(
                    name = active.name(),
                    client_id = active.client_id(),
                    steps = active.steps,
                    "Command panicked: {}",
                    reason
                );
                active.context.reply(
                    ReplyStatus::Fail,
                    format!("Command {} failed: {}", active.name, reason),
                );
                false
            }
        }
    });
    executed
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        *msg
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.as_str()
    } else {
        "panic"
    }
}

/// FIFO of replies awaiting delivery
#[derive(Debug, Default)]
pub struct ReplyQueue {
    replies: Vec<CommandReply>,
}

impl ReplyQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a reply at the tail
    pub fn post(&mut self, reply: CommandReply) {
        self.replies.push(reply);
    }

    /// Take every queued reply in post order, leaving the queue empty
    pub fn drain(&mut self) -> Vec<CommandReply> {
        std::mem::take(&mut self.replies)
    }

    pub fn len(&self) -> usize {
        self.replies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.replies.is_empty()
    }
}

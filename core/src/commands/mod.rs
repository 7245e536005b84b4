//! Built-in commands registered by `CommandProcessor::with_default_commands`

mod countdown;
mod echo;
mod help;

pub use countdown::CountdownCommand;
pub use echo::EchoCommand;
pub use help::HelpCommand;

use std::sync::Arc;

use crate::command::Command;

/// Prototypes for every built-in command
pub fn default_commands() -> Vec<Arc<dyn Command>> {
    vec![
        Arc::new(EchoCommand::default()),
        Arc::new(CountdownCommand::default()),
        Arc::new(HelpCommand::default()),
    ]
}

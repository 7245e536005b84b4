//! Countdown command - completes after a configurable number of steps

use crate::command::{Command, CommandContext, ReplyStatus};
use crate::element::Element;
use crate::error::ConfigError;

/// `<Command Name="Countdown" Steps="3" Progress="true"/>`
///
/// Also registered as `Wait`. Each execution step counts down by one; the
/// final step posts a single reply. With `Progress="true"` every earlier
/// step posts an intermediate reply as well.
#[derive(Debug, Clone)]
pub struct CountdownCommand {
    total: u32,
    remaining: u32,
    progress: bool,
}

impl Default for CountdownCommand {
    fn default() -> Self {
        Self {
            total: 1,
            remaining: 1,
            progress: false,
        }
    }
}

impl Command for CountdownCommand {
    fn names(&self) -> &[&'static str] {
        &["Countdown", "Wait"]
    }

    fn description(&self) -> &'static str {
        "Complete after the given number of execution steps"
    }

    fn clone_command(&self) -> Box<dyn Command> {
        Box::new(CountdownCommand::default())
    }

    fn read_configuration(&mut self, element: &Element) -> Result<(), ConfigError> {
        let steps = element.attribute_as::<u32>("Steps")?.unwrap_or(1);
        if steps == 0 {
            return Err(ConfigError::InvalidAttribute {
                attribute: "Steps".into(),
                value: "0".into(),
            });
        }
        self.total = steps;
        self.remaining = steps;
        self.progress = element.attribute_as::<bool>("Progress")?.unwrap_or(false);
        Ok(())
    }

    fn execute(&mut self, ctx: &CommandContext) {
        if self.remaining == 0 {
            return;
        }
        self.remaining -= 1;

        if self.remaining == 0 {
            ctx.reply(
                ReplyStatus::Success,
                format!("Countdown finished after {} steps", self.total),
            );
        } else if self.progress {
            ctx.reply(
                ReplyStatus::Success,
                format!("{} step(s) remaining", self.remaining),
            );
        }
    }

    fn is_completed(&self) -> bool {
        self.remaining == 0
    }
}

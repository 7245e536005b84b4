//! Echo command - replies with the text it was given

use crate::command::{Command, CommandContext, CommandStatus, ReplyStatus};
use crate::element::Element;
use crate::error::ConfigError;

/// `<Command Name="Echo" Text="..."/>`
#[derive(Debug, Clone, Default)]
pub struct EchoCommand {
    text: String,
    completed: bool,
}

impl Command for EchoCommand {
    fn names(&self) -> &[&'static str] {
        &["Echo"]
    }

    fn description(&self) -> &'static str {
        "Reply with the Text attribute"
    }

    fn clone_command(&self) -> Box<dyn Command> {
        Box::new(EchoCommand::default())
    }

    fn read_configuration(&mut self, element: &Element) -> Result<(), ConfigError> {
        self.text = element.require_attribute("Text")?.to_string();
        Ok(())
    }

    fn execute(&mut self, ctx: &CommandContext) {
        ctx.reply(ReplyStatus::Success, self.text.clone());
        self.completed = true;
    }

    fn is_completed(&self) -> bool {
        self.completed
    }

    fn status(&self) -> CommandStatus {
        if self.completed {
            CommandStatus::Completed
        } else {
            CommandStatus::Pending
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processor::ProcessorHandle;

    #[test]
    fn test_requires_text() {
        let mut cmd = EchoCommand::default();
        let result = cmd.read_configuration(&Element::new("Command"));
        assert_eq!(result, Err(ConfigError::MissingAttribute("Text".into())));
    }

    #[test]
    fn test_completes_in_one_step() {
        let mut cmd = EchoCommand::default();
        cmd.read_configuration(&Element::new("Command").with_attribute("Text", "hi"))
            .unwrap();
        assert!(!cmd.is_completed());

        cmd.execute(&CommandContext::new(1, ProcessorHandle::detached()));
        assert!(cmd.is_completed());
        assert_eq!(cmd.status(), CommandStatus::Completed);
    }
}

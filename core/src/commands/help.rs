//! Help command - lists the registered command names
//!
//! `Verbose="true"` adds each command's description.

use tracing::warn;

use crate::command::{Command, CommandContext, CommandStatus, ReplyStatus};
use crate::element::Element;
use crate::error::ConfigError;

/// `<Command Name="Help"/>`, also registered as `ListCommands`
#[derive(Debug, Clone, Default)]
pub struct HelpCommand {
    verbose: bool,
    status: CommandStatus,
}

impl HelpCommand {
    fn listing(&self, ctx: &CommandContext) -> Option<String> {
        let processor = ctx.processor();
        if self.verbose {
            let entries = processor.command_descriptions()?;
            Some(
                entries
                    .iter()
                    .map(|(name, description)| format!("{}: {}", name, description))
                    .collect::<Vec<_>>()
                    .join("; "),
            )
        } else {
            Some(processor.registered_command_names()?.join(", "))
        }
    }
}

impl Command for HelpCommand {
    fn names(&self) -> &[&'static str] {
        &["Help", "ListCommands"]
    }

    fn description(&self) -> &'static str {
        "Reply with the names of all registered commands"
    }

    fn clone_command(&self) -> Box<dyn Command> {
        Box::new(HelpCommand::default())
    }

    fn read_configuration(&mut self, element: &Element) -> Result<(), ConfigError> {
        self.verbose = element.attribute_as::<bool>("Verbose")?.unwrap_or(false);
        Ok(())
    }

    fn execute(&mut self, ctx: &CommandContext) {
        self.status = match self.listing(ctx) {
            Some(listing) => {
                ctx.reply(ReplyStatus::Success, listing);
                CommandStatus::Completed
            }
            None => {
                warn!(client_id = ctx.client_id(), "Help requested after processor shut down");
                CommandStatus::Failed
            }
        };
    }

    fn is_completed(&self) -> bool {
        self.status.is_finished()
    }

    fn status(&self) -> CommandStatus {
        self.status
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processor::{CommandProcessor, ProcessorConfig, ProcessorHandle};

    #[test]
    fn test_lists_registered_names() {
        let processor = CommandProcessor::with_default_commands(ProcessorConfig::default()).unwrap();
        processor.submit(2, r#"<Command Name="ListCommands"/>"#).unwrap();
        processor.execute_pass();

        let replies = processor.drain_replies();
        assert_eq!(replies.len(), 1);
        assert_eq!(replies[0].client_id, 2);
        assert_eq!(
            replies[0].payload,
            "Countdown, Echo, Help, ListCommands, Wait"
        );
    }

    #[test]
    fn test_verbose_lists_descriptions() {
        let processor = CommandProcessor::with_default_commands(ProcessorConfig::default()).unwrap();
        processor
            .submit(4, r#"<Command Name="Help" Verbose="true"/>"#)
            .unwrap();
        processor.execute_pass();

        let replies = processor.drain_replies();
        assert_eq!(replies.len(), 1);
        let entries: Vec<&str> = replies[0].payload.split("; ").collect();
        assert_eq!(entries.len(), 5);
        assert_eq!(entries[1], "Echo: Reply with the Text attribute");
        assert_eq!(
            entries[4],
            "Wait: Complete after the given number of execution steps"
        );
    }

    #[test]
    fn test_invalid_verbose_is_configuration_error() {
        let mut cmd = HelpCommand::default();
        let element = Element::new("Command")
            .with_attribute("Name", "Help")
            .with_attribute("Verbose", "loud");
        assert!(matches!(
            cmd.read_configuration(&element),
            Err(ConfigError::InvalidAttribute { .. })
        ));
    }

    #[test]
    fn test_fails_without_processor() {
        let mut cmd = HelpCommand::default();
        cmd.execute(&CommandContext::new(1, ProcessorHandle::detached()));
        assert!(cmd.is_completed());
        assert_eq!(cmd.status(), CommandStatus::Failed);
    }
}

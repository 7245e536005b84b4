//! Command factory - turns command text into a configured command instance

use tracing::error;

use crate::command::Command;
use crate::element::ElementParser;
use crate::error::ProcessorError;
use crate::registry::CommandRegistry;

/// Tag every command element must carry (compared case-insensitively)
pub const COMMAND_ELEMENT: &str = "Command";

/// Attribute holding the registered command name
pub const NAME_ATTRIBUTE: &str = "Name";

/// A configured instance ready to be queued
pub struct PreparedCommand {
    /// Name the instance was resolved under
    pub name: String,
    pub command: Box<dyn Command>,
}

impl std::fmt::Debug for PreparedCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreparedCommand")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Resolves command text against a registry
pub struct CommandFactory<'a> {
    registry: &'a CommandRegistry,
    parser: &'a dyn ElementParser,
}

impl<'a> CommandFactory<'a> {
    pub fn new(registry: &'a CommandRegistry, parser: &'a dyn ElementParser) -> Self {
        Self { registry, parser }
    }

    /// Parse `text`, resolve the named prototype and configure a fresh clone
    ///
    /// No partially configured instance escapes on failure.
    pub fn create(&self, text: &str) -> Result<PreparedCommand, ProcessorError> {
        let element = self.parser.parse(text).map_err(|e| {
            error!(received = text, "Failed to parse command string: {}", e);
            ProcessorError::from(e)
        })?;

        if !element.name().eq_ignore_ascii_case(COMMAND_ELEMENT) {
            error!(received = text, "Command element expected");
            return Err(ProcessorError::Schema(format!(
                "expected <{}> element, found <{}>",
                COMMAND_ELEMENT,
                element.name()
            )));
        }

        let Some(name) = element.attribute(NAME_ATTRIBUTE) else {
            error!(received = text, "Command element's Name attribute is missing");
            return Err(ProcessorError::Schema(format!(
                "missing required '{}' attribute",
                NAME_ATTRIBUTE
            )));
        };

        let Some(prototype) = self.registry.lookup(name) else {
            error!(name, "Unknown command");
            return Err(ProcessorError::UnknownCommand(name.to_string()));
        };

        let mut command = prototype.clone_command();
        if let Err(source) = command.read_configuration(&element) {
            error!(received = text, "Failed to initialize command from string: {}", source);
            return Err(ProcessorError::Configuration {
                name: name.to_string(),
                source,
            });
        }

        Ok(PreparedCommand {
            name: name.to_string(),
            command,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::CommandContext;
    use crate::element::{Element, XmlElementParser};
    use crate::error::{ConfigError, ParseError};
    use std::sync::Arc;

    /// Requires a `Level` attribute between 0 and 10
    #[derive(Default)]
    struct Gain {
        level: Option<u8>,
    }

    impl Command for Gain {
        fn names(&self) -> &[&'static str] {
            &["SetGain"]
        }

        fn clone_command(&self) -> Box<dyn Command> {
            Box::new(Gain::default())
        }

        fn read_configuration(&mut self, element: &Element) -> Result<(), ConfigError> {
            let level: u8 = element
                .attribute_as("Level")?
                .ok_or_else(|| ConfigError::MissingAttribute("Level".into()))?;
            if level > 10 {
                return Err(ConfigError::Other("level out of range".into()));
            }
            self.level = Some(level);
            Ok(())
        }

        fn execute(&mut self, _ctx: &CommandContext) {}

        fn is_completed(&self) -> bool {
            true
        }
    }

    fn registry() -> CommandRegistry {
        let mut registry = CommandRegistry::new();
        registry.register(Arc::new(Gain::default())).unwrap();
        registry
    }

    #[test]
    fn test_create_configured_instance() {
        let registry = registry();
        let factory = CommandFactory::new(&registry, &XmlElementParser);

        let prepared = factory
            .create(r#"<Command Name="SetGain" Level="4"/>"#)
            .expect("create failed");
        assert_eq!(prepared.name, "SetGain");
    }

    #[test]
    fn test_root_tag_is_case_insensitive() {
        let registry = registry();
        let factory = CommandFactory::new(&registry, &XmlElementParser);

        assert!(factory.create(r#"<command Name="SetGain" Level="1"/>"#).is_ok());
        assert!(factory.create(r#"<COMMAND Name="SetGain" Level="1"/>"#).is_ok());
    }

    #[test]
    fn test_malformed_text() {
        let registry = registry();
        let factory = CommandFactory::new(&registry, &XmlElementParser);

        let result = factory.create("<Command");
        assert!(matches!(result, Err(ProcessorError::Parse(ParseError::Xml(_)))));
    }

    #[test]
    fn test_wrong_root_tag() {
        let registry = registry();
        let factory = CommandFactory::new(&registry, &XmlElementParser);

        let result = factory.create(r#"<Request Name="SetGain" Level="1"/>"#);
        assert!(matches!(result, Err(ProcessorError::Schema(_))));
    }

    #[test]
    fn test_missing_name_attribute() {
        let registry = registry();
        let factory = CommandFactory::new(&registry, &XmlElementParser);

        let result = factory.create(r#"<Command Level="1"/>"#);
        assert!(matches!(result, Err(ProcessorError::Schema(_))));

        // Attribute names are case-sensitive
        let result = factory.create(r#"<Command name="SetGain" Level="1"/>"#);
        assert!(matches!(result, Err(ProcessorError::Schema(_))));
    }

    #[test]
    fn test_unknown_command() {
        let registry = registry();
        let factory = CommandFactory::new(&registry, &XmlElementParser);

        let result = factory.create(r#"<Command Name="setgain" Level="1"/>"#);
        assert!(matches!(result, Err(ProcessorError::UnknownCommand(n)) if n == "setgain"));
    }

    #[test]
    fn test_configuration_failure() {
        let registry = registry();
        let factory = CommandFactory::new(&registry, &XmlElementParser);

        let result = factory.create(r#"<Command Name="SetGain"/>"#);
        assert!(matches!(
            result,
            Err(ProcessorError::Configuration {
                source: ConfigError::MissingAttribute(_),
                ..
            })
        ));

        let result = factory.create(r#"<Command Name="SetGain" Level="11"/>"#);
        assert!(matches!(
            result,
            Err(ProcessorError::Configuration {
                source: ConfigError::Other(_),
                ..
            })
        ));
    }

    struct FixedParser(Element);

    impl ElementParser for FixedParser {
        fn parse(&self, _text: &str) -> Result<Element, ParseError> {
            Ok(self.0.clone())
        }
    }

    #[test]
    fn test_custom_parser() {
        let registry = registry();
        let parser = FixedParser(
            Element::new("Command")
                .with_attribute("Name", "SetGain")
                .with_attribute("Level", "2"),
        );
        let factory = CommandFactory::new(&registry, &parser);

        let prepared = factory.create("anything").expect("create failed");
        assert_eq!(prepared.name, "SetGain");
    }
}

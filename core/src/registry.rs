//! Command registry - maps command names to prototype commands

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, error};

use crate::command::Command;
use crate::error::ProcessorError;

/// Registered prototypes keyed by name
///
/// Each alias of a multi-name command holds its own reference to the same
/// prototype. Registering a name again replaces the previous mapping.
#[derive(Default)]
pub struct CommandRegistry {
    commands: HashMap<String, Arc<dyn Command>>,
}

impl CommandRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a prototype under every name it reports
    pub fn register(&mut self, command: Arc<dyn Command>) -> Result<(), ProcessorError> {
        let names = command.names();
        if names.is_empty() {
            error!("Cannot register command: command name is empty");
            return Err(ProcessorError::Registration(
                "command exposes no names".into(),
            ));
        }
        if names.iter().any(|n| n.is_empty()) {
            error!(?names, "Cannot register command: command name is empty");
            return Err(ProcessorError::Registration(
                "command exposes an empty name".into(),
            ));
        }

        for name in names {
            if self
                .commands
                .insert((*name).to_string(), Arc::clone(&command))
                .is_some()
            {
                debug!(name, "Replaced previously registered command");
            } else {
                debug!(name, "Registered command");
            }
        }
        Ok(())
    }

    /// Find a prototype by exact, case-sensitive name
    pub fn lookup(&self, name: &str) -> Option<&Arc<dyn Command>> {
        self.commands.get(name)
    }

    /// All registered names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.commands.keys().cloned().collect();
        names.sort();
        names
    }

    /// Every registered name with its command's description, sorted by name
    pub fn descriptions(&self) -> Vec<(String, &'static str)> {
        let mut entries: Vec<(String, &'static str)> = self
            .commands
            .iter()
            .map(|(name, command)| (name.clone(), command.description()))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries
    }

    /// Number of registered names (aliases count separately)
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

impl std::fmt::Debug for CommandRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandRegistry")
            .field("commands", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::CommandContext;
    use crate::element::Element;
    use crate::error::ConfigError;

    struct Named(&'static [&'static str]);

    impl Command for Named {
        fn names(&self) -> &[&'static str] {
            self.0
        }

        fn clone_command(&self) -> Box<dyn Command> {
            Box::new(Named(self.0))
        }

        fn read_configuration(&mut self, _element: &Element) -> Result<(), ConfigError> {
            Ok(())
        }

        fn execute(&mut self, _ctx: &CommandContext) {}

        fn is_completed(&self) -> bool {
            true
        }
    }

    #[test]
    fn test_every_alias_resolves_to_same_prototype() {
        let mut registry = CommandRegistry::new();
        let proto: Arc<dyn Command> = Arc::new(Named(&["StartRecording", "StopRecording"]));
        registry.register(Arc::clone(&proto)).expect("register failed");

        let start = registry.lookup("StartRecording").expect("missing alias");
        let stop = registry.lookup("StopRecording").expect("missing alias");
        assert!(Arc::ptr_eq(start, &proto));
        assert!(Arc::ptr_eq(stop, &proto));

        // One reference per alias plus the test's own
        assert_eq!(Arc::strong_count(&proto), 3);

        let clone = start.clone_command();
        assert_eq!(clone.names(), proto.names());
    }

    #[test]
    fn test_register_without_names_fails() {
        let mut registry = CommandRegistry::new();
        let result = registry.register(Arc::new(Named(&[])));
        assert!(matches!(result, Err(ProcessorError::Registration(_))));
        assert!(registry.is_empty());

        let result = registry.register(Arc::new(Named(&["Ok", ""])));
        assert!(matches!(result, Err(ProcessorError::Registration(_))));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_last_registration_wins() {
        let mut registry = CommandRegistry::new();
        let first: Arc<dyn Command> = Arc::new(Named(&["Echo"]));
        let second: Arc<dyn Command> = Arc::new(Named(&["Echo"]));

        registry.register(Arc::clone(&first)).unwrap();
        registry.register(Arc::clone(&second)).unwrap();

        assert_eq!(registry.len(), 1);
        assert!(Arc::ptr_eq(registry.lookup("Echo").unwrap(), &second));
        assert_eq!(Arc::strong_count(&first), 1);
    }

    #[test]
    fn test_lookup_is_case_sensitive() {
        let mut registry = CommandRegistry::new();
        registry.register(Arc::new(Named(&["Echo"]))).unwrap();

        assert!(registry.lookup("Echo").is_some());
        assert!(registry.lookup("echo").is_none());
        assert!(registry.lookup("ECHO").is_none());
    }

    #[test]
    fn test_names_sorted() {
        let mut registry = CommandRegistry::new();
        registry.register(Arc::new(Named(&["Wait", "Countdown"]))).unwrap();
        registry.register(Arc::new(Named(&["Echo"]))).unwrap();

        assert_eq!(registry.names(), vec!["Countdown", "Echo", "Wait"]);
    }

    struct Described;

    impl Command for Described {
        fn names(&self) -> &[&'static str] {
            &["Zap", "Arm"]
        }

        fn description(&self) -> &'static str {
            "Arms then zaps"
        }

        fn clone_command(&self) -> Box<dyn Command> {
            Box::new(Described)
        }

        fn read_configuration(&mut self, _element: &Element) -> Result<(), ConfigError> {
            Ok(())
        }

        fn execute(&mut self, _ctx: &CommandContext) {}

        fn is_completed(&self) -> bool {
            true
        }
    }

    #[test]
    fn test_descriptions_per_alias() {
        let mut registry = CommandRegistry::new();
        registry.register(Arc::new(Described)).unwrap();
        registry.register(Arc::new(Named(&["Echo"]))).unwrap();

        assert_eq!(
            registry.descriptions(),
            vec![
                ("Arm".to_string(), "Arms then zaps"),
                ("Echo".to_string(), ""),
                ("Zap".to_string(), "Arms then zaps"),
            ]
        );
    }
}

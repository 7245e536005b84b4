//! Error types for command submission and registration

use thiserror::Error;

/// Errors that can occur while turning command text into an element tree
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Malformed command text: {0}")]
    Xml(#[from] roxmltree::Error),

    #[error("Malformed command text: {0}")]
    Other(String),
}

/// Errors reported by a command while reading its configuration
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required attribute '{0}'")]
    MissingAttribute(String),

    #[error("Invalid value '{value}' for attribute '{attribute}'")]
    InvalidAttribute { attribute: String, value: String },

    #[error("{0}")]
    Other(String),
}

/// Errors returned synchronously by the processor's caller-facing operations
///
/// Failures that happen while a command executes are never reported here;
/// they reach the client through the reply queue.
#[derive(Error, Debug)]
pub enum ProcessorError {
    #[error("Command text is empty")]
    EmptyInput,

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("Invalid command element: {0}")]
    Schema(String),

    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    #[error("Failed to configure command '{name}': {source}")]
    Configuration {
        name: String,
        #[source]
        source: ConfigError,
    },

    #[error("Cannot register command: {0}")]
    Registration(String),

    #[error("Failed to spawn command execution thread: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("Command processor has shut down")]
    Closed,
}

/// Configuration file and credential resolution.
pub mod config;

/// Errors that end a command with a non-zero exit code.
pub mod error;

/// Resolution of the server a command acts on.
pub mod locator;

/// Rendering of records as pretty text, JSON or YAML.
pub mod output;

/// Client for the CloudControl compute and backup APIs.
pub mod provider;

/// Utility functions for common operations.
pub mod utils;

/// CLI interface and commands.
pub mod cli;

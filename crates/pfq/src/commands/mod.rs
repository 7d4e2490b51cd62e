//! Command implementations for the pfq CLI.
//!
//! This module contains the command handlers that are invoked by the CLI.

pub mod check;
pub mod completions;
pub mod config;
pub mod edit;
pub mod parse;
pub mod session;
pub mod suggest;
pub mod view;

use property_filter::{CatalogError, QueryError, TokenIndex};

use crate::cli::Cli;

/// Error type for command execution.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    /// Catalog loading or lookup error.
    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// Query edit error.
    #[error("query error: {0}")]
    Query(#[from] QueryError),

    /// Invalid command input.
    #[error("invalid input: {0}")]
    Input(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for command execution.
pub type Result<T> = std::result::Result<T, CommandError>;

/// Context for command execution, containing common dependencies.
pub struct CommandContext {
    /// Whether to output JSON.
    pub json_output: bool,
    /// Whether to use colors.
    pub use_colors: bool,
    /// Whether to be quiet (errors only).
    pub quiet: bool,
    /// Whether to be verbose.
    pub verbose: bool,
}

impl CommandContext {
    /// Creates a new command context from CLI arguments.
    pub fn from_cli(cli: &Cli) -> Self {
        Self {
            json_output: cli.json,
            use_colors: !cli.no_color && std::env::var_os("NO_COLOR").is_none(),
            quiet: cli.quiet,
            verbose: cli.verbose,
        }
    }
}

/// Parses a token index: `"2"` for a top-level token, `"1.0"` for the first
/// token of the group at index 1.
pub fn parse_token_index(s: &str) -> Result<TokenIndex> {
    let invalid = || CommandError::Input(format!("invalid token index '{s}'"));
    match s.trim().split_once('.') {
        Some((group, token)) => Ok(TokenIndex::Nested {
            group: group.parse().map_err(|_| invalid())?,
            token: token.parse().map_err(|_| invalid())?,
        }),
        None => s.trim().parse().map(TokenIndex::Top).map_err(|_| invalid()),
    }
}

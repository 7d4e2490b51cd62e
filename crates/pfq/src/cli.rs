//! CLI argument parsing using clap derive macros.
//!
//! This module defines the command-line interface for the pfq CLI.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// pfq - Property filter query harness
#[derive(Parser, Debug)]
#[command(name = "pfq")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbose output (show debug information)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Quiet mode (errors only)
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Output JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Disable colors in output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Catalog file with properties and options (.json or .toml)
    #[arg(short, long, global = true, env = "PFQ_CATALOG")]
    pub catalog: Option<PathBuf>,

    /// Query file (JSON) to start from instead of the catalog's query
    #[arg(long, global = true)]
    pub query: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show how input text is parsed
    #[command(alias = "p")]
    Parse {
        /// Input text (e.g., "State != Running")
        text: String,
    },

    /// List suggestions for input text
    #[command(alias = "s")]
    Suggest {
        /// Input text
        text: String,
    },

    /// Commit input text as a new token
    #[command(alias = "a")]
    Add {
        /// Input text (e.g., "Instance ID = i-2dc5")
        text: String,

        /// Add into the top-level item at this index, forming a group
        #[arg(short, long)]
        group: Option<usize>,

        /// Write the result back to the --query file
        #[arg(short, long)]
        write: bool,
    },

    /// Edit a token through a draft
    #[command(alias = "e")]
    Edit {
        /// Token index ("2", or "1.0" for a token inside a group)
        index: String,

        /// Change the property (key), or "-" for free text
        #[arg(short, long)]
        property: Option<String>,

        /// Change the operator (e.g., "!=")
        #[arg(short, long)]
        operator: Option<String>,

        /// Replace the value
        #[arg(long)]
        value: Option<String>,

        /// Select an option value; toggles for enum operators (repeatable)
        #[arg(short, long, action = clap::ArgAction::Append)]
        select: Vec<String>,

        /// Write the result back to the --query file
        #[arg(short, long)]
        write: bool,
    },

    /// Remove a token
    #[command(alias = "rm")]
    Remove {
        /// Token index ("2", or "1.0" for a token inside a group)
        #[arg(required_unless_present = "all")]
        index: Option<String>,

        /// Remove every token
        #[arg(long, conflicts_with = "index")]
        all: bool,

        /// Write the result back to the --query file
        #[arg(short, long)]
        write: bool,
    },

    /// Toggle an and/or operation
    Toggle {
        /// Toggle the group at this top-level index instead of the query
        #[arg(short, long)]
        group: Option<usize>,

        /// Write the result back to the --query file
        #[arg(short, long)]
        write: bool,
    },

    /// Move a token out of its group
    Release {
        /// Nested token index (e.g., "1.0")
        index: String,

        /// Write the result back to the --query file
        #[arg(short, long)]
        write: bool,
    },

    /// Render the token list
    #[command(alias = "v")]
    View {
        /// Show tokens hidden by the token limit
        #[arg(short, long)]
        expanded: bool,
    },

    /// Report catalog configuration problems
    Check,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },

    /// Generate shell completions
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Shell types for completions
#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    Powershell,
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show current configuration
    Show,

    /// Print config file path
    Path,

    /// Create a config file with defaults
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_flags() {
        let cli = Cli::parse_from(["pfq", "--verbose", "view"]);
        assert!(cli.verbose);
        assert!(!cli.quiet);
        assert!(!cli.json);

        let cli = Cli::parse_from(["pfq", "--quiet", "--json", "view"]);
        assert!(!cli.verbose);
        assert!(cli.quiet);
        assert!(cli.json);
    }

    #[test]
    fn test_verbose_conflicts_with_quiet() {
        assert!(Cli::try_parse_from(["pfq", "-v", "-q", "view"]).is_err());
    }

    #[test]
    fn test_catalog_flag_after_subcommand() {
        let cli = Cli::parse_from(["pfq", "parse", "State = 1", "--catalog", "c.json"]);
        assert_eq!(cli.catalog, Some(PathBuf::from("c.json")));
        if let Some(Commands::Parse { text }) = cli.command {
            assert_eq!(text, "State = 1");
        } else {
            panic!("Expected Parse command");
        }
    }

    #[test]
    fn test_add_to_group() {
        let cli = Cli::parse_from(["pfq", "add", "web", "--group", "1", "-w"]);
        if let Some(Commands::Add { text, group, write }) = cli.command {
            assert_eq!(text, "web");
            assert_eq!(group, Some(1));
            assert!(write);
        } else {
            panic!("Expected Add command");
        }
    }

    #[test]
    fn test_edit_repeatable_select() {
        let cli = Cli::parse_from(["pfq", "edit", "0", "-s", "1", "-s", "0", "-o", "="]);
        if let Some(Commands::Edit {
            index,
            operator,
            select,
            ..
        }) = cli.command
        {
            assert_eq!(index, "0");
            assert_eq!(operator.as_deref(), Some("="));
            assert_eq!(select, vec!["1", "0"]);
        } else {
            panic!("Expected Edit command");
        }
    }

    #[test]
    fn test_remove_requires_index_or_all() {
        assert!(Cli::try_parse_from(["pfq", "remove"]).is_err());
        assert!(Cli::try_parse_from(["pfq", "remove", "--all"]).is_ok());
        assert!(Cli::try_parse_from(["pfq", "remove", "0", "--all"]).is_err());
    }

    #[test]
    fn test_config_init() {
        let cli = Cli::parse_from(["pfq", "config", "init", "--force"]);
        assert!(matches!(
            cli.command,
            Some(Commands::Config {
                command: Some(ConfigCommands::Init { force: true })
            })
        ));
    }

    #[test]
    fn test_completions() {
        let cli = Cli::parse_from(["pfq", "completions", "zsh"]);
        if let Some(Commands::Completions { shell }) = cli.command {
            assert!(matches!(shell, Shell::Zsh));
        } else {
            panic!("Expected Completions command");
        }
    }
}

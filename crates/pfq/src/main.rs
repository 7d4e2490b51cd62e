use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;
mod output;

use cli::{Cli, Commands, ConfigCommands};
use commands::config::load_config;
use commands::edit::EditOptions;
use commands::session::Session;
use commands::{CommandContext, CommandError};

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(&cli);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if cli.json {
                let error_json = serde_json::json!({
                    "error": {
                        "code": error_code(&e),
                        "message": e.to_string(),
                    }
                });
                eprintln!("{}", serde_json::to_string_pretty(&error_json).unwrap());
            } else {
                eprintln!("Error: {e}");
            }
            error_exit_code(&e)
        }
    }
}

/// Sends logs to stderr. `PFQ_LOG` takes an env-filter directive and wins
/// over the verbosity flags.
fn init_tracing(cli: &Cli) {
    let default_level = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "warn"
    };
    let filter =
        EnvFilter::try_from_env("PFQ_LOG").unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(!cli.no_color)
        .with_target(false)
        .init();
}

fn run(cli: &Cli) -> commands::Result<()> {
    let ctx = CommandContext::from_cli(cli);

    let Some(command) = &cli.command else {
        use clap::CommandFactory;
        Cli::command().print_help()?;
        return Ok(());
    };

    // Commands that need no catalog
    match command {
        Commands::Config { command } => {
            return match command {
                None | Some(ConfigCommands::Show) => commands::config::execute_show(&ctx),
                Some(ConfigCommands::Path) => commands::config::execute_path(&ctx),
                Some(ConfigCommands::Init { force }) => {
                    commands::config::execute_init(&ctx, *force)
                }
            };
        }
        Commands::Completions { shell } => {
            return Ok(commands::completions::execute(*shell)?);
        }
        _ => {}
    }

    let config = load_config()?;
    let ctx = CommandContext {
        use_colors: ctx.use_colors && config.output.color != Some(false),
        ..ctx
    };
    let session = Session::open(cli, config)?;

    match command {
        Commands::Parse { text } => commands::parse::execute(&ctx, &session, text),
        Commands::Suggest { text } => commands::suggest::execute(&ctx, &session, text),
        Commands::Add { text, group, write } => {
            commands::edit::execute_add(&ctx, &session, text, *group, *write)
        }
        Commands::Edit {
            index,
            property,
            operator,
            value,
            select,
            write,
        } => {
            let opts = EditOptions {
                index: index.clone(),
                property: property.clone(),
                operator: operator.clone(),
                value: value.clone(),
                select: select.clone(),
                write: *write,
            };
            commands::edit::execute_edit(&ctx, &session, &opts)
        }
        Commands::Remove { index, all, write } => {
            commands::edit::execute_remove(&ctx, &session, index.as_deref(), *all, *write)
        }
        Commands::Toggle { group, write } => {
            commands::edit::execute_toggle(&ctx, &session, *group, *write)
        }
        Commands::Release { index, write } => {
            commands::edit::execute_release(&ctx, &session, index, *write)
        }
        Commands::View { expanded } => commands::view::execute(&ctx, &session, *expanded),
        Commands::Check => commands::check::execute(&ctx, &session),
        Commands::Config { .. } | Commands::Completions { .. } => Ok(()),
    }
}

/// Returns the error code string for JSON output.
fn error_code(e: &CommandError) -> &'static str {
    match e {
        CommandError::Catalog(_) => "CATALOG_ERROR",
        CommandError::Query(_) => "QUERY_ERROR",
        CommandError::Input(_) => "INPUT_ERROR",
        CommandError::Config(_) => "CONFIG_ERROR",
        CommandError::Io(_) => "IO_ERROR",
        CommandError::Json(_) => "JSON_ERROR",
    }
}

/// Returns the exit code for an error.
fn error_exit_code(e: &CommandError) -> ExitCode {
    match e {
        CommandError::Query(_) => ExitCode::from(1),
        CommandError::Input(_) => ExitCode::from(2),
        CommandError::Catalog(_) => ExitCode::from(4),
        CommandError::Config(_) => ExitCode::from(5),
        CommandError::Io(_) => ExitCode::from(3),
        CommandError::Json(_) => ExitCode::from(1),
    }
}

//! dockaudit -- container audit command-line tool
//!
//! Loads configuration, initializes logging, and dispatches to the
//! subcommand handlers in [`commands`]. Errors are printed to stderr and
//! mapped to exit codes via [`CliError::exit_code`].

mod cli;
mod commands;
mod error;
mod logging;
mod output;

use clap::Parser;
use colored::Colorize;

use crate::cli::{Cli, Commands};
use crate::error::CliError;
use crate::output::OutputWriter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let code = match run(cli).await {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("{} {e}", "error:".red().bold());
            e.exit_code()
        }
    };

    std::process::exit(code);
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let config_path = commands::resolve_config_path(cli.config.as_deref());
    let loaded = commands::load_config(config_path.as_deref()).await;

    let general = loaded
        .as_ref()
        .map(|config| config.general.clone())
        .unwrap_or_default();
    logging::init_tracing(&general, cli.log_level.as_deref())
        .map_err(|e| CliError::Config(e.to_string()))?;
    dockaudit_core::metrics::describe_all();

    tracing::debug!(
        source = %commands::source_label(config_path.as_deref()),
        "dockaudit starting"
    );

    let writer = OutputWriter::new(cli.output);

    match cli.command {
        Commands::Audit(args) => commands::audit::execute(args, &loaded?, &writer).await,
        Commands::List => commands::list::execute(&loaded?, &writer).await,
        Commands::Config(args) => {
            commands::config::execute(args, config_path.as_deref(), &writer).await
        }
    }
}

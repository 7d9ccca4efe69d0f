//! CLI argument parsing using clap derive API
//!
//! This module defines the command-line interface structure using clap's derive macros.
//! It is purely declarative with no side effects or I/O.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use dockaudit_engine::ReportFormat;

/// Default configuration file, used when present and `--config` is not given.
pub const DEFAULT_CONFIG_PATH: &str = "dockaudit.toml";

/// dockaudit -- audit running containers for leaked secrets and risky files.
///
/// Use `dockaudit <COMMAND> --help` for subcommand details.
#[derive(Parser, Debug)]
#[command(name = "dockaudit", version, about, long_about = None)]
pub struct Cli {
    /// Path to the dockaudit.toml configuration file [default: dockaudit.toml].
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Override log level (trace, debug, info, warn, error).
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Output format.
    #[arg(long, global = true, default_value = "text")]
    pub output: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Supported output formats.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table / text output.
    Text,
    /// Machine-readable JSON.
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Audit every running container and write one report per container.
    Audit(AuditArgs),

    /// List running containers.
    List,

    /// Manage configuration.
    Config(ConfigArgs),
}

// ---- audit ----

/// Report artifact formats selectable on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FormatArg {
    /// Structured text (`<name>-report.txt`).
    Text,
    /// Paginated PDF document (`<name>-report.pdf`).
    Document,
}

impl From<FormatArg> for ReportFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Text => ReportFormat::Text,
            FormatArg::Document => ReportFormat::Document,
        }
    }
}

/// Audit running containers.
#[derive(Args, Debug)]
pub struct AuditArgs {
    /// Directory receiving the report artifacts (default: `report.output_dir`).
    pub output_dir: Option<PathBuf>,

    /// Artifact format; repeat to write several (default: `report.formats`).
    #[arg(long = "format", value_enum)]
    pub formats: Vec<FormatArg>,

    /// Maximum number of containers audited at once (0 = available parallelism).
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Per-probe execution timeout in seconds.
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Exit with code 4 when any container failed.
    #[arg(long)]
    pub fail_on_failures: bool,
}

// ---- config ----

/// Manage dockaudit configuration.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Validate the configuration file and report errors.
    Validate,
    /// Show the effective configuration (file + env overrides + defaults).
    Show {
        /// Show only a specific section (general, runtime, probes, report, audit).
        #[arg(long)]
        section: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_parse_audit_defaults() {
        let cli = Cli::try_parse_from(["dockaudit", "audit"]).expect("parse succeeded");
        match cli.command {
            Commands::Audit(args) => {
                assert!(args.output_dir.is_none(), "output_dir should default to None");
                assert!(args.formats.is_empty(), "formats should default to empty");
                assert!(args.concurrency.is_none());
                assert!(args.timeout.is_none());
                assert!(!args.fail_on_failures);
            }
            _ => panic!("expected Audit command"),
        }
        assert!(cli.config.is_none());
    }

    #[test]
    fn test_cli_parse_audit_full() {
        let cli = Cli::try_parse_from([
            "dockaudit",
            "audit",
            "/tmp/reports",
            "--format",
            "text",
            "--format",
            "document",
            "--concurrency",
            "8",
            "--timeout",
            "10",
            "--fail-on-failures",
        ])
        .expect("parse succeeded");
        match cli.command {
            Commands::Audit(args) => {
                assert_eq!(args.output_dir, Some(PathBuf::from("/tmp/reports")));
                assert_eq!(args.formats, vec![FormatArg::Text, FormatArg::Document]);
                assert_eq!(args.concurrency, Some(8));
                assert_eq!(args.timeout, Some(10));
                assert!(args.fail_on_failures);
            }
            _ => panic!("expected Audit command"),
        }
    }

    #[test]
    fn test_cli_parse_invalid_format() {
        let result = Cli::try_parse_from(["dockaudit", "audit", "--format", "html"]);
        assert!(result.is_err(), "unknown format should be rejected");
    }

    #[test]
    fn test_cli_parse_list() {
        let cli = Cli::try_parse_from(["dockaudit", "list"]).expect("parse succeeded");
        assert!(matches!(cli.command, Commands::List));
    }

    #[test]
    fn test_cli_parse_config_show_section() {
        let cli = Cli::try_parse_from(["dockaudit", "config", "show", "--section", "probes"])
            .expect("parse succeeded");
        match cli.command {
            Commands::Config(args) => match args.action {
                ConfigAction::Show { section } => {
                    assert_eq!(section.as_deref(), Some("probes"));
                }
                _ => panic!("expected Show action"),
            },
            _ => panic!("expected Config command"),
        }
    }

    #[test]
    fn test_cli_parse_global_flags() {
        let cli = Cli::try_parse_from([
            "dockaudit",
            "list",
            "--config",
            "/etc/dockaudit.toml",
            "--log-level",
            "debug",
            "--output",
            "json",
        ])
        .expect("parse succeeded");
        assert_eq!(cli.config, Some(PathBuf::from("/etc/dockaudit.toml")));
        assert_eq!(cli.log_level.as_deref(), Some("debug"));
        assert!(matches!(cli.output, OutputFormat::Json));
    }

    #[test]
    fn test_format_arg_maps_to_report_format() {
        assert_eq!(ReportFormat::from(FormatArg::Text), ReportFormat::Text);
        assert_eq!(ReportFormat::from(FormatArg::Document), ReportFormat::Document);
    }

    #[test]
    fn test_cli_requires_subcommand() {
        assert!(Cli::try_parse_from(["dockaudit"]).is_err());
    }

    #[test]
    fn test_cli_debug_assert() {
        Cli::command().debug_assert();
    }
}

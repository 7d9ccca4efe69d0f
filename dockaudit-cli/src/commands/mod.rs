//! Command handlers -- one module per subcommand

pub mod audit;
pub mod config;
pub mod list;

use std::path::{Path, PathBuf};

use dockaudit_core::config::AuditConfig;

use crate::cli::DEFAULT_CONFIG_PATH;
use crate::error::CliError;

/// Resolve which configuration file to read.
///
/// An explicit `--config` always wins. Otherwise `dockaudit.toml` in the
/// working directory is used when it exists, and `None` means
/// "defaults + environment overrides".
pub fn resolve_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    match explicit {
        Some(path) => Some(path.to_path_buf()),
        None => {
            let default = PathBuf::from(DEFAULT_CONFIG_PATH);
            default.is_file().then_some(default)
        }
    }
}

/// Load the effective configuration for the resolved path.
pub async fn load_config(path: Option<&Path>) -> Result<AuditConfig, CliError> {
    let config = match path {
        Some(path) => AuditConfig::load(path).await?,
        None => AuditConfig::from_env()?,
    };
    Ok(config)
}

/// Human-readable label for where the configuration came from.
pub fn source_label(path: Option<&Path>) -> String {
    match path {
        Some(path) => path.display().to_string(),
        None => "(defaults + environment)".to_owned(),
    }
}

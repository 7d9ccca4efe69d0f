//! `dockaudit list` command handler

use std::io::Write;

use serde::Serialize;
use tracing::info;

use dockaudit_core::config::AuditConfig;
use dockaudit_core::types::ContainerDescriptor;
use dockaudit_engine::{BollardRuntimeClient, RuntimeClient};

use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Execute the `list` command.
///
/// # Errors
///
/// Returns `CliError::RuntimeUnavailable` if the runtime cannot be reached.
pub async fn execute(config: &AuditConfig, writer: &OutputWriter) -> Result<(), CliError> {
    let client = BollardRuntimeClient::connect(
        &config.runtime.docker_socket,
        config.runtime.connect_timeout_secs,
    )?;

    let containers = client.list_containers().await?;
    info!(count = containers.len(), "listed running containers");

    writer.render(&ContainerList { containers })?;
    Ok(())
}

/// Running containers as seen by the runtime.
#[derive(Serialize)]
pub struct ContainerList {
    pub containers: Vec<ContainerDescriptor>,
}

impl Render for ContainerList {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        if self.containers.is_empty() {
            writeln!(w, "No running containers found.")?;
            return Ok(());
        }

        writeln!(
            w,
            "{}",
            format!("{:<14} {:<30} {}", "ID", "NAME", "IMAGE").bold()
        )?;
        writeln!(w, "{}", "-".repeat(80))?;
        for container in &self.containers {
            writeln!(
                w,
                "{:<14} {:<30} {}",
                container.short_id(),
                container.name(),
                container.image()
            )?;
        }
        writeln!(w)?;
        writeln!(w, "{} container(s)", self.containers.len())?;

        Ok(())
    }
}

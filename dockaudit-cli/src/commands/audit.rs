//! `dockaudit audit` command handler
//!
//! Connects to the container runtime, audits every running container and
//! prints the run summary. Ctrl-C cancels the run; containers that did not
//! finish are reported as failures.

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use dockaudit_core::config::AuditConfig;
use dockaudit_engine::{
    AuditEngineConfig, Auditor, BollardRuntimeClient, ReportFormat, Summary,
};

use crate::cli::AuditArgs;
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Execute the `audit` command.
///
/// # Errors
///
/// - `CliError::Config` when the merged configuration is invalid
/// - `CliError::RuntimeUnavailable` when the runtime cannot be reached
/// - `CliError::ContainerFailures` when failures occurred and `--fail-on-failures` is set
pub async fn execute(
    args: AuditArgs,
    config: &AuditConfig,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    let engine_config = engine_config(&args, config)?;
    let output_dir = args
        .output_dir
        .clone()
        .unwrap_or_else(|| PathBuf::from(&config.report.output_dir));
    let fail_on_failures = args.fail_on_failures || config.report.fail_on_container_failure;

    let client = BollardRuntimeClient::connect(
        &config.runtime.docker_socket,
        config.runtime.connect_timeout_secs,
    )?
    .with_output_limit(config.probes.max_output_bytes);

    let auditor = Auditor::builder()
        .config(engine_config)
        .runtime_client(Arc::new(client))
        .build()?;

    let cancel = CancellationToken::new();
    let signal_task = tokio::spawn(cancel_on_ctrl_c(cancel.clone()));

    info!(output_dir = %output_dir.display(), "starting audit");
    let result = auditor.run_audit(&output_dir, cancel).await;
    signal_task.abort();
    let summary = result?;

    let report = AuditReport::new(summary, &output_dir);
    writer.render(&report)?;

    if fail_on_failures && report.summary.failed > 0 {
        return Err(CliError::ContainerFailures {
            failed: report.summary.failed,
            total: report.summary.total,
        });
    }

    Ok(())
}

/// Build the engine configuration from the loaded config plus CLI overrides.
fn engine_config(args: &AuditArgs, config: &AuditConfig) -> Result<AuditEngineConfig, CliError> {
    let mut engine_config = AuditEngineConfig::from_core(config)?;

    if !args.formats.is_empty() {
        let mut formats: Vec<ReportFormat> = Vec::with_capacity(args.formats.len());
        for format in args.formats.iter().copied().map(ReportFormat::from) {
            if !formats.contains(&format) {
                formats.push(format);
            }
        }
        engine_config.formats = formats;
    }
    if let Some(concurrency) = args.concurrency {
        engine_config.concurrency = concurrency;
    }
    if let Some(timeout) = args.timeout {
        engine_config.exec_timeout_secs = timeout;
    }

    engine_config.validate()?;
    Ok(engine_config)
}

async fn cancel_on_ctrl_c(cancel: CancellationToken) {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            warn!("interrupt received, cancelling audit");
            cancel.cancel();
        }
        Err(e) => warn!(error = %e, "failed to listen for ctrl-c"),
    }
}

/// Audit run result shown to the user.
#[derive(Serialize)]
pub struct AuditReport {
    /// Directory holding the artifacts
    pub output_dir: String,
    #[serde(flatten)]
    pub summary: Summary,
}

impl AuditReport {
    pub fn new(summary: Summary, output_dir: &std::path::Path) -> Self {
        Self {
            output_dir: output_dir.display().to_string(),
            summary,
        }
    }
}

impl Render for AuditReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        let s = &self.summary;
        writeln!(w, "{}", "Audit Summary".bold())?;
        writeln!(w, "{}", "-".repeat(80))?;
        writeln!(w, "  Run ID:         {}", s.run_id)?;
        writeln!(w, "  Output Dir:     {}", self.output_dir)?;
        writeln!(w, "  Containers:     {}", s.total)?;
        writeln!(w, "  Succeeded:      {}", s.succeeded.to_string().green())?;
        if s.failed > 0 {
            writeln!(w, "  Failed:         {}", s.failed.to_string().red().bold())?;
        } else {
            writeln!(w, "  Failed:         {}", s.failed)?;
        }
        if s.probe_failures > 0 {
            writeln!(
                w,
                "  Probe Failures: {}",
                s.probe_failures.to_string().yellow()
            )?;
        } else {
            writeln!(w, "  Probe Failures: {}", s.probe_failures)?;
        }

        if s.total == 0 {
            writeln!(w)?;
            writeln!(w, "No running containers found.")?;
            return Ok(());
        }

        if !s.artifacts.is_empty() {
            writeln!(w)?;
            writeln!(w, "{}", "Artifacts".bold())?;
            for path in &s.artifacts {
                writeln!(w, "  {}", path.display())?;
            }
        }

        if !s.failures.is_empty() {
            writeln!(w)?;
            writeln!(w, "{}", "Failures".bold())?;
            writeln!(w, "  {:<30} {}", "CONTAINER", "REASON")?;
            for failure in &s.failures {
                writeln!(
                    w,
                    "  {:<30} {}",
                    failure.container_name,
                    failure.reason.red()
                )?;
            }
        }

        Ok(())
    }
}

//! CLI-specific error types and exit code mapping

use dockaudit_core::error::AuditError;
use dockaudit_engine::AuditEngineError;

/// CLI-specific error type.
///
/// Each variant carries enough context for a user-friendly message.
/// The `exit_code()` method maps errors to standard Unix exit codes.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Configuration loading or validation failure.
    #[error("configuration error: {0}")]
    Config(String),

    /// A subcommand-specific operation failed.
    #[error("{0}")]
    Command(String),

    /// The container runtime could not be reached or enumerated.
    #[error("container runtime unavailable: {0}")]
    RuntimeUnavailable(String),

    /// Some containers failed and failures were requested to be fatal.
    #[error("{failed} of {total} containers failed")]
    ContainerFailures { failed: usize, total: usize },

    /// JSON serialisation failed during output rendering.
    #[error("json output error: {0}")]
    JsonSerialize(#[from] serde_json::Error),

    /// IO error (file read, stdout write, etc.).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Wrapped domain error from dockaudit-core.
    #[error("{0}")]
    Core(#[from] AuditError),
}

impl CliError {
    /// Map the error to a process exit code.
    ///
    /// | Code | Meaning                                  |
    /// |------|------------------------------------------|
    /// | 0    | Success                                  |
    /// | 1    | General / command error                  |
    /// | 2    | Configuration error                      |
    /// | 3    | Container runtime unreachable            |
    /// | 4    | Container failures (`--fail-on-failures`)|
    /// | 10   | IO error                                 |
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) => 2,
            Self::RuntimeUnavailable(_) => 3,
            Self::ContainerFailures { .. } => 4,
            Self::Io(_) => 10,
            Self::Core(inner) => match inner {
                AuditError::Config(_) => 2,
                AuditError::RuntimeUnavailable(_) => 3,
                AuditError::Io(_) => 10,
                _ => 1,
            },
            Self::JsonSerialize(_) | Self::Command(_) => 1,
        }
    }
}

impl From<AuditEngineError> for CliError {
    fn from(e: AuditEngineError) -> Self {
        match e {
            AuditEngineError::RuntimeUnavailable(msg) => Self::RuntimeUnavailable(msg),
            AuditEngineError::Config { .. } => Self::Config(e.to_string()),
            other => Self::Command(other.to_string()),
        }
    }
}

//! Container runtime abstraction for testability.
//!
//! The [`RuntimeClient`] trait is the only capability the audit pipeline needs
//! from the container engine: enumerate running containers and execute a
//! read-only command inside one of them under a time bound. Production code
//! uses [`BollardRuntimeClient`]; tests use `MockRuntimeClient`.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐
//! │ Auditor / Probes │
//! └────────┬─────────┘
//!          │
//!          ▼
//!   ┌──────────────┐
//!   │RuntimeClient │ (trait)
//!   └──────────────┘
//!        │      │
//!        ▼      ▼
//!   ┌───────┐ ┌──────┐
//!   │Bollard│ │ Mock │
//!   └───┬───┘ └──────┘
//!       │
//!       ▼
//!   Docker Daemon (local socket or remote)
//! ```
//!
//! # Error mapping
//!
//! - enumeration / ping failures: `AuditEngineError::RuntimeUnavailable`
//! - exec refused by the engine, or exit code 126/127: `AuditEngineError::ProbeDenied`
//! - exec exceeding its bound: `AuditEngineError::ProbeTimeout`

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use tracing::{debug, warn};

use dockaudit_core::types::ContainerDescriptor;

use crate::error::AuditEngineError;

/// Exit code reported by POSIX shells when a command exists but cannot run.
const EXIT_NOT_EXECUTABLE: i64 = 126;
/// Exit code reported when the command is not found (e.g. distroless images).
const EXIT_NOT_FOUND: i64 = 127;

/// Validates a container ID before it reaches the engine API.
///
/// Docker container IDs are 64-character hex strings (or shorter prefix forms).
fn validate_container_id(id: &str) -> Result<(), AuditEngineError> {
    if id.is_empty() || id.len() > 64 {
        return Err(AuditEngineError::ProbeDenied {
            container: id.to_owned(),
            reason: format!("invalid container ID: length {} (must be 1-64)", id.len()),
        });
    }
    if !id.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(AuditEngineError::ProbeDenied {
            container: id.to_owned(),
            reason: "invalid container ID: contains non-hex characters".to_owned(),
        });
    }
    Ok(())
}

/// Output of a command executed inside a container.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecOutput {
    /// Captured standard output (stderr is discarded).
    pub stdout: String,
    /// Exit code, when the engine reported one.
    pub exit_code: Option<i64>,
    /// Whether stdout was cut at the configured output limit.
    pub truncated: bool,
}

impl ExecOutput {
    /// Successful output with exit code 0.
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            stdout: stdout.into(),
            exit_code: Some(0),
            truncated: false,
        }
    }
}

/// Trait abstracting the container engine operations used by the audit.
///
/// The trait is `Send + Sync + 'static`, allowing safe sharing across worker tasks.
/// Every operation is read-only: implementations must never change container state.
pub trait RuntimeClient: Send + Sync + 'static {
    /// Checks engine connectivity.
    ///
    /// # Errors
    ///
    /// Returns `AuditEngineError::RuntimeUnavailable` if the engine is unreachable.
    fn ping(&self) -> impl Future<Output = Result<(), AuditEngineError>> + Send;

    /// Lists running containers.
    ///
    /// No ordering guarantee beyond what the backend returns.
    ///
    /// # Errors
    ///
    /// Returns `AuditEngineError::RuntimeUnavailable` if the engine cannot be reached.
    fn list_containers(
        &self,
    ) -> impl Future<Output = Result<Vec<ContainerDescriptor>, AuditEngineError>> + Send;

    /// Executes `command` inside the container `id`, bounded by `timeout`.
    ///
    /// A nonzero exit code is not an error by itself: `find` exits nonzero when
    /// some subtrees are unreadable yet still prints every match it could reach.
    ///
    /// # Errors
    ///
    /// - `AuditEngineError::ProbeTimeout`: the bound was exceeded
    /// - `AuditEngineError::ProbeDenied`: the engine refused the exec, or the
    ///   command could not be run (exit code 126/127)
    fn exec(
        &self,
        id: &str,
        command: &[String],
        timeout: Duration,
    ) -> impl Future<Output = Result<ExecOutput, AuditEngineError>> + Send;
}

/// Production runtime client using `bollard`.
///
/// Communicates with the Docker daemon via a Unix socket or the platform default.
/// Internally uses `Arc<bollard::Docker>` for safe sharing across tasks.
///
/// # Examples
///
/// ```ignore
/// use dockaudit_engine::BollardRuntimeClient;
///
/// let client = BollardRuntimeClient::connect_local()?;
/// let client = BollardRuntimeClient::connect_with_socket("/run/docker.sock", 120)?
///     .with_output_limit(4 * 1024 * 1024);
/// # Ok::<(), dockaudit_engine::AuditEngineError>(())
/// ```
pub struct BollardRuntimeClient {
    docker: Arc<bollard::Docker>,
    max_output_bytes: usize,
}

impl BollardRuntimeClient {
    const DEFAULT_OUTPUT_LIMIT: usize = 8 * 1024 * 1024;

    /// Connects to Docker using the platform default socket.
    ///
    /// # Errors
    ///
    /// Returns `AuditEngineError::RuntimeUnavailable` if the client cannot be created.
    pub fn connect_local() -> Result<Self, AuditEngineError> {
        let docker = bollard::Docker::connect_with_local_defaults().map_err(|e| {
            AuditEngineError::RuntimeUnavailable(format!("failed to connect to docker: {e}"))
        })?;
        Ok(Self {
            docker: Arc::new(docker),
            max_output_bytes: Self::DEFAULT_OUTPUT_LIMIT,
        })
    }

    /// Connects to Docker using a specific socket path.
    ///
    /// # Errors
    ///
    /// Returns `AuditEngineError::RuntimeUnavailable` if the client cannot be created.
    pub fn connect_with_socket(
        socket_path: &str,
        timeout_secs: u64,
    ) -> Result<Self, AuditEngineError> {
        let docker = bollard::Docker::connect_with_socket(
            socket_path,
            timeout_secs,
            bollard::API_DEFAULT_VERSION,
        )
        .map_err(|e| {
            AuditEngineError::RuntimeUnavailable(format!(
                "failed to connect to docker at {socket_path}: {e}"
            ))
        })?;
        Ok(Self {
            docker: Arc::new(docker),
            max_output_bytes: Self::DEFAULT_OUTPUT_LIMIT,
        })
    }

    /// Connects to the configured socket, or the platform default when empty.
    pub fn connect(socket_path: &str, timeout_secs: u64) -> Result<Self, AuditEngineError> {
        if socket_path.is_empty() {
            Self::connect_local()
        } else {
            Self::connect_with_socket(socket_path, timeout_secs)
        }
    }

    /// Caps the number of stdout bytes captured per exec.
    pub fn with_output_limit(mut self, max_output_bytes: usize) -> Self {
        self.max_output_bytes = max_output_bytes.max(1);
        self
    }

    async fn exec_unbounded(
        &self,
        id: &str,
        command: &[String],
    ) -> Result<ExecOutput, AuditEngineError> {
        use bollard::container::LogOutput;
        use bollard::exec::{CreateExecOptions, StartExecResults};

        let denied = |reason: String| AuditEngineError::ProbeDenied {
            container: id.to_owned(),
            reason,
        };

        let options = CreateExecOptions::<String> {
            attach_stdout: Some(true),
            attach_stderr: Some(false),
            tty: Some(false),
            cmd: Some(command.to_vec()),
            ..Default::default()
        };

        let exec = self
            .docker
            .create_exec(id, options)
            .await
            .map_err(|e| denied(format!("create exec failed: {e}")))?;

        let started = self
            .docker
            .start_exec(&exec.id, None)
            .await
            .map_err(|e| denied(format!("start exec failed: {e}")))?;

        let mut stdout = Vec::new();
        let mut truncated = false;

        if let StartExecResults::Attached { mut output, .. } = started {
            while let Some(chunk) = output.next().await {
                let message = match chunk {
                    Ok(LogOutput::StdOut { message }) | Ok(LogOutput::Console { message }) => {
                        message
                    }
                    Ok(_) => continue,
                    Err(e) => return Err(denied(format!("exec stream failed: {e}"))),
                };
                let remaining = self.max_output_bytes.saturating_sub(stdout.len());
                if message.len() > remaining {
                    stdout.extend_from_slice(&message[..remaining]);
                    truncated = true;
                    break;
                }
                stdout.extend_from_slice(&message);
            }
        }

        if truncated {
            // Drop the partial trailing line so every kept line is complete.
            let keep = stdout.iter().rposition(|b| *b == b'\n').map_or(0, |i| i + 1);
            stdout.truncate(keep);
            warn!(
                container_id = id,
                limit = self.max_output_bytes,
                "exec output exceeded limit, truncating"
            );
        }

        let exit_code = match self.docker.inspect_exec(&exec.id).await {
            Ok(inspect) => inspect.exit_code,
            Err(e) => {
                debug!(container_id = id, error = %e, "inspect exec failed");
                None
            }
        };

        if let Some(code @ (EXIT_NOT_EXECUTABLE | EXIT_NOT_FOUND)) = exit_code {
            return Err(denied(format!(
                "command '{}' could not be executed (exit code {code})",
                command.first().map(String::as_str).unwrap_or_default()
            )));
        }

        Ok(ExecOutput {
            stdout: String::from_utf8_lossy(&stdout).into_owned(),
            exit_code,
            truncated,
        })
    }
}

impl RuntimeClient for BollardRuntimeClient {
    async fn ping(&self) -> Result<(), AuditEngineError> {
        self.docker
            .ping()
            .await
            .map_err(|e| AuditEngineError::RuntimeUnavailable(format!("ping failed: {e}")))?;
        Ok(())
    }

    async fn list_containers(&self) -> Result<Vec<ContainerDescriptor>, AuditEngineError> {
        use bollard::container::ListContainersOptions;

        let options = ListContainersOptions::<String> {
            all: false, // running containers only; stopped ones cannot be exec'd into
            ..Default::default()
        };

        let containers = self
            .docker
            .list_containers(Some(options))
            .await
            .map_err(|e| {
                AuditEngineError::RuntimeUnavailable(format!("list containers failed: {e}"))
            })?;

        let mut result = Vec::with_capacity(containers.len());
        for container in containers {
            let id = container.id.unwrap_or_default();
            let name = container
                .names
                .unwrap_or_default()
                .into_iter()
                .next()
                .unwrap_or_default();
            let image = container.image.unwrap_or_default();

            match ContainerDescriptor::new(id, name, image) {
                Some(descriptor) => result.push(descriptor),
                None => warn!("runtime reported a container without an id, skipping"),
            }
        }

        Ok(result)
    }

    async fn exec(
        &self,
        id: &str,
        command: &[String],
        timeout: Duration,
    ) -> Result<ExecOutput, AuditEngineError> {
        validate_container_id(id)?;

        tokio::time::timeout(timeout, self.exec_unbounded(id, command))
            .await
            .map_err(|_elapsed| AuditEngineError::ProbeTimeout {
                container: id.to_owned(),
                timeout_secs: timeout.as_secs(),
            })?
    }
}

/// 테스트용 Mock 런타임 클라이언트
///
/// 명령 인자에 특정 문자열이 포함되면 미리 설정한 응답을 돌려줍니다.
#[cfg(test)]
#[derive(Default)]
pub struct MockRuntimeClient {
    /// list_containers 호출 시 반환할 컨테이너 목록
    pub containers: Vec<ContainerDescriptor>,
    /// (컨테이너 ID 또는 "*", 인자 needle, 응답)
    pub replies: Vec<(String, String, MockReply)>,
    /// 런타임 연결 실패를 시뮬레이션할지 여부
    pub unavailable: bool,
    /// 실행된 명령 기록
    pub calls: std::sync::Mutex<Vec<(String, Vec<String>)>>,
}

/// Mock exec 응답
#[cfg(test)]
#[derive(Debug, Clone)]
pub enum MockReply {
    /// 정상 출력
    Output(ExecOutput),
    /// 제한 시간을 넘겨 응답하지 않음
    Hang,
    /// 실행 거부
    Deny(String),
}

#[cfg(test)]
impl MockRuntimeClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_containers(mut self, containers: Vec<ContainerDescriptor>) -> Self {
        self.containers = containers;
        self
    }

    /// 모든 컨테이너에서 `needle`을 인자로 포함하는 명령에 응답합니다.
    pub fn reply(self, needle: &str, reply: MockReply) -> Self {
        self.reply_for("*", needle, reply)
    }

    /// 특정 컨테이너에서만 응답합니다.
    pub fn reply_for(mut self, container_id: &str, needle: &str, reply: MockReply) -> Self {
        self.replies
            .push((container_id.to_owned(), needle.to_owned(), reply));
        self
    }

    pub fn unavailable(mut self) -> Self {
        self.unavailable = true;
        self
    }

    pub fn recorded_calls(&self) -> Vec<(String, Vec<String>)> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

#[cfg(test)]
impl RuntimeClient for MockRuntimeClient {
    async fn ping(&self) -> Result<(), AuditEngineError> {
        if self.unavailable {
            return Err(AuditEngineError::RuntimeUnavailable("mock down".to_owned()));
        }
        Ok(())
    }

    async fn list_containers(&self) -> Result<Vec<ContainerDescriptor>, AuditEngineError> {
        if self.unavailable {
            return Err(AuditEngineError::RuntimeUnavailable("mock down".to_owned()));
        }
        Ok(self.containers.clone())
    }

    async fn exec(
        &self,
        id: &str,
        command: &[String],
        timeout: Duration,
    ) -> Result<ExecOutput, AuditEngineError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push((id.to_owned(), command.to_vec()));
        }

        let reply = self
            .replies
            .iter()
            .find(|(target, needle, _)| {
                (target == "*" || target == id) && command.iter().any(|arg| arg.contains(needle))
            })
            .map(|(_, _, reply)| reply.clone());

        let work = async move {
            match reply {
                Some(MockReply::Output(output)) => Ok(output),
                Some(MockReply::Hang) => {
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                    Ok(ExecOutput::default())
                }
                Some(MockReply::Deny(reason)) => Err(AuditEngineError::ProbeDenied {
                    container: id.to_owned(),
                    reason,
                }),
                None => Ok(ExecOutput::ok("")),
            }
        };

        tokio::time::timeout(timeout, work)
            .await
            .map_err(|_elapsed| AuditEngineError::ProbeTimeout {
                container: id.to_owned(),
                timeout_secs: timeout.as_secs(),
            })?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_container() -> ContainerDescriptor {
        ContainerDescriptor::new("abc123def456", "web-server", "nginx:latest").unwrap()
    }

    #[test]
    fn validate_container_id_accepts_hex() {
        validate_container_id("abc123DEF456").unwrap();
        validate_container_id(&"a".repeat(64)).unwrap();
    }

    #[test]
    fn validate_container_id_rejects_bad_input() {
        assert!(validate_container_id("").is_err());
        assert!(validate_container_id(&"a".repeat(65)).is_err());
        assert!(validate_container_id("abc; rm -rf /").is_err());
        assert!(matches!(
            validate_container_id("web-server").unwrap_err(),
            AuditEngineError::ProbeDenied { .. }
        ));
    }

    #[test]
    fn exec_output_ok_has_zero_exit_code() {
        let out = ExecOutput::ok("PATH=/bin");
        assert_eq!(out.exit_code, Some(0));
        assert!(!out.truncated);
    }

    #[tokio::test]
    async fn mock_client_list_containers() {
        let client = MockRuntimeClient::new().with_containers(vec![sample_container()]);
        let containers = client.list_containers().await.unwrap();
        assert_eq!(containers.len(), 1);
        assert_eq!(containers[0].name(), "web-server");
    }

    #[tokio::test]
    async fn mock_client_unavailable() {
        let client = MockRuntimeClient::new().unavailable();
        assert!(matches!(
            client.list_containers().await.unwrap_err(),
            AuditEngineError::RuntimeUnavailable(_)
        ));
        assert!(client.ping().await.is_err());
    }

    #[tokio::test]
    async fn mock_client_matches_needle() {
        let client = MockRuntimeClient::new().reply(
            "printenv",
            MockReply::Output(ExecOutput::ok("USER=root\n")),
        );
        let out = client
            .exec(
                "abc123",
                &["printenv".to_owned()],
                Duration::from_secs(1),
            )
            .await
            .unwrap();
        assert_eq!(out.stdout, "USER=root\n");
        assert_eq!(client.recorded_calls().len(), 1);
    }

    #[tokio::test]
    async fn mock_client_per_container_reply() {
        let client = MockRuntimeClient::new()
            .reply_for("aaa", "printenv", MockReply::Deny("stopped".to_owned()));
        let cmd = ["printenv".to_owned()];
        assert!(client.exec("aaa", &cmd, Duration::from_secs(1)).await.is_err());
        assert!(client.exec("bbb", &cmd, Duration::from_secs(1)).await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn mock_client_hang_times_out() {
        let client = MockRuntimeClient::new().reply("find", MockReply::Hang);
        let err = client
            .exec("abc123", &["find".to_owned()], Duration::from_secs(2))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AuditEngineError::ProbeTimeout {
                timeout_secs: 2,
                ..
            }
        ));
    }

    #[test]
    fn runtime_client_is_send_sync() {
        fn assert_send_sync<T: Send + Sync + 'static>() {}
        assert_send_sync::<MockRuntimeClient>();
        assert_send_sync::<BollardRuntimeClient>();
    }
}

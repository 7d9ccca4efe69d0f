//! 감사 오케스트레이터 -- 컨테이너 열거부터 요약까지 전체 흐름 관리
//!
//! [`Auditor`]는 런타임이 보고한 컨테이너마다 파이프라인 하나를 워커 태스크로
//! 실행하고, 결과를 [`Summary`]로 접습니다.
//!
//! # 내부 아키텍처
//!
//! ```text
//! RuntimeClient.list_containers()
//!        |
//!        +--> JoinSet (Semaphore 로 동시성 제한)
//!               |
//!          ProbeRunner.run() --> aggregate() --> Renderer.render() x formats
//!               |
//!          ContainerOutcome --> Summary.record()
//! ```
//!
//! # 실패 정책
//!
//! - 열거 실패(`RuntimeUnavailable`)만 실행 전체를 중단합니다. 아티팩트는 기록되지 않습니다.
//! - 렌더링 실패, 워커 패닉, 취소는 해당 컨테이너의 실패로 기록되고 나머지는 계속 진행됩니다.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use dockaudit_core::metrics as m;
use dockaudit_core::types::ContainerDescriptor;

use crate::config::AuditEngineConfig;
use crate::error::AuditEngineError;
use crate::probe::ProbeRunner;
use crate::render::{ReportFormat, Renderer};
use crate::report::aggregate;
use crate::runtime::RuntimeClient;
use crate::summary::{ContainerOutcome, Summary};

/// 감사 오케스트레이터
///
/// `AuditorBuilder`로 생성합니다. 한 인스턴스로 여러 번 `run_audit`를 호출할 수 있으며,
/// 호출 사이에 공유 상태는 없습니다.
pub struct Auditor<R: RuntimeClient> {
    config: AuditEngineConfig,
    client: Arc<R>,
    runner: Arc<ProbeRunner<R>>,
    renderer: Renderer,
}

impl<R: RuntimeClient> Auditor<R> {
    /// 새 빌더를 생성합니다.
    pub fn builder() -> AuditorBuilder<R> {
        AuditorBuilder::new()
    }

    /// 엔진 설정
    pub fn config(&self) -> &AuditEngineConfig {
        &self.config
    }

    /// 실행 중인 컨테이너 목록을 조회합니다.
    pub async fn list_containers(&self) -> Result<Vec<ContainerDescriptor>, AuditEngineError> {
        self.client.list_containers().await
    }

    /// 실행 중인 모든 컨테이너를 감사하고 요약을 반환합니다.
    ///
    /// `cancel`이 취소되면 진행 중인 파이프라인은 다음 await 지점에서 중단되고,
    /// 완료되지 못한 컨테이너는 `"audit cancelled"` 실패로 기록됩니다.
    ///
    /// # Errors
    ///
    /// 컨테이너 열거에 실패하면 `AuditEngineError::RuntimeUnavailable`을 반환합니다.
    /// 그 밖의 실패는 모두 `Summary.failures`에 기록됩니다.
    pub async fn run_audit(
        &self,
        output_dir: &Path,
        cancel: CancellationToken,
    ) -> Result<Summary, AuditEngineError> {
        let run_id = uuid::Uuid::new_v4().to_string();

        let containers = self.client.list_containers().await.map_err(|e| match e {
            AuditEngineError::RuntimeUnavailable(_) => e,
            other => AuditEngineError::RuntimeUnavailable(other.to_string()),
        })?;

        let concurrency = self.config.effective_concurrency();
        info!(
            run_id = %run_id,
            containers = containers.len(),
            concurrency,
            output_dir = %output_dir.display(),
            "starting audit"
        );

        let mut summary = Summary::new(run_id.clone());
        if containers.is_empty() {
            info!(run_id = %run_id, "no running containers found");
            return Ok(summary);
        }

        let semaphore = Arc::new(Semaphore::new(concurrency.max(1)));
        let formats: Arc<[ReportFormat]> = self.config.formats.clone().into();
        let output_dir: Arc<PathBuf> = Arc::new(output_dir.to_path_buf());

        let mut tasks = JoinSet::new();
        let mut names = HashMap::with_capacity(containers.len());

        for container in containers {
            let name = container.name().to_owned();
            let worker = Worker {
                runner: Arc::clone(&self.runner),
                renderer: self.renderer,
                formats: Arc::clone(&formats),
                output_dir: Arc::clone(&output_dir),
            };
            let semaphore = Arc::clone(&semaphore);
            let cancel = cancel.clone();

            let handle = tasks.spawn(async move {
                let outcome = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => ContainerOutcome::cancelled(),
                    outcome = async {
                        match semaphore.acquire_owned().await {
                            Ok(_permit) => worker.audit(&container).await,
                            Err(_) => ContainerOutcome::Failed {
                                reason: "worker pool closed".to_owned(),
                            },
                        }
                    } => outcome,
                };
                (container, outcome)
            });
            names.insert(handle.id(), name);
        }

        while let Some(joined) = tasks.join_next_with_id().await {
            match joined {
                Ok((id, (container, outcome))) => {
                    names.remove(&id);
                    if let ContainerOutcome::Failed { reason } = &outcome {
                        warn!(container = %container, reason = %reason, "container audit failed");
                    }
                    summary.record(container.name(), outcome);
                }
                Err(e) => {
                    let name = names
                        .remove(&e.id())
                        .unwrap_or_else(|| "<unknown>".to_owned());
                    let reason = if e.is_panic() {
                        "worker panicked".to_owned()
                    } else {
                        format!("worker aborted: {e}")
                    };
                    error!(container = %name, reason = %reason, "container audit task failed");
                    summary.record(&name, ContainerOutcome::Failed { reason });
                }
            }
        }

        info!(
            run_id = %summary.run_id,
            total = summary.total,
            succeeded = summary.succeeded,
            failed = summary.failed,
            probe_failures = summary.probe_failures,
            "audit completed"
        );

        Ok(summary)
    }
}

/// 워커 태스크 하나가 소유하는 파이프라인 구성 요소
struct Worker<R: RuntimeClient> {
    runner: Arc<ProbeRunner<R>>,
    renderer: Renderer,
    formats: Arc<[ReportFormat]>,
    output_dir: Arc<PathBuf>,
}

impl<R: RuntimeClient> Worker<R> {
    /// 프로브 → 집계 → 렌더링. 실패는 `ContainerOutcome::Failed`로 반환합니다.
    async fn audit(&self, container: &ContainerDescriptor) -> ContainerOutcome {
        debug!(container = %container, "auditing container");

        let run = self.runner.run(container).await;
        let soft_failures = run.soft_failures.len();
        let report = aggregate(container, run.results);

        let mut artifacts = Vec::with_capacity(self.formats.len());
        for format in self.formats.iter().copied() {
            match self.renderer.render(&report, format, &self.output_dir).await {
                Ok(path) => artifacts.push(path),
                Err(e) => {
                    error!(container = %container, format = %format, error = %e, "render failed");
                    metrics::counter!(m::RENDER_FAILURES_TOTAL).increment(1);
                    return ContainerOutcome::Failed {
                        reason: e.to_string(),
                    };
                }
            }
        }

        metrics::counter!(m::CONTAINERS_AUDITED_TOTAL).increment(1);
        ContainerOutcome::Success {
            report,
            artifacts,
            soft_failures,
        }
    }
}

/// 감사 오케스트레이터 빌더
pub struct AuditorBuilder<R: RuntimeClient> {
    config: AuditEngineConfig,
    client: Option<Arc<R>>,
}

impl<R: RuntimeClient> Default for AuditorBuilder<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: RuntimeClient> AuditorBuilder<R> {
    /// 새 빌더를 생성합니다.
    pub fn new() -> Self {
        Self {
            config: AuditEngineConfig::default(),
            client: None,
        }
    }

    /// 엔진 설정을 지정합니다.
    pub fn config(mut self, config: AuditEngineConfig) -> Self {
        self.config = config;
        self
    }

    /// 런타임 클라이언트를 설정합니다.
    pub fn runtime_client(mut self, client: Arc<R>) -> Self {
        self.client = Some(client);
        self
    }

    /// 오케스트레이터를 빌드합니다.
    pub fn build(self) -> Result<Auditor<R>, AuditEngineError> {
        self.config.validate()?;

        let client = self.client.ok_or_else(|| AuditEngineError::Config {
            field: "runtime_client".to_owned(),
            reason: "runtime client must be provided".to_owned(),
        })?;

        let runner = ProbeRunner::new(
            Arc::clone(&client),
            self.config.probes.clone(),
            self.config.exec_timeout(),
        );
        let renderer = Renderer::new(self.config.page_lines, self.config.line_width);

        Ok(Auditor {
            config: self.config,
            client,
            runner: Arc::new(runner),
            renderer,
        })
    }
}

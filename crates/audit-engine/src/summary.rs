//! 감사 실행 요약
//!
//! 컨테이너마다 [`ContainerOutcome`] 하나가 만들어지고, 오케스트레이터가
//! [`Summary::record`]로 접습니다. 요약 내용은 완료 순서와 무관합니다.

use std::path::PathBuf;

use serde::Serialize;

use crate::report::Report;

/// 컨테이너 하나의 파이프라인 결과
#[derive(Debug, Clone)]
pub enum ContainerOutcome {
    /// 리포트 생성과 모든 아티팩트 기록 성공
    Success {
        report: Report,
        artifacts: Vec<PathBuf>,
        /// 빈 결과로 대체된 프로브 수
        soft_failures: usize,
    },
    /// 아티팩트 기록 실패, 취소, 워커 패닉
    Failed { reason: String },
}

impl ContainerOutcome {
    /// 취소로 완료되지 못한 컨테이너의 결과
    pub fn cancelled() -> Self {
        Self::Failed {
            reason: "audit cancelled".to_owned(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

/// 실패한 컨테이너 기록
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContainerFailure {
    pub container_name: String,
    pub reason: String,
}

/// 감사 실행 요약
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Summary {
    /// 실행 식별자 (UUID v4)
    pub run_id: String,
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// 컨테이너 이름순
    pub failures: Vec<ContainerFailure>,
    /// 기록된 아티팩트 경로 (정렬됨)
    pub artifacts: Vec<PathBuf>,
    /// 전체 실행에서 빈 결과로 대체된 프로브 수
    pub probe_failures: usize,
}

impl Summary {
    pub fn new(run_id: impl Into<String>) -> Self {
        Self {
            run_id: run_id.into(),
            total: 0,
            succeeded: 0,
            failed: 0,
            failures: Vec::new(),
            artifacts: Vec::new(),
            probe_failures: 0,
        }
    }

    /// 컨테이너 하나의 결과를 반영합니다.
    ///
    /// 호출 후에도 `total == succeeded + failed`와 정렬 순서가 유지됩니다.
    pub fn record(&mut self, container_name: &str, outcome: ContainerOutcome) {
        self.total += 1;
        match outcome {
            ContainerOutcome::Success {
                artifacts,
                soft_failures,
                ..
            } => {
                self.succeeded += 1;
                self.probe_failures += soft_failures;
                for path in artifacts {
                    let at = self.artifacts.partition_point(|p| *p < path);
                    self.artifacts.insert(at, path);
                }
            }
            ContainerOutcome::Failed { reason } => {
                self.failed += 1;
                let at = self
                    .failures
                    .partition_point(|f| f.container_name.as_str() <= container_name);
                self.failures.insert(
                    at,
                    ContainerFailure {
                        container_name: container_name.to_owned(),
                        reason,
                    },
                );
            }
        }
    }

    /// 실패한 컨테이너가 없으면 true
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

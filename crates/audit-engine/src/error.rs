//! 감사 엔진 에러 타입
//!
//! [`AuditEngineError`]는 엔진 내부에서 발생하는 모든 에러를 표현합니다.
//! `From<AuditEngineError> for AuditError` 변환이 구현되어 있어
//! 상위 레이어에서 `?` 연산자로 자연스럽게 전파할 수 있습니다.
//!
//! 전파 범위는 종류마다 다릅니다.
//! - `ProbeTimeout` / `ProbeDenied`: 프로브 실행기 안에서 빈 결과로 흡수됩니다.
//! - `RenderFailure`: 컨테이너 단위로 잡혀 `Summary.failures`에 기록됩니다.
//! - `RuntimeUnavailable`: 감사 전체를 중단하는 유일한 에러입니다.

use dockaudit_core::error::{AuditError, ConfigError};

/// 감사 엔진 도메인 에러
#[derive(Debug, thiserror::Error)]
pub enum AuditEngineError {
    /// 컨테이너 런타임에 연결하거나 목록을 조회할 수 없음
    #[error("container runtime unavailable: {0}")]
    RuntimeUnavailable(String),

    /// 프로브 실행 시간 초과
    #[error("probe timed out in container '{container}' after {timeout_secs}s")]
    ProbeTimeout {
        /// 대상 컨테이너 ID
        container: String,
        /// 적용된 제한 시간 (초)
        timeout_secs: u64,
    },

    /// 프로브 실행 거부 (컨테이너 정지, 권한 없음, 명령 없음 등)
    #[error("probe denied in container '{container}': {reason}")]
    ProbeDenied {
        /// 대상 컨테이너 ID
        container: String,
        /// 거부 사유
        reason: String,
    },

    /// 리포트 아티팩트 기록 실패
    #[error("render failed for container '{container}' at {path}: {reason}")]
    RenderFailure {
        /// 대상 컨테이너 이름
        container: String,
        /// 기록하려던 아티팩트 경로
        path: String,
        /// 실패 사유
        reason: String,
    },

    /// 설정 에러
    #[error("config error: {field}: {reason}")]
    Config {
        /// 설정 필드명
        field: String,
        /// 에러 사유
        reason: String,
    },
}

impl AuditEngineError {
    /// 메트릭 레이블용 고정 사유명을 반환합니다.
    pub fn reason_label(&self) -> &'static str {
        match self {
            Self::RuntimeUnavailable(_) => "runtime_unavailable",
            Self::ProbeTimeout { .. } => "timeout",
            Self::ProbeDenied { .. } => "denied",
            Self::RenderFailure { .. } => "render",
            Self::Config { .. } => "config",
        }
    }
}

impl From<AuditEngineError> for AuditError {
    fn from(err: AuditEngineError) -> Self {
        match err {
            AuditEngineError::RuntimeUnavailable(msg) => AuditError::RuntimeUnavailable(msg),
            AuditEngineError::RenderFailure {
                container, reason, ..
            } => AuditError::Render { container, reason },
            AuditEngineError::Config { field, reason } => {
                AuditError::Config(ConfigError::InvalidValue { field, reason })
            }
            err @ (AuditEngineError::ProbeTimeout { .. } | AuditEngineError::ProbeDenied { .. }) => {
                AuditError::Probe(err.to_string())
            }
        }
    }
}
